use chrono::{TimeZone, Utc};
use log::{info, warn};
use thiserror::Error;

use super::block::Block;
use super::crypto::Address;
use super::transaction::{Transaction, TransactionError};

/// Sentinel previous-hash of the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Fixed genesis timestamp: 2023-01-01T00:00:00Z
const GENESIS_TIMESTAMP: i64 = 1_672_531_200;

const DEFAULT_DIFFICULTY: u8 = 2;
const DEFAULT_MINING_REWARD: f64 = 100.0;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Transaction must include a sender and a recipient")]
    MalformedTransaction,

    #[error("Cannot add invalid transaction to the pending pool")]
    InvalidTransaction,

    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
}

/// An append-only chain of proof-of-work blocks plus the pending pool and
/// mining policy.
///
/// The chain starts from a fixed genesis block and only ever grows through
/// [`Ledger::mine_pending_transactions`]. All mutators take `&mut self`, so
/// a shared ledger must be wrapped in a lock by its owner; within one owner
/// the borrow checker already serializes access.
#[derive(Debug, Clone)]
pub struct Ledger {
    /// The chain of blocks; index 0 is the genesis block
    chain: Vec<Block>,

    /// Number of leading zero hex characters required in a sealed block's
    /// hash
    difficulty: u8,

    /// Transactions awaiting inclusion in the next block
    pending_transactions: Vec<Transaction>,

    /// Amount credited to whoever seals the next block
    mining_reward: f64,
}

impl Ledger {
    /// Creates a new ledger with the default mining policy
    pub fn new() -> Self {
        Self::with_policy(DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD)
    }

    /// Creates a new ledger with an explicit difficulty and mining reward
    pub fn with_policy(difficulty: u8, mining_reward: f64) -> Self {
        Ledger {
            chain: vec![Self::genesis_block()],
            difficulty,
            pending_transactions: Vec::new(),
            mining_reward,
        }
    }

    /// Creates the genesis block
    ///
    /// Fixed literal content, identical across every ledger instance, so
    /// that independently constructed chains share a common root.
    fn genesis_block() -> Block {
        let timestamp = Utc.timestamp_opt(GENESIS_TIMESTAMP, 0).unwrap();
        Block::new(timestamp, Vec::new(), GENESIS_PREVIOUS_HASH.to_string())
    }

    /// Gets the last block in the chain
    ///
    /// The chain is never empty; the genesis block guarantees this.
    pub fn latest_block(&self) -> &Block {
        self.chain
            .last()
            .expect("chain always contains the genesis block")
    }

    /// Adds a transaction to the pending pool
    ///
    /// Reward transactions are minted internally by the miner and cannot be
    /// submitted; a submission without a real sender is rejected as
    /// malformed. The transaction's signature is verified before it enters
    /// the pool. The chain itself is untouched.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<(), LedgerError> {
        if transaction.is_reward() {
            warn!("Rejected submission without a sender address");
            return Err(LedgerError::MalformedTransaction);
        }

        if !transaction.is_valid()? {
            warn!("Rejected transaction with a signature that does not verify");
            return Err(LedgerError::InvalidTransaction);
        }

        self.pending_transactions.push(transaction);
        Ok(())
    }

    /// Mines the pending pool into a new block and appends it to the chain
    ///
    /// Builds a block from the current time, the entire pending batch and
    /// the latest block's hash, seals it at the configured difficulty, then
    /// swaps the pool for a single fresh reward transaction crediting
    /// `reward_address`. This is the sole mutator of the chain.
    ///
    /// # Returns
    ///
    /// A reference to the newly appended block
    pub fn mine_pending_transactions(&mut self, reward_address: &Address) -> &Block {
        let transactions = std::mem::take(&mut self.pending_transactions);

        let mut block = Block::new(
            Utc::now(),
            transactions,
            self.latest_block().hash().to_string(),
        );
        block.mine(self.difficulty);

        info!(
            "Appending block {} at height {}",
            block.hash(),
            self.chain.len()
        );
        self.chain.push(block);

        self.pending_transactions = vec![Transaction::reward(
            reward_address.clone(),
            self.mining_reward,
        )];

        self.latest_block()
    }

    /// Computes the balance of an address by scanning the whole chain
    ///
    /// Every block's transaction list is walked in order: the amount is
    /// debited when the address is the sender and credited when it is the
    /// recipient. Pending transactions are not counted.
    pub fn balance_of(&self, address: &Address) -> f64 {
        let mut balance = 0.0;

        for block in &self.chain {
            for transaction in block.transactions() {
                if transaction.sender() == Some(address) {
                    balance -= transaction.amount();
                }

                if transaction.recipient() == address {
                    balance += transaction.amount();
                }
            }
        }

        balance
    }

    /// Validates the whole chain
    ///
    /// Every block from index 1 onward must contain only valid
    /// transactions, carry a hash that matches its recomputed content hash,
    /// and link to the actual hash of its predecessor. The loop never exits
    /// early on success; a genesis-only chain is trivially valid.
    pub fn is_chain_valid(&self) -> bool {
        for i in 1..self.chain.len() {
            let current = &self.chain[i];
            let previous = &self.chain[i - 1];

            if !current.has_valid_transactions() {
                return false;
            }

            if current.hash() != current.calculate_hash() {
                return false;
            }

            if current.previous_hash() != previous.hash() {
                return false;
            }
        }

        true
    }

    /// Gets the chain of blocks
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Gets the transactions awaiting inclusion in the next block
    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    /// Gets the mining difficulty
    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    /// Gets the mining reward
    pub fn mining_reward(&self) -> f64 {
        self.mining_reward
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
