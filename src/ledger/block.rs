use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::transaction::Transaction;

/// An ordered batch of transactions, hash-linked to its predecessor and
/// sealed by proof of work.
///
/// The hash stored at construction covers the initial nonce and must not be
/// trusted until [`Block::mine`] completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Timestamp when the block was created
    pub(crate) timestamp: DateTime<Utc>,

    /// Transactions included in this block; order is significant for
    /// hashing
    pub(crate) transactions: Vec<Transaction>,

    /// Hash of the previous block (`"0"` for genesis)
    pub(crate) previous_hash: String,

    /// Nonce searched during mining
    pub(crate) nonce: u64,

    /// Hash of the current block
    pub(crate) hash: String,
}

impl Block {
    /// Creates a new unmined block
    ///
    /// # Arguments
    ///
    /// * `timestamp` - The creation time of the block
    /// * `transactions` - The transactions to include in the block
    /// * `previous_hash` - The hash of the previous block
    pub fn new(
        timestamp: DateTime<Utc>,
        transactions: Vec<Transaction>,
        previous_hash: String,
    ) -> Self {
        let mut block = Block {
            timestamp,
            transactions,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        };

        block.hash = block.calculate_hash();
        block
    }

    /// Calculates the hash of the block
    ///
    /// # Returns
    ///
    /// The SHA-256 hash over `(timestamp, transactions, previous_hash,
    /// nonce)` as a hexadecimal string. Every transaction's fields feed the
    /// digest, so altering any transaction in a sealed block changes the
    /// block's hash.
    pub fn calculate_hash(&self) -> String {
        let payload = serde_json::json!({
            "timestamp": self.timestamp,
            "transactions": self.transactions,
            "previous_hash": self.previous_hash,
            "nonce": self.nonce,
        });

        let mut hasher = Sha256::new();
        hasher.update(payload.to_string().as_bytes());

        format!("{:x}", hasher.finalize())
    }

    /// Mines the block: searches for a nonce whose hash satisfies the
    /// difficulty predicate
    ///
    /// Increments the nonce and recomputes the hash until the hash has at
    /// least `difficulty` leading zero hex characters. CPU-bound and
    /// blocking; expected iterations grow exponentially with the
    /// difficulty.
    pub fn mine(&mut self, difficulty: u8) {
        let target = "0".repeat(difficulty as usize);

        while !self.hash.starts_with(&target) {
            self.nonce += 1;
            self.hash = self.calculate_hash();
        }

        info!("Block mined with nonce {}: {}", self.nonce, self.hash);
    }

    /// Checks whether every contained transaction is valid
    ///
    /// Short-circuits on the first invalid transaction.
    pub fn has_valid_transactions(&self) -> bool {
        self.transactions
            .iter()
            .all(|transaction| matches!(transaction.is_valid(), Ok(true)))
    }

    /// Gets the block's creation time
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Gets the transactions included in this block
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Gets the hash of the previous block
    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    /// Gets the nonce found during mining
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Gets the block's hash
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::crypto::Wallet;

    fn block_with_transactions() -> Block {
        let miner = Wallet::generate();
        let other = Wallet::generate();

        let transactions = vec![
            Transaction::reward(miner.address().clone(), 100.0),
            Transaction::reward(other.address().clone(), 50.0),
        ];

        Block::new(Utc::now(), transactions, "previous_hash".to_string())
    }

    #[test]
    fn test_new_block_hash_matches_content() {
        let block = block_with_transactions();

        assert_eq!(block.hash(), block.calculate_hash());
        assert_eq!(block.hash().len(), 64); // SHA-256 in hex
        assert_eq!(block.nonce(), 0);
    }

    #[test]
    fn test_calculate_hash_is_pure() {
        let block = block_with_transactions();

        assert_eq!(block.calculate_hash(), block.calculate_hash());
    }

    #[test]
    fn test_hash_covers_transactions() {
        let block = block_with_transactions();
        let before = block.calculate_hash();

        let mut tampered = block.clone();
        tampered.transactions[0].amount = 1_000_000.0;

        assert_ne!(before, tampered.calculate_hash());
    }

    #[test]
    fn test_hash_covers_nonce_and_linkage() {
        let block = block_with_transactions();

        let mut bumped = block.clone();
        bumped.nonce += 1;
        assert_ne!(block.calculate_hash(), bumped.calculate_hash());

        let mut relinked = block.clone();
        relinked.previous_hash = "somewhere_else".to_string();
        assert_ne!(block.calculate_hash(), relinked.calculate_hash());
    }

    #[test]
    fn test_mine_satisfies_difficulty() {
        for difficulty in 0..=3u8 {
            let mut block = block_with_transactions();
            block.mine(difficulty);

            let target = "0".repeat(difficulty as usize);
            assert!(block.hash().starts_with(&target));
            assert_eq!(block.hash(), block.calculate_hash());
        }
    }

    #[test]
    fn test_has_valid_transactions() {
        let sender = Wallet::generate();
        let recipient = Wallet::generate();

        let mut transaction = Transaction::new(
            sender.address().clone(),
            recipient.address().clone(),
            10.0,
        )
        .unwrap();
        transaction.sign(&sender).unwrap();

        let mut block = Block::new(
            Utc::now(),
            vec![transaction, Transaction::reward(sender.address().clone(), 100.0)],
            "previous_hash".to_string(),
        );

        assert!(block.has_valid_transactions());

        // Tampering with a signed transaction breaks block validity.
        block.transactions[0].amount = 999.0;
        assert!(!block.has_valid_transactions());
    }

    #[test]
    fn test_unsigned_transaction_fails_block_validation() {
        let sender = Wallet::generate();
        let recipient = Wallet::generate();

        let unsigned = Transaction::new(
            sender.address().clone(),
            recipient.address().clone(),
            10.0,
        )
        .unwrap();

        let block = Block::new(Utc::now(), vec![unsigned], "previous_hash".to_string());
        assert!(!block.has_valid_transactions());
    }
}
