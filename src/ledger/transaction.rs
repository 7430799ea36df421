use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::crypto::{verify_signature, Address, CryptoError, TransactionSignature, Wallet};

/// Errors that can occur during transaction operations
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("Cannot sign transactions for another wallet")]
    UnauthorizedSigner,

    #[error("Transaction already signed")]
    AlreadySigned,

    #[error("Reward transactions carry no signature")]
    RewardNotSignable,

    #[error("No signature in this transaction")]
    MissingSignature,

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// A signed or unsigned value-transfer record.
///
/// Fields are fixed at construction; the only permitted mutation is storing
/// the signature once via [`Transaction::sign`]. The signature binds the
/// content hash at signing time, and verification recomputes that hash, so a
/// field change after signing invalidates the transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's address. `None` marks a system-issued mining reward.
    pub(crate) sender: Option<Address>,

    /// Recipient's address
    pub(crate) recipient: Address,

    /// Amount being transferred
    pub(crate) amount: f64,

    /// Signature over the transaction's content hash
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) signature: Option<TransactionSignature>,
}

impl Transaction {
    /// Creates a new unsigned transaction
    ///
    /// # Arguments
    ///
    /// * `sender` - The address of the sender
    /// * `recipient` - The address of the recipient
    /// * `amount` - The amount to transfer; must be non-negative
    pub fn new(
        sender: Address,
        recipient: Address,
        amount: f64,
    ) -> Result<Self, TransactionError> {
        if amount < 0.0 || !amount.is_finite() {
            return Err(TransactionError::InvalidAmount(amount));
        }

        Ok(Transaction {
            sender: Some(sender),
            recipient,
            amount,
            signature: None,
        })
    }

    /// Creates a mining reward transaction (no sender, no signature)
    pub fn reward(recipient: Address, amount: f64) -> Self {
        Transaction {
            sender: None,
            recipient,
            amount,
            signature: None,
        }
    }

    /// Calculates the content hash of the transaction
    ///
    /// # Returns
    ///
    /// The SHA-256 hash over `(sender, recipient, amount)` as a hexadecimal
    /// string. Pure: identical fields always produce an identical hash.
    pub fn hash(&self) -> String {
        let payload = serde_json::json!({
            "sender": self.sender,
            "recipient": self.recipient,
            "amount": self.amount,
        });

        let mut hasher = Sha256::new();
        hasher.update(payload.to_string().as_bytes());

        format!("{:x}", hasher.finalize())
    }

    /// Signs the transaction with a wallet
    ///
    /// The wallet's address must equal the sender address, and the
    /// transaction must not already carry a signature.
    pub fn sign(&mut self, wallet: &Wallet) -> Result<(), TransactionError> {
        let sender = match &self.sender {
            Some(sender) => sender,
            None => return Err(TransactionError::RewardNotSignable),
        };

        if self.signature.is_some() {
            return Err(TransactionError::AlreadySigned);
        }

        if wallet.address() != sender {
            return Err(TransactionError::UnauthorizedSigner);
        }

        let digest = self.hash();
        self.signature = Some(wallet.sign(digest.as_bytes()));

        Ok(())
    }

    /// Checks whether the transaction is valid
    ///
    /// Reward transactions are always valid. Any other transaction must
    /// carry a signature that verifies against the sender's public key and
    /// the freshly recomputed content hash.
    pub fn is_valid(&self) -> Result<bool, TransactionError> {
        let sender = match &self.sender {
            Some(sender) => sender,
            None => return Ok(true),
        };

        let signature = match &self.signature {
            Some(signature) => signature,
            None => return Err(TransactionError::MissingSignature),
        };

        let public_key = sender.to_public_key()?;
        let digest = self.hash();

        Ok(verify_signature(digest.as_bytes(), signature, &public_key)?)
    }

    /// Checks if the transaction is a system-issued mining reward
    pub fn is_reward(&self) -> bool {
        self.sender.is_none()
    }

    /// Gets the sender's address, if any
    pub fn sender(&self) -> Option<&Address> {
        self.sender.as_ref()
    }

    /// Gets the recipient's address
    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    /// Gets the transferred amount
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Gets the stored signature, if any
    pub fn signature(&self) -> Option<&TransactionSignature> {
        self.signature.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_transaction(amount: f64) -> (Wallet, Transaction) {
        let sender = Wallet::generate();
        let recipient = Wallet::generate();

        let mut transaction = Transaction::new(
            sender.address().clone(),
            recipient.address().clone(),
            amount,
        )
        .unwrap();
        transaction.sign(&sender).unwrap();

        (sender, transaction)
    }

    #[test]
    fn test_new_transaction_is_unsigned() {
        let sender = Wallet::generate();
        let recipient = Wallet::generate();

        let transaction = Transaction::new(
            sender.address().clone(),
            recipient.address().clone(),
            10.5,
        )
        .unwrap();

        assert_eq!(transaction.sender(), Some(sender.address()));
        assert_eq!(transaction.recipient(), recipient.address());
        assert_eq!(transaction.amount(), 10.5);
        assert!(transaction.signature().is_none());
        assert!(!transaction.is_reward());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let sender = Wallet::generate();
        let recipient = Wallet::generate();

        let result = Transaction::new(
            sender.address().clone(),
            recipient.address().clone(),
            -1.0,
        );

        assert!(matches!(result, Err(TransactionError::InvalidAmount(_))));
    }

    #[test]
    fn test_sign_then_valid() {
        let (_, transaction) = signed_transaction(10.0);

        assert!(transaction.signature().is_some());
        assert!(transaction.is_valid().unwrap());
    }

    #[test]
    fn test_unsigned_transaction_is_invalid() {
        let sender = Wallet::generate();
        let recipient = Wallet::generate();

        let transaction = Transaction::new(
            sender.address().clone(),
            recipient.address().clone(),
            10.0,
        )
        .unwrap();

        assert!(matches!(
            transaction.is_valid(),
            Err(TransactionError::MissingSignature)
        ));
    }

    #[test]
    fn test_reward_transaction_is_always_valid() {
        let miner = Wallet::generate();
        let transaction = Transaction::reward(miner.address().clone(), 100.0);

        assert!(transaction.is_reward());
        assert!(transaction.signature().is_none());
        assert!(transaction.is_valid().unwrap());
    }

    #[test]
    fn test_sign_with_foreign_wallet_fails() {
        let sender = Wallet::generate();
        let recipient = Wallet::generate();
        let intruder = Wallet::generate();

        let mut transaction = Transaction::new(
            sender.address().clone(),
            recipient.address().clone(),
            10.0,
        )
        .unwrap();

        assert!(matches!(
            transaction.sign(&intruder),
            Err(TransactionError::UnauthorizedSigner)
        ));
        assert!(transaction.signature().is_none());
    }

    #[test]
    fn test_double_signing_fails() {
        let (sender, mut transaction) = signed_transaction(10.0);

        assert!(matches!(
            transaction.sign(&sender),
            Err(TransactionError::AlreadySigned)
        ));
    }

    #[test]
    fn test_hash_is_pure_and_field_sensitive() {
        let (_, transaction) = signed_transaction(10.0);

        assert_eq!(transaction.hash(), transaction.hash());

        let mut tampered = transaction.clone();
        tampered.amount = 11.0;
        assert_ne!(transaction.hash(), tampered.hash());
    }

    #[test]
    fn test_tampered_amount_invalidates_signature() {
        let (_, mut transaction) = signed_transaction(10.0);

        transaction.amount = 1000.0;
        assert!(!transaction.is_valid().unwrap());
    }

    #[test]
    fn test_foreign_signature_does_not_verify() {
        let sender = Wallet::generate();
        let recipient = Wallet::generate();
        let intruder = Wallet::generate();

        let mut transaction = Transaction::new(
            sender.address().clone(),
            recipient.address().clone(),
            10.0,
        )
        .unwrap();

        // Forge a signature with the wrong private key.
        let digest = transaction.hash();
        transaction.signature = Some(intruder.sign(digest.as_bytes()));

        assert!(!transaction.is_valid().unwrap());
    }
}
