// Ledger module
//
// Core of the proof-of-work ledger:
// - Transaction structure, signing and verification
// - Block structure and proof-of-work sealing
// - The chain itself: pending pool, mining policy, full-chain validation
// - Cryptography utilities

pub mod block;
pub mod chain;
pub mod crypto;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Ledger, LedgerError};
pub use crypto::{Address, TransactionSignature, Wallet};
pub use transaction::{Transaction, TransactionError};
