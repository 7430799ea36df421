//! A minimal proof-of-work ledger: signed value transfers batched into
//! hash-linked blocks, sealed by a nonce search and validated as a whole.

pub mod ledger;

pub use ledger::{
    Address, Block, Ledger, LedgerError, Transaction, TransactionError,
    TransactionSignature, Wallet,
};
