use anyhow::Result;
use log::info;

use powledger::{Ledger, Transaction, Wallet};

// Demo caller: one wallet, one signed transfer, two mined blocks, balances.
fn main() -> Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let wallet = Wallet::generate();
    let recipient = Wallet::generate();
    info!("Created wallet with address {}", wallet.address());

    let mut ledger = Ledger::new();

    let mut transaction = Transaction::new(
        wallet.address().clone(),
        recipient.address().clone(),
        100.0,
    )?;
    transaction.sign(&wallet)?;
    ledger.add_transaction(transaction)?;

    info!("Starting the miner...");
    ledger.mine_pending_transactions(wallet.address());

    // The reward for the first block sits in the pending pool; a second
    // round of mining brings it into the chain.
    ledger.mine_pending_transactions(wallet.address());

    println!(
        "Balance of {}: {}",
        wallet.address(),
        ledger.balance_of(wallet.address())
    );
    println!(
        "Balance of {}: {}",
        recipient.address(),
        ledger.balance_of(recipient.address())
    );
    println!("Chain valid: {}", ledger.is_chain_valid());

    Ok(())
}
