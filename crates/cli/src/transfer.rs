// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context::Context;
use crate::helpers::base_units;
use alloy::primitives::{Address, U256};
use anyhow::{Context as _, Result};
use ct_transfer::TransferError;

fn explain(err: TransferError) -> anyhow::Error {
    let hint = if err.is_ambiguous() {
        "The transaction may still land. Check the ledger before sending again."
    } else if err.is_retriable() {
        "Nothing was written on chain; it is safe to try again."
    } else {
        "Nothing was retried."
    };
    anyhow::Error::new(err).context(hint)
}

pub async fn execute(
    context: &Context,
    to: Address,
    amount: U256,
    raw: bool,
    wait: bool,
) -> Result<()> {
    let orchestrator = context.orchestrator().await?;
    let amount = base_units(orchestrator.ledger(), amount, raw)
        .await
        .context("Could not scale the amount")?;

    let outcome = orchestrator.transfer(to, amount).await.map_err(explain)?;
    println!("Request order: {}", outcome.order_hash);
    println!("Transfer transaction: {}", outcome.receipt.hash);

    if wait {
        println!("Waiting for the TEE to settle...");
        let update = orchestrator.await_outcome(&outcome).await.map_err(explain)?;
        println!(
            "Settled. New sender balance {} / recipient balance {}",
            update.new_sender_balance.short(),
            update.new_recipient_balance.short()
        );
    }
    Ok(())
}
