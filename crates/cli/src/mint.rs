// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context::Context;
use crate::helpers::base_units;
use alloy::primitives::{Address, U256};
use anyhow::Result;

pub async fn execute(context: &Context, to: Address, amount: U256, raw: bool) -> Result<()> {
    let orchestrator = context.orchestrator().await?;
    let amount = base_units(orchestrator.ledger(), amount, raw).await?;
    let receipt = orchestrator.mint(to, amount).await?;
    println!("Minted to {to} in transaction {}", receipt.hash);
    Ok(())
}
