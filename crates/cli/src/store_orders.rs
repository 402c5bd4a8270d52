// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context::Context;
use anyhow::Result;

pub async fn execute(context: &Context) -> Result<()> {
    let orchestrator = context.orchestrator().await?;
    let receipt = orchestrator.store_orders().await?;
    println!(
        "Stored orders for app {} and workerpool {} in transaction {}",
        context.profile().app,
        context.profile().workerpool,
        receipt.hash
    );
    Ok(())
}
