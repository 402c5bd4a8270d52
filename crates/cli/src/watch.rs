// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context::Context;
use anyhow::Result;
use ct_ledger::{LedgerListener, LedgerRead, ObservedEvent};
use futures::StreamExt;
use tracing::info;

fn print(observed: &ObservedEvent) {
    match observed.block_number {
        Some(block) => println!("[{block}] {}", observed.event),
        None => println!("[pending] {}", observed.event),
    }
}

pub async fn execute(context: &Context, from_block: Option<u64>) -> Result<()> {
    let profile = context.profile();

    if let Some(from_block) = from_block {
        let ledger = context.reader().await?;
        for observed in ledger.events_since(from_block).await? {
            print(&observed);
        }
    }

    let ws_url = profile.rpc()?.as_ws_url()?;
    let listener = LedgerListener::connect(&ws_url, profile.ledger).await?;
    let mut events = listener.stream().await?;
    info!(ledger = %profile.ledger, "Watching ledger events");

    loop {
        tokio::select! {
            next = events.next() => match next {
                Some(observed) => print(&observed),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
