// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{LedgerError, Result};
use crate::events::ObservedEvent;
use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{BlockNumberOrTag, Filter},
};
use futures::stream::{BoxStream, StreamExt};
use tracing::warn;

/// Live feed of ledger events over a websocket subscription.
pub struct LedgerListener {
    provider: DynProvider,
    filter: Filter,
}

impl LedgerListener {
    pub async fn connect(ws_url: &str, ledger: Address) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .connect(ws_url)
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))?
            .erased();
        let filter = Filter::new()
            .address(ledger)
            .from_block(BlockNumberOrTag::Latest);
        Ok(Self { provider, filter })
    }

    /// Decoded events as they are mined. Logs that fail to decode are dropped with a warning.
    pub async fn stream(&self) -> Result<BoxStream<'static, ObservedEvent>> {
        let subscription = self
            .provider
            .subscribe_logs(&self.filter)
            .await
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        Ok(subscription
            .into_stream()
            .filter_map(|log| async move {
                match ObservedEvent::from_log(&log) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Dropping ledger log: {e}");
                        None
                    }
                }
            })
            .boxed())
    }
}
