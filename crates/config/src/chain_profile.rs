// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::rpc::RpcEndpoint;
use alloy_primitives::{Address, U256};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};
use url::Url;

/// Per-call deadlines. Every network call made during a transfer is bounded by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Timeouts {
    /// Marketplace queries, ledger reads and the ledger submission itself
    pub network_ms: u64,
    /// Waiting for a submitted transaction to be mined
    pub confirmation_ms: u64,
    /// Waiting for the TEE to write back a `BalanceUpdate`
    pub settlement_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            network_ms: 30_000,
            confirmation_ms: 120_000,
            settlement_ms: 600_000,
        }
    }
}

impl Timeouts {
    pub fn network(&self) -> Duration {
        Duration::from_millis(self.network_ms)
    }

    pub fn confirmation(&self) -> Duration {
        Duration::from_millis(self.confirmation_ms)
    }

    pub fn settlement(&self) -> Duration {
        Duration::from_millis(self.settlement_ms)
    }
}

/// Everything the transfer flow needs to know about one deployment.
///
/// Loaded once by the configuration layer and handed to the orchestrator explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChainProfile {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    /// The confidential token contract
    pub ledger: Address,
    /// The marketplace contract orders are signed against (EIP-712 verifying contract)
    pub hub: Address,
    /// Base url of the marketplace orderbook api
    pub market_api: String,
    pub app: Address,
    pub workerpool: Address,
    #[serde(default)]
    pub dataset: Option<Address>,
    /// Payment attached to `transfer`, in wei, as a decimal or 0x string
    #[serde(default = "default_escrow")]
    pub escrow_payment: String,
    #[serde(default)]
    pub timeouts: Timeouts,
}

fn default_escrow() -> String {
    "0".to_string()
}

impl ChainProfile {
    pub fn rpc(&self) -> Result<RpcEndpoint> {
        RpcEndpoint::from_url(&self.rpc_url)
            .with_context(|| format!("Failed to parse RPC URL for chain {}", self.name))
    }

    pub fn market_url(&self) -> Result<Url> {
        Url::parse(&self.market_api)
            .with_context(|| format!("Failed to parse market api URL for chain {}", self.name))
    }

    pub fn escrow_payment(&self) -> Result<U256> {
        U256::from_str(self.escrow_payment.trim()).with_context(|| {
            format!(
                "escrow_payment '{}' for chain {} is not an integer amount of wei",
                self.escrow_payment, self.name
            )
        })
    }

    /// The dataset to request, if the deployment uses one.
    pub fn dataset(&self) -> Option<Address> {
        self.dataset.filter(|d| !d.is_zero())
    }

    pub fn validate(&self) -> Result<()> {
        self.rpc()?;
        self.market_url()?;
        self.escrow_payment()?;
        for (label, address) in [
            ("ledger", self.ledger),
            ("hub", self.hub),
            ("app", self.app),
            ("workerpool", self.workerpool),
        ] {
            if address.is_zero() {
                bail!("Chain {}: `{}` must not be the zero address", self.name, label);
            }
        }
        if self.timeouts.network_ms == 0 || self.timeouts.confirmation_ms == 0 {
            bail!("Chain {}: timeouts must be greater than zero", self.name);
        }
        Ok(())
    }
}
