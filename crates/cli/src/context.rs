// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::helpers::wallet::ask_for_signer;
use alloy::signers::local::PrivateKeySigner;
use anyhow::Result;
use ct_config::ChainProfile;
use ct_ledger::{LedgerContract, LedgerReadContract, LedgerWriteContract};
use ct_market::HttpMarketplace;
use ct_transfer::TransferOrchestrator;
use tracing::info;
use zeroize::Zeroizing;

pub type Orchestrator =
    TransferOrchestrator<LedgerWriteContract, HttpMarketplace, PrivateKeySigner>;

/// The selected chain profile plus whatever wallet key the user supplied.
pub struct Context {
    profile: ChainProfile,
    private_key: Option<Zeroizing<String>>,
}

impl Context {
    pub fn new(profile: ChainProfile, private_key: Option<Zeroizing<String>>) -> Self {
        Self {
            profile,
            private_key,
        }
    }

    pub fn profile(&self) -> &ChainProfile {
        &self.profile
    }

    pub fn has_wallet(&self) -> bool {
        self.private_key.is_some()
    }

    /// The wallet from `--private-key`/`CT_PRIVATE_KEY`, prompting when neither is set.
    pub fn signer(&self) -> Result<PrivateKeySigner> {
        ask_for_signer(self.private_key.clone())
    }

    pub fn http_rpc_url(&self) -> Result<String> {
        self.profile.rpc()?.as_http_url()
    }

    pub async fn reader(&self) -> Result<LedgerReadContract> {
        let url = self.http_rpc_url()?;
        Ok(LedgerContract::read_only(&url, self.profile.ledger).await?)
    }

    pub async fn orchestrator(&self) -> Result<Orchestrator> {
        self.profile.validate()?;
        let signer = self.signer()?;
        info!(
            chain = %self.profile.name,
            account = %signer.address(),
            ledger = %self.profile.ledger,
            "Connecting"
        );

        let url = self.http_rpc_url()?;
        let ledger = LedgerContract::new(&url, signer.clone(), self.profile.ledger).await?;
        let market = HttpMarketplace::new(
            self.profile.market_url()?,
            self.profile.chain_id,
            self.profile.timeouts.network(),
        )?
        .with_signer(signer.clone());

        Ok(TransferOrchestrator::new(
            self.profile.clone(),
            ledger,
            market,
            signer,
        ))
    }
}
