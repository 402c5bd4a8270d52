// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::bindings::{AppOrder, DatasetOrder, PrivateERC20, WorkerpoolOrder};
use crate::error::{LedgerError, Result};
use crate::events::{BalanceUpdated, LedgerEvent, ObservedEvent};
use crate::traits::{LedgerRead, LedgerWrite, TxReceipt};
use alloy::{
    network::{EthereumWallet, ReceiptResponse},
    primitives::{Address, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{Filter, TransactionReceipt},
    signers::local::PrivateKeySigner,
    sol_types::SolEvent,
};
use async_trait::async_trait;
use ct_crypto::{EncryptedAmount, PublicKey};
use std::{fmt::Display, marker::PhantomData, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Marker for a contract handle that can only read
#[derive(Clone)]
pub struct ReadOnly;

/// Marker for a contract handle backed by a wallet
#[derive(Clone)]
pub struct ReadWrite;

/// The confidential token, reached over an alloy provider.
#[derive(Clone)]
pub struct LedgerContract<T> {
    provider: DynProvider,
    address: Address,
    account: Address,
    poll_interval: Duration,
    write_lock: Arc<Mutex<()>>,
    _marker: PhantomData<T>,
}

pub type LedgerReadContract = LedgerContract<ReadOnly>;
pub type LedgerWriteContract = LedgerContract<ReadWrite>;

fn rpc_error(err: impl Display) -> LedgerError {
    LedgerError::from_rpc_message(err.to_string())
}

impl LedgerContract<ReadOnly> {
    pub async fn read_only(http_rpc_url: &str, address: Address) -> Result<Self> {
        let provider = ProviderBuilder::new()
            .connect(http_rpc_url)
            .await
            .map_err(rpc_error)?
            .erased();

        Ok(Self {
            provider,
            address,
            account: Address::ZERO,
            poll_interval: DEFAULT_POLL_INTERVAL,
            write_lock: Arc::new(Mutex::new(())),
            _marker: PhantomData,
        })
    }
}

impl LedgerContract<ReadWrite> {
    pub async fn new(
        http_rpc_url: &str,
        signer: PrivateKeySigner,
        address: Address,
    ) -> Result<Self> {
        let account = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .with_cached_nonce_management()
            .connect(http_rpc_url)
            .await
            .map_err(rpc_error)?
            .erased();

        Ok(Self {
            provider,
            address,
            account,
            poll_interval: DEFAULT_POLL_INTERVAL,
            write_lock: Arc::new(Mutex::new(())),
            _marker: PhantomData,
        })
    }
}

impl<T> LedgerContract<T> {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    fn instance(&self) -> PrivateERC20::PrivateERC20Instance<DynProvider> {
        PrivateERC20::new(self.address, self.provider.clone())
    }

    fn to_receipt(&self, receipt: &TransactionReceipt) -> TxReceipt {
        let events = receipt
            .inner
            .logs()
            .iter()
            .filter(|log| log.address() == self.address)
            .filter_map(|log| match LedgerEvent::from_log(log) {
                Ok(event) => event,
                Err(e) => {
                    warn!("Skipping undecodable ledger log in {}: {e}", receipt.transaction_hash);
                    None
                }
            })
            .collect();

        TxReceipt {
            hash: receipt.transaction_hash,
            success: receipt.status(),
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            events,
        }
    }

    async fn logs(&self, filter: Filter) -> Result<Vec<ObservedEvent>> {
        let logs = self.provider.get_logs(&filter).await.map_err(rpc_error)?;
        debug!("Fetched {} ledger logs", logs.len());
        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            if let Some(event) = ObservedEvent::from_log(log)? {
                events.push(event);
            }
        }
        Ok(events)
    }
}

#[async_trait]
impl<T: Send + Sync> LedgerRead for LedgerContract<T> {
    fn address(&self) -> Address {
        self.address
    }

    async fn encryption_public_key(&self) -> Result<PublicKey> {
        let raw = self
            .instance()
            .encryptionPublicKey()
            .call()
            .await
            .map_err(rpc_error)?;
        Ok(PublicKey::from_bytes(&raw)?)
    }

    async fn decimals(&self) -> Result<u8> {
        self.instance().decimals().call().await.map_err(rpc_error)
    }

    async fn balance_of(&self, account: Address) -> Result<EncryptedAmount> {
        let raw = self
            .instance()
            .balanceOf(account)
            .call()
            .await
            .map_err(rpc_error)?;
        Ok(raw.into())
    }

    async fn block_number(&self) -> Result<u64> {
        self.provider.get_block_number().await.map_err(rpc_error)
    }

    async fn wait_for_receipt(&self, tx: B256) -> Result<TxReceipt> {
        loop {
            match self
                .provider
                .get_transaction_receipt(tx)
                .await
                .map_err(rpc_error)?
            {
                Some(receipt) => return Ok(self.to_receipt(&receipt)),
                None => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    async fn balance_updates(
        &self,
        sender: Address,
        recipient: Address,
        from_block: u64,
    ) -> Result<Vec<BalanceUpdated>> {
        let filter = Filter::new()
            .address(self.address)
            .event_signature(PrivateERC20::BalanceUpdate::SIGNATURE_HASH)
            .topic1(sender.into_word())
            .topic2(recipient.into_word())
            .from_block(from_block);

        Ok(self
            .logs(filter)
            .await?
            .into_iter()
            .filter_map(|observed| match observed.event {
                LedgerEvent::BalanceUpdate(update)
                    if update.sender == sender && update.recipient == recipient =>
                {
                    Some(update)
                }
                _ => None,
            })
            .collect())
    }

    async fn events_since(&self, from_block: u64) -> Result<Vec<ObservedEvent>> {
        self.logs(Filter::new().address(self.address).from_block(from_block))
            .await
    }
}

#[async_trait]
impl LedgerWrite for LedgerContract<ReadWrite> {
    fn account(&self) -> Address {
        self.account
    }

    async fn mint(&self, to: Address, amount: &EncryptedAmount) -> Result<B256> {
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }
        let _guard = self.write_lock.lock().await;
        let pending = self
            .instance()
            .mint(to, amount.to_bytes())
            .send()
            .await
            .map_err(rpc_error)?;
        Ok(*pending.tx_hash())
    }

    async fn transfer(&self, to: Address, amount: &EncryptedAmount, escrow: U256) -> Result<B256> {
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }
        if to == self.account {
            return Err(LedgerError::SelfTransfer);
        }
        let _guard = self.write_lock.lock().await;
        let pending = self
            .instance()
            .transfer(to, amount.to_bytes())
            .value(escrow)
            .send()
            .await
            .map_err(rpc_error)?;
        Ok(*pending.tx_hash())
    }

    async fn store_orders(
        &self,
        app: &AppOrder,
        workerpool: &WorkerpoolOrder,
        dataset: &DatasetOrder,
    ) -> Result<B256> {
        let _guard = self.write_lock.lock().await;
        let pending = self
            .instance()
            .storeOrders(app.clone(), workerpool.clone(), dataset.clone())
            .send()
            .await
            .map_err(rpc_error)?;
        Ok(*pending.tx_hash())
    }

    async fn update_balance(
        &self,
        sender: Address,
        recipient: Address,
        new_sender_balance: &EncryptedAmount,
        new_recipient_balance: &EncryptedAmount,
    ) -> Result<B256> {
        let _guard = self.write_lock.lock().await;
        let pending = self
            .instance()
            .updateBalance(
                sender,
                recipient,
                new_sender_balance.to_bytes(),
                new_recipient_balance.to_bytes(),
            )
            .send()
            .await
            .map_err(rpc_error)?;
        Ok(*pending.tx_hash())
    }
}
