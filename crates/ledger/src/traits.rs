// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::bindings::{AppOrder, DatasetOrder, WorkerpoolOrder};
use crate::error::Result;
use crate::events::{BalanceUpdated, LedgerEvent, ObservedEvent};
use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use ct_crypto::{EncryptedAmount, PublicKey};

/// What the ledger reports about a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub hash: B256,
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Ledger events emitted by this transaction
    pub events: Vec<LedgerEvent>,
}

impl TxReceipt {
    pub fn find(&self, pred: impl Fn(&LedgerEvent) -> bool) -> Option<&LedgerEvent> {
        self.events.iter().find(|e| pred(e))
    }
}

/// Read-only operations on the confidential token.
#[async_trait]
pub trait LedgerRead: Send + Sync {
    /// The contract address. Request orders use it as beneficiary and callback.
    fn address(&self) -> Address;

    /// The key every balance is encrypted under.
    async fn encryption_public_key(&self) -> Result<PublicKey>;

    async fn decimals(&self) -> Result<u8>;

    /// The ciphertext held for `account`. A never-minted account reads as empty.
    async fn balance_of(&self, account: Address) -> Result<EncryptedAmount>;

    async fn block_number(&self) -> Result<u64>;

    /// Block until the transaction is mined. Callers bound this with a deadline.
    async fn wait_for_receipt(&self, tx: B256) -> Result<TxReceipt>;

    /// `BalanceUpdate` events for the pair, mined at or after `from_block`.
    async fn balance_updates(
        &self,
        sender: Address,
        recipient: Address,
        from_block: u64,
    ) -> Result<Vec<BalanceUpdated>>;

    /// Every ledger event mined at or after `from_block`.
    async fn events_since(&self, from_block: u64) -> Result<Vec<ObservedEvent>>;
}

/// State-changing operations. Each returns the submitted transaction hash as soon as the
/// node accepts it; confirmation is a separate [`LedgerRead::wait_for_receipt`].
#[async_trait]
pub trait LedgerWrite: LedgerRead {
    /// The account transactions are sent from.
    fn account(&self) -> Address;

    async fn mint(&self, to: Address, amount: &EncryptedAmount) -> Result<B256>;

    /// Request a confidential transfer. `escrow` pays for the TEE computation.
    async fn transfer(&self, to: Address, amount: &EncryptedAmount, escrow: U256) -> Result<B256>;

    async fn store_orders(
        &self,
        app: &AppOrder,
        workerpool: &WorkerpoolOrder,
        dataset: &DatasetOrder,
    ) -> Result<B256>;

    /// Oracle only.
    async fn update_balance(
        &self,
        sender: Address,
        recipient: Address,
        new_sender_balance: &EncryptedAmount,
        new_recipient_balance: &EncryptedAmount,
    ) -> Result<B256>;
}
