// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use ct_crypto::{EncryptedAmount, PublicKey};
use ct_ledger::{
    AppOrder, BalanceUpdated, DatasetOrder, LedgerError, LedgerEvent, LedgerRead, LedgerWrite,
    ObservedEvent, Result, TxReceipt, WorkerpoolOrder,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::debug;

pub const LEDGER_ADDRESS: Address = Address::repeat_byte(0x1e);
pub const ORACLE_ADDRESS: Address = Address::repeat_byte(0x0a);

#[derive(Default)]
struct State {
    balances: HashMap<Address, EncryptedAmount>,
    events: Vec<ObservedEvent>,
    receipts: HashMap<B256, TxReceipt>,
    block: u64,
    tx_count: u64,
    write_calls: usize,
    escrow_received: U256,
    stored_orders: Vec<(AppOrder, WorkerpoolOrder, DatasetOrder)>,
    revert_next: bool,
    stall_submission: bool,
    stall_receipts: bool,
    stall_reads: bool,
}

/// A ledger that keeps its state in memory and mines every write into its own block.
///
/// Handles made with [`InMemoryLedger::connect`] share state and differ only in the account they
/// send from, the same way several wallets see one contract.
#[derive(Clone)]
pub struct InMemoryLedger {
    state: Arc<Mutex<State>>,
    account: Address,
    oracle: Address,
    public_key: PublicKey,
    decimals: u8,
}

impl InMemoryLedger {
    pub fn new(public_key: PublicKey, account: Address) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            account,
            oracle: ORACLE_ADDRESS,
            public_key,
            decimals: 18,
        }
    }

    pub fn with_oracle(mut self, oracle: Address) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    /// Another handle on the same ledger, sending from `account`.
    pub fn connect(&self, account: Address) -> Self {
        Self {
            account,
            ..self.clone()
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// The next write is mined but fails.
    pub fn revert_next(&self) {
        self.state().revert_next = true;
    }

    /// Writes never come back from the node.
    pub fn stall_submissions(&self) {
        self.state().stall_submission = true;
    }

    /// Writes are accepted but never confirmed.
    pub fn stall_receipts(&self) {
        self.state().stall_receipts = true;
    }

    /// Reads hang until the caller gives up.
    pub fn stall_reads(&self) {
        self.state().stall_reads = true;
    }

    /// How many state-changing calls reached the ledger, successful or not.
    pub fn write_calls(&self) -> usize {
        self.state().write_calls
    }

    pub fn escrow_received(&self) -> U256 {
        self.state().escrow_received
    }

    pub fn stored_orders(&self) -> Vec<(AppOrder, WorkerpoolOrder, DatasetOrder)> {
        self.state().stored_orders.clone()
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.state().events.iter().map(|e| e.event.clone()).collect()
    }

    pub fn head(&self) -> u64 {
        self.state().block
    }

    async fn read_gate(&self) {
        let stalled = self.state().stall_reads;
        if stalled {
            std::future::pending::<()>().await;
        }
    }

    /// Count the call, then mine `apply` into a new block unless a failure was injected.
    async fn write(
        &self,
        apply: impl FnOnce(&mut State) -> Result<Vec<LedgerEvent>>,
    ) -> Result<B256> {
        let stalled = {
            let mut state = self.state();
            state.write_calls += 1;
            state.stall_submission
        };
        if stalled {
            std::future::pending::<()>().await;
        }

        let mut state = self.state();
        state.tx_count += 1;
        let hash = keccak256(state.tx_count.to_be_bytes());
        let revert = std::mem::take(&mut state.revert_next);
        let events = if revert { vec![] } else { apply(&mut *state)? };

        state.block += 1;
        let block = state.block;
        for event in &events {
            state.events.push(ObservedEvent {
                event: event.clone(),
                block_number: Some(block),
                tx_hash: Some(hash),
            });
        }
        state.receipts.insert(
            hash,
            TxReceipt {
                hash,
                success: !revert,
                block_number: Some(block),
                gas_used: 21_000,
                events,
            },
        );
        debug!(%hash, block, revert, "In-memory ledger mined a write");
        Ok(hash)
    }
}

#[async_trait]
impl LedgerRead for InMemoryLedger {
    fn address(&self) -> Address {
        LEDGER_ADDRESS
    }

    async fn encryption_public_key(&self) -> Result<PublicKey> {
        self.read_gate().await;
        Ok(self.public_key)
    }

    async fn decimals(&self) -> Result<u8> {
        self.read_gate().await;
        Ok(self.decimals)
    }

    async fn balance_of(&self, account: Address) -> Result<EncryptedAmount> {
        self.read_gate().await;
        Ok(self
            .state()
            .balances
            .get(&account)
            .cloned()
            .unwrap_or_default())
    }

    async fn block_number(&self) -> Result<u64> {
        self.read_gate().await;
        Ok(self.head())
    }

    async fn wait_for_receipt(&self, tx: B256) -> Result<TxReceipt> {
        let (stalled, receipt) = {
            let state = self.state();
            (state.stall_receipts, state.receipts.get(&tx).cloned())
        };
        if stalled {
            std::future::pending::<()>().await;
        }
        receipt.ok_or_else(|| LedgerError::Network(format!("unknown transaction {tx}")))
    }

    async fn balance_updates(
        &self,
        sender: Address,
        recipient: Address,
        from_block: u64,
    ) -> Result<Vec<BalanceUpdated>> {
        self.read_gate().await;
        Ok(self
            .state()
            .events
            .iter()
            .filter(|e| e.block_number.is_some_and(|b| b >= from_block))
            .filter_map(|e| e.event.as_balance_update())
            .filter(|u| u.sender == sender && u.recipient == recipient)
            .cloned()
            .collect())
    }

    async fn events_since(&self, from_block: u64) -> Result<Vec<ObservedEvent>> {
        self.read_gate().await;
        Ok(self
            .state()
            .events
            .iter()
            .filter(|e| e.block_number.is_some_and(|b| b >= from_block))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl LedgerWrite for InMemoryLedger {
    fn account(&self) -> Address {
        self.account
    }

    async fn mint(&self, to: Address, amount: &EncryptedAmount) -> Result<B256> {
        let amount = amount.clone();
        self.write(move |state| {
            if to.is_zero() {
                return Err(LedgerError::InvalidRecipient);
            }
            state.balances.insert(to, amount.clone());
            Ok(vec![LedgerEvent::Mint { to, amount }])
        })
        .await
    }

    async fn transfer(&self, to: Address, amount: &EncryptedAmount, escrow: U256) -> Result<B256> {
        let from = self.account;
        let amount = amount.clone();
        self.write(move |state| {
            if to.is_zero() {
                return Err(LedgerError::InvalidRecipient);
            }
            if to == from {
                return Err(LedgerError::SelfTransfer);
            }
            state.escrow_received += escrow;
            Ok(vec![LedgerEvent::TransferRequested {
                from,
                to,
                amount,
                escrow,
            }])
        })
        .await
    }

    async fn store_orders(
        &self,
        app: &AppOrder,
        workerpool: &WorkerpoolOrder,
        dataset: &DatasetOrder,
    ) -> Result<B256> {
        let orders = (app.clone(), workerpool.clone(), dataset.clone());
        self.write(move |state| {
            let event = LedgerEvent::OrdersStored {
                app: orders.0.app,
                workerpool: orders.1.workerpool,
                dataset: orders.2.dataset,
            };
            state.stored_orders.push(orders);
            Ok(vec![event])
        })
        .await
    }

    async fn update_balance(
        &self,
        sender: Address,
        recipient: Address,
        new_sender_balance: &EncryptedAmount,
        new_recipient_balance: &EncryptedAmount,
    ) -> Result<B256> {
        let caller = self.account;
        let oracle = self.oracle;
        let update = BalanceUpdated {
            sender,
            recipient,
            new_sender_balance: new_sender_balance.clone(),
            new_recipient_balance: new_recipient_balance.clone(),
        };
        self.write(move |state| {
            if caller != oracle {
                return Err(LedgerError::NotOracle);
            }
            state
                .balances
                .insert(sender, update.new_sender_balance.clone());
            state
                .balances
                .insert(recipient, update.new_recipient_balance.clone());
            Ok(vec![LedgerEvent::BalanceUpdate(update)])
        })
        .await
    }
}
