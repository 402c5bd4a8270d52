// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::{
    primitives::{Address, B256, U256},
    signers::local::PrivateKeySigner,
};
use anyhow::Result;
use async_trait::async_trait;
use ct_crypto::{decrypt_amount, CryptoError, EncryptedAmount, KeyPair, PublicKey, SecretKey};
use ct_ledger::{
    AppOrder, BalanceUpdated, DatasetOrder, LedgerError, LedgerEvent, LedgerRead, LedgerWrite,
    ObservedEvent, TxReceipt, WorkerpoolOrder,
};
use ct_market::{MarketError, OrderKind};
use ct_request::RequestError;
use ct_test_helpers::{
    test_profile, InMemoryLedger, OfferSigners, ScriptedMarketplace, APP, WORKERPOOL,
};
use ct_transfer::{TransferError, TransferErrorKind, TransferOrchestrator, TransferStage};
use std::time::Duration;

const BOB: Address = Address::repeat_byte(0xb0);

/// A ledger whose node accepts the transfer but drops the connection before answering.
struct DroppedReply(InMemoryLedger);

#[async_trait]
impl LedgerRead for DroppedReply {
    fn address(&self) -> Address {
        self.0.address()
    }

    async fn encryption_public_key(&self) -> ct_ledger::Result<PublicKey> {
        self.0.encryption_public_key().await
    }

    async fn decimals(&self) -> ct_ledger::Result<u8> {
        self.0.decimals().await
    }

    async fn balance_of(&self, account: Address) -> ct_ledger::Result<EncryptedAmount> {
        self.0.balance_of(account).await
    }

    async fn block_number(&self) -> ct_ledger::Result<u64> {
        self.0.block_number().await
    }

    async fn wait_for_receipt(&self, tx: B256) -> ct_ledger::Result<TxReceipt> {
        self.0.wait_for_receipt(tx).await
    }

    async fn balance_updates(
        &self,
        sender: Address,
        recipient: Address,
        from_block: u64,
    ) -> ct_ledger::Result<Vec<BalanceUpdated>> {
        self.0.balance_updates(sender, recipient, from_block).await
    }

    async fn events_since(&self, from_block: u64) -> ct_ledger::Result<Vec<ObservedEvent>> {
        self.0.events_since(from_block).await
    }
}

#[async_trait]
impl LedgerWrite for DroppedReply {
    fn account(&self) -> Address {
        self.0.account()
    }

    async fn mint(&self, to: Address, amount: &EncryptedAmount) -> ct_ledger::Result<B256> {
        self.0.mint(to, amount).await
    }

    async fn transfer(
        &self,
        to: Address,
        amount: &EncryptedAmount,
        escrow: U256,
    ) -> ct_ledger::Result<B256> {
        self.0.transfer(to, amount, escrow).await?;
        Err(LedgerError::Network("connection reset by peer".to_string()))
    }

    async fn store_orders(
        &self,
        app: &AppOrder,
        workerpool: &WorkerpoolOrder,
        dataset: &DatasetOrder,
    ) -> ct_ledger::Result<B256> {
        self.0.store_orders(app, workerpool, dataset).await
    }

    async fn update_balance(
        &self,
        sender: Address,
        recipient: Address,
        new_sender_balance: &EncryptedAmount,
        new_recipient_balance: &EncryptedAmount,
    ) -> ct_ledger::Result<B256> {
        self.0
            .update_balance(sender, recipient, new_sender_balance, new_recipient_balance)
            .await
    }
}

struct Harness {
    keys: KeyPair,
    alice: PrivateKeySigner,
    ledger: InMemoryLedger,
    market: ScriptedMarketplace,
    offers: OfferSigners,
}

impl Harness {
    /// A deployment where the app and workerpool have not listed anything yet.
    fn unlisted() -> Self {
        let keys = KeyPair::generate();
        let alice = PrivateKeySigner::random();
        let ledger = InMemoryLedger::new(keys.public, alice.address());
        Self {
            keys,
            alice,
            ledger,
            market: ScriptedMarketplace::new(),
            offers: OfferSigners::default(),
        }
    }

    fn listed() -> Self {
        let h = Self::unlisted();
        h.market.list_app(h.offers.app_offer());
        h.market.list_workerpool(h.offers.workerpool_offer());
        h
    }

    fn orchestrator(
        &self,
    ) -> TransferOrchestrator<InMemoryLedger, ScriptedMarketplace, PrivateKeySigner> {
        TransferOrchestrator::new(
            test_profile(),
            self.ledger.clone(),
            self.market.clone(),
            self.alice.clone(),
        )
    }

    async fn transfer(&self, to: Address) -> std::result::Result<(), TransferError> {
        self.orchestrator()
            .transfer(to, U256::from(100u64))
            .await
            .map(|_| ())
    }

    fn assert_untouched(&self) {
        assert_eq!(self.ledger.write_calls(), 0);
        assert!(self.market.published().is_empty());
    }
}

#[tokio::test]
async fn recipient_must_be_set() {
    let h = Harness::listed();
    let err = h.transfer(Address::ZERO).await.unwrap_err();
    assert_eq!(err.stage, TransferStage::Idle);
    assert_eq!(err.kind, TransferErrorKind::InvalidRecipient);
    assert_eq!(h.market.queries(), 0);
    h.assert_untouched();
}

#[tokio::test]
async fn sender_cannot_pay_itself() {
    let h = Harness::listed();
    let err = h.transfer(h.alice.address()).await.unwrap_err();
    assert_eq!(err.kind, TransferErrorKind::SelfTransfer);
    assert!(!err.is_retriable());
    assert_eq!(h.market.queries(), 0);
    h.assert_untouched();
}

#[tokio::test]
async fn mint_to_zero_is_refused_before_encryption() {
    let h = Harness::listed();
    let err = h
        .orchestrator()
        .mint(Address::ZERO, U256::from(1u64))
        .await
        .unwrap_err();
    assert_eq!(err.kind, TransferErrorKind::InvalidRecipient);
    h.assert_untouched();
}

#[tokio::test]
async fn no_app_offer_means_no_ledger_write() {
    let h = Harness::unlisted();
    h.market.list_workerpool(h.offers.workerpool_offer());

    let err = h.transfer(BOB).await.unwrap_err();
    assert_eq!(err.stage, TransferStage::AmountEncrypted);
    assert_eq!(
        err.kind,
        TransferErrorKind::Market(MarketError::NoOfferAvailable {
            kind: OrderKind::App,
            resource: APP,
        })
    );
    assert!(err.is_retriable());
    h.assert_untouched();
}

#[tokio::test]
async fn no_workerpool_offer_means_no_ledger_write() {
    let h = Harness::unlisted();
    h.market.list_app(h.offers.app_offer());

    let err = h.transfer(BOB).await.unwrap_err();
    assert!(matches!(
        err.kind,
        TransferErrorKind::Market(MarketError::NoOfferAvailable {
            kind: OrderKind::Workerpool,
            resource,
        }) if resource == WORKERPOOL
    ));
    h.assert_untouched();
}

#[tokio::test]
async fn forged_offer_is_not_used() {
    let h = Harness::unlisted();
    let mut forged = h.offers.app_offer();
    forged.signer = PrivateKeySigner::random().address();
    h.market.list_app(forged);
    h.market.list_workerpool(h.offers.workerpool_offer());

    let err = h.transfer(BOB).await.unwrap_err();
    assert!(matches!(
        err.kind,
        TransferErrorKind::Market(MarketError::InvalidOffer {
            kind: OrderKind::App,
            ..
        })
    ));
    assert!(!err.is_retriable());
    h.assert_untouched();
}

#[tokio::test]
async fn offers_signed_for_another_chain_are_rejected() {
    let h = Harness::unlisted();
    let elsewhere = OfferSigners::new(1, Address::repeat_byte(0x99));
    h.market.list_app(elsewhere.app_offer());
    h.market.list_workerpool(h.offers.workerpool_offer());

    let err = h.transfer(BOB).await.unwrap_err();
    assert!(matches!(
        err.kind,
        TransferErrorKind::Market(MarketError::InvalidOffer { .. })
    ));
    h.assert_untouched();
}

#[tokio::test]
async fn signer_must_own_the_sending_account() {
    let h = Harness::listed();
    let orchestrator = TransferOrchestrator::new(
        test_profile(),
        h.ledger.connect(BOB),
        h.market.clone(),
        h.alice.clone(),
    );

    let err = orchestrator
        .transfer(Address::repeat_byte(0xc0), U256::from(1u64))
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind,
        TransferErrorKind::Request(RequestError::Signing { .. })
    ));
    h.assert_untouched();
}

#[tokio::test]
async fn marketplace_outage_is_retriable() {
    let h = Harness::listed();
    h.market
        .fail_with(MarketError::Network("connection refused".to_string()));

    let err = h.transfer(BOB).await.unwrap_err();
    assert_eq!(err.stage, TransferStage::AmountEncrypted);
    assert!(err.is_retriable());
    h.assert_untouched();
}

#[tokio::test]
async fn slow_marketplace_times_out_before_submission() {
    let h = Harness::listed();
    h.market.delay(Duration::from_secs(5));

    let err = h.transfer(BOB).await.unwrap_err();
    assert_eq!(err.stage, TransferStage::AmountEncrypted);
    assert!(matches!(
        err.kind,
        TransferErrorKind::Timeout {
            operation: "fetch app order",
            ..
        }
    ));
    assert!(err.is_retriable());
    assert!(!err.is_ambiguous());
    h.assert_untouched();
}

#[tokio::test]
async fn unreachable_ledger_times_out_before_encryption() {
    let h = Harness::listed();
    h.ledger.stall_reads();

    let err = h.transfer(BOB).await.unwrap_err();
    assert_eq!(err.stage, TransferStage::Idle);
    assert!(matches!(err.kind, TransferErrorKind::Timeout { .. }));
    assert_eq!(h.market.queries(), 0);
    h.assert_untouched();
}

#[tokio::test]
async fn unconfirmed_transfer_is_ambiguous() {
    let h = Harness::listed();
    h.ledger.stall_receipts();

    let err = h.transfer(BOB).await.unwrap_err();
    assert_eq!(err.stage, TransferStage::TransferSubmitted);
    assert!(matches!(
        err.kind,
        TransferErrorKind::ConfirmationTimeout { tx: Some(_), .. }
    ));
    assert!(err.is_ambiguous());
    assert!(!err.is_retriable());
    assert_eq!(h.ledger.write_calls(), 1);
    assert_eq!(h.market.published().len(), 1);
}

#[tokio::test]
async fn hung_submission_is_ambiguous() {
    let h = Harness::listed();
    h.ledger.stall_submissions();

    let err = h.transfer(BOB).await.unwrap_err();
    assert_eq!(err.stage, TransferStage::TransferSubmitted);
    assert!(matches!(
        err.kind,
        TransferErrorKind::ConfirmationTimeout { tx: None, .. }
    ));
    assert!(err.is_ambiguous());
}

#[tokio::test]
async fn dropped_submission_reply_is_ambiguous() {
    let h = Harness::listed();
    let orchestrator = TransferOrchestrator::new(
        test_profile(),
        DroppedReply(h.ledger.clone()),
        h.market.clone(),
        h.alice.clone(),
    );

    let err = orchestrator
        .transfer(BOB, U256::from(100u64))
        .await
        .unwrap_err();
    assert_eq!(err.stage, TransferStage::TransferSubmitted);
    assert!(matches!(
        err.kind,
        TransferErrorKind::ConfirmationTimeout { tx: None, .. }
    ));
    assert!(err.is_ambiguous());
    assert!(!err.is_retriable());

    assert_eq!(h.ledger.write_calls(), 1);
    assert!(h
        .ledger
        .events()
        .iter()
        .any(|e| matches!(e, LedgerEvent::TransferRequested { .. })));
}

#[tokio::test]
async fn reverted_transfer_is_rejected() {
    let h = Harness::listed();
    h.ledger.revert_next();

    let err = h.transfer(BOB).await.unwrap_err();
    assert_eq!(err.stage, TransferStage::Rejected);
    assert!(matches!(err.kind, TransferErrorKind::TransactionReverted(_)));
    assert!(!err.is_retriable());
    assert!(h.ledger.events().is_empty());
}

#[tokio::test]
async fn balances_stay_sealed_without_the_tee_key() -> Result<()> {
    let h = Harness::listed();
    let outcome = h.orchestrator().transfer(BOB, U256::from(7u64)).await?;

    assert_eq!(
        decrypt_amount(&SecretKey::random(), &outcome.amount),
        Err(CryptoError::Decryption)
    );
    assert_eq!(decrypt_amount(&h.keys.secret, &outcome.amount)?, U256::from(7u64));
    assert!(h.ledger.balance_of(BOB).await?.is_empty());
    Ok(())
}
