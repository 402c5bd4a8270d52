// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::{
    primitives::{Address, U256},
    signers::local::PrivateKeySigner,
};
use anyhow::Result;
use ct_crypto::{decrypt_amount, decrypt_balance, encrypt_amount, scale_to_base_units, KeyPair};
use ct_ledger::{DatasetOrder, LedgerEvent, LedgerRead, LedgerWrite};
use ct_request::{verify_request_order, TransferPayload};
use ct_test_helpers::{
    test_profile, with_tracing, InMemoryLedger, OfferSigners, ScriptedMarketplace, APP, DATASET,
    LEDGER_ADDRESS, ORACLE_ADDRESS, WORKERPOOL,
};
use ct_transfer::{TransferErrorKind, TransferOrchestrator};
use std::time::Duration;

type Orchestrator = TransferOrchestrator<InMemoryLedger, ScriptedMarketplace, PrivateKeySigner>;

struct Deployment {
    keys: KeyPair,
    offers: OfferSigners,
    market: ScriptedMarketplace,
    ledger: InMemoryLedger,
    owner: PrivateKeySigner,
}

impl Deployment {
    fn new() -> Self {
        let keys = KeyPair::generate();
        let owner = PrivateKeySigner::random();
        let ledger = InMemoryLedger::new(keys.public, owner.address());
        let offers = OfferSigners::default();
        let market = ScriptedMarketplace::new();
        market.list_app(offers.app_offer());
        market.list_workerpool(offers.workerpool_offer());
        Self {
            keys,
            offers,
            market,
            ledger,
            owner,
        }
    }

    fn orchestrator(&self, wallet: &PrivateKeySigner) -> Orchestrator {
        TransferOrchestrator::new(
            test_profile(),
            self.ledger.connect(wallet.address()),
            self.market.clone(),
            wallet.clone(),
        )
        .with_settlement_poll(Duration::from_millis(10))
    }

    fn tokens(&self, n: u64) -> U256 {
        scale_to_base_units(U256::from(n), 18).unwrap()
    }
}

#[tokio::test]
async fn minted_balance_decrypts_with_the_tee_key() -> Result<()> {
    let _guard = with_tracing("info");
    let d = Deployment::new();
    let alice = Address::repeat_byte(0xa1);

    let receipt = d.orchestrator(&d.owner).mint(alice, d.tokens(1000)).await?;
    assert!(receipt.success);
    assert!(matches!(
        receipt.events.as_slice(),
        [LedgerEvent::Mint { to, .. }] if *to == alice
    ));

    let stored = d.ledger.balance_of(alice).await?;
    assert_eq!(decrypt_balance(&d.keys.secret, &stored)?, d.tokens(1000));
    Ok(())
}

#[tokio::test]
async fn transfer_settles_once_the_oracle_writes_back() -> Result<()> {
    let _guard = with_tracing("info");
    let d = Deployment::new();
    let alice = PrivateKeySigner::random();
    let bob = Address::repeat_byte(0xb0);

    d.orchestrator(&d.owner)
        .mint(alice.address(), d.tokens(1000))
        .await?;

    let sender = d.orchestrator(&alice);
    let outcome = sender.transfer(bob, d.tokens(100)).await?;
    assert!(outcome.receipt.success);
    assert!(outcome
        .receipt
        .find(|e| e.is_transfer_request(alice.address(), bob, &outcome.amount))
        .is_some());
    assert_eq!(d.ledger.escrow_received(), U256::from(1000u64));
    assert_eq!(
        decrypt_amount(&d.keys.secret, &outcome.amount)?,
        d.tokens(100)
    );

    // The TEE computes the new balances and the oracle records them
    let oracle = d.ledger.connect(ORACLE_ADDRESS);
    oracle
        .update_balance(
            alice.address(),
            bob,
            &encrypt_amount(&d.keys.public, d.tokens(900))?,
            &encrypt_amount(&d.keys.public, d.tokens(100))?,
        )
        .await?;

    let update = sender.await_outcome(&outcome).await?;
    assert_eq!(update.sender, alice.address());
    assert_eq!(update.recipient, bob);
    assert_eq!(
        decrypt_balance(&d.keys.secret, &d.ledger.balance_of(alice.address()).await?)?,
        d.tokens(900)
    );
    assert_eq!(
        decrypt_balance(&d.keys.secret, &d.ledger.balance_of(bob).await?)?,
        d.tokens(100)
    );
    Ok(())
}

#[tokio::test]
async fn published_request_order_describes_the_transfer() -> Result<()> {
    let d = Deployment::new();
    let alice = PrivateKeySigner::random();
    let bob = Address::repeat_byte(0xb0);

    let outcome = d.orchestrator(&alice).transfer(bob, U256::from(42u64)).await?;

    let published = d.market.published();
    assert_eq!(published.len(), 1);
    let signed = &published[0];
    assert_eq!(signed, &outcome.request_order);

    let order = &signed.order;
    assert_eq!(order.app, APP);
    assert_eq!(order.workerpool, WORKERPOOL);
    assert_eq!(order.dataset, Address::ZERO);
    assert_eq!(order.requester, alice.address());
    assert_eq!(order.beneficiary, LEDGER_ADDRESS);
    assert_eq!(order.callback, LEDGER_ADDRESS);
    assert_eq!(order.volume, U256::from(1u64));
    assert_eq!(order.tag, d.offers.app_offer().order().tag);
    assert_eq!(order.category, d.offers.workerpool_offer().order().category);

    let payload = TransferPayload::parse(&order.params)?;
    assert_eq!(payload.sender, alice.address());
    assert_eq!(payload.recipient, bob);
    assert_eq!(payload.amount, outcome.amount);

    assert_eq!(
        verify_request_order(signed, d.offers.domain())?,
        alice.address()
    );
    Ok(())
}

#[tokio::test]
async fn every_transfer_gets_a_fresh_salt() -> Result<()> {
    let d = Deployment::new();
    let alice = PrivateKeySigner::random();
    let sender = d.orchestrator(&alice);

    let first = sender.transfer(Address::repeat_byte(0xb0), U256::from(1u64)).await?;
    let second = sender.transfer(Address::repeat_byte(0xb0), U256::from(1u64)).await?;
    assert_ne!(first.request_order.order.salt, second.request_order.order.salt);
    assert_ne!(first.amount, second.amount);
    Ok(())
}

#[tokio::test]
async fn settlement_ignores_earlier_transfers() -> Result<()> {
    let d = Deployment::new();
    let alice = PrivateKeySigner::random();
    let bob = Address::repeat_byte(0xb0);
    let sender = d.orchestrator(&alice);
    let oracle = d.ledger.connect(ORACLE_ADDRESS);
    let cipher = encrypt_amount(&d.keys.public, U256::from(1u64))?;

    let first = sender.transfer(bob, U256::from(1u64)).await?;
    oracle.update_balance(alice.address(), bob, &cipher, &cipher).await?;
    sender.await_outcome(&first).await?;

    let second = sender.transfer(bob, U256::from(1u64)).await?;
    let err = sender
        .await_settlement(
            alice.address(),
            bob,
            second.submitted_after_block + 1,
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
    assert!(matches!(err.kind, TransferErrorKind::SettlementTimeout { .. }));
    assert!(err.is_ambiguous());
    Ok(())
}

#[tokio::test]
async fn store_orders_records_an_empty_dataset_by_default() -> Result<()> {
    let d = Deployment::new();
    let receipt = d.orchestrator(&d.owner).store_orders().await?;
    assert!(receipt
        .find(|e| matches!(e, LedgerEvent::OrdersStored { dataset, .. } if dataset.is_zero()))
        .is_some());

    let stored = d.ledger.stored_orders();
    assert_eq!(stored.len(), 1);
    let (app, workerpool, dataset) = &stored[0];
    assert_eq!(app.app, APP);
    assert_eq!(&app.sign, d.offers.app_offer().sign());
    assert_eq!(workerpool.workerpool, WORKERPOOL);
    assert_eq!(dataset, &DatasetOrder::empty());
    Ok(())
}

#[tokio::test]
async fn store_orders_includes_a_configured_dataset() -> Result<()> {
    let d = Deployment::new();
    d.market.list_dataset(d.offers.dataset_offer());
    let mut profile = test_profile();
    profile.dataset = Some(DATASET);

    let orchestrator = TransferOrchestrator::new(
        profile,
        d.ledger.connect(d.owner.address()),
        d.market.clone(),
        d.owner.clone(),
    );
    orchestrator.store_orders().await?;

    let stored = d.ledger.stored_orders();
    assert_eq!(stored[0].2.dataset, DATASET);
    assert!(!stored[0].2.sign.is_empty());
    Ok(())
}
