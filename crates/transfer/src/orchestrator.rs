// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{Result, TransferError, TransferErrorKind, TransferStage};
use crate::orders::{ledger_app_order, ledger_dataset_order, ledger_workerpool_order};
use alloy::{
    primitives::{Address, B256, U256},
    signers::Signer,
};
use ct_config::ChainProfile;
use ct_crypto::{encrypt_amount, EncryptedAmount};
use ct_ledger::{BalanceUpdated, LedgerError, LedgerEvent, LedgerWrite, TxReceipt};
use ct_market::{Marketplace, OrderResolver, SignedRequestOrder};
use ct_request::{sign_request_order, verify_request_order, RequestOrderBuilder, TransferPayload};
use std::{future::Future, time::Duration};
use tracing::{error, info, instrument, warn};

const DEFAULT_SETTLEMENT_POLL: Duration = Duration::from_secs(5);

/// Everything a settled transfer produced.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub sender: Address,
    pub recipient: Address,
    pub amount: EncryptedAmount,
    pub request_order: SignedRequestOrder,
    /// Hash the marketplace published the request order under
    pub order_hash: B256,
    pub receipt: TxReceipt,
    /// Chain head observed just before submission; the transfer lands after it
    pub submitted_after_block: u64,
}

/// Drives one confidential transfer from plaintext amount to an accepted ledger request.
///
/// The orchestrator holds no decryption key. It encrypts under the ledger's public key, buys a
/// TEE execution on the marketplace and asks the ledger to record the request; the TEE does the
/// rest. Transfers from one sender must not overlap.
pub struct TransferOrchestrator<L, M, S> {
    profile: ChainProfile,
    ledger: L,
    resolver: OrderResolver<M>,
    signer: S,
    settlement_poll: Duration,
}

impl<L, M, S> TransferOrchestrator<L, M, S>
where
    L: LedgerWrite,
    M: Marketplace,
    S: Signer + Send + Sync,
{
    pub fn new(profile: ChainProfile, ledger: L, market: M, signer: S) -> Self {
        let resolver = OrderResolver::new(market, profile.chain_id, profile.hub);
        Self {
            profile,
            ledger,
            resolver,
            signer,
            settlement_poll: DEFAULT_SETTLEMENT_POLL,
        }
    }

    pub fn with_settlement_poll(mut self, interval: Duration) -> Self {
        self.settlement_poll = interval;
        self
    }

    pub fn profile(&self) -> &ChainProfile {
        &self.profile
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn resolver(&self) -> &OrderResolver<M> {
        &self.resolver
    }

    pub fn sender(&self) -> Address {
        self.signer.address()
    }

    /// Run a network call under the per-call deadline. Only valid before anything was written.
    async fn bounded<T, E>(
        &self,
        stage: TransferStage,
        operation: &'static str,
        fut: impl Future<Output = std::result::Result<T, E>>,
    ) -> Result<T>
    where
        E: Into<TransferErrorKind>,
    {
        let after = self.profile.timeouts.network();
        match tokio::time::timeout(after, fut).await {
            Ok(result) => result.map_err(|e| TransferError::new(stage, e)),
            Err(_) => Err(TransferError::new(
                stage,
                TransferErrorKind::Timeout { operation, after },
            )),
        }
    }

    async fn encrypt(&self, stage: TransferStage, amount: U256) -> Result<EncryptedAmount> {
        let key = self
            .bounded(stage, "encryptionPublicKey", self.ledger.encryption_public_key())
            .await?;
        encrypt_amount(&key, amount).map_err(|e| TransferError::new(stage, e))
    }

    /// Send a ledger write and wait for it to be mined.
    ///
    /// Once the write has been handed to the node a missed deadline or a lost reply is a
    /// `ConfirmationTimeout`: the transaction may or may not land. Only errors the node or the
    /// client raised before broadcasting keep `stage`.
    async fn submit_and_confirm(
        &self,
        stage: TransferStage,
        operation: &'static str,
        write: impl Future<Output = ct_ledger::Result<B256>>,
    ) -> Result<TxReceipt> {
        let network = self.profile.timeouts.network();
        let tx = match tokio::time::timeout(network, write).await {
            Ok(Ok(tx)) => tx,
            Ok(Err(LedgerError::Network(reason))) => {
                warn!("{operation} submission lost its reply ({reason}); outcome unknown");
                return Err(TransferError::new(
                    TransferStage::TransferSubmitted,
                    TransferErrorKind::ConfirmationTimeout {
                        tx: None,
                        after: network,
                    },
                ));
            }
            Ok(Err(e)) => return Err(TransferError::new(stage, e)),
            Err(_) => {
                warn!("{operation} submission timed out after {network:?}; outcome unknown");
                return Err(TransferError::new(
                    TransferStage::TransferSubmitted,
                    TransferErrorKind::ConfirmationTimeout {
                        tx: None,
                        after: network,
                    },
                ));
            }
        };
        info!(stage = %TransferStage::TransferSubmitted, %tx, "{operation} submitted");

        let confirmation = self.profile.timeouts.confirmation();
        let mined = tokio::time::timeout(confirmation, self.ledger.wait_for_receipt(tx)).await;
        let receipt = match mined {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(e)) => {
                warn!(%tx, "Lost track of {operation}: {e}");
                return Err(TransferError::new(
                    TransferStage::TransferSubmitted,
                    TransferErrorKind::ConfirmationTimeout {
                        tx: Some(tx),
                        after: confirmation,
                    },
                ));
            }
            Err(_) => {
                warn!(%tx, "{operation} not confirmed after {confirmation:?}; outcome unknown");
                return Err(TransferError::new(
                    TransferStage::TransferSubmitted,
                    TransferErrorKind::ConfirmationTimeout {
                        tx: Some(tx),
                        after: confirmation,
                    },
                ));
            }
        };

        if !receipt.success {
            error!(%tx, block = ?receipt.block_number, "{operation} reverted");
            return Err(TransferError::new(
                TransferStage::Rejected,
                TransferErrorKind::TransactionReverted(tx),
            ));
        }
        Ok(receipt)
    }

    /// Transfer `amount` (already in base units) from the signer to `recipient`.
    #[instrument(skip_all, fields(sender = %self.sender(), recipient = %recipient))]
    pub async fn transfer(&self, recipient: Address, amount: U256) -> Result<TransferOutcome> {
        let sender = self.sender();
        let mut stage = TransferStage::Idle;

        if recipient.is_zero() {
            return Err(TransferError::new(stage, TransferErrorKind::InvalidRecipient));
        }
        if recipient == sender {
            return Err(TransferError::new(stage, TransferErrorKind::SelfTransfer));
        }
        if self.ledger.account() != sender {
            return Err(TransferError::new(
                stage,
                ct_request::RequestError::Signing {
                    signer: sender,
                    requester: self.ledger.account(),
                },
            ));
        }

        let cipher = self.encrypt(stage, amount).await?;
        stage = TransferStage::AmountEncrypted;
        info!(%stage, amount = %cipher.short(), "Amount encrypted");

        let app = self
            .bounded(stage, "fetch app order", self.resolver.fetch_app_order(self.profile.app))
            .await?;
        let workerpool = self
            .bounded(
                stage,
                "fetch workerpool order",
                self.resolver.fetch_workerpool_order(self.profile.workerpool),
            )
            .await?;
        let dataset = match self.profile.dataset() {
            Some(dataset) => Some(
                self.bounded(
                    stage,
                    "fetch dataset order",
                    self.resolver.fetch_dataset_order(dataset),
                )
                .await?,
            ),
            None => None,
        };
        stage = TransferStage::OrdersResolved;
        info!(
            %stage,
            app = %app.order_hash,
            workerpool = %workerpool.order_hash,
            "Orders resolved"
        );

        let payload = TransferPayload::new(cipher.clone(), sender, recipient);
        let order = RequestOrderBuilder::new(&app, &workerpool, sender, self.ledger.address())
            .dataset(dataset.as_ref())
            .build(&payload);
        let domain = self.resolver.domain();
        let signed = sign_request_order(order, &self.signer, domain)
            .await
            .map_err(|e| TransferError::new(stage, e))?;
        verify_request_order(&signed, domain).map_err(|e| TransferError::new(stage, e))?;
        stage = TransferStage::OrderSigned;
        info!(%stage, salt = %signed.order.salt, "Request order signed");

        let order_hash = self
            .bounded(
                stage,
                "publish request order",
                self.resolver.market().publish_request_order(&signed),
            )
            .await?;

        let submitted_after_block = self
            .bounded(stage, "block number", self.ledger.block_number())
            .await?;
        let escrow = self
            .profile
            .escrow_payment()
            .map_err(|e| TransferError::new(stage, TransferErrorKind::Config(e.to_string())))?;

        let receipt = self
            .submit_and_confirm(
                stage,
                "transfer",
                self.ledger.transfer(recipient, &cipher, escrow),
            )
            .await?;

        if receipt
            .find(|e| e.is_transfer_request(sender, recipient, &cipher))
            .is_none()
        {
            warn!(tx = %receipt.hash, "Receipt carries no matching TransferRequested event");
        }
        info!(
            stage = %TransferStage::Settled,
            tx = %receipt.hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Transfer accepted; waiting on the TEE for the balance update"
        );

        Ok(TransferOutcome {
            sender,
            recipient,
            amount: cipher,
            request_order: signed,
            order_hash,
            receipt,
            submitted_after_block,
        })
    }

    /// Mint `amount` (base units) to `to`. Only the ledger owner can do this.
    #[instrument(skip_all, fields(to = %to))]
    pub async fn mint(&self, to: Address, amount: U256) -> Result<TxReceipt> {
        if to.is_zero() {
            return Err(TransferError::new(
                TransferStage::Idle,
                TransferErrorKind::InvalidRecipient,
            ));
        }
        let cipher = self.encrypt(TransferStage::Idle, amount).await?;
        info!(amount = %cipher.short(), "Mint amount encrypted");

        let receipt = self
            .submit_and_confirm(
                TransferStage::AmountEncrypted,
                "mint",
                self.ledger.mint(to, &cipher),
            )
            .await?;
        info!(tx = %receipt.hash, block = ?receipt.block_number, "Mint confirmed");
        Ok(receipt)
    }

    /// Resolve the configured app, workerpool and optional dataset offers and record them on the
    /// ledger.
    #[instrument(skip_all, fields(app = %self.profile.app, workerpool = %self.profile.workerpool))]
    pub async fn store_orders(&self) -> Result<TxReceipt> {
        let stage = TransferStage::Idle;
        let app = self
            .bounded(stage, "fetch app order", self.resolver.fetch_app_order(self.profile.app))
            .await?;
        let workerpool = self
            .bounded(
                stage,
                "fetch workerpool order",
                self.resolver.fetch_workerpool_order(self.profile.workerpool),
            )
            .await?;
        let dataset = match self.profile.dataset() {
            Some(dataset) => Some(
                self.bounded(
                    stage,
                    "fetch dataset order",
                    self.resolver.fetch_dataset_order(dataset),
                )
                .await?,
            ),
            None => None,
        };

        let app = ledger_app_order(&app);
        let workerpool = ledger_workerpool_order(&workerpool);
        let dataset = ledger_dataset_order(dataset.as_ref());
        let receipt = self
            .submit_and_confirm(
                TransferStage::OrdersResolved,
                "storeOrders",
                self.ledger.store_orders(&app, &workerpool, &dataset),
            )
            .await?;

        if receipt
            .find(|e| matches!(e, LedgerEvent::OrdersStored { .. }))
            .is_none()
        {
            warn!(tx = %receipt.hash, "Receipt carries no OrdersStored event");
        }
        info!(tx = %receipt.hash, "Orders stored");
        Ok(receipt)
    }

    /// Wait for the TEE's `BalanceUpdate` for `sender -> recipient`, mined at or after
    /// `from_block`.
    #[instrument(
        skip_all,
        fields(sender = %sender, recipient = %recipient, from_block = from_block)
    )]
    pub async fn await_settlement(
        &self,
        sender: Address,
        recipient: Address,
        from_block: u64,
        deadline: Duration,
    ) -> Result<BalanceUpdated> {
        let stage = TransferStage::Settled;
        let poll = async {
            loop {
                let updates = self
                    .ledger
                    .balance_updates(sender, recipient, from_block)
                    .await
                    .map_err(|e| TransferError::new(stage, e))?;
                if let Some(update) = updates.into_iter().next() {
                    return Ok(update);
                }
                tokio::time::sleep(self.settlement_poll).await;
            }
        };

        match tokio::time::timeout(deadline, poll).await {
            Ok(Ok(update)) => {
                info!(
                    sender_balance = %update.new_sender_balance.short(),
                    recipient_balance = %update.new_recipient_balance.short(),
                    "Balance update observed"
                );
                Ok(update)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!("No balance update after {deadline:?}");
                Err(TransferError::new(
                    stage,
                    TransferErrorKind::SettlementTimeout { after: deadline },
                ))
            }
        }
    }

    /// [`Self::await_settlement`] for an outcome, using the profile's settlement timeout.
    ///
    /// Updates mined at or before the pre-submission head belong to earlier transfers.
    pub async fn await_outcome(&self, outcome: &TransferOutcome) -> Result<BalanceUpdated> {
        self.await_settlement(
            outcome.sender,
            outcome.recipient,
            outcome.submitted_after_block + 1,
            self.profile.timeouts.settlement(),
        )
        .await
    }
}
