// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::B256;
use ct_crypto::CryptoError;
use ct_ledger::LedgerError;
use ct_market::MarketError;
use ct_request::RequestError;
use std::{fmt, time::Duration};
use thiserror::Error;

/// Where a transfer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStage {
    Idle,
    AmountEncrypted,
    OrdersResolved,
    OrderSigned,
    TransferSubmitted,
    Settled,
    Rejected,
}

impl TransferStage {
    /// Whether a ledger write may have happened by the time the flow reached this stage.
    pub fn is_submitted(&self) -> bool {
        matches!(
            self,
            TransferStage::TransferSubmitted | TransferStage::Settled | TransferStage::Rejected
        )
    }
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferErrorKind {
    #[error("Recipient must not be the zero address")]
    InvalidRecipient,

    #[error("Recipient must differ from the sender")]
    SelfTransfer,

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Invalid chain profile: {0}")]
    Config(String),

    #[error("Transaction {0} reverted")]
    TransactionReverted(B256),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("No confirmation after {after:?}; transaction {} may still be mined", tx_label(.tx))]
    ConfirmationTimeout { tx: Option<B256>, after: Duration },

    #[error("No balance update observed after {after:?}")]
    SettlementTimeout { after: Duration },
}

/// A failed transfer step, tagged with the last stage the flow reached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Transfer failed at {stage}: {kind}")]
pub struct TransferError {
    pub stage: TransferStage,
    pub kind: TransferErrorKind,
}

impl TransferError {
    pub fn new(stage: TransferStage, kind: impl Into<TransferErrorKind>) -> Self {
        Self {
            stage,
            kind: kind.into(),
        }
    }

    /// The outcome on chain is unknown: the caller must inspect the ledger before trying again.
    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self.kind,
            TransferErrorKind::ConfirmationTimeout { .. }
                | TransferErrorKind::SettlementTimeout { .. }
        )
    }

    /// A fresh attempt may succeed. Never true once a transaction may have been sent.
    pub fn is_retriable(&self) -> bool {
        if self.stage.is_submitted() || self.is_ambiguous() {
            return false;
        }
        match &self.kind {
            TransferErrorKind::Timeout { .. } => true,
            TransferErrorKind::Market(e) => matches!(
                e,
                MarketError::NoOfferAvailable { .. }
                    | MarketError::Network(_)
                    | MarketError::Api { .. }
            ),
            TransferErrorKind::Ledger(e) => matches!(e, LedgerError::Network(_)),
            _ => false,
        }
    }
}

fn tx_label(tx: &Option<B256>) -> String {
    tx.map(|t| t.to_string())
        .unwrap_or_else(|| "(hash unknown)".to_string())
}

pub type Result<T> = std::result::Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    #[test]
    fn classification() {
        let no_offer = TransferError::new(
            TransferStage::AmountEncrypted,
            MarketError::NoOfferAvailable {
                kind: ct_market::OrderKind::App,
                resource: Address::ZERO,
            },
        );
        assert!(no_offer.is_retriable());
        assert!(!no_offer.is_ambiguous());

        let bad_key = TransferError::new(TransferStage::Idle, CryptoError::InvalidKey("x".into()));
        assert!(!bad_key.is_retriable());

        let lost = TransferError::new(
            TransferStage::TransferSubmitted,
            TransferErrorKind::ConfirmationTimeout {
                tx: Some(B256::repeat_byte(1)),
                after: Duration::from_secs(1),
            },
        );
        assert!(lost.is_ambiguous());
        assert!(!lost.is_retriable());

        let reverted = TransferError::new(
            TransferStage::Rejected,
            TransferErrorKind::TransactionReverted(B256::ZERO),
        );
        assert!(!reverted.is_ambiguous());
        assert!(!reverted.is_retriable());

        let refused = TransferError::new(
            TransferStage::OrderSigned,
            LedgerError::Rejected("insufficient funds for gas * price + value".into()),
        );
        assert!(!refused.is_ambiguous());
        assert!(!refused.is_retriable());
    }

    #[test]
    fn messages_carry_the_stage() {
        let err = TransferError::new(TransferStage::Idle, TransferErrorKind::SelfTransfer);
        assert_eq!(
            err.to_string(),
            "Transfer failed at Idle: Recipient must differ from the sender"
        );
    }
}
