// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::B256;
use ct_crypto::CryptoError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Cannot mint to the zero address")]
    InvalidRecipient,

    #[error("Cannot transfer to self")]
    SelfTransfer,

    #[error("Only the oracle may update balances")]
    NotOracle,

    #[error("Write operations need a signing account")]
    ReadOnly,

    #[error("Transaction {0} reverted")]
    Reverted(B256),

    #[error("Ledger rejected the call: {0}")]
    Rejected(String),

    #[error("Ledger holds an unusable encryption key: {0}")]
    InvalidEncryptionKey(#[from] CryptoError),

    #[error("Could not decode ledger event: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Txpool refusals. The node answered and the transaction was not broadcast.
const NODE_REJECTIONS: &[&str] = &[
    "insufficient funds",
    "nonce too low",
    "nonce too high",
    "replacement transaction underpriced",
    "transaction underpriced",
    "exceeds block gas limit",
    "intrinsic gas too low",
    "max fee per gas less than block base fee",
    "invalid sender",
];

impl LedgerError {
    /// Map a node error message onto the ledger's known revert reasons.
    ///
    /// Anything unrecognised is `Network`: the node may or may not have seen the call.
    pub fn from_rpc_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if NODE_REJECTIONS.iter().any(|r| lower.contains(r)) {
            return LedgerError::Rejected(message);
        }
        if !lower.contains("revert") {
            return LedgerError::Network(message);
        }
        if lower.contains("zero address") {
            LedgerError::InvalidRecipient
        } else if lower.contains("to self") {
            LedgerError::SelfTransfer
        } else if lower.contains("oracle") {
            LedgerError::NotOracle
        } else {
            LedgerError::Rejected(message)
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
