// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::orders::OrderKind;
use alloy::primitives::Address;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("No {kind} order available for {resource}")]
    NoOfferAvailable { kind: OrderKind, resource: Address },

    #[error("Rejected {kind} order {resource}: {reason}")]
    InvalidOffer {
        kind: OrderKind,
        resource: Address,
        reason: String,
    },

    #[error("Marketplace api answered {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Could not decode marketplace response: {0}")]
    Decode(String),

    #[error("Publishing orders needs a signer")]
    MissingSigner,

    #[error("Could not sign marketplace challenge: {0}")]
    Challenge(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for MarketError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            MarketError::Decode(value.to_string())
        } else {
            MarketError::Network(value.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
