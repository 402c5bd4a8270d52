// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Signer {signer} does not control requester {requester}")]
    Signing { signer: Address, requester: Address },

    #[error("Signing backend failed: {0}")]
    Signer(String),

    #[error("Request order signature does not verify: {0}")]
    InvalidSignature(String),

    #[error("Malformed transfer payload: {0}")]
    MalformedPayload(String),
}

pub type Result<T> = std::result::Result<T, RequestError>;
