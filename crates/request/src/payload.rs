// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::{RequestError, Result};
use alloy::primitives::Address;
use ct_crypto::EncryptedAmount;
use std::{fmt, str::FromStr};

/// What the TEE app reads from the request order `params`:
/// `<cipher> <sender> <recipient>`, space separated, lower-case hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPayload {
    pub amount: EncryptedAmount,
    pub sender: Address,
    pub recipient: Address,
}

impl TransferPayload {
    pub fn new(amount: EncryptedAmount, sender: Address, recipient: Address) -> Self {
        Self {
            amount,
            sender,
            recipient,
        }
    }

    pub fn parse(params: &str) -> Result<Self> {
        let fields: Vec<&str> = params.split_whitespace().collect();
        let [amount, sender, recipient] = fields.as_slice() else {
            return Err(RequestError::MalformedPayload(format!(
                "expected 3 fields, found {}",
                fields.len()
            )));
        };
        let amount = EncryptedAmount::from_hex(amount)
            .map_err(|e| RequestError::MalformedPayload(e.to_string()))?;
        let sender = Address::from_str(sender)
            .map_err(|e| RequestError::MalformedPayload(format!("sender: {e}")))?;
        let recipient = Address::from_str(recipient)
            .map_err(|e| RequestError::MalformedPayload(format!("recipient: {e}")))?;
        Ok(Self::new(amount, sender, recipient))
    }
}

impl fmt::Display for TransferPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.amount.to_hex(),
            self.sender.to_string().to_lowercase(),
            self.recipient.to_string().to_lowercase()
        )
    }
}

impl FromStr for TransferPayload {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
