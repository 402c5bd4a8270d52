// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ecies, CryptoError, PublicKey, SecretKey};
use alloy_primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// An amount encrypted under the ledger's balance key.
///
/// This is the only representation a balance ever has on chain. Encryption is randomized so
/// two ciphertexts of the same amount are generally different; compare decrypted values, not
/// bytes. An empty value is what the ledger returns for an account that was never minted.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedAmount(Bytes);

impl EncryptedAmount {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_hex(input: &str) -> Result<Self, CryptoError> {
        let trimmed = input.trim();
        let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        hex::decode(trimmed)
            .map(|b| Self(b.into()))
            .map_err(|_| CryptoError::MalformedCiphertext)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bytes(&self) -> Bytes {
        self.0.clone()
    }

    /// Lower-case `0x` prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// A short prefix suitable for log lines.
    pub fn short(&self) -> String {
        let hex = self.to_hex();
        if hex.len() > 18 {
            format!("{}…", &hex[..18])
        } else {
            hex
        }
    }
}

impl From<Bytes> for EncryptedAmount {
    fn from(value: Bytes) -> Self {
        Self(value)
    }
}

impl From<EncryptedAmount> for Bytes {
    fn from(value: EncryptedAmount) -> Self {
        value.0
    }
}

impl FromStr for EncryptedAmount {
    type Err = CryptoError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for EncryptedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for EncryptedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedAmount({}, {} bytes)", self.short(), self.len())
    }
}

/// Encrypt an amount, already denominated in the ledger's smallest unit.
///
/// The plaintext is the base-10 text of the amount, which is what the TEE side parses.
pub fn encrypt_amount(key: &PublicKey, amount: U256) -> Result<EncryptedAmount, CryptoError> {
    let plaintext = amount.to_string();
    ecies::encrypt(key, plaintext.as_bytes()).map(|b| EncryptedAmount(b.into()))
}

/// Decrypt an amount. Fails with [`CryptoError::Decryption`] under the wrong key.
pub fn decrypt_amount(key: &SecretKey, cipher: &EncryptedAmount) -> Result<U256, CryptoError> {
    let plaintext = ecies::decrypt(key, cipher.as_bytes())?;
    let text = std::str::from_utf8(&plaintext).map_err(|_| CryptoError::InvalidPlaintext)?;
    parse_decimal(text)
}

/// Decrypt a ledger balance slot, reading the empty ciphertext as zero.
pub fn decrypt_balance(key: &SecretKey, cipher: &EncryptedAmount) -> Result<U256, CryptoError> {
    if cipher.is_empty() {
        return Ok(U256::ZERO);
    }
    decrypt_amount(key, cipher)
}

fn parse_decimal(text: &str) -> Result<U256, CryptoError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CryptoError::InvalidPlaintext);
    }
    U256::from_str_radix(text, 10).map_err(|_| CryptoError::InvalidPlaintext)
}

/// Scale a whole-token amount into base units using the ledger's declared decimals.
pub fn scale_to_base_units(tokens: U256, decimals: u8) -> Result<U256, CryptoError> {
    U256::from(10u8)
        .checked_pow(U256::from(decimals))
        .and_then(|factor| tokens.checked_mul(factor))
        .ok_or(CryptoError::AmountOverflow)
}
