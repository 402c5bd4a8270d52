// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::CryptoError;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use std::{fmt, str::FromStr};
use zeroize::Zeroizing;

/// Length of the canonical (uncompressed SEC1) public key encoding.
pub const PUBLIC_KEY_LEN: usize = 65;

/// Length of a raw secp256k1 secret scalar.
pub const SECRET_KEY_LEN: usize = 32;

fn strip_hex_prefix(input: &str) -> &str {
    let input = input.trim();
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

/// The balance encryption public key in its single canonical form.
///
/// Every accepted input shape (key object, hex with or without `0x`, compressed or
/// uncompressed SEC1 bytes) normalizes to the same 65 byte uncompressed encoding.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(k256::PublicKey);

impl PublicKey {
    /// Parse any of the accepted input shapes into the canonical key.
    pub fn parse<'a>(input: impl Into<PublicKeyInput<'a>>) -> Result<Self, CryptoError> {
        match input.into() {
            PublicKeyInput::Key(key) => Ok(*key),
            PublicKeyInput::Hex(hex) => Self::from_hex(hex),
            PublicKeyInput::Bytes(bytes) => Self::from_bytes(bytes),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        k256::PublicKey::from_sec1_bytes(bytes)
            .map(PublicKey)
            .map_err(|_| {
                CryptoError::InvalidKey(format!(
                    "{} bytes do not encode a secp256k1 point",
                    bytes.len()
                ))
            })
    }

    pub fn from_hex(input: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(strip_hex_prefix(input))
            .map_err(|e| CryptoError::InvalidKey(format!("not hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// Canonical uncompressed encoding.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        let mut out = [0u8; PUBLIC_KEY_LEN];
        out.copy_from_slice(self.0.to_encoded_point(false).as_bytes());
        out
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    pub(crate) fn as_k256(&self) -> &k256::PublicKey {
        &self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = CryptoError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = CryptoError;
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}

/// The shapes a public key may arrive in at the boundary.
#[derive(Clone, Copy, Debug)]
pub enum PublicKeyInput<'a> {
    Key(&'a PublicKey),
    Hex(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> From<&'a PublicKey> for PublicKeyInput<'a> {
    fn from(value: &'a PublicKey) -> Self {
        PublicKeyInput::Key(value)
    }
}

impl<'a> From<&'a str> for PublicKeyInput<'a> {
    fn from(value: &'a str) -> Self {
        PublicKeyInput::Hex(value)
    }
}

impl<'a> From<&'a String> for PublicKeyInput<'a> {
    fn from(value: &'a String) -> Self {
        PublicKeyInput::Hex(value.as_str())
    }
}

impl<'a> From<&'a [u8]> for PublicKeyInput<'a> {
    fn from(value: &'a [u8]) -> Self {
        PublicKeyInput::Bytes(value)
    }
}

/// The balance decryption key. Only the TEE operator holds one of these in production.
#[derive(Clone)]
pub struct SecretKey(k256::SecretKey);

impl SecretKey {
    pub fn random() -> Self {
        SecretKey(k256::SecretKey::random(&mut OsRng))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SECRET_KEY_LEN {
            return Err(CryptoError::InvalidSecretKey);
        }
        k256::SecretKey::from_slice(bytes)
            .map(SecretKey)
            .map_err(|_| CryptoError::InvalidSecretKey)
    }

    pub fn from_hex(input: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(
            hex::decode(strip_hex_prefix(input)).map_err(|_| CryptoError::InvalidSecretKey)?,
        );
        Self::from_bytes(&bytes)
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.0.to_bytes());
        Zeroizing::new(format!("0x{}", hex::encode(bytes.as_slice())))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.public_key())
    }

    pub(crate) fn as_k256(&self) -> &k256::SecretKey {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// A freshly generated deployment keypair.
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub secret: SecretKey,
    pub public: PublicKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        let secret = SecretKey::random();
        let public = secret.public_key();
        Self { secret, public }
    }
}
