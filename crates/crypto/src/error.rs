// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid public key: {0}")]
    InvalidKey(String),

    #[error("Invalid secret key")]
    InvalidSecretKey,

    #[error("Could not decrypt ciphertext")]
    Decryption,

    #[error("Ciphertext is not valid hex")]
    MalformedCiphertext,

    #[error("Decrypted plaintext is not a base-10 amount")]
    InvalidPlaintext,

    #[error("Could not encrypt plaintext")]
    Encryption,

    #[error("Amount does not fit in 256 bits")]
    AmountOverflow,
}
