// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::{hex::FromHex, primitives::FixedBytes, signers::local::PrivateKeySigner};
use anyhow::{anyhow, Result};
use dialoguer::{theme::ColorfulTheme, Password};
use zeroize::Zeroizing;

fn signer_from_hex(input: &str) -> Result<PrivateKeySigner> {
    let bytes = FixedBytes::<32>::from_hex(input.trim())
        .map_err(|e| anyhow!("Invalid private key: {}", e))?;
    PrivateKeySigner::from_bytes(&bytes).map_err(|e| anyhow!("Invalid private key: {}", e))
}

pub fn validate_private_key(input: &String) -> Result<()> {
    signer_from_hex(input).map(|_| ())
}

/// The wallet for `given_key`, or for a key typed at the prompt.
pub fn ask_for_signer(given_key: Option<Zeroizing<String>>) -> Result<PrivateKeySigner> {
    let key = if let Some(given_key) = given_key {
        given_key
    } else {
        Zeroizing::new(
            Password::with_theme(&ColorfulTheme::default())
                .with_prompt("Enter your Ethereum private key")
                .validate_with(validate_private_key)
                .interact()?
                .trim()
                .to_string(),
        )
    };

    signer_from_hex(&key)
}
