// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::U256;
use anyhow::{bail, Result};
use ct_crypto::scale_to_base_units;
use ct_ledger::LedgerRead;
use zeroize::{Zeroize, Zeroizing};

pub mod telemetry;
pub mod wallet;

/// Parse to a Zeroizing String
pub fn parse_zeroizing(s: &str) -> Result<Zeroizing<String>> {
    Ok(Zeroizing::new(s.to_string()))
}

/// Ensure hex is of the form 0x12435687abcdef...
pub fn ensure_hex_zeroizing(s: &str) -> Result<Zeroizing<String>> {
    parse_zeroizing(ensure_hex(s)?)
}

fn ensure_hex(s: &str) -> Result<&str> {
    let Some(digits) = s.strip_prefix("0x") else {
        bail!("hex value must start with '0x'")
    };
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("key must only contain hex characters [0-9a-fA-F]");
    }
    hex::decode(digits)?.zeroize();
    Ok(s)
}

/// Amount in base units: `raw` amounts pass through, whole tokens are scaled by the ledger's
/// decimals.
pub async fn base_units(ledger: &impl LedgerRead, amount: U256, raw: bool) -> Result<U256> {
    if raw {
        return Ok(amount);
    }
    let decimals = ledger.decimals().await?;
    Ok(scale_to_base_units(amount, decimals)?)
}
