// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::context::Context;
use alloy::primitives::{utils::format_units, Address};
use anyhow::{bail, Result};
use ct_crypto::{decrypt_balance, SecretKey};
use ct_ledger::LedgerRead;
use zeroize::Zeroizing;

pub async fn execute(
    context: &Context,
    account: Option<Address>,
    tee_key: Option<Zeroizing<String>>,
) -> Result<()> {
    let account = match account {
        Some(account) => account,
        None if context.has_wallet() => context.signer()?.address(),
        None => bail!("Pass an account or a wallet key"),
    };

    let ledger = context.reader().await?;
    let cipher = ledger.balance_of(account).await?;
    if cipher.is_empty() {
        println!("{account} holds no balance");
        return Ok(());
    }
    println!("{account}: {}", cipher.to_hex());

    if let Some(tee_key) = tee_key {
        let secret = SecretKey::from_hex(&tee_key)?;
        let amount = decrypt_balance(&secret, &cipher)?;
        let decimals = ledger.decimals().await?;
        println!("Decrypted: {} ({amount} base units)", format_units(amount, decimals)?);
    }
    Ok(())
}
