// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use ct_crypto::KeyPair;

pub fn execute() -> Result<()> {
    let keys = KeyPair::generate();
    println!("Public key (deploy the ledger with this):");
    println!("{}", keys.public.to_hex());
    println!();
    println!("Secret key (give this to the TEE app only):");
    println!("{}", keys.secret.to_hex().as_str());
    Ok(())
}
