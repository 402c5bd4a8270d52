// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod amount;
mod ecies;
mod error;
mod keys;

pub use amount::*;
pub use ecies::CIPHERTEXT_OVERHEAD;
pub use error::CryptoError;
pub use keys::*;
