// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod builder;
mod error;
mod payload;
mod signing;

pub use builder::*;
pub use error::{RequestError, Result};
pub use payload::TransferPayload;
pub use signing::*;
