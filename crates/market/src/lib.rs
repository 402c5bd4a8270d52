// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod error;
mod marketplace;
mod orders;
mod resolver;
mod wire;

pub use error::{MarketError, Result};
pub use marketplace::*;
pub use orders::*;
pub use resolver::*;
