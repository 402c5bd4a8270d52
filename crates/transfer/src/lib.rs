// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod error;
mod orchestrator;
mod orders;

pub use error::*;
pub use orchestrator::*;
pub use orders::*;
