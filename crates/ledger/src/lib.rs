// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod bindings;
mod contract;
mod error;
mod events;
mod listener;
mod traits;

pub use bindings::{AppOrder, DatasetOrder, WorkerpoolOrder};
pub use contract::*;
pub use error::{LedgerError, Result};
pub use events::*;
pub use listener::LedgerListener;
pub use traits::*;
