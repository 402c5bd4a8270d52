// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod fixtures;
mod ledger;
mod market;

pub use fixtures::*;
pub use ledger::*;
pub use market::*;

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Route tracing output through the test harness for the lifetime of the guard.
pub fn with_tracing(filter: &str) -> DefaultGuard {
    tracing::subscriber::set_default(
        fmt()
            .with_env_filter(EnvFilter::new(filter))
            .with_test_writer()
            .finish(),
    )
}
