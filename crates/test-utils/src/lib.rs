// SPDX-License-Identifier: Apache-2.0

#![warn(unused_crate_dependencies)]

mod fixtures;
pub use fixtures::*;
mod host;
pub use host::*;

/// Install an env-filtered subscriber writing to the test harness. Repeat calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
