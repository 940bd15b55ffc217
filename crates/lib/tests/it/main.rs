/*! Integration tests for scholar-sync.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * - workspace: select-or-create, transfers and sessions through the public API
 * - cleanup: user removal and stale-entry cleanup across users
 * - http_remote: the HTTP client against a local mock of the Schol-AR API
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("scholar_sync=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod cleanup;
mod helpers;
mod http_remote;
mod workspace;
