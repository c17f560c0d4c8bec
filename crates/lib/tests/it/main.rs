/*! Integration tests for Ripple.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - node: Tests for node navigation, writes, sets, edges, listeners and kind locking
 * - graph: Tests for the namespace root, the user namespace and foreign namespaces
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("ripple=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod helpers;
