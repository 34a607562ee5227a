/*! Integration tests for Mapbind.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - coerce: Attribute strings to typed option values
 * - events: Event attribute synthesis and handler invocation
 * - controls: Control option repair
 * - location: Deferred location resolution and its ordering
 * - registry: Buffer-then-flush attachment of markers and shapes
 * - binder: Whole-element binding flows for maps, markers and shapes
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("mapbind=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod binder;
mod controls;
mod events;
mod helpers;
mod location;
mod registry;
