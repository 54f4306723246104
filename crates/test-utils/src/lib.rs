//! Shared helpers for the `liveglob` integration tests.

pub mod provider;
pub mod recording;
pub mod script;

pub use provider::ScriptedProvider;
pub use recording::RecordingSubscriber;
pub use script::EventScript;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use liveglob::logging::LOG_ENV_VAR;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Upper bound for any single awaited step in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-captured tracing subscriber, once per test binary.
///
/// Reads the same `LIVEGLOB_LOG` directive as the binary and stays at `warn`
/// otherwise, e.g. `LIVEGLOB_LOG=liveglob::backend=trace cargo test`.
/// Output only shows for failing tests unless run with `--nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("test step did not finish within {TEST_TIMEOUT:?}"),
    }
}
