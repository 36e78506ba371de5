#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub use parambind_testhelpers_macros::test;

use std::io;
use std::sync::{Arc, Mutex, Once, PoisonError};

use tracing::span::EnteredSpan;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV: &str = "PARAMBIND_LOG";

/// Installs the process-wide test subscriber. Later calls do nothing.
///
/// Output goes through the test writer, so it only shows up for failing
/// tests. `PARAMBIND_LOG` takes `tracing-subscriber` target directives and
/// defaults to tracing every parambind crate.
pub fn setup() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = std::env::var(LOG_ENV)
            .ok()
            .and_then(|directives| directives.parse::<Targets>().ok())
            .unwrap_or_else(|| Targets::new().with_target("parambind", tracing::Level::TRACE));

        // another harness may have installed a subscriber already
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .without_time()
                    .compact(),
            )
            .with(filter)
            .try_init();
    });
}

/// Calls [`setup`] and enters a `test` span carrying the test's name.
///
/// `#[parambind_testhelpers::test]` calls this first thing in every test.
pub fn enter(name: &'static str) -> EnteredSpan {
    setup();
    tracing::info_span!("test", name).entered()
}

/// Runs `f` with every event on this thread captured as plain text.
///
/// Used to check what the binder logs, in particular that parameter values
/// never show up.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::capture_logs;

    #[test]
    fn captures_events_from_the_closure_only() {
        tracing::info!("before");
        let (answer, logs) = capture_logs(|| {
            tracing::debug!(key = "/svc/port", "binding field");
            42
        });
        tracing::info!("after");

        assert_eq!(answer, 42);
        assert!(logs.contains("binding field"));
        assert!(logs.contains("key=\"/svc/port\""));
        assert!(!logs.contains("before"));
        assert!(!logs.contains("after"));
    }
}
