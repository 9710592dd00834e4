//! Log capture for calculator tests.

use std::io;
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing::subscriber::DefaultGuard;

#[derive(Clone, Default)]
struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogWriter {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Everything logged on this thread while the value is alive.
pub(crate) struct CapturedLogs {
    writer: LogWriter,
    _guard: DefaultGuard,
}

impl CapturedLogs {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.writer.0.lock().unwrap()).into_owned()
    }

    pub(crate) fn contains(
        &self,
        needle: &str,
    ) -> bool {
        self.contents().contains(needle)
    }
}

/// Installs a thread-local subscriber that records events down to `DEBUG`.
pub(crate) fn init_test_tracing() -> CapturedLogs {
    let writer = LogWriter::default();
    let make_writer = writer.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .without_time()
        .with_writer(move || make_writer.clone())
        .finish();

    CapturedLogs {
        writer,
        _guard: tracing::subscriber::set_default(subscriber),
    }
}
