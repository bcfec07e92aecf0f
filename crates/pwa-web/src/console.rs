//! Browser console as a log sink.

use std::io;

use pwa_observability::{init_logging_with_writer, LogConfig, LogFormat};

/// Buffers one formatted event and logs it to the console when dropped.
#[derive(Default)]
pub struct ConsoleWriter {
    buffer: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buffer);
        let line = line.trim_end();
        if !line.is_empty() {
            web_sys::console::log_1(&line.into());
        }
    }
}

/// Install panic reporting and console logging. Safe to call more than once.
pub fn init(level: &str) {
    console_error_panic_hook::set_once();

    // No wall clock for the formatter on wasm32.
    let config = LogConfig {
        format: LogFormat::Human,
        level: level.to_string(),
        timestamps: false,
    };
    // A second call finds the subscriber already installed.
    let _ = init_logging_with_writer(&config, ConsoleWriter::default);
}
