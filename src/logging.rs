//! `tracing` subscriber for the worker.
//!
//! Each formatted event is forwarded to the browser console on wasm32 and to
//! stderr in native test builds.

use std::io;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Buffers one formatted event and emits it on drop.
#[derive(Default)]
pub struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        emit(line.trim_end());
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(line: &str) {
    web_sys::console::log_1(&wasm_bindgen::JsValue::from_str(line));
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(line: &str) {
    eprintln!("{line}");
}

/// Install the global subscriber and the panic hook. A second call leaves
/// the first subscriber in place.
pub fn init(config: &AppConfig) {
    #[cfg(all(target_arch = "wasm32", feature = "console_error_panic_hook"))]
    console_error_panic_hook::set_once();

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_writer(ConsoleWriter::default)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(level = %config.log_level, "logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn writer_buffers_until_drop() {
        let mut w = ConsoleWriter::default();
        w.write_all(b"hello ").unwrap();
        w.write_all(b"world\n").unwrap();
        assert_eq!(w.buf, b"hello world\n");
    }

    #[test]
    fn init_twice_is_harmless() {
        let config = AppConfig::default();
        init(&config);
        init(&config);
        tracing::info!("still alive");
    }

    #[test]
    fn bad_filter_falls_back() {
        let config = AppConfig {
            log_level: "[[[".into(),
            ..AppConfig::default()
        };
        init(&config);
    }
}
