//! Debug output for the boot environment.
//!
//! Early in boot there is no console driver, only some way of pushing characters out (a
//! firmware call, a memory mapped UART). [`DebugSink`] is that emitter. [`SinkLogger`] connects
//! it to the [`log`] facade that the rest of the crate reports through.
//!
//! Nothing in this crate requires a logger to be installed.

use core::fmt::{self, Write};

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// A line oriented character emitter.
pub trait DebugSink: Sync {
    fn put_str(&self, s: &str);

    fn put_char(&self, c: char) {
        let mut buf = [0u8; 4];
        self.put_str(c.encode_utf8(&mut buf));
    }
}

impl<S: DebugSink + ?Sized> DebugSink for &S {
    fn put_str(&self, s: &str) {
        (**self).put_str(s)
    }
}

struct SinkWriter<'s, S: ?Sized>(&'s S);

impl<S: DebugSink + ?Sized> Write for SinkWriter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.put_str(s);
        Ok(())
    }
}

/// A [`Log`] implementation that writes every record as one line to a [`DebugSink`]:
///
/// ```text
/// DEBUG (fdt_lookup::base::lookup) :: lookup: descending into cpus
/// ```
pub struct SinkLogger<S> {
    sink: S,
    max_level: Level,
}

impl<S> SinkLogger<S> {
    pub const fn new(sink: S, max_level: Level) -> Self {
        Self { sink, max_level }
    }

    pub fn max_level(&self) -> LevelFilter {
        self.max_level.to_level_filter()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: DebugSink + Send> SinkLogger<S> {
    /// Register this logger with the [`log`] facade. Fails if a logger is already installed.
    pub fn install(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self).map(|_| log::set_max_level(self.max_level.to_level_filter()))
    }
}

impl<S: DebugSink + Send> Log for SinkLogger<S> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // The sink cannot fail.
        let _ = writeln!(
            SinkWriter(&self.sink),
            "{} ({}) :: {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture(Mutex<String>);

    impl DebugSink for Capture {
        fn put_str(&self, s: &str) {
            self.0.lock().unwrap().push_str(s);
        }
    }

    #[test]
    fn formats_one_line_per_record() {
        let logger = SinkLogger::new(Capture::default(), Level::Debug);
        logger.log(
            &Record::builder()
                .level(Level::Error)
                .target("boot")
                .args(format_args!("bad magic"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Trace)
                .target("boot")
                .args(format_args!("hidden"))
                .build(),
        );
        assert_eq!(
            logger.sink().0.lock().unwrap().as_str(),
            "ERROR (boot) :: bad magic\n"
        );
        assert_eq!(logger.max_level(), LevelFilter::Debug);
    }

    #[test]
    fn put_char() {
        let sink = Capture::default();
        sink.put_char('/');
        (&sink).put_str("memory");
        assert_eq!(sink.0.lock().unwrap().as_str(), "/memory");
    }
}
