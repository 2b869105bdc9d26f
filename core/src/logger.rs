// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Leveled logger that writes timestamped lines to a single sink.
//!
//! A `Logger` exposes four channels (debug, info, warning and error) that only differ in the
//! prefix they put in front of every line.  All channels share the same sink, which is bound when
//! the logger is created and cannot be changed afterwards.  There is no level filtering: every
//! call produces exactly one line, formatted as:
//!
//! ```text
//! INFO: 2023/10/17 08:15:00 listening on 127.0.0.1:8080
//! ```
//!
//! Loggers are meant to be created once by `main` and then handed to every component that needs
//! diagnostics.  Cloning a `Logger` is cheap and all clones write to the same sink.
//!
//! Library code that emits records through the `log` facade can be routed into the same sink by
//! calling `Logger::install` once during process startup.

use crate::clocks::{Clock, SystemClock};
use std::fmt::{self, Display, Write as _};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use time::macros::format_description;

/// Severity of a log line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    /// Detailed information only useful while debugging.
    Debug,

    /// Regular operational messages.
    Info,

    /// Unexpected conditions that the service recovered from.
    Warning,

    /// Failures that prevented an operation from completing.
    Error,
}

impl Level {
    /// Returns the prefix that starts every line written at this level.
    pub fn prefix(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG: ",
            Level::Info => "INFO: ",
            Level::Warning => "WARNING: ",
            Level::Error => "ERROR: ",
        }
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warning,
            log::Level::Error => Level::Error,
        }
    }
}

/// State shared by all clones of a `Logger`.
struct LoggerInner {
    /// Name given to the logger at construction time.  Not part of the output.
    name: String,

    /// Source of the timestamps attached to every line.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Destination of all lines.  The lock is held for the duration of a single line write.
    sink: Mutex<Box<dyn Write + Send>>,
}

/// Leveled logger with a fixed sink.
#[derive(Clone)]
pub struct Logger {
    /// Shared state so that clones write to the same sink.
    inner: Arc<LoggerInner>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("name", &self.inner.name).finish_non_exhaustive()
    }
}

impl Logger {
    /// Creates a logger named `name` that writes to the standard output and timestamps lines
    /// with the system clock.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self::with_sink(name, Box::new(io::stdout()), Arc::new(SystemClock::default()))
    }

    /// Creates a logger named `name` that writes to `sink` and timestamps lines with `clock`.
    pub fn with_sink<S: Into<String>>(
        name: S,
        sink: Box<dyn Write + Send>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let inner = LoggerInner { name: name.into(), clock, sink: Mutex::new(sink) };
        Self { inner: Arc::from(inner) }
    }

    /// Returns the name given to this logger.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Registers this logger as the backend of the `log` facade.
    ///
    /// Only records at or above `max_level` that go through the facade are accepted.  The four
    /// channels of the logger itself are never filtered.  This can only succeed once per process.
    pub fn install(&self, max_level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(self.clone()))?;
        log::set_max_level(max_level);
        Ok(())
    }

    /// Writes `values`, separated by spaces, at the debug level.
    pub fn debug(&self, values: &[&dyn Display]) {
        self.println(Level::Debug, values)
    }

    /// Writes `values`, separated by spaces, at the info level.
    pub fn info(&self, values: &[&dyn Display]) {
        self.println(Level::Info, values)
    }

    /// Writes `values`, separated by spaces, at the warning level.
    pub fn warn(&self, values: &[&dyn Display]) {
        self.println(Level::Warning, values)
    }

    /// Writes `values`, separated by spaces, at the error level.
    pub fn error(&self, values: &[&dyn Display]) {
        self.println(Level::Error, values)
    }

    /// Writes the preformatted `args` at the debug level.
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        self.printf(Level::Debug, args)
    }

    /// Writes the preformatted `args` at the info level.
    pub fn infof(&self, args: fmt::Arguments<'_>) {
        self.printf(Level::Info, args)
    }

    /// Writes the preformatted `args` at the warning level.
    pub fn warnf(&self, args: fmt::Arguments<'_>) {
        self.printf(Level::Warning, args)
    }

    /// Writes the preformatted `args` at the error level.
    pub fn errorf(&self, args: fmt::Arguments<'_>) {
        self.printf(Level::Error, args)
    }

    /// Writes `values` at `level`, separating them with spaces.
    pub fn println(&self, level: Level, values: &[&dyn Display]) {
        let mut message = String::new();
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                message.push(' ');
            }
            // Writing into a String cannot fail.
            let _ = write!(message, "{}", value);
        }
        self.write_line(level, &message);
    }

    /// Writes the preformatted `args` at `level`.
    pub fn printf(&self, level: Level, args: fmt::Arguments<'_>) {
        match args.as_str() {
            Some(message) => self.write_line(level, message),
            None => self.write_line(level, &args.to_string()),
        }
    }

    /// Formats a complete line for `message` at `level`.
    fn format_line(&self, level: Level, message: &str) -> String {
        let mut line = String::with_capacity(level.prefix().len() + 20 + message.len() + 1);
        line.push_str(level.prefix());
        let now = self.inner.clock.now_utc();
        if let Ok(timestamp) =
            now.format(format_description!("[year]/[month]/[day] [hour]:[minute]:[second]"))
        {
            line.push_str(&timestamp);
            line.push(' ');
        }
        line.push_str(message);
        if !line.ends_with('\n') {
            line.push('\n');
        }
        line
    }

    /// Writes `message` at `level` to the sink as one atomic line.
    ///
    /// Errors are ignored: logging must never make the caller fail.
    fn write_line(&self, level: Level, message: &str) {
        let line = self.format_line(level, message);

        let mut sink = self.inner.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if sink.write_all(line.as_bytes()).is_ok() {
            let _ = sink.flush();
        }
    }
}

impl log::Log for Logger {
    fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        self.printf(record.level().into(), format_args!("{}: {}", record.target(), record.args()));
    }

    fn flush(&self) {
        let mut sink = self.inner.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = sink.flush();
    }
}

/// Test utilities.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use crate::clocks::testutils::SettableClock;
    use time::macros::datetime;

    /// A sink that keeps everything written to it in memory.
    ///
    /// Clones share the same buffer, so a test can hand one clone to a `Logger` and inspect the
    /// output through another.
    #[derive(Clone, Default)]
    pub struct CapturedSink {
        /// Raw bytes written so far.
        data: Arc<Mutex<Vec<u8>>>,
    }

    impl CapturedSink {
        /// Returns everything written so far.
        pub fn contents(&self) -> String {
            String::from_utf8(self.data.lock().unwrap().clone()).unwrap()
        }

        /// Returns the lines written so far, without their line terminators.
        pub fn lines(&self) -> Vec<String> {
            self.contents().lines().map(str::to_owned).collect()
        }
    }

    impl Write for CapturedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Creates a logger that captures its output in memory and that timestamps every line with
    /// `2023/10/17 08:15:00`.
    pub fn setup() -> (Logger, CapturedSink) {
        let sink = CapturedSink::default();
        let clock = Arc::new(SettableClock::new(datetime!(2023-10-17 08:15:00.250 UTC)));
        let logger = Logger::with_sink("test", Box::new(sink.clone()), clock);
        (logger, sink)
    }
}
