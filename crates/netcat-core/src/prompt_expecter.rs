//! Line-oriented read/expect loop over an interactive `ssh2::Channel`.
//!
//! Grounded on the teacher's `base_connection.rs` (`read_channel`,
//! `read_until_pattern`, `write_channel`) and `channel.rs`, collapsed into a
//! single small type since this crate does not need the teacher's separate
//! `SSHChannel`/`SessionLog` abstractions.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use regex::Regex;
use ssh2::Channel;
use tracing::{debug, trace};

use crate::error::NetcatError;

const POLL_DELAY: Duration = Duration::from_millis(10);
const READ_CHUNK: usize = 65536;

/// Outcome of one non-blocking read attempt on the underlying channel.
enum ReadOutcome {
    /// Bytes were read (possibly empty after ANSI-stripping).
    Data(String),
    /// Nothing available yet (`WouldBlock`); the channel is still open.
    NoData,
    /// The channel read `0` bytes: the child process exited.
    Eof,
}

/// Wraps a shell channel and drives the classic expect loop: write a line,
/// read until a prompt (or other) regex matches in the accumulated output.
pub struct PromptExpecter {
    channel: Channel,
    buffer: String,
    strip_ansi: bool,
}

impl PromptExpecter {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            buffer: String::new(),
            strip_ansi: false,
        }
    }

    pub fn with_ansi_stripping(mut self, strip: bool) -> Self {
        self.strip_ansi = strip;
        self
    }

    /// Write raw data (no trailing newline added).
    pub fn write_raw(&mut self, data: &str) -> Result<(), NetcatError> {
        trace!(target: "prompt_expecter", "write: {:?}", data);
        self.channel.write_all(data.as_bytes())?;
        self.channel.flush()?;
        Ok(())
    }

    /// Write a command line terminated by `\n`.
    pub fn send_line(&mut self, line: &str) -> Result<(), NetcatError> {
        self.write_raw(&format!("{line}\n"))
    }

    /// Best-effort non-blocking drain of whatever is already buffered on the
    /// channel, used to discard a login banner or a stale prompt echo.
    pub fn drain(&mut self, quiet_for: Duration) {
        let mut last_read = Instant::now();
        loop {
            match self.try_read_chunk() {
                Ok(ReadOutcome::Data(chunk)) => {
                    self.buffer.push_str(&chunk);
                    last_read = Instant::now();
                }
                _ => {
                    if last_read.elapsed() >= quiet_for {
                        break;
                    }
                }
            }
            std::thread::sleep(POLL_DELAY);
        }
        self.buffer.clear();
    }

    /// Read once from the channel. Distinguishes "nothing available yet"
    /// (`WouldBlock`) from "the child closed the channel" (a `0`-byte read)
    /// so callers can fail fast on the latter instead of spinning out the
    /// full timeout.
    fn try_read_chunk(&mut self) -> Result<ReadOutcome, NetcatError> {
        let mut buf = [0u8; READ_CHUNK];
        match self.channel.read(&mut buf) {
            Ok(0) => Ok(ReadOutcome::Eof),
            Ok(n) => {
                let mut chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                if self.strip_ansi {
                    chunk = strip_ansi_escapes(&chunk);
                }
                Ok(ReadOutcome::Data(chunk))
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(ReadOutcome::NoData),
            Err(e) => Err(NetcatError::Io(e)),
        }
    }

    /// Read from the channel, accumulating into an internal buffer, until
    /// `pattern` matches the accumulated text or `timeout` elapses. Returns
    /// everything read so far (including the match) and clears the buffer.
    /// Fails with `EndOfStream` immediately if the child exits before the
    /// pattern matches, rather than waiting out the full timeout.
    pub fn expect(&mut self, pattern: &str, timeout: Duration) -> Result<String, NetcatError> {
        let re = Regex::new(pattern)?;
        let start = Instant::now();

        loop {
            if re.is_match(&self.buffer) {
                debug!(target: "prompt_expecter", "matched pattern {:?}", pattern);
                let out = std::mem::take(&mut self.buffer);
                return Ok(out);
            }

            if start.elapsed() > timeout {
                return Err(NetcatError::timeout(
                    format!("waiting for pattern {pattern:?}"),
                    timeout.as_secs(),
                ));
            }

            match self.try_read_chunk()? {
                ReadOutcome::Data(chunk) if !chunk.is_empty() => self.buffer.push_str(&chunk),
                ReadOutcome::Eof => {
                    return Err(NetcatError::EndOfStream(format!(
                        "waiting for pattern {pattern:?}"
                    )))
                }
                _ => std::thread::sleep(POLL_DELAY),
            }
        }
    }

    /// Send a line and read the response up to `pattern`.
    pub fn command(
        &mut self,
        line: &str,
        pattern: &str,
        timeout: Duration,
    ) -> Result<String, NetcatError> {
        self.send_line(line)?;
        self.expect(pattern, timeout)
    }

    pub fn into_channel(self) -> Channel {
        self.channel
    }
}

fn strip_ansi_escapes(data: &str) -> String {
    lazy_static::lazy_static! {
        static ref ANSI: Regex = Regex::new(r"\x1B\[[0-9;]*[a-zA-Z]").unwrap();
    }
    ANSI.replace_all(data, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi_color_codes() {
        let raw = "\x1B[31mHello\x1B[0m World";
        assert_eq!(strip_ansi_escapes(raw), "Hello World");
    }
}
