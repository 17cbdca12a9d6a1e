// src/index/process.rs

//! Streaming subprocess runner
//!
//! The child's stdout and stderr share one pipe. A worker thread feeds each
//! line to a [`LineHandler`] while the caller waits for the process to exit.
//! Once it has exited the worker gets a grace period ([`DRAIN_GRACE_PERIOD`]
//! unless the caller picks another) to finish. After that it is abandoned,
//! left running and never joined, and its handler is lost.

use crate::error::{Error, Result};
use std::io::{BufRead, BufReader};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Time allowed for the output worker once the process has exited
pub const DRAIN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Receives the combined output of a command, one line at a time
pub trait LineHandler: Send + 'static {
    fn handle_line(&mut self, line: &str);
}

/// Outcome of [`run_command`]
#[derive(Debug)]
pub struct CommandOutput<H> {
    pub status: ExitStatus,
    /// The handler, unless its worker was abandoned
    pub handler: Option<H>,
}

fn describe(command: &Command) -> String {
    let mut text = command.get_program().to_string_lossy().into_owned();
    for arg in command.get_args() {
        text.push(' ');
        text.push_str(&arg.to_string_lossy());
    }
    text
}

/// Run `command` to completion, streaming its output into `handler`
pub fn run_command<H: LineHandler>(command: Command, handler: H) -> Result<CommandOutput<H>> {
    run_command_with_grace(command, handler, DRAIN_GRACE_PERIOD)
}

/// [`run_command`] with an explicit drain grace period
pub fn run_command_with_grace<H: LineHandler>(
    mut command: Command,
    handler: H,
    grace: Duration,
) -> Result<CommandOutput<H>> {
    let description = describe(&command);
    debug!("> {}", description);

    let (reader, writer) = std::io::pipe()?;
    let stderr_writer = writer.try_clone()?;
    command
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr_writer);

    let mut child = command
        .spawn()
        .map_err(|e| Error::CommandFailed(format!("{}: {}", description, e)))?;
    // The command holds the parent's copies of the write end
    drop(command);

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut handler = handler;
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    debug!("{}", line);
                    handler.handle_line(line);
                }
                Err(e) => {
                    debug!("Output stream closed: {}", e);
                    break;
                }
            }
        }
        let _ = tx.send(handler);
    });

    let status = child.wait()?;
    if !status.success() {
        info!("{} exited with {}", description, status);
    }

    let handler = match rx.recv_timeout(grace) {
        Ok(handler) => Some(handler),
        Err(_) => {
            warn!(
                "Output of '{}' not drained after {:?}, abandoning reader",
                description, grace
            );
            None
        }
    };

    Ok(CommandOutput { status, handler })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[derive(Debug, Default)]
    struct Collect(Vec<String>);

    impl LineHandler for Collect {
        fn handle_line(&mut self, line: &str) {
            self.0.push(line.to_string());
        }
    }

    #[test]
    fn test_combined_output() {
        let mut command = Command::new("sh");
        command.args(["-c", "echo out; echo err 1>&2; exit 3"]);

        let output = run_command(command, Collect::default()).unwrap();
        assert_eq!(output.status.code(), Some(3));

        let mut lines = output.handler.unwrap().0;
        lines.sort();
        assert_eq!(lines, vec!["err", "out"]);
    }

    #[test]
    fn test_reader_abandoned_after_grace() {
        // The background sleep keeps the pipe open after the shell exits
        let mut command = Command::new("sh");
        command.args(["-c", "echo hi; sleep 30 &"]);

        let started = Instant::now();
        let output =
            run_command_with_grace(command, Collect::default(), Duration::from_millis(200)).unwrap();

        assert!(output.status.success());
        assert!(output.handler.is_none());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program() {
        let command = Command::new("debsolve-no-such-program");
        let err = run_command(command, Collect::default()).unwrap_err();
        assert!(matches!(err, Error::CommandFailed(_)));
    }
}
