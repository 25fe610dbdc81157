//! Building and running `lscm annotate`.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::{BlameConfig, Secret};
use crate::error::{BlameError, Result};

const ANNOTATE: &str = "annotate";

/// Whether the current platform needs `lscm` launched through a new shell.
/// On Windows `lscm` is a batch wrapper that only runs under `cmd /C`.
pub fn needs_new_shell() -> bool {
    cfg!(windows)
}

#[derive(Debug, Clone)]
enum Arg {
    Plain(String),
    Masked(Secret),
}

impl Arg {
    fn expose(&self) -> &str {
        match self {
            Arg::Plain(s) => s,
            Arg::Masked(secret) => secret.expose(),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Plain(s) => f.write_str(s),
            Arg::Masked(secret) => write!(f, "{}", secret),
        }
    }
}

/// A command line whose `Display` is safe to log: masked arguments print as
/// `********`.
#[derive(Debug, Clone)]
pub struct CommandLine {
    executable: String,
    new_shell: bool,
    directory: PathBuf,
    args: Vec<Arg>,
}

impl CommandLine {
    pub fn new(executable: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            new_shell: false,
            directory: directory.into(),
            args: Vec::new(),
        }
    }

    /// `lscm annotate [-u USER] [-P PASS] <target>`, run from `directory`.
    pub fn annotate(config: &BlameConfig, directory: &Path, target: &str, new_shell: bool) -> Self {
        let mut cl = Self::new(config.executable.clone(), directory).new_shell(new_shell);
        cl.arg(ANNOTATE);
        if let Some(username) = &config.username {
            cl.arg("-u");
            cl.arg(username.clone());
        }
        if let Some(password) = &config.password {
            cl.arg("-P");
            cl.masked_arg(password.clone());
        }
        cl.arg(target);
        cl
    }

    pub fn new_shell(mut self, new_shell: bool) -> Self {
        self.new_shell = new_shell;
        self
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(Arg::Plain(arg.into()));
        self
    }

    pub fn masked_arg(&mut self, secret: Secret) -> &mut Self {
        self.args.push(Arg::Masked(secret));
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The program actually spawned.
    pub fn program(&self) -> &str {
        if self.new_shell { "cmd" } else { &self.executable }
    }

    /// Real arguments, secrets included. Only for handing to the OS.
    pub fn args(&self) -> Vec<&str> {
        let mut args = Vec::with_capacity(self.args.len() + 2);
        if self.new_shell {
            args.push("/C");
            args.push(self.executable.as_str());
        }
        args.extend(self.args.iter().map(Arg::expose));
        args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.new_shell {
            f.write_str("cmd /C ")?;
        }
        f.write_str(&self.executable)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a single run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    Exited { code: i32, stderr: String },
    TimedOut,
}

/// Runs a command, feeding each stdout line to `stdout` as soon as it is
/// read.
pub trait CommandExecutor: Send + Sync {
    fn execute(
        &self,
        command: &CommandLine,
        stdout: &mut (dyn FnMut(&str) + Send),
        timeout: Duration,
    ) -> impl Future<Output = Result<InvocationOutcome>> + Send;
}

/// Spawns real processes with tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    async fn execute(
        &self,
        command: &CommandLine,
        stdout: &mut (dyn FnMut(&str) + Send),
        timeout: Duration,
    ) -> Result<InvocationOutcome> {
        debug!(command = %command, directory = %command.directory().display(), "Executing");

        let mut child = Command::new(command.program())
            .args(command.args())
            .current_dir(command.directory())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BlameError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let (Some(out), Some(mut err)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(BlameError::Io(std::io::Error::other("child pipes were not captured")));
        };

        // stderr is drained on the side so a chatty child can't block on a full
        // pipe. Chunks land in a shared buffer so whatever arrived before the
        // deadline survives an abort.
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        let mut stderr_task = tokio::spawn(async move {
            let mut chunk = [0u8; 4096];
            loop {
                match err.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(&chunk[..n]);
                        }
                    }
                }
            }
        });

        let deadline = Instant::now() + timeout;
        let run = async {
            let mut reader = BufReader::new(out);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                if reader.read_until(b'\n', &mut buf).await? == 0 {
                    break;
                }
                let line = String::from_utf8_lossy(&buf);
                stdout(line.trim_end_matches(['\n', '\r']));
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>(status)
        };
        let finished = tokio::time::timeout_at(deadline, run).await;

        match finished {
            Ok(status) => {
                let status = status?;
                // A grandchild can keep stderr open after the child exits.
                if tokio::time::timeout_at(deadline, &mut stderr_task).await.is_err() {
                    warn!(command = %command, "stderr still open at deadline, keeping what was read");
                    stderr_task.abort();
                }
                let stderr = captured
                    .lock()
                    .map(|buf| String::from_utf8_lossy(&buf).into_owned())
                    .unwrap_or_default();
                Ok(InvocationOutcome::Exited {
                    code: status.code().unwrap_or(-1),
                    stderr,
                })
            }
            Err(_) => {
                warn!(command = %command, timeout_ms = timeout.as_millis() as u64, "Command timed out");
                let _ = child.kill().await;
                stderr_task.abort();
                Ok(InvocationOutcome::TimedOut)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(username: Option<&str>, password: Option<&str>) -> BlameConfig {
        BlameConfig::default().with_credentials(username.map(Into::into), password.map(Into::into))
    }

    #[test]
    fn annotate_without_credentials() {
        let cl = CommandLine::annotate(&config(None, None), Path::new("/base"), "src/foo.xoo", false);
        assert_eq!(cl.program(), "lscm");
        assert_eq!(cl.args(), vec!["annotate", "src/foo.xoo"]);
        assert_eq!(cl.to_string(), "lscm annotate src/foo.xoo");
        assert_eq!(cl.directory(), Path::new("/base"));
    }

    #[test]
    fn password_is_masked_in_display_only() {
        let cl = CommandLine::annotate(
            &config(Some("julien"), Some("s3cr3t")),
            Path::new("/base"),
            "src/foo.xoo",
            false,
        );
        assert_eq!(cl.args(), vec!["annotate", "-u", "julien", "-P", "s3cr3t", "src/foo.xoo"]);
        assert_eq!(cl.to_string(), "lscm annotate -u julien -P ******** src/foo.xoo");
        assert!(!format!("{:?}", cl).contains("s3cr3t"));
    }

    #[test]
    fn new_shell_wraps_with_cmd() {
        let cl = CommandLine::annotate(&config(Some("julien"), None), Path::new("C:\\base"), "foo.xoo", true);
        assert_eq!(cl.program(), "cmd");
        assert_eq!(cl.args(), vec!["/C", "lscm", "annotate", "-u", "julien", "foo.xoo"]);
        assert_eq!(cl.to_string(), "cmd /C lscm annotate -u julien foo.xoo");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn streams_stdout_and_captures_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = CommandLine::new("sh", dir.path());
        cl.arg("-c").arg("printf 'one\\ntwo\\r\\nthree'; echo oops >&2; exit 3");

        let mut seen = Vec::new();
        let outcome = ProcessExecutor
            .execute(&cl, &mut |line: &str| seen.push(line.to_string()), Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(seen, vec!["one", "two", "three"]);
        assert_eq!(
            outcome,
            InvocationOutcome::Exited { code: 3, stderr: "oops\n".to_string() }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = CommandLine::new("sh", dir.path());
        cl.arg("-c").arg("sleep 5");

        let outcome = ProcessExecutor
            .execute(&cl, &mut |_: &str| {}, Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(outcome, InvocationOutcome::TimedOut);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn lingering_stderr_holder_does_not_outlive_the_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut cl = CommandLine::new("sh", dir.path());
        // The background sleep inherits stderr and keeps it open after sh exits.
        cl.arg("-c").arg("echo early >&2; sleep 3 >/dev/null & echo ok; exit 0");

        let mut seen = Vec::new();
        let started = std::time::Instant::now();
        let outcome = ProcessExecutor
            .execute(&cl, &mut |line: &str| seen.push(line.to_string()), Duration::from_millis(300))
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(1), "took {:?}", started.elapsed());
        assert_eq!(seen, vec!["ok"]);
        assert_eq!(
            outcome,
            InvocationOutcome::Exited { code: 0, stderr: "early\n".to_string() }
        );
    }

    #[tokio::test]
    async fn missing_executable_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let cl = CommandLine::new("definitely-not-lscm-on-this-host", dir.path());
        let err = ProcessExecutor
            .execute(&cl, &mut |_: &str| {}, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BlameError::Spawn { .. }));
    }
}
