//! Subprocess execution of confirmed commands.
//!
//! Every call spawns exactly one child and waits for it under a timeout. The
//! wait can also be cut short by Ctrl-C. Whatever happened is folded into an
//! [`ExecutionResult`], with any output captured up to that point. Nothing here
//! returns an error to the caller.

use std::future::Future;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::ExecutionConfig;
use crate::platform::Dialect;
use crate::utils::signal::interrupted;

const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Outcome of one execution attempt. Always fully populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    fn failed(exit_code: i32, stdout: String, stderr: String, cause: impl FnOnce() -> String) -> Self {
        let stderr = if stderr.trim().is_empty() { cause() } else { stderr };
        Self {
            // 0 is reserved for a clean exit
            exit_code: if exit_code == 0 { 1 } else { exit_code },
            stdout,
            stderr,
        }
    }
}

/// Anything that can run a shell command and report its outcome.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn execute(&self, command: &str, config: &ExecutionConfig) -> ExecutionResult;
}

/// Runs commands through the host shell for the configured dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }
}

fn build_command(command: &str, dialect: Dialect) -> Command {
    let mut c = match dialect {
        Dialect::PowerShell => {
            let mut c = Command::new("powershell");
            c.arg("-NoProfile").arg("-Command").arg(command);
            c
        }
        Dialect::Posix => {
            let mut c = Command::new("/bin/sh");
            c.arg("-c").arg(command);
            c
        }
    };
    c.stdin(Stdio::null());
    c.stdout(Stdio::piped());
    c.stderr(Stdio::piped());
    c.kill_on_drop(true);
    // Own process group so a timeout can take down everything the shell started.
    #[cfg(unix)]
    {
        c.process_group(0);
    }
    c
}

type Capture = Arc<Mutex<Vec<u8>>>;

/// Copy `stream` into `sink` chunk by chunk, so whatever arrived before a
/// kill is still there afterwards.
fn spawn_reader<R>(stream: Option<R>, sink: Capture) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(mut stream) = stream else {
            return;
        };
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => sink.lock().await.extend_from_slice(&chunk[..n]),
                Err(e) => {
                    warn!("Failed to read child output: {}", e);
                    break;
                }
            }
        }
    })
}

async fn captured(sink: &Capture) -> String {
    String::from_utf8_lossy(&sink.lock().await).into_owned()
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Interrupted,
}

/// Forcibly stop the child (and its process group on Unix) and reap it.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: plain kill(2) on the group we created in build_command.
            let rc = unsafe { libc::kill(-(pid as libc::pid_t), libc::SIGKILL) };
            if rc != 0 {
                warn!("Failed to kill process group {}: {}", pid, std::io::Error::last_os_error());
            }
        }
    }
    if let Err(e) = child.kill().await {
        warn!("Failed to kill timed out command: {}", e);
    }
}

fn describe_exit(status: ExitStatus) -> String {
    format!("Command failed ({})", status)
}

fn describe_timeout(limit: Duration) -> String {
    if limit.subsec_millis() == 0 {
        format!("Command timed out after {} seconds", limit.as_secs())
    } else {
        format!("Command timed out after {}ms", limit.as_millis())
    }
}

fn describe_interrupt() -> String {
    "Command interrupted".to_string()
}

impl ShellExecutor {
    /// Run `command` until it exits, the timeout elapses, or `cancel`
    /// resolves. The last two terminate the child.
    pub async fn execute_until<F>(
        &self,
        command: &str,
        config: &ExecutionConfig,
        cancel: F,
    ) -> ExecutionResult
    where
        F: Future<Output = ()> + Send,
    {
        info!(dialect = %config.dialect, "Executing command: {}", command);

        let mut child = match build_command(command, config.dialect).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to launch command: {}", e);
                return ExecutionResult::failed(1, String::new(), String::new(), || {
                    format!("Failed to launch command: {}", e)
                });
            }
        };

        let stdout = Capture::default();
        let stderr = Capture::default();
        let mut stdout_reader = spawn_reader(child.stdout.take(), Arc::clone(&stdout));
        let mut stderr_reader = spawn_reader(child.stderr.take(), Arc::clone(&stderr));

        let outcome = {
            let finished = async {
                let (status, _, _) =
                    tokio::join!(child.wait(), &mut stdout_reader, &mut stderr_reader);
                status
            };
            tokio::select! {
                waited = timeout(config.timeout, finished) => match waited {
                    Ok(status) => Outcome::Exited(status),
                    Err(_) => Outcome::TimedOut,
                },
                _ = cancel => Outcome::Interrupted,
            }
        };

        if !matches!(outcome, Outcome::Exited(_)) {
            terminate(&mut child).await;
            // The group is gone, so the pipes close; pick up what is still buffered.
            let drained = timeout(
                DRAIN_GRACE,
                async { tokio::join!(&mut stdout_reader, &mut stderr_reader) },
            )
            .await;
            if drained.is_err() {
                warn!("Output readers did not finish after termination");
            }
            stdout_reader.abort();
            stderr_reader.abort();
        }

        let out = captured(&stdout).await;
        let err = captured(&stderr).await;

        let result = match outcome {
            Outcome::Exited(Ok(status)) if status.success() => ExecutionResult {
                exit_code: 0,
                stdout: out,
                stderr: err,
            },
            Outcome::Exited(Ok(status)) => {
                // Killed by a signal: no code to report.
                ExecutionResult::failed(status.code().unwrap_or(1), out, err, || describe_exit(status))
            }
            Outcome::Exited(Err(e)) => {
                ExecutionResult::failed(1, out, err, || format!("Failed to wait for command: {}", e))
            }
            Outcome::TimedOut => {
                warn!("Command exceeded {:?}, terminated", config.timeout);
                ExecutionResult::failed(1, out, err, || describe_timeout(config.timeout))
            }
            Outcome::Interrupted => {
                warn!("Command interrupted by the user, terminated");
                ExecutionResult::failed(1, out, err, describe_interrupt)
            }
        };

        info!(exit_code = result.exit_code, "Command finished");
        result
    }
}

#[async_trait]
impl CommandRunner for ShellExecutor {
    async fn execute(&self, command: &str, config: &ExecutionConfig) -> ExecutionResult {
        self.execute_until(command, config, interrupted()).await
    }
}
