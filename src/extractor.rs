// ABOUTME: Runs the yt-dlp binary as a bounded subprocess
// ABOUTME: Captures exit status, stdout and stderr, killing its process group on timeout

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

pub const DEFAULT_PROGRAM: &str = "yt-dlp";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Prefer a progressive mp4, otherwise whatever yt-dlp ranks best
pub const FORMAT_SELECTOR: &str = "best[ext=mp4]/best";

/// Raw outcome of a single extractor run. Never leaves the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    /// Set when the process could not be started, waited on or read
    pub process_error: Option<String>,
}

impl ExtractionResult {
    pub fn completed(exit_code: Option<i32>, stdout: String, stderr: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            ..Default::default()
        }
    }

    pub fn timed_out() -> Self {
        Self {
            timed_out: true,
            ..Default::default()
        }
    }

    pub fn process_failed(message: impl Into<String>) -> Self {
        Self {
            process_error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone)]
pub struct Extractor {
    program: String,
    timeout: Duration,
}

impl Extractor {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the extractor against `url` and wait for it to exit or time out.
    ///
    /// One deadline covers the exit and draining both pipes, so a descendant
    /// holding stdout open cannot stretch the run. The extractor leads its own
    /// process group; the group is killed on timeout, on wait/read failure and
    /// when this future is dropped (client went away).
    pub async fn invoke(&self, url: &str) -> ExtractionResult {
        let deadline = Instant::now() + self.timeout;

        let mut std_cmd = std::process::Command::new(&self.program);
        std_cmd
            .args(build_args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }
        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExtractionResult::process_failed(format!(
                    "Failed to start {}: {}",
                    self.program, e
                ));
            }
        };
        let mut group = ProcessGroupGuard::new(child.id());

        let mut stdout_task = spawn_reader(child.stdout.take());
        let mut stderr_task = spawn_reader(child.stderr.take());

        let run = async {
            let status = child
                .wait()
                .await
                .map_err(|e| format!("Failed to wait for {}: {}", self.program, e))?;
            let stdout = collect_output(&mut stdout_task, &self.program).await?;
            let stderr = collect_output(&mut stderr_task, &self.program).await?;
            Ok::<_, String>((status, stdout, stderr))
        };
        let waited = timeout_at(deadline, run).await;

        match waited {
            Ok(Ok((status, stdout, stderr))) => {
                group.disarm();
                ExtractionResult::completed(status.code(), stdout, stderr)
            }
            Ok(Err(message)) => {
                group.kill();
                stdout_task.abort();
                stderr_task.abort();
                ExtractionResult::process_failed(message)
            }
            Err(_) => {
                info!(
                    "{} exceeded {:?}, killing process group {:?}",
                    self.program, self.timeout, group.pgid
                );
                group.kill();
                // Reaps the leader; it may already have been waited on
                let _ = child.kill().await;
                stdout_task.abort();
                stderr_task.abort();
                ExtractionResult::timed_out()
            }
        }
    }
}

/// Argument vector for a URL-only, single-video lookup. `url` stays one argv entry.
pub fn build_args(url: &str) -> Vec<String> {
    vec![
        "-g".to_string(),
        "--no-playlist".to_string(),
        "--format".to_string(),
        FORMAT_SELECTOR.to_string(),
        "--no-warnings".to_string(),
        "--no-check-certificate".to_string(),
        url.to_string(),
    ]
}

fn spawn_reader<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                warn!("Failed to read extractor output: {}", e);
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Join a pipe reader. A failed reader is an error, never empty output.
async fn collect_output(task: &mut JoinHandle<String>, program: &str) -> Result<String, String> {
    task.await.map_err(|e| {
        warn!("Output reader for {} failed: {}", program, e);
        format!("Failed to read {} output: {}", program, e)
    })
}

/// Kills the extractor's whole process group when dropped, unless disarmed.
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_group(pgid);
        }
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let rc = unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        // ESRCH: every member already exited
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!("Failed to kill process group {}: {}", pgid, err);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}
