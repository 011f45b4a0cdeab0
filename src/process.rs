use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
/// How long to wait for pipe readers after a timeout kill.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal or on timeout.
    pub code: Option<i32>,
    pub timed_out: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.code == Some(0)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Join a pipe reader. With a `deadline`, give up once it passes so that a
/// process which escaped the kill and still holds the pipe cannot stall us.
fn collect(handle: Option<JoinHandle<String>>, deadline: Option<Instant>) -> String {
    let Some(handle) = handle else {
        return String::new();
    };
    if let Some(deadline) = deadline {
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                return String::new();
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
    handle.join().unwrap_or_default()
}

#[cfg(unix)]
fn own_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_cmd: &mut Command) {}

/// Kill the child and everything it spawned.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        // The child leads its own group, so its pid is the group id.
        unsafe { libc::killpg(child.id() as libc::pid_t, libc::SIGKILL) };
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Run `cmd` to completion, killing it once `timeout` elapses.
///
/// Failing to spawn is an error; a non-zero exit or a timeout is reported in
/// the returned [`CommandOutput`].
pub fn run(cmd: &mut Command, timeout: Duration) -> Result<CommandOutput> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    own_process_group(cmd);
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to run {program}"))?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| format!("failed to wait for {program}"))?
        {
            break Some(status);
        }
        if Instant::now() >= deadline {
            kill_tree(&mut child);
            break None;
        }
        thread::sleep(POLL_INTERVAL);
    };

    let drain_deadline = status.is_none().then(|| Instant::now() + DRAIN_GRACE);
    Ok(CommandOutput {
        code: status.and_then(|s| s.code()),
        timed_out: status.is_none(),
        stdout: collect(stdout, drain_deadline),
        stderr: collect(stderr, drain_deadline),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_output_and_code() {
        let out = run(
            Command::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(out.code, Some(3));
        assert!(!out.success());
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[test]
    fn kills_on_timeout() {
        let started = Instant::now();
        let out = run(
            Command::new("sh").args(["-c", "exec sleep 5"]),
            Duration::from_millis(100),
        )
        .unwrap();
        assert!(out.timed_out);
        assert!(!out.success());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn timeout_kills_grandchildren() {
        let started = Instant::now();
        let out = run(
            Command::new("sh").args(["-c", "sleep 5; echo done"]),
            Duration::from_millis(200),
        )
        .unwrap();
        assert!(out.timed_out);
        assert!(!out.stdout.contains("done"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn missing_program_is_error() {
        let err = run(
            &mut Command::new("definitely-not-a-real-program-xyz"),
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(err.to_string().contains("failed to run"));
    }
}
