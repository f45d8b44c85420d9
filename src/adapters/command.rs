//! Child-process execution with timeout enforcement
//!
//! Runs a command with combined stdout/stderr capture. On Unix the child
//! is placed in its own process group so a timeout can terminate the full
//! process tree, not just the immediate child: SIGTERM first, then SIGKILL
//! once the grace period expires.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use log::warn;

use crate::core::ports::RunOutcome;

/// How often the runner checks the child for completion
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Default grace between SIGTERM and SIGKILL at timeout
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(5);

/// Run a command to completion or until the timeout expires
///
/// Output capture runs on dedicated reader threads so the child can never
/// block on a full pipe; no output is dropped, though interleaving across
/// the two streams is not byte-exact. A timed-out child is terminated
/// along with its process tree, bounded by `grace` before escalating to
/// SIGKILL.
pub fn run_with_timeout(
    command: &mut Command,
    timeout: Duration,
    grace: Duration,
) -> anyhow::Result<RunOutcome> {
    command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt as _;
        command.process_group(0);
    }

    let mut child = command.spawn().context("failed to spawn command")?;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = thread::spawn(move || drain(stdout));
    let stderr_reader = thread::spawn(move || drain(stderr));

    let deadline = Instant::now() + timeout;
    let mut timed_out = false;
    let status = loop {
        if let Some(status) = child.try_wait().context("failed to poll child")? {
            break Some(status);
        }
        if Instant::now() >= deadline {
            timed_out = true;
            break None;
        }
        thread::sleep(POLL_INTERVAL);
    };

    let status = match status {
        Some(status) => Some(status),
        None => {
            warn!("command exceeded {}s timeout, terminating process tree", timeout.as_secs());
            terminate(&mut child, grace)?
        },
    };

    let output = combine_output(
        &stdout_reader.join().unwrap_or_default(),
        &stderr_reader.join().unwrap_or_default(),
    );

    Ok(RunOutcome {
        exit_code: status.and_then(|s| s.code()),
        output,
        timed_out,
    })
}

/// Join captured stdout and stderr into one artifact, stderr appended
/// after a separating newline
#[must_use]
pub fn combine_output(stdout: &str, stderr: &str) -> String {
    let mut combined = stdout.to_string();
    if !stderr.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(stderr);
    }
    combined
}

fn drain(stream: Option<impl Read>) -> String {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        // Read errors here mean the pipe closed; return what arrived
        let _ = stream.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Terminate the child's process group, escalating after the grace period
fn terminate(
    child: &mut Child,
    grace: Duration,
) -> anyhow::Result<Option<std::process::ExitStatus>> {
    signal_tree(child, false);

    let grace_deadline = Instant::now() + grace;
    loop {
        if let Some(status) = child.try_wait().context("failed to poll child")? {
            return Ok(Some(status));
        }
        if Instant::now() >= grace_deadline {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    signal_tree(child, true);
    // SIGKILL cannot be ignored; this wait is bounded
    let status = child.wait().context("failed to reap killed child")?;
    Ok(Some(status))
}

#[cfg(unix)]
fn signal_tree(child: &mut Child, force: bool) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let signal = if force { Signal::SIGKILL } else { Signal::SIGTERM };
    if let Ok(raw) = i32::try_from(child.id()) {
        // The child is its own group leader (process_group(0) at spawn)
        let _ = killpg(Pid::from_raw(raw), signal);
    }
}

#[cfg(not(unix))]
fn signal_tree(child: &mut Child, _force: bool) {
    // No process groups; kill the immediate child only
    let _ = child.kill();
}
