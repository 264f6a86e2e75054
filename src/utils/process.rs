//! Child process helpers shared by the engine and muxer adapters

use std::ffi::OsStr;
use std::process::{Command, Stdio};

/// Run `program args...` and return the first non-empty stdout line.
///
/// A missing executable or a non-zero exit is an error describing why.
pub fn version_probe<S: AsRef<OsStr>>(program: &OsStr, args: &[S]) -> Result<String, String> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    hide_console(&mut command);

    let output = command
        .output()
        .map_err(|e| format!("cannot run {}: {}", program.to_string_lossy(), e))?;

    if !output.status.success() {
        return Err(format!(
            "{} exited with {}",
            program.to_string_lossy(),
            output.status
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("unknown version")
        .to_string())
}

/// Keep child processes from flashing a console window on Windows
#[cfg(windows)]
pub fn hide_console(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
pub fn hide_console(_command: &mut Command) {}

/// Start the child as the leader of a new process group, so the helpers
/// below reach every process it spawns
#[cfg(unix)]
pub fn isolate_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
pub fn isolate_process_group(_command: &mut Command) {}

/// Send SIGINT to the process group led by `pid`.
///
/// Returns false when nothing received it.
#[cfg(unix)]
pub fn interrupt_tree(pid: u32) -> bool {
    signal_group(pid, libc::SIGINT)
}

/// Console apps started without a window cannot be interrupted gracefully
#[cfg(not(unix))]
pub fn interrupt_tree(_pid: u32) -> bool {
    false
}

/// Forcefully stop `pid` and everything it spawned
#[cfg(unix)]
pub fn kill_tree(pid: u32) {
    signal_group(pid, libc::SIGKILL);
}

#[cfg(windows)]
pub fn kill_tree(pid: u32) {
    let mut command = Command::new("taskkill");
    command
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    hide_console(&mut command);
    let _ = command.status();
}

#[cfg(not(any(unix, windows)))]
pub fn kill_tree(_pid: u32) {}

/// Whether any process of the group led by `pid` still exists
#[cfg(unix)]
pub fn tree_alive(pid: u32) -> bool {
    signal_group(pid, 0)
}

#[cfg(not(unix))]
pub fn tree_alive(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: libc::c_int) -> bool {
    // pid 0 would address our own group
    match libc::pid_t::try_from(pid) {
        Ok(pgid) if pgid > 0 => {
            // SAFETY: kill(2) takes plain integers and touches no memory of ours
            unsafe { libc::kill(-pgid, signal) == 0 }
        }
        _ => false,
    }
}
