//! End-to-end tests of the done/close sentinel protocol
//!
//! The generated script is executed headless under bash instead of a
//! terminal emulator; the protocol is identical, only the window is
//! missing. Tests cover:
//! - success and failure round-trips with exit-code propagation
//! - the done-before-close ordering
//! - force-release unblocking a job that never reported
//! - stale-flag hygiene when a slot is reused

use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tacsetup_core::Session;
use tacsetup_jobs::{JobHandle, JobRunner, JobSpec, JobStatus};
use tacsetup_ui::dialog::{NullProgress, RecordingDialog};

fn spec(body: &str) -> JobSpec {
    JobSpec {
        name: "job-under-test.sh",
        title: "Job under test".to_string(),
        body: body.to_string(),
        pause_before_exit: false,
        success_message: "done".to_string(),
        error_message: "failed".to_string(),
    }
}

fn run_headless(script: &std::path::Path) -> Child {
    Command::new("bash")
        .arg(script)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("bash must be available for handshake tests")
}

fn wait_with_timeout(child: &mut Child, limit: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().expect("try_wait") {
            return Some(status);
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    None
}

#[tokio::test]
async fn test_success_roundtrip_propagates_exit_zero() {
    let tmp = tempfile::tempdir().unwrap();
    let session = Session::at(tmp.path(), false);
    let dialog = RecordingDialog::new(true, None);
    let runner = JobRunner::new(&session, &dialog);

    let script = runner.stage(&spec("exit 0")).unwrap();
    let mut child = run_headless(&script);

    let handle = JobHandle::new(&session).with_poll_interval(Duration::from_millis(25));
    let status = handle.await_status(&mut NullProgress).await;
    assert_eq!(status, JobStatus::Success);

    // Done observed, close not yet signaled: the subprocess is still
    // alive, blocked on the close-flag.
    assert!(session.done_flag().is_file());
    assert!(!session.close_flag().exists());
    assert!(child.try_wait().unwrap().is_none());

    handle.release();
    let exit = wait_with_timeout(&mut child, Duration::from_secs(10)).expect("job must exit");
    assert_eq!(exit.code(), Some(0));
}

#[tokio::test]
async fn test_failure_roundtrip_propagates_original_code() {
    let tmp = tempfile::tempdir().unwrap();
    let session = Session::at(tmp.path(), false);
    let dialog = RecordingDialog::new(true, None);
    let runner = JobRunner::new(&session, &dialog);

    let script = runner.stage(&spec("echo doomed; exit 3")).unwrap();
    let mut child = run_headless(&script);

    let handle = JobHandle::new(&session).with_poll_interval(Duration::from_millis(25));
    let status = handle.await_status(&mut NullProgress).await;
    assert_eq!(status, JobStatus::Error);

    handle.release();
    let exit = wait_with_timeout(&mut child, Duration::from_secs(10)).expect("job must exit");
    assert_eq!(exit.code(), Some(3));
}

#[tokio::test]
async fn test_force_release_unblocks_job_that_never_reported() {
    // An interrupt force-writes the close-flag without waiting for the
    // done-flag; a job that finishes afterwards must still terminate.
    let tmp = tempfile::tempdir().unwrap();
    let session = Session::at(tmp.path(), false);
    let dialog = RecordingDialog::new(true, None);
    let runner = JobRunner::new(&session, &dialog);

    let script = runner.stage(&spec("sleep 1")).unwrap();
    let mut child = run_headless(&script);

    session.force_release();
    let exit = wait_with_timeout(&mut child, Duration::from_secs(10)).expect("job must exit");
    assert_eq!(exit.code(), Some(0));
}

#[tokio::test]
async fn test_session_dir_removal_does_not_strand_the_job() {
    let tmp = tempfile::tempdir().unwrap();
    let session = Session::at(tmp.path().join("slot"), false);
    std::fs::create_dir_all(session.dir()).unwrap();
    let dialog = RecordingDialog::new(true, None);
    let runner = JobRunner::new(&session, &dialog);

    let script = runner.stage(&spec("exit 0")).unwrap();
    // Move the script out so removing the session dir cannot race bash
    // reading it.
    let relocated = tmp.path().join("job-under-test.sh");
    std::fs::copy(&script, &relocated).unwrap();
    let mut child = run_headless(&relocated);

    let handle = JobHandle::new(&session).with_poll_interval(Duration::from_millis(25));
    handle.await_status(&mut NullProgress).await;

    std::fs::remove_dir_all(session.dir()).unwrap();
    let exit = wait_with_timeout(&mut child, Duration::from_secs(10)).expect("job must exit");
    assert_eq!(exit.code(), Some(0));
}

#[tokio::test]
async fn test_stage_deletes_stale_flags() {
    let tmp = tempfile::tempdir().unwrap();
    let session = Session::at(tmp.path(), false);
    std::fs::write(session.done_flag(), b"error\n").unwrap();
    std::fs::write(session.close_flag(), b"closed\n").unwrap();
    std::fs::write(session.success_flag(), b"installed\n").unwrap();

    let dialog = RecordingDialog::new(true, None);
    let runner = JobRunner::new(&session, &dialog);
    runner.stage(&spec("exit 0")).unwrap();

    assert!(!session.done_flag().exists());
    assert!(!session.close_flag().exists());
    assert!(!session.success_flag().exists());
}
