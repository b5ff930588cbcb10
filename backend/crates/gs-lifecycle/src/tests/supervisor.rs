use crate::{LifecycleError, ProcessSupervisor, SystemSupervisor};

use std::io::Write;
use std::time::Duration;

use gs_config::ProcessConfig;
use googletest::assert_that;
use googletest::prelude::{anything, eq, ge, ok};
use tempfile::NamedTempFile;

fn supervisor_for(launch_path: &str) -> SystemSupervisor {
    SystemSupervisor::new(&ProcessConfig {
        launch_path: launch_path.to_string(),
        shell: "sh".to_string(),
        process_name: "gs-lifecycle-no-such-process-7f3a".to_string(),
    })
}

fn script(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{body}").unwrap();
    file
}

#[tokio::test]
async fn given_unknown_process_name_when_is_running_then_false() {
    // Given
    let supervisor = supervisor_for("./start.sh");

    // When
    let running = supervisor.is_running().await;

    // Then
    assert_that!(running, eq(false));
}

#[tokio::test]
async fn given_succeeding_script_when_spawn_then_ok() {
    // Given
    let launch = script("exit 0");
    let supervisor = supervisor_for(launch.path().to_str().unwrap());

    // When
    let result = supervisor.spawn().await;

    // Then
    assert_that!(result, ok(anything()));
}

#[tokio::test]
async fn given_failing_script_when_spawn_then_launch_error() {
    // Given
    let launch = script("exit 3");
    let supervisor = supervisor_for(launch.path().to_str().unwrap());

    // When
    let result = supervisor.spawn().await;

    // Then
    assert!(matches!(result, Err(LifecycleError::Launch { .. })));
}

#[tokio::test]
async fn given_unknown_process_name_when_terminate_then_none_signalled() {
    // Given
    let supervisor = supervisor_for("./start.sh");

    // When
    let signalled = supervisor.terminate().await.unwrap();

    // Then
    assert_that!(signalled, eq(0));
}

#[cfg(unix)]
#[tokio::test]
async fn given_matching_process_when_terminate_then_signalled_and_gone() {
    // Given
    let marker = format!("gs-lifecycle-terminate-{}", std::process::id());
    let mut child = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(format!("sleep 30; : {marker}"))
        .spawn()
        .unwrap();
    let supervisor = SystemSupervisor::new(&ProcessConfig {
        launch_path: "./start.sh".to_string(),
        shell: "sh".to_string(),
        process_name: marker,
    });
    assert_that!(supervisor.is_running().await, eq(true));

    // When
    let signalled = supervisor.terminate().await.unwrap();
    let status = tokio::time::timeout(Duration::from_secs(5), child.wait())
        .await
        .unwrap()
        .unwrap();

    // Then
    assert_that!(signalled, ge(1));
    assert_that!(status.success(), eq(false));
    assert_that!(supervisor.is_running().await, eq(false));
}
