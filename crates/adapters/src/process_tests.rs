use super::*;

#[test]
fn empty_command_is_rejected() {
    let params = SpawnParams::default();
    assert!(matches!(spawn(&params), Err(SpawnError::EmptyCommand)));
}

#[tokio::test]
async fn spawns_echo_and_captures_exit() {
    let params = SpawnParams {
        command: vec!["echo".to_string(), "hi".to_string()],
        ..Default::default()
    };
    let mut child = spawn(&params).expect("spawn should succeed");
    let status = child.wait().await.expect("child should exit");
    assert!(status.success());
}

#[tokio::test]
async fn terminate_kills_a_sleeping_child() {
    let params = SpawnParams {
        command: vec!["sleep".to_string(), "30".to_string()],
        ..Default::default()
    };
    let mut child = spawn(&params).expect("spawn should succeed");
    let escalated = terminate(&mut child, Duration::from_millis(200)).await;
    assert!(!escalated, "sleep honors SIGTERM, so this should not need SIGKILL");
    let status = child.wait().await.expect("child should have been reaped");
    assert!(!status.success());
}

#[tokio::test]
async fn terminate_escalates_to_sigkill_when_the_child_ignores_sigterm() {
    let params = SpawnParams {
        command: vec!["sh".to_string(), "-c".to_string(), "trap '' TERM; sleep 30".to_string()],
        ..Default::default()
    };
    let mut child = spawn(&params).expect("spawn should succeed");
    let escalated = terminate(&mut child, Duration::from_millis(200)).await;
    assert!(escalated, "child traps SIGTERM, so termination should have escalated to SIGKILL");
    let status = child.wait().await.expect("child should have been reaped");
    assert!(!status.success());
}
