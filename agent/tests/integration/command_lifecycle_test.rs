//! 外部プロセスの起動と停止

use crate::support::agent::{action, build_app};
use nix::sys::signal::kill;
use nix::unistd::Pid;
use serde_json::json;
use std::time::{Duration, Instant};

#[tokio::test]
async fn sleep_process_starts_promptly_and_is_terminated() {
    let (state, app) = build_app(Duration::from_secs(5));

    let started = Instant::now();
    let error = action(
        &app,
        "/api/cmd/init",
        json!({ "name": "sleeper", "cmd_components": ["sleep", "100"], "warmup_millis": 0 }),
    )
    .await;
    assert_eq!(error, "");
    assert!(started.elapsed() < Duration::from_secs(2));

    let pid = state
        .commands
        .registry()
        .get("sleeper")
        .await
        .unwrap()
        .pid()
        .await
        .unwrap();
    let pid = Pid::from_raw(pid as i32);
    assert!(kill(pid, None).is_ok());

    let error = action(&app, "/api/cmd/shutdown", json!({ "name": "sleeper" })).await;

    assert_eq!(error, "");
    assert!(kill(pid, None).is_err());
    assert!(state.commands.registry().is_empty().await);
}
