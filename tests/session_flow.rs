//! End-to-end session flows against a scripted `op`.
//!
//! Run with:
//!   cargo test --test session_flow

#![cfg(feature = "mock")]

use opsession::mock::{MockConfig, MockRunner};
use opsession::{Op, OpError, Settings};
use std::sync::Arc;

fn settings(runner: &Arc<MockRunner>, config: &str) -> Settings {
    Settings::new()
        .with_config_source(Arc::new(MockConfig::new(config)))
        .with_runner(runner.clone())
}

#[tokio::test]
async fn test_exported_token_is_reused_without_sign_in() {
    std::env::set_var("OP_SESSION_it_exported", "from-shell");

    let runner = Arc::new(MockRunner::new());
    runner.push_success(r#"{"title":"n","details":{"notesPlain":"hello"}}"#);

    let op = Op::new(settings(&runner, r#"{"latest_signin":"it_exported"}"#))
        .await
        .expect("session from environment");

    assert_eq!(op.get_secure_note("n").await.unwrap(), "hello");

    let calls = runner.calls();
    assert_eq!(calls.len(), 1, "no sign-in should run");
    assert_eq!(
        calls[0].env,
        vec![("OP_SESSION_it_exported".to_string(), "from-shell".to_string())]
    );
}

#[tokio::test]
async fn test_sign_in_then_replace_note() {
    let runner = Arc::new(MockRunner::new());
    runner.push_success(
        "# This command is meant to be used with your shell's eval function.\n\
         export OP_SESSION_it_signin=\"tok123\"\n\
         # Run:  eval $(op signin it_signin)\n",
    );
    runner.push_success("\n");
    runner.push_success("{\"uuid\":\"abc\"}\n");

    let settings = settings(&runner, r#"{"accounts":[{"shorthand":"it_signin"}]}"#);
    let op = Op::new(settings.with_password("pw")).await.unwrap();
    op.set_secure_note("deploy", "rotate keys").await.unwrap();

    let calls = runner.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].args, vec!["signin", "it_signin"]);
    assert_eq!(calls[1].args, vec!["delete", "item", "deploy"]);
    assert_eq!(calls[2].args[0], "create");
    assert!(calls[1..]
        .iter()
        .all(|c| c.env == vec![("OP_SESSION_it_signin".to_string(), "tok123".to_string())]));

    // The token never leaks into this process's environment.
    assert!(std::env::var("OP_SESSION_it_signin").is_err());
}

#[tokio::test]
async fn test_stale_session_is_terminal() {
    std::env::set_var("OP_SESSION_it_stale", "expired");

    let runner = Arc::new(MockRunner::new());
    runner.push_failure("[ERROR] You are not currently signed in. Please run `op signin --help`\n");

    let op = Op::new(settings(&runner, r#"{"latest_signin":"it_stale"}"#))
        .await
        .unwrap();
    let err = op.get_user_pass("github").await.unwrap_err();

    assert!(err.is_session_expired());
    assert_eq!(runner.call_count(), 1, "no automatic re-sign-in");
}

#[tokio::test]
async fn test_ambiguous_config_fails_before_running_op() {
    let runner = Arc::new(MockRunner::new());
    let err = Op::new(settings(
        &runner,
        r#"{"accounts":[{"shorthand":"a"},{"shorthand":"b"},{"shorthand":"c"}]}"#,
    ))
    .await
    .unwrap_err();

    assert!(matches!(err, OpError::AmbiguousAccount(3)));
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn test_missing_op_binary() {
    let runner = Arc::new(MockRunner::new());
    runner.push_not_installed();

    let err = Op::new(settings(&runner, r#"{"latest_signin":"it_no_op"}"#))
        .await
        .unwrap_err();

    assert!(matches!(err.root(), OpError::ToolNotInstalled(_)));
}
