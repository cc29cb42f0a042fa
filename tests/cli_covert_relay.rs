use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "covert-relay-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn relay_cmd(dir: &PathBuf) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_covert_relay"));
    cmd.env_remove("NATS_SURVEYOR_SERVERS")
        .env_remove("MEAN_DELAY")
        .env_remove("COVERT_ENABLED")
        .env("RUST_LOG", "warn")
        .env("RESULTS_PATH", dir.join("results.json"))
        .env("COVERT_LOG_PATH", dir.join("covert_log.json"));
    cmd
}

#[test]
fn invalid_mean_delay_is_rejected() {
    let dir = unique_temp_dir("cli-bad-delay");
    let output = relay_cmd(&dir)
        .args(["--mean-delay", "0"])
        .output()
        .expect("run covert_relay");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("configuration error"), "stderr={stderr}");
    assert!(!dir.join("results.json").exists());
}

#[test]
fn unreachable_broker_fails_fast() {
    let dir = unique_temp_dir("cli-no-broker");
    let output = relay_cmd(&dir)
        .env("NATS_SURVEYOR_SERVERS", "nats://127.0.0.1:1")
        .env("COVERT_ENABLED", "true")
        .output()
        .expect("run covert_relay");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("connection error"), "stderr={stderr}");
    assert!(!dir.join("results.json").exists());
}

#[test]
fn help_lists_environment_variables() {
    let dir = unique_temp_dir("cli-help");
    let output = relay_cmd(&dir).arg("--help").output().expect("run covert_relay");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for var in ["NATS_SURVEYOR_SERVERS", "MEAN_DELAY", "COVERT_ENABLED"] {
        assert!(stdout.contains(var), "missing {var} in help");
    }
}
