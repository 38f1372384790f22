use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A scratch directory holding the notification and debug logs for one run.
pub struct Sandbox {
    pub dir: tempfile::TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn log_file(&self) -> PathBuf {
        self.dir.path().join("notifications.jsonl")
    }

    pub fn debug_log(&self) -> PathBuf {
        self.dir.path().join("debug.log")
    }

    /// Parsed lines of the notification log.
    pub fn records(&self) -> Vec<serde_json::Value> {
        std::fs::read_to_string(self.log_file())
            .unwrap_or_default()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    /// Run the binary with `args` and `stdin`, no credentials and no
    /// config file. Returns (exit code, stdout, stderr).
    pub fn run(&self, args: &[&str], stdin: &str) -> (i32, String, String) {
        let mut child = Command::new(env!("CARGO_BIN_EXE_claude-notifier"))
            .args(args)
            .env_remove("ANTHROPIC_API_KEY")
            .env_remove("SLACK_BOT_TOKEN")
            .env_remove("SLACK_USER_ID")
            .env_remove("CLAUDE_NOTIFIER_LOG")
            .env("CLAUDE_NOTIFIER_CONFIG", missing_config(self.dir.path()))
            .env("CLAUDE_NOTIFIER_LOG_FILE", self.log_file())
            .env("CLAUDE_NOTIFIER_DEBUG_LOG", self.debug_log())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn binary");

        child
            .stdin
            .as_mut()
            .unwrap()
            .write_all(stdin.as_bytes())
            .unwrap();

        let output = child.wait_with_output().unwrap();
        (
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        )
    }

    pub fn hook(&self, stdin: &str) -> (i32, String, String) {
        self.run(&[], stdin)
    }
}

fn missing_config(dir: &Path) -> PathBuf {
    dir.join("no-such-config.toml")
}
