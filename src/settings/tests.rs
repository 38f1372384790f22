use super::*;
use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("nope.toml")).unwrap();
    assert_eq!(settings.log_file, PathBuf::from("/tmp/claude-notifications.jsonl"));
    assert_eq!(settings.chat.mode, ChatMode::Channel);
    assert_eq!(settings.condenser.timeout_secs, 3);
    assert!(!dir.path().join("nope.toml").exists(), "load must not create the file");
}

#[test]
fn partial_file_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
log_file = "/var/tmp/notes.jsonl"

[chat]
mode = "direct"
timeout_secs = 9
"#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.log_file, PathBuf::from("/var/tmp/notes.jsonl"));
    assert_eq!(settings.chat.mode, ChatMode::Direct);
    assert_eq!(settings.chat.timeout_secs, 9);
    assert_eq!(settings.chat.base_url, "https://slack.com/api");
    assert_eq!(settings.condenser.model, "claude-3-5-haiku-20241022");
    assert_eq!(settings.base_dir, dir.path());
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "log_file = [").unwrap();
    let err = Settings::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("parsing"), "got: {err:#}");
}

#[test]
fn file_template_resolves_relative_to_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[chat.message_template]\nfile = \"msg.tmpl\"\n").unwrap();
    fs::write(dir.path().join("msg.tmpl"), "{{ text }}!").unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(
        settings.chat.message_template,
        MessageTemplate::File(PathBuf::from("msg.tmpl"))
    );
    let source = settings.chat.message_template.source(&settings.base_dir).unwrap();
    assert_eq!(source, "{{ text }}!");
}

#[test]
fn env_overrides_paths_and_reads_credentials() {
    let settings = Settings::default().with_env(env(&[
        (LOG_FILE_ENV, "/x/log.jsonl"),
        (DEBUG_LOG_ENV, "/x/debug.log"),
        (ANTHROPIC_KEY_ENV, "sk-ant-123"),
        (SLACK_TOKEN_ENV, "xoxb-1"),
        (SLACK_USER_ENV, "U123"),
    ]));
    assert_eq!(settings.log_file, PathBuf::from("/x/log.jsonl"));
    assert_eq!(settings.debug_log_file, PathBuf::from("/x/debug.log"));
    assert_eq!(settings.credentials.anthropic_api_key.as_deref(), Some("sk-ant-123"));
    assert_eq!(settings.recipient(), Some("U123"));
}

#[test]
fn empty_credentials_count_as_absent() {
    let creds = Credentials::from_lookup(env(&[
        (ANTHROPIC_KEY_ENV, ""),
        (SLACK_TOKEN_ENV, "   "),
    ]));
    assert!(creds.anthropic_api_key.is_none());
    assert!(creds.slack_bot_token.is_none());
    assert!(creds.slack_user_id.is_none());
}

#[test]
fn debug_output_hides_secrets() {
    let creds = Credentials::from_lookup(env(&[
        (ANTHROPIC_KEY_ENV, "sk-ant-secret"),
        (SLACK_TOKEN_ENV, "xoxb-secret"),
    ]));
    let shown = format!("{creds:?}");
    assert!(!shown.contains("secret"), "leaked: {shown}");
    assert!(shown.contains("set"));
}

#[test]
fn locate_prefers_env_path() {
    let path = Settings::locate(env(&[(CONFIG_ENV, "/etc/notifier.toml")]));
    assert_eq!(path, Some(PathBuf::from("/etc/notifier.toml")));
}
