use super::*;
use std::io::Write;

fn transcript(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

const USER_NATIVE: &str =
    r#"{"type":"user","uuid":"u1","message":{"role":"user","content":"please fix the build"}}"#;
const ASSISTANT_NATIVE: &str = r#"{"type":"assistant","uuid":"a1","message":{"role":"assistant","content":[{"type":"thinking","thinking":"hmm"},{"type":"text","text":"Fixed the build. It was a typo."},{"type":"text","text":"Second block"}]}}"#;

#[test]
fn missing_file_is_no_activity() {
    let dir = tempfile::tempdir().unwrap();
    let turn = extract_last_turn(&dir.path().join("absent.jsonl"), Role::Assistant);
    assert_eq!(turn, LastTurn::NoActivity);
    assert_eq!(turn.headline(), NO_ACTIVITY);
}

#[test]
fn native_shape_uses_first_text_block_only() {
    let file = transcript(&[USER_NATIVE, ASSISTANT_NATIVE]);
    let turn = extract_last_turn(file.path(), Role::Assistant);
    assert_eq!(turn.text(), Some("Fixed the build. It was a typo."));
}

#[test]
fn flat_shape_with_string_content() {
    let file = transcript(&[
        r#"{"role":"assistant","content":"  Refactored the parser\nmore detail  "}"#,
        r#"{"role":"user","content":"thanks"}"#,
    ]);
    assert_eq!(
        extract_last_turn(file.path(), Role::Assistant).text(),
        Some("Refactored the parser\nmore detail")
    );
    assert_eq!(extract_last_turn(file.path(), Role::User).text(), Some("thanks"));
}

#[test]
fn most_recent_matching_turn_wins() {
    let file = transcript(&[
        r#"{"type":"assistant","message":{"role":"assistant","content":"old"}}"#,
        USER_NATIVE,
        r#"{"type":"assistant","message":{"role":"assistant","content":"new"}}"#,
    ]);
    assert_eq!(extract_last_turn(file.path(), Role::Assistant).text(), Some("new"));
}

#[test]
fn turns_without_text_are_passed_over() {
    let file = transcript(&[
        r#"{"type":"assistant","message":{"role":"assistant","content":"earlier words"}}"#,
        r#"{"type":"assistant","message":{"role":"assistant","content":[{"type":"tool_use","id":"t","name":"Bash","input":{}}]}}"#,
        r#"{"type":"assistant","message":{"role":"assistant","content":[{"type":"text","text":"   "}]}}"#,
    ]);
    assert_eq!(
        extract_last_turn(file.path(), Role::Assistant).text(),
        Some("earlier words")
    );
}

#[test]
fn malformed_lines_are_skipped() {
    let mut file = transcript(&[r#"{"type":"assistant","message":{"role":"assistant","content":"good"}}"#]);
    file.write_all(b"{not json\n").unwrap();
    file.write_all(&[0xff, 0xfe, b'\n']).unwrap();
    file.write_all(b"\n\n").unwrap();
    assert_eq!(extract_last_turn(file.path(), Role::Assistant).text(), Some("good"));
}

#[test]
fn only_last_twenty_lines_are_scanned() {
    let mut lines = vec![r#"{"role":"assistant","content":"too old"}"#];
    lines.extend(std::iter::repeat_n(r#"{"role":"user","content":"filler"}"#, SCAN_LINES));
    let file = transcript(&lines);
    assert_eq!(extract_last_turn(file.path(), Role::Assistant), LastTurn::NoActivity);
}

#[test]
fn blank_and_binary_lines_count_towards_the_window() {
    let mut file = transcript(&[r#"{"role":"assistant","content":"too old"}"#]);
    for i in 0..SCAN_LINES {
        if i % 2 == 0 {
            writeln!(file).unwrap();
        } else {
            file.write_all(b"\xff\xfe\n").unwrap();
        }
    }
    assert_eq!(extract_last_turn(file.path(), Role::Assistant), LastTurn::NoActivity);

    let file = transcript(&[r#"{"role":"assistant","content":"recent"}"#, "", "", "not json"]);
    assert_eq!(extract_last_turn(file.path(), Role::Assistant).text(), Some("recent"));
}

#[test]
fn no_matching_role_is_no_activity() {
    let file = transcript(&[USER_NATIVE]);
    assert_eq!(extract_last_turn(file.path(), Role::Assistant), LastTurn::NoActivity);
}

#[test]
fn reading_twice_is_stable() {
    let file = transcript(&[USER_NATIVE, ASSISTANT_NATIVE]);
    let first = extract_last_turn(file.path(), Role::Assistant);
    let second = extract_last_turn(file.path(), Role::Assistant);
    assert_eq!(first, second);
}

#[test]
fn directory_is_unreadable_with_truncated_error() {
    let dir = tempfile::tempdir().unwrap();
    let turn = extract_last_turn(dir.path(), Role::Assistant);
    assert!(matches!(turn, LastTurn::Unreadable(_)), "got {turn:?}");
    let line = turn.headline();
    assert!(line.starts_with("Claude finished (error reading transcript: "), "got {line}");
    assert!(line.len() <= "Claude finished (error reading transcript: )".len() + 50 * 4);
}

#[test]
fn headline_takes_first_sentence_of_first_line() {
    assert_eq!(headline("Fixed the build. It was a typo."), "Fixed the build");
    assert_eq!(headline("Updated src/main.rs\nDetails follow"), "Updated src/main.rs");
    assert_eq!(headline("Done."), "Done");
    let long = "x".repeat(200);
    let h = headline(&long);
    assert_eq!(h.len(), 153);
    assert!(h.ends_with("..."));
}

#[test]
fn expand_home_leaves_absolute_paths() {
    assert_eq!(expand_home("/tmp/t.jsonl"), PathBuf::from("/tmp/t.jsonl"));
}
