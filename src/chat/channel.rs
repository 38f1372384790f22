use std::path::{Component, Path};

use crate::text::truncate_chars;

/// Slack rejects longer channel names.
const MAX_CHANNEL_NAME: usize = 80;

/// Project a working directory belongs to.
///
/// Worktrees are attributed to their parent checkout: in
/// `/dev/sonar/.worktrees/feat-x` the project is `sonar`. Hidden
/// directories between the project and the worktree segment (such as
/// `.claude/worktrees/...`) are skipped.
pub fn project_name(cwd: &str) -> String {
    let parts: Vec<&str> = Path::new(cwd)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    if let Some(idx) = parts.iter().position(|p| is_worktree_segment(p)) {
        if let Some(parent) = parts[..idx].iter().rev().find(|p| !p.starts_with('.')) {
            return parent.to_string();
        }
    }

    parts
        .last()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn is_worktree_segment(segment: &str) -> bool {
    let bare = segment.trim_start_matches('.').to_ascii_lowercase();
    bare == "worktree" || bare == "worktrees"
}

/// Lowercase, runs of anything non-alphanumeric become one hyphen, no
/// hyphens at either end.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Channel for a (project, recipient) pair, e.g. `claude-sonar-u0g9qf9c6`.
pub fn channel_name(prefix: &str, cwd: &str, recipient: &str) -> String {
    let raw = format!("{prefix}-{}-{recipient}", project_name(cwd));
    let name = sanitize(&raw);
    truncate_chars(&name, MAX_CHANNEL_NAME)
        .trim_end_matches('-')
        .to_string()
}
