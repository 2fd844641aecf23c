use anyhow::{anyhow, Result};
use serde_json::Value;

const TEXT_SNIPPET_MAX_CHARS: usize = 100;
const COMMIT_SUBJECT_MAX_CHARS: usize = 50;
const MAX_COMMITS_LISTED: usize = 3;

/// Forwarding flags the renderer honors for one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub forward_watch: bool,
    pub forward_unknown_events: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            forward_watch: true,
            forward_unknown_events: false,
        }
    }
}

/// Renders one webhook event into notification text.
///
/// Returns `None` when the event produces no message: unknown event types
/// with forwarding disabled, sub-events outside the rendered set, `watch`
/// events for repositories that suppress them, and payloads the templates
/// cannot make sense of (logged at warn level).
pub fn render_event(event: &str, payload: &Value, options: &RenderOptions) -> Option<String> {
    match try_render_event(event, payload, options) {
        Ok(rendered) => rendered,
        Err(error) => {
            tracing::warn!(event, %error, "failed to render webhook event");
            None
        }
    }
}

fn try_render_event(
    event: &str,
    payload: &Value,
    options: &RenderOptions,
) -> Result<Option<String>> {
    let rendered = match event {
        "star" => Some(render_star(payload)?),
        "push" => Some(render_push(payload)?),
        "workflow_run" => render_workflow_run(payload)?,
        "issues" => Some(render_issues(payload)?),
        "pull_request" => Some(render_pull_request(payload)?),
        "release" => render_release(payload)?,
        "issue_comment" => Some(render_issue_comment(payload)?),
        "fork" => Some(render_fork(payload)?),
        "watch" => {
            if options.forward_watch {
                Some(render_watch(payload)?)
            } else {
                None
            }
        }
        _ => {
            if options.forward_unknown_events {
                Some(format!(
                    "{}\n📢 unknown event type: {event}",
                    repo_header(payload)
                ))
            } else {
                None
            }
        }
    };
    Ok(rendered)
}

fn render_star(payload: &Value) -> Result<String> {
    let action = if action_of(payload) == "created" {
        "added"
    } else {
        "removed"
    };
    let star_count = payload
        .pointer("/repository/stargazers_count")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let mut lines = vec![repo_header(payload)];
    lines.push(format!("⭐ star: {action}"));
    push_actor_line(&mut lines, "by", sender_login(payload));
    lines.push(format!("✨ stargazers: {star_count}"));
    push_link_line(&mut lines, "view repository", repo_html_url(payload));
    Ok(lines.join("\n"))
}

fn render_push(payload: &Value) -> Result<String> {
    let git_ref = required_str(payload, "/ref", "push")?;
    let branch = git_ref.rsplit('/').next().unwrap_or(git_ref);
    let compare = required_str(payload, "/compare", "push")?;
    let empty = Vec::new();
    let commits = payload
        .get("commits")
        .and_then(Value::as_array)
        .unwrap_or(&empty);

    let mut lines = vec![repo_header(payload)];
    lines.push(format!("🚀 push: branch {branch}"));
    push_actor_line(
        &mut lines,
        "pusher",
        payload.pointer("/pusher/name").and_then(Value::as_str),
    );
    lines.extend(format_commit_list(commits));
    lines.push(format!("🔗 compare: {compare}"));
    Ok(lines.join("\n"))
}

fn render_workflow_run(payload: &Value) -> Result<Option<String>> {
    if action_of(payload) != "completed" {
        return Ok(None);
    }
    let run = payload
        .get("workflow_run")
        .ok_or_else(|| anyhow!("workflow_run payload missing workflow_run object"))?;
    let conclusion = run
        .get("conclusion")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let status = if conclusion == "success" {
        "✅ success".to_string()
    } else {
        format!("❌ {conclusion}")
    };

    let mut lines = vec![repo_header(payload)];
    lines.push(format!("⚙️ workflow: {status}"));
    if let Some(name) = run.get("name").and_then(Value::as_str) {
        lines.push(format!("📛 name: {name}"));
    }
    push_link_line(&mut lines, "details", run.get("html_url").and_then(Value::as_str));
    Ok(Some(lines.join("\n")))
}

fn render_issues(payload: &Value) -> Result<String> {
    let action = action_of(payload);
    let issue = payload
        .get("issue")
        .ok_or_else(|| anyhow!("issues payload missing issue object"))?;

    let event_line = match action {
        "opened" => "📝 issue opened".to_string(),
        "closed" => "🔒 issue closed".to_string(),
        "reopened" => "🔓 issue reopened".to_string(),
        "deleted" => "🗑️ issue deleted".to_string(),
        "assigned" => "👤 issue assigned".to_string(),
        "labeled" => "🏷️ issue labeled".to_string(),
        other => format!("📌 issue {other}"),
    };

    let mut lines = vec![repo_header(payload), event_line];
    if let Some(title) = issue.get("title").and_then(Value::as_str) {
        lines.push(format!("🏷️ title: {title}"));
    }
    match action {
        "opened" => {
            if let Some(body) = issue.get("body").and_then(Value::as_str) {
                if !body.trim().is_empty() {
                    lines.push(format!("📄 {}", truncate_chars(body, TEXT_SNIPPET_MAX_CHARS)));
                }
            }
        }
        "assigned" => {
            push_actor_line(
                &mut lines,
                "assignee",
                payload.pointer("/assignee/login").and_then(Value::as_str),
            );
        }
        "labeled" => {
            if let Some(label) = payload.pointer("/label/name").and_then(Value::as_str) {
                lines.push(format!("🔖 label: {label}"));
            }
        }
        _ => {}
    }
    push_actor_line(&mut lines, "by", sender_login(payload));
    push_link_line(
        &mut lines,
        "details",
        issue
            .get("html_url")
            .and_then(Value::as_str)
            .or_else(|| repo_html_url(payload)),
    );
    Ok(lines.join("\n"))
}

fn render_pull_request(payload: &Value) -> Result<String> {
    let action = action_of(payload);
    let pr = payload
        .get("pull_request")
        .ok_or_else(|| anyhow!("pull_request payload missing pull_request object"))?;
    let merged = pr.get("merged").and_then(Value::as_bool).unwrap_or(false);

    let status_line = match action {
        "opened" => "🔄 pull request opened".to_string(),
        "closed" if merged => "✅ pull request merged".to_string(),
        "closed" => "❌ pull request closed".to_string(),
        "reopened" => "🔄 pull request reopened".to_string(),
        "review_requested" => "👥 review requested".to_string(),
        "ready_for_review" => "📢 ready for review".to_string(),
        "synchronize" => "🔄 branch updated".to_string(),
        "edited" => "✏️ pull request edited".to_string(),
        other => format!("📌 pull request {other}"),
    };

    let mut lines = vec![repo_header(payload), status_line];
    if action == "review_requested" {
        push_actor_line(
            &mut lines,
            "reviewer",
            payload
                .pointer("/requested_reviewer/login")
                .and_then(Value::as_str),
        );
    }
    if let Some(title) = pr.get("title").and_then(Value::as_str) {
        lines.push(format!("📝 title: {title}"));
    }
    push_actor_line(&mut lines, "by", sender_login(payload));
    push_link_line(&mut lines, "details", pr.get("html_url").and_then(Value::as_str));
    Ok(lines.join("\n"))
}

fn render_release(payload: &Value) -> Result<Option<String>> {
    let event_line = match action_of(payload) {
        "published" => "🎉 release published",
        "edited" => "✏️ release edited",
        "deleted" => "🗑️ release deleted",
        _ => return Ok(None),
    };
    let release = payload
        .get("release")
        .ok_or_else(|| anyhow!("release payload missing release object"))?;

    let mut lines = vec![repo_header(payload), event_line.to_string()];
    if let Some(tag) = release.get("tag_name").and_then(Value::as_str) {
        lines.push(format!("🏷️ tag: {tag}"));
    }
    push_actor_line(
        &mut lines,
        "by",
        release.pointer("/author/login").and_then(Value::as_str),
    );
    push_link_line(
        &mut lines,
        "details",
        release.get("html_url").and_then(Value::as_str),
    );
    Ok(Some(lines.join("\n")))
}

fn render_issue_comment(payload: &Value) -> Result<String> {
    let comment = payload
        .get("comment")
        .ok_or_else(|| anyhow!("issue_comment payload missing comment object"))?;
    let issue_number = payload
        .pointer("/issue/number")
        .and_then(Value::as_u64)
        .ok_or_else(|| anyhow!("issue_comment payload missing issue number"))?;
    let body = comment.get("body").and_then(Value::as_str).unwrap_or("");

    let mut lines = vec![repo_header(payload)];
    lines.push(format!("💬 new comment: issue #{issue_number}"));
    if !body.trim().is_empty() {
        lines.push(format!("📝 {}", truncate_chars(body, TEXT_SNIPPET_MAX_CHARS)));
    }
    push_actor_line(
        &mut lines,
        "by",
        comment.pointer("/user/login").and_then(Value::as_str),
    );
    push_link_line(
        &mut lines,
        "details",
        comment.get("html_url").and_then(Value::as_str),
    );
    Ok(lines.join("\n"))
}

fn render_fork(payload: &Value) -> Result<String> {
    let forkee = payload
        .get("forkee")
        .ok_or_else(|| anyhow!("fork payload missing forkee object"))?;
    let fork_name = forkee
        .get("full_name")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("fork payload missing forkee full_name"))?;

    let mut lines = vec![repo_header(payload)];
    lines.push(format!("⑂ fork: {fork_name}"));
    push_actor_line(&mut lines, "by", sender_login(payload));
    push_link_line(
        &mut lines,
        "view fork",
        forkee.get("html_url").and_then(Value::as_str),
    );
    Ok(lines.join("\n"))
}

fn render_watch(payload: &Value) -> Result<String> {
    let action = if action_of(payload) == "started" {
        "started"
    } else {
        "stopped"
    };

    let mut lines = vec![repo_header(payload)];
    lines.push(format!("👀 watch: {action}"));
    push_actor_line(&mut lines, "by", sender_login(payload));
    push_link_line(&mut lines, "view repository", repo_html_url(payload));
    Ok(lines.join("\n"))
}

fn format_commit_list(commits: &[Value]) -> Vec<String> {
    if commits.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!("📜 commits ({}):", commits.len())];
    for commit in commits.iter().take(MAX_COMMITS_LISTED) {
        let id = commit.get("id").and_then(Value::as_str).unwrap_or("unknown");
        let short_id: String = id.chars().take(7).collect();
        let subject = commit
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("");
        lines.push(format!(
            "├ {short_id}: {}",
            truncate_chars(subject, COMMIT_SUBJECT_MAX_CHARS)
        ));
    }
    if commits.len() > MAX_COMMITS_LISTED {
        lines.push(format!(
            "└ … {} more commits",
            commits.len() - MAX_COMMITS_LISTED
        ));
    }
    lines
}

fn repo_header(payload: &Value) -> String {
    let full_name = payload
        .pointer("/repository/full_name")
        .and_then(Value::as_str)
        .unwrap_or("unknown repository");
    format!("📦 repo: {full_name}")
}

fn repo_html_url(payload: &Value) -> Option<&str> {
    payload
        .pointer("/repository/html_url")
        .and_then(Value::as_str)
}

fn sender_login(payload: &Value) -> Option<&str> {
    payload.pointer("/sender/login").and_then(Value::as_str)
}

fn action_of(payload: &Value) -> &str {
    payload.get("action").and_then(Value::as_str).unwrap_or("")
}

fn required_str<'a>(payload: &'a Value, pointer: &str, event: &str) -> Result<&'a str> {
    payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("{event} payload missing {pointer}"))
}

fn push_actor_line(lines: &mut Vec<String>, label: &str, login: Option<&str>) {
    if let Some(login) = login.map(str::trim).filter(|login| !login.is_empty()) {
        lines.push(format!("👤 {label}: {login}"));
    }
}

fn push_link_line(lines: &mut Vec<String>, label: &str, url: Option<&str>) {
    if let Some(url) = url.map(str::trim).filter(|url| !url.is_empty()) {
        lines.push(format!("🔗 {label}: {url}"));
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}…")
}
