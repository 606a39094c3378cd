//! Final command assembly and dry-run rendering

use crate::command::intent::IntentKind;
use crate::tool::profile::ToolProfile;
use std::path::{Path, PathBuf};

/// A fully assembled invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCommand {
    executable: PathBuf,
    tokens: Vec<String>,
    rendered_preview: String,
}

impl GeneratedCommand {
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Shell-like one-line rendering of the command
    pub fn preview(&self) -> &str {
        &self.rendered_preview
    }
}

/// Combine an executable with translated tokens, preserving their order
pub fn assemble(executable: &Path, tokens: Vec<String>) -> GeneratedCommand {
    let mut preview = quote(&executable.display().to_string());
    for token in &tokens {
        preview.push(' ');
        preview.push_str(&quote(token));
    }

    GeneratedCommand {
        executable: executable.to_path_buf(),
        tokens,
        rendered_preview: preview,
    }
}

/// Quote a token containing whitespace with one pair of double quotes.
/// Tokens that already carry balanced quotes of their own are left alone; an
/// empty token still shows up as `""`.
fn quote(token: &str) -> String {
    if token.is_empty() {
        return "\"\"".to_string();
    }
    if !token.chars().any(char::is_whitespace) {
        return token.to_string();
    }
    if token.contains('"') && has_balanced_quotes(token) {
        return token.to_string();
    }
    format!("\"{}\"", token.replace('"', "\\\""))
}

/// Whether the unescaped double quotes in `token` pair up
fn has_balanced_quotes(token: &str) -> bool {
    let mut escaped = false;
    let mut quotes = 0;
    for c in token.chars() {
        match c {
            '\\' if !escaped => {
                escaped = true;
                continue;
            }
            '"' if !escaped => quotes += 1,
            _ => {}
        }
        escaped = false;
    }
    quotes % 2 == 0
}

/// Headline describing what a dry run would have done
pub fn dry_run_header(kind: IntentKind, once: bool) -> &'static str {
    match kind {
        IntentKind::Create => "Creating an app",
        IntentKind::Build => "Build current project",
        IntentKind::Dev => "Run current project in dev mode",
        IntentKind::Test if once => "Run current project in test mode",
        IntentKind::Test => "Run current project in continuous test mode",
    }
}

/// Text printed in place of running the command
pub fn render_dry_run(
    kind: IntentKind,
    once: bool,
    profile: &ToolProfile,
    command: &GeneratedCommand,
) -> String {
    format!(
        "{}\n  {:<8}  {}\n",
        dry_run_header(kind, once),
        profile.tool.id(),
        command.preview()
    )
}
