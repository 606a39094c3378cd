//! Per-project settings
//!
//! Settings come from an optional `.buildrun.yaml` in the project root and are
//! then adjusted from the environment. Local repository settings are never
//! interpreted here; they become override tokens appended to every command.

use crate::error::{BuildError, Result};
use crate::tool::profile::BuildTool;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SETTINGS_FILE: &str = ".buildrun.yaml";

/// Forces the build tool, e.g. `gradle`
pub const TOOL_ENV: &str = "BUILDRUN_TOOL";
/// Local Maven repository forwarded as `-Dmaven.repo.local`
pub const REPO_LOCAL_ENV: &str = "BUILDRUN_MAVEN_REPO_LOCAL";
/// Maven settings file forwarded as `-Dmaven.settings`
pub const MAVEN_SETTINGS_ENV: &str = "BUILDRUN_MAVEN_SETTINGS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Build tool, taking precedence over detection from project files
    pub tool: Option<BuildTool>,
    /// Tokens appended after all semantic tokens
    pub overrides: Vec<String>,
    /// External project generator used by `create`
    pub generator: Option<GeneratorSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSettings {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Settings {
    /// Load settings for `project_root` from its settings file and the process environment
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(SETTINGS_FILE);
        let mut settings = if path.is_file() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let settings = Self::parse(&content).map_err(|message| BuildError::Settings {
            path: path.to_path_buf(),
            message,
        })?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// Apply environment variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tool) = lookup(TOOL_ENV).as_deref().and_then(BuildTool::parse) {
            self.tool = Some(tool);
        }
        if let Some(repo) = lookup(REPO_LOCAL_ENV).filter(|v| !v.is_empty()) {
            self.overrides.push(format!("-Dmaven.repo.local={}", repo));
        }
        if let Some(file) = lookup(MAVEN_SETTINGS_ENV).filter(|v| !v.is_empty()) {
            self.overrides.push(format!("-Dmaven.settings={}", file));
        }
    }

    /// Pick the build tool: an explicit choice, then settings, then the project files
    pub fn resolve_tool(
        &self,
        explicit: Option<BuildTool>,
        project_root: &Path,
    ) -> Option<BuildTool> {
        explicit
            .or(self.tool)
            .or_else(|| BuildTool::detect(project_root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_settings_file() {
        let settings = Settings::parse(
            "tool: gradle\n\
             overrides:\n  - --gradle-user-home=/cache\n\
             generator:\n  program: /usr/local/bin/gen\n  args: [\"--quiet\"]\n",
        )
        .unwrap();
        assert_eq!(settings.tool, Some(BuildTool::Gradle));
        assert_eq!(settings.overrides, vec!["--gradle-user-home=/cache"]);
        let generator = settings.generator.unwrap();
        assert_eq!(generator.program, PathBuf::from("/usr/local/bin/gen"));
        assert_eq!(generator.args, vec!["--quiet"]);
    }

    #[test]
    fn test_empty_settings_file() {
        assert_eq!(Settings::parse("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(Settings::parse("tools: maven\n").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (TOOL_ENV, "maven"),
            (REPO_LOCAL_ENV, "/tmp/repo"),
            (MAVEN_SETTINGS_ENV, "/tmp/settings.xml"),
        ]);
        let mut settings = Settings {
            overrides: vec!["-Dfrom.file=1".to_string()],
            ..Settings::default()
        };
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.tool, Some(BuildTool::Maven));
        assert_eq!(
            settings.overrides,
            vec![
                "-Dfrom.file=1",
                "-Dmaven.repo.local=/tmp/repo",
                "-Dmaven.settings=/tmp/settings.xml"
            ]
        );
    }

    #[test]
    fn test_load_reports_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "tool: [").unwrap();

        let err = Settings::load(dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::Settings { .. }));
    }

    #[test]
    fn test_resolve_tool_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let detected = Settings::default();
        assert_eq!(detected.resolve_tool(None, dir.path()), None);

        std::fs::write(dir.path().join("build.gradle"), "").unwrap();
        assert_eq!(detected.resolve_tool(None, dir.path()), Some(BuildTool::Gradle));

        let configured = Settings {
            tool: Some(BuildTool::Maven),
            ..Settings::default()
        };
        assert_eq!(configured.resolve_tool(None, dir.path()), Some(BuildTool::Maven));
        assert_eq!(
            configured.resolve_tool(Some(BuildTool::Gradle), dir.path()),
            Some(BuildTool::Gradle)
        );
    }
}
