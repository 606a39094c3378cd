//! Project creation plans
//!
//! Creating a project is delegated to an external generator. This module
//! resolves the `create` options into a `CreatePlan`, renders the dry-run
//! summary and hands the plan to a `ProjectGenerator`.

use crate::command::assemble::{assemble, dry_run_header};
use crate::command::intent::{BuildIntent, Flag, IntentKind};
use crate::error::{BuildError, Result};
use crate::runtime::invoker::Invoker;
use crate::tool::profile::BuildTool;
use std::future::Future;
use std::path::PathBuf;
use tracing::info;

pub const DEFAULT_GROUP_ID: &str = "org.acme";
pub const DEFAULT_ARTIFACT_ID: &str = "code-with-quarkus";
pub const DEFAULT_VERSION: &str = "1.0.0-SNAPSHOT";

/// Maven-style project coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl Default for Coordinates {
    fn default() -> Self {
        Self {
            group_id: DEFAULT_GROUP_ID.to_string(),
            artifact_id: DEFAULT_ARTIFACT_ID.to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

impl Coordinates {
    /// Parse `artifact`, `group:artifact` or `group:artifact:version`
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: &str| BuildError::InvalidFlagValue {
            flag: "coordinates".to_string(),
            value: text.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = text.split(':').collect();
        if parts.iter().any(|part| part.trim().is_empty()) {
            return Err(invalid("empty coordinate segment"));
        }

        let defaults = Self::default();
        match parts.as_slice() {
            [artifact] => Ok(Self {
                artifact_id: artifact.to_string(),
                ..defaults
            }),
            [group, artifact] => Ok(Self {
                group_id: group.to_string(),
                artifact_id: artifact.to_string(),
                ..defaults
            }),
            [group, artifact, version] => Ok(Self {
                group_id: group.to_string(),
                artifact_id: artifact.to_string(),
                version: version.to_string(),
            }),
            _ => Err(invalid("expected [group:]artifact[:version]")),
        }
    }
}

/// Everything needed to generate a new project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePlan {
    pub tool: BuildTool,
    pub coordinates: Coordinates,
    pub package_name: String,
    pub omit_wrapper: bool,
    pub output_directory: PathBuf,
    pub app_config: Vec<(String, String)>,
}

impl CreatePlan {
    pub fn from_intent(intent: &BuildIntent, tool: BuildTool) -> Result<Self> {
        if intent.kind != IntentKind::Create {
            return Err(BuildError::NotTranslatable { kind: intent.kind });
        }

        let coordinates = match intent.passthrough.as_slice() {
            [] => Coordinates::default(),
            [text] => Coordinates::parse(text)?,
            extra => {
                return Err(BuildError::InvalidFlagValue {
                    flag: "coordinates".to_string(),
                    value: extra.join(" "),
                    reason: "expected a single [group:]artifact[:version]".to_string(),
                })
            }
        };

        let package_name = intent
            .text_flag(Flag::PackageName)
            .map(str::to_string)
            .unwrap_or_else(|| default_package(&coordinates.group_id));

        let app_config = match intent.text_flag(Flag::AppConfig) {
            Some(text) => parse_app_config(text)?,
            None => Vec::new(),
        };

        Ok(Self {
            tool,
            package_name,
            omit_wrapper: !intent.bool_flag(Flag::Wrapper).unwrap_or(true),
            output_directory: intent
                .text_flag(Flag::OutputDirectory)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            app_config,
            coordinates,
        })
    }

    /// Directory the project ends up in
    pub fn project_dir(&self) -> PathBuf {
        self.output_directory.join(&self.coordinates.artifact_id)
    }

    /// Dry-run summary of the plan
    pub fn render(&self) -> String {
        let mut rows = vec![
            ("Build tool", self.tool.id().to_string()),
            ("Omit build tool wrapper", self.omit_wrapper.to_string()),
            ("Package Name", self.package_name.clone()),
            ("Project ArtifactId", self.coordinates.artifact_id.clone()),
            ("Project GroupId", self.coordinates.group_id.clone()),
            ("Project Version", self.coordinates.version.clone()),
            (
                "Output directory",
                self.output_directory.display().to_string(),
            ),
        ];
        if !self.app_config.is_empty() {
            rows.push(("Application config", join_config(&self.app_config, ", ")));
        }

        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let mut out = format!("{}\n", dry_run_header(IntentKind::Create, false));
        for (label, value) in rows {
            out.push_str(&format!("  {:<width$}  {}\n", label, value, width = width));
        }
        out
    }

    /// The plan as `key=value` arguments for an external generator
    pub fn to_arguments(&self) -> Vec<String> {
        let mut args = vec![
            format!("tool={}", self.tool.display_name().to_lowercase()),
            format!("group-id={}", self.coordinates.group_id),
            format!("artifact-id={}", self.coordinates.artifact_id),
            format!("version={}", self.coordinates.version),
            format!("package-name={}", self.package_name),
            format!("wrapper={}", !self.omit_wrapper),
            format!("output-directory={}", self.output_directory.display()),
        ];
        if !self.app_config.is_empty() {
            args.push(format!("app-config={}", join_config(&self.app_config, ",")));
        }
        args
    }
}

/// Turns a plan into files on disk
pub trait ProjectGenerator: Send + Sync {
    fn generate(&self, plan: &CreatePlan) -> impl Future<Output = Result<()>> + Send;
}

/// Generator that runs an external program through an `Invoker`
pub struct CommandGenerator<I: Invoker> {
    invoker: I,
    program: PathBuf,
    args: Vec<String>,
}

impl<I: Invoker> CommandGenerator<I> {
    pub fn new(invoker: I, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            invoker,
            program: program.into(),
            args,
        }
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }
}

impl<I: Invoker> ProjectGenerator for CommandGenerator<I> {
    async fn generate(&self, plan: &CreatePlan) -> Result<()> {
        tokio::fs::create_dir_all(&plan.output_directory)
            .await
            .map_err(|e| {
                BuildError::Invocation(format!(
                    "failed to create {}: {}",
                    plan.output_directory.display(),
                    e
                ))
            })?;

        let mut tokens = self.args.clone();
        tokens.extend(plan.to_arguments());
        let command = assemble(&self.program, tokens);
        info!(command = %command.preview(), "generating project");

        let output = self
            .invoker
            .invoke(&command, &plan.output_directory)
            .await?;
        if !output.success() {
            return Err(BuildError::Invocation(format!(
                "project generator exited with code {}",
                output.exit_code
            )));
        }
        Ok(())
    }
}

/// Package derived from a group id: lower case, invalid characters dropped
fn default_package(group_id: &str) -> String {
    group_id
        .split('.')
        .map(|segment| {
            segment
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

fn parse_app_config(text: &str) -> Result<Vec<(String, String)>> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(BuildError::InvalidFlagValue {
                flag: Flag::AppConfig.name().to_string(),
                value: entry.to_string(),
                reason: "expected key=value".to_string(),
            }),
        })
        .collect()
}

fn join_config(pairs: &[(String, String)], separator: &str) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(separator)
}
