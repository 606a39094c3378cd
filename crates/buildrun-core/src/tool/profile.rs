//! Static descriptions of the supported build tool families

use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Supported build tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTool {
    Maven,
    Gradle,
}

impl BuildTool {
    pub fn display_name(&self) -> &'static str {
        match self {
            BuildTool::Maven => "Maven",
            BuildTool::Gradle => "Gradle",
        }
    }

    /// Upper-case identifier shown in dry-run output
    pub fn id(&self) -> &'static str {
        match self {
            BuildTool::Maven => "MAVEN",
            BuildTool::Gradle => "GRADLE",
        }
    }

    pub fn profile(&self) -> &'static ToolProfile {
        match self {
            BuildTool::Maven => &ToolProfile::MAVEN,
            BuildTool::Gradle => &ToolProfile::GRADLE,
        }
    }

    /// Detect the build tool of an existing project from its build files
    pub fn detect(project_root: &Path) -> Option<BuildTool> {
        if project_root.join("pom.xml").is_file() {
            return Some(BuildTool::Maven);
        }
        if project_root.join("build.gradle").is_file()
            || project_root.join("build.gradle.kts").is_file()
        {
            return Some(BuildTool::Gradle);
        }
        None
    }

    pub fn parse(name: &str) -> Option<BuildTool> {
        match name.trim().to_ascii_lowercase().as_str() {
            "maven" | "mvn" => Some(BuildTool::Maven),
            "gradle" => Some(BuildTool::Gradle),
            _ => None,
        }
    }
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Operating system families with distinct wrapper script names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Windows,
    Other,
}

impl Os {
    pub fn current() -> Self {
        if cfg!(windows) {
            Os::Windows
        } else {
            Os::Other
        }
    }
}

/// Lifecycle steps a build tool is asked to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Clean,
    Build,
    Dev,
    ContinuousTest,
    Test,
}

/// Invocation conventions of one build tool family
#[derive(Debug, PartialEq, Eq)]
pub struct ToolProfile {
    pub tool: BuildTool,
    /// Wrapper candidates on Windows, in lookup order
    pub windows_wrappers: &'static [&'static str],
    /// Wrapper candidates everywhere else, in lookup order
    pub other_wrappers: &'static [&'static str],
    /// Tool binary looked up on `PATH` when a project has no wrapper
    pub executable: &'static str,
    pub property_prefix: &'static str,
    pub supports_daemon: bool,
}

impl ToolProfile {
    pub const MAVEN: ToolProfile = ToolProfile {
        tool: BuildTool::Maven,
        windows_wrappers: &["mvnw.cmd", "mvnw.bat"],
        other_wrappers: &["mvnw"],
        executable: "mvn",
        property_prefix: "-D",
        supports_daemon: false,
    };

    pub const GRADLE: ToolProfile = ToolProfile {
        tool: BuildTool::Gradle,
        windows_wrappers: &["gradlew.cmd", "gradlew.bat"],
        other_wrappers: &["gradlew"],
        executable: "gradle",
        property_prefix: "-D",
        supports_daemon: true,
    };

    pub fn wrapper_names(&self, os: Os) -> &'static [&'static str] {
        match os {
            Os::Windows => self.windows_wrappers,
            Os::Other => self.other_wrappers,
        }
    }

    /// Render a system property assignment, e.g. `-Dkey=value`
    pub fn property(&self, key: &str, value: &str) -> String {
        format!("{}{}={}", self.property_prefix, key, value)
    }

    /// Render a valueless system property, e.g. `-Dnative`
    pub fn flag_property(&self, key: &str) -> String {
        format!("{}{}", self.property_prefix, key)
    }

    pub fn lifecycle(&self, step: Lifecycle) -> &'static str {
        match (self.tool, step) {
            (_, Lifecycle::Clean) => "clean",
            (_, Lifecycle::Test) => "test",
            (BuildTool::Maven, Lifecycle::Build) => "install",
            (BuildTool::Maven, Lifecycle::Dev) => "quarkus:dev",
            (BuildTool::Maven, Lifecycle::ContinuousTest) => "quarkus:test",
            (BuildTool::Gradle, Lifecycle::Build) => "build",
            (BuildTool::Gradle, Lifecycle::Dev) => "quarkusDev",
            (BuildTool::Gradle, Lifecycle::ContinuousTest) => "quarkusTest",
        }
    }

    /// Print full error traces
    pub fn show_errors(&self) -> &'static str {
        match self.tool {
            BuildTool::Maven => "-e",
            BuildTool::Gradle => "--full-stacktrace",
        }
    }

    /// Non-interactive output without progress rendering
    pub fn batch_mode(&self) -> &'static str {
        match self.tool {
            BuildTool::Maven => "-B",
            BuildTool::Gradle => "--console=plain",
        }
    }

    /// Resolve dependencies from the local cache only
    pub fn offline(&self) -> &'static str {
        "--offline"
    }

    /// Compile and package without running tests
    pub fn skip_tests(&self) -> Vec<String> {
        match self.tool {
            BuildTool::Maven => vec![
                self.flag_property("skipTests"),
                self.property("maven.test.skip", "true"),
            ],
            BuildTool::Gradle => vec!["-x".to_string(), "test".to_string()],
        }
    }

    /// Build a native executable
    pub fn native(&self) -> String {
        match self.tool {
            BuildTool::Maven => self.flag_property("native"),
            BuildTool::Gradle => self.property("quarkus.native.enabled", "true"),
        }
    }

    /// Select tests in a single (non-continuous) test run
    pub fn run_once_filter(&self, pattern: &str) -> Vec<String> {
        match self.tool {
            BuildTool::Maven => vec![self.property("test", pattern)],
            BuildTool::Gradle => vec!["--tests".to_string(), pattern.to_string()],
        }
    }

    /// Select tests in continuous test mode
    pub fn continuous_filter(&self, pattern: &str) -> String {
        self.property("quarkus.test.include-pattern", pattern)
    }

    /// Start the build daemon for the project
    pub fn daemon_start(&self) -> &'static str {
        "--daemon"
    }

    /// Stop the build daemon for the project
    pub fn daemon_stop(&self) -> &'static str {
        "--stop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_names_per_os() {
        assert_eq!(ToolProfile::MAVEN.wrapper_names(Os::Other), &["mvnw"]);
        assert_eq!(
            ToolProfile::GRADLE.wrapper_names(Os::Windows),
            &["gradlew.cmd", "gradlew.bat"]
        );
    }

    #[test]
    fn test_only_gradle_supports_daemon() {
        assert!(ToolProfile::GRADLE.supports_daemon);
        assert!(!ToolProfile::MAVEN.supports_daemon);
    }

    #[test]
    fn test_lifecycle_spellings() {
        assert_eq!(ToolProfile::MAVEN.lifecycle(Lifecycle::Dev), "quarkus:dev");
        assert_eq!(ToolProfile::GRADLE.lifecycle(Lifecycle::Dev), "quarkusDev");
        assert_eq!(ToolProfile::GRADLE.lifecycle(Lifecycle::Build), "build");
        assert_eq!(ToolProfile::MAVEN.lifecycle(Lifecycle::Build), "install");
        assert_eq!(ToolProfile::MAVEN.lifecycle(Lifecycle::Clean), "clean");
    }

    #[test]
    fn test_property_rendering() {
        assert_eq!(
            ToolProfile::GRADLE.property("debugPort", "8008"),
            "-DdebugPort=8008"
        );
        assert_eq!(ToolProfile::MAVEN.native(), "-Dnative");
        assert_eq!(
            ToolProfile::GRADLE.native(),
            "-Dquarkus.native.enabled=true"
        );
    }

    #[test]
    fn test_option_tokens_per_tool() {
        assert_eq!(ToolProfile::MAVEN.show_errors(), "-e");
        assert_eq!(ToolProfile::GRADLE.show_errors(), "--full-stacktrace");
        assert_eq!(ToolProfile::MAVEN.batch_mode(), "-B");
        assert_eq!(ToolProfile::GRADLE.batch_mode(), "--console=plain");
        assert_eq!(ToolProfile::GRADLE.offline(), "--offline");
        assert_eq!(
            ToolProfile::MAVEN.skip_tests(),
            vec!["-DskipTests", "-Dmaven.test.skip=true"]
        );
        assert_eq!(ToolProfile::GRADLE.skip_tests(), vec!["-x", "test"]);
        assert_eq!(ToolProfile::GRADLE.daemon_start(), "--daemon");
        assert_eq!(ToolProfile::GRADLE.daemon_stop(), "--stop");
    }

    #[test]
    fn test_detect_build_tool() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(BuildTool::detect(dir.path()), None);

        std::fs::write(dir.path().join("build.gradle.kts"), "").unwrap();
        assert_eq!(BuildTool::detect(dir.path()), Some(BuildTool::Gradle));

        std::fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        assert_eq!(BuildTool::detect(dir.path()), Some(BuildTool::Maven));
    }

    #[test]
    fn test_parse_tool_name() {
        assert_eq!(BuildTool::parse("Gradle"), Some(BuildTool::Gradle));
        assert_eq!(BuildTool::parse("mvn"), Some(BuildTool::Maven));
        assert_eq!(BuildTool::parse("ant"), None);
    }
}
