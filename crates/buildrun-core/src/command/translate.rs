//! Intent to build tool token translation

use crate::command::intent::{
    BuildIntent, DebugMode, DebugOptions, IntentKind, ResolvedOptions, DEFAULT_DEBUG_HOST,
    DEFAULT_DEBUG_PORT,
};
use crate::error::{BuildError, Result};
use crate::tool::profile::{BuildTool, Lifecycle, ToolProfile};
use tracing::debug;

/// Property carrying application arguments in dev and test mode
const APPLICATION_ARGS_PROPERTY: &str = "quarkus.args";

/// Translate an intent into the argument tokens of `profile`'s tool.
///
/// Order: tool options, clean, lifecycle, kind specific options, debug
/// group, passthrough, environment overrides.
pub fn translate(intent: &BuildIntent, profile: &ToolProfile) -> Result<Vec<String>> {
    let options = intent.resolve()?;
    let mut tokens = tool_options(intent, profile);

    match intent.kind {
        IntentKind::Create => {
            return Err(BuildError::NotTranslatable { kind: intent.kind });
        }
        IntentKind::Build => {
            push_lifecycle(&mut tokens, profile, &options, Lifecycle::Build);
            if options.native {
                tokens.push(profile.native());
            }
            if !options.tests {
                tokens.extend(profile.skip_tests());
            }
            if options.offline {
                tokens.push(profile.offline().to_string());
            }
            tokens.extend(intent.passthrough.iter().cloned());
        }
        IntentKind::Dev => {
            push_lifecycle(&mut tokens, profile, &options, Lifecycle::Dev);
            if options.offline {
                tokens.push(profile.offline().to_string());
            }
            // Gradle's dev task has no test phase to skip
            if !options.tests && profile.tool == BuildTool::Maven {
                tokens.extend(profile.skip_tests());
            }
            push_debug(&mut tokens, profile, &options.debug);
            push_application_args(&mut tokens, profile, &intent.passthrough);
        }
        IntentKind::Test => {
            if options.once {
                push_lifecycle(&mut tokens, profile, &options, Lifecycle::Test);
                if let Some(filter) = &options.filter {
                    tokens.extend(profile.run_once_filter(filter));
                }
            } else {
                push_lifecycle(&mut tokens, profile, &options, Lifecycle::ContinuousTest);
                if let Some(filter) = &options.filter {
                    tokens.push(profile.continuous_filter(filter));
                }
            }
            if options.offline {
                tokens.push(profile.offline().to_string());
            }
            push_debug(&mut tokens, profile, &options.debug);
            push_application_args(&mut tokens, profile, &intent.passthrough);
        }
    }

    tokens.extend(intent.overrides.iter().cloned());

    debug!(
        kind = %intent.kind,
        tool = %profile.tool,
        tokens = tokens.len(),
        "translated intent"
    );
    Ok(tokens)
}

fn tool_options(intent: &BuildIntent, profile: &ToolProfile) -> Vec<String> {
    let mut tokens = Vec::new();
    if intent.show_errors {
        tokens.push(profile.show_errors().to_string());
    }
    if intent.batch_mode {
        tokens.push(profile.batch_mode().to_string());
    }
    for (key, value) in &intent.properties {
        tokens.push(profile.property(key, value));
    }
    tokens
}

fn push_lifecycle(
    tokens: &mut Vec<String>,
    profile: &ToolProfile,
    options: &ResolvedOptions,
    step: Lifecycle,
) {
    if options.clean {
        tokens.push(profile.lifecycle(Lifecycle::Clean).to_string());
    }
    tokens.push(profile.lifecycle(step).to_string());
}

/// Debug properties. A disabled debugger is always spelled out so a tool
/// default cannot turn it back on; connect mode always emits host, mode and
/// port together in that order.
fn push_debug(tokens: &mut Vec<String>, profile: &ToolProfile, debug: &DebugOptions) {
    if !debug.enabled {
        tokens.push(profile.property("debug", "false"));
        return;
    }

    match debug.mode {
        DebugMode::Connect => {
            tokens.push(profile.property("debugHost", &debug.host));
            tokens.push(profile.property("debug", "client"));
            tokens.push(profile.property("debugPort", &debug.port.to_string()));
        }
        DebugMode::Listen => {
            if debug.host != DEFAULT_DEBUG_HOST {
                tokens.push(profile.property("debugHost", &debug.host));
            }
            if debug.port != DEFAULT_DEBUG_PORT {
                tokens.push(profile.property("debugPort", &debug.port.to_string()));
            }
        }
    }

    if debug.suspend {
        tokens.push(profile.property("suspend", "true"));
    }
}

/// Fold application arguments into one property token, each argument quoted
/// on its own so embedded whitespace survives. Quotes inside an argument are
/// escaped.
fn push_application_args(tokens: &mut Vec<String>, profile: &ToolProfile, args: &[String]) {
    if args.is_empty() {
        return;
    }
    let joined = args
        .iter()
        .map(|arg| format!("\"{}\"", arg.replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(" ");
    tokens.push(profile.property(APPLICATION_ARGS_PROPERTY, &joined));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::intent::{Flag, FlagValue};

    fn tokens(kind: IntentKind, profile: &ToolProfile, args: &[&str]) -> Vec<String> {
        let intent = BuildIntent::parse(kind, args).unwrap();
        translate(&intent, profile).unwrap()
    }

    fn position(tokens: &[String], token: &str) -> usize {
        tokens
            .iter()
            .position(|t| t == token)
            .unwrap_or_else(|| panic!("missing {token} in {tokens:?}"))
    }

    #[test]
    fn test_gradle_build_all_options() {
        let t = tokens(
            IntentKind::Build,
            &ToolProfile::GRADLE,
            &["--clean", "--tests", "--native", "--offline"],
        );
        assert_eq!(
            t,
            vec![
                "clean",
                "build",
                "-Dquarkus.native.enabled=true",
                "--offline"
            ]
        );
    }

    #[test]
    fn test_gradle_build_no_clean_no_tests() {
        let t = tokens(
            IntentKind::Build,
            &ToolProfile::GRADLE,
            &["--no-clean", "--no-tests"],
        );
        assert_eq!(t, vec!["build", "-x", "test"]);
    }

    #[test]
    fn test_maven_build_skip_tests_and_native() {
        let t = tokens(
            IntentKind::Build,
            &ToolProfile::MAVEN,
            &["--no-tests", "--native"],
        );
        assert_eq!(
            t,
            vec!["install", "-Dnative", "-DskipTests", "-Dmaven.test.skip=true"]
        );
    }

    #[test]
    fn test_clean_precedes_lifecycle() {
        for profile in [&ToolProfile::MAVEN, &ToolProfile::GRADLE] {
            for kind in [IntentKind::Build, IntentKind::Dev, IntentKind::Test] {
                let t = tokens(kind, profile, &["--offline", "--clean"]);
                let clean = position(&t, "clean");
                assert_eq!(clean, 0, "{kind} {t:?}");
                assert!(t.len() > clean + 1);
            }
        }
    }

    #[test]
    fn test_skip_tests_never_runs_tests() {
        let t = tokens(IntentKind::Build, &ToolProfile::GRADLE, &["--no-tests"]);
        let test_positions: Vec<_> = t
            .iter()
            .enumerate()
            .filter(|(_, token)| *token == "test")
            .map(|(i, _)| i)
            .collect();
        for i in test_positions {
            assert!(i > 0 && t[i - 1] == "-x", "plain test task in {t:?}");
        }
    }

    #[test]
    fn test_gradle_dev_listen_suspend() {
        let t = tokens(
            IntentKind::Dev,
            &ToolProfile::GRADLE,
            &[
                "--clean",
                "--tests",
                "--debug",
                "--suspend",
                "--debug-mode=listen",
                "--offline",
            ],
        );
        assert_eq!(t, vec!["clean", "quarkusDev", "--offline", "-Dsuspend=true"]);
        assert!(!t.iter().any(|token| token.starts_with("-Ddebug")));
    }

    #[test]
    fn test_dev_no_debug_is_explicit() {
        for profile in [&ToolProfile::MAVEN, &ToolProfile::GRADLE] {
            let t = tokens(
                IntentKind::Dev,
                profile,
                &["--no-clean", "--no-tests", "--no-debug"],
            );
            assert!(t.contains(&"-Ddebug=false".to_string()), "{t:?}");
            assert!(!t.iter().any(|token| token.starts_with("-Dsuspend")));
            assert!(!t.contains(&"clean".to_string()));
        }
    }

    #[test]
    fn test_test_no_debug_is_explicit() {
        let t = tokens(IntentKind::Test, &ToolProfile::GRADLE, &["--no-debug", "--once"]);
        assert_eq!(t, vec!["test", "-Ddebug=false"]);
    }

    #[test]
    fn test_dev_no_tests_per_tool() {
        let gradle = tokens(IntentKind::Dev, &ToolProfile::GRADLE, &["--no-tests"]);
        assert!(!gradle.contains(&"-x".to_string()));

        let maven = tokens(IntentKind::Dev, &ToolProfile::MAVEN, &["--no-tests"]);
        assert!(maven.contains(&"-DskipTests".to_string()));
    }

    #[test]
    fn test_connect_debug_group_order() {
        let expected = vec![
            "-DdebugHost=0.0.0.0".to_string(),
            "-Ddebug=client".to_string(),
            "-DdebugPort=8008".to_string(),
        ];
        let orders: [&[&str]; 3] = [
            &["--debug-host=0.0.0.0", "--debug-port=8008", "--debug-mode=connect"],
            &["--debug-mode=connect", "--debug-port=8008", "--debug-host=0.0.0.0"],
            &["--debug-port=8008", "--debug-mode=connect", "--debug-host=0.0.0.0"],
        ];
        for args in orders {
            let t = tokens(IntentKind::Dev, &ToolProfile::GRADLE, args);
            let start = position(&t, "-DdebugHost=0.0.0.0");
            assert_eq!(t[start..start + 3], expected[..], "{args:?}");
        }
    }

    #[test]
    fn test_connect_uses_default_host_and_port() {
        let t = tokens(IntentKind::Dev, &ToolProfile::MAVEN, &["--debug-mode=connect"]);
        assert_eq!(
            t,
            vec![
                "quarkus:dev",
                "-DdebugHost=localhost",
                "-Ddebug=client",
                "-DdebugPort=5005"
            ]
        );
    }

    #[test]
    fn test_listen_non_default_endpoint() {
        let t = tokens(
            IntentKind::Dev,
            &ToolProfile::GRADLE,
            &["--debug-port", "9000", "--debug-host", "0.0.0.0"],
        );
        assert_eq!(
            t,
            vec!["quarkusDev", "-DdebugHost=0.0.0.0", "-DdebugPort=9000"]
        );
    }

    #[test]
    fn test_application_args_quoted_individually() {
        let t = tokens(
            IntentKind::Dev,
            &ToolProfile::GRADLE,
            &["--no-suspend", "--", "arg1", "arg2"],
        );
        assert_eq!(t.last().unwrap(), "-Dquarkus.args=\"arg1\" \"arg2\"");
    }

    #[test]
    fn test_application_arg_with_space_stays_whole() {
        let t = tokens(IntentKind::Dev, &ToolProfile::GRADLE, &["--", "arg1 arg2"]);
        assert_eq!(t.last().unwrap(), "-Dquarkus.args=\"arg1 arg2\"");
    }

    #[test]
    fn test_application_arg_quotes_are_escaped() {
        let t = tokens(IntentKind::Dev, &ToolProfile::GRADLE, &["--", "say \"hi\"", "x"]);
        assert_eq!(t.last().unwrap(), "-Dquarkus.args=\"say \\\"hi\\\"\" \"x\"");
    }

    #[test]
    fn test_build_passthrough_is_verbatim() {
        let t = tokens(IntentKind::Build, &ToolProfile::MAVEN, &["--", "-Pci", "verify"]);
        assert_eq!(t, vec!["install", "-Pci", "verify"]);
    }

    #[test]
    fn test_continuous_test_filter() {
        let t = tokens(
            IntentKind::Test,
            &ToolProfile::GRADLE,
            &[
                "--clean",
                "--debug",
                "--suspend",
                "--debug-mode=listen",
                "--offline",
                "--filter=FooTest",
            ],
        );
        assert_eq!(
            t,
            vec![
                "clean",
                "quarkusTest",
                "-Dquarkus.test.include-pattern=FooTest",
                "--offline",
                "-Dsuspend=true"
            ]
        );
    }

    #[test]
    fn test_run_once_filter_per_tool() {
        let gradle = tokens(
            IntentKind::Test,
            &ToolProfile::GRADLE,
            &["--once", "--offline", "--filter=FooTest"],
        );
        assert_eq!(gradle, vec!["test", "--tests", "FooTest", "--offline"]);

        let maven = tokens(
            IntentKind::Test,
            &ToolProfile::MAVEN,
            &["--once", "--filter=FooTest"],
        );
        assert_eq!(maven, vec!["test", "-Dtest=FooTest"]);
    }

    #[test]
    fn test_tool_options_and_overrides_bracket_tokens() {
        let mut intent = BuildIntent::new(IntentKind::Build)
            .with_flag(Flag::Clean, FlagValue::Bool(true))
            .unwrap();
        intent.show_errors = true;
        intent.batch_mode = true;
        intent.properties = vec![
            ("property".to_string(), "value1".to_string()),
            ("property2".to_string(), "value2".to_string()),
        ];
        intent.overrides = vec!["-Dmaven.repo.local=/tmp/repo".to_string()];

        let gradle = translate(&intent, &ToolProfile::GRADLE).unwrap();
        assert_eq!(
            gradle,
            vec![
                "--full-stacktrace",
                "--console=plain",
                "-Dproperty=value1",
                "-Dproperty2=value2",
                "clean",
                "build",
                "-Dmaven.repo.local=/tmp/repo"
            ]
        );

        let maven = translate(&intent, &ToolProfile::MAVEN).unwrap();
        assert_eq!(&maven[..2], &["-e", "-B"]);
        assert_eq!(maven.last().unwrap(), "-Dmaven.repo.local=/tmp/repo");
    }

    #[test]
    fn test_overrides_follow_application_args() {
        let mut intent = BuildIntent::parse(IntentKind::Dev, &["--", "a"]).unwrap();
        intent.overrides = vec!["--gradle-user-home=/cache".to_string()];
        let t = translate(&intent, &ToolProfile::GRADLE).unwrap();
        assert_eq!(
            &t[t.len() - 2..],
            &["-Dquarkus.args=\"a\"", "--gradle-user-home=/cache"]
        );
    }

    #[test]
    fn test_create_is_not_translatable() {
        let intent = BuildIntent::new(IntentKind::Create);
        let err = translate(&intent, &ToolProfile::MAVEN).unwrap_err();
        assert!(matches!(
            err,
            BuildError::NotTranslatable {
                kind: IntentKind::Create
            }
        ));
    }

    #[test]
    fn test_translation_is_deterministic() {
        let args = ["--clean", "--offline", "--debug-mode=connect", "--", "x y", "z"];
        let first = tokens(IntentKind::Dev, &ToolProfile::MAVEN, &args);
        let second = tokens(IntentKind::Dev, &ToolProfile::MAVEN, &args);
        assert_eq!(first, second);
    }
}
