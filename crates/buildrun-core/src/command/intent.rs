//! Tool-agnostic description of a requested operation
//!
//! Options are validated against an explicit table keyed by intent kind, so
//! the set of flags each command understands is plain data that can be listed
//! and tested directly.

use crate::error::{BuildError, Result};
use std::fmt;

pub const DEFAULT_DEBUG_HOST: &str = "localhost";
pub const DEFAULT_DEBUG_PORT: u16 = 5005;

/// The operation a developer asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Create,
    Build,
    Dev,
    Test,
}

impl IntentKind {
    pub fn name(&self) -> &'static str {
        match self {
            IntentKind::Create => "create",
            IntentKind::Build => "build",
            IntentKind::Dev => "dev",
            IntentKind::Test => "test",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Semantic options understood by at least one intent kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Clean,
    Tests,
    Native,
    Offline,
    Debug,
    Suspend,
    DebugHost,
    DebugPort,
    DebugMode,
    Filter,
    Once,
    Wrapper,
    PackageName,
    OutputDirectory,
    AppConfig,
}

impl Flag {
    pub const ALL: &'static [Flag] = &[
        Flag::Clean,
        Flag::Tests,
        Flag::Native,
        Flag::Offline,
        Flag::Debug,
        Flag::Suspend,
        Flag::DebugHost,
        Flag::DebugPort,
        Flag::DebugMode,
        Flag::Filter,
        Flag::Once,
        Flag::Wrapper,
        Flag::PackageName,
        Flag::OutputDirectory,
        Flag::AppConfig,
    ];

    /// Long option name without the leading dashes
    pub fn name(&self) -> &'static str {
        match self {
            Flag::Clean => "clean",
            Flag::Tests => "tests",
            Flag::Native => "native",
            Flag::Offline => "offline",
            Flag::Debug => "debug",
            Flag::Suspend => "suspend",
            Flag::DebugHost => "debug-host",
            Flag::DebugPort => "debug-port",
            Flag::DebugMode => "debug-mode",
            Flag::Filter => "filter",
            Flag::Once => "once",
            Flag::Wrapper => "wrapper",
            Flag::PackageName => "package-name",
            Flag::OutputDirectory => "output-directory",
            Flag::AppConfig => "app-config",
        }
    }

    pub fn from_name(name: &str) -> Option<Flag> {
        Flag::ALL.iter().copied().find(|flag| flag.name() == name)
    }

    pub fn takes_value(&self) -> bool {
        matches!(
            self,
            Flag::DebugHost
                | Flag::DebugPort
                | Flag::DebugMode
                | Flag::Filter
                | Flag::PackageName
                | Flag::OutputDirectory
                | Flag::AppConfig
        )
    }

    /// Whether a `--no-<name>` spelling exists
    pub fn negatable(&self) -> bool {
        matches!(
            self,
            Flag::Clean | Flag::Tests | Flag::Debug | Flag::Suspend | Flag::Wrapper
        )
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Flags accepted per intent kind
pub const OPTION_TABLE: &[(IntentKind, &[Flag])] = &[
    (
        IntentKind::Create,
        &[
            Flag::Wrapper,
            Flag::PackageName,
            Flag::OutputDirectory,
            Flag::AppConfig,
        ],
    ),
    (
        IntentKind::Build,
        &[Flag::Clean, Flag::Tests, Flag::Native, Flag::Offline],
    ),
    (
        IntentKind::Dev,
        &[
            Flag::Clean,
            Flag::Tests,
            Flag::Offline,
            Flag::Debug,
            Flag::Suspend,
            Flag::DebugHost,
            Flag::DebugPort,
            Flag::DebugMode,
        ],
    ),
    (
        IntentKind::Test,
        &[
            Flag::Clean,
            Flag::Offline,
            Flag::Debug,
            Flag::Suspend,
            Flag::DebugHost,
            Flag::DebugPort,
            Flag::DebugMode,
            Flag::Filter,
            Flag::Once,
        ],
    ),
];

pub fn flags_for(kind: IntentKind) -> &'static [Flag] {
    OPTION_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, flags)| *flags)
        .unwrap_or(&[])
}

pub fn accepts(kind: IntentKind, flag: Flag) -> bool {
    flags_for(kind).contains(&flag)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Bool(bool),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugMode {
    Listen,
    Connect,
}

impl DebugMode {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "listen" => Ok(DebugMode::Listen),
            "connect" => Ok(DebugMode::Connect),
            other => Err(BuildError::InvalidFlagValue {
                flag: Flag::DebugMode.name().to_string(),
                value: other.to_string(),
                reason: "expected 'listen' or 'connect'".to_string(),
            }),
        }
    }
}

/// A parsed request: one kind, its semantic flags in the order given, and
/// the raw arguments forwarded to the application.
#[derive(Debug, Clone)]
pub struct BuildIntent {
    pub kind: IntentKind,
    pub flags: Vec<(Flag, FlagValue)>,
    pub passthrough: Vec<String>,
    /// Ask the tool for full error output
    pub show_errors: bool,
    /// Non-interactive, plain console output
    pub batch_mode: bool,
    /// User supplied `-Dkey=value` properties, in order
    pub properties: Vec<(String, String)>,
    /// Environment overrides appended after every other token
    pub overrides: Vec<String>,
}

impl BuildIntent {
    pub fn new(kind: IntentKind) -> Self {
        Self {
            kind,
            flags: Vec::new(),
            passthrough: Vec::new(),
            show_errors: false,
            batch_mode: false,
            properties: Vec::new(),
            overrides: Vec::new(),
        }
    }

    /// Parse command-line words for `kind`.
    ///
    /// Words after a bare `--` and words that do not start with `-` are
    /// passthrough arguments. `-Dkey=value` words are build properties.
    /// Anything else must be an option from the table.
    pub fn parse<S: AsRef<str>>(kind: IntentKind, args: &[S]) -> Result<Self> {
        let mut intent = Self::new(kind);
        let mut words = args.iter().map(|arg| arg.as_ref());

        while let Some(word) = words.next() {
            if word == "--" {
                intent.passthrough.extend(words.by_ref().map(str::to_string));
                break;
            }

            let Some(option) = word.strip_prefix("--") else {
                if let Some(property) = word.strip_prefix("-D").filter(|p| !p.is_empty()) {
                    let (key, value) = property.split_once('=').unwrap_or((property, "true"));
                    intent.properties.push((key.to_string(), value.to_string()));
                    continue;
                }
                if word.starts_with('-') && word.len() > 1 {
                    return Err(BuildError::UnknownFlag {
                        kind,
                        flag: word.trim_start_matches('-').to_string(),
                    });
                }
                intent.passthrough.push(word.to_string());
                continue;
            };

            let (name, inline) = match option.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (option, None),
            };

            let unknown = || BuildError::UnknownFlag {
                kind,
                flag: name.to_string(),
            };

            if let Some(flag) = Flag::from_name(name) {
                let value = if flag.takes_value() {
                    let text = match inline {
                        Some(value) => value.to_string(),
                        None => words
                            .next()
                            .map(str::to_string)
                            .ok_or_else(|| BuildError::MissingFlagValue {
                                flag: name.to_string(),
                            })?,
                    };
                    FlagValue::Text(text)
                } else {
                    FlagValue::Bool(match inline {
                        Some(value) => parse_bool(name, value)?,
                        None => true,
                    })
                };
                intent.set(flag, value)?;
            } else if let Some(flag) = name.strip_prefix("no-").and_then(Flag::from_name) {
                if !flag.negatable() || inline.is_some() {
                    return Err(unknown());
                }
                intent.set(flag, FlagValue::Bool(false))?;
            } else {
                return Err(unknown());
            }
        }

        Ok(intent)
    }

    /// Record a flag after checking it against the option table
    pub fn set(&mut self, flag: Flag, value: FlagValue) -> Result<()> {
        if !accepts(self.kind, flag) {
            let name = match value {
                FlagValue::Bool(false) if flag.negatable() => format!("no-{}", flag.name()),
                _ => flag.name().to_string(),
            };
            return Err(BuildError::UnknownFlag {
                kind: self.kind,
                flag: name,
            });
        }

        match (&value, flag.takes_value()) {
            (FlagValue::Text(text), true) => validate_text(flag, text)?,
            (FlagValue::Bool(_), false) => {}
            (_, true) => {
                return Err(BuildError::MissingFlagValue {
                    flag: flag.name().to_string(),
                })
            }
            (FlagValue::Text(text), false) => {
                return Err(BuildError::InvalidFlagValue {
                    flag: flag.name().to_string(),
                    value: text.clone(),
                    reason: "option does not take a value".to_string(),
                })
            }
        }

        self.flags.push((flag, value));
        Ok(())
    }

    pub fn with_flag(mut self, flag: Flag, value: FlagValue) -> Result<Self> {
        self.set(flag, value)?;
        Ok(self)
    }

    /// Last explicit value of a boolean flag
    pub fn bool_flag(&self, flag: Flag) -> Option<bool> {
        self.flags.iter().rev().find_map(|(f, value)| match value {
            FlagValue::Bool(b) if *f == flag => Some(*b),
            _ => None,
        })
    }

    /// Last explicit value of a text flag
    pub fn text_flag(&self, flag: Flag) -> Option<&str> {
        self.flags.iter().rev().find_map(|(f, value)| match value {
            FlagValue::Text(text) if *f == flag => Some(text.as_str()),
            _ => None,
        })
    }

    /// Collapse the flags into one effective value per option
    pub fn resolve(&self) -> Result<ResolvedOptions> {
        let debug_enabled = self.bool_flag(Flag::Debug);
        let suspend = self.bool_flag(Flag::Suspend);

        if debug_enabled == Some(false) && suspend == Some(true) {
            return Err(BuildError::MutuallyExclusiveFlags {
                kind: self.kind,
                first: Flag::Suspend.name().to_string(),
                second: format!("no-{}", Flag::Debug.name()),
            });
        }

        let port = match self.text_flag(Flag::DebugPort) {
            Some(text) => parse_port(text)?,
            None => DEFAULT_DEBUG_PORT,
        };
        let mode = match self.text_flag(Flag::DebugMode) {
            Some(text) => DebugMode::parse(text)?,
            None => DebugMode::Listen,
        };

        Ok(ResolvedOptions {
            clean: self.bool_flag(Flag::Clean).unwrap_or(false),
            tests: self.bool_flag(Flag::Tests).unwrap_or(true),
            native: self.bool_flag(Flag::Native).unwrap_or(false),
            offline: self.bool_flag(Flag::Offline).unwrap_or(false),
            once: self.bool_flag(Flag::Once).unwrap_or(false),
            filter: self.text_flag(Flag::Filter).map(str::to_string),
            debug: DebugOptions {
                enabled: debug_enabled.unwrap_or(true),
                suspend: suspend.unwrap_or(false),
                host: self
                    .text_flag(Flag::DebugHost)
                    .unwrap_or(DEFAULT_DEBUG_HOST)
                    .to_string(),
                port,
                mode,
            },
        })
    }
}

/// Effective debugger settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugOptions {
    pub enabled: bool,
    pub suspend: bool,
    pub host: String,
    pub port: u16,
    pub mode: DebugMode,
}

/// One effective value per option, defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub clean: bool,
    pub tests: bool,
    pub native: bool,
    pub offline: bool,
    pub once: bool,
    pub filter: Option<String>,
    pub debug: DebugOptions,
}

fn parse_bool(flag: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(BuildError::InvalidFlagValue {
            flag: flag.to_string(),
            value: other.to_string(),
            reason: "expected 'true' or 'false'".to_string(),
        }),
    }
}

fn parse_port(text: &str) -> Result<u16> {
    text.parse::<u16>()
        .map_err(|_| BuildError::InvalidFlagValue {
            flag: Flag::DebugPort.name().to_string(),
            value: text.to_string(),
            reason: "expected a port number".to_string(),
        })
}

fn validate_text(flag: Flag, text: &str) -> Result<()> {
    match flag {
        Flag::DebugPort => parse_port(text).map(|_| ()),
        Flag::DebugMode => DebugMode::parse(text).map(|_| ()),
        _ if text.is_empty() => Err(BuildError::MissingFlagValue {
            flag: flag.name().to_string(),
        }),
        _ => Ok(()),
    }
}
