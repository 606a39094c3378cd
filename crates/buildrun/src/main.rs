//! buildrun CLI - Build, develop and test Maven and Gradle projects

use anyhow::{Context, Result};
use buildrun_core::command::{self, render_dry_run};
use buildrun_core::runtime::{DaemonController, Invoker, ProcessInvoker};
use buildrun_core::settings::Settings;
use buildrun_core::tool::{self, BuildTool};
use buildrun_core::{BuildIntent, CommandGenerator, CreatePlan, Flag, IntentKind, ProjectGenerator};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code reported after Ctrl+C
const INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "buildrun")]
#[command(about = "Build, develop and test Maven and Gradle projects")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project
    Create(InvokeArgs),
    /// Build the current project
    Build(InvokeArgs),
    /// Run the current project in dev mode
    Dev(InvokeArgs),
    /// Run the current project's tests (continuous unless --once)
    Test(InvokeArgs),
    /// Manage the build daemon of the current project
    Daemon(DaemonArgs),
}

#[derive(clap::Args, Debug)]
pub struct CommonArgs {
    /// Print the command instead of running it
    #[arg(long = "dry-run", alias = "dryrun")]
    pub dry_run: bool,

    /// Ask the build tool for full error output
    #[arg(short = 'e', long = "errors")]
    pub errors: bool,

    /// Run the build tool in batch (non-interactive) mode
    #[arg(short = 'B', long = "batch-mode")]
    pub batch_mode: bool,

    /// Verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Build property passed to the build tool
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,

    /// Project directory (defaults to the current directory)
    #[arg(long = "project-dir")]
    pub project_dir: Option<PathBuf>,

    /// Use Maven
    #[arg(long, conflicts_with = "gradle")]
    pub maven: bool,

    /// Use Gradle
    #[arg(long)]
    pub gradle: bool,
}

impl CommonArgs {
    fn tool(&self) -> Option<BuildTool> {
        if self.maven {
            Some(BuildTool::Maven)
        } else if self.gradle {
            Some(BuildTool::Gradle)
        } else {
            None
        }
    }

    fn project_root(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir().context("Failed to read the current directory")?;
        Ok(match &self.project_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => cwd,
        })
    }
}

#[derive(clap::Args, Debug)]
pub struct InvokeArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Command options (e.g. --clean, --no-tests, --debug-port=5006); common
    /// options may be mixed in
    #[arg(
        value_name = "OPTIONS",
        allow_hyphen_values = true,
        trailing_var_arg = true
    )]
    pub options: Vec<String>,
}

impl InvokeArgs {
    /// Move common options written among the command options back into
    /// `common`, since clap hands everything after the first command option to
    /// `options`.
    fn absorb_common_options(&mut self) -> Result<()> {
        let mut remaining = Vec::with_capacity(self.options.len());
        let mut words = std::mem::take(&mut self.options).into_iter();

        while let Some(word) = words.next() {
            match word.as_str() {
                "--dry-run" | "--dryrun" => self.common.dry_run = true,
                "-e" | "--errors" => self.common.errors = true,
                "-B" | "--batch-mode" => self.common.batch_mode = true,
                "--verbose" => self.common.verbose = true,
                "--maven" => self.common.maven = true,
                "--gradle" => self.common.gradle = true,
                "--project-dir" => {
                    let dir = words
                        .next()
                        .context("option '--project-dir' requires a value")?;
                    self.common.project_dir = Some(PathBuf::from(dir));
                }
                _ => {
                    if let Some(dir) = word.strip_prefix("--project-dir=") {
                        self.common.project_dir = Some(PathBuf::from(dir));
                        continue;
                    }
                    // The value of e.g. `--filter -e` belongs to the command option
                    let value_follows = word
                        .strip_prefix("--")
                        .filter(|name| !name.contains('='))
                        .and_then(Flag::from_name)
                        .is_some_and(|flag| flag.takes_value());
                    remaining.push(word);
                    if value_follows {
                        remaining.extend(words.next());
                    }
                }
            }
        }

        if self.common.maven && self.common.gradle {
            anyhow::bail!("options '--maven' and '--gradle' cannot be combined");
        }
        self.options = remaining;
        Ok(())
    }
}

#[derive(clap::Args, Debug)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub action: DaemonAction,

    /// Project directory (defaults to the current directory)
    #[arg(long = "project-dir", global = true)]
    pub project_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum DaemonAction {
    /// Start the build daemon (no-op when already running)
    Start,
    /// Stop the build daemon
    Stop,
}

fn parse_property(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, _)) if key.is_empty() => Err(format!("missing property name in '{}'", raw)),
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None if raw.is_empty() => Err("missing property name".to_string()),
        None => Ok((raw.to_string(), "true".to_string())),
    }
}

/// Split argv at the first bare `--`.
///
/// Everything after it is forwarded untouched, so clap never sees it.
fn split_passthrough(argv: Vec<String>) -> (Vec<String>, Option<Vec<String>>) {
    match argv.iter().position(|arg| arg == "--") {
        Some(index) => {
            let mut cli = argv;
            let rest = cli.split_off(index);
            (cli, Some(rest[1..].to_vec()))
        }
        None => (argv, None),
    }
}

/// Combine parsed CLI arguments into an intent
fn build_intent(
    kind: IntentKind,
    args: &InvokeArgs,
    passthrough: Option<&[String]>,
    overrides: &[String],
) -> buildrun_core::Result<BuildIntent> {
    let mut words = args.options.clone();
    if let Some(rest) = passthrough {
        words.push("--".to_string());
        words.extend(rest.iter().cloned());
    }

    let mut intent = BuildIntent::parse(kind, &words)?;
    intent.show_errors = args.common.errors;
    intent.batch_mode = args.common.batch_mode;
    let mut properties = args.common.properties.clone();
    properties.append(&mut intent.properties);
    intent.properties = properties;
    intent.overrides = overrides.to_vec();
    Ok(intent)
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "buildrun=debug,buildrun_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn invoke(
    kind: IntentKind,
    args: InvokeArgs,
    passthrough: Option<Vec<String>>,
) -> Result<i32> {
    let root = args.common.project_root()?;
    let settings = Settings::load(&root)?;
    let build_tool = settings
        .resolve_tool(args.common.tool(), &root)
        .with_context(|| {
            format!(
                "Unable to determine the build tool for {}; pass --maven or --gradle",
                root.display()
            )
        })?;
    let profile = build_tool.profile();
    debug!(root = %root.display(), tool = %build_tool, "resolved project");

    let intent = build_intent(kind, &args, passthrough.as_deref(), &settings.overrides)?;
    let executable = tool::locate_executable(&root, profile)?;
    let generated = command::compile(&intent, profile, &executable)?;

    if args.common.dry_run {
        let once = intent.bool_flag(Flag::Once).unwrap_or(false);
        print!("{}", render_dry_run(kind, once, profile, &generated));
        return Ok(0);
    }

    println!("{} {}", "Running:".dimmed(), generated.preview().yellow());
    println!();
    let output = ProcessInvoker::new().invoke(&generated, &root).await?;
    Ok(output.exit_code)
}

async fn create(args: InvokeArgs, passthrough: Option<Vec<String>>) -> Result<i32> {
    let root = args.common.project_root()?;
    let settings = Settings::load(&root)?;
    let build_tool = args
        .common
        .tool()
        .or(settings.tool)
        .unwrap_or(BuildTool::Maven);

    let intent = build_intent(IntentKind::Create, &args, passthrough.as_deref(), &[])?;
    let plan = CreatePlan::from_intent(&intent, build_tool)?;

    if args.common.dry_run {
        print!("{}", plan.render());
        return Ok(0);
    }

    let generator_settings = settings.generator.context(
        "No project generator configured; set `generator` in .buildrun.yaml or use --dry-run",
    )?;
    let generator = CommandGenerator::new(
        ProcessInvoker::new(),
        generator_settings.program,
        generator_settings.args,
    );
    generator.generate(&plan).await?;

    println!(
        "{} Project created in {}",
        "SUCCESS".green().bold(),
        plan.project_dir().display()
    );
    Ok(0)
}

async fn daemon(args: DaemonArgs) -> Result<i32> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let root = match args.project_dir {
        Some(dir) => cwd.join(dir),
        None => cwd,
    };
    let settings = Settings::load(&root)?;
    let build_tool = settings
        .resolve_tool(None, &root)
        .unwrap_or(BuildTool::Gradle);
    let profile = build_tool.profile();
    let executable = tool::locate_executable(&root, profile)?;

    let controller =
        DaemonController::new(ProcessInvoker::new()).with_overrides(settings.overrides);
    let handle = controller.handle(&root, profile, &executable)?;

    let state = match args.action {
        DaemonAction::Start => controller.start(&handle).await?,
        DaemonAction::Stop => controller.stop(&handle).await?,
    };
    println!("{} daemon {:?}", build_tool.display_name().cyan(), state);
    Ok(0)
}

async fn run(args: Args, passthrough: Option<Vec<String>>) -> Result<i32> {
    match args.command {
        Command::Create(create_args) => create(create_args, passthrough).await,
        Command::Build(build_args) => invoke(IntentKind::Build, build_args, passthrough).await,
        Command::Dev(dev_args) => invoke(IntentKind::Dev, dev_args, passthrough).await,
        Command::Test(test_args) => invoke(IntentKind::Test, test_args, passthrough).await,
        Command::Daemon(daemon_args) => daemon(daemon_args).await,
    }
}

fn absorb_common_options(args: &mut Args) -> Result<()> {
    match &mut args.command {
        Command::Create(a) | Command::Build(a) | Command::Dev(a) | Command::Test(a) => {
            a.absorb_common_options()
        }
        Command::Daemon(_) => Ok(()),
    }
}

fn verbose(args: &Args) -> bool {
    match &args.command {
        Command::Create(a) | Command::Build(a) | Command::Dev(a) | Command::Test(a) => {
            a.common.verbose
        }
        Command::Daemon(d) => d.verbose,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(INTERRUPTED);
    })
    .ok();

    let (cli_args, passthrough) = split_passthrough(std::env::args().collect());
    let mut args = Args::parse_from(cli_args);
    if let Err(e) = absorb_common_options(&mut args) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        return ExitCode::FAILURE;
    }
    init_logging(verbose(&args));

    match run(args, passthrough).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
