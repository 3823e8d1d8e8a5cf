//! Command-line entry point for the API Gateway log audit.

mod output;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use apigateway_log_audit_core::{
    AccountScope, ActionMode, AuditConfig, AuditService, FormatVerifier, RequiredFields,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, LevelFilter};

use output::{print_format_check, print_report, OutputFormat};

/// Configuration could not be loaded or the command line was incomplete.
const EXIT_CONFIG_ERROR: u8 = 1;
/// The run completed but reported at least one error finding.
const EXIT_FINDINGS: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "apigateway-log-audit",
    version,
    about = "Audit API Gateway stages against the execution and access logging policy"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Audit the configured accounts and print the compliant log groups
    Audit(AuditArgs),
    /// Verify a single access log format string without calling AWS
    CheckFormat(CheckFormatArgs),
}

#[derive(Args, Debug)]
struct AuditArgs {
    /// TOML or JSON config file describing the accounts to audit
    #[arg(short, long, conflicts_with_all = ["region", "api", "exclude", "role_arn"])]
    config: Option<PathBuf>,

    /// Region of a single account scope (instead of --config)
    #[arg(long)]
    region: Option<String>,

    /// `apiId` or `apiId/stageName` selector (repeatable)
    #[arg(long = "api")]
    api: Vec<String>,

    /// Treat the selectors as an exclude list
    #[arg(long)]
    exclude: bool,

    /// Cross-account role to assume for the single scope
    #[arg(long)]
    role_arn: Option<String>,

    /// Shared config profile for the base credentials
    #[arg(long)]
    profile: Option<String>,

    /// Skip access log checks (HTTP APIs are then not audited)
    #[arg(long)]
    ignore_access_log_settings: bool,

    /// Additional required `$context` variable (repeatable)
    #[arg(long = "require-field")]
    require_field: Vec<String>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Args, Debug)]
struct CheckFormatArgs {
    /// Access log format; read from stdin when omitted
    format: Option<String>,

    /// Additional required `$context` variable (repeatable)
    #[arg(long = "require-field")]
    require_field: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Json,
    Text,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => Self::Json,
            Format::Text => Self::Text,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Audit(args) => audit(args).await,
        Commands::CheckFormat(args) => check_format(args),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

async fn audit(args: AuditArgs) -> Result<ExitCode> {
    let config = build_config(&args)?;
    debug!("Audit config: {:?}", config);

    let service = AuditService::new(&config);
    let report = service.run(&config).await;
    print_report(&report, args.format.into()).context("Failed to print audit report")?;

    Ok(if report.has_errors() {
        ExitCode::from(EXIT_FINDINGS)
    } else {
        ExitCode::SUCCESS
    })
}

fn build_config(args: &AuditArgs) -> Result<AuditConfig> {
    let mut config = match (&args.config, &args.region) {
        (Some(path), _) => AuditConfig::from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        (None, Some(region)) => {
            let mode = if args.exclude {
                ActionMode::Exclude
            } else {
                ActionMode::Include
            };
            let mut scope = AccountScope::new(region.clone(), args.api.clone(), mode);
            if let Some(role_arn) = &args.role_arn {
                scope = scope.with_role_arn(role_arn.clone());
            }
            AuditConfig {
                accounts: vec![scope],
                ..AuditConfig::default()
            }
        }
        (None, None) => bail!("either --config or --region must be provided"),
    };

    if args.ignore_access_log_settings {
        config.ignore_access_log_settings = true;
    }
    if args.profile.is_some() {
        config.profile = args.profile.clone();
    }
    config
        .additional_required_fields
        .extend(args.require_field.iter().cloned());
    config.validate().context("Invalid audit configuration")?;
    Ok(config)
}

fn check_format(args: CheckFormatArgs) -> Result<ExitCode> {
    let format = match args.format {
        Some(format) => format,
        None => read_stdin()?,
    };

    let mut required = RequiredFields::default();
    required.extend(args.require_field);
    let verifier = FormatVerifier::new(required);

    let passed = print_format_check(&verifier, &format)?;
    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FINDINGS)
    })
}

fn read_stdin() -> Result<String> {
    if atty::is(atty::Stream::Stdin) {
        bail!("no access log format given; pass it as an argument or pipe it on stdin");
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read access log format from stdin")?;
    Ok(buffer.trim().to_string())
}
