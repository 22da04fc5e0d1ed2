use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use form_logic::{LogicField, LogicTarget, compile_for, decompile, describe};
use tracing::Level;

use crate::check::check;
use crate::config::EditorConfig;
use crate::field::Field;
use crate::layout_schema;

#[derive(Parser, Debug)]
#[command(
    name = "form-builder",
    about = "Inspect form layouts and their condition expressions",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile JSON condition rows into an expression
    Compile(CompileArgs),
    /// Parse an expression back into JSON condition rows
    Decompile(ExpressionArgs),
    /// Render an expression as a readable sentence
    Describe(ExpressionArgs),
    /// Report structural problems in a stored layout
    Check(CheckArgs),
    /// Print the JSON Schema of the stored layout
    Schema,
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// JSON array of condition rows, or `-` for stdin
    rows: String,
    /// Property the expression will be stored under
    #[arg(long, value_enum, default_value = "if")]
    target: TargetArg,
}

#[derive(Args, Debug)]
struct ExpressionArgs {
    /// Expression string, or `-` for stdin
    expression: String,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Layout JSON file
    path: PathBuf,
    /// Editor config; defaults to form-builder.toml beside the layout
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TargetArg {
    #[value(name = "if")]
    Visibility,
    Validation,
    Disable,
}

impl From<TargetArg> for LogicTarget {
    fn from(value: TargetArg) -> Self {
        match value {
            TargetArg::Visibility => LogicTarget::Visibility,
            TargetArg::Validation => LogicTarget::Validation,
            TargetArg::Disable => LogicTarget::Disable,
        }
    }
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Compile(args) => run_compile(args),
        Commands::Decompile(args) => run_decompile(args),
        Commands::Describe(args) => run_describe(args),
        Commands::Check(args) => run_check(args),
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&layout_schema())?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn read_input(value: &str) -> Result<String> {
    if value != "-" {
        return Ok(value.to_string());
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read stdin")?;
    Ok(buffer.trim_end_matches(['\r', '\n']).to_string())
}

fn run_compile(args: CompileArgs) -> Result<()> {
    let raw = read_input(&args.rows)?;
    let rows: Vec<LogicField> =
        serde_json::from_str(&raw).context("condition rows must be a JSON array")?;
    match compile_for(&rows, args.target.into()) {
        serde_json::Value::String(expression) => println!("{expression}"),
        wrapped => println!("{}", serde_json::to_string_pretty(&wrapped)?),
    }
    Ok(())
}

fn run_decompile(args: ExpressionArgs) -> Result<()> {
    let expression = read_input(&args.expression)?;
    let rows = decompile(&expression)?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn run_describe(args: ExpressionArgs) -> Result<()> {
    let expression = read_input(&args.expression)?;
    let rows = decompile(&expression)?;
    println!("{}", describe(&rows));
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => args
            .path
            .parent()
            .map(EditorConfig::discover)
            .unwrap_or_default(),
    };
    let raw = std::fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read {}", args.path.display()))?;
    let fields: Vec<Field> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a field layout", args.path.display()))?;

    let issues = check(&fields, &config.stepper_type);
    for issue in &issues {
        eprintln!("- {issue}");
    }
    if !issues.is_empty() {
        bail!("{}: {} issue(s)", args.path.display(), issues.len());
    }
    println!("{}: ok ({} fields)", args.path.display(), count_fields(&fields));
    Ok(())
}

fn count_fields(fields: &[Field]) -> usize {
    fields
        .iter()
        .map(|field| 1 + field.steps.iter().map(|step| step.children.len()).sum::<usize>())
        .sum()
}
