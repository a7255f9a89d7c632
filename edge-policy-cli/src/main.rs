//! Command-line front end for business policy validation and policy generation.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edge_policy_generation::{BusinessPolicy, JsonProvider, PolicyTranslator};
use log::{debug, info};

/// Policy name used when the document is read from stdin
const STDIN_POLICY_NAME: &str = "business-policy";

#[derive(Parser, Debug)]
#[command(name = "edge-policy")]
#[command(about = "Validate business policies and generate the policies used for agreement negotiation")]
#[command(version)]
struct Cli {
    /// Enable debug logging (otherwise controlled by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that a business policy document is complete
    Validate {
        /// Business policy JSON file, or '-' for stdin
        file: PathBuf,
    },

    /// Generate the internal policy for a business policy document
    Generate {
        /// Business policy JSON file, or '-' for stdin
        file: PathBuf,

        /// Name of the generated policy (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Pretty-print the generated policy
        #[arg(long)]
        pretty: bool,

        /// Write the generated policy to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the JSON schema of business policy documents
    Schema,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_document(path: &Path) -> Result<String> {
    if is_stdin(path) {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read business policy from stdin")?;
        Ok(content)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read business policy file: {}", path.display()))
    }
}

fn load_business_policy(path: &Path) -> Result<Option<BusinessPolicy>> {
    let content = read_document(path)?;
    debug!("Read {} bytes from {}", content.len(), path.display());
    JsonProvider::parse_business_policy(&content)
        .with_context(|| format!("Invalid business policy document: {}", path.display()))
}

fn default_policy_name(path: &Path) -> String {
    if is_stdin(path) {
        return STDIN_POLICY_NAME.to_string();
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map_or_else(|| STDIN_POLICY_NAME.to_string(), str::to_string)
}

fn validate(file: &Path) -> Result<()> {
    let business_policy = load_business_policy(file)?;
    PolicyTranslator::new()
        .validate_document(business_policy.as_ref())
        .with_context(|| format!("Business policy {} is not valid", file.display()))?;
    println!("valid");
    Ok(())
}

fn generate(file: &Path, name: Option<String>, pretty: bool, output: Option<&Path>) -> Result<()> {
    let business_policy = load_business_policy(file)?
        .with_context(|| format!("Business policy {} is empty", file.display()))?;

    let policy_name = name.unwrap_or_else(|| default_policy_name(file));
    info!("Generating policy {} from {}", policy_name, file.display());

    let policy = PolicyTranslator::new()
        .generate_policy(&business_policy, &policy_name)
        .with_context(|| format!("Failed to generate policy from {}", file.display()))?;

    let rendered = if pretty {
        JsonProvider::stringify_pretty(&policy)
    } else {
        JsonProvider::stringify(&policy)
    }
    .context("Failed to serialize generated policy")?;

    match output {
        Some(path) => {
            std::fs::write(path, rendered + "\n")
                .with_context(|| format!("Failed to write policy to {}", path.display()))?;
            info!("Wrote policy {} to {}", policy_name, path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn schema() -> Result<()> {
    let schema = schemars::schema_for!(BusinessPolicy);
    let rendered =
        serde_json::to_string_pretty(&schema).context("Failed to serialize business policy schema")?;
    println!("{}", rendered);
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Validate { file } => validate(&file),
        Command::Generate {
            file,
            name,
            pretty,
            output,
        } => generate(&file, name, pretty, output.as_deref()),
        Command::Schema => schema(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
