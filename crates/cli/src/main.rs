//! openapi2locust CLI
//!
//! Command-line interface for generating Locust load tests from OpenAPI 3
//! documents.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use openapi2locust_common::{GenerationConfig, LoadTestModel};
use openapi2locust_generator::{resolve_output_path, write_script, LocustRenderer};
use openapi2locust_parser::OpenApiParser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openapi2locust")]
#[command(version, about = "Generate Locust load-testing scripts from OpenAPI 3 specifications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Locust script from an OpenAPI document
    #[command(after_help = "EXAMPLES:\n  \
        # Generate locustfile_petstore.py in the current directory\n  \
        openapi2locust generate petstore.yaml\n\n  \
        # Custom output directory, file name and configuration\n  \
        openapi2locust generate petstore.yaml \\\n    \
        --output ./load-tests \\\n    \
        --filename petstore_load \\\n    \
        --config locust-config.yaml\n\n  \
        # Only check that the document is usable\n  \
        openapi2locust generate petstore.yaml --validate-only")]
    Generate {
        /// Path to the OpenAPI document (YAML or JSON)
        spec: PathBuf,

        /// Output directory (defaults to the configured output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file name; `.py` is appended when missing
        #[arg(short, long)]
        filename: Option<String>,

        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Validate the document without generating anything
        #[arg(long)]
        validate_only: bool,
    },

    /// Show a summary of an OpenAPI document
    #[command(after_help = "EXAMPLES:\n  \
        openapi2locust info petstore.yaml")]
    Info {
        /// Path to the OpenAPI document (YAML or JSON)
        spec: PathBuf,
    },

    /// List the tasks that would be generated
    #[command(after_help = "EXAMPLES:\n  \
        openapi2locust endpoints petstore.yaml\n  \
        openapi2locust endpoints petstore.yaml --config locust-config.yaml")]
    Endpoints {
        /// Path to the OpenAPI document (YAML or JSON)
        spec: PathBuf,

        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration as YAML
    #[command(after_help = "EXAMPLES:\n  \
        # Write a starting configuration file\n  \
        openapi2locust config > locust-config.yaml")]
    Config {
        /// Configuration file to merge over the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate {
            spec,
            output,
            filename,
            config,
            validate_only,
        } => {
            generate_command(GenerateOptions {
                spec_path: spec.as_path(),
                output: output.as_deref(),
                filename: filename.as_deref(),
                config_path: config.as_deref(),
                validate_only,
                verbose: cli.verbose,
            })?;
        }
        Commands::Info { spec } => {
            info_command(spec.as_path())?;
        }
        Commands::Endpoints { spec, config } => {
            endpoints_command(spec.as_path(), config.as_deref())?;
        }
        Commands::Config { config } => {
            config_command(config.as_deref())?;
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "openapi2locust=debug"
    } else {
        "openapi2locust=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

/// Options for the generate command
struct GenerateOptions<'a> {
    spec_path: &'a Path,
    output: Option<&'a Path>,
    filename: Option<&'a str>,
    config_path: Option<&'a Path>,
    validate_only: bool,
    verbose: bool,
}

fn generate_command(options: GenerateOptions) -> Result<()> {
    let config = GenerationConfig::resolve(options.config_path)
        .context("Failed to load configuration")?;

    println!(
        "{} Loading OpenAPI document: {}",
        "→".cyan(),
        options.spec_path.display()
    );
    let parser = OpenApiParser::from_file(options.spec_path).with_context(|| {
        format!(
            "Failed to load OpenAPI document {}",
            options.spec_path.display()
        )
    })?;

    let spec = parser.spec();
    println!(
        "{} Document is valid: {} paths, {} operations",
        "✓".green(),
        spec.paths.len(),
        spec.operation_count()
    );

    if options.validate_only {
        println!("\n{}", "✓ Validation successful!".green().bold());
        return Ok(());
    }

    println!("{} Building tasks...", "→".cyan());
    let model = parser
        .build_model(&config)
        .context("Failed to build load-test model")?;
    print_skipped(&model);

    let output_dir = options
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output_dir.clone());
    let output_path = resolve_output_path(&output_dir, options.filename, options.spec_path)
        .context("Invalid output file name")?;

    if options.verbose {
        println!("  Class: {}", model.class_name);
        println!("  Host: {}", model.base_url);
        println!("  Output: {}", output_path.display());
    }

    println!("{} Rendering Locust script...", "→".cyan());
    let renderer = LocustRenderer::new().context("Failed to load script template")?;
    let script = renderer
        .render(&model, &config)
        .context("Failed to render Locust script")?;
    write_script(&output_path, &script)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!("\n{}", "✓ Generation complete!".green().bold());
    println!("\n{}", "Generated file:".bold());
    println!("  📄 {}", output_path.display());
    println!("  Tasks: {}", model.endpoints.len());

    if options.verbose {
        println!("\n{}", "Tasks:".bold());
        for endpoint in &model.endpoints {
            println!(
                "  • {} {} (weight {})",
                endpoint.task_name.cyan(),
                endpoint.display_name(),
                endpoint.weight
            );
        }
    }

    if let Some(auth) = &model.auth {
        println!("\n{}", "Authentication:".bold());
        println!("  Scheme: {} ({})", auth.scheme_name.yellow(), auth.kind.label());
        for line in &auth.instructions {
            println!("  {}", line);
        }
    }

    println!("\n{}", "Next steps:".bold());
    println!("  1. Review the generated script");
    println!("  2. Run: locust -f {}", output_path.display());

    Ok(())
}

fn info_command(spec_path: &Path) -> Result<()> {
    let parser = OpenApiParser::from_file(spec_path)
        .with_context(|| format!("Failed to load OpenAPI document {}", spec_path.display()))?;
    let summary = parser.summary();

    println!("{}", "API Information:".bold());
    println!("  Title: {}", summary.title.yellow());
    println!("  Version: {}", summary.version.yellow());
    if let Some(description) = &summary.description {
        println!("  Description: {}", description);
    }
    println!("  Base URL: {}", parser.base_url());

    if !summary.servers.is_empty() {
        println!("\n{}", "Servers:".bold());
        for server in &summary.servers {
            match &server.description {
                Some(description) => println!("  • {} ({})", server.url, description),
                None => println!("  • {}", server.url),
            }
        }
    }

    println!(
        "\n{} {}",
        "Operations:".bold(),
        summary.operations.len()
    );
    for (method, count) in summary.method_counts() {
        println!("  {:<8} {}", method.to_string(), count);
    }

    if !summary.security_schemes.is_empty() {
        println!("\n{}", "Security schemes:".bold());
        for (name, kind) in &summary.security_schemes {
            println!("  • {} ({})", name.cyan(), kind);
        }
    }

    Ok(())
}

fn endpoints_command(spec_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = GenerationConfig::resolve(config_path).context("Failed to load configuration")?;
    let parser = OpenApiParser::from_file(spec_path)
        .with_context(|| format!("Failed to load OpenAPI document {}", spec_path.display()))?;
    let model = parser
        .build_model(&config)
        .context("Failed to build load-test model")?;

    println!("{} {}", "Endpoints:".bold(), model.endpoints.len());
    for endpoint in &model.endpoints {
        let summary = endpoint.summary.as_deref().unwrap_or("");
        println!(
            "  {:<8} {:<40} {:<32} weight {:<3} {}",
            endpoint.method.to_string().yellow(),
            endpoint.path,
            endpoint.task_name.cyan(),
            endpoint.weight,
            summary
        );
    }
    print_skipped(&model);

    Ok(())
}

fn config_command(config_path: Option<&Path>) -> Result<()> {
    let config = GenerationConfig::resolve(config_path).context("Failed to load configuration")?;
    let yaml = config
        .to_yaml()
        .context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(())
}

fn print_skipped(model: &LoadTestModel) {
    for skipped in &model.skipped {
        eprintln!(
            "{} Skipped {} {}: {}",
            "⚠".yellow(),
            skipped.method,
            skipped.path,
            skipped.reason
        );
    }
}
