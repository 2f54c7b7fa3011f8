//! generate python graphql clients from a codegen project
//!
//! `pygql-codegen generate` reads `codegen.yml`, renders every configured
//! output, and writes it next to the config. `pygql-codegen prune` applies
//! the generated `remove_empty` post-processing to a captured json response.

use clap::{Parser, Subcommand};
use pygql_codegen::{generate, prune_empty, write, ProjectConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pygql-codegen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every output of a codegen project
    Generate {
        /// Project config file
        #[arg(short, long, default_value = "codegen.yml")]
        config: PathBuf,

        /// Print outputs instead of writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Drop empty objects and arrays from a json response
    Prune {
        /// Json file to prune
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli.command).await {
        eprintln!("pygql-codegen failed: {err}");
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> pygql_codegen::Result<()> {
    match command {
        Commands::Generate { config, dry_run } => {
            let project = ProjectConfig::load(&config).await?;
            let files = generate(&project).await?;
            if dry_run {
                for file in &files {
                    println!("# {}\n{}", file.path.display(), file.content);
                }
                return Ok(());
            }
            write(&files).await
        }
        Commands::Prune { file } => {
            let text = tokio::fs::read_to_string(&file).await?;
            let value: serde_json::Value = serde_json::from_str(&text)?;
            println!("{}", serde_json::to_string_pretty(&prune_empty(value))?);
            Ok(())
        }
    }
}
