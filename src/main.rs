use clap::{Parser, Subcommand};
use quire::{build, config, output, scan};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Overrides `-v` when set, e.g. `QUIRE_LOG=quire=debug`.
const LOG_ENV: &str = "QUIRE_LOG";

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Static site compiler for markdown pages")]
#[command(long_about = "\
Static site compiler for markdown pages

Every markdown file becomes a page at a clean URL. Frontmatter supplies the
title, labels and template; the body is markdown with :::html raw blocks,
:::children listings and {attribute} links.

Content structure:

  content/
  ├── config.toml                  # Site config (optional)
  ├── index.md                     # → /
  ├── 010-about.md                 # → /about/ (numbered = shown in nav)
  ├── 020-Blog/
  │   ├── index.md                 # → /blog/ (:::children lists the posts)
  │   └── first-post.md            # → /blog/first-post/
  ├── notes.md                     # → /notes/ (no number = hidden from nav)
  ├── templates/                   # *.html skeletons with {{tags}}
  ├── components/                  # *.toml custom tag manifests
  └── assets/                      # copied to the output root

Run 'quire gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile every page and write the site
    Build,
    /// Compile every page without writing anything
    Check,
    /// Print the page index as JSON
    Index,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Build => {
            println!("==> Scanning {}", cli.source.display());
            let site = scan::scan(&cli.source)?;
            output::print_scan_output(&site);

            println!("==> Building → {}", cli.output.display());
            let report = build::run(&site, Some(cli.output.as_path()))?;
            output::print_build_output(&report, Some(cli.output.as_path()));
            if !report.is_clean() {
                return Err(format!("{} page(s) failed", report.failures.len()).into());
            }
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let site = scan::scan(&cli.source)?;
            output::print_scan_output(&site);
            let report = build::run(&site, None)?;
            output::print_build_output(&report, None);
            if !report.is_clean() {
                return Err(format!("{} page(s) failed", report.failures.len()).into());
            }
            println!("==> Content is valid");
        }
        Command::Index => {
            let report = build::check(&cli.source)?;
            println!("{}", serde_json::to_string_pretty(&report.index)?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for `index` output.
fn init_logging(verbosity: u8) {
    let directive = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .try_init();
}
