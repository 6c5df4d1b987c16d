//! Rewrite Gateway
//!
//! Command-line front end for the URL rewrite engine.
//!
//! # Architecture Overview
//!
//! ```text
//!                ┌──────────────────────────────────────────────────────────┐
//!                │                     REWRITE GATEWAY                      │
//!                │                                                          │
//!   raw URL      │  ┌──────────┐    ┌──────────┐    ┌────────────────────┐  │
//!   ─────────────┼─▶│ template │───▶│ rewrite  │───▶│ rule / flow engine │  │
//!                │  │  parse   │    │ matcher  │    │  all / any steps   │  │
//!                │  └──────────┘    └──────────┘    └─────────┬──────────┘  │
//!                │                                            │             │
//!                │                                            ▼             │
//!   rewritten    │  ┌──────────┐    ┌──────────┐    ┌────────────────────┐  │
//!   ◀────────────┼──│ template │◀───│ rewriter │◀───│ function registry  │◀─┼── service
//!                │  │  format  │    │          │    │ (memoized, bounded)│  │   registry
//!                │  └──────────┘    └──────────┘    └────────────────────┘  │
//!                │                                                          │
//!                │  config (TOML + watcher) · observability · console       │
//!                └──────────────────────────────────────────────────────────┘
//! ```

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use rewrite_gateway::config::load_config;
use rewrite_gateway::console::Console;
use rewrite_gateway::observability::logging;
use rewrite_gateway::{template, Direction, Gateway};

#[derive(Parser)]
#[command(name = "rewrite-gateway")]
#[command(version, about = "URL rewrite engine for API gateways", long_about = None)]
struct Cli {
    /// Configuration file.
    #[arg(short, long, global = true, default_value = "gateway.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, validate and compile the configuration
    Check,
    /// Rewrite one or more URLs
    Rewrite {
        /// request (inbound) or response (outbound)
        #[arg(short, long, default_value = "request")]
        direction: Direction,

        /// Print one JSON object per URL
        #[arg(long)]
        json: bool,

        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Interactive rewrite console on stdin/stdout
    Console {
        /// Reload rules when the configuration file changes
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Serialize)]
struct RewriteRecord<'a> {
    input: &'a str,
    direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.observability);
    tracing::info!(config = ?cli.config, "rewrite-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let gateway = Arc::new(Gateway::from_config(&config)?);

    match cli.command {
        Commands::Check => {
            println!(
                "{}: {} rules, {} services OK",
                cli.config.display(),
                gateway.engine().rules().len(),
                gateway.services().len()
            );
        }
        Commands::Rewrite {
            direction,
            json,
            urls,
        } => {
            let mut failures = 0;
            for url in &urls {
                let record = rewrite_one(&gateway, url, direction);
                if record.error.is_some() {
                    failures += 1;
                }
                if json {
                    println!("{}", serde_json::to_string(&record)?);
                } else if let Some(error) = &record.error {
                    eprintln!("{url}: {error}");
                } else if let Some(output) = &record.output {
                    println!("{output}");
                }
            }
            if failures > 0 {
                return Err(format!("{failures} of {} URLs could not be rewritten", urls.len()).into());
            }
        }
        Commands::Console { watch } => {
            // Keep the watcher alive for the lifetime of the console.
            let _watcher = if watch {
                let (watcher, updates) = gateway.watcher(&cli.config);
                let handle = watcher.run()?;
                tokio::spawn(gateway.clone().watch(updates));
                Some(handle)
            } else {
                None
            };

            let engine = gateway.engine().clone();
            let handled = tokio::task::spawn_blocking(move || {
                Console::new(engine, io::stdin(), io::stdout()).run()
            })
            .await??;
            tracing::info!(commands = handled, "Console closed");
        }
    }

    Ok(())
}

fn rewrite_one<'a>(gateway: &Gateway, url: &'a str, direction: Direction) -> RewriteRecord<'a> {
    let mut record = RewriteRecord {
        input: url,
        direction,
        output: None,
        rule: None,
        error: None,
    };
    match template::parse_url(url) {
        Ok(input) => {
            let outcome = gateway.engine().evaluate(direction, &input);
            record.output = Some(match &outcome.rule {
                Some(_) => template::format(&outcome.template),
                None => url.to_string(),
            });
            record.rule = outcome.rule;
        }
        Err(e) => record.error = Some(e.to_string()),
    }
    record
}
