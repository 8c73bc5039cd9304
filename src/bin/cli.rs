//! Command-line front end: parse quantity expressions or link unit
//! strings and print the results as JSON.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use quinex::QuantityParser;

#[derive(Parser)]
#[command(name = "quinex", version, about = "Parse free-text quantity expressions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse quantity expressions (arguments, or stdin lines).
    Parse {
        /// Expressions to parse; reads stdin when empty.
        expressions: Vec<String>,
        /// Collapse the positional uncertainty slots into one field.
        #[arg(long)]
        simplify: bool,
        /// Fail with a non-zero exit code on unparseable input.
        #[arg(long)]
        strict: bool,
    },
    /// Link a unit string to QUDT unit classes.
    Unit {
        units: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Parse {
            expressions,
            simplify,
            strict,
        } => {
            let parser = QuantityParser::new().error_if_no_success(strict);
            for expression in inputs(expressions)? {
                let result = parser
                    .parse_with_options(&expression, simplify)
                    .with_context(|| format!("failed to parse {expression:?}"))?;
                serde_json::to_writer(&mut out, &result)?;
                writeln!(out)?;
            }
        }
        Command::Unit { units } => {
            let parser = QuantityParser::new();
            for unit in inputs(units)? {
                let linked = parser.unit_parser().parse(&unit);
                serde_json::to_writer(&mut out, &linked)?;
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

fn inputs(args: Vec<String>) -> Result<Vec<String>> {
    if !args.is_empty() {
        return Ok(args);
    }
    let stdin = std::io::stdin();
    let lines: Result<Vec<String>, _> = stdin.lock().lines().collect();
    let lines = lines.context("reading stdin")?;
    Ok(lines.into_iter().filter(|l| !l.trim().is_empty()).collect())
}
