#![allow(clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{IsTerminal, Write};

use enumlint_cli::args::{CliArgs, OutputFormat};
use enumlint_cli::config::resolve_options;
use enumlint_cli::driver;
use enumlint_cli::reporter::{JsonReport, Reporter};

const EXIT_SUCCESS: i32 = 0;
const EXIT_FINDINGS: i32 = 1;
const EXIT_ERROR: i32 = 2;

fn main() {
    // Subscriber only when ENUMLINT_LOG or RUST_LOG is set.
    enumlint_cli::tracing_config::init_tracing();

    let args = CliArgs::parse();
    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(EXIT_ERROR);
        }
    }
}

fn run(args: &CliArgs) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let options = resolve_options(args, &cwd)?;
    let result = driver::run(&options.rule, &options.driver)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Json => {
            let report = JsonReport::from_run(&result, &options.rule);
            serde_json::to_writer_pretty(&mut out, &report)
                .context("failed to write JSON report")?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            let pretty = args.pretty().unwrap_or_else(|| stdout.is_terminal());
            let mut reporter = Reporter::new(pretty);
            for file in &result.files {
                reporter.add_source(file.path.display().to_string(), file.source.clone());
            }
            let diagnostics: Vec<_> = result.diagnostics().cloned().collect();
            write!(out, "{}", reporter.render(&diagnostics))?;
            if !diagnostics.is_empty() || result.applied_count() > 0 {
                write!(out, "\n{}", reporter.summary(&result))?;
            }

            for file in &result.files {
                for err in &file.fix_errors {
                    eprintln!("warning: could not fix {}: {err}", file.path.display());
                }
            }
            for err in &result.errors {
                eprintln!("error: {}", err.message);
            }
        }
    }
    out.flush()?;

    if !result.errors.is_empty() {
        Ok(EXIT_ERROR)
    } else if result.diagnostic_count() > 0 {
        Ok(EXIT_FINDINGS)
    } else {
        Ok(EXIT_SUCCESS)
    }
}
