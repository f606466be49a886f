//! CLI tool for adding a customer name to PowerPoint files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pptx_name_core::{EditOutcome, EditReport, Error, DEFAULT_PLACEHOLDER};
use pptx_name_pptx::{NameInserter, SaveTarget};
use std::path::PathBuf;
use std::process::ExitCode;

/// Put a customer name into a PowerPoint presentation.
#[derive(Parser, Debug)]
#[command(name = "pptx-name")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print the result as JSON instead of progress messages
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add the name to the first slide unless it is already there
    Insert {
        /// Presentation to edit (.pptx)
        source: PathBuf,

        /// Name to add
        name: String,

        /// "true" writes <source>_updated.pptx, anything else edits in place
        save_as_new: String,
    },

    /// Copy a template and add the name to the copy's first slide
    Template {
        /// Template presentation, left untouched
        template: PathBuf,

        /// Where to write the personalised copy
        output: PathBuf,

        /// Name to add
        name: String,
    },

    /// Replace a placeholder with the name on every slide
    Substitute {
        /// Presentation to read
        input: PathBuf,

        /// Where to write the result
        output: PathBuf,

        /// Name to substitute
        name: String,

        /// Placeholder token to replace
        #[arg(short, long, default_value = DEFAULT_PLACEHOLDER)]
        token: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match describe_failure(&e) {
                Failure::Stdout(message) => println!("{}", message),
                Failure::Stderr(message) => eprintln!("{}", message),
            }
            ExitCode::from(FAILURE)
        }
    }
}

/// Exit status of every failed run.
const FAILURE: u8 = 1;

/// What a failed run prints, and where.
#[derive(Debug, PartialEq, Eq)]
enum Failure {
    Stdout(&'static str),
    Stderr(String),
}

/// Missing inputs get a terse line on stdout; anything else is reported
/// on stderr with its whole context chain.
fn describe_failure(err: &anyhow::Error) -> Failure {
    match err.chain().find_map(|cause| cause.downcast_ref::<Error>()) {
        Some(Error::SourceNotFound(_)) => Failure::Stdout("File not found"),
        Some(Error::TemplateNotFound(_)) => Failure::Stdout("Template file not found"),
        _ => Failure::Stderr(format!("Error: {:#}", err)),
    }
}

fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Insert {
            source,
            name,
            save_as_new,
        } => {
            let target = SaveTarget::from_save_as_new(parse_flag(save_as_new));
            let report = NameInserter::new()
                .insert_if_absent(source, &target, name)
                .with_context(|| format!("Failed to update {}", source.display()))?;

            if args.json {
                return print_json(&report);
            }
            print_insert_outcome(&report);
            if matches!(target, SaveTarget::InPlace) {
                println!("Saved updated file: {}", report.output.display());
            } else {
                println!("Saved as new file: {}", report.output.display());
            }
        }
        Command::Template {
            template,
            output,
            name,
        } => {
            let report = NameInserter::new()
                .insert_from_template(template, output, name)
                .with_context(|| format!("Failed to create {}", output.display()))?;

            if args.json {
                return print_json(&report);
            }
            print_insert_outcome(&report);
            println!("Saved to: {}", report.output.display());
        }
        Command::Substitute {
            input,
            output,
            name,
            token,
        } => {
            let report = NameInserter::new()
                .with_placeholder(token.as_str())
                .substitute_placeholder(input, output, name)
                .with_context(|| format!("Failed to update {}", input.display()))?;

            if args.json {
                return print_json(&report);
            }
            if args.verbose {
                if let EditOutcome::Substituted {
                    shapes,
                    occurrences,
                } = report.outcome
                {
                    eprintln!("  Replaced {} occurrence(s) in {} shape(s)", occurrences, shapes);
                }
            }
            println!("PPT updated successfully");
        }
    }

    Ok(())
}

/// The `save_as_new` argument is true only when it reads "true" in any case.
fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn print_insert_outcome(report: &EditReport) {
    match report.outcome {
        EditOutcome::AlreadyPresent => println!("Name already exists: {}", report.name),
        _ => println!("Added name at bottom-left in white: {}", report.name),
    }
}

fn print_json(report: &EditReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}
