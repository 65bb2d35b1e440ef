//! scriptorium - scripture IR toolkit

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use scriptorium::loss::{LossBudget, LossClass, LossReport};
use scriptorium::model::{Corpus, JsonSerializer, hash_corpus, hash_document};
use scriptorium::validate::{validate_corpus, validate_no_unexpected_empty_text};
use scriptorium::versification::{MappingRegistry, MappingTable};
use scriptorium::{Error, Ref, Result};

#[derive(Parser)]
#[command(name = "scriptorium")]
#[command(version, about = "Scripture IR toolkit", long_about = None)]
#[command(after_help = "EXAMPLES:
    scriptorium ref \"John 3:16\" Gen.1.1-3      Parse references
    scriptorium validate kjv.json              Check an IR snapshot
    scriptorium map kjv.json -t kjv-lxx.json --to LXX -o lxx.json
    scriptorium fidelity kjv.json --max L1     Gate on loss class")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse references and print their canonical and human forms
    Ref {
        #[arg(value_name = "REF", required = true)]
        refs: Vec<String>,
    },

    /// Validate an IR snapshot
    Validate {
        #[arg(value_name = "IR")]
        input: PathBuf,
    },

    /// Print the corpus hash and per-document hashes
    Hash {
        #[arg(value_name = "IR")]
        input: PathBuf,
    },

    /// Re-map a corpus into another versification
    Map {
        #[arg(value_name = "IR")]
        input: PathBuf,

        /// Mapping table files (JSON); may be repeated
        #[arg(short, long = "table", value_name = "FILE", required = true)]
        tables: Vec<PathBuf>,

        /// Target versification system
        #[arg(long, value_name = "SYSTEM")]
        to: String,

        /// Output file (default: stdout)
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
    },

    /// Fail unless the corpus loss class is within the limit
    Fidelity {
        #[arg(value_name = "IR")]
        input: PathBuf,

        /// Highest acceptable loss class (L0-L4)
        #[arg(long, value_name = "CLASS")]
        max: LossClass,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                "scriptorium=info"
                    .parse()
                    .unwrap_or_else(|_| LevelFilter::INFO.into()),
            ),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Ref { refs } => show_refs(&refs),
        Command::Validate { input } => validate(&input),
        Command::Hash { input } => hash(&input),
        Command::Map {
            input,
            tables,
            to,
            output,
        } => map(&input, &tables, &to, output.as_deref()),
        Command::Fidelity { input, max } => fidelity(&input, max),
    }
}

fn load_corpus(path: &Path) -> Result<Corpus> {
    Corpus::from_json(&fs::read_to_string(path)?)
}

fn show_refs(refs: &[String]) -> Result<ExitCode> {
    for input in refs {
        let r = Ref::parse(input)?;
        println!("{r}\t{}", r.to_human());
    }
    Ok(ExitCode::SUCCESS)
}

fn validate(path: &Path) -> Result<ExitCode> {
    let corpus = load_corpus(path)?;
    let mut errors = validate_corpus(&corpus);
    errors.extend(validate_no_unexpected_empty_text(&corpus));

    if errors.is_empty() {
        println!("{}: ok", path.display());
        return Ok(ExitCode::SUCCESS);
    }
    for error in &errors {
        println!("{error}");
    }
    eprintln!("{} problem(s) found", errors.len());
    Ok(ExitCode::FAILURE)
}

fn hash(path: &Path) -> Result<ExitCode> {
    let corpus = load_corpus(path)?;
    println!("{}\t{}", hash_corpus(&corpus, &JsonSerializer)?, corpus.id);
    for doc in &corpus.documents {
        println!("{}\t{}", hash_document(doc, &JsonSerializer)?, doc.id);
    }
    Ok(ExitCode::SUCCESS)
}

fn map(input: &Path, tables: &[PathBuf], to: &str, output: Option<&Path>) -> Result<ExitCode> {
    let corpus = load_corpus(input)?;

    let mut registry = MappingRegistry::new();
    for path in tables {
        registry.register_table(MappingTable::from_json(&fs::read_to_string(path)?)?);
    }

    let from = corpus.versification.as_str();
    let table = registry.get_chained_mapping(from, to).ok_or_else(|| {
        Error::InvalidMapping(format!("no mapping from {from:?} to {to:?}"))
    })?;
    info!(table = %table.id, from, to, "applying mapping");

    let (mapped, report) = table.apply_to_corpus(&corpus);
    let json = mapped.to_json()?;
    match output {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    eprintln!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

fn fidelity(path: &Path, max: LossClass) -> Result<ExitCode> {
    let corpus = load_corpus(path)?;
    let report = corpus
        .loss_report
        .clone()
        .unwrap_or_else(|| LossReport::default().with_class(corpus.loss_class));

    let result = LossBudget::new(max).check(Some(&report));
    println!(
        "loss class {} (max {}): {}",
        result.actual_class.unwrap_or(corpus.loss_class),
        result.allowed_class,
        if result.within_budget { "pass" } else { "fail" }
    );
    for violation in &result.violations {
        println!("  {violation}");
    }

    Ok(if result.within_budget {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
