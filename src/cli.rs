//! CLI: descriptor tables → (single model schema | full document)
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::json;

use docsynth::config::{GuardPolicy, KeyOrdering, SynthConfig};
use docsynth::document::{sort_keys, Document, Info, Server};
use docsynth::logging::{self, LogFormat};
use docsynth::synth::{token, Container, ModelOptions, Synthesis, Synthesizer};
use docsynth::table::TypeTable;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// synthesize JSON schemas and example payloads from model descriptor tables
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    /// more log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// synthesize one model and print its schema and example
    Schema(SchemaOut),
    /// register every model in the tables and print the API document
    Doc(DocOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more descriptor tables. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// synthesis config file (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// how many times one type may be expanded
    #[arg(long)]
    depth_bound: Option<u32>,

    /// what the recursion guard counts
    #[arg(long, value_enum)]
    guard: Option<GuardPolicy>,

    /// how declaration order is kept in the output
    #[arg(long, value_enum)]
    ordering: Option<KeyOrdering>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// model name in the tables
    #[arg(long)]
    model: String,

    /// document the model as a list
    #[arg(long)]
    array: bool,

    /// single-line output
    #[arg(long)]
    compact: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DocOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[arg(long, default_value = docsynth::document::DEFAULT_TITLE)]
    title: String,

    /// API version reported in `info.version`
    #[arg(long, default_value = docsynth::document::DEFAULT_VERSION)]
    api_version: String,

    #[arg(long)]
    description: Option<String>,

    /// server URL; repeatable
    #[arg(long)]
    server: Vec<String>,

    /// key the document is served under
    #[arg(long, default_value = "/docs")]
    key: String,

    /// single-line output
    #[arg(long)]
    compact: bool,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_tables(&self) -> Result<TypeTable> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut table = TypeTable::new();
        for source_path in source_paths {
            let loaded = TypeTable::from_file(&source_path)
                .with_context(|| format!("failed to load {}", source_path.display()))?;
            tracing::info!(path = %source_path.display(), types = loaded.len(), "loaded table");
            table.merge(loaded)
                .with_context(|| format!("while merging {}", source_path.display()))?;
        }
        for name in table.unresolved() {
            eprintln!("{} no descriptor for `{name}`; it will be documented as an empty object", "warning:".yellow().bold());
        }
        Ok(table)
    }

    fn synth_config(&self) -> Result<SynthConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => SynthConfig::from_json_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => SynthConfig::default(),
        };
        if let Some(bound) = self.depth_bound {
            config = config.with_depth_bound(bound);
        }
        if let Some(guard) = self.guard {
            config = config.with_guard(guard);
        }
        if let Some(ordering) = self.ordering {
            config = config.with_ordering(ordering);
        }
        Ok(config)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        let format = if self.log_json { LogFormat::Json } else { LogFormat::Compact };
        logging::init(self.verbose, format);
        match &self.cmd {
            Command::Schema(target) => target.run(),
            Command::Doc(target) => target.run(),
        }
    }
}

impl SchemaOut {
    fn run(&self) -> Result<()> {
        let table = self.input_settings.load_tables()?;
        let config = self.input_settings.synth_config()?;
        let ty = table.require(&self.model)?;

        let container = if self.array { Container::Array } else { Container::Object };
        let synth = Synthesizer::new(&config, &table);
        let Some(out) = synth.synthesize(ty, &ModelOptions::default(), container) else {
            bail!("model `{}` produced nothing", self.model);
        };
        report(&out);

        let value = json!({
            "name": out.name,
            "schema": out.schema.to_json(),
            "example": out.example.to_json(),
        });
        let text = match config.ordering {
            KeyOrdering::Declaration => render(&value, self.compact)?,
            KeyOrdering::Tokens => token::strip(&render(&sort_keys(value), self.compact)?, &out.tokens),
        };
        write_output(self.out.as_deref(), &text)
    }
}

impl DocOut {
    fn run(&self) -> Result<()> {
        let table = self.input_settings.load_tables()?;
        let config = self.input_settings.synth_config()?;

        let info = Info {
            title: self.title.clone(),
            version: self.api_version.clone(),
            description: self.description.clone(),
            ..Info::default()
        };
        let doc = self.server.iter().fold(
            Document::new(&self.key).with_info(info).with_config(config),
            |doc, url| doc.with_server(Server::new(url)),
        );

        // synthesize in parallel, register in table order
        let options = ModelOptions::default();
        let synth = Synthesizer::new(doc.config(), &table);
        let descriptors = table.descriptors().collect::<Vec<_>>();
        let results = descriptors
            .par_iter()
            .map(|ty| synth.synthesize(ty, &options, Container::Object))
            .collect::<Vec<_>>();
        for out in results.into_iter().flatten() {
            report(&out);
            doc.components().insert(out, &options);
        }
        eprintln!(
            "{} {} models registered",
            "done:".green().bold(),
            doc.components().len(),
        );

        let text = doc.encode(!self.compact)?;
        write_output(self.out.as_deref(), &text)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn report(out: &Synthesis) {
    if !out.truncated.is_empty() {
        eprintln!(
            "{} `{}`: recursion cut at {}",
            "note:".cyan().bold(),
            out.name,
            out.truncated.join(", "),
        );
    }
    if !out.unresolved.is_empty() {
        eprintln!(
            "{} `{}`: unresolved {}",
            "warning:".yellow().bold(),
            out.name,
            out.unresolved.join(", "),
        );
    }
}

fn render(value: &serde_json::Value, compact: bool) -> Result<String> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(text)
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, text)
                .with_context(|| format!("failed to write {}", out.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), out.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
