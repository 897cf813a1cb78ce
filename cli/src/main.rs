use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scrubrs::codec::{escape_href, escape_html, unescape_html};
use scrubrs::{Html, HtmlOptions, Preset, Sanitizer, SanitizerConfig};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scrubrs")]
#[command(about = "Sanitize untrusted HTML against an allow-list policy", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sanitize HTML
    Sanitize {
        /// HTML to sanitize; read from --file or stdin when absent
        #[arg(short, long)]
        input: Option<String>,

        /// File containing the HTML
        #[arg(short, long, conflicts_with = "input")]
        file: Option<PathBuf>,

        /// Built-in policy
        #[arg(short, long, value_enum, default_value_t = PresetArg::Default)]
        preset: PresetArg,

        /// JSON policy file; overrides --preset
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Re-escape every text node
        #[arg(long)]
        escape_text: bool,

        /// Print a JSON report with timings instead of the bare HTML
        #[arg(long)]
        json: bool,

        /// Parser memory ceiling in bytes
        #[arg(long)]
        max_memory: Option<usize>,
    },

    /// Escape text for HTML output
    Escape {
        input: String,

        /// Leave `'` and `/` alone
        #[arg(long)]
        insecure: bool,

        /// Use the href profile (percent-encoding)
        #[arg(long, conflicts_with = "insecure")]
        href: bool,
    },

    /// Decode HTML entities
    Unescape { input: String },

    /// Print the effective policy of a preset as JSON
    Policy {
        #[arg(value_enum)]
        preset: PresetArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PresetArg {
    Default,
    Restricted,
    Basic,
    Relaxed,
}

impl From<PresetArg> for Preset {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Default => Preset::Default,
            PresetArg::Restricted => Preset::Restricted,
            PresetArg::Basic => Preset::Basic,
            PresetArg::Relaxed => Preset::Relaxed,
        }
    }
}

#[derive(Serialize, Debug)]
struct Report {
    output: String,
    stats: Vec<StatEntry>,
}

#[derive(Serialize, Debug)]
struct StatEntry {
    label: String,
    count: usize,
    millis: f64,
}

fn read_input(input: Option<String>, file: Option<&Path>) -> Result<Vec<u8>> {
    if let Some(input) = input {
        return Ok(input.into_bytes());
    }
    if let Some(path) = file {
        return fs::read(path).with_context(|| format!("Failed to read file: {:?}", path));
    }

    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read stdin")?;
    Ok(buffer)
}

fn load_config(preset: PresetArg, path: Option<&Path>) -> Result<SanitizerConfig> {
    let Some(path) = path else {
        return Ok(Preset::from(preset).config());
    };

    let text = fs::read_to_string(path).with_context(|| format!("Failed to read config: {:?}", path))?;
    let config = serde_json::from_str(&text)
        .map_err(|err| scrubrs::Error::InvalidConfig(err.to_string()))
        .with_context(|| format!("Failed to parse config: {:?}", path))?;
    info!(path = %path.display(), "loaded policy");
    Ok(config)
}

#[allow(clippy::too_many_arguments)]
fn run_sanitize(
    input: Option<String>,
    file: Option<PathBuf>,
    preset: PresetArg,
    config: Option<PathBuf>,
    escape_text: bool,
    json: bool,
    max_memory: Option<usize>,
) -> Result<()> {
    let config = load_config(preset, config.as_deref())?;
    let sanitizer = Sanitizer::from_config(&config).context("Invalid policy")?;

    let mut options = HtmlOptions {
        measure: json,
        escape_text,
        ..HtmlOptions::default()
    };
    if let Some(limit) = max_memory {
        options.memory.max_allowed_memory_usage = limit;
        options.memory.preallocated_parsing_buffer_size = options.memory.preallocated_parsing_buffer_size.min(limit);
    }

    let html = read_input(input, file.as_deref())?;
    debug!(bytes = html.len(), "sanitizing");

    let mut session = Html::new(Some(sanitizer), Vec::new(), options)?;
    let output = session.rewrite(&html).context("Sanitization failed")?;

    let mut stdout = io::stdout().lock();
    if json {
        let stats = session
            .stats()
            .map(|stats| {
                stats
                    .entries()
                    .iter()
                    .map(|stat| StatEntry {
                        label: stat.label.clone(),
                        count: stat.count,
                        millis: stat.millis,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let report = Report { output, stats };
        serde_json::to_writer_pretty(&mut stdout, &report).context("Failed to write report")?;
        writeln!(stdout)?;
    } else {
        stdout.write_all(output.as_bytes())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sanitize {
            input,
            file,
            preset,
            config,
            escape_text,
            json,
            max_memory,
        } => run_sanitize(input, file, preset, config, escape_text, json, max_memory)?,

        Commands::Escape { input, insecure, href } => {
            let escaped = if href {
                escape_href(&input)
            } else {
                escape_html(&input, !insecure)
            };
            println!("{}", escaped);
        }

        Commands::Unescape { input } => {
            println!("{}", unescape_html(&input));
        }

        Commands::Policy { preset } => {
            let config = Preset::from(preset).config();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
