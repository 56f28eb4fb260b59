use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use abc::DecodeOptions;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{LevelFilter, Log, Metadata, Record};

#[derive(Debug, Parser)]
#[command(name = "abc")]
#[command(about = "Decode ABC music notation into JSON or YAML", long_about = None)]
struct Cli {
    input: PathBuf,
    output: Option<PathBuf>,
    /// Accept input without the `%abc-<version>` first line
    #[arg(long)]
    no_file_check: bool,
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,
    /// YAML file holding decoder options
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn load_options(cli: &Cli) -> anyhow::Result<DecodeOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            serde_yaml::from_str(&text)
                .with_context(|| format!("invalid config: {}", path.display()))?
        }
        None => DecodeOptions::default(),
    };
    if cli.no_file_check {
        options.check_version_line = false;
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    log::set_logger(&LOGGER).map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;
    log::set_max_level(level_for(cli.verbose));

    let options = load_options(&cli)?;
    let source = fs::read(&cli.input)
        .with_context(|| format!("failed to read: {}", cli.input.display()))?;

    let document = abc::decode_with_options(&source, options)
        .with_context(|| format!("decode failed: {}", cli.input.display()))?;

    let text = match cli.format {
        Format::Json => serde_json::to_string_pretty(&document).context("failed to serialize json")?,
        Format::Yaml => serde_yaml::to_string(&document).context("failed to serialize yaml")?,
    };

    match &cli.output {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("failed to write: {}", path.display()))?;
            log::info!("wrote {} tune(s) to {}", document.tunes.len(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", text).context("failed to write to stdout")?;
        }
    }

    Ok(())
}
