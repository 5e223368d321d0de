//! Command-line interface for the chordpro utility
//!
//! Everything filesystem- and process-shaped lives here; the library core
//! never does I/O. Input and output arguments accept `-` for stdio.

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use chordpro::logging::init_logging;
use chordpro::{
    chord_line, lint, parse, serialize, steps_between, suggest_canonical_filename, Line,
    SerializeOptions, Song,
};

/// ChordPro - parse, transpose, lint, and preview lead sheets
#[derive(Parser)]
#[command(name = "chordpro")]
#[command(about = "A Rust utility for ChordPro lead sheets")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Normalize a lead sheet into canonical directive form
    Convert {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit legacy header style instead of directives
        #[arg(long)]
        legacy: bool,

        /// Omit the metadata block
        #[arg(long)]
        no_meta: bool,

        /// Print the suggested canonical filename instead of the document
        #[arg(long)]
        filename: bool,
    },

    /// Transpose every chord (and the key) of a lead sheet
    Transpose {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Semitones to shift (may be negative)
        #[arg(long, allow_hyphen_values = true, conflicts_with = "to_key")]
        steps: Option<i32>,

        /// Target key; the shift is derived from the document key
        #[arg(long)]
        to_key: Option<String>,

        /// Prefer flat spellings in the result
        #[arg(long)]
        flat: bool,
    },

    /// Report structural and content warnings
    Lint {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Emit warnings as JSON
        #[arg(long)]
        json: bool,
    },

    /// Monospace preview with chords above the lyrics
    Preview {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Main CLI application
pub struct ChordProApp;

impl ChordProApp {
    pub fn new() -> Self {
        Self
    }

    /// Resolve logging settings: environment variables win over CLI flags.
    pub fn logging_settings(cli: &Cli) -> (String, String) {
        let level = std::env::var("CHORDPRO_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| cli.log_level.as_str().to_string());
        let format = std::env::var("CHORDPRO_LOG_FORMAT")
            .ok()
            .unwrap_or_else(|| cli.log_format.as_str().to_string());
        (level, format)
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        let (level, format) = Self::logging_settings(&cli);
        if let Err(e) = init_logging(Some(&level), Some(&format)) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("chordpro v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Convert {
                input,
                output,
                legacy,
                no_meta,
                filename,
            } => self.convert_command(input, output, legacy, no_meta, filename, cli.verbose),
            Commands::Transpose {
                input,
                output,
                steps,
                to_key,
                flat,
            } => self.transpose_command(input, output, steps, to_key, flat, cli.verbose),
            Commands::Lint { input, json } => self.lint_command(input, json, cli.verbose),
            Commands::Preview { input, output } => self.preview_command(input, output, cli.verbose),
        }
    }

    fn convert_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        legacy: bool,
        no_meta: bool,
        filename: bool,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let song = parse(&content);

        if filename {
            let title = song.title.as_deref().unwrap_or("");
            self.write_output(output, &suggest_canonical_filename(title))?;
            return Ok(());
        }

        let opts = SerializeOptions {
            use_directives: !legacy,
            include_meta: !no_meta,
        };
        self.write_output(output, &serialize(&song, &opts))
    }

    fn transpose_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        steps: Option<i32>,
        to_key: Option<String>,
        flat: bool,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        let song = parse(&content);

        let steps = match (steps, &to_key) {
            (Some(n), _) => n,
            (None, Some(target)) => {
                let from = song
                    .key
                    .as_deref()
                    .ok_or_else(|| anyhow!("document has no {{key}}; use --steps instead"))?;
                steps_between(from, target) as i32
            }
            (None, None) => bail!("either --steps or --to-key is required"),
        };

        if verbose {
            eprintln!("Transposing by {} semitone(s)", steps);
        }

        let mut transposed = song.transposed(steps, flat);
        if let Some(target) = to_key {
            // keep the caller's spelling of the target key
            transposed.key = Some(target);
        }
        self.write_output(output, &serialize(&transposed, &SerializeOptions::default()))
    }

    fn lint_command(&self, input: Option<PathBuf>, json: bool, verbose: bool) -> Result<()> {
        let content = self.read_input(input)?;
        let warnings = lint(&content);

        if verbose {
            eprintln!("{} warning(s)", warnings.len());
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&warnings)?);
        } else if warnings.is_empty() {
            println!("No warnings.");
        } else {
            for warning in &warnings {
                println!("{}", warning);
            }
        }

        if warnings.is_empty() {
            Ok(())
        } else {
            bail!("{} lint warning(s)", warnings.len())
        }
    }

    fn preview_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        let song = parse(&content);
        if verbose {
            eprintln!("Previewing {} section(s)", song.sections.len());
        }
        self.write_output(output, &render_preview(&song))
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => fs::write(&path, content)
                .map_err(|e| anyhow!("Failed to write output file '{}': {}", path.display(), e)),
            _ => {
                if content.is_empty() || content.ends_with('\n') {
                    print!("{}", content);
                } else {
                    println!("{}", content);
                }
                io::stdout().flush()?;
                Ok(())
            }
        }
    }
}

impl Default for ChordProApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a monospace preview: chords sit on their own line above the
/// lyrics, instrumentals as chord rows, comments in parentheses.
fn render_preview(song: &Song) -> String {
    let mut out: Vec<String> = Vec::new();

    if let Some(title) = song.title.as_deref() {
        out.push(title.to_string());
    }
    if let Some(key) = song.key.as_deref() {
        out.push(format!("Key: {}", key));
    }
    if let Some(capo) = song.capo {
        out.push(format!("Capo: {}", capo));
    }
    if !out.is_empty() {
        out.push(String::new());
    }

    for sec in &song.sections {
        out.push(format!("[{}]", sec.label));
        for line in &sec.lines {
            match line {
                Line::Lyric { lyrics, chords } => {
                    let above = chord_line(lyrics, chords);
                    if !above.is_empty() {
                        out.push(above);
                    }
                    out.push(lyrics.clone());
                }
                Line::Comment { comment } => out.push(format!("({})", comment)),
                Line::Instrumental { instrumental } => {
                    let mut row = instrumental.chords.join("  //  ");
                    if let Some(n) = instrumental.repeat {
                        if row.is_empty() {
                            row = format!("x{}", n);
                        } else {
                            row.push_str(&format!(" x{}", n));
                        }
                    }
                    out.push(row);
                }
            }
        }
        out.push(String::new());
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}
