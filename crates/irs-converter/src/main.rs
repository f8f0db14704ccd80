//! CLI tool for converting and validating IRS information-return files.
//!
//! # Usage
//!
//! ```bash
//! # Positional file to JSON
//! irs-converter convert --input IRSTAX.txt --output-format json --output irstax.json
//!
//! # JSON back to a positional file with CRLF line endings
//! irs-converter convert -i irstax.json --output-format irs --crlf -o IRSTAX.txt
//!
//! # Validation report on stdout, exit code 1 when errors are found
//! cat IRSTAX.txt | irs-converter validate --input-format irs --rules structure,control-totals
//! ```
//!
//! Logging goes to stderr and is controlled through `RUST_LOG`.

use std::fs::{self, File};
use std::io::{Read, Write, stdin, stdout};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use irs_codec::{
    Decoded, Document, Finding, Format, IrsWriter, LineEnding, RuleCategory, ValidationReport, Validator,
    portable::{to_json, to_json_compact},
};
use tracing::{debug, warn};

/// Convert and validate IRS Publication 1220 files.
#[derive(Parser, Debug)]
#[command(name = "irs-converter")]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a file between the positional and the JSON format.
    Convert(ConvertArgs),
    /// Validate a file and write the report as JSON.
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
struct Source {
    /// Input file path. If not specified, reads from stdin.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Input format. Inferred from the file extension or the content when omitted.
    #[arg(long, value_enum)]
    input_format: Option<FormatArg>,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    source: Source,

    /// Output format.
    #[arg(long, value_enum)]
    output_format: FormatArg,

    /// Output file path. If not specified, writes to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Terminate positional records with CRLF instead of LF.
    #[arg(long)]
    crlf: bool,

    /// Write JSON on a single line.
    #[arg(long)]
    compact: bool,

    /// Fail when the input has decode findings instead of skipping damaged records.
    #[arg(long)]
    strict: bool,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[command(flatten)]
    source: Source,

    /// Comma-separated rule categories. Every implemented category by default.
    #[arg(long, value_delimiter = ',')]
    rules: Vec<RuleCategory>,

    /// Report file path. If not specified, writes to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Fixed-width 750-byte records.
    Irs,
    /// Portable JSON tree.
    Json,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Irs => Format::Irs,
            FormatArg::Json => Format::Json,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    match Cli::parse().command {
        Command::Convert(args) => run_convert(&args),
        Command::Validate(args) => run_validate(&args),
    }
}

fn run_convert(args: &ConvertArgs) -> Result<()> {
    let decoded = load(&args.source)?;
    if !decoded.is_clean() {
        log_findings(&decoded.findings);
        if args.strict {
            bail!("Input has {} decode finding(s)", decoded.findings.len());
        }
        eprintln!("Input has {} decode finding(s), damaged records were skipped", decoded.findings.len());
    }

    let line_ending = if args.crlf { LineEnding::CrLf } else { LineEnding::Lf };
    let (bytes, count) = convert(&decoded.document, args.output_format.into(), line_ending, args.compact)?;

    let mut output = open_output(args.output.as_deref())?;
    output.write_all(&bytes).context("Failed to write output")?;
    output.flush().context("Failed to flush output")?;

    eprintln!("Converted {count} record(s)");
    Ok(())
}

fn run_validate(args: &ValidateArgs) -> Result<()> {
    let decoded = load(&args.source)?;
    let validator = if args.rules.is_empty() {
        Validator::default()
    } else {
        Validator::default().with_categories(args.rules.iter().copied())
    };
    let report = build_report(decoded, &validator);

    let mut output = open_output(args.output.as_deref())?;
    let json = report.to_json().context("Failed to serialize report")?;
    writeln!(output, "{json}").context("Failed to write report")?;
    output.flush().context("Failed to flush output")?;

    eprintln!("{} error(s), {} warning(s)", report.errors.len(), report.warnings.len());
    if !report.is_valid() {
        bail!("Validation failed with {} error(s)", report.errors.len());
    }
    Ok(())
}

/// Reads and decodes the input, resolving its format.
fn load(source: &Source) -> Result<Decoded> {
    let bytes = match &source.input {
        Some(path) => {
            fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))?
        }
        None => {
            let mut bytes = Vec::new();
            stdin().lock().read_to_end(&mut bytes).context("Failed to read stdin")?;
            bytes
        }
    };

    let format = resolve_format(source.input_format.map(Format::from), source.input.as_deref(), &bytes);
    debug!(%format, bytes = bytes.len(), "decoding input");
    irs_codec::read(&bytes, format).with_context(|| format!("Failed to decode {format} input"))
}

/// Explicit selector, then file extension, then content sniffing.
fn resolve_format(explicit: Option<Format>, path: Option<&Path>, bytes: &[u8]) -> Format {
    explicit
        .or_else(|| path.and_then(Path::extension).and_then(|ext| ext.to_str()).and_then(Format::from_extension))
        .unwrap_or_else(|| Format::detect(bytes))
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdout().lock()),
    })
}

fn log_findings(findings: &[Finding]) {
    for finding in findings {
        warn!(record = finding.record_index, rule = %finding.rule, "{}", finding.message);
    }
}

/// Renders `document` in `format`; returns the bytes and the number of records.
///
/// Nothing is written anywhere, so a failed encode leaves no partial output.
fn convert(document: &Document, format: Format, line_ending: LineEnding, compact: bool) -> Result<(Vec<u8>, usize)> {
    match format {
        Format::Irs => {
            let mut writer = IrsWriter::new(Vec::new()).with_line_ending(line_ending);
            writer.write_document(document).context("Failed to encode document")?;
            let count = writer.records_written();
            Ok((writer.into_inner().context("Failed to encode document")?, count))
        }
        Format::Json => {
            let json = if compact { to_json_compact(document) } else { to_json(document) };
            Ok((json.context("Failed to serialize document")?, document.records().count()))
        }
    }
}

/// Decode findings come first, followed by the validator's.
fn build_report(decoded: Decoded, validator: &Validator) -> ValidationReport {
    let findings = validator.validate(&decoded.document);
    ValidationReport::from_findings(decoded.findings.into_iter().chain(findings))
}
