use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ds485_core::protocols::daemon::{CommandId, DaemonError, PduReassembler, decode_pdu};
use ds485_core::protocols::{from_hex, to_hex};
use ds485_core::{AnalysisConfig, ChunkSource, ReaderSource};
use glob::glob;
use serde_json::json;

mod logging;

use logging::{LogFormat, LogLevel, init_logging};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("DS485SHARK_BUILD_COMMIT"),
    ", ",
    env!("DS485SHARK_BUILD_DATE"),
    ")"
);

const EXAMPLES: &str = "Examples:\n  ds485shark pcap analyse capture.pcapng -o report.json\n  ds485shark pcap analyze capture.pcap --stdout --pretty\n  ds485shark decode --hex 0203002304000003";

#[derive(Parser, Debug)]
#[command(name = "ds485shark")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Offline decoder for dS485 daemon-socket traffic.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Diagnostic log level (stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Diagnostic log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG inputs.
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
    /// Decode a raw daemon byte stream into one JSON record per PDU.
    Decode(DecodeArgs),
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Analyse a capture file and generate a versioned JSON report.
    #[command(alias = "analyze")]
    #[command(after_help = EXAMPLES)]
    Analyse(AnalyseArgs),
}

#[derive(Args, Debug)]
struct AnalyseArgs {
    /// Path to a .pcap or .pcapng file
    input: PathBuf,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Exit with a non-zero code if compliance violations are present
    #[arg(long)]
    strict: bool,

    /// List compliance violations after analysis
    #[arg(long)]
    list_violations: bool,

    /// TCP port carrying daemon traffic; repeat to add more (replaces the defaults)
    #[arg(long = "port", value_name = "PORT")]
    ports: Vec<u16>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Hex-encoded bytes; whitespace and ':' separators are ignored
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    hex: Option<String>,

    /// File holding raw daemon bytes, `-` for stdin
    file: Option<PathBuf>,

    /// Pretty-print each record
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let result = match cli.command {
        Commands::Pcap {
            command: PcapCommands::Analyse(args),
        } => cmd_pcap_analyse(args),
        Commands::Decode(args) => cmd_decode(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_pcap_analyse(args: AnalyseArgs) -> Result<(), CliError> {
    let AnalyseArgs {
        input,
        report,
        stdout,
        pretty,
        compact,
        quiet,
        strict,
        list_violations,
        ports,
    } = args;

    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let report = match (stdout, report) {
        (true, _) => None,
        (false, Some(report)) => Some(report),
        (false, None) => {
            return Err(CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            ));
        }
    };

    if let Some(report_path) = report.as_ref() {
        ensure_distinct_output(report_path, &input_abs)?;
    }

    let meta = fs::metadata(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;
    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }

    let mut config = AnalysisConfig::default();
    if !ports.is_empty() {
        config.ports = ports;
    }
    tracing::info!(input = %resolved_input.display(), ports = ?config.ports, "analysing capture");

    let rep = ds485_core::analyze_pcap_file_with(&resolved_input, &config)
        .context("PCAP/PCAPNG analysis failed")?;
    let json = serialize_json(&rep, pretty, compact)?;

    match report {
        None => print!("{}", json),
        Some(report) => {
            if let Some(parent) = report.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&report, json)
                .with_context(|| format!("Failed to write report: {}", report.display()))?;
            if !quiet {
                eprintln!("OK: report written -> {}", report.display());
            }
        }
    }

    if list_violations && !quiet {
        print_violations(&rep);
    }
    if strict && has_violations(&rep) {
        return Err(CliError::new(
            "compliance violations detected",
            Some("use --list-violations to inspect".to_string()),
        ));
    }
    Ok(())
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let parent = match report_path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => return Ok(()),
    };
    // A directory that does not exist yet cannot hold the input.
    let report_dir = match fs::canonicalize(parent) {
        Ok(dir) => dir,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context(format!(
                    "Failed to resolve output path: {}",
                    report_path.display()
                ))
                .into());
        }
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path: {}", report_path.display()))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn cmd_decode(args: DecodeArgs) -> Result<(), CliError> {
    let reader: Box<dyn Read> = match (&args.hex, &args.file) {
        (Some(text), _) => Box::new(Cursor::new(parse_hex_arg(text)?)),
        (None, Some(path)) if path.as_os_str() == "-" => Box::new(io::stdin().lock()),
        (None, Some(path)) => Box::new(
            File::open(path)
                .with_context(|| format!("Failed to open input: {}", path.display()))?,
        ),
        (None, None) => {
            return Err(CliError::new(
                "missing input",
                Some("use --hex or pass a file".to_string()),
            ));
        }
    };

    let mut source = ReaderSource::new(reader);
    let mut reassembler = PduReassembler::new();
    let mut records = 0u64;
    while let Some(chunk) = source
        .next_chunk()
        .context("Failed to read decode input")?
    {
        for result in reassembler.push(&chunk) {
            let record = match result {
                Ok(pdu) => match decode_pdu(&pdu) {
                    Ok(decoded) => serde_json::to_value(&decoded)
                        .context("JSON serialization failed")?,
                    Err(err) => decode_error_record(&pdu, &err),
                },
                Err(err) => json!({ "error": err.to_string() }),
            };
            println!("{}", serialize_json(&record, args.pretty, false)?);
            records += 1;
        }
    }

    tracing::info!(records, bytes = source.bytes_read(), "decode finished");
    let leftover = reassembler.buffered_len();
    if leftover > 0 {
        eprintln!("warning: {leftover} trailing bytes do not form a complete PDU");
    }
    Ok(())
}

/// Envelope fields survive a payload decode failure; the reassembler only
/// yields PDUs whose 3-byte header is complete.
fn decode_error_record(pdu: &[u8], err: &DaemonError) -> serde_json::Value {
    let mut record = json!({ "error": err.to_string(), "raw": to_hex(pdu) });
    if let [command, lo, hi, ..] = *pdu {
        record["command"] = json!(CommandId::from_u8(command));
        record["raw_length"] = json!(u16::from_le_bytes([lo, hi]));
    }
    record
}

fn parse_hex_arg(text: &str) -> Result<Vec<u8>, CliError> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    let cleaned = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .unwrap_or(&cleaned);
    from_hex(cleaned).ok_or_else(|| {
        CliError::new(
            "invalid hex input",
            Some("expected an even number of hex digits, e.g. 020300".to_string()),
        )
    })
}

fn serialize_json<T: serde::Serialize>(
    value: &T,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn has_violations(rep: &ds485_core::Report) -> bool {
    rep.compliance
        .iter()
        .any(|entry| !entry.violations.is_empty())
}

fn print_violations(rep: &ds485_core::Report) {
    let mut entries: Vec<_> = rep.compliance.iter().collect();
    entries.sort_by(|a, b| a.protocol.cmp(&b.protocol));
    eprintln!("Compliance violations:");
    for entry in entries {
        let mut violations = entry.violations.clone();
        violations.sort_by(|a, b| a.id.cmp(&b.id));
        for violation in violations {
            eprintln!(
                "  {} {} ({})",
                entry.protocol, violation.id, violation.count
            );
        }
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut message = format!("multiple files match pattern '{}' ({} matches)", pattern, count);
            let listed: Vec<String> = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect();
            message.push_str("; matches: ");
            message.push_str(&listed.join(", "));
            if count > 3 {
                message.push_str(", ...");
            }
            Err(CliError::new(
                message,
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
