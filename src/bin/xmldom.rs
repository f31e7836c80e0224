//! Command-line front end: parse XML files into a tree and print them back.
//!
//! Files are parsed whole, or fed through a push session in fixed-size
//! chunks with `--chunk-size`. The resulting tree can be printed, searched
//! for an element by name, and queried for an attribute.

use std::fs::File;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::Parser;

use xmldom::parser::{self, PushParser};
use xmldom::serial::{print, print_node};
use xmldom::{Document, NodeId, ParseError};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// xmldom -- parse XML files into a tree and print them back.
#[derive(Parser, Debug)]
#[command(name = "xmldom", version, about, long_about = None)]
struct Cli {
    /// XML files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Put each tag and text segment on its own line.
    #[arg(long)]
    pretty: bool,

    /// Feed the input to the parser in chunks of this many bytes.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    chunk_size: Option<u64>,

    /// Print the first element with this name (case-insensitive) instead of
    /// the whole document.
    #[arg(long, value_name = "NAME")]
    find: Option<String>,

    /// Print the value of this attribute of the selected element.
    #[arg(long, value_name = "NAME")]
    attr: Option<String>,

    /// Do not output the result tree.
    #[arg(long)]
    noout: bool,

    /// Log parser activity to stderr.
    #[arg(long)]
    verbose: bool,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.target().starts_with("xmldom")
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "[{:<5} {}] {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: bool) {
    if verbose && log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Debug);
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut worst_exit = EXIT_SUCCESS;
    for file in &cli.files {
        worst_exit = worst_exit.max(process_file(&cli, file));
    }
    ExitCode::from(worst_exit)
}

/// Processes a single input file and returns an exit code.
fn process_file(cli: &Cli, filename: &str) -> u8 {
    let doc = match parse_input(cli, filename) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_FAILURE;
        }
    };

    let Some(root) = doc.root() else {
        return EXIT_SUCCESS;
    };

    let selected = match cli.find.as_deref() {
        Some(name) => match doc.find_node(root, name) {
            Some(id) => Some(id),
            None => {
                eprintln!("{filename}: no element named <{name}>");
                return EXIT_FAILURE;
            }
        },
        None => None,
    };

    if let Some(attr) = cli.attr.as_deref() {
        let id = selected.unwrap_or(root);
        match doc.find_attr(id, attr) {
            Some(value) => println!("{value}"),
            None => {
                eprintln!(
                    "{filename}: <{}> has no attribute {attr}",
                    doc.node_name(id)
                );
                return EXIT_FAILURE;
            }
        }
    }

    if !cli.noout {
        write_output(&render(&doc, selected, cli.pretty));
    }

    EXIT_SUCCESS
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn parse_input(cli: &Cli, filename: &str) -> Result<Document, ParseError> {
    match (filename, cli.chunk_size) {
        ("-", None) => parser::parse_reader(io::stdin().lock()),
        ("-", Some(size)) => parse_chunked(io::stdin().lock(), size),
        (path, None) => parser::parse_file(path),
        (path, Some(size)) => parse_chunked(File::open(path)?, size),
    }
}

/// Feeds `reader` to a push session `chunk_size` bytes at a time.
fn parse_chunked<R: Read>(mut reader: R, chunk_size: u64) -> Result<Document, ParseError> {
    let mut push = PushParser::new();
    let mut chunk = Vec::new();
    loop {
        chunk.clear();
        let read = reader.by_ref().take(chunk_size).read_to_end(&mut chunk)?;
        let is_final = read == 0;
        push.push(&chunk, is_final)?;
        if is_final {
            break;
        }
        log::debug!(
            target: "xmldom.cli",
            "fed {read} bytes, {} consumed",
            push.bytes_consumed()
        );
    }
    push.finish()
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn render(doc: &Document, selected: Option<NodeId>, pretty: bool) -> String {
    let mut out = match selected {
        Some(id) => print_node(doc, id, pretty),
        None => print(doc, pretty),
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

fn write_output(content: &str) {
    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(content.as_bytes()).and_then(|()| stdout.flush()) {
        eprintln!("failed to write output: {e}");
    }
}
