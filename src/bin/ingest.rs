use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use walkdir::WalkDir;

use supplier_ingest::logger::{log_error, log_info, set_log_file, set_log_prefix};
use supplier_ingest::{
    CsvSink, ImportOptions, ImportReport, JsonLinesSink, SupplierImporter, inspect_path,
};

#[derive(Parser)]
#[command(
    name = "ingest",
    version,
    about = "Validate supplier spreadsheets and export their records"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import one or more spreadsheets into JSON Lines or CSV files.
    Import(ImportArgs),
    /// Print the worksheet header and data row count.
    Inspect(InspectArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SinkKind {
    Jsonl,
    Csv,
}

#[derive(Parser, Clone)]
struct ImportArgs {
    /// Input files or directories (recurses directories).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory (computed file names).
    #[arg(long, conflicts_with = "out")]
    out_dir: Option<PathBuf>,

    /// Output file (only valid with a single input).
    #[arg(long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = SinkKind::Jsonl)]
    sink: SinkKind,

    /// Worker threads per import. Defaults to the available parallelism.
    #[arg(long)]
    jobs: Option<usize>,

    /// Records per sink call.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Stop on the first failed input.
    #[arg(long)]
    fail_fast: bool,

    /// Also write diagnostics to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Parser, Clone)]
struct InspectArgs {
    input: PathBuf,
    /// Emit JSON instead of human readable output.
    #[arg(long)]
    json: bool,
}

type AnyError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), AnyError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Import(args) => run_import(&args),
        Command::Inspect(args) => run_inspect(&args),
    }
}

fn run_import(args: &ImportArgs) -> Result<(), AnyError> {
    if let Some(path) = &args.log_file {
        set_log_file(path)?;
    }

    let files = discover_inputs(&args.inputs);
    if files.is_empty() {
        return Err("no .xlsx inputs found".into());
    }
    if args.out.is_some() && files.len() != 1 {
        return Err("--out requires a single input".into());
    }

    let tasks: Vec<(PathBuf, PathBuf)> = match &args.out {
        Some(out) => files.into_iter().map(|input| (input, out.clone())).collect(),
        None => files
            .into_iter()
            .map(|input| {
                let output = compute_output_path(&input, args);
                (input, output)
            })
            .collect(),
    };

    let options = import_options(args);
    let process = |(input, output): (PathBuf, PathBuf)| -> Result<(), AnyError> {
        let _prefix = set_log_prefix(input.display().to_string());
        let result = import_one(&input, &output, args.sink, options);
        if let Err(err) = &result {
            log_error(&err.to_string());
        }
        result
    };

    if args.fail_fast {
        tasks
            .into_par_iter()
            .map(process)
            .collect::<Result<Vec<_>, _>>()?;
    } else {
        let failures = tasks
            .into_par_iter()
            .map(process)
            .filter(Result::is_err)
            .count();
        if failures > 0 {
            return Err(format!("completed with {failures} failures").into());
        }
    }
    Ok(())
}

fn import_options(args: &ImportArgs) -> ImportOptions {
    let mut options = ImportOptions::new();
    if let Some(jobs) = args.jobs {
        options = options.with_workers(jobs);
    }
    if let Some(size) = args.batch_size {
        options = options.with_batch_size(size);
    }
    options
}

fn import_one(
    input: &Path,
    output: &Path,
    kind: SinkKind,
    options: ImportOptions,
) -> Result<(), AnyError> {
    let started = Instant::now();
    let file = BufWriter::new(File::create(output)?);
    let report = match kind {
        SinkKind::Jsonl => {
            let importer = SupplierImporter::new(JsonLinesSink::new(file)).with_options(options);
            let report = importer.import_path(input)?;
            importer.into_sink().into_inner()?;
            report
        }
        SinkKind::Csv => {
            let importer = SupplierImporter::new(CsvSink::new(file)).with_options(options);
            let report = importer.import_path(input)?;
            importer.into_sink().into_inner()?;
            report
        }
    };
    log_info(&summary(&report, output, started));
    Ok(())
}

fn summary(report: &ImportReport, output: &Path, started: Instant) -> String {
    format!(
        "{} rows -> {} records in {} batches -> {} ({:.2?})",
        report.rows,
        report.records,
        report.batches,
        output.display(),
        started.elapsed()
    )
}

fn run_inspect(args: &InspectArgs) -> Result<(), AnyError> {
    let summary = inspect_path(&args.input)?;
    if args.json {
        serde_json::to_writer_pretty(std::io::stdout(), &summary)?;
        println!();
    } else {
        println!(
            "Worksheet: {}  Data rows: {}  Shared strings: {}",
            summary.worksheet, summary.data_rows, summary.shared_strings
        );
        for (index, name) in summary.header.iter().enumerate() {
            println!(
                "[{index:>2}] {letters:<3} {name}",
                letters = supplier_ingest::parser::column_letters(index)
            );
        }
    }
    Ok(())
}

fn discover_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .follow_links(false)
                .into_iter()
                .filter_map(Result::ok)
            {
                let path = entry.path();
                if path.is_file() && is_xlsx(path) {
                    files.push(path.to_path_buf());
                }
            }
        } else if input.is_file() && is_xlsx(input) {
            files.push(input.clone());
        }
    }
    files.sort();
    files.dedup();
    files
}

fn is_xlsx(path: &Path) -> bool {
    let is_lock_file = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("~$"));
    !is_lock_file && path.extension().is_some_and(|e| e.eq_ignore_ascii_case("xlsx"))
}

fn compute_output_path(input: &Path, args: &ImportArgs) -> PathBuf {
    use std::ffi::OsStr;
    let new_ext = match args.sink {
        SinkKind::Jsonl => "jsonl",
        SinkKind::Csv => "csv",
    };
    args.out_dir.as_ref().map_or_else(
        || input.with_extension(new_ext),
        |dir| {
            let fname = input.file_name().unwrap_or_else(|| OsStr::new("output"));
            dir.join(PathBuf::from(fname).with_extension(new_ext))
        },
    )
}
