//! Command-line front end: reads a delimited visit log and writes the two
//! frequency reports as delimited text.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use visits::{
    io::{DelimitedSink, DelimitedSource},
    logging::init_logging,
    model::{PairFrequency, VisitorFrequency},
    AnalysisConfig, MalformedPolicy, RunStats, VisitAnalysis, VisitorOrder,
};

/// Finds the most frequent visitors and the visitor pairs most often seen
/// on the same day.
#[derive(Clone, Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Input visit log, one visit per row, with a header line.
    input: PathBuf,

    /// Where to write the visitor frequency report.
    visitor_output: PathBuf,

    /// Where to write the visitor pair frequency report.
    pair_output: PathBuf,

    /// YAML configuration file.  Flags below override its settings.
    #[clap(long, env = "VISITS_CONFIG")]
    config: Option<PathBuf>,

    /// Number of rows in each report.
    #[clap(long, env = "VISITS_TOP_N")]
    top_n: Option<usize>,

    /// Number of shard worker threads.
    #[clap(long, env = "VISITS_WORKERS")]
    workers: Option<usize>,

    /// Order used to orient pairs and break ties.
    #[clap(long, env = "VISITS_VISITOR_ORDER", value_enum)]
    visitor_order: Option<VisitorOrder>,

    /// Handling of rows with an empty required field.
    #[clap(long, env = "VISITS_MALFORMED", value_enum)]
    malformed: Option<MalformedPolicy>,

    /// The input lists all visits of a date together.  Each date is then
    /// released once the next one starts; a date that reappears is an error.
    #[clap(long, env = "VISITS_DATE_GROUPED")]
    date_grouped: bool,

    /// Field delimiter of the input (a single ASCII character or `tab`).
    #[clap(long, default_value = ",", value_parser = parse_delimiter)]
    input_delimiter: u8,

    /// Field delimiter of both reports (a single ASCII character or `tab`).
    #[clap(long, default_value = "tab", value_parser = parse_delimiter)]
    output_delimiter: u8,

    /// Print run statistics as YAML to stderr when done.
    #[clap(long)]
    stats: bool,
}

impl Cli {
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_yaml_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        if let Some(top_n) = self.top_n {
            config.top_n = top_n;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(order) = self.visitor_order {
            config.visitor_order = order;
        }
        if let Some(malformed) = self.malformed {
            config.malformed = malformed;
        }
        if self.date_grouped {
            config.date_grouped = true;
        }
        Ok(config)
    }
}

fn parse_delimiter(s: &str) -> std::result::Result<u8, String> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(format!("`{s}` is not a single ASCII character")),
        },
    }
}

/// Runs the analysis and writes both reports.  Report files are created
/// only once the analysis has succeeded.
fn execute(cli: &Cli) -> Result<RunStats> {
    let analysis = VisitAnalysis::new(cli.analysis_config()?)?;

    let source = DelimitedSource::from_path(&cli.input, cli.input_delimiter)
        .with_context(|| format!("opening {}", cli.input.display()))?;
    let output = analysis
        .analyze(source)
        .with_context(|| format!("analyzing {}", cli.input.display()))?;

    let visitor_sink =
        DelimitedSink::create(&cli.visitor_output, cli.output_delimiter, &VisitorFrequency::HEADER)
            .with_context(|| format!("creating {}", cli.visitor_output.display()))?;
    let pair_sink =
        DelimitedSink::create(&cli.pair_output, cli.output_delimiter, &PairFrequency::HEADER)
            .with_context(|| format!("creating {}", cli.pair_output.display()))?;
    let stats = output
        .write(visitor_sink, pair_sink)
        .context("writing reports")?;

    info!(
        "wrote {} and {}",
        cli.visitor_output.display(),
        cli.pair_output.display()
    );
    Ok(stats)
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let stats = execute(&cli)?;
    if cli.stats {
        eprint!("{}", serde_yaml::to_string(&stats)?);
    }
    Ok(())
}
