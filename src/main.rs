use std::path::PathBuf;

use anyhow::{Context, Result};
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use painless_rules::{open_table, run, GeneratorConfig, JsonFileSink};

/// Compiles Numerator/Denominator rule text into a scripted-metric query.
#[derive(Debug, StructOpt)]
#[structopt(name = "painless-rules")]
struct Opt {
    /// Workbook (.xlsx, .xls, .ods) or CSV table holding the Numerator and Denominator rows
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Where to write the JSON query document
    #[structopt(parse(from_os_str))]
    output: PathBuf,

    /// JSON file with the query filter fields
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[structopt(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    init_tracing(opt.verbose);

    let config = match &opt.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };

    let table = open_table(&opt.input)?;
    let mut sink = JsonFileSink::new(&opt.output);
    run(table.as_ref(), &config, &mut sink).with_context(|| {
        format!(
            "Failed to generate {} from {}",
            opt.output.display(),
            opt.input.display()
        )
    })?;

    info!(output = %sink.path().display(), "done");
    Ok(())
}
