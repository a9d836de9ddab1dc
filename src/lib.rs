pub mod ast;
pub mod compiler;
pub mod config;
pub mod error;
pub mod locator;
pub mod parser;
pub mod query;


use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

pub use compiler::{assemble, compile_block, evaluate_reduce, ScriptTriple, ShardState};
pub use config::GeneratorConfig;
pub use error::{Error, Result};
pub use locator::{locate, open_table, CsvTable, TableSource, XlsxTable};
pub use parser::{parse_block, parse_line};
pub use query::{FilterParams, QueryDocument};

/// Whatever persists the finished document.
pub trait DocumentSink {
    fn write(&mut self, document: &QueryDocument) -> Result<()>;
}

/// Writes pretty JSON to a file. The document goes to a sibling temporary
/// file first and is renamed into place.
#[derive(Clone, Debug)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl DocumentSink for JsonFileSink {
    fn write(&mut self, document: &QueryDocument) -> Result<()> {
        let bytes = document.to_json_pretty()?;
        let temp = self.temp_path();
        if let Err(e) = fs::write(&temp, bytes).and_then(|()| fs::rename(&temp, &self.path)) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        info!(path = %self.path.display(), "wrote query document");
        Ok(())
    }
}

/// Locates both rule blocks, compiles them and wraps the scripts into the
/// aggregation query.
pub fn generate(table: &dyn TableSource, filter: &FilterParams) -> Result<QueryDocument> {
    let (numerator, denominator) = locate(table)?;
    let numerator = compiler::compile_rule_block(&numerator);
    let denominator = compiler::compile_rule_block(&denominator);
    let scripts = assemble(&numerator, &denominator);
    Ok(QueryDocument::build(scripts, filter))
}

/// [`generate`], then hand the document to `sink`. Nothing reaches the sink
/// unless generation succeeded.
pub fn run(
    table: &dyn TableSource,
    config: &GeneratorConfig,
    sink: &mut dyn DocumentSink,
) -> Result<QueryDocument> {
    let document = generate(table, &config.filter)?;
    sink.write(&document)?;
    Ok(document)
}
