use std::path::PathBuf;

use itertools::Itertools;
use thiserror::Error;

use crate::ast::BlockLabel;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Source table not found: {}", path.display())]
    SourceNotFound { path: PathBuf },
    #[error("Missing {} rules in source table", format_labels(missing))]
    MissingRuleBlock { missing: Vec<BlockLabel> },
    #[error("Table error: {0}")]
    Table(String),
    #[error("Config error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

fn format_labels(labels: &[BlockLabel]) -> String {
    labels.iter().join(" and ")
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Self::Table(e.to_string())
    }
}

impl From<calamine::Error> for Error {
    fn from(e: calamine::Error) -> Self {
        Self::Table(e.to_string())
    }
}
