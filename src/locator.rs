use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;

use crate::ast::{BlockLabel, RuleBlock};
use crate::error::{Error, Result};

pub type Row = Vec<String>;

/// Anything that can hand over its rows of string cells, top to bottom.
pub trait TableSource {
    fn rows(&self) -> Result<Vec<Row>>;
}

impl TableSource for Vec<Row> {
    fn rows(&self) -> Result<Vec<Row>> {
        Ok(self.clone())
    }
}

/// Headerless CSV file, one label and one rule cell per row. Rule cells may
/// span several lines when quoted.
#[derive(Clone, Debug)]
pub struct CsvTable {
    path: PathBuf,
}

impl CsvTable {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            path: existing_path(path.as_ref())?,
        })
    }
}

fn existing_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::SourceNotFound {
            path: path.to_owned(),
        });
    }
    Ok(path.to_owned())
}

impl TableSource for CsvTable {
    fn rows(&self) -> Result<Vec<Row>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;

        let mut rows = vec![];
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_owned).collect());
        }
        Ok(rows)
    }
}

/// First worksheet of a spreadsheet workbook (xlsx, xlsb, xls, ods). Cells
/// are rendered as text and rows keep their column offset from `A`.
#[derive(Clone, Debug)]
pub struct XlsxTable {
    path: PathBuf,
}

impl XlsxTable {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            path: existing_path(path.as_ref())?,
        })
    }
}

impl TableSource for XlsxTable {
    fn rows(&self) -> Result<Vec<Row>> {
        let mut workbook = open_workbook_auto(&self.path)?;
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => return Err(Error::Table("workbook has no worksheets".to_owned())),
        };
        let offset = range.start().map_or(0, |(_, col)| col as usize);

        Ok(range
            .rows()
            .map(|cells| {
                std::iter::repeat(String::new())
                    .take(offset)
                    .chain(cells.iter().map(ToString::to_string))
                    .collect()
            })
            .collect())
    }
}

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Picks the table reader from the file extension, CSV unless it names a
/// spreadsheet.
pub fn open_table(path: impl AsRef<Path>) -> Result<Box<dyn TableSource>> {
    let path = path.as_ref();
    let is_spreadsheet = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        });

    if is_spreadsheet {
        Ok(Box::new(XlsxTable::open(path)?))
    } else {
        Ok(Box::new(CsvTable::open(path)?))
    }
}

fn label_of(cell: &str) -> Option<BlockLabel> {
    let cell = cell.trim().to_lowercase();
    [BlockLabel::Numerator, BlockLabel::Denominator]
        .into_iter()
        .find(|label| cell.contains(label.marker()))
}

/// Finds the numerator and denominator rule texts. A later row with the same
/// label replaces an earlier one.
pub fn locate_rows(rows: &[Row]) -> Result<(RuleBlock, RuleBlock)> {
    let mut numerator = None;
    let mut denominator = None;

    for row in rows {
        let label = match row.first().and_then(|cell| label_of(cell)) {
            Some(label) => label,
            None => continue,
        };
        let text = row.get(1).map(|cell| cell.trim()).unwrap_or_default();
        let slot = match label {
            BlockLabel::Numerator => &mut numerator,
            BlockLabel::Denominator => &mut denominator,
        };
        *slot = Some(text.to_owned());
    }

    // An empty rule cell counts as a missing block.
    let numerator = numerator.filter(|text| !text.is_empty());
    let denominator = denominator.filter(|text| !text.is_empty());

    match (numerator, denominator) {
        (Some(numerator), Some(denominator)) => Ok((
            RuleBlock {
                label: BlockLabel::Numerator,
                raw_text: numerator,
            },
            RuleBlock {
                label: BlockLabel::Denominator,
                raw_text: denominator,
            },
        )),
        (numerator, denominator) => {
            let mut missing = vec![];
            if numerator.is_none() {
                missing.push(BlockLabel::Numerator);
            }
            if denominator.is_none() {
                missing.push(BlockLabel::Denominator);
            }
            Err(Error::MissingRuleBlock { missing })
        }
    }
}

pub fn locate(table: &dyn TableSource) -> Result<(RuleBlock, RuleBlock)> {
    locate_rows(&table.rows()?)
}
