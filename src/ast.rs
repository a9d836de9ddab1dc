use std::fmt;

pub type ColumnName = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockLabel {
    Numerator,
    Denominator,
}

impl BlockLabel {
    /// Lowercase marker searched for in a row's label cell.
    pub fn marker(self) -> &'static str {
        match self {
            BlockLabel::Numerator => "numerator",
            BlockLabel::Denominator => "denominator",
        }
    }
}

impl fmt::Display for BlockLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockLabel::Numerator => f.write_str("Numerator"),
            BlockLabel::Denominator => f.write_str("Denominator"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleBlock {
    pub label: BlockLabel,
    pub raw_text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    /// Accumulate only when the field differs from the value.
    Exclude,
    /// Accumulate only when the field equals the value.
    Match,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Condition {
    pub column: ColumnName,
    pub value: String,
    pub operator: Operator,
}

/// Why a rule line produced no condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    MissingColumn,
    MissingValue,
    NoKeyword,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::Blank => "blank line",
            SkipReason::MissingColumn => "no quoted column name after `column`",
            SkipReason::MissingValue => "line does not end with a quoted value",
            SkipReason::NoKeyword => "no exclude/filter/unfilter keyword",
        };
        f.write_str(reason)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based position of the line inside its block.
    pub line_number: usize,
    pub text: String,
    pub reason: SkipReason,
}

/// The conditions of one rule block, in line order, plus the lines that were
/// dropped on the way.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedBlock {
    pub conditions: Vec<Condition>,
    pub skipped: Vec<SkippedLine>,
}
