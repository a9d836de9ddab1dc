use pest::Parser as _;
use pest_derive::Parser;

use crate::ast::{Condition, Operator, ParsedBlock, SkipReason, SkippedLine};

#[derive(Parser)]
#[grammar = "rule_line.pest"]
struct Parser;

type Pairs<'a> = pest::iterators::Pairs<'a, Rule>;

/// Keywords tried against the lowercased line, first hit wins. `unfilter`
/// has to come before `filter` since it contains it.
const KEYWORDS: &[(&str, Operator)] = &[
    ("exclude", Operator::Exclude),
    ("unfilter", Operator::Exclude),
    ("filter", Operator::Match),
];

fn find_interior(pairs: Pairs<'_>) -> Option<String> {
    pairs
        .flatten()
        .find(|pair| pair.as_rule() == Rule::interior)
        .map(|pair| pair.as_str().to_owned())
}

fn search(rule: Rule, line: &str) -> Option<String> {
    Parser::parse(rule, line).ok().and_then(find_interior)
}

fn classify(line: &str) -> Option<Operator> {
    let lowered = line.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|&(_, operator)| operator)
}

/// Parses a single rule line such as
/// `Exclude line where column "A (ColA Name)" = "val1"`.
pub fn parse_line(line: &str) -> Result<Condition, SkipReason> {
    let line = line.trim();
    if line.is_empty() {
        return Err(SkipReason::Blank);
    }

    let column = search(Rule::column_search, line).ok_or(SkipReason::MissingColumn)?;
    let value = search(Rule::value_search, line).ok_or(SkipReason::MissingValue)?;
    let operator = classify(line).ok_or(SkipReason::NoKeyword)?;

    Ok(Condition {
        column,
        value,
        operator,
    })
}

/// Parses every line of a rule block. Lines that don't match the grammar are
/// dropped but reported in `skipped`, blank lines are dropped silently.
pub fn parse_block(raw_text: &str) -> ParsedBlock {
    let mut block = ParsedBlock::default();

    for (i, line) in raw_text.split('\n').enumerate() {
        match parse_line(line) {
            Ok(condition) => block.conditions.push(condition),
            Err(SkipReason::Blank) => {}
            Err(reason) => block.skipped.push(SkippedLine {
                line_number: i + 1,
                text: line.trim().to_owned(),
                reason,
            }),
        }
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_search_takes_first_column_token() {
        let line = r#"Filter column "A" or column "B" contain "x""#;
        assert_eq!(search(Rule::column_search, line).as_deref(), Some("A"));
    }

    #[test]
    fn test_column_keyword_is_case_sensitive() {
        assert_eq!(search(Rule::column_search, r#"Filter Column "A" = "x""#), None);
    }

    #[test]
    fn test_value_search_requires_quote_at_end() {
        assert_eq!(
            search(Rule::value_search, r#"column "A" = "x" and more"#),
            None
        );
        assert_eq!(
            search(Rule::value_search, r#"column "A" = "x" "y""#).as_deref(),
            Some("y")
        );
    }

    #[test]
    fn test_empty_quotes_are_not_tokens() {
        assert_eq!(search(Rule::column_search, r#"exclude column "" = "x""#), None);
    }

    #[test]
    fn test_classify_precedence() {
        assert_eq!(classify("EXCLUDE then filter"), Some(Operator::Exclude));
        assert_eq!(classify("Unfilter it"), Some(Operator::Exclude));
        assert_eq!(classify("filter, contains"), Some(Operator::Match));
        assert_eq!(classify("keep only"), None);
    }
}
