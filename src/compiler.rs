use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ast::{BlockLabel, Condition, Operator, ParsedBlock, RuleBlock};
use crate::parser::parse_block;

/// Numeric document field summed into `state.map.var`.
pub const NUMERATOR_FIELD: &str = "ColL Name";
/// Numeric document field summed into `state.map.var1`.
pub const DENOMINATOR_FIELD: &str = "ColJ Name";

pub const INIT_SCRIPT: &str = "state['map'] =['var': 0.0,'var1' : 0.0,'var2' : 0.0]";
pub const COMBINE_SCRIPT: &str = "return state";

/// Separator between the numerator and denominator fragments of the map
/// script. Applied even when a fragment is empty.
pub const MAP_FRAGMENT_SEPARATOR: &str = "  ";

/// Quotes `s` as a single-quoted Painless string literal.
fn painless_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn source_field(column: &str) -> String {
    format!("params['_source'][{}]", painless_string(column))
}

impl Condition {
    pub fn to_painless(&self) -> String {
        let field = source_field(&self.column);
        let value = painless_string(&self.value);
        match self.operator {
            Operator::Exclude => format!("{}!= {}", field, value),
            Operator::Match => format!("{} == {}", field, value),
        }
    }
}

/// A guarded update of the three per-shard accumulators.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccumulationStatement {
    pub guard: Vec<Condition>,
}

impl AccumulationStatement {
    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    /// An empty guard emits nothing: a block without conditions never
    /// accumulates.
    pub fn to_painless(&self) -> String {
        if self.guard.is_empty() {
            return String::new();
        }

        let guard = self.guard.iter().map(Condition::to_painless).join(" && ");
        format!(
            "if({}){{state.map.var += (doc[{}].value);state.map.var1 += (doc[{}].value);state.map.var2++;}}",
            guard,
            painless_string(NUMERATOR_FIELD),
            painless_string(DENOMINATOR_FIELD),
        )
    }
}

impl From<ParsedBlock> for AccumulationStatement {
    fn from(parsed: ParsedBlock) -> Self {
        Self {
            guard: parsed.conditions,
        }
    }
}

pub fn compile_block(raw_text: &str) -> AccumulationStatement {
    parse_block(raw_text).into()
}

/// Like [`compile_block`], but logs what was dropped while parsing.
pub fn compile_rule_block(block: &RuleBlock) -> AccumulationStatement {
    let parsed = parse_block(&block.raw_text);
    for skipped in &parsed.skipped {
        warn!(
            block = %block.label,
            line = skipped.line_number,
            reason = %skipped.reason,
            text = %skipped.text,
            "skipping rule line"
        );
    }
    debug!(
        block = %block.label,
        conditions = parsed.conditions.len(),
        skipped = parsed.skipped.len(),
        "compiled rule block"
    );
    if parsed.conditions.is_empty() {
        warn!(block = %block.label, "rule block has no conditions, it will never accumulate");
    }

    parsed.into()
}

/// Ordered map-script fragments with a fixed join rule.
#[derive(Clone, Debug, Default)]
pub struct MapScriptBuilder {
    fragments: Vec<(BlockLabel, String)>,
}

impl MapScriptBuilder {
    pub fn push(&mut self, label: BlockLabel, statement: &AccumulationStatement) -> &mut Self {
        self.fragments.push((label, statement.to_painless()));
        self
    }

    pub fn build(&self) -> String {
        self.fragments
            .iter()
            .map(|(_, fragment)| fragment.as_str())
            .join(MAP_FRAGMENT_SEPARATOR)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTriple {
    pub init_script: String,
    pub map_script: String,
    pub combine_script: String,
    pub reduce_script: String,
}

pub fn reduce_script() -> String {
    [
        "def return_map = ['Final_Performance': 0.0,'Final_Numerator': 0.0, 'Final_Denominator': 0.0]; ",
        "def new_map = ['num1': 0.0, 'num2': 0.0, 'num3': 0.0, 'num': 0.0, 'den': 0.0]; ",
        "for(a in states){new_map.num1 += (a.map.var); new_map.num2 += (a.map.var1); new_map.num3 += (a.map.var2); ",
        "if(new_map.num3 != 0){new_map.num = (new_map.num1*((new_map.num2/new_map.num3)*100))/100.00;} ",
        "new_map.den += a.map.var;} ",
        "if(new_map.den!=0){return_map.Final_Performance = Math.floor((float)(new_map.num)/(new_map.den)*10000.0)/100.0}",
        "else{return_map.Final_Performance ='';return_map.SL_Met=5;}",
        "return_map.Final_Denominator = new_map.den;",
        "return_map.Final_Numerator = new_map.num; return return_map;",
    ]
    .concat()
}

pub fn assemble(numerator: &AccumulationStatement, denominator: &AccumulationStatement) -> ScriptTriple {
    let map_script = MapScriptBuilder::default()
        .push(BlockLabel::Numerator, numerator)
        .push(BlockLabel::Denominator, denominator)
        .build();

    ScriptTriple {
        init_script: INIT_SCRIPT.to_owned(),
        map_script,
        combine_script: COMBINE_SCRIPT.to_owned(),
        reduce_script: reduce_script(),
    }
}

/// The accumulator map one shard hands to the reduce phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardState {
    pub var: f64,
    pub var1: f64,
    pub var2: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReduceOutcome {
    /// `None` when the denominator sum is zero.
    pub performance: Option<f64>,
    pub numerator: f64,
    pub denominator: f64,
    pub sl_met: Option<i64>,
}

/// Evaluates the arithmetic of [`reduce_script`] over a set of shard states.
pub fn evaluate_reduce(states: &[ShardState]) -> ReduceOutcome {
    let (mut num1, mut num2, mut num3) = (0.0_f64, 0.0_f64, 0.0_f64);
    let (mut num, mut den) = (0.0_f64, 0.0_f64);

    for a in states {
        num1 += a.var;
        num2 += a.var1;
        num3 += a.var2;
        if num3 != 0.0 {
            num = (num1 * ((num2 / num3) * 100.0)) / 100.00;
        }
        // Mirrors the script: the denominator sums the numerator accumulator.
        den += a.var;
    }

    let (performance, sl_met) = if den != 0.0 {
        // `(float)` in the script narrows the numerator before dividing.
        let narrowed = num as f32 as f64;
        (Some((narrowed / den * 10000.0).floor() / 100.0), None)
    } else {
        (None, Some(5))
    };

    ReduceOutcome {
        performance,
        numerator: num,
        denominator: den,
        sl_met,
    }
}
