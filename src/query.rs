use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::compiler::ScriptTriple;

pub const AGGREGATION_NAME: &str = "group_by_sl_met";

/// Field names and values of the static filter. They come from configuration
/// and are substituted verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub sla_field: String,
    pub sla_value: Value,
    pub used_flag_field: String,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            sla_field: "childslaId".to_owned(),
            sla_value: Value::String("childSLAId".to_owned()),
            used_flag_field: "useInComputation".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryDocument {
    pub aggs: Aggregations,
    pub size: u64,
    pub query: Query,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aggregations {
    pub group_by_sl_met: ScriptedMetricAggregation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptedMetricAggregation {
    pub scripted_metric: ScriptedMetric,
}

/// Field order here is the serialized key order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedMetric {
    pub map_script: String,
    pub init_script: String,
    pub reduce_script: String,
    pub combine_script: String,
}

impl From<ScriptTriple> for ScriptedMetric {
    fn from(scripts: ScriptTriple) -> Self {
        let ScriptTriple {
            init_script,
            map_script,
            combine_script,
            reduce_script,
        } = scripts;
        Self {
            map_script,
            init_script,
            reduce_script,
            combine_script,
        }
    }
}

impl From<ScriptedMetric> for ScriptTriple {
    fn from(metric: ScriptedMetric) -> Self {
        let ScriptedMetric {
            map_script,
            init_script,
            reduce_script,
            combine_script,
        } = metric;
        Self {
            init_script,
            map_script,
            combine_script,
            reduce_script,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(rename = "bool")]
    pub bool_query: BoolQuery,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    pub must: Vec<MatchClause>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchClause {
    #[serde(rename = "match")]
    pub fields: Map<String, Value>,
}

impl MatchClause {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut fields = Map::new();
        fields.insert(field.into(), value.into());
        Self { fields }
    }
}

impl QueryDocument {
    pub fn build(scripts: ScriptTriple, filter: &FilterParams) -> Self {
        Self {
            aggs: Aggregations {
                group_by_sl_met: ScriptedMetricAggregation {
                    scripted_metric: scripts.into(),
                },
            },
            size: 0,
            query: Query {
                bool_query: BoolQuery {
                    must: vec![
                        MatchClause::new(filter.sla_field.as_str(), filter.sla_value.clone()),
                        MatchClause::new(filter.used_flag_field.as_str(), true),
                    ],
                },
            },
        }
    }

    pub fn scripts(&self) -> ScriptTriple {
        self.aggs.group_by_sl_met.scripted_metric.clone().into()
    }

    /// Pretty JSON with 4-space indentation.
    pub fn to_json_pretty(&self) -> serde_json::Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }
}
