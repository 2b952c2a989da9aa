//! Partition planning.
//!
//! Normalizes a caller's query plus optional partitioning intent into the
//! canonical plan handed to the external execution engine: either a list of
//! independent query strings or a single partition descriptor.

use decant_common::error::{CommonError, Result};
use serde::{Deserialize, Serialize};

/// A caller-supplied query: one SQL string, or a pre-split list of
/// independent SQL strings in execution-assignment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuerySpec {
    Single(String),
    Many(Vec<String>),
}

impl From<&str> for QuerySpec {
    fn from(query: &str) -> Self {
        QuerySpec::Single(query.to_string())
    }
}

impl From<String> for QuerySpec {
    fn from(query: String) -> Self {
        QuerySpec::Single(query)
    }
}

impl From<Vec<String>> for QuerySpec {
    fn from(queries: Vec<String>) -> Self {
        QuerySpec::Many(queries)
    }
}

impl From<Vec<&str>> for QuerySpec {
    fn from(queries: Vec<&str>) -> Self {
        QuerySpec::Many(queries.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for QuerySpec {
    fn from(queries: &[&str]) -> Self {
        QuerySpec::Many(queries.iter().map(|q| q.to_string()).collect())
    }
}

/// Value range of the partition column. Either bound may be omitted; the
/// engine derives missing bounds itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl PartitionRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Range with only a lower bound.
    pub fn from_min(min: i64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Range with only an upper bound.
    pub fn from_max(max: i64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }
}

impl From<(i64, i64)> for PartitionRange {
    fn from((min, max): (i64, i64)) -> Self {
        Self::new(min, max)
    }
}

/// Descriptor the engine uses to split one logical query into independently
/// executable sub-queries on a numeric column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionedQuery {
    pub query: String,
    pub column: String,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub num: Option<usize>,
}

/// Canonical engine-consumable query plan.
///
/// At most one partitioning expression is ever active: a multi-element
/// query list is already the caller's partitioning, and a single-element
/// list collapses to the single-query case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryPlan {
    /// Independent query strings; order is execution-assignment order.
    ExplicitQueries(Vec<String>),
    /// One query the engine splits per the partition descriptor.
    Partitioned(PartitionedQuery),
}

/// Normalize `(query, partition_on, partition_range, partition_num)` into a
/// [`QueryPlan`].
///
/// Purely computes the plan; no engine call is made here. Partitioning a
/// pre-split query list is rejected with a configuration error.
pub fn plan(
    query: impl Into<QuerySpec>,
    partition_on: Option<&str>,
    partition_range: Option<PartitionRange>,
    partition_num: Option<usize>,
) -> Result<QueryPlan> {
    // A single-element list is treated as the scalar case.
    let query = match query.into() {
        QuerySpec::Many(mut queries) if queries.len() == 1 => QuerySpec::Single(queries.remove(0)),
        other => other,
    };

    match query {
        QuerySpec::Single(query) => match partition_on {
            None => Ok(QueryPlan::ExplicitQueries(vec![query])),
            Some(column) => Ok(QueryPlan::Partitioned(PartitionedQuery {
                query,
                column: column.to_string(),
                min: partition_range.and_then(|r| r.min),
                max: partition_range.and_then(|r| r.max),
                num: partition_num,
            })),
        },
        QuerySpec::Many(queries) => {
            if queries.is_empty() {
                return Err(CommonError::configuration_error(
                    "query must be a string or a non-empty list of strings",
                ));
            }
            if partition_on.is_some() {
                return Err(CommonError::configuration_error(
                    "partition_on is not supported for a list of queries",
                ));
            }
            Ok(QueryPlan::ExplicitQueries(queries))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_query_without_partitioning() {
        let plan = plan("SELECT * FROM lineitem", None, None, None).unwrap();
        assert_eq!(
            plan,
            QueryPlan::ExplicitQueries(vec!["SELECT * FROM lineitem".to_string()])
        );
    }

    #[test]
    fn test_scalar_query_with_partitioning() {
        let plan = plan(
            "SELECT * FROM lineitem",
            Some("l_orderkey"),
            Some((0, 60_000).into()),
            Some(10),
        )
        .unwrap();
        assert_eq!(
            plan,
            QueryPlan::Partitioned(PartitionedQuery {
                query: "SELECT * FROM lineitem".to_string(),
                column: "l_orderkey".to_string(),
                min: Some(0),
                max: Some(60_000),
                num: Some(10),
            })
        );
    }

    #[test]
    fn test_partition_range_bounds_are_independent() {
        let min_only = plan(
            "SELECT * FROM t",
            Some("id"),
            Some(PartitionRange::from_min(7)),
            Some(4),
        )
        .unwrap();
        match min_only {
            QueryPlan::Partitioned(p) => {
                assert_eq!(p.min, Some(7));
                assert_eq!(p.max, None);
            }
            other => panic!("expected partitioned plan, got {other:?}"),
        }

        let no_bounds = plan("SELECT * FROM t", Some("id"), None, None).unwrap();
        match no_bounds {
            QueryPlan::Partitioned(p) => {
                assert_eq!(p.min, None);
                assert_eq!(p.max, None);
                assert_eq!(p.num, None);
            }
            other => panic!("expected partitioned plan, got {other:?}"),
        }
    }

    #[test]
    fn test_single_element_list_collapses_to_scalar() {
        let plan = plan(vec!["SELECT 1"], Some("id"), None, Some(2)).unwrap();
        assert!(matches!(plan, QueryPlan::Partitioned(_)));
    }

    #[test]
    fn test_query_list_keeps_order() {
        let queries = vec![
            "SELECT * FROM t WHERE id <= 10",
            "SELECT * FROM t WHERE id > 10",
        ];
        let plan = plan(queries.clone(), None, None, None).unwrap();
        assert_eq!(
            plan,
            QueryPlan::ExplicitQueries(queries.into_iter().map(String::from).collect())
        );
    }

    #[test]
    fn test_query_list_with_partition_on_is_rejected() {
        let queries = vec!["SELECT 1", "SELECT 2"];
        let err = plan(queries, Some("id"), None, None).unwrap_err();
        assert!(matches!(
            err,
            decant_common::CommonError::ConfigurationError { .. }
        ));
    }

    #[test]
    fn test_empty_query_list_is_rejected() {
        let err = plan(Vec::<String>::new(), None, None, None).unwrap_err();
        assert!(matches!(
            err,
            decant_common::CommonError::ConfigurationError { .. }
        ));
    }

    #[test]
    fn test_partition_descriptor_serializes_with_nulls() {
        let plan = plan("SELECT * FROM t", Some("id"), None, Some(3)).unwrap();
        let QueryPlan::Partitioned(descriptor) = plan else {
            panic!("expected partitioned plan");
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["query"], "SELECT * FROM t");
        assert_eq!(json["column"], "id");
        assert!(json["min"].is_null());
        assert!(json["max"].is_null());
        assert_eq!(json["num"], 3);
    }
}
