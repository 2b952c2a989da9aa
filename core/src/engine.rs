//! The boundary to the external query-execution engine.

use decant_common::error::Result;
use serde::{Deserialize, Serialize};

use crate::blocks::BlockResult;
use crate::exchange::ColumnarResult;
use crate::plan::QueryPlan;

/// How the engine should materialize its result payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaterializationMode {
    /// Zero-copy exchange handle pairs, one row chunk per record batch.
    Columnar,
    /// Dtype-tagged raw buffers with placement metadata.
    Block,
}

/// A result payload handed back across the engine boundary.
#[derive(Debug)]
pub enum EnginePayload {
    Columnar(ColumnarResult),
    Block(BlockResult),
}

/// The external, parallel SQL-execution engine.
///
/// Connection management, SQL dispatch, multi-threaded partitioned
/// execution, and protocol selection all live behind this trait. The call
/// is synchronous: one invocation per read, one already-aggregated payload
/// back. Retry and cancellation, if any, belong to the implementor.
pub trait ExecutionEngine {
    fn execute(
        &self,
        conn: &str,
        mode: MaterializationMode,
        plan: &QueryPlan,
        protocol: &str,
    ) -> Result<EnginePayload>;
}
