//! The inbound read entry point: plan, execute, materialize, adapt.

use decant_common::error::{CommonError, Result};
use tracing::{debug, info};

use crate::adapter::{self, BackendRegistry, Output, OutputKind};
use crate::blocks;
use crate::engine::{EnginePayload, ExecutionEngine, MaterializationMode};
use crate::exchange;
use crate::plan::{PartitionRange, QuerySpec, plan};

/// Options for a read call. Output kind defaults to `"frame"` and the wire
/// protocol to `"binary"`.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    output_kind: String,
    protocol: String,
    partition_on: Option<String>,
    partition_range: Option<PartitionRange>,
    partition_num: Option<usize>,
    index_col: Option<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            output_kind: "frame".to_string(),
            protocol: "binary".to_string(),
            partition_on: None,
            partition_range: None,
            partition_num: None,
            index_col: None,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_kind(mut self, kind: impl Into<String>) -> Self {
        self.output_kind = kind.into();
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Column the engine partitions the result on.
    pub fn partition_on(mut self, column: impl Into<String>) -> Self {
        self.partition_on = Some(column.into());
        self
    }

    pub fn partition_range(mut self, range: impl Into<PartitionRange>) -> Self {
        self.partition_range = Some(range.into());
        self
    }

    pub fn partition_num(mut self, num: usize) -> Self {
        self.partition_num = Some(num);
        self
    }

    /// Column whose values replace the default row index on frame-like
    /// results.
    pub fn index_col(mut self, column: impl Into<String>) -> Self {
        self.index_col = Some(column.into());
        self
    }
}

/// Materializes engine results for a caller, one synchronous engine call
/// per read.
pub struct Reader<E: ExecutionEngine> {
    engine: E,
    backends: BackendRegistry,
}

impl<E: ExecutionEngine> Reader<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            backends: BackendRegistry::new(),
        }
    }

    pub fn with_backends(engine: E, backends: BackendRegistry) -> Self {
        Self { engine, backends }
    }

    pub fn backends_mut(&mut self) -> &mut BackendRegistry {
        &mut self.backends
    }

    /// Run `query` against `conn` and materialize the result as the
    /// requested output kind.
    ///
    /// Configuration and dependency errors surface before the engine is
    /// invoked; materialization and adaptation errors after. Every error
    /// is terminal for the call: no partial result, no retry here.
    pub fn read(
        &self,
        conn: &str,
        query: impl Into<QuerySpec>,
        options: &ReadOptions,
    ) -> Result<Output> {
        let kind = OutputKind::parse(&options.output_kind)?;
        self.backends.check(kind)?;

        let plan = plan(
            query,
            options.partition_on.as_deref(),
            options.partition_range,
            options.partition_num,
        )?;
        debug!(kind = kind.as_str(), ?plan, "planned read");

        let payload = self
            .engine
            .execute(conn, kind.mode(), &plan, &options.protocol)?;

        let output = match (kind.mode(), payload) {
            (MaterializationMode::Block, EnginePayload::Block(result)) => {
                let frame = blocks::reconstruct(result)?;
                adapter::adapt_frame(&self.backends, kind, frame, options.index_col.as_deref())?
            }
            (MaterializationMode::Columnar, EnginePayload::Columnar(result)) => {
                let table = exchange::import_columnar(result)?;
                adapter::adapt_table(&self.backends, kind, table)?
            }
            (mode, _) => {
                return Err(CommonError::internal_error(format!(
                    "engine payload does not match requested {mode:?} materialization"
                )));
            }
        };

        info!(kind = kind.as_str(), "materialized read result");
        Ok(output)
    }
}
