//! Decant Core - result materialization for a native SQL-execution engine.
//!
//! This crate sits between an external, parallel SQL-execution engine and
//! a process's in-memory dataframe representations. It normalizes a
//! caller's query plus optional partitioning intent into a canonical plan,
//! hands the plan across the engine boundary, and reconstructs the
//! columnar payload that comes back, either as a zero-copy Arrow table or
//! as a typed, row/column-indexed frame.

pub mod adapter;
pub mod blocks;
pub mod engine;
pub mod exchange;
pub mod frame;
pub mod plan;
pub mod reader;

pub use adapter::{
    AdaptedTable, BackendRegistry, DistributedFrame, DistributedFrameBackend, Output, OutputKind,
    TableAdapterBackend, adapt_frame, adapt_table,
};
pub use blocks::{BlockData, BlockDtype, BlockInfo, BlockResult, BlockValues, reconstruct};
pub use engine::{EnginePayload, ExecutionEngine, MaterializationMode};
pub use exchange::{ColumnarResult, ColumnarTable, ExchangeHandle, import_columnar};
pub use frame::{Column, DataFrame, RowIndex};
pub use plan::{PartitionRange, PartitionedQuery, QueryPlan, QuerySpec, plan};
pub use reader::{ReadOptions, Reader};
