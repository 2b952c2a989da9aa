//! End-to-end read tests against a stub in-process engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use decant_common::CommonError;
use decant_core::{
    BlockData, BlockInfo, BlockResult, BlockValues, ColumnarResult, EnginePayload,
    ExchangeHandle, ExecutionEngine, MaterializationMode, QueryPlan, ReadOptions, Reader,
};

/// Serves a canned three-column result in whichever materialization the
/// reader asks for, like a real engine would.
struct StubEngine {
    executions: AtomicUsize,
}

impl StubEngine {
    fn new() -> Self {
        Self {
            executions: AtomicUsize::new(0),
        }
    }

    fn columnar_result(&self) -> ColumnarResult {
        let ids: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3]));
        let names: ArrayRef = Arc::new(StringArray::from(vec!["a", "b", "c"]));
        let scores: ArrayRef = Arc::new(Float64Array::from(vec![0.5, 1.5, 2.5]));
        ColumnarResult {
            names: vec!["id".to_string(), "name".to_string(), "score".to_string()],
            chunks: vec![vec![
                ExchangeHandle::export(&ids.to_data()).unwrap(),
                ExchangeHandle::export(&names.to_data()).unwrap(),
                ExchangeHandle::export(&scores.to_data()).unwrap(),
            ]],
        }
    }

    fn block_result(&self) -> BlockResult {
        BlockResult {
            headers: vec!["id".to_string(), "name".to_string(), "score".to_string()],
            block_infos: vec![
                BlockInfo {
                    dt: 0,
                    cids: vec![0],
                },
                BlockInfo {
                    dt: 0,
                    cids: vec![1],
                },
                BlockInfo {
                    dt: 0,
                    cids: vec![2],
                },
            ],
            data: vec![
                BlockData::plain(BlockValues::Int64(vec![1, 2, 3])),
                BlockData::plain(BlockValues::Utf8(vec![
                    "a".to_string(),
                    "b".to_string(),
                    "c".to_string(),
                ])),
                BlockData::plain(BlockValues::Float64(vec![0.5, 1.5, 2.5])),
            ],
        }
    }
}

impl ExecutionEngine for StubEngine {
    fn execute(
        &self,
        _conn: &str,
        mode: MaterializationMode,
        _plan: &QueryPlan,
        _protocol: &str,
    ) -> decant_common::Result<EnginePayload> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Ok(match mode {
            MaterializationMode::Columnar => EnginePayload::Columnar(self.columnar_result()),
            MaterializationMode::Block => EnginePayload::Block(self.block_result()),
        })
    }
}

#[test]
fn test_frame_read_returns_indexed_frame() {
    let reader = Reader::new(StubEngine::new());
    let output = reader
        .read("db://stub", "SELECT * FROM t", &ReadOptions::new())
        .unwrap();

    let frame = output.as_frame().unwrap();
    assert_eq!(frame.column_names(), vec!["id", "name", "score"]);
    assert_eq!(frame.num_rows(), 3);
}

#[test]
fn test_frame_read_with_index_col_promotes_the_column() {
    let reader = Reader::new(StubEngine::new());
    let options = ReadOptions::new().index_col("id");
    let output = reader
        .read("db://stub", "SELECT * FROM t", &options)
        .unwrap();

    let frame = output.as_frame().unwrap();
    assert_eq!(frame.column_names(), vec!["name", "score"]);
    assert_eq!(frame.num_rows(), 3);
}

#[test]
fn test_table_read_returns_columnar_table() {
    let reader = Reader::new(StubEngine::new());
    let options = ReadOptions::new().output_kind("table");
    let output = reader
        .read("db://stub", "SELECT * FROM t", &options)
        .unwrap();

    let table = output.as_table().unwrap();
    assert_eq!(table.column_names(), vec!["id", "name", "score"]);
    assert_eq!(table.num_rows(), 3);
    assert_eq!(table.batches().len(), 1);
}

#[test]
fn test_unrecognized_output_kind_never_reaches_the_engine() {
    let reader = Reader::new(StubEngine::new());
    let options = ReadOptions::new().output_kind("csv");
    let err = reader
        .read("db://stub", "SELECT 1", &options)
        .unwrap_err();

    assert!(matches!(err, CommonError::ConfigurationError { .. }));
}

#[test]
fn test_partitioned_read_runs_a_single_engine_call() {
    let reader = Reader::new(StubEngine::new());
    let options = ReadOptions::new()
        .partition_on("id")
        .partition_range((1, 3))
        .partition_num(2);
    let output = reader
        .read("db://stub", "SELECT * FROM t", &options)
        .unwrap();

    assert!(output.as_frame().is_some());
}
