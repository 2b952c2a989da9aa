//! Reads a canned result through the full plan/execute/materialize path
//! using an in-process stub engine.
//!
//! Run with: cargo run --example read_demo

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
use decant_core::{
    BlockData, BlockInfo, BlockResult, BlockValues, ColumnarResult, EnginePayload,
    ExchangeHandle, ExecutionEngine, MaterializationMode, Output, QueryPlan, ReadOptions, Reader,
};

struct DemoEngine;

impl ExecutionEngine for DemoEngine {
    fn execute(
        &self,
        conn: &str,
        mode: MaterializationMode,
        plan: &QueryPlan,
        protocol: &str,
    ) -> decant_common::Result<EnginePayload> {
        println!("engine: conn={conn} protocol={protocol} mode={mode:?} plan={plan:?}");
        Ok(match mode {
            MaterializationMode::Block => EnginePayload::Block(BlockResult {
                headers: vec!["id".to_string(), "city".to_string()],
                block_infos: vec![
                    BlockInfo {
                        dt: 0,
                        cids: vec![0],
                    },
                    BlockInfo {
                        dt: 0,
                        cids: vec![1],
                    },
                ],
                data: vec![
                    BlockData::plain(BlockValues::Int64(vec![1, 2])),
                    BlockData::plain(BlockValues::Utf8(vec![
                        "berlin".to_string(),
                        "tokyo".to_string(),
                    ])),
                ],
            }),
            MaterializationMode::Columnar => {
                let ids: ArrayRef = Arc::new(Int64Array::from(vec![1, 2]));
                let cities: ArrayRef = Arc::new(StringArray::from(vec!["berlin", "tokyo"]));
                EnginePayload::Columnar(ColumnarResult {
                    names: vec!["id".to_string(), "city".to_string()],
                    chunks: vec![vec![
                        ExchangeHandle::export(&ids.to_data())?,
                        ExchangeHandle::export(&cities.to_data())?,
                    ]],
                })
            }
        })
    }
}

fn main() -> decant_common::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let reader = Reader::new(DemoEngine);

    let frame = reader.read(
        "db://demo",
        "SELECT id, city FROM cities",
        &ReadOptions::new().index_col("id"),
    )?;
    if let Output::Frame(frame) = &frame {
        println!(
            "frame: {} rows, columns {:?}",
            frame.num_rows(),
            frame.column_names()
        );
    }

    let table = reader.read(
        "db://demo",
        "SELECT id, city FROM cities",
        &ReadOptions::new().output_kind("table"),
    )?;
    if let Output::Table(table) = &table {
        println!(
            "table: {} rows across {} batches",
            table.num_rows(),
            table.batches().len()
        );
    }

    Ok(())
}
