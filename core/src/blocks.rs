//! Typed block reconstruction.
//!
//! The engine's block materialization hands back header names, per-block
//! dtype/placement metadata, and per-block raw buffers. Each block is a
//! contiguous, homogeneously-typed group of one or more output columns;
//! this module dispatches every block to its dtype-specific constructor
//! and assembles the columns into a [`DataFrame`].

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampNanosecondArray,
};
use arrow::buffer::{BooleanBuffer, NullBuffer, ScalarBuffer};
use decant_common::error::{CommonError, Result};
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::{Column, DataFrame};

/// Closed enumeration of block dtype tags as emitted by the engine.
///
/// Any other tag fails reconstruction; there is no silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TryFromPrimitive)]
#[serde(rename_all = "camelCase")]
#[num_enum(error_type(name = CommonError, constructor = BlockDtype::unknown))]
#[repr(i32)]
pub enum BlockDtype {
    /// Non-nullable homogeneous array covering one or more columns.
    PlainArray = 0,
    /// Nullable integer column: values plus validity mask.
    NullableIntegerArray = 1,
    /// Nullable boolean column: values plus validity mask.
    NullableBooleanArray = 2,
    /// Datetime column(s), nanosecond unit, single timezone.
    TemporalArray = 3,
}

impl BlockDtype {
    fn unknown(value: i32) -> CommonError {
        CommonError::unsupported_dtype(format!("unknown dt: {value}"))
    }
}

/// Raw values of one block, laid out column-major: the first `nrows`
/// entries fill the block's first placement slot, and so on.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockValues {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Boolean(Vec<bool>),
    Utf8(Vec<String>),
}

impl BlockValues {
    pub fn len(&self) -> usize {
        match self {
            BlockValues::Int64(v) => v.len(),
            BlockValues::Float64(v) => v.len(),
            BlockValues::Boolean(v) => v.len(),
            BlockValues::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            BlockValues::Int64(_) => "int64",
            BlockValues::Float64(_) => "float64",
            BlockValues::Boolean(_) => "boolean",
            BlockValues::Utf8(_) => "utf8",
        }
    }
}

/// One block's payload: raw values plus an optional validity mask. The
/// nullable dtypes require the mask; the others reject it.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockData {
    pub values: BlockValues,
    pub validity: Option<Vec<bool>>,
}

impl BlockData {
    pub fn plain(values: BlockValues) -> Self {
        Self {
            values,
            validity: None,
        }
    }

    pub fn masked(values: BlockValues, validity: Vec<bool>) -> Self {
        Self {
            values,
            validity: Some(validity),
        }
    }
}

/// Placement metadata for one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Raw dtype tag, decoded via [`BlockDtype`] during reconstruction.
    pub dt: i32,
    /// Output column indices this block fills.
    pub cids: Vec<usize>,
}

/// A block-materialized result as handed back by the engine. `block_infos`
/// and `data` are parallel sequences.
#[derive(Debug)]
pub struct BlockResult {
    pub headers: Vec<String>,
    pub block_infos: Vec<BlockInfo>,
    pub data: Vec<BlockData>,
}

/// Assemble a frame from dtype-tagged blocks.
///
/// Row count is derived from the first block and must agree across blocks.
/// The placements of all blocks must cover `[0, headers.len())` exactly
/// once; gaps, overlaps, and out-of-range indices are rejected rather than
/// silently producing a malformed frame.
pub fn reconstruct(result: BlockResult) -> Result<DataFrame> {
    let BlockResult {
        headers,
        block_infos,
        data,
    } = result;

    if block_infos.len() != data.len() {
        return Err(CommonError::inconsistent_block(format!(
            "{} block infos describe {} payloads",
            block_infos.len(),
            data.len()
        )));
    }
    if data.is_empty() {
        return Err(CommonError::empty_result(
            "block result carried no blocks",
        ));
    }

    let mut nrows: Option<usize> = None;
    let mut slots: Vec<Option<ArrayRef>> = (0..headers.len()).map(|_| None).collect();

    for (block_idx, (info, block)) in block_infos.iter().zip(data).enumerate() {
        let dtype = BlockDtype::try_from(info.dt)?;

        let ncols = info.cids.len();
        if ncols == 0 {
            return Err(CommonError::inconsistent_block(format!(
                "block {block_idx} fills no columns"
            )));
        }
        let vlen = block.values.len();
        if vlen % ncols != 0 {
            return Err(CommonError::inconsistent_block(format!(
                "block {block_idx} holds {vlen} values across {ncols} columns"
            )));
        }
        let rows = vlen / ncols;
        match nrows {
            None => nrows = Some(rows),
            Some(expected) if expected != rows => {
                return Err(CommonError::inconsistent_block(format!(
                    "block {block_idx} describes {rows} rows, expected {expected}"
                )));
            }
            Some(_) => {}
        }

        let arrays = build_block(dtype, block, rows, ncols, block_idx)?;
        for (&cid, array) in info.cids.iter().zip(arrays) {
            if cid >= headers.len() {
                return Err(CommonError::inconsistent_block(format!(
                    "block {block_idx} places a column at {cid}, outside 0..{}",
                    headers.len()
                )));
            }
            if slots[cid].is_some() {
                return Err(CommonError::inconsistent_block(format!(
                    "column {cid} is produced by more than one block"
                )));
            }
            slots[cid] = Some(array);
        }
    }

    let mut columns = Vec::with_capacity(headers.len());
    for (cid, (name, slot)) in headers.iter().zip(slots).enumerate() {
        let values = slot.ok_or_else(|| {
            CommonError::inconsistent_block(format!("no block produced column {cid} ({name})"))
        })?;
        columns.push(Column::new(name.clone(), values));
    }

    debug!(
        columns = headers.len(),
        rows = nrows.unwrap_or(0),
        "reconstructed block result"
    );
    DataFrame::new(columns)
}

/// Construct the column arrays of one block per its dtype tag, in
/// placement order.
fn build_block(
    dtype: BlockDtype,
    block: BlockData,
    rows: usize,
    ncols: usize,
    block_idx: usize,
) -> Result<Vec<ArrayRef>> {
    match dtype {
        BlockDtype::PlainArray => {
            if block.validity.is_some() {
                return Err(CommonError::inconsistent_block(format!(
                    "block {block_idx}: plain array carries a validity mask"
                )));
            }
            Ok(split_columns(&block.values, rows, ncols))
        }
        BlockDtype::NullableIntegerArray => {
            let validity = required_validity(&block, rows, block_idx)?;
            let kind = block.values.kind();
            let BlockValues::Int64(values) = block.values else {
                return Err(CommonError::inconsistent_block(format!(
                    "block {block_idx}: nullable integer block holds {kind} values"
                )));
            };
            let array = Int64Array::new(ScalarBuffer::from(values), Some(validity));
            single_column(array, ncols, block_idx)
        }
        BlockDtype::NullableBooleanArray => {
            let validity = required_validity(&block, rows, block_idx)?;
            let kind = block.values.kind();
            let BlockValues::Boolean(values) = block.values else {
                return Err(CommonError::inconsistent_block(format!(
                    "block {block_idx}: nullable boolean block holds {kind} values"
                )));
            };
            let array = BooleanArray::new(BooleanBuffer::from(values), Some(validity));
            single_column(array, ncols, block_idx)
        }
        BlockDtype::TemporalArray => {
            if block.validity.is_some() {
                return Err(CommonError::inconsistent_block(format!(
                    "block {block_idx}: temporal array carries a validity mask"
                )));
            }
            let kind = block.values.kind();
            let BlockValues::Int64(values) = block.values else {
                return Err(CommonError::inconsistent_block(format!(
                    "block {block_idx}: temporal block holds {kind} values, expected int64 nanoseconds"
                )));
            };
            let columns = (0..ncols)
                .map(|i| {
                    let slice = values[i * rows..(i + 1) * rows].to_vec();
                    Arc::new(TimestampNanosecondArray::from(slice)) as ArrayRef
                })
                .collect();
            Ok(columns)
        }
    }
}

fn required_validity(block: &BlockData, rows: usize, block_idx: usize) -> Result<NullBuffer> {
    let validity = block.validity.as_ref().ok_or_else(|| {
        CommonError::inconsistent_block(format!(
            "block {block_idx}: nullable block is missing its validity mask"
        ))
    })?;
    if validity.len() != rows {
        return Err(CommonError::inconsistent_block(format!(
            "block {block_idx}: validity mask covers {} rows, expected {rows}",
            validity.len()
        )));
    }
    Ok(NullBuffer::from(validity.clone()))
}

fn single_column(array: impl arrow::array::Array + 'static, ncols: usize, block_idx: usize) -> Result<Vec<ArrayRef>> {
    if ncols != 1 {
        return Err(CommonError::inconsistent_block(format!(
            "block {block_idx}: nullable block fills {ncols} columns, expected exactly 1"
        )));
    }
    Ok(vec![Arc::new(array) as ArrayRef])
}

fn split_columns(values: &BlockValues, rows: usize, ncols: usize) -> Vec<ArrayRef> {
    (0..ncols)
        .map(|i| {
            let range = i * rows..(i + 1) * rows;
            match values {
                BlockValues::Int64(v) => Arc::new(Int64Array::from(v[range].to_vec())) as ArrayRef,
                BlockValues::Float64(v) => {
                    Arc::new(Float64Array::from(v[range].to_vec())) as ArrayRef
                }
                BlockValues::Boolean(v) => {
                    Arc::new(BooleanArray::from(v[range].to_vec())) as ArrayRef
                }
                BlockValues::Utf8(v) => Arc::new(StringArray::from(v[range].to_vec())) as ArrayRef,
            }
        })
        .collect()
}
