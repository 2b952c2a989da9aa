//! Zero-copy import of engine-owned columnar results over the Arrow C data
//! interface.
//!
//! The engine exports every column of every chunk as an
//! (`FFI_ArrowArray`, `FFI_ArrowSchema`) descriptor pair. Importing a pair
//! transfers ownership of the described buffers to this process; the engine
//! must not free or reuse them afterwards.

use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, ArrayData, ArrayRef, make_array};
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::ffi::{FFI_ArrowArray, FFI_ArrowSchema, from_ffi, to_ffi};
use arrow::record_batch::RecordBatch;
use decant_common::error::{CommonError, Result};
use tracing::debug;

/// One column's worth of engine-exported array data.
///
/// A handle is a consume-once resource: [`ExchangeHandle::import`] takes
/// `self` by value, so a handle cannot back more than one imported array
/// and the exporter's release callback runs exactly once, driven by the
/// `ArrayData` built from it.
pub struct ExchangeHandle {
    array: FFI_ArrowArray,
    schema: FFI_ArrowSchema,
}

impl fmt::Debug for ExchangeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeHandle").finish_non_exhaustive()
    }
}

impl ExchangeHandle {
    /// Wrap a descriptor pair received from the engine.
    ///
    /// The pair must describe a live exported Arrow array whose buffers
    /// stay valid until the release callback runs.
    pub fn new(array: FFI_ArrowArray, schema: FFI_ArrowSchema) -> Self {
        Self { array, schema }
    }

    /// Export owned array data into a handle, the producing half of the
    /// exchange. Used by engine shims and tests.
    pub fn export(data: &ArrayData) -> Result<Self> {
        let (array, schema) = to_ffi(data).map_err(|e| {
            CommonError::internal_error_with_source("failed to export array over ffi", e)
        })?;
        Ok(Self { array, schema })
    }

    /// Import the described array, taking ownership of its buffers.
    pub fn import(self) -> Result<ArrayRef> {
        // SAFETY: the pair came from a conforming C data interface export
        // and is consumed exactly once here; the resulting ArrayData owns
        // the buffers and invokes the release callback on drop.
        let data = unsafe { from_ffi(self.array, &self.schema) }.map_err(|e| {
            CommonError::internal_error_with_source("failed to import array over ffi", e)
        })?;
        Ok(make_array(data))
    }
}

/// A columnar result as handed back by the engine: unique column names in
/// output order, plus row chunks of per-column handle pairs (one pair per
/// name, same order).
#[derive(Debug)]
pub struct ColumnarResult {
    pub names: Vec<String>,
    pub chunks: Vec<Vec<ExchangeHandle>>,
}

/// An Arrow-style table: one schema plus the record batches imported from
/// each chunk, in chunk order.
#[derive(Debug, Clone)]
pub struct ColumnarTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl ColumnarTable {
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields().iter().map(|f| f.name().as_str()).collect()
    }
}

/// Reconstruct a table from a zero-copy columnar result.
///
/// Each handle pair is imported exactly once, positionally zipped against
/// `names`; chunk order becomes row-batch order in the table. Imported
/// arrays keep their native type; no reordering, no coercion.
pub fn import_columnar(result: ColumnarResult) -> Result<ColumnarTable> {
    let ColumnarResult { names, chunks } = result;
    if names.is_empty() {
        return Err(CommonError::empty_result(
            "columnar result declared zero columns",
        ));
    }

    let nchunks = chunks.len();
    let mut chunks = chunks.into_iter().enumerate();
    let (_, first_chunk) = chunks.next().ok_or_else(|| {
        CommonError::empty_result(format!(
            "columnar result carried no chunks for columns {names:?}"
        ))
    })?;

    // The first chunk pins the table schema; every later chunk must match.
    let first = import_chunk(&names, first_chunk, 0)?;
    let schema = first.schema();

    let mut batches: Vec<RecordBatch> = Vec::with_capacity(nchunks);
    batches.push(first);
    for (chunk_idx, chunk) in chunks {
        let batch = import_chunk(&names, chunk, chunk_idx)?;
        if batch.schema().as_ref() != schema.as_ref() {
            return Err(CommonError::internal_error(format!(
                "chunk {chunk_idx} schema diverges from chunk 0"
            )));
        }
        batches.push(batch);
    }

    debug!(
        columns = schema.fields().len(),
        chunks = batches.len(),
        "imported columnar result"
    );
    Ok(ColumnarTable { schema, batches })
}

/// Import one chunk's handles and assemble them into a record batch, with
/// fields named positionally from `names`.
fn import_chunk(names: &[String], chunk: Vec<ExchangeHandle>, chunk_idx: usize) -> Result<RecordBatch> {
    if chunk.len() != names.len() {
        return Err(CommonError::internal_error(format!(
            "chunk {} carries {} arrays, expected {}",
            chunk_idx,
            chunk.len(),
            names.len()
        )));
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(names.len());
    for handle in chunk {
        columns.push(handle.import()?);
    }

    let fields: Vec<Field> = names
        .iter()
        .zip(&columns)
        .map(|(name, column)| Field::new(name, column.data_type().clone(), true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    RecordBatch::try_new(schema, columns).map_err(|e| {
        CommonError::internal_error_with_source(
            format!("failed to assemble record batch for chunk {chunk_idx}"),
            e,
        )
    })
}
