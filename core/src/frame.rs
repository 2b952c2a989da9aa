//! The row/column-indexed frame assembled from typed blocks.

use arrow::array::{Array, ArrayRef};
use decant_common::error::{CommonError, Result};

/// A single named, typed column.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    values: ArrayRef,
}

impl Column {
    pub fn new(name: impl Into<String>, values: ArrayRef) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Row index of a frame: the default contiguous `[0, nrows)` range, or the
/// values of a column promoted via [`DataFrame::set_index`].
#[derive(Debug, Clone)]
pub enum RowIndex {
    Range { len: usize },
    Column { name: String, values: ArrayRef },
}

impl RowIndex {
    pub fn len(&self) -> usize {
        match self {
            RowIndex::Range { len } => *len,
            RowIndex::Column { values, .. } => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A materialized frame: ordered named columns plus a row index.
///
/// Built once per read and structurally immutable afterwards, except for
/// the post-hoc index-column assignment.
#[derive(Debug, Clone)]
pub struct DataFrame {
    columns: Vec<Column>,
    index: RowIndex,
}

impl DataFrame {
    /// Build a frame over the given columns with a default range index.
    /// All columns must agree on row count.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let len = columns.first().map(|c| c.len()).unwrap_or(0);
        for column in &columns {
            if column.len() != len {
                return Err(CommonError::inconsistent_block(format!(
                    "column {} holds {} rows, expected {}",
                    column.name(),
                    column.len(),
                    len
                )));
            }
        }
        Ok(Self {
            columns,
            index: RowIndex::Range { len },
        })
    }

    pub fn num_rows(&self) -> usize {
        self.index.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn index(&self) -> &RowIndex {
        &self.index
    }

    /// Reassign the row index to the named column's values, removing that
    /// column from the column set.
    pub fn set_index(&mut self, name: &str) -> Result<()> {
        let position = self
            .columns
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| CommonError::column_not_found(name))?;
        let column = self.columns.remove(position);
        self.index = RowIndex::Column {
            name: column.name,
            values: column.values,
        };
        Ok(())
    }
}
