//! Output adaptation.
//!
//! Selects between the columnar and block materialization paths, applies
//! the optional index column, and hands frame or table results to
//! registered host-library backends. Backend presence is resolved through
//! an explicit registry rather than probed at call time, so a missing
//! dependency surfaces before any engine work is wasted.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use decant_common::error::{CommonError, Result};

use crate::engine::MaterializationMode;
use crate::exchange::ColumnarTable;
use crate::frame::DataFrame;

/// Requested output kind for a read call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Plain indexed frame.
    Frame,
    /// Frame wrapped as a one-partition distributed frame, eager flavor.
    DistributedFrameA,
    /// Frame wrapped as a one-partition distributed frame, deferred flavor.
    DistributedFrameB,
    /// Arrow-style columnar table.
    Table,
    /// Columnar table converted by a registered table adapter.
    TableAdapter,
}

impl OutputKind {
    /// Parse the caller-facing kind string. Anything outside the
    /// recognized enumeration is a configuration error carrying the
    /// offending value.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "frame" => Ok(Self::Frame),
            "distributed-frame-a" => Ok(Self::DistributedFrameA),
            "distributed-frame-b" => Ok(Self::DistributedFrameB),
            "table" => Ok(Self::Table),
            "table-adapter" => Ok(Self::TableAdapter),
            other => Err(CommonError::configuration_error(format!(
                "unrecognized output kind: {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frame => "frame",
            Self::DistributedFrameA => "distributed-frame-a",
            Self::DistributedFrameB => "distributed-frame-b",
            Self::Table => "table",
            Self::TableAdapter => "table-adapter",
        }
    }

    /// Materialization mode the engine must use for this kind.
    pub fn mode(&self) -> MaterializationMode {
        match self {
            Self::Frame | Self::DistributedFrameA | Self::DistributedFrameB => {
                MaterializationMode::Block
            }
            Self::Table | Self::TableAdapter => MaterializationMode::Columnar,
        }
    }

    /// The backend this kind requires, if it is not built in.
    pub fn required_backend(&self) -> Option<&'static str> {
        match self {
            Self::Frame | Self::Table => None,
            Self::DistributedFrameA | Self::DistributedFrameB | Self::TableAdapter => {
                Some(self.as_str())
            }
        }
    }
}

impl FromStr for OutputKind {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A single materialized frame wrapped for a distributed or lazy host
/// library. This layer guarantees exactly one partition and no data
/// duplication; partition scheduling belongs to the backend.
#[derive(Debug)]
pub struct DistributedFrame {
    backend: String,
    partitions: Vec<DataFrame>,
}

impl DistributedFrame {
    /// Wrap one frame as the sole partition.
    pub fn single(backend: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            backend: backend.into(),
            partitions: vec![frame],
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn partitions(&self) -> &[DataFrame] {
        &self.partitions
    }
}

/// A columnar table converted into a backend-owned representation.
#[derive(Debug)]
pub struct AdaptedTable {
    backend: String,
    table: ColumnarTable,
}

impl AdaptedTable {
    pub fn new(backend: impl Into<String>, table: ColumnarTable) -> Self {
        Self {
            backend: backend.into(),
            table,
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn table(&self) -> &ColumnarTable {
        &self.table
    }
}

/// Wraps a materialized frame as a one-partition distributed frame.
pub trait DistributedFrameBackend: Send + Sync {
    fn name(&self) -> &str;

    fn wrap_single(&self, frame: DataFrame) -> Result<DistributedFrame>;
}

/// Converts a columnar table into a host-library table.
pub trait TableAdapterBackend: Send + Sync {
    fn name(&self) -> &str;

    fn adapt(&self, table: ColumnarTable) -> Result<AdaptedTable>;
}

/// Registry of optional output backends, resolved once at startup.
#[derive(Default)]
pub struct BackendRegistry {
    distributed: HashMap<String, Arc<dyn DistributedFrameBackend>>,
    tables: HashMap<String, Arc<dyn TableAdapterBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_distributed(
        &mut self,
        kind: OutputKind,
        backend: Arc<dyn DistributedFrameBackend>,
    ) {
        self.distributed.insert(kind.as_str().to_string(), backend);
    }

    pub fn register_table_adapter(&mut self, backend: Arc<dyn TableAdapterBackend>) {
        self.tables
            .insert(OutputKind::TableAdapter.as_str().to_string(), backend);
    }

    /// Check that the backends `kind` needs are present. Called before any
    /// engine work is dispatched.
    pub fn check(&self, kind: OutputKind) -> Result<()> {
        let Some(required) = kind.required_backend() else {
            return Ok(());
        };
        let present = match kind {
            OutputKind::TableAdapter => self.tables.contains_key(required),
            _ => self.distributed.contains_key(required),
        };
        if present {
            Ok(())
        } else {
            Err(CommonError::missing_dependency(required))
        }
    }

    fn distributed_backend(&self, key: &str) -> Result<&Arc<dyn DistributedFrameBackend>> {
        self.distributed
            .get(key)
            .ok_or_else(|| CommonError::missing_dependency(key))
    }

    fn table_adapter(&self, key: &str) -> Result<&Arc<dyn TableAdapterBackend>> {
        self.tables
            .get(key)
            .ok_or_else(|| CommonError::missing_dependency(key))
    }
}

/// The value a read call returns to the caller.
#[derive(Debug)]
pub enum Output {
    Frame(DataFrame),
    Distributed(DistributedFrame),
    Table(ColumnarTable),
    Adapted(AdaptedTable),
}

impl Output {
    pub fn as_frame(&self) -> Option<&DataFrame> {
        match self {
            Output::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_distributed(&self) -> Option<&DistributedFrame> {
        match self {
            Output::Distributed(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&ColumnarTable> {
        match self {
            Output::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_adapted(&self) -> Option<&AdaptedTable> {
        match self {
            Output::Adapted(table) => Some(table),
            _ => None,
        }
    }
}

/// Post-process a frame-like materialization: apply the optional index
/// column, then the kind's wrapper.
pub fn adapt_frame(
    registry: &BackendRegistry,
    kind: OutputKind,
    mut frame: DataFrame,
    index_col: Option<&str>,
) -> Result<Output> {
    if let Some(column) = index_col {
        frame.set_index(column)?;
    }
    match kind {
        OutputKind::Frame => Ok(Output::Frame(frame)),
        OutputKind::DistributedFrameA | OutputKind::DistributedFrameB => {
            let backend = registry.distributed_backend(kind.as_str())?;
            let wrapped = backend.wrap_single(frame)?;
            if wrapped.num_partitions() != 1 {
                return Err(CommonError::internal_error(format!(
                    "backend {} produced {} partitions, expected exactly 1",
                    backend.name(),
                    wrapped.num_partitions()
                )));
            }
            Ok(Output::Distributed(wrapped))
        }
        OutputKind::Table | OutputKind::TableAdapter => Err(CommonError::configuration_error(
            format!("output kind {} is not frame-like", kind.as_str()),
        )),
    }
}

/// Post-process a table-like materialization.
pub fn adapt_table(
    registry: &BackendRegistry,
    kind: OutputKind,
    table: ColumnarTable,
) -> Result<Output> {
    match kind {
        OutputKind::Table => Ok(Output::Table(table)),
        OutputKind::TableAdapter => {
            let backend = registry.table_adapter(OutputKind::TableAdapter.as_str())?;
            Ok(Output::Adapted(backend.adapt(table)?))
        }
        OutputKind::Frame | OutputKind::DistributedFrameA | OutputKind::DistributedFrameB => {
            Err(CommonError::configuration_error(format!(
                "output kind {} is not table-like",
                kind.as_str()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Column;
    use arrow::array::Int64Array;
    use decant_common::CommonError;

    struct StubDistributed {
        partitions: usize,
    }

    impl DistributedFrameBackend for StubDistributed {
        fn name(&self) -> &str {
            "stub-distributed"
        }

        fn wrap_single(&self, frame: DataFrame) -> Result<DistributedFrame> {
            let mut wrapped = DistributedFrame::single("stub-distributed", frame);
            for _ in 1..self.partitions {
                wrapped
                    .partitions
                    .push(DataFrame::new(vec![]).expect("empty frame"));
            }
            Ok(wrapped)
        }
    }

    fn sample_frame() -> DataFrame {
        DataFrame::new(vec![Column::new(
            "id",
            Arc::new(Int64Array::from(vec![1, 2])),
        )])
        .unwrap()
    }

    #[test]
    fn test_parse_recognizes_every_kind() {
        assert_eq!(OutputKind::parse("frame").unwrap(), OutputKind::Frame);
        assert_eq!(
            OutputKind::parse("distributed-frame-a").unwrap(),
            OutputKind::DistributedFrameA
        );
        assert_eq!(
            OutputKind::parse("distributed-frame-b").unwrap(),
            OutputKind::DistributedFrameB
        );
        assert_eq!(OutputKind::parse("table").unwrap(), OutputKind::Table);
        assert_eq!(
            OutputKind::parse("table-adapter").unwrap(),
            OutputKind::TableAdapter
        );
    }

    #[test]
    fn test_parse_rejects_unknown_kind_with_offending_value() {
        let err = OutputKind::parse("spreadsheet").unwrap_err();
        match err {
            CommonError::ConfigurationError { message, .. } => {
                assert!(message.contains("spreadsheet"));
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_kind_selects_materialization_mode() {
        assert_eq!(OutputKind::Frame.mode(), MaterializationMode::Block);
        assert_eq!(
            OutputKind::DistributedFrameB.mode(),
            MaterializationMode::Block
        );
        assert_eq!(OutputKind::Table.mode(), MaterializationMode::Columnar);
        assert_eq!(
            OutputKind::TableAdapter.mode(),
            MaterializationMode::Columnar
        );
    }

    #[test]
    fn test_missing_backend_is_reported_by_name() {
        let registry = BackendRegistry::new();
        assert!(registry.check(OutputKind::Frame).is_ok());
        assert!(registry.check(OutputKind::Table).is_ok());

        let err = registry.check(OutputKind::DistributedFrameA).unwrap_err();
        match err {
            CommonError::MissingDependencyError { library } => {
                assert_eq!(library, "distributed-frame-a");
            }
            other => panic!("expected missing dependency, got {other:?}"),
        }
    }

    #[test]
    fn test_registered_backend_wraps_one_partition() {
        let mut registry = BackendRegistry::new();
        registry.register_distributed(
            OutputKind::DistributedFrameA,
            Arc::new(StubDistributed { partitions: 1 }),
        );

        let output = adapt_frame(
            &registry,
            OutputKind::DistributedFrameA,
            sample_frame(),
            None,
        )
        .unwrap();
        let wrapped = output.as_distributed().unwrap();
        assert_eq!(wrapped.num_partitions(), 1);
        assert_eq!(wrapped.backend(), "stub-distributed");
        assert_eq!(wrapped.partitions()[0].num_rows(), 2);
    }

    #[test]
    fn test_backend_with_extra_partitions_is_rejected() {
        let mut registry = BackendRegistry::new();
        registry.register_distributed(
            OutputKind::DistributedFrameB,
            Arc::new(StubDistributed { partitions: 2 }),
        );

        let err = adapt_frame(
            &registry,
            OutputKind::DistributedFrameB,
            sample_frame(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CommonError::InternalError { .. }));
    }

    #[test]
    fn test_index_col_is_applied_before_wrapping() {
        let registry = BackendRegistry::new();
        let output =
            adapt_frame(&registry, OutputKind::Frame, sample_frame(), Some("id")).unwrap();
        let frame = output.as_frame().unwrap();
        assert!(frame.column("id").is_none());
        assert_eq!(frame.num_rows(), 2);
    }

    #[test]
    fn test_missing_index_col_fails() {
        let registry = BackendRegistry::new();
        let err = adapt_frame(&registry, OutputKind::Frame, sample_frame(), Some("missing"))
            .unwrap_err();
        assert!(matches!(err, CommonError::ColumnNotFoundError { .. }));
    }
}
