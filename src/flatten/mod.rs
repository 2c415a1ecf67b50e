//! Flattening nested records into CSV rows
//!
//! A [`RowLayout`] describes one record shape. Projection runs in two passes
//! over the buffered records:
//!
//! 1. [`ColumnPlan::discover`] expands every record and collects the keys of
//!    each free-form collection (a metric payload, analytics params), sorted
//!    ascending, into a fixed header
//! 2. [`RowProjector`] expands every record again and lays each row out
//!    against that header, leaving missing keys empty
//!
//! Parent fields are copied into every row derived from a record.

pub mod layouts;
pub mod plan;
pub mod projector;
pub mod types;

pub use layouts::{AnalyticsLayout, EventBatchLayout, GenericLayout, MetricsLayout, RowLayout};
pub use plan::{sanitize, Collision, ColumnPlan, KeyAccumulator};
pub use projector::RowProjector;
pub use types::{ColumnGroup, Expansion, FlattenConfig, Layout, ProjectionStats, Row, RowDraft};
