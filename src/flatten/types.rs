use crate::error::RecordError;
use crate::flatten::layouts::{
    AnalyticsLayout, EventBatchLayout, GenericLayout, MetricsLayout, RowLayout,
};
use std::collections::BTreeMap;

/// One flattened output line, cells in header order
pub type Row = Vec<String>;

/// Record shapes the CSV projection understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Layout {
    /// Batched game events: eventGroups[].events[], one row per event
    #[default]
    EventBatch,
    /// Metric batches: metricMessage[], one row per message, payload keys as columns
    Metrics,
    /// Mobile analytics export, one row per event, params and user properties as columns
    Analytics,
    /// Any JSON object, its top-level keys as columns
    Generic,
}

impl Layout {
    /// Instantiate the projection rules for this layout
    pub fn build(self, config: &FlattenConfig) -> Box<dyn RowLayout> {
        match self {
            Layout::EventBatch => Box::new(EventBatchLayout {
                utc_timestamps: config.utc_timestamps,
            }),
            Layout::Metrics => Box::new(MetricsLayout),
            Layout::Analytics => Box::new(AnalyticsLayout),
            Layout::Generic => Box::new(GenericLayout),
        }
    }
}

/// Configuration for the CSV projection
#[derive(Debug, Clone, Default)]
pub struct FlattenConfig {
    /// Record shape to project
    pub layout: Layout,

    /// Replace characters outside `[A-Za-z0-9_]` in discovered column names
    pub sanitize_keys: bool,

    /// Add an RFC 3339 rendering of millisecond event timestamps (event-batch only)
    pub utc_timestamps: bool,
}

/// A family of columns whose names come from the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnGroup {
    /// Name of the source collection, used in diagnostics
    pub name: &'static str,

    /// Prepended to every discovered key to form the column name
    pub prefix: &'static str,
}

/// A row before discovered columns are laid out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowDraft {
    /// Cells for the layout's fixed columns, in order
    pub fixed: Vec<String>,

    /// Formatted values per column group, keyed by discovered key
    pub dynamic: Vec<BTreeMap<String, String>>,
}

impl RowDraft {
    pub fn new(fixed: Vec<String>) -> Self {
        RowDraft {
            fixed,
            dynamic: Vec::new(),
        }
    }

    pub fn with_group(mut self, values: BTreeMap<String, String>) -> Self {
        self.dynamic.push(values);
        self
    }
}

/// Everything one record expands into
#[derive(Debug, Default)]
pub struct Expansion {
    pub rows: Vec<RowDraft>,

    /// Child items that could not be decoded and produced no row
    pub skipped: Vec<RecordError>,

    /// Problems that were worked around; the affected rows are still emitted
    pub warnings: Vec<RecordError>,
}

/// Counters accumulated while projecting rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionStats {
    pub rows: usize,
    pub records_skipped: usize,
    pub items_skipped: usize,
    pub warnings: usize,
}
