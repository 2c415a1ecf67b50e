use crate::flatten::layouts::RowLayout;
use crate::flatten::plan::ColumnPlan;
use crate::flatten::types::{ProjectionStats, Row};
use crate::source::Record;
use tracing::warn;

/// Turns records into full-width rows under a frozen column plan
pub struct RowProjector<'a> {
    layout: &'a dyn RowLayout,
    plan: &'a ColumnPlan,
}

impl<'a> RowProjector<'a> {
    pub fn new(layout: &'a dyn RowLayout, plan: &'a ColumnPlan) -> Self {
        RowProjector { layout, plan }
    }

    /// Project one record, `index` being its position in the input
    ///
    /// A record with no child items yields no rows. A record that does not
    /// decode is reported and yields no rows.
    pub fn project(&self, index: usize, record: &Record, stats: &mut ProjectionStats) -> Vec<Row> {
        let expansion = match self.layout.expand(record) {
            Ok(expansion) => expansion,
            Err(err) => {
                warn!(record = index, layout = self.layout.name(), "Skipping record: {}", err);
                stats.records_skipped += 1;
                return Vec::new();
            }
        };

        for err in &expansion.skipped {
            warn!(record = index, "Skipping item: {}", err);
        }
        for err in &expansion.warnings {
            warn!(record = index, "{}", err);
        }
        stats.items_skipped += expansion.skipped.len();
        stats.warnings += expansion.warnings.len();
        stats.rows += expansion.rows.len();

        expansion
            .rows
            .into_iter()
            .map(|draft| self.plan.assemble(draft))
            .collect()
    }
}
