//! Module for descriptive statistics over the produced tables.
//!
//! Plotting happens outside this crate; these routines cover the numbers reported alongside
//! the plots: reception counters, column summaries, outlier filtering, the log-distance
//! propagation fit and the comparison of a metric across distances.

mod hypothesis;
mod propagation;
mod summary;
mod table;


pub use hypothesis::{ComparisonTest, GroupComparison, compare_by_distance};
pub use propagation::{
    PropagationModel, StoBreakdown, distance_from_name, fit_propagation, sto_breakdown,
};
pub use summary::{ColumnSummary, PacketSummary, describe, remove_outliers};
pub use table::Table;

/// Appends the STO decomposition columns (`sto_int`, `sto_fraq`, `muestras`, `muestras_2`) when the
/// table has an `sto` column. Rows without an STO value get empty cells. Returns whether columns were added.
pub fn add_sto_columns(table: &mut Table, oversampling: u32) -> bool {
    let Some(sto) = table.column_f64("sto") else {
        return false;
    };
    let parts: Vec<Option<StoBreakdown>> = sto
        .into_iter()
        .map(|v| v.map(|v| sto_breakdown(v, oversampling)))
        .collect();

    let column = |f: fn(&StoBreakdown) -> f64| -> Vec<String> {
        parts
            .iter()
            .map(|p| p.as_ref().map(|p| f(p).to_string()).unwrap_or_default())
            .collect()
    };

    table.push_column("sto_int", column(|p| p.sto_int));
    table.push_column("sto_fraq", column(|p| p.sto_frac));
    table.push_column("muestras", column(|p| p.samples));
    table.push_column("muestras_2", column(|p| p.samples_2));
    true
}

/// Collects `(distance, value)` points of `column`, taking the distance from the table's name.
/// Empty when the name carries no distance or the table lacks the column.
pub fn metric_points(name: &str, table: &Table, column: &str) -> Vec<(f64, f64)> {
    let (Some(distance), Some(values)) = (distance_from_name(name), table.column_f64(column))
    else {
        return Vec::new();
    };
    values
        .into_iter()
        .flatten()
        .map(|value| (distance, value))
        .collect()
}

/// Collects `(distance, rssi)` points from a table, taking the distance from the table's name.
pub fn propagation_points(name: &str, table: &Table) -> Vec<(f64, f64)> {
    metric_points(name, table, "rssi (dBm)")
}
