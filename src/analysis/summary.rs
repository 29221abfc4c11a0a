use serde::Serialize;

use crate::{
    Error,
    analysis::{Table, table::parse_cell},
};

/// Reception counters of one table. Every figure is present only if the table carries the columns it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PacketSummary {
    /// Name of the summarized table
    pub table: String,
    pub total_packets: Option<u64>,
    pub packets_ok: Option<u64>,
    pub packets_err: Option<u64>,
    pub crc_errors: Option<f64>,
    pub overflow_sum: Option<f64>,
    pub rx_ok_percent: Option<f64>,
}

impl PacketSummary {
    pub fn from_table(name: impl Into<String>, table: &Table) -> Self {
        let mut summary = Self {
            table: name.into(),
            ..Self::default()
        };

        if let Some(messages) = table.column("mensaje") {
            summary.total_packets = Some(messages.iter().filter(|m| !m.is_empty()).count() as u64);
        }

        if let Some(crc) = table.column_f64("crc_error") {
            summary.packets_ok = Some(crc.iter().filter(|v| **v == Some(0.0)).count() as u64);
            summary.packets_err = Some(crc.iter().filter(|v| **v == Some(1.0)).count() as u64);
            summary.crc_errors = Some(crc.iter().flatten().sum());
        }

        if let Some(overflows) = table.column_f64("previous_overflow_sum") {
            summary.overflow_sum = Some(overflows.iter().flatten().sum());
        }

        if let (Some(total), Some(ok)) = (summary.total_packets, summary.packets_ok)
            && total > 0
        {
            summary.rx_ok_percent = Some(100.0 * ok as f64 / total as f64);
        }

        summary
    }
}

/// Descriptive statistics of one numeric column. Missing cells are left out;
/// statistics that need more values than available are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub table: String,
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub q50: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    pub fn new(table: impl Into<String>, column: impl Into<String>, values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        let mean = (count > 0).then(|| sorted.iter().sum::<f64>() / count as f64);
        let std = mean.filter(|_| count > 1).map(|mean| {
            let squares: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (squares / (count - 1) as f64).sqrt()
        });

        Self {
            table: table.into(),
            column: column.into(),
            count,
            mean,
            std,
            min: sorted.first().copied(),
            q25: quantile(&sorted, 0.25),
            q50: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }
}

/// Summarizes every numeric column of the table.
pub fn describe(name: &str, table: &Table) -> Vec<ColumnSummary> {
    table
        .numeric_columns()
        .into_iter()
        .filter_map(|column| {
            let values: Vec<f64> = table.column_f64(column)?.into_iter().flatten().collect();
            Some(ColumnSummary::new(name, column, &values))
        })
        .collect()
}

/// Linear-interpolated quantile of already sorted values.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Drops rows lacking a value in any of `columns`, then narrows the rows column by column to
/// `[Q1 - k * IQR, Q3 + k * IQR]`, recomputing the quartiles on what is left each time.
/// All numeric columns holding at least one value are used when `columns` is `None`.
pub fn remove_outliers(
    table: &Table,
    columns: Option<&[&str]>,
    iqr_multiplier: f64,
) -> Result<Table, Error> {
    let columns: Vec<String> = match columns {
        Some(columns) => columns.iter().map(|c| c.to_string()).collect(),
        None => table
            .numeric_columns()
            .into_iter()
            .filter(|c| {
                table
                    .column_f64(c)
                    .is_some_and(|values| values.iter().any(Option::is_some))
            })
            .map(str::to_owned)
            .collect(),
    };
    let indices = columns
        .iter()
        .map(|c| table.require(c))
        .collect::<Result<Vec<_>, _>>()?;

    let mut cleaned = table.clone();
    cleaned.retain_rows(|row| {
        indices
            .iter()
            .all(|&i| row.get(i).and_then(|c| parse_cell(c)).is_some())
    });

    for &idx in &indices {
        let mut values: Vec<f64> = cleaned
            .rows()
            .iter()
            .filter_map(|row| parse_cell(&row[idx]))
            .collect();
        values.sort_by(f64::total_cmp);
        let (Some(q1), Some(q3)) = (quantile(&values, 0.25), quantile(&values, 0.75)) else {
            continue;
        };
        let iqr = q3 - q1;
        let (lower, upper) = (q1 - iqr_multiplier * iqr, q3 + iqr_multiplier * iqr);
        cleaned.retain_rows(|row| {
            parse_cell(&row[idx]).is_some_and(|v| v >= lower && v <= upper)
        });
    }

    Ok(cleaned)
}
