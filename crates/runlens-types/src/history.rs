use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Keys the tracking service reserves for bookkeeping (`_step`,
/// `_runtime`, `_timestamp`, ...). They never count as user metrics.
pub fn is_internal_key(key: &str) -> bool {
    key.starts_with('_')
}

/// One logged metric sample for a run.
///
/// `values` keeps every field of the raw row, internal keys included, so
/// callers decide what to filter. `step` is pulled out of `_step` for
/// convenience when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub step: Option<i64>,
    pub values: BTreeMap<String, Value>,
}

impl HistoryRow {
    /// Build a row from a raw JSON object. Returns `None` for non-objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let values: BTreeMap<String, Value> =
            object.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let step = values.get("_step").and_then(Value::as_i64);
        Some(Self { step, values })
    }

    /// Names of the user metrics present in this row.
    pub fn metric_keys(&self) -> impl Iterator<Item = &str> {
        self.values
            .keys()
            .map(String::as_str)
            .filter(|k| !is_internal_key(k))
    }

    /// Numeric value for `key`, if the row holds one.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_f64)
    }
}

/// Canonical columnar view of a run's history, restricted to the metrics a
/// caller asked for: metric name -> ordered values, one slot per row,
/// `None` where the row did not log that metric.
#[derive(Debug, Clone, Default)]
pub struct MetricSeries {
    names: Vec<String>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
    rows: usize,
}

impl MetricSeries {
    pub fn from_rows(rows: &[HistoryRow], requested: &[String]) -> Self {
        let mut names: Vec<String> = Vec::new();
        for name in requested {
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        }

        let mut columns: BTreeMap<String, Vec<Option<f64>>> = names
            .iter()
            .map(|n| (n.clone(), Vec::with_capacity(rows.len())))
            .collect();
        for row in rows {
            for name in &names {
                if let Some(column) = columns.get_mut(name) {
                    column.push(row.number(name));
                }
            }
        }

        Self {
            names,
            columns,
            rows: rows.len(),
        }
    }

    /// Number of history rows the series was built from.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Requested metrics that have at least one non-missing value, in the
    /// order they were requested.
    pub fn available(&self) -> Vec<&str> {
        self.names
            .iter()
            .filter(|n| {
                self.columns
                    .get(n.as_str())
                    .is_some_and(|c| c.iter().any(Option::is_some))
            })
            .map(String::as_str)
            .collect()
    }

    /// The `(row index, value)` pairs that exist for `name`.
    pub fn points(&self, name: &str) -> Vec<(usize, f64)> {
        match self.columns.get(name) {
            Some(column) => column
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.map(|v| (i, v)))
                .collect(),
            None => Vec::new(),
        }
    }
}
