use std::fmt;

use tracing::warn;

use crate::consolidate::MakerRecords;

/// A maker row whose figure count doesn't match the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    pub label: String,
    pub expected: usize,
    pub actual: usize,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} figure(s), expected {}",
            self.label, self.actual, self.expected
        )
    }
}

/// Flags every record whose width differs from `expected`. Records are only read, never dropped.
pub fn validate(records: &MakerRecords, expected: usize) -> Vec<Anomaly> {
    records
        .iter()
        .filter(|r| r.figures.len() != expected)
        .map(|r| {
            let anomaly = Anomaly {
                label: r.label.clone(),
                expected,
                actual: r.figures.len(),
            };
            warn!(figures = ?r.figures, "anomalous record {anomaly}");
            anomaly
        })
        .collect()
}
