//! Rebuilds maker rows from the flat run of label texts a year's pages produce.
//!
//! The table cells arrive without row boundaries: a maker name followed by its
//! figures, then the next maker. Every row but the last also leaks the first
//! cell of the following row (its serial number) into the figures scanned
//! before the next maker name, so a row closed by a label loses its last
//! buffered figure while the final row of the stream keeps all of them.

use std::collections::HashMap;
use std::mem::take;

use crate::classify::{TokenClass, TokenClassifier};
use crate::{Error, Result};

/// One reconstructed row: the maker and its figures as scraped text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakerRecord {
    pub label: String,
    pub figures: Vec<String>,
}

/// Maker records in the order their labels first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MakerRecords {
    records: Vec<MakerRecord>,
    index: HashMap<String, usize>,
}

impl MakerRecords {
    /// Inserts a record. A label seen before keeps its position and takes the new figures.
    pub fn insert(&mut self, label: String, figures: Vec<String>) {
        match self.index.get(&label) {
            Some(&i) => self.records[i].figures = figures,
            None => {
                self.index.insert(label.clone(), self.records.len());
                self.records.push(MakerRecord { label, figures });
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.index
            .get(label)
            .map(|&i| self.records[i].figures.as_slice())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MakerRecord> {
        self.records.iter()
    }
}

impl IntoIterator for MakerRecords {
    type Item = MakerRecord;
    type IntoIter = std::vec::IntoIter<MakerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Consumes a year's token stream and returns its maker records.
///
/// Figures seen before the first label have no row to go to and are dropped.
/// A non-empty stream without any label is an error.
pub fn consolidate<C>(tokens: Vec<String>, classifier: &C) -> Result<MakerRecords>
where
    C: TokenClassifier + ?Sized,
{
    let mut records = MakerRecords::default();
    let mut figures: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    let total = tokens.len();

    for (i, token) in tokens.into_iter().enumerate() {
        match classifier.classify(&token) {
            TokenClass::Label => {
                if let Some(label) = current.take() {
                    // Last figure belongs to the row this label opens.
                    figures.pop();
                    records.insert(label, take(&mut figures));
                }
                current = Some(token);
            }
            TokenClass::Figure => {
                if current.is_some() {
                    figures.push(token);
                }
            }
        }

        if i + 1 == total {
            let label = current.take().ok_or_else(|| {
                Error::Consolidation(format!("no label among {total} tokens"))
            })?;
            records.insert(label, take(&mut figures));
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RegexClassifier;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn run(raw: &[&str]) -> Result<MakerRecords> {
        consolidate(tokens(raw), &RegexClassifier::default())
    }

    #[test]
    fn empty_stream() {
        assert!(run(&[]).unwrap().is_empty());
    }

    #[test]
    fn closed_rows_drop_their_last_figure() {
        let records = run(&["Maker1", "100", "200", "Maker2", "300", "400", "500"]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.get("Maker1").unwrap(), ["100"]);
        assert_eq!(records.get("Maker2").unwrap(), ["300", "400", "500"]);
    }

    #[test]
    fn rows_keep_first_seen_order() {
        let records = run(&["B", "1", "2", "A", "3", "4", "C", "5"]).unwrap();
        let labels: Vec<_> = records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["B", "A", "C"]);
    }

    #[test]
    fn leading_figures_are_dropped() {
        let records = run(&["7", "8", "Alpha", "1", "2"]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records.get("Alpha").unwrap(), ["1", "2"]);
    }

    #[test]
    fn adjacent_labels_yield_empty_rows() {
        let records = run(&["A", "B", "C"]).unwrap();
        assert_eq!(records.len(), 3);
        for r in records.iter() {
            assert!(r.figures.is_empty(), "{}", r.label);
        }

        let records = run(&["A", "B", "1", "2"]).unwrap();
        assert_eq!(records.get("A").unwrap(), [] as [String; 0]);
        assert_eq!(records.get("B").unwrap(), ["1", "2"]);
    }

    #[test]
    fn stream_ending_on_a_label() {
        let records = run(&["A", "1", "2", "B"]).unwrap();
        assert_eq!(records.get("A").unwrap(), ["1"]);
        assert_eq!(records.get("B").unwrap(), [] as [String; 0]);
    }

    #[test]
    fn every_label_yields_one_entry() {
        let raw = ["1", "X", "2", "3", "Y", "Z", "4", "W", "5", "6", "7"];
        let labels = raw.iter().filter(|t| t.parse::<u32>().is_err()).count();
        assert_eq!(run(&raw).unwrap().len(), labels);
    }

    #[test]
    fn repeated_label_keeps_its_slot() {
        let records = run(&["A", "1", "2", "B", "3", "4", "A", "5", "6"]).unwrap();
        let labels: Vec<_> = records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["A", "B"]);
        assert_eq!(records.get("A").unwrap(), ["5", "6"]);
    }

    #[test]
    fn grouped_figures_stay_verbatim() {
        let records = run(&["Alpha", "1,234", "5.678"]).unwrap();
        assert_eq!(records.get("Alpha").unwrap(), ["1,234", "5.678"]);
    }

    #[test]
    fn figures_only_is_an_error() {
        let err = run(&["1", "2", "3"]).unwrap_err();
        assert!(matches!(err, Error::Consolidation(_)));
    }
}
