use std::path::{Path, PathBuf};

use tokio::{fs::File, io::AsyncWriteExt};

use crate::consolidate::MakerRecords;
use crate::schema::ColumnSchema;
use crate::validate::{validate, Anomaly};
use crate::Year;

const YEAR_COLUMN: &str = "year";

/// A year's records laid out under `[year] + schema`, ready for the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedTable {
    year: Year,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    anomalies: Vec<Anomaly>,
}

impl FinishedTable {
    /// Lays out every record as `[year, maker] + figures`.
    /// Rows whose width doesn't fit the schema are kept and reported as anomalies.
    pub fn assemble(year: Year, schema: &ColumnSchema, records: MakerRecords) -> Self {
        let anomalies = validate(&records, schema.expected_width());

        let mut header = Vec::with_capacity(schema.columns().len() + 1);
        header.push(YEAR_COLUMN.to_string());
        header.extend_from_slice(schema.columns());

        let year_cell = year.to_string();
        let rows = records
            .into_iter()
            .map(|record| {
                let mut row = Vec::with_capacity(record.figures.len() + 2);
                row.push(year_cell.clone());
                row.push(record.label);
                row.extend(record.figures);
                row
            })
            .collect();

        Self {
            year,
            header,
            rows,
            anomalies,
        }
    }

    pub fn year(&self) -> Year {
        self.year
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// `<year>_data.csv`
    pub fn file_name(year: Year) -> String {
        format!("{year}_data.csv")
    }

    /// Comma separated, header first. Cells are written as scraped and only quoted when needed.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in std::iter::once(&self.header).chain(&self.rows) {
            let line = row.iter().map(|c| csv_field(c)).collect::<Vec<_>>().join(",");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Writes the table into `dir` and returns the path of the file.
    pub async fn write_csv(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(Self::file_name(self.year));
        let mut file = File::create(&path).await?;
        file.write_all(self.to_csv().as_bytes()).await?;
        file.flush().await?;
        Ok(path)
    }
}

fn csv_field(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
