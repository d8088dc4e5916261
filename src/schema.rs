use crate::parse::extract_header;
use crate::{Error, Result};

/// Column names of the grouping table, captured once from the first page and
/// applied to every year.
///
/// The leading serial-number column is not part of it. The first
/// `identifier_columns` names label the row (the maker), the rest are the
/// figure categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: Vec<String>,
    identifier_columns: usize,
}

impl ColumnSchema {
    /// Reads the header of the primed page.
    pub async fn capture(body: String, identifier_columns: usize) -> Result<Self> {
        let header = extract_header(body)
            .await?
            .ok_or_else(|| Error::SchemaUnresolved("no header in the grouping table".into()))?;
        Self::from_header(header, identifier_columns)
    }

    /// Builds the schema from a raw header row, serial-number column included.
    pub fn from_header(header: Vec<String>, identifier_columns: usize) -> Result<Self> {
        let columns: Vec<String> = header.into_iter().skip(1).collect();

        if columns.len() <= identifier_columns {
            return Err(Error::SchemaUnresolved(format!(
                "{} column(s) after the serial number, need more than {identifier_columns}",
                columns.len()
            )));
        }
        if let Some(i) = columns.iter().position(|c| c.is_empty()) {
            return Err(Error::SchemaUnresolved(format!("column {} has no name", i + 1)));
        }

        Ok(Self {
            columns,
            identifier_columns,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Figures a complete maker row carries.
    pub fn expected_width(&self) -> usize {
        self.columns.len() - self.identifier_columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn drops_serial_number() {
        let schema =
            ColumnSchema::from_header(header(&["S No", "Maker", "2W", "3W", "LMV"]), 1).unwrap();
        assert_eq!(schema.columns(), ["Maker", "2W", "3W", "LMV"]);
        assert_eq!(schema.expected_width(), 3);
    }

    #[test]
    fn needs_a_category_column() {
        for cols in [&[][..], &["S No"][..], &["S No", "Maker"][..]] {
            let err = ColumnSchema::from_header(header(cols), 1).unwrap_err();
            assert!(matches!(err, Error::SchemaUnresolved(_)), "{cols:?}");
        }
    }

    #[test]
    fn rejects_unnamed_columns() {
        let err = ColumnSchema::from_header(header(&["S No", "Maker", ""]), 1).unwrap_err();
        assert!(matches!(err, Error::SchemaUnresolved(_)));
    }

    #[tokio::test]
    async fn capture_from_page() {
        let body = r#"<div id="groupingTable"><table><thead>
            <tr><th>S No</th><th>Maker</th><th>TWO WHEELER(NT)</th><th>TOTAL</th></tr>
            </thead><tbody></tbody></table></div>"#;
        let schema = ColumnSchema::capture(body.into(), 1).await.unwrap();
        assert_eq!(schema.columns(), ["Maker", "TWO WHEELER(NT)", "TOTAL"]);
    }

    #[tokio::test]
    async fn capture_without_table() {
        let err = ColumnSchema::capture("<p>maintenance</p>".into(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SchemaUnresolved(_)));
    }
}
