//! Maker-wise registration figures from the Vahan dashboard, one CSV per year.
//!
//! The dashboard renders its grouping table as a flat run of `<label>` cells,
//! so rows are rebuilt from the token stream in [`consolidate`].

mod error;
mod macros;

pub mod classify;
pub mod consolidate;
pub mod parse;
pub mod process;
pub mod request;
pub mod schema;
pub mod table;
pub mod validate;

pub use error::{Error, Result};

/// A single crawl unit.
pub type Year = u16;

const DASHBOARD_URL: &str =
    "https://vahan.parivahan.gov.in/vahan4dashboard/vahan/view/reportview.xhtml";
/// Processed back to front, see [`process::YearSequencer`].
const YEARS_TO_SCRAPE: [Year; 6] = [2019, 2020, 2021, 2022, 2023, 2024];
/// The dashboard pages its grouping table in blocks of 25 rows.
const PAGE_SIZE: usize = 25;
const CATEGORY_FILTER: &str = "A";
/// Header columns that name the row rather than hold a figure (the maker).
const IDENTIFIER_COLUMNS: usize = 1;
const OUTPUT_DIR: &str = ".";

/// Settings for one crawl run. `Default` gives the production values.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub url: String,
    pub years: Vec<Year>,
    pub page_size: usize,
    pub category_filter: String,
    pub identifier_columns: usize,
    pub output_dir: std::path::PathBuf,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            url: DASHBOARD_URL.into(),
            years: YEARS_TO_SCRAPE.to_vec(),
            page_size: PAGE_SIZE,
            category_filter: CATEGORY_FILTER.into(),
            identifier_columns: IDENTIFIER_COLUMNS,
            output_dir: OUTPUT_DIR.into(),
        }
    }
}
