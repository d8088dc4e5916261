use std::path::PathBuf;

use chrono::Local;
use tracing::{debug, error};

use crate::classify::{RegexClassifier, TokenClassifier};
use crate::consolidate::consolidate;
use crate::parse::extract_labels;
use crate::request::PageSource;
use crate::schema::ColumnSchema;
use crate::table::FinishedTable;
use crate::validate::Anomaly;
use crate::{info_time, CrawlConfig, Error, Result, Year};

/// Hands out the configured years one at a time, each exactly once.
///
/// Years are taken from the back of the list, so `[2019, 2020, 2021]` is
/// crawled as 2021, 2020, 2019.
#[derive(Debug, Clone)]
pub struct YearSequencer {
    years: Vec<Year>,
}

impl YearSequencer {
    pub fn new(years: Vec<Year>) -> Self {
        Self { years }
    }

    pub fn remaining(&self) -> usize {
        self.years.len()
    }
}

impl Iterator for YearSequencer {
    type Item = Year;

    fn next(&mut self) -> Option<Year> {
        self.years.pop()
    }
}

/// Pagination state of the year being crawled. Created per year, dropped once its tokens are taken.
#[derive(Debug)]
struct CrawlContext {
    year: Year,
    offset: usize,
    pages: usize,
    tokens: Vec<String>,
}

impl CrawlContext {
    fn new(year: Year) -> Self {
        Self {
            year,
            offset: 0,
            pages: 0,
            tokens: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    /// Selects the year. The first year also captures the column schema here.
    SchemaInit,
    /// Always kept, never ends the year.
    FirstPage,
    /// Runs until a page comes back without labels.
    PagedFetch,
    YearDone,
}

/// What became of one year.
#[derive(Debug)]
pub struct YearReport {
    pub year: Year,
    pub records: usize,
    pub anomalies: Vec<Anomaly>,
    /// Path of the written table, or why there is none.
    pub outcome: Result<PathBuf>,
}

impl YearReport {
    fn failed(year: Year, err: Error) -> Self {
        Self {
            year,
            records: 0,
            anomalies: Vec::new(),
            outcome: Err(err),
        }
    }

    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Drives the year loop and the per-year pagination over a [`PageSource`].
pub struct Crawler<S, C = RegexClassifier> {
    source: S,
    classifier: C,
    config: CrawlConfig,
    schema: Option<ColumnSchema>,
}

impl<S: PageSource> Crawler<S> {
    pub fn new(source: S, config: CrawlConfig) -> Self {
        Self::with_classifier(source, config, RegexClassifier::default())
    }
}

impl<S, C> Crawler<S, C>
where
    S: PageSource,
    C: TokenClassifier,
{
    pub fn with_classifier(source: S, config: CrawlConfig, classifier: C) -> Self {
        Self {
            source,
            classifier,
            config,
            schema: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn schema(&self) -> Option<&ColumnSchema> {
        self.schema.as_ref()
    }

    /// Crawls every configured year and writes one table per year.
    ///
    /// A year that fails is reported and the next one is crawled. The run is
    /// aborted when the column schema can't be resolved, since no year can be
    /// laid out without it.
    pub async fn run(&mut self) -> Result<Vec<YearReport>> {
        let start_time = Local::now();
        let mut reports = Vec::with_capacity(self.config.years.len());

        for year in YearSequencer::new(self.config.years.clone()) {
            let year_time = Local::now();
            info_time!("Proceeding with {}", year);

            let table = match self.crawl_table(year).await {
                Ok(table) => table,
                Err(err @ Error::SchemaUnresolved(_)) => return Err(err),
                Err(err) if self.schema.is_none() => return Err(err),
                Err(err) => {
                    error!(year, "year failed: {err}");
                    reports.push(YearReport::failed(year, err));
                    continue;
                }
            };

            let outcome = table
                .write_csv(&self.config.output_dir)
                .await
                .map_err(Error::from);
            match &outcome {
                Ok(path) => info_time!(
                    year_time,
                    "Wrote {} rows of {} to {}",
                    table.rows().len(),
                    table.year(),
                    path.display()
                ),
                Err(err) => error!(year, "couldn't write table: {err}"),
            }
            reports.push(YearReport {
                year,
                records: table.rows().len(),
                anomalies: table.anomalies().to_vec(),
                outcome,
            });
        }

        info_time!(start_time, "All years scraped.");
        Ok(reports)
    }

    async fn crawl_table(&mut self, year: Year) -> Result<FinishedTable> {
        let tokens = self.crawl_year(year).await?;
        let records = consolidate(tokens, &self.classifier)?;
        let schema = self
            .schema
            .as_ref()
            .ok_or_else(|| Error::SchemaUnresolved("schema was never captured".into()))?;
        Ok(FinishedTable::assemble(year, schema, records))
    }

    /// Walks the pages of `year` in order and returns their labels as one stream.
    pub async fn crawl_year(&mut self, year: Year) -> Result<Vec<String>> {
        let page_size = self.config.page_size;
        let mut ctx = CrawlContext::new(year);
        let mut state = DriverState::SchemaInit;

        while state != DriverState::YearDone {
            state = match state {
                DriverState::SchemaInit => {
                    let primed = self.source.prime(year).await?;
                    if self.schema.is_none() {
                        let schema =
                            ColumnSchema::capture(primed, self.config.identifier_columns).await?;
                        info_time!("Captured {} columns", schema.columns().len());
                        self.schema = Some(schema);
                    }
                    DriverState::FirstPage
                }
                DriverState::FirstPage => {
                    let body = self.source.first_page(year).await?;
                    let labels = extract_labels(body).await?;
                    ctx.pages += 1;
                    ctx.tokens.extend(labels);
                    DriverState::PagedFetch
                }
                DriverState::PagedFetch => {
                    debug!(year, page = ctx.pages, row = ctx.offset, "pagination");
                    let body = self.source.page(year, ctx.offset, page_size).await?;
                    ctx.offset += page_size;
                    ctx.pages += 1;
                    let labels = extract_labels(body).await?;
                    if labels.is_empty() {
                        DriverState::YearDone
                    } else {
                        ctx.tokens.extend(labels);
                        DriverState::PagedFetch
                    }
                }
                DriverState::YearDone => DriverState::YearDone,
            };
        }

        info_time!(
            "End of pagination for {} after {} pages, {} tokens",
            ctx.year,
            ctx.pages,
            ctx.tokens.len()
        );
        Ok(ctx.tokens)
    }
}
