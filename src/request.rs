use std::future::Future;

use reqwest::Client;
use url::Url;

use crate::parse::{extract_form, FormSnapshot};
use crate::{info_time, Result, Year};

/// Where a crawl gets its pages from. Calls are made one at a time, in order.
pub trait PageSource {
    /// Selects `year` in the maker-grouped view and returns the full page.
    fn prime(&mut self, year: Year) -> impl Future<Output = Result<String>> + Send;

    /// Re-requests the primed view, which shows the first page of the year.
    fn first_page(&mut self, year: Year) -> impl Future<Output = Result<String>> + Send;

    /// Requests `page_size` rows starting at row `offset`.
    fn page(
        &mut self,
        year: Year,
        offset: usize,
        page_size: usize,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// A page together with the form it carries, kept to build the requests that follow it.
#[derive(Debug, Clone)]
struct PrimedView {
    year: Year,
    url: Url,
    form: FormSnapshot,
}

/// Talks to the dashboard over its JSF form posts.
pub struct DashboardClient {
    client: Client,
    category_filter: String,
    landing: FormSnapshot,
    // Only one year is in flight at a time.
    primed: Option<PrimedView>,
}

impl DashboardClient {
    /// Opens a session on the dashboard and snapshots its landing form.
    pub async fn connect(url: &str, category_filter: &str) -> Result<Self> {
        let client = Client::builder().cookie_store(true).build()?;
        let url = Url::parse(url)?;

        info_time!("Opening dashboard session: {}", url);
        let res = client.get(url).send().await?.error_for_status()?;
        let page_url = res.url().clone();
        let html = res.text().await?;
        let landing = extract_form(html, page_url).await?;

        Ok(Self {
            client,
            category_filter: category_filter.into(),
            landing,
            primed: None,
        })
    }

    fn year_fields(&self, year: Year) -> Vec<(&'static str, String)> {
        vec![
            ("yaxisVar_input", "Maker".into()),
            ("xaxisVar_input", "Vehicle Category".into()),
            ("javax.faces.source", "j_idt76".into()),
            ("javax.faces.partial.execute", "@all".into()),
            (
                "javax.faces.partial.render",
                "VhCatg norms fuel VhClass combTablePnl groupingTable msg vhCatgPnl".into(),
            ),
            ("selectedYear_input", year.to_string()),
            ("j_idt76", "j_idt76".into()),
            ("groupingTable:selectMonth_focus", String::new()),
            ("groupingTable:selectCatgType_focus", String::new()),
            ("groupingTable:selectCatgType_input", self.category_filter.clone()),
            ("groupingTable_scrollState", "0,0".into()),
        ]
    }

    fn page_fields(&self, offset: usize, page_size: usize) -> Vec<(&'static str, String)> {
        vec![
            ("javax.faces.partial.ajax", "true".into()),
            ("javax.faces.source", "groupingTable".into()),
            ("javax.faces.partial.execute", "groupingTable".into()),
            ("javax.faces.partial.render", "groupingTable".into()),
            ("groupingTable", "groupingTable".into()),
            ("groupingTable_pagination", "true".into()),
            ("groupingTable_first", offset.to_string()),
            ("groupingTable_rows", page_size.to_string()),
            ("groupingTable_skipChildren", "true".into()),
            ("groupingTable_encodeFeature", "true".into()),
            ("groupingTable:selectMonth_focus", String::new()),
            ("groupingTable:selectCatgType_focus", String::new()),
            ("groupingTable:selectCatgType_input", self.category_filter.clone()),
            ("groupingTable_scrollState", "0,0".into()),
        ]
    }

    fn primed(&self, year: Year) -> Result<&PrimedView> {
        self.primed
            .as_ref()
            .filter(|view| view.year == year)
            .ok_or_else(|| crate::Error::MissingForm(format!("no primed view for {year}")))
    }
}

impl PageSource for DashboardClient {
    async fn prime(&mut self, year: Year) -> Result<String> {
        let form = self.landing.with_overrides(&self.year_fields(year));
        let res = self
            .client
            .post(self.landing.action.clone())
            .form(&form)
            .send()
            .await?
            .error_for_status()?;
        let url = res.url().clone();
        let html = res.text().await?;

        let form = extract_form(html.clone(), url.clone()).await?;
        self.primed = Some(PrimedView { year, url, form });
        Ok(html)
    }

    async fn first_page(&mut self, year: Year) -> Result<String> {
        let url = self.primed(year)?.url.clone();
        let res = self.client.get(url).send().await?.error_for_status()?;
        Ok(res.text().await?)
    }

    async fn page(&mut self, year: Year, offset: usize, page_size: usize) -> Result<String> {
        let view = self.primed(year)?;
        let form = view.form.with_overrides(&self.page_fields(offset, page_size));
        let res = self
            .client
            .post(view.form.action.clone())
            .form(&form)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> DashboardClient {
        DashboardClient {
            client: Client::new(),
            category_filter: "A".into(),
            landing: FormSnapshot {
                action: Url::parse("https://example.org/report.xhtml").unwrap(),
                fields: vec![("javax.faces.ViewState".into(), "1:2".into())],
            },
            primed: None,
        }
    }

    fn field<'a>(fields: &'a [(&str, String)], name: &str) -> &'a str {
        fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn year_form_selects_maker_grouping() {
        let c = client();
        let fields = c.year_fields(2022);
        assert_eq!(field(&fields, "selectedYear_input"), "2022");
        assert_eq!(field(&fields, "yaxisVar_input"), "Maker");
        assert_eq!(field(&fields, "groupingTable:selectCatgType_input"), "A");
    }

    #[test]
    fn page_form_carries_offset() {
        let c = client();
        let fields = c.page_fields(50, 25);
        assert_eq!(field(&fields, "groupingTable_first"), "50");
        assert_eq!(field(&fields, "groupingTable_rows"), "25");
        assert_eq!(field(&fields, "groupingTable:selectCatgType_input"), "A");

        let posted = c.landing.with_overrides(&fields);
        assert_eq!(posted[0].0, "javax.faces.ViewState");
        assert_eq!(posted.len(), fields.len() + 1);
    }

    #[test]
    fn paging_needs_the_year_primed() {
        let mut c = client();
        assert!(c.primed(2020).is_err());
        c.primed = Some(PrimedView {
            year: 2021,
            url: Url::parse("https://example.org/report.xhtml").unwrap(),
            form: c.landing.clone(),
        });
        assert!(c.primed(2020).is_err());
        assert!(c.primed(2021).is_ok());
    }
}
