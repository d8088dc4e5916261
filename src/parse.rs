use std::borrow::Cow;

use scraper::{ElementRef, Html, Selector};
use tokio::task::spawn_blocking;
use url::Url;

use crate::{Error, Result};

const LABEL_SELECTOR: &str = "#groupingTable label";
const HEADER_ROW_SELECTOR: &str = "#groupingTable thead tr";
const HEADER_CELL_SELECTOR: &str = "th";
const FORM_SELECTOR: &str = "form";
const FIELD_SELECTOR: &str = "input[name], select[name], textarea[name]";
const OPTION_SELECTOR: &str = "option";

/// Pulls the text of every `<label>` in the grouping table, in document order.
/// Blank labels are skipped.
pub async fn extract_labels(body: String) -> Result<Vec<String>> {
    spawn_blocking(move || labels_from_html(&body)).await?
}

/// Returns the bottom row of the grouping table header with row and column spans expanded.
/// `None` when the page has no such header.
pub async fn extract_header(body: String) -> Result<Option<Vec<String>>> {
    spawn_blocking(move || header_from_html(&body)).await?
}

/// Snapshots the first form of the page, resolving its action against `page_url`.
pub async fn extract_form(body: String, page_url: Url) -> Result<FormSnapshot> {
    spawn_blocking(move || form_from_html(&body, &page_url)).await?
}

pub(crate) fn labels_from_html(body: &str) -> Result<Vec<String>> {
    let doc = Html::parse_document(&unwrap_partial_response(body));
    let label_selector = create_selector(LABEL_SELECTOR)?;

    let labels = doc
        .select(&label_selector)
        .map(|label| collapse_ws(&label.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect();
    Ok(labels)
}

pub(crate) fn header_from_html(body: &str) -> Result<Option<Vec<String>>> {
    let doc = Html::parse_document(&unwrap_partial_response(body));
    let row_selector = create_selector(HEADER_ROW_SELECTOR)?;
    let cell_selector = create_selector(HEADER_CELL_SELECTOR)?;

    // Spans are laid out the way a browser would, so a cell with `rowspan`
    // shows up in every header row it covers.
    let mut grid: Vec<Vec<Option<String>>> = Vec::new();
    for (r, row) in doc.select(&row_selector).enumerate() {
        if grid.len() <= r {
            grid.resize_with(r + 1, Vec::new);
        }
        let mut c = 0;
        for cell in row.select(&cell_selector) {
            while grid[r].get(c).is_some_and(Option::is_some) {
                c += 1;
            }
            let text = collapse_ws(&cell.text().collect::<String>());
            let rowspan = span(&cell, "rowspan");
            let colspan = span(&cell, "colspan");
            for dr in 0..rowspan {
                if grid.len() <= r + dr {
                    grid.resize_with(r + dr + 1, Vec::new);
                }
                let target = &mut grid[r + dr];
                if target.len() < c + colspan {
                    target.resize(c + colspan, None);
                }
                for slot in &mut target[c..c + colspan] {
                    *slot = Some(text.clone());
                }
            }
            c += colspan;
        }
    }

    let header: Option<Vec<String>> = grid
        .pop()
        .map(|row| row.into_iter().map(Option::unwrap_or_default).collect());
    Ok(header)
}

/// The fields a browser would submit for a form, ready to be overridden and posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSnapshot {
    pub action: Url,
    pub fields: Vec<(String, String)>,
}

impl FormSnapshot {
    /// Replaces fields present in `overrides` and appends the rest, keeping the form's order.
    pub fn with_overrides(&self, overrides: &[(&str, String)]) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = self
            .fields
            .iter()
            .map(|(name, value)| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map_or_else(|| value.clone(), |(_, v)| v.clone());
                (name.clone(), value)
            })
            .collect();
        for (key, value) in overrides {
            if !fields.iter().any(|(name, _)| name == key) {
                fields.push((key.to_string(), value.clone()));
            }
        }
        fields
    }
}

pub(crate) fn form_from_html(body: &str, page_url: &Url) -> Result<FormSnapshot> {
    let doc = Html::parse_document(body);
    let form_selector = create_selector(FORM_SELECTOR)?;
    let field_selector = create_selector(FIELD_SELECTOR)?;
    let option_selector = create_selector(OPTION_SELECTOR)?;

    let form = doc
        .select(&form_selector)
        .next()
        .ok_or_else(|| Error::MissingForm(page_url.to_string()))?;

    let action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => page_url.join(action)?,
        _ => page_url.clone(),
    };

    let mut fields = Vec::new();
    for field in form.select(&field_selector) {
        let el = field.value();
        let Some(name) = el.attr("name") else {
            continue;
        };
        let value = match el.name() {
            "input" => {
                let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
                match kind.as_str() {
                    "submit" | "reset" | "button" | "image" | "file" => continue,
                    "checkbox" | "radio" if el.attr("checked").is_none() => continue,
                    "checkbox" | "radio" => el.attr("value").unwrap_or("on").to_string(),
                    _ => el.attr("value").unwrap_or_default().to_string(),
                }
            }
            "select" => {
                let mut options = field.select(&option_selector);
                let chosen = field
                    .select(&option_selector)
                    .find(|o| o.value().attr("selected").is_some())
                    .or_else(|| options.next());
                match chosen {
                    Some(option) => option_value(&option),
                    None => continue,
                }
            }
            _ => field.text().collect(),
        };
        fields.push((name.to_string(), value));
    }

    Ok(FormSnapshot { action, fields })
}

/// JSF AJAX answers are XML with the rendered markup in CDATA sections.
/// Those sections are joined and handed to the HTML parser instead.
pub(crate) fn unwrap_partial_response(body: &str) -> Cow<'_, str> {
    if !body.contains("<partial-response") {
        return Cow::Borrowed(body);
    }

    let mut html = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(start) = rest.find("<![CDATA[") {
        rest = &rest[start + "<![CDATA[".len()..];
        let end = rest.find("]]>").unwrap_or(rest.len());
        html.push_str(&rest[..end]);
        rest = rest.get(end + "]]>".len()..).unwrap_or_default();
        // A `]]>` in the payload is split across back-to-back sections.
        if !rest.starts_with("<![CDATA[") {
            html.push('\n');
        }
    }
    Cow::Owned(html)
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}

fn span(cell: &ElementRef, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| v.trim().parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(1)
}

fn option_value(option: &ElementRef) -> String {
    option
        .value()
        .attr("value")
        .map(str::to_string)
        .unwrap_or_else(|| collapse_ws(&option.text().collect::<String>()))
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
