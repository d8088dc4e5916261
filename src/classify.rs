use std::sync::OnceLock;

use regex::Regex;

/// Digits, optionally grouped with `,` or `.` (`1,234`, `12.345.678`).
const FIGURE_PATTERN: &str = r"^\d+(?:[,.]\d+)*$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// Names a maker, opens a new row.
    Label,
    /// A sales count, kept as the raw text.
    Figure,
}

/// Decides whether a scraped token names a row or holds one of its figures.
pub trait TokenClassifier {
    fn classify(&self, token: &str) -> TokenClass;
}

impl<F> TokenClassifier for F
where
    F: Fn(&str) -> TokenClass,
{
    fn classify(&self, token: &str) -> TokenClass {
        self(token)
    }
}

/// Classifies a token as a figure when the whole of it matches a regex.
#[derive(Debug, Clone)]
pub struct RegexClassifier {
    figure: Regex,
}

impl RegexClassifier {
    /// `pattern` has to match the entire token, anchor it accordingly.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            figure: Regex::new(pattern)?,
        })
    }
}

impl Default for RegexClassifier {
    fn default() -> Self {
        static FIGURE: OnceLock<Regex> = OnceLock::new();
        let figure = FIGURE
            .get_or_init(|| Regex::new(FIGURE_PATTERN).expect("figure pattern is valid"))
            .clone();
        Self { figure }
    }
}

impl TokenClassifier for RegexClassifier {
    fn classify(&self, token: &str) -> TokenClass {
        if self.figure.is_match(token) {
            TokenClass::Figure
        } else {
            TokenClass::Label
        }
    }
}
