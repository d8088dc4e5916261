use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Couldn't resolve the column schema from the table header: {0}")]
    SchemaUnresolved(String),

    #[error("Couldn't consolidate the label stream: {0}")]
    Consolidation(String),

    #[error("The selector you are trying to scrape for is missing. Selector: {0}")]
    ParseMissingSelector(String),
    #[error("The page doesn't contain a form to submit. Page: {0}")]
    MissingForm(String),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Url Error: {0}")]
    UrlParse(#[from] url::ParseError),
}
