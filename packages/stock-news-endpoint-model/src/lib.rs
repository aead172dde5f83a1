#[cfg(test)]
mod tests;

use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Ticker symbol. Compared exactly, case-sensitive.
#[derive(Hash, Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(pub String);

impl Symbol {
    pub const fn new(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for Symbol {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

/// A news article. None of the fields are validated; absent fields are read as empty.
#[derive(Deserialize, Serialize, Clone, Eq, PartialEq, Debug, Default)]
#[serde(default)]
pub struct Article {
    pub symbol: Symbol,
    #[serde(alias = "createdAt")]
    pub created_at: String,
    pub headline: String,
}

impl Article {
    pub fn new(symbol: impl Into<String>, created_at: impl Into<String>, headline: impl Into<String>) -> Self {
        Self {
            symbol: Symbol::new(symbol.into()),
            created_at: created_at.into(),
            headline: headline.into(),
        }
    }
}

/// Query string of `GET /api/v1/articles`.
///
/// `size` is kept as raw text so that the endpoint can tell "absent" from "garbage".
#[derive(Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct FetchArticlesQuery {
    #[serde(default)]
    pub id: Symbol,
    pub size: Option<String>,
}

pub type SaveArticleResult = Result<ArticleSavedNotice, SaveArticleError>;

pub struct ArticleSavedNotice {
    pub symbol: Symbol,
}

#[derive(Eq, PartialEq, Clone, Debug)]
pub enum SaveArticleError {
    MalformedBody(String),
    StorageUnavailable,
    ShuttingDown,
}

pub type FetchArticlesResult = Result<FetchedArticles, FetchArticlesError>;

#[derive(Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct FetchedArticles(pub Vec<Article>);

#[derive(Eq, PartialEq, Clone, Debug)]
pub enum FetchArticlesError {
    InvalidSize(String),
    StorageUnavailable,
    ShuttingDown,
}
