//! Redirect target model.
//!
//! A stored target string is decoded once into a [`RedirectTarget`] and the
//! rest of the crate works on the variant, never on the raw string.

use std::fmt;
use std::str::FromStr;

use url::{Url, form_urlencoded};

/// URI scheme of internal page references, e.g. `page://12?_language=1`.
pub const INTERNAL_SCHEME: &str = "page";

/// Query parameter carrying the language of an internal reference.
pub const LANGUAGE_PARAMETER: &str = "_language";

/// Errors raised when a stored target cannot be decoded.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TargetParseError {
    #[error("Target is empty")]
    Empty,

    #[error("Invalid page id in internal target: {0}")]
    InvalidPageId(String),

    #[error("Invalid language id in internal target: {0}")]
    InvalidLanguage(String),

    #[error("Unsupported target scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid target URL: {0}")]
    InvalidUrl(String),
}

/// Reference to a page in a given language, resolved at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalTarget {
    pub page_id: i64,
    pub language_id: i64,
    /// Extra query parameters, in declaration order.
    pub parameters: Vec<(String, String)>,
}

impl InternalTarget {
    pub fn page(page_id: i64, language_id: i64) -> Self {
        Self {
            page_id,
            language_id,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push((key.into(), value.into()));
        self
    }

    /// Encodes the reference as a `page://` URI.
    pub fn to_uri(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair(LANGUAGE_PARAMETER, &self.language_id.to_string());
        for (key, value) in &self.parameters {
            query.append_pair(key, value);
        }
        format!("{INTERNAL_SCHEME}://{}?{}", self.page_id, query.finish())
    }

    fn parse(rest: &str) -> Result<Self, TargetParseError> {
        let (id_part, query) = rest.split_once('?').unwrap_or((rest, ""));
        let id_part = id_part.trim_end_matches('/');
        let page_id = id_part
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| TargetParseError::InvalidPageId(id_part.to_string()))?;

        let mut language_id = 0;
        let mut parameters = Vec::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key == LANGUAGE_PARAMETER {
                language_id = value
                    .parse::<i64>()
                    .ok()
                    .filter(|id| *id >= 0)
                    .ok_or_else(|| TargetParseError::InvalidLanguage(value.to_string()))?;
            } else {
                parameters.push((key.into_owned(), value.into_owned()));
            }
        }

        Ok(Self {
            page_id,
            language_id,
            parameters,
        })
    }
}

/// Decoded redirect target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Absolute `http`/`https` URL, used verbatim.
    External(Url),
    /// Path (or protocol-relative URL) resolved against the current request.
    Relative(String),
    /// Page reference resolved through the site topology.
    Internal(InternalTarget),
}

impl RedirectTarget {
    pub fn parse(raw: &str) -> Result<Self, TargetParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TargetParseError::Empty);
        }

        if let Some(rest) = raw.strip_prefix("page://") {
            return InternalTarget::parse(rest).map(Self::Internal);
        }

        if raw.starts_with('/') || raw.starts_with('?') {
            return Ok(Self::Relative(raw.to_string()));
        }

        match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Self::External(url)),
                other => Err(TargetParseError::UnsupportedScheme(other.to_string())),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Self::Relative(raw.to_string())),
            Err(e) => Err(TargetParseError::InvalidUrl(e.to_string())),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl FromStr for RedirectTarget {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External(url) => f.write_str(url.as_str()),
            Self::Relative(path) => f.write_str(path),
            Self::Internal(target) => f.write_str(&target.to_uri()),
        }
    }
}

impl From<InternalTarget> for RedirectTarget {
    fn from(target: InternalTarget) -> Self {
        Self::Internal(target)
    }
}
