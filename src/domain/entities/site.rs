//! Site topology: routable roots with per-language base URLs.

use serde::{Deserialize, Serialize};
use url::Url;

use super::redirect::ANY_HOST;

fn default_true() -> bool {
    true
}

fn default_status_code() -> u16 {
    307
}

/// Per-site behaviour of automatic redirect creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRedirectSettings {
    #[serde(default = "default_true")]
    pub auto_create: bool,
    #[serde(default = "default_status_code")]
    pub http_status_code: u16,
}

impl Default for SiteRedirectSettings {
    fn default() -> Self {
        Self {
            auto_create: true,
            http_status_code: default_status_code(),
        }
    }
}

/// A language variant of a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLanguage {
    pub language_id: i64,
    /// Absolute URL or a path relative to the site base.
    pub base: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl SiteLanguage {
    /// Implicit default language of a site without language configuration.
    pub fn implicit_default() -> Self {
        Self {
            language_id: 0,
            base: "/".to_string(),
            title: "Default".to_string(),
            enabled: true,
        }
    }
}

/// A routable page tree root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub identifier: String,
    pub root_page_id: i64,
    pub base: String,
    #[serde(default)]
    pub languages: Vec<SiteLanguage>,
    /// Default page type suffix appended to every non-root page path, e.g.
    /// `/` or `.html`.
    #[serde(default)]
    pub route_suffix: Option<String>,
    #[serde(default)]
    pub redirects: SiteRedirectSettings,
}

impl Site {
    pub fn base(&self) -> SiteBase {
        SiteBase::parse(&self.base)
    }

    /// Configured languages, or the implicit default language.
    pub fn languages(&self) -> Vec<SiteLanguage> {
        if self.languages.is_empty() {
            vec![SiteLanguage::implicit_default()]
        } else {
            self.languages.clone()
        }
    }

    pub fn enabled_languages(&self) -> Vec<SiteLanguage> {
        self.languages().into_iter().filter(|l| l.enabled).collect()
    }

    pub fn language(&self, language_id: i64) -> Option<SiteLanguage> {
        self.languages()
            .into_iter()
            .find(|l| l.language_id == language_id)
    }

    /// Effective base of a language: absolute language bases win, relative
    /// ones are appended to the site base.
    pub fn language_base(&self, language: &SiteLanguage) -> SiteBase {
        self.base().resolve(&SiteBase::parse(&language.base))
    }

    /// Public URL path of a page path (`/` or `/a/b`) below `base`, with the
    /// route suffix applied to non-root pages.
    pub fn page_url_path(&self, base: &SiteBase, page_path: &str) -> String {
        let path = base.url_path(page_path);
        match self.route_suffix.as_deref() {
            Some(suffix) if !suffix.is_empty() && page_path != "/" && !path.ends_with(suffix) => {
                format!("{path}{suffix}")
            }
            _ => path,
        }
    }
}

/// Parsed base URL of a site or language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteBase {
    pub scheme: Option<String>,
    /// Host including a non-default port, `None` for host-less bases.
    pub host: Option<String>,
    /// Always starts and ends with `/`.
    pub path: String,
}

impl SiteBase {
    pub fn parse(base: &str) -> Self {
        if let Ok(url) = Url::parse(base)
            && let Some(host) = url.host_str()
        {
            let host = match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            return Self {
                scheme: Some(url.scheme().to_string()),
                host: Some(host),
                path: directory_path(url.path()),
            };
        }

        if let Some(rest) = base.strip_prefix("//") {
            let (host, path) = rest.split_once('/').unwrap_or((rest, ""));
            return Self {
                scheme: None,
                host: (!host.is_empty()).then(|| host.to_string()),
                path: directory_path(path),
            };
        }

        Self {
            scheme: None,
            host: None,
            path: directory_path(base),
        }
    }

    /// Resolves `other` against this base.
    pub fn resolve(&self, other: &SiteBase) -> SiteBase {
        if other.host.is_some() {
            return SiteBase {
                scheme: other.scheme.clone().or_else(|| self.scheme.clone()),
                ..other.clone()
            };
        }
        SiteBase {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            path: directory_path(&format!("{}{}", self.path, other.path.trim_start_matches('/'))),
        }
    }

    /// Host used as redirect source host: the explicit host or `*`.
    pub fn source_host(&self) -> &str {
        self.host.as_deref().unwrap_or(ANY_HOST)
    }

    /// Joins a page path (`/` or `/a/b`) onto the base path.
    pub fn url_path(&self, page_path: &str) -> String {
        let prefix = self.path.trim_end_matches('/');
        if page_path == "/" {
            return format!("{prefix}/");
        }
        format!("{prefix}/{}", page_path.trim_start_matches('/'))
    }

    /// True if `path` lies below this base.
    pub fn contains_path(&self, path: &str) -> bool {
        path.starts_with(&self.path) || format!("{path}/") == self.path
    }
}

fn directory_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}
