//! Site topology loaded from a JSON file.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::domain::entities::Site;
use crate::domain::site_finder::SiteFinder;

#[derive(Debug, thiserror::Error)]
pub enum SiteConfigError {
    #[error("failed to read site configuration {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid site configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate site identifier '{0}'")]
    DuplicateIdentifier(String),
    #[error("page {0} is the root of more than one site")]
    DuplicateRoot(i64),
    #[error("site '{site}' declares language {language_id} twice")]
    DuplicateLanguage { site: String, language_id: i64 },
    #[error("site '{site}' has no default language 0")]
    MissingDefaultLanguage { site: String },
    #[error("site '{site}' uses status {code} for automatic redirects, expected 3xx")]
    InvalidStatusCode { site: String, code: u16 },
}

#[derive(Debug, Deserialize)]
struct SitesFile {
    sites: Vec<Site>,
}

/// Reads and validates the site file at `path`.
pub fn load_sites(path: impl AsRef<Path>) -> Result<SiteFinder, SiteConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| SiteConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let finder = parse_sites(&raw)?;

    tracing::info!(
        path = %path.display(),
        sites = finder.sites().len(),
        "Site configuration loaded"
    );
    Ok(finder)
}

/// Parses and validates site configuration JSON.
pub fn parse_sites(raw: &str) -> Result<SiteFinder, SiteConfigError> {
    let file: SitesFile = serde_json::from_str(raw)?;
    validate(&file.sites)?;
    Ok(SiteFinder::new(file.sites))
}

fn validate(sites: &[Site]) -> Result<(), SiteConfigError> {
    let mut identifiers = HashSet::new();
    let mut roots = HashSet::new();

    for site in sites {
        if !identifiers.insert(site.identifier.as_str()) {
            return Err(SiteConfigError::DuplicateIdentifier(site.identifier.clone()));
        }
        if !roots.insert(site.root_page_id) {
            return Err(SiteConfigError::DuplicateRoot(site.root_page_id));
        }

        let mut languages = HashSet::new();
        for language in site.languages() {
            if !languages.insert(language.language_id) {
                return Err(SiteConfigError::DuplicateLanguage {
                    site: site.identifier.clone(),
                    language_id: language.language_id,
                });
            }
        }
        if !languages.contains(&0) {
            return Err(SiteConfigError::MissingDefaultLanguage {
                site: site.identifier.clone(),
            });
        }

        let code = site.redirects.http_status_code;
        if !(300..400).contains(&code) {
            return Err(SiteConfigError::InvalidStatusCode {
                site: site.identifier.clone(),
                code,
            });
        }
    }
    Ok(())
}
