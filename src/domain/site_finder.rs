//! Lookup over the configured sites.

use crate::domain::entities::{Site, SiteBase, SiteLanguage};
use crate::utils::extract_host::strip_port;

/// Site and language serving a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteMatch<'a> {
    pub site: &'a Site,
    pub language: SiteLanguage,
    pub base: SiteBase,
}

/// Immutable collection of sites, loaded once at start-up.
#[derive(Debug, Clone, Default)]
pub struct SiteFinder {
    sites: Vec<Site>,
}

impl SiteFinder {
    pub fn new(sites: Vec<Site>) -> Self {
        Self { sites }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn by_identifier(&self, identifier: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.identifier == identifier)
    }

    pub fn by_root_page_id(&self, page_id: i64) -> Option<&Site> {
        self.sites.iter().find(|s| s.root_page_id == page_id)
    }

    /// Finds the site language whose base serves `host` and `path`.
    ///
    /// Bases with an explicit host must match the request host (a base
    /// without port also matches any port); host-less bases match every host.
    /// Among candidates, host-bound bases win, then the longest base path.
    pub fn match_request(&self, host: &str, path: &str) -> Option<SiteMatch<'_>> {
        let mut best: Option<((bool, usize), SiteMatch<'_>)> = None;

        for site in &self.sites {
            for language in site.enabled_languages() {
                let base = site.language_base(&language);
                let host_bound = match base.host.as_deref() {
                    Some(base_host) => {
                        if !host_matches(base_host, host) {
                            continue;
                        }
                        true
                    }
                    None => false,
                };
                if !base.contains_path(path) {
                    continue;
                }

                let score = (host_bound, base.path.len());
                if best.as_ref().is_none_or(|(s, _)| score > *s) {
                    best = Some((
                        score,
                        SiteMatch {
                            site,
                            language,
                            base,
                        },
                    ));
                }
            }
        }

        best.map(|(_, found)| found)
    }
}

fn host_matches(base_host: &str, request_host: &str) -> bool {
    base_host.eq_ignore_ascii_case(request_host)
        || (!base_host.contains(':') && base_host.eq_ignore_ascii_case(strip_port(request_host)))
}
