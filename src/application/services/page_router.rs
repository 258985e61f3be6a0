//! Site topology queries over the page tree.
//!
//! Full page paths are derived from the rootline: every page contributes its
//! slug segment in the requested language, falling back to the default
//! language segment where no translation exists.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use url::Url;

use crate::domain::entities::{PageRecord, Site, SiteBase, SiteLanguage};
use crate::domain::repositories::PageRepository;
use crate::domain::site_finder::SiteFinder;
use crate::error::AppError;

/// A page located in a site, together with the rootline used to place it.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlacement {
    pub site: Site,
    /// Default-language records from the site root down to the page.
    pub rootline: Vec<PageRecord>,
}

/// A page that is routable in one language.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPage {
    pub site: Site,
    pub language: SiteLanguage,
    pub base: SiteBase,
    /// Public URL path including the language base and route suffix.
    pub path: String,
    /// Default and language record of the page.
    pub default_record: PageRecord,
    pub record: PageRecord,
}

impl ResolvedPage {
    /// Whether a visitor in `groups` may see the page.
    pub fn is_accessible_for(&self, groups: &[i64]) -> bool {
        self.default_record.is_accessible_for(groups) && self.record.is_accessible_for(groups)
    }

    /// Absolute URL of the page. Host-less bases take scheme and host from
    /// `fallback`.
    pub fn url(&self, fallback: Option<&Url>) -> Option<Url> {
        match (&self.base.host, fallback) {
            (Some(host), _) => {
                let scheme = self
                    .base
                    .scheme
                    .as_deref()
                    .or_else(|| fallback.map(Url::scheme))
                    .unwrap_or("https");
                Url::parse(&format!("{scheme}://{host}{}", self.path)).ok()
            }
            (None, Some(fallback)) => fallback.join(&self.path).ok(),
            (None, None) => None,
        }
    }
}

/// Segment of a page in a language: the translation's slug when present,
/// the default slug otherwise.
pub fn segment_in<'a>(default: &'a PageRecord, version: Option<&'a PageRecord>) -> &'a str {
    version.map_or(default.slug.as_str(), |v| v.slug.as_str())
}

/// Joins non-empty segments into a page path (`/` for none).
pub fn join_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let joined: Vec<&str> = segments.into_iter().filter(|s| !s.is_empty()).collect();
    format!("/{}", joined.join("/"))
}

/// A page version is visible when both its default record and the language
/// record are.
pub fn version_visible_at(default: &PageRecord, version: &PageRecord, now: DateTime<Utc>) -> bool {
    default.is_visible_at(now) && version.is_visible_at(now)
}

/// Whether a page hides its subtree in a language.
pub fn hides_subpages_in(
    default: &PageRecord,
    version: Option<&PageRecord>,
    now: DateTime<Utc>,
) -> bool {
    default.hides_subpages_at(now) || version.is_some_and(|v| v.hides_subpages_at(now))
}

/// Implements the site topology interface (`resolve_path`,
/// `routable_sites_languages_for`) and URL building for internal targets.
#[derive(Clone)]
pub struct PageRouter {
    sites: Arc<SiteFinder>,
}

impl PageRouter {
    pub fn new(sites: Arc<SiteFinder>) -> Self {
        Self { sites }
    }

    pub fn sites(&self) -> &SiteFinder {
        &self.sites
    }

    /// Walks from `page_id` up to the closest site root.
    ///
    /// Returns `None` if the page does not exist, is not below any configured
    /// site root, or its parent chain is broken or cyclic.
    pub async fn placement<P>(
        &self,
        pages: &P,
        page_id: i64,
    ) -> Result<Option<PagePlacement>, AppError>
    where
        P: PageRepository + ?Sized,
    {
        let mut rootline = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(page_id);

        while let Some(id) = current {
            if !seen.insert(id) {
                tracing::warn!(page_id, "Cyclic page tree detected");
                return Ok(None);
            }
            let Some(record) = pages.find_page(id, 0).await? else {
                return Ok(None);
            };
            current = record.parent_id;
            rootline.push(record);

            if let Some(site) = self.sites.by_root_page_id(id) {
                rootline.reverse();
                return Ok(Some(PagePlacement {
                    site: site.clone(),
                    rootline,
                }));
            }
        }

        Ok(None)
    }

    /// Resolves a page in a language if it is currently routable there.
    ///
    /// A page is routable when it exists in the language, its default record
    /// has a routable page type, both records are visible, and no ancestor
    /// hides its subtree.
    pub async fn resolve_page<P>(
        &self,
        pages: &P,
        page_id: i64,
        language_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<ResolvedPage>, AppError>
    where
        P: PageRepository + ?Sized,
    {
        let Some(placement) = self.placement(pages, page_id).await? else {
            return Ok(None);
        };
        let Some(language) = placement
            .site
            .language(language_id)
            .filter(|language| language.enabled)
        else {
            return Ok(None);
        };

        let mut segments = Vec::with_capacity(placement.rootline.len());
        let last = placement.rootline.len() - 1;
        let mut resolved_record = None;

        for (index, default) in placement.rootline.iter().enumerate() {
            let version = if language_id == 0 {
                None
            } else {
                pages.find_page(default.id, language_id).await?
            };

            if index == last {
                let record = match (language_id, version.as_ref()) {
                    (0, _) => default.clone(),
                    (_, Some(version)) => version.clone(),
                    (_, None) => return Ok(None),
                };
                if !default.page_type.is_routable()
                    || !version_visible_at(default, &record, now)
                {
                    return Ok(None);
                }
                segments.push(record.slug.clone());
                resolved_record = Some(record);
            } else {
                if hides_subpages_in(default, version.as_ref(), now) {
                    return Ok(None);
                }
                segments.push(segment_in(default, version.as_ref()).to_string());
            }
        }

        let Some(record) = resolved_record else {
            return Ok(None);
        };
        let base = placement.site.language_base(&language);
        let page_path = join_segments(segments.iter().map(String::as_str));
        let path = placement.site.page_url_path(&base, &page_path);

        Ok(Some(ResolvedPage {
            default_record: placement.rootline[last].clone(),
            site: placement.site,
            language,
            base,
            path,
            record,
        }))
    }

    /// URL path of a routable page in a language of a given site.
    pub async fn resolve_path<P>(
        &self,
        pages: &P,
        page_id: i64,
        language_id: i64,
        site_identifier: &str,
    ) -> Result<Option<String>, AppError>
    where
        P: PageRepository + ?Sized,
    {
        Ok(self
            .resolve_page(pages, page_id, language_id, Utc::now())
            .await?
            .filter(|resolved| resolved.site.identifier == site_identifier)
            .map(|resolved| resolved.path))
    }

    /// Every `(site, language)` pair in which the page is currently routable.
    pub async fn routable_sites_languages_for<P>(
        &self,
        pages: &P,
        page_id: i64,
    ) -> Result<Vec<(String, i64)>, AppError>
    where
        P: PageRepository + ?Sized,
    {
        let Some(placement) = self.placement(pages, page_id).await? else {
            return Ok(Vec::new());
        };

        let now = Utc::now();
        let mut pairs = Vec::new();
        for language in placement.site.enabled_languages() {
            if self
                .resolve_page(pages, page_id, language.language_id, now)
                .await?
                .is_some()
            {
                pairs.push((placement.site.identifier.clone(), language.language_id));
            }
        }
        Ok(pairs)
    }
}
