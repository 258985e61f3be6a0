//! Computes the redirects a slug change requires.
//!
//! The renamed page and its subtree are walked breadth-first. For every page
//! and enabled site language the old and new URL paths are derived from the
//! parent's paths plus the page's own segment; a page that was routable in a
//! language and whose path changed yields one [`RedirectCandidate`]. Every
//! changed path is also reported as a [`LiveLocation`], routable or not, so
//! stale rules on the page's new address can be cleared.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};

use crate::application::services::page_router::{
    PageRouter, hides_subpages_in, segment_in, version_visible_at,
};
use crate::domain::change_item::SlugChangeItem;
use crate::domain::entities::{InternalTarget, PageRecord, Site, SiteLanguage};
use crate::domain::events::RedirectCandidate;
use crate::domain::repositories::PageRepository;
use crate::error::AppError;

/// Paths of a branch in one language, before and after the rename.
#[derive(Debug, Clone)]
struct Branch {
    old: String,
    new: String,
    /// An ancestor hides its subtree.
    blocked: bool,
}

impl Branch {
    fn root() -> Self {
        Self {
            old: "/".to_string(),
            new: "/".to_string(),
            blocked: false,
        }
    }

    fn descend(&self, old_segment: &str, new_segment: &str, hides_subpages: bool) -> Self {
        Self {
            old: append_segment(&self.old, old_segment),
            new: append_segment(&self.new, new_segment),
            blocked: self.blocked || hides_subpages,
        }
    }
}

fn append_segment(path: &str, segment: &str) -> String {
    match (path, segment) {
        (_, "") => path.to_string(),
        ("/", _) => format!("/{segment}"),
        _ => format!("{path}/{segment}"),
    }
}

/// Address a page version answers on once the rename is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LiveLocation {
    pub source_host: String,
    pub path: String,
}

/// Outcome of [`SlugChangeAnalyzer::plan`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlugChangePlan {
    /// Redirects from the old addresses, unique per
    /// `(source_host, source_path)`, in traversal order.
    pub candidates: Vec<RedirectCandidate>,
    /// New address of every existing page version whose path changed,
    /// including versions that were hidden or scheduled out before the
    /// rename.
    pub live_locations: Vec<LiveLocation>,
}

pub struct SlugChangeAnalyzer {
    router: PageRouter,
}

impl SlugChangeAnalyzer {
    pub fn new(router: PageRouter) -> Self {
        Self { router }
    }

    /// Plans the redirects for `change`, evaluated at `now`.
    ///
    /// Visibility is judged on the original snapshot of the renamed record.
    /// Returns an empty plan when the page is outside every site or its site
    /// has automatic redirects disabled.
    pub async fn plan<P>(
        &self,
        pages: &P,
        change: &SlugChangeItem,
        now: DateTime<Utc>,
    ) -> Result<SlugChangePlan, AppError>
    where
        P: PageRepository + ?Sized,
    {
        let Some(placement) = self.router.placement(pages, change.page_id()).await? else {
            tracing::debug!(page_id = change.page_id(), "Renamed page is not part of a site");
            return Ok(SlugChangePlan::default());
        };
        let site = placement.site;
        if !site.redirects.auto_create {
            tracing::debug!(site = %site.identifier, "Automatic redirects disabled for site");
            return Ok(SlugChangePlan::default());
        }

        let languages = site.enabled_languages();
        let Some((page, ancestors)) = placement.rootline.split_last() else {
            return Ok(SlugChangePlan::default());
        };

        let mut initial = Vec::with_capacity(languages.len());
        for language in &languages {
            let mut branch = Branch::root();
            for ancestor in ancestors {
                let version = language_version(pages, ancestor, language.language_id).await?;
                let segment = segment_in(ancestor, version.as_ref());
                branch = branch.descend(
                    segment,
                    segment,
                    hides_subpages_in(ancestor, version.as_ref(), now),
                );
            }
            initial.push(branch);
        }

        let mut plan = SlugChangePlan::default();
        let mut live: HashSet<LiveLocation> = HashSet::new();
        let mut planned: HashSet<(String, String)> = HashSet::new();
        let mut visited: HashSet<i64> = HashSet::from([page.page_id]);
        let mut queue = VecDeque::from([(page.clone(), initial)]);

        while let Some((node, parents)) = queue.pop_front() {
            let versions = pages.find_versions(node.page_id).await?;
            let default = snapshot(&node, change);

            let mut branches = Vec::with_capacity(languages.len());
            let mut changed = false;

            for (language, parent) in languages.iter().zip(&parents) {
                let version = if language.language_id == 0 {
                    None
                } else {
                    versions
                        .iter()
                        .find(|v| v.language_id == language.language_id)
                        .map(|v| snapshot(v, change))
                };

                let used = version.unwrap_or(default);
                let (old_segment, new_segment) = if used.id == change.record_id() {
                    (
                        change.original().slug.as_str(),
                        change.changed().slug.as_str(),
                    )
                } else {
                    (used.slug.as_str(), used.slug.as_str())
                };

                let branch = parent.descend(
                    old_segment,
                    new_segment,
                    hides_subpages_in(default, version, now),
                );

                if branch.old != branch.new {
                    changed = true;
                    let available = language.language_id == 0 || version.is_some();
                    let routable = available
                        && !parent.blocked
                        && default.page_type.is_routable()
                        && version_visible_at(default, used, now);

                    if available
                        && let Some(location) = live_location(&site, language, &branch)
                        && live.insert(location.clone())
                    {
                        plan.live_locations.push(location);
                    }

                    if routable
                        && let Some(candidate) = candidate_for(&site, language, &node, &branch)
                        && planned.insert((
                            candidate.source_host.clone(),
                            candidate.source_path.clone(),
                        ))
                    {
                        plan.candidates.push(candidate);
                    }
                }

                branches.push(branch);
            }

            // Paths below an unchanged page cannot change either.
            if !changed {
                continue;
            }

            for child in pages.find_children(node.page_id).await? {
                let foreign_root = self
                    .router
                    .sites()
                    .by_root_page_id(child.page_id)
                    .is_some_and(|other| other.identifier != site.identifier);
                if foreign_root || !visited.insert(child.page_id) {
                    continue;
                }
                queue.push_back((child, branches.clone()));
            }
        }

        tracing::debug!(
            page_id = change.page_id(),
            site = %site.identifier,
            planned = plan.candidates.len(),
            moved = plan.live_locations.len(),
            "Slug change analyzed"
        );
        Ok(plan)
    }
}

async fn language_version<P>(
    pages: &P,
    default: &PageRecord,
    language_id: i64,
) -> Result<Option<PageRecord>, AppError>
where
    P: PageRepository + ?Sized,
{
    if language_id == 0 {
        return Ok(None);
    }
    pages.find_page(default.page_id, language_id).await
}

/// The renamed record as it was before the change, any other record as is.
fn snapshot<'a>(record: &'a PageRecord, change: &'a SlugChangeItem) -> &'a PageRecord {
    if record.id == change.record_id() {
        change.original()
    } else {
        record
    }
}

fn live_location(site: &Site, language: &SiteLanguage, branch: &Branch) -> Option<LiveLocation> {
    let base = site.language_base(language);
    let path = site.page_url_path(&base, &branch.new);
    if site.page_url_path(&base, &branch.old) == path {
        return None;
    }
    Some(LiveLocation {
        source_host: base.source_host().to_string(),
        path,
    })
}

fn candidate_for(
    site: &Site,
    language: &SiteLanguage,
    node: &PageRecord,
    branch: &Branch,
) -> Option<RedirectCandidate> {
    let base = site.language_base(language);
    let source_path = site.page_url_path(&base, &branch.old);
    let new_path = site.page_url_path(&base, &branch.new);
    if source_path == new_path {
        return None;
    }

    Some(RedirectCandidate {
        source_host: base.source_host().to_string(),
        source_path,
        target: InternalTarget::page(node.page_id, language.language_id).into(),
        status_code: site.redirects.http_status_code,
        new_path,
        page_id: node.page_id,
        language_id: language.language_id,
        site_identifier: site.identifier.clone(),
    })
}
