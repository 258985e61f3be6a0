//! Selection of the redirect rule answering a request.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};

use crate::domain::entities::Redirect;
use crate::domain::repositories::RedirectRepository;
use crate::error::AppError;
use crate::utils::query_string::queries_equal;

/// How a rule matched the request path, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// Literal path and query both matched a query-aware rule.
    ExactWithQuery,
    Exact,
    /// Literal path matched ignoring ASCII case.
    CaseInsensitive,
    Regex,
}

/// A selected rule with the capture groups of a regex match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRedirect {
    pub redirect: Redirect,
    pub kind: MatchKind,
    /// Group texts by index, group 0 is the whole match. Empty for literal
    /// rules; non-participating groups are empty strings.
    pub captures: Vec<String>,
}

/// Compiled regex sources keyed by rule id.
///
/// An entry is reused while the rule's `updated_at` is unchanged.
#[derive(Debug, Default)]
pub struct RegexCache {
    compiled: RwLock<HashMap<i64, (DateTime<Utc>, Regex)>>,
}

impl RegexCache {
    /// Entries kept before the cache is reset.
    const CAPACITY: usize = 4096;

    fn get_or_compile(&self, redirect: &Redirect) -> Result<Regex, regex::Error> {
        {
            let compiled = self.compiled.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((updated_at, regex)) = compiled.get(&redirect.id)
                && *updated_at == redirect.updated_at
            {
                return Ok(regex.clone());
            }
        }

        let regex = compile_source_pattern(&redirect.source_path)?;
        let mut compiled = self.compiled.write().unwrap_or_else(PoisonError::into_inner);
        if compiled.len() >= Self::CAPACITY {
            compiled.clear();
        }
        compiled.insert(redirect.id, (redirect.updated_at, regex.clone()));
        Ok(regex)
    }

    pub fn len(&self) -> usize {
        self.compiled.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct RedirectMatcher {
    repository: Arc<dyn RedirectRepository>,
    case_insensitive: bool,
    regexes: RegexCache,
}

impl RedirectMatcher {
    pub fn new(repository: Arc<dyn RedirectRepository>, case_insensitive: bool) -> Self {
        Self {
            repository,
            case_insensitive,
            regexes: RegexCache::default(),
        }
    }

    /// Finds the rule answering `host`, `path` and raw `query`.
    ///
    /// # Errors
    ///
    /// Propagates repository errors; callers in the request path treat them
    /// as "no match".
    pub async fn find_match(
        &self,
        host: &str,
        path: &str,
        query: &str,
    ) -> Result<Option<MatchedRedirect>, AppError> {
        let candidates = self
            .repository
            .find_candidates(host, path, self.case_insensitive)
            .await?;

        Ok(select_match_cached(
            &self.regexes,
            candidates,
            host,
            path,
            query,
            self.case_insensitive,
            Utc::now(),
        ))
    }
}

/// Picks the best rule among `candidates`.
///
/// Precedence: exact host before `*`, then [`MatchKind`] order, then the
/// lowest id. Disabled, deleted and out-of-window rules never match. Literal
/// paths compare without trailing slashes.
pub fn select_match(
    candidates: Vec<Redirect>,
    host: &str,
    path: &str,
    query: &str,
    case_insensitive: bool,
    now: DateTime<Utc>,
) -> Option<MatchedRedirect> {
    let regexes = RegexCache::default();
    select_match_cached(&regexes, candidates, host, path, query, case_insensitive, now)
}

/// [`select_match`] reusing regexes compiled for earlier requests.
pub fn select_match_cached(
    regexes: &RegexCache,
    candidates: Vec<Redirect>,
    host: &str,
    path: &str,
    query: &str,
    case_insensitive: bool,
    now: DateTime<Utc>,
) -> Option<MatchedRedirect> {
    let mut best: Option<((u8, MatchKind, i64), MatchedRedirect)> = None;

    for redirect in candidates {
        if !redirect.is_enabled_at(now) {
            continue;
        }
        let host_rank = if redirect.is_wildcard_host() {
            1
        } else if redirect.source_host.eq_ignore_ascii_case(host) {
            0
        } else {
            continue;
        };

        let (kind, captures) = if redirect.is_regex {
            match regex_match(regexes, &redirect, path, query) {
                Some(captures) => (MatchKind::Regex, captures),
                None => continue,
            }
        } else {
            match literal_match(&redirect, path, query, case_insensitive) {
                Some(kind) => (kind, Vec::new()),
                None => continue,
            }
        };

        let rank = (host_rank, kind, redirect.id);
        if best.as_ref().is_none_or(|(current, _)| rank < *current) {
            best = Some((
                rank,
                MatchedRedirect {
                    redirect,
                    kind,
                    captures,
                },
            ));
        }
    }

    best.map(|(_, matched)| matched)
}

fn literal_match(
    redirect: &Redirect,
    path: &str,
    query: &str,
    case_insensitive: bool,
) -> Option<MatchKind> {
    let (rule_path, rule_query) = if redirect.respect_query {
        redirect
            .source_path
            .split_once('?')
            .unwrap_or((redirect.source_path.as_str(), ""))
    } else {
        (redirect.source_path.as_str(), "")
    };

    let exact = trim_trailing_slash(rule_path) == trim_trailing_slash(path);
    if !exact && !same_literal_path(rule_path, path, case_insensitive) {
        return None;
    }
    if redirect.respect_query && !queries_equal(rule_query, query) {
        return None;
    }

    Some(match (exact, redirect.respect_query) {
        (true, true) => MatchKind::ExactWithQuery,
        (true, false) => MatchKind::Exact,
        (false, _) => MatchKind::CaseInsensitive,
    })
}

fn regex_match(
    regexes: &RegexCache,
    redirect: &Redirect,
    path: &str,
    query: &str,
) -> Option<Vec<String>> {
    let regex = match regexes.get_or_compile(redirect) {
        Ok(regex) => regex,
        Err(e) => {
            tracing::warn!(
                redirect_id = redirect.id,
                source_path = %redirect.source_path,
                error = %e,
                "Skipping redirect with invalid regular expression"
            );
            return None;
        }
    };

    let subject = if redirect.respect_query && !query.is_empty() {
        format!("{path}?{query}")
    } else {
        path.to_string()
    };

    regex.captures(&subject).map(|caps| {
        caps.iter()
            .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
            .collect()
    })
}

fn trim_trailing_slash(path: &str) -> &str {
    path.trim_end_matches('/')
}

/// Whether a literal rule on `a` answers requests for `b`, using the
/// matcher's comparison: trailing slashes are ignored, ASCII case too when
/// `case_insensitive` is set.
pub fn same_literal_path(a: &str, b: &str, case_insensitive: bool) -> bool {
    let (a, b) = (trim_trailing_slash(a), trim_trailing_slash(b));
    a == b || (case_insensitive && a.eq_ignore_ascii_case(b))
}

const DELIMITERS: &[char] = &['#', '/', '~', '@', '%', '!', '|'];
const FLAGS: &str = "imsxuU";

/// Compiles a stored regex source.
///
/// Accepts bare patterns and delimited ones such as `#^/old/(.*)$#i`; the
/// closing delimiter may be followed by flags from `imsxuU`.
pub fn compile_source_pattern(source: &str) -> Result<Regex, regex::Error> {
    let Some((pattern, flags)) = split_delimited(source) else {
        return Regex::new(source);
    };

    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'U' => builder.swap_greed(true),
            _ => builder.unicode(true),
        };
    }
    builder.build()
}

fn split_delimited(source: &str) -> Option<(&str, &str)> {
    let delimiter = source.chars().next().filter(|c| DELIMITERS.contains(c))?;
    let close = source.rfind(delimiter).filter(|&index| index > 0)?;
    let flags = &source[close + 1..];
    if !flags.chars().all(|c| FLAGS.contains(c)) {
        return None;
    }
    Some((&source[1..close], flags))
}

/// Replaces `$1`…`$9` in `target` with capture groups.
///
/// Missing groups become empty strings; `$0` and other `$` sequences are
/// kept literally.
pub fn apply_captures(target: &str, captures: &[String]) -> String {
    if captures.is_empty() {
        return target.to_string();
    }

    let mut result = String::with_capacity(target.len());
    let mut chars = target.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$'
            && let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)).filter(|d| *d > 0)
        {
            chars.next();
            if let Some(group) = captures.get(digit as usize) {
                result.push_str(group);
            }
            continue;
        }
        result.push(c);
    }
    result
}
