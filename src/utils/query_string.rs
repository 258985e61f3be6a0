//! Query string helpers shared by matching and target resolution.

use url::form_urlencoded;

/// Decodes a raw query string (without the leading `?`) into ordered pairs.
pub fn parse_query(raw: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(raw.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}

/// Encodes pairs into a query string without the leading `?`.
pub fn encode_query(pairs: &[(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Compares two raw query strings ignoring parameter order.
pub fn queries_equal(a: &str, b: &str) -> bool {
    let mut a = parse_query(a);
    let mut b = parse_query(b);
    a.sort();
    b.sort();
    a == b
}

/// Merges `overrides` onto `base`.
///
/// Keys present in `overrides` replace every occurrence in `base`; the
/// remaining `base` parameters keep their order and come first.
pub fn merge_query(
    base: &[(String, String)],
    overrides: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = base
        .iter()
        .filter(|(key, _)| !overrides.iter().any(|(k, _)| k == key))
        .cloned()
        .collect();
    merged.extend(overrides.iter().cloned());
    merged
}
