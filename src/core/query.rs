//! Search URL construction

/// Prefix of a reference-name query, already escaped (`references.name:*`)
const REFERENCE_NAME_PREFIX: &str = "references.name%3A%2A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Substring match against the names files are referenced by
    ReferenceName,
    /// Generic full-text search
    FullText,
}

impl QueryKind {
    /// Extension and wildcard tokens search file names; anything else, and
    /// the Google client-id suffix, goes through full-text search.
    pub fn for_pattern(pattern: &str) -> Self {
        let looks_like_name = pattern.contains('.') || pattern.contains('*');
        if looks_like_name && !pattern.contains("apps") {
            QueryKind::ReferenceName
        } else {
            QueryKind::FullText
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QueryKind::ReferenceName => "reference",
            QueryKind::FullText => "wild",
        }
    }
}

/// Build the search URL for one page of one pattern
pub fn build_search_url(api_base: &str, pattern: &str, page: u32) -> String {
    let base = api_base.trim_end_matches('/');
    let term = encode_query_value(pattern);
    match QueryKind::for_pattern(pattern) {
        QueryKind::ReferenceName => format!(
            "{}/search?q={}{}&type=file&page={}",
            base, REFERENCE_NAME_PREFIX, term, page
        ),
        QueryKind::FullText => format!("{}/search?q={}&type=file&page={}", base, term, page),
    }
}

// Unreserved characters and `*` pass through; the wildcard must reach the
// search backend unescaped.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'*' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
