//! Labels for suspended tabs
//!
//! A suspended tab has no document, so its title and favicon come from
//! page history, falling back to a title derived from the URI.

use url::Url;

/// What history knows about a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub icon: Option<String>,
}

/// Best-effort title/favicon lookup for a URI.
pub trait MetadataLookup {
    fn lookup(&self, uri: &str) -> Option<PageMetadata>;
}

/// Title and icon to display for a suspended tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub title: String,
    pub icon: Option<String>,
}

/// Build the placeholder for `uri`.
///
/// `known_title` (from session history) wins over looked-up titles.
/// History often lacks favicons for fragment URLs, so when the exact URI
/// has no icon the fragment-less URI is tried as well.
pub fn describe(lookup: &dyn MetadataLookup, uri: &str, known_title: Option<&str>) -> Placeholder {
    let info = match lookup.lookup(uri) {
        Some(info) if info.icon.is_some() => Some(info),
        direct => strip_fragment(uri)
            .and_then(|base| lookup.lookup(&base))
            .or(direct),
    };

    let title = known_title
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| {
            info.as_ref()
                .and_then(|i| i.title.clone())
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_else(|| title_from_uri(uri));

    Placeholder {
        title,
        icon: info.and_then(|i| i.icon),
    }
}

/// `uri` without its fragment, or `None` if it has none.
pub fn strip_fragment(uri: &str) -> Option<String> {
    uri.find('#').map(|anchor| uri[..anchor].to_string())
}

/// Human-readable title for a URI: scheme and leading `www.` dropped,
/// so `http://www.mozilla.org/` becomes `mozilla.org`.
///
/// URIs without a host are returned unchanged.
pub fn title_from_uri(uri: &str) -> String {
    let Ok(parsed) = Url::parse(uri) else {
        return uri.to_string();
    };
    let Some(host) = parsed.host_str().filter(|h| !h.is_empty()) else {
        return uri.to_string();
    };

    let host_port = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    let host_port = host_port
        .strip_prefix("www.")
        .map(str::to_string)
        .unwrap_or(host_port);

    let mut path = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        path.push('?');
        path.push_str(query);
    }
    if let Some(fragment) = parsed.fragment() {
        path.push('#');
        path.push_str(fragment);
    }
    if path == "/" {
        path.clear();
    }

    format!("{}{}", host_port, path)
}
