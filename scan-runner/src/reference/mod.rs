//! Repository reference normalization.
//!
//! Turns a pasted repository URL, optionally carrying a ref in its path,
//! plus an optional explicit ref into a canonical clone URL and the ref
//! that should be scanned.

mod repository_reference;

pub use repository_reference::{RepositoryReference, DEFAULT_REF};

use tracing::debug;
use url::Url;

/// Path markers that precede a ref, as used by the hosting web UI.
const REF_MARKERS: &[&[&str]] = &[&["tree"], &["commit"], &["releases", "tag"]];

const HTTPS_PORT: u16 = 443;

/// Owner, name and optional ref pulled out of a hosting URL.
struct ParsedPath {
    host: String,
    owner: String,
    name: String,
    detected_ref: Option<String>,
}

/// Resolves a pasted repository URL and an explicit ref.
///
/// Never fails: input that does not look like
/// `http(s)://<host>/<owner>/<name>[.git][/<marker>/<ref>]` is echoed back
/// (trimmed) with no owner, name or detected ref, leaving validation to the caller.
///
/// # Arguments
///
/// * `raw_url` - URL as pasted by the user
/// * `explicit_ref` - Ref typed by the user; wins over anything in the URL when non-empty
pub fn resolve(raw_url: &str, explicit_ref: &str) -> RepositoryReference {
    let trimmed = raw_url.trim();
    let parsed = parse_hosting_url(trimmed);

    let explicit_ref = explicit_ref.trim();
    let detected_ref = parsed.as_ref().and_then(|p| p.detected_ref.clone());
    let resolved_ref = if !explicit_ref.is_empty() {
        explicit_ref.to_string()
    } else {
        detected_ref
            .clone()
            .unwrap_or_else(|| DEFAULT_REF.to_string())
    };

    match parsed {
        Some(ParsedPath {
            host, owner, name, ..
        }) => {
            let canonical_url = format!("https://{host}/{owner}/{name}.git");
            debug!(%canonical_url, %resolved_ref, "Resolved repository reference");
            RepositoryReference {
                raw_input: raw_url.to_string(),
                host: Some(host),
                owner: Some(owner),
                name: Some(name),
                detected_ref,
                canonical_url,
                resolved_ref,
            }
        }
        None => {
            debug!(input = trimmed, "Input is not a hosting URL, echoing it back");
            RepositoryReference {
                raw_input: raw_url.to_string(),
                host: None,
                owner: None,
                name: None,
                detected_ref: None,
                canonical_url: trimmed.to_string(),
                resolved_ref,
            }
        }
    }
}

/// Matches the hosting URL shape. Returns `None` for anything else.
fn parse_hosting_url(input: &str) -> Option<ParsedPath> {
    let url = Url::parse(input).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();
    // The canonical URL is always https, so 443 is dropped whatever the input scheme.
    let host = match url.port().filter(|port| *port != HTTPS_PORT) {
        Some(port) => format!("{host}:{port}"),
        None => host,
    };

    let segments: Vec<&str> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();
    let [owner, name, rest @ ..] = segments.as_slice() else {
        return None;
    };

    let name = name.strip_suffix(".git").unwrap_or(*name);
    if name.is_empty() {
        return None;
    }

    let detected_ref = if rest.is_empty() {
        None
    } else {
        Some(match_ref_marker(rest)?)
    };

    Some(ParsedPath {
        host,
        owner: (*owner).to_string(),
        name: name.to_string(),
        detected_ref,
    })
}

/// Extracts the ref following a known marker. Anything after the ref
/// (e.g. a file path under `tree/<ref>/`) is ignored.
fn match_ref_marker(rest: &[&str]) -> Option<String> {
    REF_MARKERS.iter().find_map(|marker| {
        let tail = rest.strip_prefix(*marker)?;
        tail.first().map(|r| (*r).to_string())
    })
}
