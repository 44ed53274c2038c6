use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::webdav::path::decode_path;
use crate::webdav::types::DavEntry;

/// One step of the navigation trail shown above a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub name: String,
    pub path: String,
}

impl Breadcrumb {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File { size: Option<u64> },
}

/// A folder or file, with `href` relative to the instance root path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub title: String,
    pub href: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub kind: EntryKind,
}

impl ListingEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    /// Content length for files, `None` for folders or when the server omitted it.
    pub fn size(&self) -> Option<u64> {
        match self.kind {
            EntryKind::File { size } => size,
            EntryKind::Folder => None,
        }
    }
}

/// Folders first, then files, each group ordered by uppercased title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub path: Vec<Breadcrumb>,
    pub entries: Vec<ListingEntry>,
}

/// Normalize a requested folder path and derive its breadcrumbs.
///
/// Returns the decoded path (always starting and ending with `/`) and one breadcrumb per
/// segment; the root folder has none.
pub(crate) fn resolve_request_path(path: &str) -> (String, Vec<Breadcrumb>) {
    let trimmed = path.trim();
    if trimmed.is_empty() || trimmed == "/" {
        return ("/".to_string(), Vec::new());
    }

    let chunks: Vec<&str> = trimmed
        .trim_matches('/')
        .split('/')
        .filter(|chunk| !chunk.is_empty())
        .collect();
    let breadcrumbs = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| Breadcrumb::new(decode_path(chunk), format!("/{}/", chunks[..=i].join("/"))))
        .collect();

    let mut decoded = decode_path(trimmed);
    if !decoded.starts_with('/') {
        decoded.insert(0, '/');
    }
    if !decoded.ends_with('/') {
        decoded.push('/');
    }
    (decoded, breadcrumbs)
}

/// Parse a `getlastmodified` value (RFC 1123 / RFC 2822 date).
pub(crate) fn parse_last_modified(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc2822(raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(err) => {
            warn!(value = raw, error = %err, "unparseable getlastmodified");
            None
        }
    }
}

/// Drop a leading `http(s)://host[:port]` naming the configured server.
fn strip_server_origin<'a>(href: &'a str, host: &str) -> &'a str {
    let Some(rest) = href
        .strip_prefix("https://")
        .or_else(|| href.strip_prefix("http://"))
    else {
        return href;
    };
    let Some(candidate) = rest.get(..host.len()) else {
        return href;
    };
    if !candidate.eq_ignore_ascii_case(host) {
        return href;
    }

    let mut after_host = &rest[host.len()..];
    if let Some(port_and_path) = after_host.strip_prefix(':') {
        let digits = port_and_path
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(port_and_path.len());
        after_host = &port_and_path[digits..];
    }
    if after_host.is_empty() {
        "/"
    } else if after_host.starts_with('/') {
        after_host
    } else {
        href
    }
}

fn same_folder(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

fn last_segment(href: &str) -> &str {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

/// Map raw `PROPFIND` entries for `requested` (a decoded path from
/// [`resolve_request_path`]) into the ordered listing entries.
pub(crate) fn map_entries(
    requested: &str,
    entries: Vec<DavEntry>,
    root_path: &str,
    server_host: &str,
) -> Vec<ListingEntry> {
    let mut folders: BTreeMap<String, ListingEntry> = BTreeMap::new();
    let mut files: BTreeMap<String, ListingEntry> = BTreeMap::new();

    for entry in entries {
        let last_modified = parse_last_modified(entry.last_modified.as_deref());

        let local = strip_server_origin(&entry.href, server_host);
        let decoded = decode_path(local);
        let href = match decoded.strip_prefix(root_path) {
            Some(relative) => relative.to_string(),
            None => {
                debug!(href = %decoded, root_path, "href outside the root path");
                decoded.clone()
            }
        };
        let title = match href.strip_prefix(requested) {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => last_segment(&href).to_string(),
        };

        if entry.is_collection {
            if same_folder(&href, requested) {
                continue;
            }
            let key = title.to_uppercase();
            let title = title.trim_end_matches('/').to_string();
            folders.insert(
                key,
                ListingEntry {
                    title,
                    href,
                    last_modified,
                    kind: EntryKind::Folder,
                },
            );
        } else {
            files.insert(
                title.to_uppercase(),
                ListingEntry {
                    title,
                    href,
                    last_modified,
                    kind: EntryKind::File {
                        size: entry.content_length,
                    },
                },
            );
        }
    }

    folders.into_values().chain(files.into_values()).collect()
}
