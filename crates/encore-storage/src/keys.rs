//! Shared key generation and URL-to-key derivation for storage backends.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

const UNTITLED: &str = "untitled";
const OBJECT_EXTENSION: &str = "mp3";

/// Replace every character outside `[A-Za-z0-9._-]` with `_` and collapse runs of `.`,
/// so the result never contains `..`.
pub fn sanitize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '_'
        };
        if c == '.' && out.ends_with('.') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Eight hex characters from a fresh v4 UUID.
pub fn short_disambiguator() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// `{owner_id}/{date}_{title}_{disambiguator}.mp3`
pub fn object_key(owner_id: Uuid, title: &str, date: NaiveDate, disambiguator: &str) -> String {
    let title = title.trim();
    let title = if title.is_empty() { UNTITLED } else { title };
    let filename = format!(
        "{}_{}_{}.{}",
        date.format("%Y-%m-%d"),
        title,
        disambiguator,
        OBJECT_EXTENSION
    );
    format!("{}/{}", owner_id, sanitize_segment(&filename))
}

/// Object key for an upload happening now.
pub fn new_object_key(owner_id: Uuid, title: &str) -> String {
    object_key(
        owner_id,
        title,
        chrono::Utc::now().date_naive(),
        &short_disambiguator(),
    )
}

/// Reject keys that could escape a backend's namespace.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if storage_key.contains("..") || storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

/// Strip query string and fragment.
fn strip_query(url: &str) -> &str {
    let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
    &url[..end]
}

/// Split into (host, path) for absolute URLs; relative input has no host.
fn split_host(url: &str) -> (Option<&str>, &str) {
    match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find('/') {
                Some(slash) => (Some(&rest[..slash]), &rest[slash..]),
                None => (Some(rest), ""),
            }
        }
        None => (None, url),
    }
}

fn decoded_segments(path: &str) -> StorageResult<Vec<String>> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|c| c.into_owned())
                .map_err(|e| StorageError::InvalidKey(format!("Invalid URL encoding: {}", e)))
        })
        .collect()
}

/// Derive the object key from a signed or public URL.
///
/// Handles `/object/sign/<bucket>/<key>`, `/object/public/<bucket>/<key>`, path-style
/// `/<bucket>/<key>`, and virtual-hosted `<bucket>.s3.<region>.amazonaws.com/<key>`.
/// Query parameters and fragments are ignored.
pub fn key_after_bucket(url: &str, bucket: &str) -> StorageResult<String> {
    let (host, path) = split_host(strip_query(url.trim()));
    let segments = decoded_segments(path)?;

    let key_segments = match segments.iter().position(|s| s == bucket) {
        Some(idx) => &segments[idx + 1..],
        None if host.is_some_and(|h| h.starts_with(&format!("{}.", bucket))) => &segments[..],
        None => {
            return Err(StorageError::InvalidKey(format!(
                "URL does not reference bucket '{}'",
                bucket
            )))
        }
    };

    let key = key_segments.join("/");
    validate_key(&key)?;
    Ok(key)
}

/// Derive the object key from a URL built as `{base_url}/{key}`.
pub fn key_after_base_url(url: &str, base_url: &str) -> StorageResult<String> {
    let url = strip_query(url.trim());
    let base = base_url.trim_end_matches('/');
    let rest = url
        .strip_prefix(base)
        .and_then(|r| r.strip_prefix('/'))
        .ok_or_else(|| {
            StorageError::InvalidKey(format!("URL is not under base URL '{}'", base))
        })?;

    let key = decoded_segments(rest)?.join("/");
    validate_key(&key)?;
    Ok(key)
}
