use std::borrow::Cow;

use url::Url;

/// Trims whitespace and surrounding slashes: `" /photos/ "` -> `"photos"`.
pub fn trim_slashes(input: &str) -> &str {
    input.trim().trim_matches('/')
}

pub fn is_http_url(input: &str) -> bool {
    let lower_prefix = |prefix: &str| {
        input
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    lower_prefix("http://") || lower_prefix("https://")
}

/// Canonicalizes a listed path or file URL into a path below the file route.
///
/// `https://img.example.com/file/cats/a.jpg?x=1` and `/file/cats/a.jpg`
/// both become `cats/a.jpg` for the route prefix `/file`. The prefix only
/// matches as a whole leading segment.
pub fn normalize_listed_path(raw: &str, route_prefix: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut normalized: Cow<'_, str> =
        Cow::Borrowed(trimmed.split(['?', '#']).next().unwrap_or_default());
    if is_http_url(trimmed) {
        match Url::parse(trimmed) {
            Ok(url) => normalized = Cow::Owned(decode_segments(url.path())),
            Err(err) => {
                tracing::debug!(raw = trimmed, %err, "listed url does not parse; using it verbatim");
            }
        }
    }

    let relative = normalized.trim_start_matches('/');
    strip_leading_segment(relative, trim_slashes(route_prefix))
        .unwrap_or(relative)
        .to_owned()
}

/// Strips the scope directory from a normalized path.
///
/// Returns `None` when nothing remains: the path is empty or names the
/// scope directory itself. Paths outside the scope pass through unchanged.
pub fn strip_scope_dir<'a>(path: &'a str, list_dir: &str) -> Option<&'a str> {
    let list_dir = trim_slashes(list_dir);
    if path.is_empty() || (!list_dir.is_empty() && path == list_dir) {
        return None;
    }
    Some(strip_leading_segment(path, list_dir).unwrap_or(path))
}

fn strip_leading_segment<'a>(path: &'a str, segment: &str) -> Option<&'a str> {
    if segment.is_empty() {
        return None;
    }
    path.strip_prefix(segment)?.strip_prefix('/')
}

/// Decodes each segment on its own. A segment whose decoded form would
/// contain `/` stays encoded so the path keeps its shape.
fn decode_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| match urlencoding::decode(segment) {
            Ok(decoded) if !decoded.contains('/') => decoded,
            _ => Cow::Borrowed(segment),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Non-empty `/`-separated segments.
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Extension of the final segment, including the dot.
///
/// A leading dot does not start an extension: `.hidden` has none.
pub fn extension(file_path: &str) -> &str {
    let last = file_path.rsplit('/').next().unwrap_or_default();
    match last.rfind('.') {
        Some(index) if index > 0 => &last[index..],
        _ => "",
    }
}

/// Final segment without its extension.
pub fn base_name(file_path: &str) -> &str {
    let last = file_path.rsplit('/').next().unwrap_or_default();
    &last[..last.len() - extension(last).len()]
}

/// The whole path with the final segment's extension removed.
pub fn without_extension(file_path: &str) -> &str {
    &file_path[..file_path.len() - extension(file_path).len()]
}

/// Resolves an endpoint against the base URL unless it is already absolute.
pub fn build_absolute_url(base_url: &str, endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return String::new();
    }
    if is_http_url(endpoint) {
        return endpoint.to_owned();
    }
    format!(
        "{}/{}",
        base_url.trim().trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// Public URL of a stored file: `{base}/{route_prefix}/{encoded path}`.
pub fn build_file_url(base_url: &str, route_prefix: &str, relative_path: &str) -> String {
    let encoded = segments(relative_path)
        .into_iter()
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");
    let base = base_url.trim().trim_end_matches('/');
    match trim_slashes(route_prefix) {
        "" => format!("{base}/{encoded}"),
        prefix => format!("{base}/{prefix}/{encoded}"),
    }
}
