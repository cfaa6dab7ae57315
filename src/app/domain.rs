use axum::http::HeaderMap;
use url::Url;

pub const DEFAULT_DOMAIN: &str = "default";

const FORWARDED_HOST: &str = "x-forwarded-host";

/// Lowercased host without scheme, path or port; `default` when empty.
pub fn normalize_domain(input: &str) -> String {
    let source = input.trim();
    if source.is_empty() {
        return DEFAULT_DOMAIN.to_owned();
    }

    let parsed = source
        .contains("://")
        .then(|| Url::parse(source).ok())
        .flatten()
        .and_then(|url| url.host_str().map(str::to_owned));
    let host = match parsed {
        Some(host) => host,
        None => strip_port(strip_scheme(source).split('/').next().unwrap_or_default()).to_owned(),
    };

    let host = host.to_ascii_lowercase();
    if host.is_empty() {
        DEFAULT_DOMAIN.to_owned()
    } else {
        host
    }
}

/// Query parameter, then `X-Forwarded-Host`, then `Host`.
pub fn pick_request_domain(query: Option<&str>, headers: &HeaderMap) -> String {
    let header = |name: &'static str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
    };

    query
        .filter(|value| !value.trim().is_empty())
        .or_else(|| header(FORWARDED_HOST))
        .or_else(|| header("host"))
        .map(normalize_domain)
        .unwrap_or_else(|| DEFAULT_DOMAIN.to_owned())
}

fn strip_scheme(input: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if let Some(head) = input.get(..scheme.len())
            && head.eq_ignore_ascii_case(scheme)
        {
            return &input[scheme.len()..];
        }
    }
    input
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn normalizes_urls_and_bare_hosts() {
        assert_eq!(normalize_domain("https://Gallery.Example.com/admin"), "gallery.example.com");
        assert_eq!(normalize_domain("http://example.com:8080"), "example.com");
        assert_eq!(normalize_domain("Example.com:8787/path"), "example.com");
        assert_eq!(normalize_domain("  "), "default");
    }

    #[test]
    fn query_wins_over_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("host.example.com"));
        headers.insert(
            "x-forwarded-host",
            HeaderValue::from_static("proxy.example.com"),
        );

        assert_eq!(
            pick_request_domain(Some("query.example.com"), &headers),
            "query.example.com"
        );
        assert_eq!(pick_request_domain(None, &headers), "proxy.example.com");

        headers.remove("x-forwarded-host");
        assert_eq!(pick_request_domain(Some(""), &headers), "host.example.com");
        assert_eq!(pick_request_domain(None, &HeaderMap::new()), "default");
    }
}
