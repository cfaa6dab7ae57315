use reqwest::StatusCode;

const BODY_SNIPPET_CHARS: usize = 300;

/// Failures that invalidate a whole pipeline run.
///
/// Per-record problems never show up here; they are counted in
/// [`crate::pipeline::RunReport`] instead.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("imgbed base url is not configured")]
    MissingBaseUrl,

    #[error("imgbed api token is not configured")]
    MissingToken,

    #[error("invalid listing endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("listing request failed ({status}): {body}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("listing request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("decode listing page {page}: {source}")]
    Decode {
        page: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    /// Stable machine-readable code used in HTTP error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingBaseUrl => "missing-imgbed-base-url",
            Self::MissingToken => "missing-imgbed-token",
            Self::InvalidEndpoint { .. }
            | Self::UpstreamStatus { .. }
            | Self::Transport { .. }
            | Self::Decode { .. } => "imgbed-fetch-failed",
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingBaseUrl | Self::MissingToken | Self::InvalidEndpoint { .. }
        )
    }

    pub(crate) fn upstream_status(status: StatusCode, body: &str) -> Self {
        let body = body.trim();
        let body = if body.is_empty() {
            status.canonical_reason().unwrap_or_default().to_owned()
        } else {
            snippet(body)
        };
        Self::UpstreamStatus { status, body }
    }
}

fn snippet(body: &str) -> String {
    let mut out: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
    if body.chars().count() > BODY_SNIPPET_CHARS {
        out.push('…');
    }
    out
}
