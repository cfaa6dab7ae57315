use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::error::PipelineError;
use crate::paths::{build_absolute_url, trim_slashes};

pub const DEFAULT_LIST_ENDPOINT: &str = "/api/manage/list";
pub const DEFAULT_RANDOM_ENDPOINT: &str = "/random";
pub const DEFAULT_FILE_ROUTE_PREFIX: &str = "/file";
pub const DEFAULT_PREVIEW_DIR: &str = "0_preview";
pub const DEFAULT_CATEGORY: &str = "uncategorized";
pub const DEFAULT_PAGE_SIZE: usize = 200;
pub const MAX_PAGE_SIZE: usize = 500;

const RANDOM_ORIENTATIONS: [&str; 4] = ["auto", "landscape", "portrait", "square"];

/// ImgBed settings as they arrive from a config store, env vars, or an
/// admin request body. Every field is optional and loosely typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_orientation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_route_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_preview_mapping: Option<serde_json::Value>,
}

impl RawSourceConfig {
    /// Reads `IMGBED_*` variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let loose = |key: &str| text(key).map(serde_json::Value::String);
        Self {
            base_url: text("IMGBED_BASE_URL"),
            list_endpoint: text("IMGBED_LIST_ENDPOINT"),
            random_endpoint: text("IMGBED_RANDOM_ENDPOINT"),
            random_orientation: text("IMGBED_RANDOM_ORIENTATION"),
            file_route_prefix: text("IMGBED_FILE_ROUTE_PREFIX"),
            api_token: text("IMGBED_API_TOKEN"),
            list_dir: text("IMGBED_LIST_DIR"),
            preview_dir: text("IMGBED_PREVIEW_DIR"),
            default_category: text("IMGBED_DEFAULT_CATEGORY"),
            recursive: loose("IMGBED_LIST_RECURSIVE"),
            page_size: loose("IMGBED_PAGE_SIZE"),
            enable_preview_mapping: loose("IMGBED_ENABLE_PREVIEW_MAPPING"),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Non-empty fields of `self` win over `fallback`.
    pub fn merged_over(self, fallback: &RawSourceConfig) -> RawSourceConfig {
        fn pick(over: Option<String>, under: &Option<String>) -> Option<String> {
            over.filter(|v| !v.trim().is_empty()).or_else(|| under.clone())
        }
        fn pick_value(
            over: Option<serde_json::Value>,
            under: &Option<serde_json::Value>,
        ) -> Option<serde_json::Value> {
            over.filter(|v| !v.is_null()).or_else(|| under.clone())
        }

        RawSourceConfig {
            base_url: pick(self.base_url, &fallback.base_url),
            list_endpoint: pick(self.list_endpoint, &fallback.list_endpoint),
            random_endpoint: pick(self.random_endpoint, &fallback.random_endpoint),
            random_orientation: pick(self.random_orientation, &fallback.random_orientation),
            file_route_prefix: pick(self.file_route_prefix, &fallback.file_route_prefix),
            api_token: pick(self.api_token, &fallback.api_token),
            list_dir: pick(self.list_dir, &fallback.list_dir),
            preview_dir: pick(self.preview_dir, &fallback.preview_dir),
            default_category: pick(self.default_category, &fallback.default_category),
            recursive: pick_value(self.recursive, &fallback.recursive),
            page_size: pick_value(self.page_size, &fallback.page_size),
            enable_preview_mapping: pick_value(
                self.enable_preview_mapping,
                &fallback.enable_preview_mapping,
            ),
        }
    }
}

/// Effective, fully defaulted ImgBed source configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub base_url: String,
    pub list_endpoint: String,
    pub random_endpoint: String,
    pub random_orientation: String,
    pub file_route_prefix: String,
    pub api_token: String,
    pub list_dir: String,
    pub preview_dir: String,
    pub default_category: String,
    pub recursive: bool,
    pub page_size: usize,
    pub enable_preview_mapping: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::from_raw(&RawSourceConfig::default())
    }
}

impl SourceConfig {
    pub fn from_raw(raw: &RawSourceConfig) -> Self {
        let text_or = |value: &Option<String>, default: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_owned()
        };

        let preview_dir = raw
            .preview_dir
            .as_deref()
            .map(trim_slashes)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_PREVIEW_DIR)
            .to_owned();

        Self {
            base_url: text_or(&raw.base_url, "").trim_end_matches('/').to_owned(),
            list_endpoint: text_or(&raw.list_endpoint, DEFAULT_LIST_ENDPOINT),
            random_endpoint: text_or(&raw.random_endpoint, DEFAULT_RANDOM_ENDPOINT),
            random_orientation: normalize_orientation(raw.random_orientation.as_deref()),
            file_route_prefix: text_or(&raw.file_route_prefix, DEFAULT_FILE_ROUTE_PREFIX),
            api_token: text_or(&raw.api_token, ""),
            list_dir: trim_slashes(raw.list_dir.as_deref().unwrap_or_default()).to_owned(),
            preview_dir,
            default_category: text_or(&raw.default_category, DEFAULT_CATEGORY),
            recursive: parse_bool(raw.recursive.as_ref(), true),
            page_size: parse_page_size(raw.page_size.as_ref()),
            enable_preview_mapping: parse_bool(raw.enable_preview_mapping.as_ref(), true),
        }
    }

    pub fn list_endpoint_url(&self) -> String {
        build_absolute_url(&self.base_url, &self.list_endpoint)
    }

    pub fn require_base_url(&self) -> Result<(), PipelineError> {
        if self.base_url.is_empty() {
            return Err(PipelineError::MissingBaseUrl);
        }
        Ok(())
    }

    /// The on-demand endpoint needs both a base URL and a token.
    pub fn require_credentials(&self) -> Result<(), PipelineError> {
        self.require_base_url()?;
        if self.api_token.is_empty() {
            return Err(PipelineError::MissingToken);
        }
        Ok(())
    }

    /// SHA-256 over every field that changes the produced index.
    pub fn signature(&self) -> String {
        #[derive(Serialize)]
        struct Fields<'a> {
            base_url: &'a str,
            list_endpoint: &'a str,
            random_endpoint: &'a str,
            random_orientation: &'a str,
            file_route_prefix: &'a str,
            list_dir: &'a str,
            preview_dir: &'a str,
            default_category: &'a str,
            recursive: bool,
            page_size: usize,
            enable_preview_mapping: bool,
            api_token: &'a str,
        }

        let fields = Fields {
            base_url: &self.base_url,
            list_endpoint: &self.list_endpoint,
            random_endpoint: &self.random_endpoint,
            random_orientation: &self.random_orientation,
            file_route_prefix: &self.file_route_prefix,
            list_dir: &self.list_dir,
            preview_dir: &self.preview_dir,
            default_category: &self.default_category,
            recursive: self.recursive,
            page_size: self.page_size,
            enable_preview_mapping: self.enable_preview_mapping,
            api_token: &self.api_token,
        };
        // Serializing a struct of strings, bools and integers cannot fail.
        let encoded = serde_json::to_vec(&fields).unwrap_or_default();
        hex::encode(Sha256::digest(&encoded))
    }
}

/// `1/true/yes/on` and `0/false/no/off`, anything else is `default`.
pub fn parse_bool(value: Option<&serde_json::Value>, default: bool) -> bool {
    match value {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::Number(n)) => n.as_f64().map_or(default, |n| n != 0.0),
        Some(serde_json::Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        _ => default,
    }
}

/// Numeric sizes are floored and clamped to `1..=MAX_PAGE_SIZE`; missing or
/// non-numeric values fall back to [`DEFAULT_PAGE_SIZE`].
pub fn parse_page_size(value: Option<&serde_json::Value>) -> usize {
    let number = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => (n.floor().max(1.0) as usize).min(MAX_PAGE_SIZE),
        _ => DEFAULT_PAGE_SIZE,
    }
}

fn normalize_orientation(input: Option<&str>) -> String {
    let normalized = input.unwrap_or_default().trim().to_ascii_lowercase();
    if RANDOM_ORIENTATIONS.contains(&normalized.as_str()) {
        normalized
    } else {
        String::new()
    }
}
