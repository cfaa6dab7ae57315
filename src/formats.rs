use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// One entry of an ImgBed listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl FileRecord {
    pub fn from_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// First non-empty of `name`, `path`, `src`.
    pub fn raw_path(&self) -> &str {
        [&self.name, &self.path, &self.src]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }

    /// Name used for extension sniffing: `name`, then `path`.
    pub fn file_name(&self) -> &str {
        [&self.name, &self.path]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }
}

/// Raw listing page as returned by `GET {list_endpoint}`.
///
/// Counts are kept as loose JSON values because upstream sends numbers,
/// numeric strings, or nothing at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    #[serde(default, deserialize_with = "files_or_empty")]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub returned_count: Option<serde_json::Value>,
    #[serde(default)]
    pub total_count: Option<serde_json::Value>,
}

impl ListPage {
    pub fn returned_count(&self) -> Option<usize> {
        self.returned_count.as_ref().and_then(non_negative_count)
    }

    pub fn total_count(&self) -> Option<usize> {
        self.total_count.as_ref().and_then(non_negative_count)
    }
}

fn non_negative_count(value: &serde_json::Value) -> Option<usize> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    Some(number as usize)
}

fn files_or_empty<'de, D>(deserializer: D) -> Result<Vec<FileRecord>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GallerySource {
    #[serde(rename = "type")]
    pub kind: String,
    pub base_url: String,
    pub list_endpoint: String,
    pub random_endpoint: String,
    pub random_orientation: String,
    pub file_route_prefix: String,
    pub list_dir: String,
    pub preview_dir: String,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub name: String,
    pub original: String,
    pub preview: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryCategory {
    pub name: String,
    pub images: Vec<GalleryImage>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryIndex {
    pub source: GallerySource,
    pub gallery: BTreeMap<String, GalleryCategory>,
    pub total_images: usize,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub name: String,
    pub path: String,
    pub children: Vec<DirectoryNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub source_list_dir: String,
    pub file_count: usize,
    pub directory_count: usize,
    pub tree: DirectoryNode,
}
