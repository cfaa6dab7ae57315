use crate::formats::FileRecord;
use crate::paths::{base_name, extension, segments, without_extension};

pub const IMAGE_EXTENSIONS: [&str; 8] = [
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".avif", ".svg",
];

// Spellings seen in ImgBed metadata over time, checked in this order.
const MIME_METADATA_KEYS: [&str; 6] = [
    "File-Mime",
    "file-mime",
    "FileType",
    "fileType",
    "mimeType",
    "mime",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    pub category: String,
    pub dedupe_key: String,
    pub relative_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    pub category: String,
    pub base_name: String,
    pub dedupe_key: String,
    pub relative_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Preview(PreviewEntry),
    Original(CategoryEntry),
    /// Lives under the preview directory but has no category segment.
    PreviewCategory,
    Empty,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    preview_dir: String,
    default_category: String,
    preview_mapping: bool,
}

impl Classifier {
    pub fn new(preview_dir: impl Into<String>, default_category: impl Into<String>) -> Self {
        Self {
            preview_dir: preview_dir.into(),
            default_category: default_category.into(),
            preview_mapping: true,
        }
    }

    pub fn with_preview_mapping(mut self, enabled: bool) -> Self {
        self.preview_mapping = enabled;
        self
    }

    /// Classifies a path with the scope directory already stripped.
    pub fn classify(&self, relative_path: &str) -> Classified {
        if self.preview_mapping
            && let Some(preview) = self.parse_preview(relative_path)
        {
            return Classified::Preview(preview);
        }
        match self.parse_original(relative_path) {
            Some(original) => Classified::Original(original),
            None if segments(relative_path).is_empty() => Classified::Empty,
            None => Classified::PreviewCategory,
        }
    }

    fn parse_preview(&self, relative_path: &str) -> Option<PreviewEntry> {
        let parts = segments(relative_path);
        if parts.len() < 3 || parts[0] != self.preview_dir {
            return None;
        }

        let category = parts[1].to_owned();
        let file_path = parts[2..].join("/");
        let dedupe_key = format!("{category}/{}", without_extension(&file_path));

        Some(PreviewEntry {
            category,
            dedupe_key,
            relative_path: relative_path.to_owned(),
        })
    }

    fn parse_original(&self, relative_path: &str) -> Option<CategoryEntry> {
        let parts = segments(relative_path);
        let (category, file_path) = match parts.as_slice() {
            [] => return None,
            [file] => (self.default_category.clone(), (*file).to_owned()),
            [category, rest @ ..] => ((*category).to_owned(), rest.join("/")),
        };

        if category == self.preview_dir {
            return None;
        }

        let dedupe_key = format!("{category}/{}", without_extension(&file_path));
        Some(CategoryEntry {
            base_name: base_name(&file_path).to_owned(),
            category,
            dedupe_key,
            relative_path: relative_path.to_owned(),
        })
    }
}

/// Accepts records with an image extension or an `image/*` MIME hint.
pub fn is_image_record(record: &FileRecord) -> bool {
    let ext = extension(record.file_name()).to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return true;
    }

    let Some(metadata) = record.metadata.as_ref() else {
        return false;
    };
    MIME_METADATA_KEYS
        .iter()
        .filter_map(|key| metadata.get(*key))
        .find(|value| is_truthy(value))
        .and_then(|value| value.as_str())
        .is_some_and(|mime| mime.to_ascii_lowercase().starts_with("image/"))
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn classifier() -> Classifier {
        Classifier::new("0_preview", "uncategorized")
    }

    #[test]
    fn preview_needs_category_and_file() {
        assert_eq!(
            classifier().classify("0_preview/cats/sub/a.png"),
            Classified::Preview(PreviewEntry {
                category: "cats".to_owned(),
                dedupe_key: "cats/sub/a".to_owned(),
                relative_path: "0_preview/cats/sub/a.png".to_owned(),
            })
        );
        assert_eq!(
            classifier().classify("0_preview/a.png"),
            Classified::PreviewCategory
        );
    }

    #[test]
    fn originals_take_first_segment_as_category() {
        let Classified::Original(entry) = classifier().classify("cats/sub/a.b.jpg") else {
            panic!("expected original");
        };
        assert_eq!(entry.category, "cats");
        assert_eq!(entry.base_name, "a.b");
        assert_eq!(entry.dedupe_key, "cats/sub/a.b");
    }

    #[test]
    fn single_segment_uses_default_category() {
        let Classified::Original(entry) = classifier().classify("a.jpg") else {
            panic!("expected original");
        };
        assert_eq!(entry.category, "uncategorized");
        assert_eq!(entry.dedupe_key, "uncategorized/a");
    }

    #[test]
    fn disabled_preview_mapping_drops_preview_paths() {
        let classifier = classifier().with_preview_mapping(false);
        assert_eq!(
            classifier.classify("0_preview/cats/a.png"),
            Classified::PreviewCategory
        );
        assert_eq!(classifier.classify(""), Classified::Empty);
    }

    #[test]
    fn image_filter_accepts_extensions_case_insensitively() {
        assert!(is_image_record(&FileRecord::from_name("cats/A.JPEG")));
        assert!(!is_image_record(&FileRecord::from_name("cats/readme.txt")));
    }

    #[test]
    fn image_filter_reads_legacy_mime_keys() {
        let mut metadata = HashMap::new();
        metadata.insert("FileType".to_owned(), serde_json::json!("Image/HEIC"));
        let record = FileRecord {
            name: Some("cats/a.heic".to_owned()),
            metadata: Some(metadata),
            ..FileRecord::default()
        };
        assert!(is_image_record(&record));

        let mut metadata = HashMap::new();
        metadata.insert("mime".to_owned(), serde_json::json!("video/mp4"));
        let record = FileRecord {
            name: Some("cats/a.mp4".to_owned()),
            metadata: Some(metadata),
            ..FileRecord::default()
        };
        assert!(!is_image_record(&record));
    }
}
