use std::collections::{BTreeMap, HashMap};

use crate::classify::{CategoryEntry, PreviewEntry};
use crate::collate::NameOrder;
use crate::config::SourceConfig;
use crate::formats::{GalleryCategory, GalleryImage, GalleryIndex, GallerySource};
use crate::paths::{build_absolute_url, build_file_url};

pub const SOURCE_TYPE: &str = "imgbed";
pub const SOURCE_MODE: &str = "imgbed-api";

/// Pairs originals with previews and groups them into categories.
#[derive(Debug)]
pub struct GalleryAssembler<'a> {
    config: &'a SourceConfig,
    order: NameOrder,
}

impl<'a> GalleryAssembler<'a> {
    pub fn new(config: &'a SourceConfig) -> Self {
        Self {
            config,
            order: NameOrder::zh(),
        }
    }

    pub fn assemble(
        &self,
        previews: &[PreviewEntry],
        originals: &[CategoryEntry],
        generated_at: String,
    ) -> GalleryIndex {
        let preview_paths = preview_map(previews);

        let mut categories: BTreeMap<String, Vec<GalleryImage>> = BTreeMap::new();
        for entry in originals {
            let original = self.file_url(&entry.relative_path);
            let preview = match preview_paths.get(entry.dedupe_key.as_str()) {
                Some(path) => self.file_url(path),
                None => original.clone(),
            };
            categories
                .entry(entry.category.clone())
                .or_default()
                .push(GalleryImage {
                    name: entry.base_name.clone(),
                    original,
                    preview,
                    category: entry.category.clone(),
                });
        }

        let gallery = categories
            .into_iter()
            .map(|(name, mut images)| {
                images.sort_by(|a, b| {
                    self.order
                        .compare(&a.name, &b.name)
                        .then_with(|| a.original.cmp(&b.original))
                });
                tracing::debug!(category = %name, count = images.len(), "category assembled");
                let category = GalleryCategory {
                    name: name.clone(),
                    count: images.len(),
                    images,
                };
                (name, category)
            })
            .collect();

        GalleryIndex {
            source: self.source(),
            gallery,
            total_images: originals.len(),
            generated_at,
        }
    }

    /// Restates the effective configuration for downstream consumers.
    pub fn source(&self) -> GallerySource {
        let config = self.config;
        let list_dir = if config.list_dir.is_empty() {
            "/".to_owned()
        } else {
            config.list_dir.clone()
        };
        GallerySource {
            kind: SOURCE_TYPE.to_owned(),
            base_url: config.base_url.clone(),
            list_endpoint: build_absolute_url(&config.base_url, &config.list_endpoint),
            random_endpoint: build_absolute_url(&config.base_url, &config.random_endpoint),
            random_orientation: config.random_orientation.clone(),
            file_route_prefix: config.file_route_prefix.clone(),
            list_dir,
            preview_dir: config.preview_dir.clone(),
            mode: SOURCE_MODE.to_owned(),
        }
    }

    fn file_url(&self, relative_path: &str) -> String {
        build_file_url(
            &self.config.base_url,
            &self.config.file_route_prefix,
            relative_path,
        )
    }
}

/// Dedupe key -> preview file path. Colliding keys keep the smallest path
/// so the result does not depend on listing order.
fn preview_map(previews: &[PreviewEntry]) -> HashMap<&str, &str> {
    let mut map: HashMap<&str, &str> = HashMap::with_capacity(previews.len());
    for preview in previews {
        let path = preview.relative_path.as_str();
        map.entry(preview.dedupe_key.as_str())
            .and_modify(|current| {
                if path < *current {
                    *current = path;
                }
            })
            .or_insert(path);
    }
    map
}
