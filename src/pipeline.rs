use std::sync::Arc;
use std::time::Duration;

use chrono::SecondsFormat;

use crate::classify::{Classified, Classifier, is_image_record};
use crate::config::SourceConfig;
use crate::error::PipelineError;
use crate::formats::{DirectoryListing, FileRecord, GalleryIndex};
use crate::gallery::GalleryAssembler;
use crate::listing::{DEFAULT_TIMEOUT, ListingClient, ListingLimits, ListingSource};
use crate::paths::{normalize_listed_path, strip_scope_dir};
use crate::tree::{build_tree, extract_directories};

/// Records that were dropped without failing the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    pub skipped_non_image: usize,
    pub skipped_malformed: usize,
    pub skipped_scope_root: usize,
    pub skipped_preview_category: usize,
    pub previews: usize,
    pub originals: usize,
}

impl RunReport {
    pub fn skipped(&self) -> usize {
        self.skipped_non_image
            + self.skipped_malformed
            + self.skipped_scope_root
            + self.skipped_preview_category
    }
}

#[derive(Debug, Clone)]
pub struct GalleryRun {
    pub index: GalleryIndex,
    pub report: RunReport,
}

#[derive(Debug, Clone)]
pub struct DirectoryRun {
    pub listing: DirectoryListing,
    pub report: RunReport,
}

/// Listing -> normalize -> classify -> gallery index or directory tree.
///
/// ```no_run
/// # async fn demo(config: imgbed_gallery::config::SourceConfig) -> anyhow::Result<()> {
/// let pipeline = imgbed_gallery::pipeline::GalleryPipeline::builder(config).build()?;
/// let run = pipeline.run_gallery().await?;
/// println!("{} images", run.index.total_images);
/// # Ok(())
/// # }
/// ```
pub struct GalleryPipeline {
    config: SourceConfig,
    source: Arc<dyn ListingSource>,
    limits: Option<ListingLimits>,
}

pub struct GalleryPipelineBuilder {
    config: SourceConfig,
    source: Option<Arc<dyn ListingSource>>,
    limits: Option<ListingLimits>,
    timeout: Duration,
}

impl GalleryPipelineBuilder {
    pub fn source(mut self, source: Arc<dyn ListingSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Overrides the per-call default caps.
    pub fn limits(mut self, limits: ListingLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> anyhow::Result<GalleryPipeline> {
        let source = match self.source {
            Some(source) => source,
            None => Arc::new(ListingClient::new(self.timeout)?),
        };
        Ok(GalleryPipeline {
            config: self.config,
            source,
            limits: self.limits,
        })
    }
}

impl GalleryPipeline {
    pub fn builder(config: SourceConfig) -> GalleryPipelineBuilder {
        GalleryPipelineBuilder {
            config,
            source: None,
            limits: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub async fn run_gallery(&self) -> Result<GalleryRun, PipelineError> {
        self.config.require_base_url()?;
        let limits = self.limits.unwrap_or(ListingLimits::GALLERY);
        let listing = self.source.list_all(&self.config, limits).await?;

        let mut report = RunReport::default();
        let index = self.index_records(&listing.records, &mut report);
        tracing::info!(
            fetched = report.fetched,
            originals = report.originals,
            previews = report.previews,
            skipped = report.skipped(),
            categories = index.gallery.len(),
            "gallery index built"
        );
        Ok(GalleryRun { index, report })
    }

    /// Builds the index from already fetched records.
    pub fn index_records(&self, records: &[FileRecord], report: &mut RunReport) -> GalleryIndex {
        let config = &self.config;
        let classifier = Classifier::new(&config.preview_dir, &config.default_category)
            .with_preview_mapping(config.enable_preview_mapping);

        let mut previews = Vec::new();
        let mut originals = Vec::new();
        report.fetched += records.len();

        for record in records {
            if !is_image_record(record) {
                report.skipped_non_image += 1;
                continue;
            }
            let Some(relative) = self.scoped_path(record, report) else {
                continue;
            };
            match classifier.classify(&relative) {
                Classified::Preview(entry) => previews.push(entry),
                Classified::Original(entry) => originals.push(entry),
                Classified::PreviewCategory => {
                    tracing::debug!(path = %relative, "preview file without category skipped");
                    report.skipped_preview_category += 1;
                }
                Classified::Empty => report.skipped_malformed += 1,
            }
        }

        report.previews += previews.len();
        report.originals += originals.len();
        GalleryAssembler::new(config).assemble(&previews, &originals, now_rfc3339())
    }

    /// Reduced run for the directory browser: no image filter, no
    /// classification.
    pub async fn run_directories(&self) -> Result<DirectoryRun, PipelineError> {
        self.config.require_base_url()?;
        let limits = self.limits.unwrap_or(ListingLimits::DIRECTORIES);
        let listing = self.source.list_all(&self.config, limits).await?;

        let mut report = RunReport::default();
        let listing = self.directory_listing(&listing.records, &mut report);
        tracing::info!(
            files = listing.file_count,
            directories = listing.directory_count,
            skipped = report.skipped(),
            "directory tree built"
        );
        Ok(DirectoryRun { listing, report })
    }

    pub fn directory_listing(
        &self,
        records: &[FileRecord],
        report: &mut RunReport,
    ) -> DirectoryListing {
        report.fetched += records.len();
        let relative_paths: Vec<String> = records
            .iter()
            .filter_map(|record| self.scoped_path(record, report))
            .collect();

        let directories = extract_directories(relative_paths.iter().map(String::as_str));
        let tree = build_tree(directories.iter().map(String::as_str));

        DirectoryListing {
            domain: None,
            source_list_dir: self.config.list_dir.clone(),
            file_count: records.len(),
            directory_count: directories.len(),
            tree,
        }
    }

    /// Normalized path with the scope directory stripped.
    fn scoped_path(&self, record: &FileRecord, report: &mut RunReport) -> Option<String> {
        let normalized = normalize_listed_path(record.raw_path(), &self.config.file_route_prefix);
        if normalized.is_empty() {
            tracing::debug!(?record, "listing record without a usable path skipped");
            report.skipped_malformed += 1;
            return None;
        }
        let Some(relative) = strip_scope_dir(&normalized, &self.config.list_dir) else {
            report.skipped_scope_root += 1;
            return None;
        };
        Some(relative.to_owned())
    }
}

impl std::fmt::Debug for GalleryPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryPipeline")
            .field("config", &self.config)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
