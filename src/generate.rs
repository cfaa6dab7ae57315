use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use tokio::fs;

use crate::cli::{DirectoriesArgs, GenerateArgs, SourceArgs};
use crate::config::{RawSourceConfig, SourceConfig};
use crate::paths::trim_slashes;
use crate::pipeline::GalleryPipeline;

pub async fn run(args: GenerateArgs) -> anyhow::Result<()> {
    if !args.force
        && fs::try_exists(&args.out)
            .await
            .with_context(|| format!("stat output: {}", args.out.display()))?
    {
        anyhow::bail!(
            "output already exists: {} (pass --force to overwrite)",
            args.out.display()
        );
    }

    let pipeline = pipeline_from(&args.source)?;
    let config = pipeline.config();
    tracing::info!(
        base_url = %config.base_url,
        list_endpoint = %config.list_endpoint_url(),
        list_dir = %config.list_dir,
        out = %args.out.display(),
        "generating gallery index"
    );

    let run = pipeline.run_gallery().await.context("build gallery index")?;
    write_json_atomic(&args.out, &run.index).await?;

    tracing::info!(
        total_images = run.index.total_images,
        categories = run.index.gallery.len(),
        skipped = run.report.skipped(),
        out = %args.out.display(),
        "gallery index written"
    );
    Ok(())
}

pub async fn directories(args: DirectoriesArgs) -> anyhow::Result<()> {
    let pipeline = pipeline_from(&args.source)?;
    let run = pipeline
        .run_directories()
        .await
        .context("list directories")?;

    let json = match args.select.as_deref() {
        Some(path) => {
            let node = run.listing.tree.resolve_or_root(path);
            if node.path != trim_slashes(path) {
                tracing::warn!(select = path, "directory not found; showing root");
            }
            serde_json::to_string_pretty(node)
        }
        None => serde_json::to_string_pretty(&run.listing),
    }
    .context("serialize directory listing")?;

    println!("{json}");
    Ok(())
}

/// Environment first, then CLI flags; fails on a missing base URL before
/// any request is made.
fn pipeline_from(source: &SourceArgs) -> anyhow::Result<GalleryPipeline> {
    let config: SourceConfig = source.resolve(&RawSourceConfig::from_env());
    config.require_base_url()?;
    if config.api_token.is_empty() {
        tracing::warn!("IMGBED_API_TOKEN is empty; listing without authorization");
    }
    GalleryPipeline::builder(config)
        .request_timeout(Duration::from_secs(source.timeout_secs))
        .build()
}

async fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).context("serialize json")?;
    fs::write(&tmp_path, &data)
        .await
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn atomic_write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");

        write_json_atomic(&path, &serde_json::json!({"v": 1}))
            .await
            .unwrap();
        write_json_atomic(&path, &serde_json::json!({"v": 2}))
            .await
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["v"], 2);
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
