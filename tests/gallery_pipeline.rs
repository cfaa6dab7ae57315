mod listing_stub;

use std::sync::Arc;
use std::time::Duration;

use imgbed_gallery::cache::{DEFAULT_TTL, ManualClock, ResultCache};
use imgbed_gallery::config::{RawSourceConfig, SourceConfig};
use imgbed_gallery::pipeline::GalleryPipeline;
use listing_stub::{ListingStub, ListingStubConfig};

fn scenario_config(base_url: &str) -> SourceConfig {
    SourceConfig::from_raw(&RawSourceConfig {
        base_url: Some(base_url.to_owned()),
        api_token: Some("token-a".to_owned()),
        list_dir: Some("photos".to_owned()),
        preview_dir: Some("0_preview".to_owned()),
        page_size: Some(serde_json::json!(3)),
        ..RawSourceConfig::default()
    })
}

#[tokio::test]
async fn preview_is_paired_with_its_original() {
    let stub = ListingStub::spawn(ListingStubConfig::with_names([
        "photos/0_preview/cats/a.jpg",
        "photos/cats/a.jpg",
    ]));
    let pipeline = GalleryPipeline::builder(scenario_config(&stub.base_url))
        .build()
        .unwrap();

    let run = pipeline.run_gallery().await.unwrap();
    let index = run.index;

    assert_eq!(index.total_images, 1);
    assert_eq!(index.gallery.len(), 1);
    let cats = &index.gallery["cats"];
    assert_eq!(cats.count, 1);
    let image = &cats.images[0];
    assert_eq!(image.name, "a");
    assert_eq!(image.category, "cats");
    assert_eq!(
        image.original,
        format!("{}/file/cats/a.jpg", stub.base_url)
    );
    assert_eq!(
        image.preview,
        format!("{}/file/0_preview/cats/a.jpg", stub.base_url)
    );
    assert_eq!(index.source.list_dir, "photos");
    assert_eq!(
        index.source.list_endpoint,
        format!("{}/api/manage/list", stub.base_url)
    );
    assert_eq!(run.report.previews, 1);
}

#[tokio::test]
async fn percent_encoded_urls_are_normalized_and_reencoded() {
    let stub = ListingStub::spawn(ListingStubConfig::with_names([
        "https://img.example.com/file/photos/%E4%BA%BA%E7%89%A9/%E5%BC%A0%20%E4%B8%89.png",
        "photos/人物/李.png",
    ]));
    let pipeline = GalleryPipeline::builder(scenario_config(&stub.base_url))
        .build()
        .unwrap();

    let index = pipeline.run_gallery().await.unwrap().index;
    let people = &index.gallery["人物"];
    let names: Vec<&str> = people.images.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["李", "张 三"]);
    assert!(
        people.images[1]
            .original
            .ends_with("/file/%E4%BA%BA%E7%89%A9/%E5%BC%A0%20%E4%B8%89.png"),
        "{}",
        people.images[1].original
    );
}

#[tokio::test]
async fn repeated_runs_match_except_timestamp() {
    let names: Vec<String> = (0..25)
        .map(|i| match i % 4 {
            0 => format!("photos/0_preview/c{}/img{i}.webp", i % 3),
            _ => format!("photos/c{}/img{i}.jpg", i % 3),
        })
        .collect();
    let stub = ListingStub::spawn(ListingStubConfig::with_names(names));
    let pipeline = GalleryPipeline::builder(scenario_config(&stub.base_url))
        .build()
        .unwrap();

    let mut first = pipeline.run_gallery().await.unwrap().index;
    let mut second = pipeline.run_gallery().await.unwrap().index;
    first.generated_at.clear();
    second.generated_at.clear();
    assert_eq!(first, second);
}

#[tokio::test]
async fn cache_serves_same_data_until_token_changes() {
    let stub = ListingStub::spawn(ListingStubConfig::with_names(["photos/cats/a.jpg"]));
    let clock = ManualClock::new();
    let cache = ResultCache::new(DEFAULT_TTL, Arc::new(clock.clone()));

    let fetch = |config: SourceConfig| {
        let cache = &cache;
        async move {
            let signature = config.signature();
            let pipeline = GalleryPipeline::builder(config).build().unwrap();
            cache
                .get_or_try_compute("gallery.example.com", &signature, || async {
                    pipeline.run_gallery().await.map(|run| run.index)
                })
                .await
                .unwrap()
        }
    };

    let config = scenario_config(&stub.base_url);
    let first = fetch(config.clone()).await;
    clock.advance(Duration::from_secs(30));
    let second = fetch(config.clone()).await;
    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.data, second.data);
    assert_eq!(stub.requests().len(), 1);

    let rotated = SourceConfig {
        api_token: "token-b".to_owned(),
        ..config
    };
    let third = fetch(rotated).await;
    assert!(!third.cached);
    assert_eq!(stub.requests().len(), 2);
    assert_eq!(
        stub.requests()[1].authorization.as_deref(),
        Some("Bearer token-b")
    );
}

#[tokio::test]
async fn directory_listing_reflects_the_scope() {
    let stub = ListingStub::spawn(ListingStubConfig::with_names([
        "photos/a/b/c.jpg",
        "photos/a/d.jpg",
        "photos/z.txt",
    ]));
    let pipeline = GalleryPipeline::builder(scenario_config(&stub.base_url))
        .build()
        .unwrap();

    let listing = pipeline.run_directories().await.unwrap().listing;
    assert_eq!(listing.file_count, 3);
    assert_eq!(listing.directory_count, 2);
    assert_eq!(listing.source_list_dir, "photos");
    assert_eq!(listing.tree.children.len(), 1);
    assert_eq!(listing.tree.children[0].path, "a");
    assert_eq!(listing.tree.children[0].children[0].path, "a/b");
}
