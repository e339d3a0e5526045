//! End-to-end creator runs against a mock Civitai.

use civitai_mirror::{Category, CategoryFilter, DownloadType, Error, MirrorBuilder};

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::helpers::*;

const WEIGHTS_SIZE: usize = 256;

/// One LORA item with one version, one weights file and two images.
async fn alice_catalog(server: &MockServer) -> Value {
    let item = item_json(
        42,
        "ItemName",
        "LORA",
        vec![version_json(
            "VersionName",
            vec![file_json(
                "ItemName.safetensors",
                &format!("{}/files/1", server.uri()),
            )],
            vec![
                image_json(1, &format!("{}/img/1.png", server.uri())),
                image_json(7, &format!("{}/img/7.png", server.uri())),
            ],
        )],
    );
    page_json(vec![item], None)
}

fn version_folder(root: &Path) -> std::path::PathBuf {
    root.join("downloads/alice/Lora/0000042 - ItemName/VersionName")
}

fn builder(server: &MockServer, root: &Path) -> MirrorBuilder {
    test_builder(server, root).min_weights_size(WEIGHTS_SIZE as u64)
}

#[tokio::test]
async fn test_alice_layout() {
    let server = MockServer::start().await;
    let catalog = alice_catalog(&server).await;
    mount_first_page(&server, "alice", catalog).await;
    mount_file(&server, "/files/1", &create_test_content(WEIGHTS_SIZE)).await;
    mount_image(&server, "/img/1.png", b"preview").await;
    mount_image(&server, "/img/7.png", b"example").await;

    let dir = create_temp_dir();
    let mirror = builder(&server, dir.path()).build().unwrap();
    let run = mirror.process_creator("alice").await.unwrap();

    let version = version_folder(dir.path());
    assert_file_exists(&version.join("ItemName.safetensors"));
    assert_file_exists(&version.join("preview.jpg"));
    assert_file_exists(&version.join("ItemName.civitai.info"));
    assert_file_exists(&version.join("details.txt"));
    assert_eq!(fs::read(version.join("preview.jpg")).unwrap(), b"preview");

    let examples: Vec<_> = fs::read_dir(version.join("examples"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(examples.len(), 1);
    assert_eq!(fs::read(&examples[0]).unwrap(), b"example");
    assert_eq!(examples[0].extension().unwrap(), "jpg");

    let description = fs::read_to_string(version.join("description.txt")).unwrap();
    assert_eq!(description, "An example item");
    let trigger_words = fs::read_to_string(version.join("triggerWords.txt")).unwrap();
    assert_eq!(trigger_words, "trigger");
    let metadata: Value =
        serde_json::from_str(&fs::read_to_string(version.join("ItemName.civitai.info")).unwrap())
            .unwrap();
    assert_eq!(metadata["id"], 42);

    assert_eq!(run.pages, 1);
    assert_eq!(run.total_items, 1);
    assert_eq!(run.category_counts.get(&Category::Lora), Some(&1));
    assert_eq!(run.selected, 1);
    assert_eq!(run.intentionally_skipped, 0);
    assert_eq!(run.downloaded, 1);
    assert_eq!(run.failed, 0);
    assert_eq!(run.tasks.downloaded, 3);
    assert_eq!(run.failure_records, 0);

    let summary = fs::read_to_string(dir.path().join("logs/alice.txt")).unwrap();
    assert!(summary.starts_with("Summary:\nTotal - Count: 1\n"));
    assert!(summary.contains("Lora - Item: ItemName"));
    let failures = fs::read_to_string(dir.path().join("logs/failed_downloads_alice.txt")).unwrap();
    assert_eq!(failures, "Failed Downloads for Username: alice\n\n");
}

#[tokio::test]
async fn test_second_run_downloads_nothing() {
    let server = MockServer::start().await;
    let catalog = alice_catalog(&server).await;
    mount_first_page(&server, "alice", catalog).await;
    for (route, body, mime) in [
        ("/files/1", create_test_content(WEIGHTS_SIZE), "application/octet-stream"),
        ("/img/1.png", b"preview".to_vec(), "image/png"),
        ("/img/7.png", b"example".to_vec(), "image/png"),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, mime))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = create_temp_dir();
    let mirror = builder(&server, dir.path()).build().unwrap();
    let first = mirror.process_creator("alice").await.unwrap();
    let second = mirror.process_creator("alice").await.unwrap();

    assert_eq!(first.tasks.downloaded, 3);
    assert_eq!(second.tasks.downloaded, 0);
    assert_eq!(second.tasks.skipped, 3);
    assert_eq!(second.downloaded, 1);
}

#[tokio::test]
async fn test_missing_image_is_recorded_without_run_error() {
    let server = MockServer::start().await;
    let catalog = alice_catalog(&server).await;
    mount_first_page(&server, "alice", catalog).await;
    mount_file(&server, "/files/1", &create_test_content(WEIGHTS_SIZE)).await;
    mount_image(&server, "/img/1.png", b"preview").await;
    Mock::given(method("GET"))
        .and(path("/img/7.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = create_temp_dir();
    let mirror = builder(&server, dir.path()).build().unwrap();
    let run = mirror.process_creator("alice").await.unwrap();

    assert_eq!(run.tasks.downloaded, 2);
    assert_eq!(run.tasks.failed, 1);
    assert_eq!(run.failure_records, 1);
    assert_eq!(run.downloaded, 1);

    let failures = fs::read_to_string(dir.path().join("logs/failed_downloads_alice.txt")).unwrap();
    assert!(failures.contains("Item Name: ItemName\n"));
    assert!(failures.contains("/img/7.png"));
    assert!(!failures.contains(TEST_TOKEN));
}

#[tokio::test]
async fn test_filter_leaves_other_categories_alone() {
    let server = MockServer::start().await;
    let catalog = alice_catalog(&server).await;
    mount_first_page(&server, "alice", catalog).await;
    Mock::given(method("GET"))
        .and(path("/files/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/1.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = create_temp_dir();
    let mirror = builder(&server, dir.path())
        .download_type(DownloadType::Only(Category::Checkpoints))
        .build()
        .unwrap();
    let run = mirror.process_creator("alice").await.unwrap();

    assert_eq!(
        run.filter,
        CategoryFilter::Include(DownloadType::Only(Category::Checkpoints))
    );
    assert_eq!(run.selected, 0);
    assert_eq!(run.intentionally_skipped, 1);
    assert_eq!(run.downloaded, 0);
    assert_eq!(run.failed, 0);
    assert!(!dir.path().join("downloads/alice/Lora").exists());
}

#[tokio::test]
async fn test_exclude_filter_counts() {
    let server = MockServer::start().await;
    let catalog = alice_catalog(&server).await;
    mount_first_page(&server, "alice", catalog).await;

    let dir = create_temp_dir();
    let mirror = builder(&server, dir.path())
        .exclude_type(DownloadType::Only(Category::Lora))
        .build()
        .unwrap();
    let run = mirror.process_creator("alice").await.unwrap();

    assert_eq!(run.selected, 0);
    assert_eq!(run.intentionally_skipped, 1);
    assert_eq!(run.tasks.downloaded, 0);
}

#[tokio::test]
async fn test_filter_exclusivity_is_rejected() {
    let server = MockServer::start().await;
    let dir = create_temp_dir();

    let err = builder(&server, dir.path())
        .download_type(DownloadType::Only(Category::Lora))
        .exclude_type(DownloadType::Only(Category::Checkpoints))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let err = builder(&server, dir.path())
        .exclude_type(DownloadType::All)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn test_unavailable_creator_does_not_stop_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(MODELS_PATH))
        .and(query_param("username", "bob"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    mount_first_page(&server, "alice", page_json(vec![], None)).await;

    let dir = create_temp_dir();
    let mirror = builder(&server, dir.path()).build().unwrap();
    let results = mirror
        .run(&["bob".to_string(), "alice".to_string()])
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "bob");
    assert!(matches!(
        results[0].1,
        Err(Error::CatalogUnavailable { attempts: 3, .. })
    ));
    let alice = results[1].1.as_ref().unwrap();
    assert_eq!(alice.total_items, 0);
    assert_eq!(alice.selected, 0);
}

#[tokio::test]
async fn test_same_name_items_on_one_page_are_processed_once() {
    let server = MockServer::start().await;
    let mut page = alice_catalog(&server).await;
    let twin = item_json(
        43,
        "ItemName",
        "LORA",
        vec![version_json(
            "VersionName",
            vec![file_json("ItemName.safetensors", &format!("{}/files/2", server.uri()))],
            vec![],
        )],
    );
    page["items"].as_array_mut().unwrap().push(twin);
    mount_first_page(&server, "alice", page).await;
    mount_file(&server, "/files/1", &create_test_content(WEIGHTS_SIZE)).await;
    mount_image(&server, "/img/1.png", b"preview").await;
    mount_image(&server, "/img/7.png", b"example").await;
    Mock::given(method("GET"))
        .and(path("/files/2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = create_temp_dir();
    let mirror = builder(&server, dir.path()).build().unwrap();
    let run = mirror.process_creator("alice").await.unwrap();

    assert_eq!(run.tasks.downloaded, 3);
    assert_file_exists(&version_folder(dir.path()));
    assert!(!dir
        .path()
        .join("downloads/alice/Lora/0000043 - ItemName")
        .exists());
}

#[tokio::test]
async fn test_downloads_respect_worker_pool_width() {
    const DELAY: Duration = Duration::from_millis(200);

    let server = MockServer::start().await;
    let images = (1..=5)
        .map(|id| image_json(id, &format!("{}/slow/img/{id}", server.uri())))
        .collect();
    let item = item_json(
        42,
        "ItemName",
        "LORA",
        vec![version_json(
            "VersionName",
            vec![file_json("ItemName.safetensors", &format!("{}/slow/file", server.uri()))],
            images,
        )],
    );
    mount_first_page(&server, "alice", page_json(vec![item], None)).await;
    Mock::given(method("GET"))
        .and(path_regex("^/slow/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(create_test_content(WEIGHTS_SIZE), "application/octet-stream")
                .set_delay(DELAY),
        )
        .expect(6)
        .mount(&server)
        .await;

    let dir = create_temp_dir();
    let mirror = builder(&server, dir.path())
        .concurrent_downloads(2)
        .build()
        .unwrap();
    let started = Instant::now();
    let run = mirror.process_creator("alice").await.unwrap();

    // Six delayed transfers, two at a time, take at least three delays.
    assert!(started.elapsed() >= DELAY * 3, "{:?}", started.elapsed());
    assert_eq!(run.tasks.downloaded, 6);
}

#[tokio::test]
async fn test_unwritable_folder_is_recorded_and_siblings_continue() {
    let server = MockServer::start().await;
    let mut page = alice_catalog(&server).await;
    let broken = item_json(
        43,
        "Broken",
        "LORA",
        vec![version_json(
            "VersionName",
            vec![file_json("Broken.safetensors", &format!("{}/files/2", server.uri()))],
            vec![],
        )],
    );
    page["items"].as_array_mut().unwrap().push(broken);
    mount_first_page(&server, "alice", page).await;
    mount_file(&server, "/files/1", &create_test_content(WEIGHTS_SIZE)).await;
    mount_image(&server, "/img/1.png", b"preview").await;
    mount_image(&server, "/img/7.png", b"example").await;
    Mock::given(method("GET"))
        .and(path("/files/2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = create_temp_dir();
    // A plain file where the item folder should go.
    let lora = dir.path().join("downloads/alice/Lora");
    fs::create_dir_all(&lora).unwrap();
    fs::write(lora.join("0000043 - Broken"), b"in the way").unwrap();

    let mirror = builder(&server, dir.path()).build().unwrap();
    let run = mirror.process_creator("alice").await.unwrap();

    assert_eq!(run.failure_records, 1);
    assert_eq!(run.tasks.downloaded, 3);
    assert_file_exists(&version_folder(dir.path()).join("ItemName.safetensors"));
    let failures = fs::read_to_string(dir.path().join("logs/failed_downloads_alice.txt")).unwrap();
    assert!(failures.contains("Item Name: Broken\n"));
    assert!(failures.contains("URL: https://civitai.com/models/43\n"));
}

#[tokio::test]
async fn test_invalid_image_entries_are_recorded() {
    let server = MockServer::start().await;
    let item = item_json(
        42,
        "ItemName",
        "LORA",
        vec![version_json(
            "VersionName",
            vec![file_json("ItemName.safetensors", &format!("{}/files/1", server.uri()))],
            vec![
                json!({"id": 1, "url": format!("{}/img/1.png", server.uri()), "type": null}),
                json!({"url": format!("{}/img/x.png", server.uri()), "type": "image"}),
                json!({"id": 7, "url": format!("{}/img/7.png", server.uri())}),
                json!({"id": null, "url": format!("{}/img/y.png", server.uri())}),
            ],
        )],
    );
    mount_first_page(&server, "alice", page_json(vec![item], None)).await;
    mount_file(&server, "/files/1", &create_test_content(WEIGHTS_SIZE)).await;
    mount_image(&server, "/img/1.png", b"preview").await;
    mount_image(&server, "/img/7.png", b"example").await;
    for route in ["/img/x.png", "/img/y.png"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
    }

    let dir = create_temp_dir();
    let mirror = builder(&server, dir.path()).build().unwrap();
    let run = mirror.process_creator("alice").await.unwrap();

    let version = version_folder(dir.path());
    assert_eq!(fs::read(version.join("preview.jpg")).unwrap(), b"preview");
    assert_eq!(fs::read_dir(version.join("examples")).unwrap().count(), 1);
    assert_eq!(run.tasks.downloaded, 3);
    assert_eq!(run.tasks.skipped, 0);
    assert_eq!(run.failure_records, 2);
}
