use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use ossfs_adapter::{
    AccessControl, BucketName, Entry, EntryKind, Filesystem, InMemoryOssClient, OssAdapter,
};
use std::sync::Arc;

fn bucket() -> BucketName {
    "media-assets".parse().unwrap()
}

fn setup(prefix: &str) -> (OssAdapter, InMemoryOssClient) {
    let client = InMemoryOssClient::new(bucket());
    let adapter = OssAdapter::new(
        Arc::new(client.clone()),
        bucket(),
        prefix,
        AccessControl::PublicRead,
    );
    (adapter, client)
}

async fn list(adapter: &OssAdapter, dir: &str, recursive: bool) -> Vec<Entry> {
    adapter
        .list_contents(dir, recursive)
        .try_collect()
        .await
        .unwrap()
}

fn paths(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.path.as_str()).collect()
}

async fn seed_bulk(client: &InMemoryOssClient, count: usize) {
    for i in 0..count {
        client
            .insert(&format!("uploads/bulk/file-{:04}.txt", i), "x")
            .await;
    }
}

#[tokio::test]
async fn test_directory_listing_scenario() {
    let (adapter, _) = setup("uploads");
    adapter.create_dir("a").await.unwrap();
    adapter.write("a/x.txt", Bytes::from("12345")).await.unwrap();
    adapter.create_dir("a/sub").await.unwrap();

    let entries = list(&adapter, "a", false).await;

    assert_eq!(paths(&entries), ["a/", "a/x.txt", "a/sub/"]);
    assert_eq!(entries[0].kind, EntryKind::Directory);
    assert_eq!(entries[1].kind, EntryKind::File);
    assert_eq!(entries[1].size, Some(5));
    assert!(entries[1].modified_at.is_some());
    assert_eq!(entries[2].kind, EntryKind::Directory);
    assert_eq!(entries[2].size, None);
}

#[tokio::test]
async fn test_recursive_listing_walks_every_level() {
    let (adapter, _) = setup("uploads");
    for path in ["a/x.txt", "a/sub/1.txt", "a/sub/deeper/2.txt", "b.txt"] {
        adapter.write(path, Bytes::from("x")).await.unwrap();
    }

    let flat = list(&adapter, "a", false).await;
    assert_eq!(paths(&flat), ["a/x.txt", "a/sub/"]);

    let recursive = list(&adapter, "a", true).await;
    assert_eq!(
        paths(&recursive),
        ["a/sub/1.txt", "a/sub/deeper/2.txt", "a/x.txt"]
    );
    assert!(recursive.iter().all(Entry::is_file));
}

#[tokio::test]
async fn test_root_listing() {
    let (adapter, _) = setup("");
    for path in ["top.txt", "docs/a.txt", "docs/b.txt"] {
        adapter.write(path, Bytes::from("x")).await.unwrap();
    }

    let entries = list(&adapter, "", false).await;
    assert_eq!(paths(&entries), ["top.txt", "docs/"]);
}

#[tokio::test]
async fn test_listing_follows_continuation_markers() {
    let (adapter, client) = setup("uploads");
    seed_bulk(&client, 250).await;

    let entries = list(&adapter, "bulk", false).await;

    assert_eq!(entries.len(), 250);
    assert_eq!(entries[0].path, "bulk/file-0000.txt");
    assert_eq!(entries[249].path, "bulk/file-0249.txt");
    // 100 + 100 + 50
    assert_eq!(client.request_count(), 3);
}

#[tokio::test]
async fn test_full_page_without_more_keys_is_a_single_request() {
    let (adapter, client) = setup("uploads");
    seed_bulk(&client, 100).await;

    let entries = list(&adapter, "bulk", true).await;

    assert_eq!(entries.len(), 100);
    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn test_pagination_counts_common_prefixes() {
    let (adapter, client) = setup("");
    for i in 0..120 {
        client.insert(&format!("groups/g{:03}/item.txt", i), "x").await;
    }
    for i in 0..30 {
        client.insert(&format!("groups/z{:02}.txt", i), "x").await;
    }

    let entries = list(&adapter, "groups", false).await;

    assert_eq!(entries.len(), 150);
    assert_eq!(entries.iter().filter(|e| e.is_dir()).count(), 120);
    assert_eq!(client.request_count(), 2);
}

#[tokio::test]
async fn test_listing_is_lazy() {
    let (adapter, client) = setup("uploads");
    seed_bulk(&client, 250).await;

    let first: Vec<Entry> = adapter
        .list_contents("bulk", false)
        .take(10)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(first.len(), 10);
    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn test_listing_restarts_from_the_first_page() {
    let (adapter, client) = setup("uploads");
    seed_bulk(&client, 150).await;

    let first = list(&adapter, "bulk", false).await;
    let second = list(&adapter, "bulk", false).await;

    assert_eq!(first, second);
    assert_eq!(client.request_count(), 4);
}

#[tokio::test]
async fn test_empty_directory() {
    let (adapter, _) = setup("uploads");
    adapter.write("elsewhere.txt", Bytes::from("x")).await.unwrap();

    assert!(list(&adapter, "empty", false).await.is_empty());
    assert!(list(&adapter, "empty", true).await.is_empty());
}

#[tokio::test]
async fn test_sibling_with_shared_name_prefix_is_excluded() {
    let (adapter, _) = setup("");
    adapter.write("photo/a.jpg", Bytes::from("x")).await.unwrap();
    adapter.write("photos/b.jpg", Bytes::from("x")).await.unwrap();

    let entries = list(&adapter, "photo", true).await;
    assert_eq!(paths(&entries), ["photo/a.jpg"]);
}

#[tokio::test]
async fn test_entries_serialize_as_records() {
    let (adapter, _) = setup("uploads");
    adapter.write("a/x.txt", Bytes::from("12345")).await.unwrap();
    adapter.create_dir("a/sub").await.unwrap();

    let entries = list(&adapter, "a", false).await;
    let file = serde_json::to_value(&entries[0]).unwrap();
    let dir = serde_json::to_value(&entries[1]).unwrap();

    assert_eq!(file["type"], "file");
    assert_eq!(file["path"], "a/x.txt");
    assert_eq!(file["size"], 5);
    assert_eq!(file["timestamp"], entries[0].timestamp().unwrap());
    assert_eq!(entries[1].timestamp(), None);
    assert_eq!(dir, serde_json::json!({ "type": "dir", "path": "a/sub/" }));
}
