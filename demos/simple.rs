use bytes::Bytes;
use futures::TryStreamExt;
use ossfs_adapter::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Build the adapter over the in-memory store, rooted at "uploads/"
    let bucket: BucketName = "demo-bucket".parse()?;
    let client = InMemoryOssClient::new(bucket.clone());
    let adapter = OssAdapter::new(
        Arc::new(client.clone()),
        bucket,
        "uploads",
        AccessControl::PublicRead,
    );

    adapter
        .write("notes/hello.txt", Bytes::from("Hello, World!"))
        .await?;
    adapter
        .write("notes/todo.txt", Bytes::from("- buy milk\n"))
        .await?;
    adapter.create_dir("notes/archive").await?;
    adapter
        .write("notes/archive/2011.txt", Bytes::from("old"))
        .await?;

    println!("Top level of notes/:");
    let entries: Vec<Entry> = adapter.list_contents("notes", false).try_collect().await?;
    for entry in &entries {
        println!("  {}", serde_json::to_string(entry)?);
    }

    println!("\nEverything under notes/:");
    let entries: Vec<Entry> = adapter.list_contents("notes", true).try_collect().await?;
    for entry in &entries {
        println!("  {}", serde_json::to_string(entry)?);
    }

    let file = adapter.read("notes/hello.txt").await?;
    println!(
        "\n{} ({}): {}",
        file.path,
        adapter.get_mimetype(&file.path).await?,
        String::from_utf8_lossy(&file.contents)
    );

    adapter.rename("notes/todo.txt", "notes/done.txt").await?;
    println!(
        "renamed: old exists = {}, new exists = {}",
        adapter.has("notes/todo.txt").await?,
        adapter.has("notes/done.txt").await?
    );

    if let Err(err) = adapter.delete_dir("notes").await {
        println!("delete_dir: {}", err);
    }

    println!("\nRaw keys in the bucket:");
    for key in client.keys().await {
        println!("  {}", key);
    }
    println!("{} store requests issued", client.request_count());

    Ok(())
}
