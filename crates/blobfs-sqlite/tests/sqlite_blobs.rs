//! Blob storage persisted through a SQLite database file.

use std::sync::Arc;

use blobfs_core::{BlobFs, BlobFsConfig, BlobFsError, NodeId, NodeKind, RecordStore};
use blobfs_sqlite::{Database, SqliteConfig, SqliteRecordStore};
use tempfile::TempDir;

async fn open_fs(config: &SqliteConfig, block_size: u32) -> BlobFs {
    let db = Database::open_with(config).expect("open database");
    let store: Arc<dyn RecordStore> = Arc::new(SqliteRecordStore::new(db));
    BlobFs::open(
        store,
        BlobFsConfig {
            block_size,
            ..Default::default()
        },
    )
    .await
    .expect("open blob filesystem")
}

#[tokio::test]
async fn blobs_survive_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let config = SqliteConfig {
        path: Some(dir.path().join("blobs.db")),
    };
    let id = NodeId::from("f1");

    {
        let fs = open_fs(&config, 4).await;
        fs.create_node(&"0".into(), "/", NodeKind::Directory, None)
            .await
            .unwrap();
        fs.create_node(&id, "f1", NodeKind::File, Some(&"0".into()))
            .await
            .unwrap();

        let mut cursor = fs.open_cursor(&id).await.unwrap();
        cursor.write(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]).await.unwrap();
        cursor.close().await.unwrap();
    }

    // a different configured block size must not override the stored one
    let fs = open_fs(&config, 512).await;
    assert_eq!(fs.settings().block_size, 4);

    let meta = fs.stat(&id).await.unwrap();
    assert_eq!(meta.size, 10);
    assert_eq!(meta.parent, Some(NodeId::from("0")));

    let mut cursor = fs.open_cursor(&id).await.unwrap();
    let mut buf = [0u8; 10];
    assert_eq!(cursor.read(&mut buf).await.unwrap(), 10);
    assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
    cursor.close().await.unwrap();

    let blocks = fs.nodes().blocks(&id, 4);
    assert_eq!(blocks.indexes().await.unwrap(), vec![0, 1, 2]);
    assert_eq!(blocks.load(2).await.unwrap(), Some(vec![9, 10, 0, 0]));
}

#[tokio::test]
async fn in_memory_database_reports_tree_errors() {
    let fs = open_fs(&SqliteConfig::default(), 4).await;

    assert!(matches!(
        fs.create_node(&"x".into(), "x", NodeKind::File, Some(&"ghost".into()))
            .await,
        Err(BlobFsError::ParentNotFound(_))
    ));
    assert!(matches!(
        fs.open_cursor(&"nonexistent".into()).await,
        Err(BlobFsError::NotFound(_))
    ));
}

#[tokio::test]
async fn appends_through_positioned_writes() {
    let fs = open_fs(&SqliteConfig::default(), 3).await;
    let id = NodeId::from("log");
    fs.create_node(&id, "log", NodeKind::File, None).await.unwrap();

    for line in ["alpha\n", "beta\n", "gamma\n"] {
        let size = fs.stat(&id).await.unwrap().size;
        fs.write_at(&id, size, line.as_bytes()).await.unwrap();
    }

    let content = fs.read_range(&id, 0, 1024).await.unwrap();
    assert_eq!(content, b"alpha\nbeta\ngamma\n");
    assert!(matches!(
        fs.write_at(&id, 100, b"x").await,
        Err(BlobFsError::InvalidPosition { .. })
    ));
}
