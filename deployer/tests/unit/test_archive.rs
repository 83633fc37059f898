//! Archive store tests

use kdeploy::archive::{archive_id_for, ArchiveStore};
use kdeploy::errors::DeployError;
use tokio_test::{assert_err, assert_ok};

use crate::fixtures::{at, entries, Sandbox};

#[tokio::test]
async fn test_create_is_listed_under_timestamp_name() {
    let sandbox = Sandbox::new();
    let store = ArchiveStore::new(&sandbox.archive_dir);
    let ts = at(2019, 11, 5, 14, 3, 9);

    let layout = store.create(&ts).await.unwrap();
    assert_eq!(layout.id(), "2019-11-05-14-03-09");
    assert_eq!(archive_id_for(&ts), layout.id());
    assert!(layout.conf_dir().exists().await);
    assert_eq!(store.list().await.unwrap(), vec!["2019-11-05-14-03-09"]);

    // same instant again
    store.create(&ts).await.unwrap();
    assert_eq!(entries(&sandbox.archive_dir).len(), 1);
}

#[tokio::test]
async fn test_resolve_prefix() {
    let sandbox = Sandbox::new();
    let store = ArchiveStore::new(&sandbox.archive_dir);
    store.create(&at(2020, 1, 1, 0, 0, 0)).await.unwrap();
    store.create(&at(2020, 1, 1, 0, 0, 1)).await.unwrap();
    store.create(&at(2021, 6, 30, 12, 0, 0)).await.unwrap();

    assert_eq!(store.resolve("2019").await.unwrap(), None);
    assert_eq!(
        store.resolve("2020-01-01-00-00-01").await.unwrap().as_deref(),
        Some("2020-01-01-00-00-01")
    );
    assert_eq!(
        store.resolve("2021").await.unwrap().as_deref(),
        Some("2021-06-30-12-00-00")
    );
    assert!(matches!(
        store.resolve("2020-01-01").await,
        Err(DeployError::Input(_))
    ));
}

#[tokio::test]
async fn test_invalidate_blocks_deployment() {
    let sandbox = Sandbox::new();
    let store = ArchiveStore::new(&sandbox.archive_dir);
    let layout = store.create(&at(2020, 1, 1, 0, 0, 0)).await.unwrap();

    assert_ok!(store.check_valid(layout.id()).await);
    assert_ok!(store.invalidate(layout.id(), "broken corpora.xml").await);

    assert_eq!(
        store.invalidation_reason(layout.id()).await.unwrap().as_deref(),
        Some("broken corpora.xml")
    );
    match store.check_valid(layout.id()).await {
        Err(DeployError::InvalidatedArchive { archive_id, reason }) => {
            assert_eq!(archive_id, "2020-01-01-00-00-00");
            assert_eq!(reason, "broken corpora.xml");
        }
        other => panic!("Expected invalidated archive, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalidate_unknown_archive() {
    let sandbox = Sandbox::new();
    let store = ArchiveStore::new(&sandbox.archive_dir);
    let err = assert_err!(store.invalidate("2020-01-01-00-00-00", "x").await);
    assert!(matches!(err, DeployError::Input(_)));
    assert!(entries(&sandbox.archive_dir).is_empty());
}
