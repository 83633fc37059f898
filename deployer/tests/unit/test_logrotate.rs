//! Log archiver tests

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use kdeploy::errors::DeployError;
use kdeploy::logrotate::{LogArchiveConfig, LogArchiver, WorklogRecord};
use kdeploy::utils::sha256_hash;

use crate::fixtures::entries;

fn archive_conf(root: &Path) -> LogArchiveConfig {
    LogArchiveConfig {
        src_dir: root.join("logs"),
        dst_dir: root.join("archive"),
        file_name: "kontext.log".to_string(),
        rotation_pattern: r"\.\d+".to_string(),
        move_if_older_than_secs: 86400,
        worklog_path: root.join("worklog.jsonl"),
    }
}

#[tokio::test]
async fn test_rotated_files_are_moved() {
    let tmp = tempfile::tempdir().unwrap();
    let conf = archive_conf(tmp.path());
    fs::create_dir(&conf.src_dir).unwrap();
    fs::create_dir(&conf.dst_dir).unwrap();
    for name in ["kontext.log", "kontext.log.1", "kontext.log.2", "celery.log.1"] {
        fs::write(conf.src_dir.join(name), format!("{} lines\n", name)).unwrap();
    }
    conf.validate().unwrap();

    let archiver = LogArchiver::new(conf.clone()).unwrap();
    let later = SystemTime::now() + Duration::from_secs(2 * 86400);
    let records = archiver.process_dir_at(later).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(
        entries(&conf.src_dir).into_iter().collect::<Vec<_>>(),
        vec!["celery.log.1", "kontext.log"]
    );
    let archived = entries(&conf.dst_dir);
    assert_eq!(archived.len(), 2);
    assert!(archived.iter().all(|n| n.starts_with("kontext.log.")));

    let worklog = fs::read_to_string(&conf.worklog_path).unwrap();
    let logged: Vec<WorklogRecord> = worklog
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(logged, records);
    assert_eq!(logged[0].src, conf.src_dir.join("kontext.log.1"));
    assert_eq!(
        logged[0].checksum.as_deref(),
        Some(sha256_hash(b"kontext.log.1 lines\n").as_str())
    );
    assert!(logged.iter().all(|r| r.error.is_none()));
}

#[tokio::test]
async fn test_recent_files_stay() {
    let tmp = tempfile::tempdir().unwrap();
    let conf = archive_conf(tmp.path());
    fs::create_dir(&conf.src_dir).unwrap();
    fs::create_dir(&conf.dst_dir).unwrap();
    fs::write(conf.src_dir.join("kontext.log.1"), "fresh").unwrap();

    let records = LogArchiver::new(conf.clone())
        .unwrap()
        .process_dir()
        .await
        .unwrap();
    assert!(records.is_empty());
    assert!(conf.src_dir.join("kontext.log.1").exists());
}

#[test]
fn test_validate_requires_destination() {
    let tmp = tempfile::tempdir().unwrap();
    let conf = archive_conf(tmp.path());
    assert!(matches!(conf.validate(), Err(DeployError::Config(_))));
}

#[tokio::test]
async fn test_load_camel_case_document() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("logarchive.json");
    fs::write(
        &path,
        r#"{
            "srcDir": "/var/log/kontext",
            "dstDir": "/mnt/archive/kontext",
            "fileName": "application.log",
            "rotationPattern": "\\.\\d+",
            "moveIfOlderThanSecs": 3600,
            "worklogPath": "/var/local/kontext/worklog"
        }"#,
    )
    .unwrap();
    let conf = LogArchiveConfig::load(&path).await.unwrap();
    assert_eq!(conf.file_name, "application.log");
    assert_eq!(conf.move_if_older_than_secs, 3600);
}
