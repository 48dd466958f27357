//! Integration tests for VersionedBucket commit, query, and removal
//! semantics.

mod common;

use bytes::Bytes;
use serde_json::json;

use ::common::prelude::*;

#[tokio::test]
async fn test_commit_and_head() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    bucket
        .commit(
            "report.txt",
            Bytes::from("v1"),
            common::meta(&[("author", json!("x"))]),
            false,
        )
        .await
        .unwrap();

    let head = bucket.head("report.txt", -1).await.unwrap();
    assert_eq!(head.filename(), "report.txt");
    assert_eq!(head.bucket(), "docs");
    assert_eq!(head.metadata().get("author"), Some(&json!("x")));
    assert_eq!(bucket.read(&head).await.unwrap().as_ref(), b"v1");
}

#[tokio::test]
async fn test_metadata_inheritance() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    bucket
        .commit(
            "f",
            Bytes::from("b1"),
            common::meta(&[("a", json!(1))]),
            false,
        )
        .await
        .unwrap();
    bucket
        .commit(
            "f",
            Bytes::from("b2"),
            common::meta(&[("b", json!(2))]),
            false,
        )
        .await
        .unwrap();

    let head = bucket.head("f", -1).await.unwrap();
    assert_eq!(
        head.metadata().clone(),
        common::meta(&[("a", json!(1)), ("b", json!(2))])
    );
}

#[tokio::test]
async fn test_commit_caller_keys_win_on_conflict() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    bucket
        .commit(
            "f",
            Bytes::from("b1"),
            common::meta(&[("stage", json!("draft")), ("author", json!("x"))]),
            false,
        )
        .await
        .unwrap();
    bucket
        .commit(
            "f",
            Bytes::from("b2"),
            common::meta(&[("stage", json!("final"))]),
            false,
        )
        .await
        .unwrap();

    let head = bucket.head("f", -1).await.unwrap();
    assert_eq!(head.metadata().get("stage"), Some(&json!("final")));
    assert_eq!(head.metadata().get("author"), Some(&json!("x")));
}

#[tokio::test]
async fn test_bare_commit_isolation() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    bucket
        .commit(
            "f",
            Bytes::from("b1"),
            common::meta(&[("a", json!(1))]),
            false,
        )
        .await
        .unwrap();
    bucket
        .commit(
            "f",
            Bytes::from("b3"),
            common::meta(&[("c", json!(3))]),
            true,
        )
        .await
        .unwrap();

    let head = bucket.head("f", -1).await.unwrap();
    assert_eq!(head.metadata().clone(), common::meta(&[("c", json!(3))]));
}

#[tokio::test]
async fn test_head_version_indices() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    for n in 1..=3 {
        bucket
            .commit(
                "f",
                Bytes::from(format!("v{n}")),
                common::meta(&[("n", json!(n))]),
                true,
            )
            .await
            .unwrap();
    }

    // Negative indices count back from HEAD, non-negative ones are
    // absolute chronological positions.
    assert_eq!(
        bucket.head("f", -1).await.unwrap().metadata().get("n"),
        Some(&json!(3))
    );
    assert_eq!(
        bucket.head("f", -2).await.unwrap().metadata().get("n"),
        Some(&json!(2))
    );
    assert_eq!(
        bucket.head("f", 0).await.unwrap().metadata().get("n"),
        Some(&json!(1))
    );
    assert_eq!(
        bucket.head("f", 2).await.unwrap().metadata().get("n"),
        Some(&json!(3))
    );

    assert!(matches!(
        bucket.head("f", 3).await,
        Err(BucketError::VersionOutOfRange { .. })
    ));
    assert!(matches!(
        bucket.head("f", -4).await,
        Err(BucketError::VersionOutOfRange { .. })
    ));
    assert!(matches!(
        bucket.head("missing.txt", -1).await,
        Err(BucketError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_count_tracks_commits_and_deletes() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    assert_eq!(bucket.count("f").await.unwrap(), 0);
    for _ in 0..4 {
        bucket
            .commit("f", Bytes::from("x"), Metadata::new(), true)
            .await
            .unwrap();
    }
    assert_eq!(bucket.count("f").await.unwrap(), 4);

    assert_eq!(bucket.revert("f", 1).await.unwrap(), 1);
    assert_eq!(bucket.count("f").await.unwrap(), 3);
}

#[tokio::test]
async fn test_revert_removes_most_recent() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    for n in 1..=5 {
        bucket
            .commit(
                "f",
                Bytes::from(format!("v{n}")),
                common::meta(&[("n", json!(n))]),
                true,
            )
            .await
            .unwrap();
    }

    assert_eq!(bucket.revert("f", 2).await.unwrap(), 2);
    assert_eq!(bucket.count("f").await.unwrap(), 3);

    // HEAD is now what was the third most recent revision.
    let head = bucket.head("f", -1).await.unwrap();
    assert_eq!(head.metadata().get("n"), Some(&json!(3)));
    assert_eq!(bucket.read(&head).await.unwrap().as_ref(), b"v3");
}

#[tokio::test]
async fn test_revert_more_than_exist() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    for _ in 0..2 {
        bucket
            .commit("f", Bytes::from("x"), Metadata::new(), true)
            .await
            .unwrap();
    }

    assert_eq!(bucket.revert("f", 10).await.unwrap(), 2);
    assert_eq!(bucket.count("f").await.unwrap(), 0);
    assert_eq!(bucket.revert("f", 1).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_with_predicate() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    for stage in ["draft", "draft", "final"] {
        bucket
            .commit(
                "f",
                Bytes::from("x"),
                common::meta(&[("stage", json!(stage))]),
                true,
            )
            .await
            .unwrap();
    }

    // Unbounded query removes every match.
    let removed = bucket
        .delete(
            "f",
            &Select::default().filter(|m| Ok(m.str("stage")? == "draft")),
        )
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(bucket.count("f").await.unwrap(), 1);
    assert_eq!(
        bucket.head("f", -1).await.unwrap().metadata().get("stage"),
        Some(&json!("final"))
    );
}

#[tokio::test]
async fn test_info_commit_order() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    for n in 1..=3 {
        bucket
            .commit(
                "f",
                Bytes::from("x"),
                common::meta(&[("n", json!(n))]),
                true,
            )
            .await
            .unwrap();
    }

    let newest = bucket.info("f", -1).await.unwrap();
    assert_eq!(newest.get("_historyCount"), Some(&json!(3)));
    assert_eq!(newest.get("_commitOrder"), Some(&json!(2)));
    assert_eq!(newest.get("n"), Some(&json!(3)));

    let oldest = bucket.info("f", 0).await.unwrap();
    assert_eq!(oldest.get("_commitOrder"), Some(&json!(0)));

    let middle = bucket.info("f", -2).await.unwrap();
    assert_eq!(middle.get("_commitOrder"), Some(&json!(1)));
}

#[tokio::test]
async fn test_info_is_idempotent() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    bucket
        .commit(
            "f",
            Bytes::from("x"),
            common::meta(&[("author", json!("x"))]),
            false,
        )
        .await
        .unwrap();

    let first = bucket.info("f", -1).await.unwrap();
    let second = bucket.info("f", -1).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_history_end_to_end() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    bucket
        .commit(
            "report.txt",
            Bytes::from("v1"),
            common::meta(&[("author", json!("x"))]),
            false,
        )
        .await
        .unwrap();
    bucket
        .commit(
            "report.txt",
            Bytes::from("v2"),
            common::meta(&[("stage", json!("final"))]),
            false,
        )
        .await
        .unwrap();

    let history = bucket.history("report.txt").await.unwrap();
    assert_eq!(history.len(), 2);

    // Newest first, with inherited metadata and the revision id.
    assert_eq!(history[0].get("author"), Some(&json!("x")));
    assert_eq!(history[0].get("stage"), Some(&json!("final")));
    assert!(history[0].contains_key("_id"));
    assert_eq!(history[1].get("author"), Some(&json!("x")));
    assert_eq!(history[1].get("stage"), None);
    assert_ne!(history[0].get("_id"), history[1].get("_id"));
}

#[tokio::test]
async fn test_find_swallows_predicate_failures() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    bucket
        .commit(
            "f",
            Bytes::from("x"),
            common::meta(&[("priority", json!(1))]),
            true,
        )
        .await
        .unwrap();
    bucket
        .commit("f", Bytes::from("x"), Metadata::new(), true)
        .await
        .unwrap();
    bucket
        .commit(
            "f",
            Bytes::from("x"),
            common::meta(&[("priority", json!(2))]),
            true,
        )
        .await
        .unwrap();

    // The middle revision has no "priority"; the query must not fail,
    // just exclude it.
    let found = bucket
        .find(
            "f",
            &Select::default().filter(|m| Ok(m.i64("priority")? >= 1)),
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn test_find_one_and_rank() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    for (stage, priority) in [("draft", 3), ("review", 9), ("final", 5)] {
        bucket
            .commit(
                "f",
                Bytes::from("x"),
                common::meta(&[("stage", json!(stage)), ("priority", json!(priority))]),
                true,
            )
            .await
            .unwrap();
    }

    let best = bucket
        .find_one("f", &Select::default().rank_by(|m| m.rank("priority")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(best.metadata().get("stage"), Some(&json!("review")));

    let none = bucket
        .find_one("f", &Select::default().filter(|_| Ok(false)))
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_exists_and_filenames() {
    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    assert!(!bucket.exists("a.txt").await.unwrap());

    for filename in ["b.txt", "a.txt", "a.txt"] {
        bucket
            .commit(filename, Bytes::from("x"), Metadata::new(), true)
            .await
            .unwrap();
    }

    assert!(bucket.exists("a.txt").await.unwrap());
    assert_eq!(
        bucket.filenames().await.unwrap(),
        vec!["a.txt".to_string(), "b.txt".to_string()]
    );
}

#[tokio::test]
async fn test_writer_commits_once_on_finish() {
    use std::io::Write;

    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    let mut writer = bucket.writer("log.txt");
    writer.write_all(b"hello, ").unwrap();
    writer.write_all(b"world").unwrap();

    // Nothing lands in the store until finish.
    assert_eq!(bucket.count("log.txt").await.unwrap(), 0);

    writer
        .finish(common::meta(&[("author", json!("x"))]), false)
        .await
        .unwrap();

    assert_eq!(bucket.count("log.txt").await.unwrap(), 1);
    let head = bucket.head("log.txt", -1).await.unwrap();
    assert_eq!(bucket.read(&head).await.unwrap().as_ref(), b"hello, world");
}

#[tokio::test]
async fn test_appender_extends_head_content() {
    use std::io::Write;

    let registry = common::setup_registry().await;
    let bucket = registry.bucket("docs").unwrap();

    bucket
        .commit("log.txt", Bytes::from("line one\n"), Metadata::new(), true)
        .await
        .unwrap();

    let mut appender = bucket.appender("log.txt").await.unwrap();
    appender.write_all(b"line two\n").unwrap();
    appender.finish(Metadata::new(), false).await.unwrap();

    assert_eq!(bucket.count("log.txt").await.unwrap(), 2);
    let head = bucket.head("log.txt", -1).await.unwrap();
    assert_eq!(
        bucket.read(&head).await.unwrap().as_ref(),
        b"line one\nline two\n"
    );
}
