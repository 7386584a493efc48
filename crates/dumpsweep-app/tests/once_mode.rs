use std::fs;
use std::time::Duration;

use anyhow::{Result, bail};
use chrono::{TimeDelta, Utc};
use clap::Parser;
use dumpsweep_app::{AppError, Cli, Daemon};
use dumpsweep_test_support::fixtures::{FIXTURE_BUCKET, FIXTURE_HOST, SweepTree, whole_seconds};
use httpmock::prelude::*;

const TOKEN: &str = "xoxb-once";

fn once_cli(tree: &SweepTree, api_url: &str, metrics: &str) -> Result<Cli> {
    let root = tree.root().display().to_string();
    let store_root = tree.store_root().display().to_string();
    Ok(Cli::try_parse_from([
        "dumpsweep",
        "--root",
        root.as_str(),
        "--bucket",
        FIXTURE_BUCKET,
        "--store-root",
        store_root.as_str(),
        "--slack-channel-id",
        "C0ONCE",
        "--host",
        FIXTURE_HOST,
        "--slack-api-url",
        api_url,
        "--metrics-textfile",
        metrics,
        "--once",
    ])?)
}

#[test]
fn once_mode_ships_old_dumps_and_leaves_new_ones() -> Result<()> {
    let tree = SweepTree::new()?;
    let now = whole_seconds(Utc::now());
    let dump1 = tree.write_aged("crash/app/dump1", b"dump one", now, Duration::from_secs(600))?;
    let dump2 = tree.write_aged("crash/app/dump2", b"dump two", now, Duration::from_secs(10))?;

    let key = format!(
        "{FIXTURE_HOST}/crash/app/dump1@{}.gz",
        (now - TimeDelta::minutes(10)).format("%Y-%m-%dT%H:%M:%SZ")
    );
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/chat.postMessage")
            .header("authorization", format!("Bearer {TOKEN}"))
            .body_includes(key.as_str())
            .body_includes("(8 bytes)");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"ok":true}"#);
    });

    let metrics_dir = tempfile::tempdir()?;
    let metrics_path = metrics_dir.path().join("dumpsweep.prom");
    let cli = once_cli(&tree, &server.url("/api"), &metrics_path.display().to_string())?;
    Daemon::from_cli(&cli, Some(TOKEN.to_string()))?.run()?;

    mock.assert_hits(1);
    assert!(!dump1.exists());
    assert!(dump2.exists());
    assert!(tree.store_root().join(FIXTURE_BUCKET).join(&key).is_file());

    let exported = fs::read_to_string(&metrics_path)?;
    assert!(exported.contains(r#"sweep_files_total{result="uploaded"} 1"#));
    assert!(exported.contains(r#"sweep_files_total{result="skipped_too_new"} 1"#));
    assert!(exported.contains(r#"sweep_cycles_total{outcome="completed"} 1"#));
    Ok(())
}

#[test]
fn once_mode_fails_when_the_announcement_is_rejected() -> Result<()> {
    let tree = SweepTree::new()?;
    let now = whole_seconds(Utc::now());
    let dump = tree.write_aged("core.1234", b"payload", now, Duration::from_secs(600))?;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/chat.postMessage");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"ok":false,"error":"channel_not_found"}"#);
    });

    let metrics_dir = tempfile::tempdir()?;
    let metrics_path = metrics_dir.path().join("dumpsweep.prom");
    let cli = once_cli(&tree, &server.url("/api"), &metrics_path.display().to_string())?;
    let result = Daemon::from_cli(&cli, Some(TOKEN.to_string()))?.run();

    let Err(err) = result else {
        bail!("rejected announcement must fail the run");
    };
    assert!(matches!(
        err,
        AppError::CycleAborted {
            operation: "announce",
            ..
        }
    ));
    assert_eq!(err.exit_code(), 1);
    assert!(dump.exists(), "file must survive a failed announcement");
    assert_eq!(
        fs::read_dir(tree.store_root().join(FIXTURE_BUCKET).join(FIXTURE_HOST))?.count(),
        1,
        "the upload itself completed"
    );

    let exported = fs::read_to_string(&metrics_path)?;
    assert!(exported.contains(r#"sweep_cycles_total{outcome="aborted"} 1"#));
    Ok(())
}
