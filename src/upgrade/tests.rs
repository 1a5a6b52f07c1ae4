use super::*;
use crate::config::{Channel, StaticConfig};
use crate::core::HostshipError;
use crate::test_utils::{StaticServer, TarballBuilder, init_test_logging};
use axum::http::StatusCode;
use tempfile::TempDir;

fn channel_path(file: &str) -> String {
    format!("/{}/{}", Channel::current(), file)
}

struct Fixture {
    _temp: TempDir,
    server: StaticServer,
    executable: std::path::PathBuf,
    staging: std::path::PathBuf,
}

impl Fixture {
    async fn new(latest: &str) -> Self {
        init_test_logging(None);
        let temp = TempDir::new().unwrap();
        let executable = temp.path().join("bin").join("hostship");
        std::fs::create_dir_all(executable.parent().unwrap()).unwrap();
        std::fs::write(&executable, b"old executable").unwrap();
        let staging = temp.path().join("staging");
        std::fs::create_dir_all(&staging).unwrap();

        let server = StaticServer::spawn().await;
        server.serve(
            &channel_path("metadata.json"),
            StatusCode::OK,
            format!(r#"{{"version":"{latest}"}}"#).into_bytes(),
        );

        Self {
            _temp: temp,
            server,
            executable,
            staging,
        }
    }

    fn publish_archive(&self, archive: Vec<u8>) {
        self.server.serve(&channel_path(&crate::utils::archive_name()), StatusCode::OK, archive);
    }

    fn updater(&self) -> SelfUpdater {
        SelfUpdater::new(&StaticConfig::new().with("HOSTSHIP_RELEASE_URL", self.server.url("")))
            .unwrap()
            .with_executable(&self.executable)
            .with_staging_dir(&self.staging)
    }
}

#[tokio::test]
async fn test_release_url_override_and_layout() {
    let updater = SelfUpdater::new(
        &StaticConfig::new().with("HOSTSHIP_RELEASE_URL", "https://mirror.example/"),
    )
    .unwrap();

    assert_eq!(
        updater.metadata_url(),
        format!("https://mirror.example/{}/metadata.json", Channel::current())
    );
    assert!(updater.archive_url().ends_with(".tar.gz"));
    assert!(updater.archive_url().starts_with("https://mirror.example/"));
}

#[tokio::test]
async fn test_default_release_url() {
    let updater = SelfUpdater::new(&StaticConfig::new()).unwrap();
    assert!(updater.metadata_url().starts_with("https://cli.hostship.com/"));
}

#[tokio::test]
async fn test_up_to_date_touches_nothing() {
    let fixture = Fixture::new("1.0.0").await;
    let updater = fixture.updater().with_current_version("1.0.0");

    let status = updater.update().await.unwrap();

    assert_eq!(
        status,
        UpdateStatus::UpToDate {
            current: "1.0.0".to_string(),
            latest: "1.0.0".to_string()
        }
    );
    assert_eq!(std::fs::read(&fixture.executable).unwrap(), b"old executable");
    // Only the metadata document was requested.
    assert_eq!(fixture.server.requests().len(), 1);
}

#[tokio::test]
async fn test_check_for_update() {
    let fixture = Fixture::new("2.1.0").await;

    let newer = fixture.updater().with_current_version("2.0.9").check_for_update().await.unwrap();
    assert_eq!(newer.as_deref(), Some("2.1.0"));

    let none = fixture.updater().with_current_version("2.1.0").check_for_update().await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn test_malformed_metadata_is_rejected() {
    let fixture = Fixture::new("1.0.0").await;
    fixture.server.serve(&channel_path("metadata.json"), StatusCode::OK, b"<html>".to_vec());

    let err = fixture.updater().update().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HostshipError>(),
        Some(HostshipError::InvalidReleaseInfo { .. })
    ));
}

#[tokio::test]
async fn test_unparsable_latest_version_is_rejected() {
    let fixture = Fixture::new("latest").await;
    let err = fixture.updater().with_current_version("1.0.0").update().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HostshipError>(),
        Some(HostshipError::InvalidVersion { .. })
    ));
    assert_eq!(std::fs::read(&fixture.executable).unwrap(), b"old executable");
}

#[tokio::test]
async fn test_missing_archive_leaves_executable() {
    let fixture = Fixture::new("9.0.0").await;

    let err = fixture.updater().with_current_version("1.0.0").update().await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HostshipError>(),
        Some(HostshipError::FetchFailed { .. })
    ));
    assert_eq!(std::fs::read(&fixture.executable).unwrap(), b"old executable");
}

#[tokio::test]
async fn test_archive_without_binary_leaves_executable() {
    let fixture = Fixture::new("9.0.0").await;
    fixture.publish_archive(TarballBuilder::new().file("README.md", b"docs").build());

    let err = fixture.updater().with_current_version("1.0.0").update().await.unwrap_err();

    assert!(err.downcast_ref::<HostshipError>().is_some_and(HostshipError::is_not_found));
    assert_eq!(std::fs::read(&fixture.executable).unwrap(), b"old executable");
    // The temporary staging directory is gone with everything in it.
    assert_eq!(std::fs::read_dir(&fixture.staging).unwrap().count(), 0);
}

#[tokio::test]
async fn test_staging_defaults_to_executable_directory() {
    let fixture = Fixture::new("1.0.0").await;
    let updater = SelfUpdater::new(&StaticConfig::new())
        .unwrap()
        .with_executable(&fixture.executable);
    assert_eq!(updater.staging_root(), fixture.executable.parent().unwrap());

    let updater = updater.with_staging_dir(&fixture.staging);
    assert_eq!(updater.staging_root(), fixture.staging.as_path());
}

#[cfg(unix)]
#[tokio::test]
async fn test_default_staging_leaves_only_backup_behind() {
    let fixture = Fixture::new("9.0.0").await;
    fixture.publish_archive(
        TarballBuilder::new().file("hostship", b"#!/bin/sh\necho \"dev 9.0.0\"\n").build(),
    );

    let updater = SelfUpdater::new(&StaticConfig::new().with("HOSTSHIP_RELEASE_URL", fixture.server.url("")))
        .unwrap()
        .with_executable(&fixture.executable)
        .with_current_version("1.0.0");
    updater.update().await.unwrap();

    let bin = fixture.executable.parent().unwrap();
    let mut names: Vec<String> = std::fs::read_dir(bin)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["hostship", "hostship.old"]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_full_update_verifies_new_executable() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = Fixture::new("9.0.0").await;
    let script = format!("#!/bin/sh\necho \"{} 9.0.0\"\n", Channel::current());
    fixture.publish_archive(TarballBuilder::new().file("hostship", script.as_bytes()).build());

    let status = fixture.updater().with_current_version("1.0.0").update().await.unwrap();

    match status {
        UpdateStatus::Updated {
            from,
            to,
            backup,
        } => {
            assert_eq!(from, "1.0.0");
            assert_eq!(to, "9.0.0");
            assert_eq!(std::fs::read(&backup).unwrap(), b"old executable");
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert_eq!(std::fs::read(&fixture.executable).unwrap(), script.as_bytes());
    let mode = std::fs::metadata(&fixture.executable).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[cfg(unix)]
#[tokio::test]
async fn test_broken_release_is_rolled_back() {
    let fixture = Fixture::new("9.0.0").await;
    fixture.publish_archive(
        TarballBuilder::new().file("hostship", b"#!/bin/sh\necho crashed >&2\nexit 2\n").build(),
    );

    let err = fixture.updater().with_current_version("1.0.0").update().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<HostshipError>(),
        Some(HostshipError::VerificationFailed { .. })
    ));
    assert_eq!(std::fs::read(&fixture.executable).unwrap(), b"old executable");
}

#[cfg(unix)]
#[tokio::test]
async fn test_force_reinstalls_same_version() {
    let fixture = Fixture::new("1.0.0").await;
    fixture.publish_archive(
        TarballBuilder::new().file("hostship", b"#!/bin/sh\necho \"dev 1.0.0\"\n").build(),
    );

    let status =
        fixture.updater().with_current_version("1.0.0").force(true).update().await.unwrap();
    assert!(matches!(status, UpdateStatus::Updated { .. }));
}
