//! The self-update engine against a fake release server, with the
//! post-swap check replaced by a scripted verifier.

use async_trait::async_trait;
use axum::http::StatusCode;
use hostship::config::{Channel, StaticConfig};
use hostship::core::HostshipError;
use hostship::test_utils::{StaticServer, TarballBuilder};
use hostship::upgrade::{BinaryVerifier, SelfUpdater, UpdateStatus};
use hostship::utils::archive_name;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Reads the installed executable and answers like `hostship -v` would.
struct ScriptedVerifier {
    fail: bool,
    seen: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl ScriptedVerifier {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BinaryVerifier for ScriptedVerifier {
    async fn verify(&self, exe: &Path) -> Result<String, HostshipError> {
        let contents = std::fs::read(exe)?;
        self.seen.lock().unwrap().push((exe.to_path_buf(), contents));
        if self.fail {
            return Err(HostshipError::VerificationFailed {
                reason: "exit status: 1: segmentation fault".to_string(),
            });
        }
        Ok(format!("{} 3.0.0\n", Channel::current()))
    }
}

struct Release {
    temp: TempDir,
    server: StaticServer,
}

impl Release {
    async fn publish(version: &str, binary: &[u8]) -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("bin")).unwrap();
        std::fs::create_dir_all(temp.path().join("staging")).unwrap();
        std::fs::write(temp.path().join("bin/hostship"), b"running binary").unwrap();

        let server = StaticServer::spawn().await;
        let channel = Channel::current();
        server.serve(
            &format!("/{channel}/metadata.json"),
            StatusCode::OK,
            format!(r#"{{"version":"v{version}"}}"#).into_bytes(),
        );
        server.serve(
            &format!("/{channel}/{}", archive_name()),
            StatusCode::OK,
            TarballBuilder::new()
                .dir("release")
                .file("release/README.md", b"notes")
                .file("release/hostship", binary)
                .build(),
        );
        Self {
            temp,
            server,
        }
    }

    fn executable(&self) -> PathBuf {
        self.temp.path().join("bin/hostship")
    }

    fn updater<'a>(&self, verifier: &'a ScriptedVerifier) -> SelfUpdater<&'a ScriptedVerifier> {
        SelfUpdater::new(&StaticConfig::new().with("HOSTSHIP_RELEASE_URL", self.server.url("/")))
            .unwrap()
            .with_executable(self.executable())
            .with_staging_dir(self.temp.path().join("staging"))
            .with_current_version("2.0.0")
            .with_verifier(verifier)
    }
}

#[tokio::test]
async fn test_update_installs_and_verifies_new_binary() {
    let release = Release::publish("3.0.0", b"new binary").await;
    let verifier = ScriptedVerifier::new(false);

    let status = release.updater(&verifier).update().await.unwrap();

    let UpdateStatus::Updated {
        from,
        to,
        backup,
    } = status
    else {
        panic!("expected an update, got {status:?}");
    };
    assert_eq!(from, "2.0.0");
    assert_eq!(to, "3.0.0");
    assert_eq!(backup, PathBuf::from(format!("{}.old", release.executable().display())));
    assert_eq!(std::fs::read(&backup).unwrap(), b"running binary");
    assert_eq!(std::fs::read(release.executable()).unwrap(), b"new binary");

    let seen = verifier.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, release.executable());
    assert_eq!(seen[0].1, b"new binary");

    let paths: Vec<String> = release.server.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("/metadata.json"));
    assert!(paths[1].ends_with(".tar.gz"));
    assert!(!release.temp.path().join("staging/hostship.new").exists());
}

#[tokio::test]
async fn test_failed_verification_restores_running_binary() {
    let release = Release::publish("3.0.0", b"broken binary").await;
    let verifier = ScriptedVerifier::new(true);

    let err = release.updater(&verifier).update().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<HostshipError>(),
        Some(HostshipError::VerificationFailed { .. })
    ));
    assert!(format!("{err:#}").contains("segmentation fault"));
    assert_eq!(std::fs::read(release.executable()).unwrap(), b"running binary");
    assert_eq!(verifier.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_same_version_is_left_alone() {
    let release = Release::publish("2.0.0", b"same binary").await;
    let verifier = ScriptedVerifier::new(false);

    let status = release.updater(&verifier).update().await.unwrap();

    assert!(matches!(status, UpdateStatus::UpToDate { .. }));
    assert_eq!(std::fs::read(release.executable()).unwrap(), b"running binary");
    assert!(verifier.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_older_release_is_not_installed() {
    let release = Release::publish("1.9.9", b"old binary").await;
    let verifier = ScriptedVerifier::new(false);

    let latest = release.updater(&verifier).check_for_update().await.unwrap();
    assert!(latest.is_none());
}
