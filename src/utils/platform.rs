//! Platform detection and naming.
//!
//! Release artifacts are named with `linux`/`darwin` and
//! `amd64`/`arm64`, so the Rust target constants are translated here.

use crate::constants::BINARY_NAME;

/// Operating system component of the release archive name.
#[must_use]
pub fn release_os() -> &'static str {
    os_name(std::env::consts::OS)
}

/// Architecture component of the release archive name.
#[must_use]
pub fn release_arch() -> &'static str {
    arch_name(std::env::consts::ARCH)
}

fn os_name(os: &'static str) -> &'static str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn arch_name(arch: &'static str) -> &'static str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}

/// File name of the release archive for this platform,
/// e.g. `hostship_linux_amd64.tar.gz`.
#[must_use]
pub fn archive_name() -> String {
    format!("{BINARY_NAME}_{}_{}.tar.gz", release_os(), release_arch())
}

/// Entry names accepted as the executable inside a release archive.
#[must_use]
pub fn binary_names() -> [String; 2] {
    [BINARY_NAME.to_string(), format!("{BINARY_NAME}.exe")]
}

/// Whether `cmd` resolves on `PATH`.
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Whether the current process runs as root.
#[cfg(unix)]
#[must_use]
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Whether the current process runs as root.
#[cfg(not(unix))]
#[must_use]
pub fn is_root() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_platform_names() {
        assert_eq!(os_name("linux"), "linux");
        assert_eq!(os_name("macos"), "darwin");
        assert_eq!(arch_name("x86_64"), "amd64");
        assert_eq!(arch_name("aarch64"), "arm64");
        assert_eq!(arch_name("x86"), "386");
        assert_eq!(arch_name("arm"), "arm");
    }

    #[test]
    fn test_archive_name_shape() {
        let name = archive_name();
        assert!(name.starts_with("hostship_"));
        assert!(name.ends_with(".tar.gz"));
        assert_eq!(name.matches('_').count(), 2);
    }

    #[test]
    fn test_binary_names() {
        assert_eq!(binary_names(), ["hostship".to_string(), "hostship.exe".to_string()]);
    }
}
