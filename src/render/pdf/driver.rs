//! WebDriver binary resolution.
//!
//! The chromedriver binary lives in different places across dev machines,
//! Docker images and serverless bundles. Resolution walks an ordered list
//! of strategies and takes the first existing executable; when nothing is
//! found the hardcoded default is returned and the launch error will name
//! it.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the driver location.
pub const DRIVER_ENV_VAR: &str = "CHROMEDRIVER_PATH";

const DRIVER_BINARY: &str = "chromedriver";

const WELL_KNOWN_PATHS: &[&str] = &[
    "/usr/bin/chromedriver",
    "/usr/local/bin/chromedriver",
    "/opt/homebrew/bin/chromedriver",
    "/snap/bin/chromium.chromedriver",
];

const DEFAULT_PATH: &str = "/usr/bin/chromedriver";

/// One strategy for locating the driver binary.
#[derive(Debug, Clone)]
pub enum DriverLocator {
    /// Explicit path from an environment variable.
    EnvOverride(&'static str),
    /// Search the directories on `$PATH` for the named binary.
    PathSearch(&'static str),
    /// Probe a fixed list of well-known install locations.
    WellKnown(&'static [&'static str]),
}

impl DriverLocator {
    fn candidates(&self) -> Vec<PathBuf> {
        match self {
            Self::EnvOverride(var) => env::var(var)
                .ok()
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .into_iter()
                .collect(),
            Self::PathSearch(binary) => env::var_os("PATH")
                .map(|path| {
                    env::split_paths(&path)
                        .map(|dir| dir.join(binary))
                        .collect()
                })
                .unwrap_or_default(),
            Self::WellKnown(paths) => paths.iter().map(PathBuf::from).collect(),
        }
    }
}

/// Resolve the chromedriver path.
///
/// Order: environment override, `$PATH` search, well-known locations, and
/// finally the hardcoded default (returned even when absent).
pub fn resolve_driver_path() -> PathBuf {
    let strategies = [
        DriverLocator::EnvOverride(DRIVER_ENV_VAR),
        DriverLocator::PathSearch(DRIVER_BINARY),
        DriverLocator::WellKnown(WELL_KNOWN_PATHS),
    ];
    for strategy in &strategies {
        for candidate in strategy.candidates() {
            if is_executable(&candidate) {
                return candidate;
            }
        }
    }
    PathBuf::from(DEFAULT_PATH)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_when_nothing_exists() {
        // The env var is unset in test runs and the well-known paths may or
        // may not exist; the function must still return something usable.
        let path = resolve_driver_path();
        assert!(!path.as_os_str().is_empty());
    }

    // One test owns the env var: parallel tests sharing it would race.
    #[cfg(unix)]
    #[test]
    fn env_override_requires_an_executable_file() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = std::env::temp_dir().join("domeo-docs-driver-test");
        fs::create_dir_all(&dir).unwrap();
        let fake = dir.join("chromedriver");
        fs::write(&fake, "#!/bin/sh\n").unwrap();

        fs::set_permissions(&fake, fs::Permissions::from_mode(0o755)).unwrap();
        // SAFETY: test-only process-local env mutation.
        unsafe { std::env::set_var(DRIVER_ENV_VAR, &fake) };
        assert_eq!(resolve_driver_path(), fake);

        fs::set_permissions(&fake, fs::Permissions::from_mode(0o644)).unwrap();
        assert_ne!(resolve_driver_path(), fake);

        unsafe { std::env::remove_var(DRIVER_ENV_VAR) };
    }
}
