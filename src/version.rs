//! Version information module
//!
//! Provides version information including version number, build mode, and Git metadata.

macro_rules! build_env {
    ($name:ident) => {
        env!(concat!("KUBE_BOOSTER_", stringify!($name)))
    };
}

pub const PROJECT_NAME: &str = build_env!(PROJECT_NAME);
pub const VERSION: &str = build_env!(VERSION);
pub const GIT_BRANCH: &str = build_env!(GIT_BRANCH);
pub const GIT_COMMIT: &str = build_env!(GIT_COMMIT);
pub const BUILD_MODE: &str = build_env!(BUILD_MODE);
pub const TARGET_TRIPLE: &str = build_env!(TARGET_TRIPLE);

/// Get simple version string (default for --version)
pub fn get_version_string() -> String {
    format!("{} {}", PROJECT_NAME, VERSION)
}

/// Get verbose version information string with full build details (for --version-verbose)
pub fn get_verbose_version_string() -> String {
    format!(
        "{}\n\n\
Build Information:\n\
  Build Mode: {}\n\
  Platform: {}\n\n\
Version Control:\n\
  Git Branch: {}\n\
  Git Commit: {}",
        get_version_string(),
        BUILD_MODE,
        TARGET_TRIPLE,
        GIT_BRANCH,
        GIT_COMMIT,
    )
}

/// Get version number only
pub fn get_version() -> &'static str {
    VERSION
}
