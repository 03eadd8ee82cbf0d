//! XDG Base Directory paths for tutor.
//!
//! The CLI and the local stores resolve their files through these helpers
//! so that config and data land in the same place on every platform.

use std::path::PathBuf;

const APP_DIR: &str = "tutor";

/// Get the tutor config directory.
///
/// Returns `$XDG_CONFIG_HOME/tutor` if set, otherwise `~/.config/tutor`.
///
/// # Examples
///
/// ```
/// use tutor_paths::config_dir;
///
/// let config = config_dir();
/// let file = config.join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Get the tutor data directory.
///
/// Returns `$XDG_DATA_HOME/tutor` if set, otherwise `~/.local/share/tutor`.
/// The curriculum store and assessment history live here.
pub fn data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", ".local/share")
}

/// `$<var>/tutor`, else `~/<home_relative>/tutor`. An empty variable counts
/// as unset. Without a home directory the path is relative to the cwd.
fn xdg_dir(var: &str, home_relative: &str) -> PathBuf {
    let base = std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_default()
                .join(home_relative)
        });
    base.join(APP_DIR)
}

/// Default location of the curriculum document store.
pub fn curriculum_file() -> PathBuf {
    data_dir().join("curriculum.json")
}

/// Default location of the finished-session assessment history.
pub fn assessments_file() -> PathBuf {
    data_dir().join("assessments.json")
}
