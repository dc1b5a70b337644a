//! Config file location.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Directory name under the config base directory.
const APP_DIR: &str = "ptepg";

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Resolves the config file path.
///
/// Lookup order:
/// 1. `{dir}/config.toml` when `--dir` is given
/// 2. `$XDG_CONFIG_HOME/ptepg/config.toml`
/// 3. `$HOME/.config/ptepg/config.toml`
///
/// # Errors
///
/// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is set (when `dir` is `None`).
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE));
    }

    let xdg = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from);
    let home = std::env::var_os("HOME").map(PathBuf::from);
    config_path_from(xdg.as_deref(), home.as_deref())
}

fn config_path_from(xdg_config_home: Option<&Path>, home: Option<&Path>) -> Result<PathBuf> {
    let base = match (xdg_config_home, home) {
        (Some(xdg), _) if xdg.is_absolute() => xdg.to_path_buf(),
        (_, Some(home)) => home.join(".config"),
        _ => bail!("neither XDG_CONFIG_HOME nor HOME is set; pass --dir"),
    };
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_resolve_with_dir() {
        // Arrange
        let dir = PathBuf::from("/srv/epg");

        // Act
        let path = resolve_config_path(Some(&dir)).unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/srv/epg/config.toml"));
    }

    #[test]
    fn test_xdg_config_home_wins() {
        // Arrange & Act
        let path = config_path_from(Some(Path::new("/xdg")), Some(Path::new("/home/u"))).unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/xdg/ptepg/config.toml"));
    }

    #[test]
    fn test_relative_xdg_config_home_is_ignored() {
        // Arrange & Act
        let path = config_path_from(Some(Path::new("xdg")), Some(Path::new("/home/u"))).unwrap();

        // Assert
        assert_eq!(path, PathBuf::from("/home/u/.config/ptepg/config.toml"));
    }

    #[test]
    fn test_no_base_directory() {
        // Arrange & Act
        let result = config_path_from(None, None);

        // Assert
        assert!(result.unwrap_err().to_string().contains("--dir"));
    }
}
