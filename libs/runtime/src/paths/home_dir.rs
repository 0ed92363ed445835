use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Resolve the client home directory into an absolute path.
///
/// - `None` (or an empty string) selects the platform default:
///   `%APPDATA%/<default_subdir>` on Windows, `$HOME/<default_subdir>` elsewhere.
/// - A leading `~` is expanded against the user's home directory.
/// - Relative paths are anchored at the current working directory.
///
/// When `create` is set the directory is created if missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let path = match configured.as_deref().map(str::trim) {
        None | Some("") => platform_base()?.join(default_subdir),
        Some(raw) => expand(raw)?,
    };

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("cannot create home dir {}", path.display()))?;
    }
    Ok(path)
}

#[cfg(target_os = "windows")]
fn platform_base() -> Result<PathBuf> {
    std::env::var_os("APPDATA")
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .ok_or_else(|| anyhow!("APPDATA is not set"))
}

#[cfg(not(target_os = "windows"))]
fn platform_base() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("HOME is not set"))
}

fn user_home() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("cannot expand '~': no home directory"))
}

fn expand(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return user_home();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(user_home()?.join(rest));
    }
    let p = Path::new(raw);
    if p.is_absolute() {
        Ok(p.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(p))
    }
}
