use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Prefix of environment overrides, e.g. `MSTONE__COORDINATOR__MAX_ATTEMPTS=5`.
pub const ENV_PREFIX: &str = "MSTONE";
/// Config file used when no path is given (any extension the `config` crate knows).
pub const DEFAULT_CONFIG_FILE: &str = "milestone";

/// Custom error type for config loading.
#[mstone_derive::mstone_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// A reusable configuration loader that combines file-based settings with environment overrides.
///
/// This function implements a layered configuration strategy:
/// 1. **Base File**: Loads settings from a file (e.g., `milestone.toml`). If no path is provided,
///    it defaults to `"milestone"` in the current working directory.
/// 2. **Environment Overrides**: Overlays values from environment variables prefixed with `MSTONE__`.
///    Nested structures are accessed using double underscores
///    (e.g., `MSTONE__LIFECYCLE__OPERATION_TIMEOUT_MS` maps to `lifecycle.operation_timeout_ms`).
///
/// # Errors
/// This function will return an error if:
/// * The specified (or default) configuration file cannot be found.
/// * The content of the file does not match the structure of type `T`.
///
/// # Example
/// ```rust
/// use mstone_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct Settings {
///     max_attempts: u32,
/// }
///
/// let cfg: Settings = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path = effective_path(path);

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .convert_case(config::Case::Snake),
        );

    info!(path = %effective_path.display(), "Loading config");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// Like [`load_config`], but falls back to `T::default()` when the file does not exist.
///
/// A file that exists but fails to parse is still an error.
///
/// # Errors
/// Returns [`ConfigError`] if an existing file or an environment override is malformed.
pub fn load_config_or_default<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned + Default,
{
    let effective_path = effective_path(path);
    if config_file_exists(&effective_path) {
        return load_config(Some(effective_path));
    }

    warn!(path = %effective_path.display(), "Config file not found, using defaults");
    Ok(T::default())
}

fn effective_path(path: Option<impl AsRef<Path>>) -> PathBuf {
    path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf())
}

/// Mirrors how `config::File` resolves a path: as given, or with a known extension appended.
fn config_file_exists(path: &Path) -> bool {
    if path.is_file() {
        return true;
    }
    ["toml", "json", "yaml", "yml", "ini", "ron", "json5"].iter().any(|ext| {
        let mut candidate = path.as_os_str().to_owned();
        candidate.push(".");
        candidate.push(ext);
        Path::new(&candidate).is_file()
    })
}
