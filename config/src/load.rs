use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;

/// Directory holding the configuration files, relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// Extensions tried, in order, for every configuration file.
const EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Prefix of environment variable overrides, e.g. `APP_SINK__PATH`.
const ENV_PREFIX: &str = "APP";

/// Implemented by configuration structures loadable with [`load_config`].
pub trait Config {
    /// Keys whose environment variable values are parsed as comma-separated lists.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Errors that can occur while loading configuration files and overrides.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    #[error("no `{stem}` configuration file (yaml, yml or json) in `{directory}`")]
    ConfigurationFileMissing { stem: String, directory: PathBuf },

    /// `APP_ENVIRONMENT` names an unsupported environment.
    #[error("failed to determine runtime environment: {0}")]
    Environment(#[from] io::Error),

    #[error("failed to build configuration: {0}")]
    Build(#[source] config::ConfigError),

    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] config::ConfigError),
}

/// Loads configuration from the `configuration` directory of the working directory.
///
/// Reads `base` and then the file named after the current [`Environment`], each as yaml, yml or
/// json, and applies `APP_`-prefixed environment variables last. Nested keys are separated by a
/// double underscore (`APP_SOURCE__HOST`) and list values by commas.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let current_dir = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;
    let environment = Environment::load()?;

    load_config_from(&current_dir.join(CONFIGURATION_DIR), environment)
}

/// Same as [`load_config`] but reads the files of `environment` from `directory`.
pub fn load_config_from<T>(directory: &Path, environment: Environment) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    if !directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            directory.to_path_buf(),
        ));
    }

    let base_file = configuration_file(directory, "base")?;
    let environment_file = configuration_file(directory, environment.as_str())?;

    let mut overrides = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__");
    if !T::LIST_PARSE_KEYS.is_empty() {
        overrides = overrides.try_parsing(true).list_separator(",");
        for key in T::LIST_PARSE_KEYS {
            overrides = overrides.with_list_parse_key(key);
        }
    }

    config::Config::builder()
        .add_source(config::File::from(base_file))
        .add_source(config::File::from(environment_file))
        .add_source(overrides)
        .build()
        .map_err(LoadConfigError::Build)?
        .try_deserialize()
        .map_err(LoadConfigError::Deserialization)
}

fn configuration_file(directory: &Path, stem: &str) -> Result<PathBuf, LoadConfigError> {
    EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("{stem}.{extension}")))
        .find(|path| path.is_file())
        .ok_or_else(|| LoadConfigError::ConfigurationFileMissing {
            stem: stem.to_owned(),
            directory: directory.to_path_buf(),
        })
}
