use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::shared::ValidationError;

/// Session settings applied to every Postgres connection the scorer opens.
pub struct DefaultPgConnectionOptions;

impl DefaultPgConnectionOptions {
    /// Returns the options as key-value pairs suitable for sqlx.
    pub fn to_key_value_pairs() -> Vec<(String, String)> {
        vec![
            ("datestyle".to_string(), "ISO".to_string()),
            ("extra_float_digits".to_string(), "3".to_string()),
            ("client_encoding".to_string(), "UTF8".to_string()),
            ("application_name".to_string(), "scorer".to_string()),
        ]
    }
}

/// Configuration for connecting to the Postgres database items are fetched from.
///
/// Only implements [`Deserialize`] so that the password never ends up in a serialized form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PgConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Name of the database.
    pub name: String,
    pub username: String,
    /// Redacted in debug output.
    #[serde(default)]
    pub password: Option<SecretString>,
    #[serde(default)]
    pub tls: TlsConfig,
}

impl PgConnectionConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.is_empty() {
            return Err(ValidationError::InvalidFieldValue {
                field: "source.host".to_string(),
                constraint: "must not be empty".to_string(),
            });
        }

        self.tls.validate()
    }
}

/// TLS settings for Postgres connections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TlsConfig {
    /// PEM-encoded trusted root certificates.
    #[serde(default)]
    pub trusted_root_certs: String,
    #[serde(default)]
    pub enabled: bool,
}

impl TlsConfig {
    /// Returns [`ValidationError::MissingTrustedRootCerts`] if TLS is enabled without certificates.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.trusted_root_certs.is_empty() {
            return Err(ValidationError::MissingTrustedRootCerts);
        }

        Ok(())
    }
}

/// Converts a configuration into client specific connect options.
pub trait IntoConnectOptions<Output> {
    /// Creates connect options that do not select a database.
    fn without_db(&self) -> Output;

    /// Creates connect options for the configured database.
    fn with_db(&self) -> Output;
}

impl IntoConnectOptions<PgConnectOptions> for PgConnectionConfig {
    fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.tls.enabled {
            PgSslMode::VerifyFull
        } else {
            PgSslMode::Prefer
        };
        let mut options = PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .username(&self.username)
            .port(self.port)
            .ssl_mode(ssl_mode)
            .options(DefaultPgConnectionOptions::to_key_value_pairs());

        if self.tls.enabled {
            let root_certs = self.tls.trusted_root_certs.clone().into_bytes();
            options = options.ssl_root_cert_from_pem(root_certs);
        }

        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        options
    }

    fn with_db(&self) -> PgConnectOptions {
        let options: PgConnectOptions = self.without_db();
        options.database(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection_config() -> PgConnectionConfig {
        PgConnectionConfig {
            host: "localhost".to_string(),
            port: 5432,
            name: "documents".to_string(),
            username: "scorer".to_string(),
            password: Some(SecretString::new("hunter2".to_string())),
            tls: TlsConfig::default(),
        }
    }

    #[test]
    fn builds_options_for_configured_database() {
        let options: PgConnectOptions = connection_config().with_db();

        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_username(), "scorer");
        assert_eq!(options.get_database(), Some("documents"));
    }

    #[test]
    fn password_is_redacted_in_debug_output() {
        let debug = format!("{:?}", connection_config());

        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn tls_without_certificates_is_invalid() {
        let mut config = connection_config();
        config.tls.enabled = true;

        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingTrustedRootCerts)
        ));
    }
}
