//! Application settings loaded via OrthoConfig.
//!
//! Every field can come from the command line, an `INSPECTION_*`
//! environment variable, or a configuration file. The signing secret is
//! held in [`Zeroizing`] buffers and never logged; use
//! [`key_fingerprint`](crate::outbound::token::key_fingerprint) to identify
//! it in logs. The OAuth client secret is redacted the same way.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::domain::{EmailAddress, EmailValidationError};
use crate::outbound::identity::OAuthProviderConfig;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_TOKEN_TTL_MINUTES: u32 = 60;
const DEFAULT_IDENTITY_TIMEOUT_SECONDS: u64 = 10;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address {value:?}: {message}")]
    BindAddr { value: String, message: String },
    /// The secret file could not be read.
    #[error("failed to read token secret file {path}: {message}")]
    SecretFile { path: PathBuf, message: String },
    /// `token_ttl_minutes` is zero.
    #[error("token lifetime must be at least one minute")]
    TokenTtl,
    /// `bootstrap_admin_email` is not an email address.
    #[error("invalid bootstrap admin email: {0}")]
    BootstrapEmail(#[from] EmailValidationError),
    /// The OAuth provider is partially configured or malformed.
    #[error("invalid identity provider settings: {message}")]
    IdentityProvider { message: String },
}

/// Runtime configuration for the backend process.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "INSPECTION")]
pub struct AppSettings {
    /// Socket address to listen on; defaults to `0.0.0.0:8080`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without one, templates live in process memory.
    pub database_url: Option<String>,
    /// Inline HS256 signing secret. Prefer `token_secret_file`.
    pub token_secret: Option<String>,
    /// File holding the HS256 signing secret; wins over `token_secret`.
    pub token_secret_file: Option<PathBuf>,
    /// Lifetime of issued tokens.
    #[ortho_config(default = 60)]
    pub token_ttl_minutes: u32,
    /// Seed an admin account with this email when running in memory.
    pub bootstrap_admin_email: Option<String>,
    /// OAuth token endpoint that redeems sign-in codes.
    pub identity_token_url: Option<String>,
    /// OAuth userinfo endpoint returning the subject and verified email.
    pub identity_userinfo_url: Option<String>,
    /// Client identifier registered with the identity provider.
    pub identity_client_id: Option<String>,
    /// Client secret registered with the identity provider.
    pub identity_client_secret: Option<String>,
    /// Redirect URI the sign-in codes are issued for.
    pub identity_redirect_uri: Option<String>,
    /// Per-request timeout for identity provider calls.
    #[ortho_config(default = 10)]
    pub identity_timeout_seconds: u64,
    /// Accept bare email addresses as sign-in codes. In-memory runs only.
    #[ortho_config(default = false)]
    pub dev_identity_provider: bool,
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("token_secret_file", &self.token_secret_file)
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("bootstrap_admin_email", &self.bootstrap_admin_email)
            .field("identity_token_url", &self.identity_token_url)
            .field("identity_userinfo_url", &self.identity_userinfo_url)
            .field("identity_client_id", &self.identity_client_id)
            .field(
                "identity_client_secret",
                &self.identity_client_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("identity_redirect_uri", &self.identity_redirect_uri)
            .field("identity_timeout_seconds", &self.identity_timeout_seconds)
            .field("dev_identity_provider", &self.dev_identity_provider)
            .finish()
    }
}

impl AppSettings {
    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// Token lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::TokenTtl`] for a zero lifetime.
    pub fn token_ttl(&self) -> Result<chrono::Duration, SettingsError> {
        match self.token_ttl_minutes {
            0 => Err(SettingsError::TokenTtl),
            minutes => Ok(chrono::Duration::minutes(i64::from(minutes))),
        }
    }

    /// Signing secret bytes, file first. `None` when neither is configured
    /// or the configured value is blank.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::SecretFile`] when the file cannot be read.
    pub fn signing_secret(&self) -> Result<Option<Zeroizing<Vec<u8>>>, SettingsError> {
        let bytes = match (&self.token_secret_file, &self.token_secret) {
            (Some(path), _) => {
                let raw = Zeroizing::new(std::fs::read(path).map_err(|err| {
                    SettingsError::SecretFile {
                        path: path.clone(),
                        message: err.to_string(),
                    }
                })?);
                Zeroizing::new(raw.trim_ascii_end().to_vec())
            }
            (None, Some(inline)) => Zeroizing::new(inline.trim().as_bytes().to_vec()),
            (None, None) => return Ok(None),
        };
        Ok(Some(bytes).filter(|secret| !secret.is_empty()))
    }

    /// Email of the admin account seeded for in-memory runs.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BootstrapEmail`] when the value is malformed.
    pub fn bootstrap_admin_email(&self) -> Result<Option<EmailAddress>, SettingsError> {
        self.bootstrap_admin_email
            .as_deref()
            .map(EmailAddress::new)
            .transpose()
            .map_err(SettingsError::from)
    }

    /// OAuth provider settings. `None` when none of the identity fields is
    /// set; every field except the timeout is required once any is.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::IdentityProvider`] for a partial
    /// configuration, an unparsable endpoint, or a zero timeout.
    pub fn identity_provider(&self) -> Result<Option<OAuthProviderConfig>, SettingsError> {
        let fields = [
            ("identity_token_url", &self.identity_token_url),
            ("identity_userinfo_url", &self.identity_userinfo_url),
            ("identity_client_id", &self.identity_client_id),
            ("identity_client_secret", &self.identity_client_secret),
            ("identity_redirect_uri", &self.identity_redirect_uri),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.as_deref().is_none_or(|raw| raw.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();
        if missing.len() == fields.len() {
            return Ok(None);
        }
        if !missing.is_empty() {
            return Err(SettingsError::IdentityProvider {
                message: format!("missing {}", missing.join(", ")),
            });
        }
        if self.identity_timeout_seconds == 0 {
            return Err(SettingsError::IdentityProvider {
                message: "identity_timeout_seconds must be at least one".to_owned(),
            });
        }

        Ok(Some(OAuthProviderConfig {
            token_url: parse_endpoint("identity_token_url", self.identity_token_url.as_deref())?,
            userinfo_url: parse_endpoint(
                "identity_userinfo_url",
                self.identity_userinfo_url.as_deref(),
            )?,
            client_id: required(self.identity_client_id.as_deref()),
            client_secret: Zeroizing::new(required(self.identity_client_secret.as_deref())),
            redirect_uri: required(self.identity_redirect_uri.as_deref()),
            timeout: Duration::from_secs(self.identity_timeout_seconds),
        }))
    }
}

fn required(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_owned()
}

fn parse_endpoint(name: &str, value: Option<&str>) -> Result<Url, SettingsError> {
    let raw = required(value);
    Url::parse(&raw).map_err(|err| SettingsError::IdentityProvider {
        message: format!("{name} {raw:?} is not a URL: {err}"),
    })
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bind_addr: None,
            database_url: None,
            token_secret: None,
            token_secret_file: None,
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            bootstrap_admin_email: None,
            identity_token_url: None,
            identity_userinfo_url: None,
            identity_client_id: None,
            identity_client_secret: None,
            identity_redirect_uri: None,
            identity_timeout_seconds: DEFAULT_IDENTITY_TIMEOUT_SECONDS,
            dev_identity_provider: false,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use std::ffi::OsString;
    use std::io::Write;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    const VARS: [&str; 13] = [
        "INSPECTION_BIND_ADDR",
        "INSPECTION_DATABASE_URL",
        "INSPECTION_TOKEN_SECRET",
        "INSPECTION_TOKEN_SECRET_FILE",
        "INSPECTION_TOKEN_TTL_MINUTES",
        "INSPECTION_BOOTSTRAP_ADMIN_EMAIL",
        "INSPECTION_IDENTITY_TOKEN_URL",
        "INSPECTION_IDENTITY_USERINFO_URL",
        "INSPECTION_IDENTITY_CLIENT_ID",
        "INSPECTION_IDENTITY_CLIENT_SECRET",
        "INSPECTION_IDENTITY_REDIRECT_URI",
        "INSPECTION_IDENTITY_TIMEOUT_SECONDS",
        "INSPECTION_DEV_IDENTITY_PROVIDER",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("inspection-backend")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr().expect("default address"),
            DEFAULT_BIND_ADDR.parse::<SocketAddr>().expect("valid literal")
        );
        assert_eq!(
            settings.token_ttl().expect("default ttl"),
            chrono::Duration::minutes(60)
        );
        assert!(settings.database_url.is_none());
        assert!(settings.signing_secret().expect("no file").is_none());
        assert!(!settings.dev_identity_provider);
        assert!(settings.identity_provider().expect("nothing set").is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("INSPECTION_BIND_ADDR", Some("127.0.0.1:9090".to_owned())),
            ("INSPECTION_DATABASE_URL", Some("postgres://db/inspections".to_owned())),
            ("INSPECTION_TOKEN_SECRET", Some("  s3cret  ".to_owned())),
            ("INSPECTION_TOKEN_SECRET_FILE", None),
            ("INSPECTION_TOKEN_TTL_MINUTES", Some("15".to_owned())),
            ("INSPECTION_BOOTSTRAP_ADMIN_EMAIL", Some("Root@Example.com".to_owned())),
        ]);

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr().expect("address").to_string(),
            "127.0.0.1:9090"
        );
        assert_eq!(
            settings.token_ttl().expect("ttl"),
            chrono::Duration::minutes(15)
        );
        let secret = settings.signing_secret().expect("inline").expect("present");
        assert_eq!(secret.as_slice(), b"s3cret");
        assert_eq!(
            settings
                .bootstrap_admin_email()
                .expect("valid email")
                .map(|email| email.as_str().to_owned()),
            Some("root@example.com".to_owned())
        );
    }

    #[rstest]
    fn secret_file_wins_over_inline_secret() {
        let path = std::env::temp_dir().join(format!("inspection-secret-{}", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).expect("create secret file");
        file.write_all(b"from-file\n").expect("write secret");
        let settings = AppSettings {
            token_secret: Some("inline".to_owned()),
            token_secret_file: Some(path.clone()),
            ..AppSettings::default()
        };

        let secret = settings.signing_secret().expect("readable").expect("present");

        assert_eq!(secret.as_slice(), b"from-file");
        std::fs::remove_file(path).expect("clean up secret file");
    }

    #[rstest]
    fn unreadable_secret_file_is_an_error() {
        let settings = AppSettings {
            token_secret_file: Some(PathBuf::from("/nonexistent/inspection/secret")),
            ..AppSettings::default()
        };

        assert!(matches!(
            settings.signing_secret(),
            Err(SettingsError::SecretFile { .. })
        ));
    }

    #[rstest]
    #[case(Some("not an address"))]
    #[case(Some("localhost"))]
    fn bad_bind_addresses_are_rejected(#[case] raw: Option<&str>) {
        let settings = AppSettings {
            bind_addr: raw.map(str::to_owned),
            ..AppSettings::default()
        };

        assert!(matches!(
            settings.bind_addr(),
            Err(SettingsError::BindAddr { .. })
        ));
    }

    #[rstest]
    fn zero_ttl_is_rejected() {
        let settings = AppSettings {
            token_ttl_minutes: 0,
            ..AppSettings::default()
        };

        assert!(matches!(settings.token_ttl(), Err(SettingsError::TokenTtl)));
    }

    #[rstest]
    fn debug_output_hides_the_secret() {
        let settings = AppSettings {
            token_secret: Some("hunter2".to_owned()),
            identity_client_secret: Some("client-hunter2".to_owned()),
            ..AppSettings::default()
        };

        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hunter2"));
    }

    fn oauth_settings() -> AppSettings {
        AppSettings {
            identity_token_url: Some("https://idp.example.com/oauth/token".to_owned()),
            identity_userinfo_url: Some("https://idp.example.com/userinfo".to_owned()),
            identity_client_id: Some("inspection-backend".to_owned()),
            identity_client_secret: Some(" client-secret ".to_owned()),
            identity_redirect_uri: Some("https://app.example.com/callback".to_owned()),
            ..AppSettings::default()
        }
    }

    #[rstest]
    fn environment_configures_the_identity_provider() {
        let _guard = lock_env([
            ("INSPECTION_IDENTITY_TOKEN_URL", Some("https://idp.example.com/oauth/token".to_owned())),
            ("INSPECTION_IDENTITY_USERINFO_URL", Some("https://idp.example.com/userinfo".to_owned())),
            ("INSPECTION_IDENTITY_CLIENT_ID", Some("inspection-backend".to_owned())),
            ("INSPECTION_IDENTITY_CLIENT_SECRET", Some("client-secret".to_owned())),
            ("INSPECTION_IDENTITY_REDIRECT_URI", Some("https://app.example.com/callback".to_owned())),
            ("INSPECTION_IDENTITY_TIMEOUT_SECONDS", Some("3".to_owned())),
            ("INSPECTION_DEV_IDENTITY_PROVIDER", None),
        ]);

        let settings = load_from_empty_args();
        let provider = settings
            .identity_provider()
            .expect("complete provider")
            .expect("provider present");

        assert_eq!(provider.token_url.path(), "/oauth/token");
        assert_eq!(provider.timeout, Duration::from_secs(3));
        assert!(!settings.dev_identity_provider);
    }

    #[rstest]
    fn complete_provider_settings_are_trimmed() {
        let provider = oauth_settings()
            .identity_provider()
            .expect("complete provider")
            .expect("provider present");

        assert_eq!(provider.client_secret.as_str(), "client-secret");
        assert_eq!(
            provider.timeout,
            Duration::from_secs(DEFAULT_IDENTITY_TIMEOUT_SECONDS)
        );
    }

    #[rstest]
    fn partial_provider_settings_name_the_missing_fields() {
        let settings = AppSettings {
            identity_client_secret: None,
            identity_redirect_uri: Some("   ".to_owned()),
            ..oauth_settings()
        };

        let err = settings.identity_provider().expect_err("partial provider");

        let message = err.to_string();
        assert!(message.contains("identity_client_secret"));
        assert!(message.contains("identity_redirect_uri"));
    }

    #[rstest]
    fn unparsable_endpoint_is_rejected() {
        let settings = AppSettings {
            identity_userinfo_url: Some("idp.example.com/userinfo".to_owned()),
            ..oauth_settings()
        };

        assert!(matches!(
            settings.identity_provider(),
            Err(SettingsError::IdentityProvider { .. })
        ));
    }

    #[rstest]
    fn zero_provider_timeout_is_rejected() {
        let settings = AppSettings {
            identity_timeout_seconds: 0,
            ..oauth_settings()
        };

        assert!(matches!(
            settings.identity_provider(),
            Err(SettingsError::IdentityProvider { .. })
        ));
    }
}
