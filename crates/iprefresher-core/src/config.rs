//! Credential loading for the IP refresher
//!
//! Credentials live in a flat key-value file (TOML syntax, `key = "value"`
//! per line, `#` comments):
//!
//! ```text
//! dynuapikey = "..."
//! domainid = "..."
//! domainname = "home.example.com"
//!
//! # optional, both needed to enable Telegram notifications
//! telegramApiKey = "..."
//! chatId = "..."
//! ```
//!
//! They are read once at startup into an immutable [`Credentials`] value
//! which is then handed to each client.

use serde::Deserialize;
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// Default location of the credentials file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/iprefresher.cfg";

/// Written in place of a missing config file
pub const CONFIG_TEMPLATE: &str = r#"# Dynu IP refresher config

## DYNU API Config
dynuapikey = ""
domainid = ""
domainname = ""

## Telegram API Config (optional)
#telegramApiKey = ""
#chatId = ""
"#;

const KEY_DYNU_API_KEY: &str = "dynuapikey";
const KEY_DOMAIN_ID: &str = "domainid";
const KEY_DOMAIN_NAME: &str = "domainname";

/// Credentials for the DNS provider and the optional messaging endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Dynu API key
    pub dns_api_key: String,
    /// Dynu id of the domain to update
    pub domain_id: String,
    /// Domain name the id belongs to
    pub domain_name: String,
    /// Telegram credentials, `None` when notifications are disabled
    pub messaging: Option<MessagingCredentials>,
}

/// Credentials for the Telegram notifier
#[derive(Clone, PartialEq, Eq)]
pub struct MessagingCredentials {
    /// Bot token
    pub api_key: String,
    /// Chat the bot posts into
    pub chat_id: String,
}

impl Credentials {
    /// Whether change notifications should be sent
    pub fn messaging_enabled(&self) -> bool {
        self.messaging.is_some()
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let dns_api_key = required(raw.dynuapikey, KEY_DYNU_API_KEY)?;
        let domain_id = required(raw.domainid, KEY_DOMAIN_ID)?;
        let domain_name = required(raw.domainname, KEY_DOMAIN_NAME)?;

        let messaging = match (non_empty(raw.telegram_api_key), non_empty(raw.chat_id)) {
            (Some(api_key), Some(chat_id)) => Some(MessagingCredentials { api_key, chat_id }),
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(
                    "Only one of telegramApiKey/chatId is set, Telegram notifications stay disabled"
                );
                None
            }
        };

        Ok(Self {
            dns_api_key,
            domain_id,
            domain_name,
            messaging,
        })
    }
}

// Keys never appear in Debug output
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("dns_api_key", &"<REDACTED>")
            .field("domain_id", &self.domain_id)
            .field("domain_name", &self.domain_name)
            .field("messaging", &self.messaging)
            .finish()
    }
}

impl fmt::Debug for MessagingCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagingCredentials")
            .field("api_key", &"<REDACTED>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// On-disk shape of the config file; every key optional so that missing
/// keys can be reported by name
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    dynuapikey: Option<String>,
    domainid: Option<String>,
    domainname: Option<String>,
    #[serde(rename = "telegramApiKey")]
    telegram_api_key: Option<String>,
    #[serde(rename = "chatId")]
    chat_id: Option<String>,
}

impl RawConfig {
    fn required_fields(&self) -> [(&'static str, Option<&str>); 3] {
        [
            (KEY_DYNU_API_KEY, self.dynuapikey.as_deref()),
            (KEY_DOMAIN_ID, self.domainid.as_deref()),
            (KEY_DOMAIN_NAME, self.domainname.as_deref()),
        ]
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, key: &'static str) -> Result<String> {
    non_empty(value).ok_or(Error::MissingField(key))
}

fn parse(path: &Path, content: &str) -> Result<RawConfig> {
    toml::from_str::<RawConfig>(content).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        line: e
            .span()
            .map(|span| content[..span.start.min(content.len())].matches('\n').count() + 1),
        message: e.message().to_string(),
    })
}

fn write_template(path: &Path) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(CONFIG_TEMPLATE.as_bytes())?;
    file.flush()
}

/// Load credentials from `path`
///
/// If the file does not exist a template is written in its place and
/// [`Error::ConfigMissing`] is returned; the caller should treat that as a
/// fatal startup condition. Missing optional keys just disable
/// notifications.
///
/// # Errors
///
/// - [`Error::ConfigMissing`]: no file (template created if possible)
/// - [`Error::ConfigIo`]: the file exists but cannot be read
/// - [`Error::ConfigParse`]: syntax error, with the offending line
/// - [`Error::MissingField`]: a required key is absent or empty
pub fn load(path: impl AsRef<Path>) -> Result<Credentials> {
    let path = path.as_ref();

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(
                "Config file {} not found, creating new config file",
                path.display()
            );
            let template_written = match write_template(path) {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!("Error creating config file {}: {}", path.display(), e);
                    false
                }
            };
            return Err(Error::ConfigMissing {
                path: path.to_path_buf(),
                template_written,
            });
        }
        Err(source) => {
            return Err(Error::ConfigIo {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let credentials = Credentials::from_raw(parse(path, &content)?)?;
    tracing::debug!(
        "Loaded credentials for {} (notifications {})",
        credentials.domain_name,
        if credentials.messaging_enabled() { "enabled" } else { "disabled" }
    );
    Ok(credentials)
}

/// Check the config file at `path` without loading it into the process
///
/// Verifies that the file is readable, syntactically valid and that every
/// required key is present and non-empty. Findings are logged. Unlike
/// [`load`], a missing file is not replaced by a template.
pub fn validate(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    tracing::info!("reading config file {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(
                "config file {} doesn't exist or permission denied: {}",
                path.display(),
                e
            );
            return false;
        }
    };

    let raw = match parse(path, &content) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("{}", e);
            return false;
        }
    };
    tracing::info!("Syntax and Permission is OK");

    for (key, value) in raw.required_fields() {
        match value {
            None => {
                tracing::warn!("No '{}' setting in configuration file", key);
                return false;
            }
            Some(v) if v.trim().is_empty() => {
                tracing::warn!("required parameter {} seems to be empty", key);
                return false;
            }
            Some(_) => {}
        }
    }

    if raw.telegram_api_key.is_some() != raw.chat_id.is_some() {
        tracing::warn!("telegramApiKey and chatId should be set together");
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const FILLED: &str = r#"
dynuapikey = "key123"
domainid = "98765"
domainname = "home.example.com"
"#;

    #[test]
    fn test_missing_file_creates_template() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iprefresher.cfg");

        let err = load(&path).unwrap_err();
        assert!(matches!(
            err,
            Error::ConfigMissing {
                template_written: true,
                ..
            }
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);

        // The template itself is syntactically valid but empty
        assert!(matches!(load(&path), Err(Error::MissingField("dynuapikey"))));
    }

    #[test]
    fn test_filled_template_loads_without_messaging() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iprefresher.cfg");
        assert!(load(&path).is_err());

        let filled = CONFIG_TEMPLATE
            .replace("dynuapikey = \"\"", "dynuapikey = \"key123\"")
            .replace("domainid = \"\"", "domainid = \"98765\"")
            .replace("domainname = \"\"", "domainname = \"home.example.com\"");
        std::fs::write(&path, filled).unwrap();

        let creds = load(&path).unwrap();
        assert_eq!(creds.dns_api_key, "key123");
        assert_eq!(creds.domain_id, "98765");
        assert_eq!(creds.domain_name, "home.example.com");
        assert!(!creds.messaging_enabled());
    }

    #[test]
    fn test_template_not_written_into_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope").join("iprefresher.cfg");

        assert!(matches!(
            load(&path),
            Err(Error::ConfigMissing {
                template_written: false,
                ..
            })
        ));
    }

    #[test]
    fn test_messaging_enabled_when_both_keys_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iprefresher.cfg");
        std::fs::write(
            &path,
            format!("{FILLED}telegramApiKey = \"123:abc\"\nchatId = \"-1001\"\n"),
        )
        .unwrap();

        let creds = load(&path).unwrap();
        let messaging = creds.messaging.expect("messaging configured");
        assert_eq!(messaging.api_key, "123:abc");
        assert_eq!(messaging.chat_id, "-1001");
    }

    #[test]
    fn test_half_configured_messaging_is_disabled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iprefresher.cfg");
        std::fs::write(&path, format!("{FILLED}telegramApiKey = \"123:abc\"\n")).unwrap();

        assert!(!load(&path).unwrap().messaging_enabled());

        std::fs::write(&path, format!("{FILLED}telegramApiKey = \"\"\nchatId = \"\"\n")).unwrap();
        assert!(!load(&path).unwrap().messaging_enabled());
    }

    #[test]
    fn test_empty_required_field_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iprefresher.cfg");
        std::fs::write(&path, FILLED.replace("\"98765\"", "\"\"")).unwrap();

        assert!(matches!(load(&path), Err(Error::MissingField("domainid"))));
    }

    #[test]
    fn test_parse_error_reports_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iprefresher.cfg");
        std::fs::write(&path, "dynuapikey = \"a\"\ndomainid = \"b\"\ndomainname = = \"c\"\n").unwrap();

        match load(&path) {
            Err(Error::ConfigParse { line, .. }) => assert_eq!(line, Some(3)),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(load(dir.path()), Err(Error::ConfigIo { .. })));
    }

    #[test]
    fn test_validate_requires_domainname() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iprefresher.cfg");
        std::fs::write(&path, "dynuapikey = \"key123\"\ndomainid = \"98765\"\n").unwrap();

        assert!(!validate(&path));
    }

    #[test]
    fn test_validate_accepts_required_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iprefresher.cfg");
        std::fs::write(&path, FILLED).unwrap();

        assert!(validate(&path));
    }

    #[test]
    fn test_validate_does_not_create_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iprefresher.cfg");

        assert!(!validate(&path));
        assert!(!path.exists());
    }

    #[test]
    fn test_validate_rejects_empty_and_bad_syntax() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("iprefresher.cfg");

        std::fs::write(&path, CONFIG_TEMPLATE).unwrap();
        assert!(!validate(&path));

        std::fs::write(&path, "dynuapikey = \"unterminated\n").unwrap();
        assert!(!validate(&path));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let creds = Credentials {
            dns_api_key: "super-secret-dynu".to_string(),
            domain_id: "1".to_string(),
            domain_name: "example.com".to_string(),
            messaging: Some(MessagingCredentials {
                api_key: "super-secret-bot".to_string(),
                chat_id: "42".to_string(),
            }),
        };

        let debug_str = format!("{:?}", creds);
        assert!(!debug_str.contains("super-secret"));
        assert!(debug_str.contains("example.com"));
    }
}
