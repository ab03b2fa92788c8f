//! Operator secrets read from the card each cycle.
//!
//! The file is a list of `NAME = "value"` assignments, one per line:
//!
//! ```text
//! WIFI_SSID = "home"
//! WIFI_PASSWORD = "hunter2"
//! API_AUTH_HEADER = "X-Api-Key"
//! API_AUTH_KEY = "..."
//! API_URL = "https://calendar.example.com"
//! ```

use alloc::string::{String, ToString};
use core::fmt;

use thiserror::Error;

use crate::storage::{join_path, Storage, StorageError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SecretsError {
    #[error("cannot read secrets: {0}")]
    Unreadable(#[from] StorageError),
    #[error("{0} missing from secrets")]
    Missing(&'static str),
    #[error("line {line}: expected NAME = \"value\"")]
    Malformed { line: usize },
}

/// Where content requests go and how they authenticate.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ApiConfig {
    pub auth_header: String,
    pub auth_key: String,
    pub base_url: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    pub network_ssid: String,
    /// Empty for an open network.
    pub network_credential: String,
    pub api: ApiConfig,
}

impl Secrets {
    /// Read and parse `<mount_point>/<file>`.
    pub fn load(storage: &mut dyn Storage, mount_point: &str, file: &str) -> Result<Self, SecretsError> {
        let path = join_path(mount_point, file);
        let text = storage.read_to_string(&path)?;
        let secrets = Self::parse(&text)?;
        log::info!("secrets: loaded from {} (ssid {})", path, secrets.network_ssid);
        Ok(secrets)
    }

    pub fn parse(text: &str) -> Result<Self, SecretsError> {
        let mut ssid = None;
        let mut password = None;
        let mut auth_header = None;
        let mut auth_key = None;
        let mut base_url = None;

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((name, value)) = line.split_once('=') else {
                log::debug!("secrets: ignoring line {}", index + 1);
                continue;
            };
            let slot = match name.trim() {
                "WIFI_SSID" => &mut ssid,
                "WIFI_PASSWORD" => &mut password,
                "API_AUTH_HEADER" => &mut auth_header,
                "API_AUTH_KEY" => &mut auth_key,
                "API_URL" => &mut base_url,
                other => {
                    log::debug!("secrets: ignoring {}", other);
                    continue;
                }
            };
            let value = quoted_value(value).ok_or(SecretsError::Malformed { line: index + 1 })?;
            *slot = Some(value.to_string());
        }

        Ok(Secrets {
            network_ssid: required(ssid, "WIFI_SSID")?,
            network_credential: password.ok_or(SecretsError::Missing("WIFI_PASSWORD"))?,
            api: ApiConfig {
                auth_header: required(auth_header, "API_AUTH_HEADER")?,
                auth_key: required(auth_key, "API_AUTH_KEY")?,
                base_url: required(base_url, "API_URL")?,
            },
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, SecretsError> {
    value.filter(|v| !v.is_empty()).ok_or(SecretsError::Missing(name))
}

/// Right-hand side `"value"` or `'value'`, trailing `# comment` allowed.
fn quoted_value(rest: &str) -> Option<&str> {
    let rest = rest.trim();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &rest[1..];
    let end = body.find(quote)?;
    let tail = body[end + 1..].trim();
    if !(tail.is_empty() || tail.starts_with('#')) {
        return None;
    }
    Some(&body[..end])
}

// Keep credentials out of logs.
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("auth_header", &self.auth_header)
            .field("auth_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("network_ssid", &self.network_ssid)
            .field("network_credential", &"***")
            .field("api", &self.api)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockStorage;
    use crate::storage::MountMode;

    const SAMPLE: &str = r#"
# Wi-Fi
WIFI_SSID = "home"
WIFI_PASSWORD = 'hunter2'

API_AUTH_HEADER = "X-Api-Key"   # header name
API_AUTH_KEY = "k3y"
API_URL = "https://cal.example.com"
TIMEZONE = "UTC"
"#;

    #[test]
    fn parses_all_fields() {
        let secrets = Secrets::parse(SAMPLE).unwrap();
        assert_eq!(secrets.network_ssid, "home");
        assert_eq!(secrets.network_credential, "hunter2");
        assert_eq!(secrets.api.auth_header, "X-Api-Key");
        assert_eq!(secrets.api.auth_key, "k3y");
        assert_eq!(secrets.api.base_url, "https://cal.example.com");
    }

    #[test]
    fn empty_password_means_open_network() {
        let text = SAMPLE.replace("'hunter2'", "\"\"");
        assert_eq!(Secrets::parse(&text).unwrap().network_credential, "");
    }

    #[test]
    fn missing_field_is_named() {
        let text = SAMPLE.replace("API_URL", "API_URI");
        assert_eq!(Secrets::parse(&text), Err(SecretsError::Missing("API_URL")));
        let text = SAMPLE.replace("\"home\"", "\"\"");
        assert_eq!(Secrets::parse(&text), Err(SecretsError::Missing("WIFI_SSID")));
    }

    #[test]
    fn unquoted_value_is_malformed() {
        let text = "WIFI_SSID = home\n";
        assert_eq!(Secrets::parse(text), Err(SecretsError::Malformed { line: 1 }));
    }

    #[test]
    fn unknown_names_may_hold_any_python_value() {
        let text = format!("{}REFRESH_MINUTES = 30\nDEBUG = True\nimport os\n", SAMPLE);
        let secrets = Secrets::parse(&text).unwrap();
        assert_eq!(secrets.network_ssid, "home");
    }

    #[test]
    fn debug_masks_credentials() {
        let rendered = format!("{:?}", Secrets::parse(SAMPLE).unwrap());
        assert!(rendered.contains("home"));
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("k3y"));
    }

    #[test]
    fn load_reads_from_mount_point() {
        let mut storage = MockStorage::new();
        storage.add_file("/sdcard/secrets.py", SAMPLE);
        storage.mount("/sdcard", MountMode::ReadWrite).unwrap();
        let secrets = Secrets::load(&mut storage, "/sdcard", "secrets.py").unwrap();
        assert_eq!(secrets.network_ssid, "home");
    }

    #[test]
    fn load_reports_missing_file() {
        let mut storage = MockStorage::new();
        storage.mount("/sdcard", MountMode::ReadWrite).unwrap();
        let err = Secrets::load(&mut storage, "/sdcard", "secrets.py").unwrap_err();
        assert!(matches!(err, SecretsError::Unreadable(StorageError::NotFound(_))));
    }
}
