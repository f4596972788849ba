use crate::WhoopError;
use crate::sink::LineFormat;
use secrecy::SecretString;
use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "https://api.prod.whoop.com/developer";
pub const DEFAULT_AUTH_URL: &str = "https://api.prod.whoop.com/oauth/oauth2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://api.prod.whoop.com/oauth/oauth2/token";
pub const DEFAULT_SCOPES: &[&str] = &[
    "offline",
    "read:sleep",
    "read:workout",
    "read:recovery",
    "read:cycles",
];

#[derive(Clone, Debug)]
pub struct Config {
    pub client_id: String,
    pub client_secret: SecretString,
    pub api_base_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub redirect_uri: Option<String>,
    pub scopes: Vec<String>,
    pub token_file: PathBuf,
    pub output_dir: PathBuf,
    pub line_format: LineFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, WhoopError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, WhoopError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut lookup = |keys: &[&str]| {
            keys.iter().find_map(|k| {
                get(*k)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
        };

        let client_id = lookup(&["WHOOP_CLIENT_ID", "ClientID"])
            .ok_or_else(|| WhoopError::Config("WHOOP_CLIENT_ID missing".into()))?;
        let client_secret = lookup(&["WHOOP_CLIENT_SECRET", "ClientSecret"])
            .ok_or_else(|| WhoopError::Config("WHOOP_CLIENT_SECRET missing".into()))?;

        let scopes = match lookup(&["WHOOP_SCOPES"]) {
            Some(raw) => raw
                .split([' ', ','])
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        };

        let line_format = match lookup(&["WHOOP_SINK_FORMAT"]) {
            Some(raw) => raw.parse()?,
            None => LineFormat::default(),
        };

        Ok(Self {
            client_id,
            client_secret: SecretString::new(client_secret.into()),
            api_base_url: lookup(&["WHOOP_API_BASE_URL"])
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.into()),
            auth_url: lookup(&["WHOOP_AUTH_URL"]).unwrap_or_else(|| DEFAULT_AUTH_URL.into()),
            token_url: lookup(&["WHOOP_TOKEN_URL"]).unwrap_or_else(|| DEFAULT_TOKEN_URL.into()),
            redirect_uri: lookup(&["WHOOP_REDIRECT_URI"]),
            scopes,
            token_file: lookup(&["WHOOP_TOKEN_FILE"])
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("token.json")),
            output_dir: lookup(&["WHOOP_OUTPUT_DIR"])
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            line_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn from_env_missing_client_secret() {
        let get = |k: &str| match k {
            "WHOOP_CLIENT_ID" => Some("id".into()),
            _ => None,
        };
        let res = Config::from_env_with(get);
        assert!(matches!(res, Err(WhoopError::Config(_))));
    }

    #[test]
    fn from_env_rejects_blank_client_id() {
        let get = |k: &str| match k {
            "WHOOP_CLIENT_ID" => Some("   ".into()),
            "WHOOP_CLIENT_SECRET" => Some("sekrit".into()),
            _ => None,
        };
        assert!(Config::from_env_with(get).is_err());
    }

    #[test]
    fn from_env_reads_values_and_defaults() {
        let get = |k: &str| match k {
            "WHOOP_CLIENT_ID" => Some("id".into()),
            "WHOOP_CLIENT_SECRET" => Some("sekrit".into()),
            "WHOOP_API_BASE_URL" => Some("http://localhost".into()),
            _ => None,
        };
        let cfg = Config::from_env_with(get).expect("cfg");
        assert_eq!(cfg.client_id, "id");
        assert_eq!(cfg.client_secret.expose_secret(), "sekrit");
        assert_eq!(cfg.api_base_url, "http://localhost");
        assert_eq!(cfg.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(cfg.token_file, PathBuf::from("token.json"));
        assert_eq!(cfg.scopes.len(), DEFAULT_SCOPES.len());
        assert_eq!(cfg.line_format, LineFormat::JsonLines);
        assert!(cfg.redirect_uri.is_none());
    }

    #[test]
    fn from_env_accepts_legacy_keys_and_scope_lists() {
        let get = |k: &str| match k {
            "ClientID" => Some("legacy-id".into()),
            "ClientSecret" => Some("legacy-secret".into()),
            "WHOOP_SCOPES" => Some("offline,read:sleep read:workout".into()),
            "WHOOP_SINK_FORMAT" => Some("legacy".into()),
            _ => None,
        };
        let cfg = Config::from_env_with(get).expect("cfg");
        assert_eq!(cfg.client_id, "legacy-id");
        assert_eq!(cfg.scopes, vec!["offline", "read:sleep", "read:workout"]);
        assert_eq!(cfg.line_format, LineFormat::Legacy);
    }

    #[test]
    fn blank_primary_key_falls_back_to_legacy_key() {
        let get = |k: &str| match k {
            "WHOOP_CLIENT_ID" => Some("".into()),
            "ClientID" => Some("legacy-id".into()),
            "WHOOP_CLIENT_SECRET" => Some("  ".into()),
            "ClientSecret" => Some("legacy-secret".into()),
            _ => None,
        };
        let cfg = Config::from_env_with(get).expect("cfg");
        assert_eq!(cfg.client_id, "legacy-id");
        assert_eq!(cfg.client_secret.expose_secret(), "legacy-secret");
    }

    #[test]
    fn from_env_rejects_unknown_sink_format() {
        let get = |k: &str| match k {
            "WHOOP_CLIENT_ID" => Some("id".into()),
            "WHOOP_CLIENT_SECRET" => Some("sekrit".into()),
            "WHOOP_SINK_FORMAT" => Some("csv".into()),
            _ => None,
        };
        assert!(matches!(
            Config::from_env_with(get),
            Err(WhoopError::Config(_))
        ));
    }
}
