//! OAuth2 authorization-code and refresh-token exchanges against the WHOOP
//! token endpoint.

use crate::credential::Credential;
use crate::{Config, WhoopError, response_snippet};
use chrono::{DateTime, Duration, Utc};
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Tokens issued by WHOOP are valid for one hour when the response does not
/// say otherwise.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_credential(
        self,
        now: DateTime<Utc>,
        previous_refresh: Option<&str>,
    ) -> Result<Credential, WhoopError> {
        let expires_in = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expiry = Duration::try_seconds(expires_in)
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or_else(|| {
                WhoopError::Auth(format!("token response has invalid expires_in: {expires_in}"))
            })?;
        Ok(Credential {
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expiry,
        })
    }
}

/// Client for the authorization and token endpoints.
#[derive(Clone, Debug)]
pub struct OAuthClient {
    client_id: String,
    client_secret: SecretString,
    auth_url: String,
    token_url: String,
    redirect_uri: Option<String>,
    scopes: Vec<String>,
    client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: &Config) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(config: &Config, client: reqwest::Client) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scopes: config.scopes.clone(),
            client,
        }
    }

    /// Build the consent page URL a human has to visit.
    pub fn authorization_url(&self, state: &str) -> Result<String, WhoopError> {
        let scope = self.scopes.join(" ");
        let mut params = vec![
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
            ("access_type", "offline"),
        ];
        if let Some(redirect) = &self.redirect_uri {
            params.push(("redirect_uri", redirect.as_str()));
        }
        let url = Url::parse_with_params(&self.auth_url, &params)
            .map_err(|e| WhoopError::Config(format!("invalid auth url {}: {e}", self.auth_url)))?;
        Ok(url.into())
    }

    /// Pull the authorization code out of the URL the browser was redirected to.
    pub fn extract_code(redirect_url: &str, expected_state: &str) -> Result<String, WhoopError> {
        let url = Url::parse(redirect_url.trim())
            .map_err(|e| WhoopError::InvalidRedirect(format!("{redirect_url}: {e}")))?;

        let mut code = None;
        let mut state = None;
        let mut error = None;
        for (k, v) in url.query_pairs() {
            match k.as_ref() {
                "code" => code = Some(v.into_owned()),
                "state" => state = Some(v.into_owned()),
                "error" => error = Some(v.into_owned()),
                _ => {}
            }
        }

        if let Some(error) = error {
            return Err(WhoopError::InvalidRedirect(format!(
                "authorization denied: {error}"
            )));
        }
        if let Some(state) = state
            && state != expected_state
        {
            return Err(WhoopError::InvalidRedirect(format!(
                "state mismatch: expected {expected_state}, got {state}"
            )));
        }
        code.filter(|c| !c.is_empty())
            .ok_or_else(|| WhoopError::InvalidRedirect("missing code parameter".into()))
    }

    /// Exchange an authorization code for a new credential.
    pub async fn exchange_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Credential, WhoopError> {
        tracing::info!("exchanging authorization code for token");
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
        ];
        if let Some(redirect) = &self.redirect_uri {
            form.push(("redirect_uri", redirect.as_str()));
        }
        let resp = self.post_form(&form).await?;
        resp.into_credential(now, None)
    }

    /// Trade the stored refresh token for a new credential.
    pub async fn refresh(
        &self,
        previous: &Credential,
        now: DateTime<Utc>,
    ) -> Result<Credential, WhoopError> {
        let refresh_token = previous
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| WhoopError::Auth("stored credential has no refresh token".into()))?;

        tracing::info!("refreshing expired access token");
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("scope", "offline"),
        ];
        let resp = self.post_form(&form).await?;
        let credential = resp.into_credential(now, Some(refresh_token))?;
        tracing::info!(expiry = %credential.expiry.to_rfc3339(), "token refreshed");
        Ok(credential)
    }

    async fn post_form(&self, form: &[(&str, &str)]) -> Result<TokenResponse, WhoopError> {
        let resp = self.client.post(&self.token_url).form(form).send().await?;
        if !resp.status().is_success() {
            let (status, body) = response_snippet(resp).await;
            tracing::error!(status, %body, "token endpoint rejected request");
            return Err(WhoopError::TokenExchange { status, body });
        }
        let token: TokenResponse = resp.json().await?;
        if token.access_token.is_empty() {
            return Err(WhoopError::Auth(
                "token response does not contain access_token".into(),
            ));
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_env_with(|k| match k {
            "WHOOP_CLIENT_ID" => Some("cid".into()),
            "WHOOP_CLIENT_SECRET" => Some("csecret".into()),
            "WHOOP_AUTH_URL" => Some("https://auth.example/oauth2/auth".into()),
            "WHOOP_SCOPES" => Some("offline read:sleep".into()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn authorization_url_embeds_client_scope_and_state() {
        let client = OAuthClient::new(&config());
        let url = Url::parse(&client.authorization_url("stateidentifier").unwrap()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".into(), "cid".into())));
        assert!(pairs.contains(&("scope".into(), "offline read:sleep".into())));
        assert!(pairs.contains(&("state".into(), "stateidentifier".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(!pairs.iter().any(|(k, _)| k == "redirect_uri"));
    }

    #[test]
    fn extract_code_reads_query() {
        let code = OAuthClient::extract_code(
            "https://localhost/callback?code=abc123&scope=offline&state=stateidentifier",
            "stateidentifier",
        )
        .unwrap();
        assert_eq!(code, "abc123");
    }

    #[test]
    fn extract_code_rejects_missing_code_and_bad_state() {
        assert!(OAuthClient::extract_code("https://localhost/cb?state=s", "s").is_err());
        assert!(OAuthClient::extract_code("https://localhost/cb?code=", "s").is_err());
        assert!(OAuthClient::extract_code("https://localhost/cb?code=x&state=other", "s").is_err());
        assert!(OAuthClient::extract_code("not a url", "s").is_err());
        assert!(
            OAuthClient::extract_code("https://localhost/cb?error=access_denied", "s").is_err()
        );
    }

    #[test]
    fn token_response_defaults() {
        let now = Utc::now();
        let resp: TokenResponse = serde_json::from_str(r#"{"access_token":"T1"}"#).unwrap();
        let cred = resp.into_credential(now, Some("old-refresh")).unwrap();
        assert_eq!(cred.token_type, "bearer");
        assert_eq!(cred.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(cred.expiry, now + Duration::seconds(3600));
    }

    #[test]
    fn out_of_range_expires_in_is_an_error() {
        let now = Utc::now();
        for expires_in in [i64::MAX, i64::MIN] {
            let resp = TokenResponse {
                access_token: "A".into(),
                token_type: None,
                refresh_token: None,
                expires_in: Some(expires_in),
            };
            assert!(matches!(
                resp.into_credential(now, None),
                Err(WhoopError::Auth(_))
            ));
        }
    }
}
