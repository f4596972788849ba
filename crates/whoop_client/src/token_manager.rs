//! Credential lifecycle: load, validate, refresh and bootstrap.

use crate::credential::{Credential, CredentialStore};
use crate::oauth::OAuthClient;
use crate::WhoopError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;

/// Fixed state marker sent with the authorization request.
pub const AUTH_STATE: &str = "stateidentifier";

/// The human in the loop of the authorization-code flow.
///
/// Given the consent page URL, implementors return the full URL the browser
/// was redirected to after the user granted access.
#[async_trait]
pub trait AuthorizationPrompt: Send + Sync {
    async fn redirect_url(&self, authorization_url: &str) -> Result<String, WhoopError>;
}

pub struct TokenManager<S: CredentialStore> {
    oauth: OAuthClient,
    store: S,
    prompt: Box<dyn AuthorizationPrompt>,
}

impl<S: CredentialStore> TokenManager<S> {
    pub fn new(oauth: OAuthClient, store: S, prompt: Box<dyn AuthorizationPrompt>) -> Self {
        Self {
            oauth,
            store,
            prompt,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return an access token valid for immediate use.
    pub async fn obtain(&self) -> Result<SecretString, WhoopError> {
        self.obtain_at(Utc::now()).await
    }

    /// Same as [`obtain`](Self::obtain) with freshness judged against `now`.
    pub async fn obtain_at(&self, now: DateTime<Utc>) -> Result<SecretString, WhoopError> {
        let credential = match self.store.load()? {
            None => {
                tracing::info!("no stored credential; starting interactive authorization");
                let credential = self.authorize(now).await?;
                self.store.save(&credential)?;
                credential
            }
            Some(credential) if credential.is_fresh_at(now) => {
                tracing::info!(expiry = %credential.expiry.to_rfc3339(), "stored token is still valid");
                credential
            }
            Some(stale) => {
                tracing::info!(expiry = %stale.expiry.to_rfc3339(), "stored token is expired");
                let credential = self.oauth.refresh(&stale, now).await?;
                self.store.save(&credential)?;
                credential
            }
        };
        Ok(SecretString::new(credential.access_token.into()))
    }

    async fn authorize(&self, now: DateTime<Utc>) -> Result<Credential, WhoopError> {
        let url = self.oauth.authorization_url(AUTH_STATE)?;
        let redirect = self.prompt.redirect_url(&url).await?;
        let code = OAuthClient::extract_code(&redirect, AUTH_STATE)?;
        self.oauth.exchange_code(&code, now).await
    }
}
