//! Terminal side of the authorization-code flow.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;
use whoop_client::{AuthorizationPrompt, WhoopError};

/// Shows the consent URL and reads the pasted redirect URL from a line reader.
pub struct ReaderPrompt<R> {
    reader: Mutex<R>,
}

pub type StdinPrompt = ReaderPrompt<BufReader<Stdin>>;

impl StdinPrompt {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> ReaderPrompt<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(reader),
        }
    }
}

#[async_trait]
impl<R> AuthorizationPrompt for ReaderPrompt<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn redirect_url(&self, authorization_url: &str) -> Result<String, WhoopError> {
        println!("Visit the URL for the auth dialog:\n\n{authorization_url}\n");
        println!("Enter the response URL:");

        let mut line = String::new();
        self.reader.lock().await.read_line(&mut line).await?;
        let url = line.trim();
        if url.is_empty() {
            return Err(WhoopError::InvalidRedirect("no redirect url entered".into()));
        }
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_first_line() {
        let prompt = ReaderPrompt::new(&b"https://localhost/cb?code=abc123\nignored\n"[..]);
        let url = prompt.redirect_url("https://auth").await.unwrap();
        assert_eq!(url, "https://localhost/cb?code=abc123");
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let prompt = ReaderPrompt::new(&b""[..]);
        assert!(matches!(
            prompt.redirect_url("https://auth").await,
            Err(WhoopError::InvalidRedirect(_))
        ));
    }
}
