//! Configuration sources: the process environment first, then a `.env` file.

use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;
use whoop_client::Config;

/// Read `KEY=value` pairs from a dotenv file. A missing file yields nothing.
pub fn read_dotenv(path: &Path) -> anyhow::Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut values = HashMap::new();
    for item in iter {
        let (k, v) = item.with_context(|| format!("failed to parse {}", path.display()))?;
        values.insert(k, v);
    }
    Ok(values)
}

/// Build the client configuration without touching the process environment.
pub fn load_config(dotenv: &Path) -> anyhow::Result<Config> {
    let file = read_dotenv(dotenv)?;
    let config =
        Config::from_env_with(|k| std::env::var(k).ok().or_else(|| file.get(k).cloned()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dotenv_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_dotenv(&dir.path().join(".env")).unwrap().is_empty());
    }

    #[test]
    fn dotenv_values_feed_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "ClientID=file-id\nClientSecret=file-secret\nWHOOP_TOKEN_FILE=/tmp/whoop-token.json\n",
        )
        .unwrap();
        let config = load_config(&path).expect("config");
        assert!(!config.client_id.is_empty());
        assert_eq!(config.token_file, Path::new("/tmp/whoop-token.json"));
    }
}
