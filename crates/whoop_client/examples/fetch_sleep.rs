use secrecy::SecretString;
use whoop_client::{
    Config, CredentialStore, FileCredentialStore, JsonLinesSink, LineFormat, PageFetcher, Resource,
};

/// Print every sleep record to stdout using an already stored, unexpired
/// credential. Run `whoop-sync` once first to authorize.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(());
        }
    };
    let Some(credential) = FileCredentialStore::new(&cfg.token_file).load()? else {
        eprintln!("no credential at {}", cfg.token_file.display());
        return Ok(());
    };
    if !credential.is_fresh_at(chrono::Utc::now()) {
        eprintln!("stored credential expired; run whoop-sync to refresh it");
        return Ok(());
    }

    let token = SecretString::new(credential.access_token.into());
    let mut sink = JsonLinesSink::new(std::io::stdout().lock(), LineFormat::JsonLines);
    let report = PageFetcher::new(&cfg.api_base_url)
        .fetch(Resource::Sleep.path(), &token, &mut sink)
        .await?;
    eprintln!("{} records in {} pages", report.records, report.pages);
    Ok(())
}
