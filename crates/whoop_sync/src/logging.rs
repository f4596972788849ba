use tracing_subscriber::EnvFilter;

const FALLBACK_FILTER: &str = "info";

/// Log level from `WHOOP_LOG_LEVEL`, then `RUST_LOG`, defaulting to `info`.
pub fn log_level_from_env() -> String {
    std::env::var("WHOOP_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| FALLBACK_FILTER.to_string())
}

/// Parse `directives`, keeping hyper and reqwest internals quiet.
pub fn env_filter(directives: &str) -> EnvFilter {
    let combined = format!("{directives},hyper=warn,reqwest=warn");
    EnvFilter::try_new(combined)
        .unwrap_or_else(|_| EnvFilter::new(format!("{FALLBACK_FILTER},hyper=warn,reqwest=warn")))
}

/// Install the global subscriber. Logs go to stderr so stdout stays free for
/// the authorization prompt.
pub fn init() {
    let level = log_level_from_env();
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter(&level))
        .init();
    tracing::debug!("whoop-sync: log filter: {}", level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_filter_accepts_level() {
        let filter = env_filter("debug");
        assert!(format!("{filter}").contains("debug"));
    }

    #[test]
    fn env_filter_falls_back_on_garbage() {
        let filter = env_filter("invalid[[[filter");
        assert!(format!("{filter}").contains("hyper=warn"));
    }

    #[test]
    fn log_level_is_never_empty() {
        assert!(!log_level_from_env().is_empty());
    }
}
