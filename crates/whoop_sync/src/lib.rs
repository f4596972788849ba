//! Export WHOOP sleep, workout, recovery and cycle records to local
//! newline-delimited JSON logs.

pub mod cli;
pub mod logging;
pub mod prompt;
pub mod runner;
pub mod settings;
pub mod telemetry;

pub use cli::Args;
pub use prompt::{ReaderPrompt, StdinPrompt};
pub use runner::{ResourceOutcome, SyncSummary, run_sync};
