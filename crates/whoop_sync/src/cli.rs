use clap::Parser;
use std::path::PathBuf;
use whoop_client::{Config, Resource};

#[derive(Debug, Parser)]
#[command(
    name = "whoop-sync",
    version,
    about = "Export WHOOP records to local JSON line logs"
)]
pub struct Args {
    /// Collection to export; repeat for several. Defaults to sleep and workout.
    #[arg(short, long = "resource", value_name = "NAME")]
    pub resources: Vec<Resource>,

    /// Export every known collection.
    #[arg(long, conflicts_with = "resources")]
    pub all: bool,

    /// Credential file, overriding WHOOP_TOKEN_FILE.
    #[arg(long, value_name = "PATH")]
    pub token_file: Option<PathBuf>,

    /// Directory the `<resource>.log` files are appended to.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// dotenv file holding client credentials.
    #[arg(long, value_name = "PATH", default_value = ".env")]
    pub env_file: PathBuf,

    /// Retries for transient page failures (5xx, 429, connection errors).
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Write request and record counters in Prometheus text format here.
    #[arg(long, value_name = "PATH")]
    pub metrics_file: Option<PathBuf>,
}

impl Args {
    pub fn selected_resources(&self) -> Vec<Resource> {
        if self.all {
            Resource::ALL.to_vec()
        } else if self.resources.is_empty() {
            Resource::DEFAULT.to_vec()
        } else {
            self.resources.clone()
        }
    }

    /// Command line flags win over environment and dotenv values.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.token_file {
            config.token_file = path.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
    }
}
