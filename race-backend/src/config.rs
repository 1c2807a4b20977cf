use std::{env, path::PathBuf};

use clap::Parser;

/// Server settings. Every flag can also come from the environment (or a
/// `.env` file loaded by `main`).
#[derive(Debug, Clone, Parser)]
#[command(name = "race-backend", about = "Shared syllabus race progress server")]
pub struct Config {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory holding `progress.json`. Defaults to `/data` on Render and
    /// `./data` elsewhere.
    #[arg(long, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Explicit path of the progress document; overrides `--data-dir`.
    #[arg(long, env = "PROGRESS_FILE")]
    pub progress_file: Option<PathBuf>,

    /// Front-end assets. Unknown paths fall back to `index.html` in here.
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    pub public_dir: PathBuf,
}

impl Config {
    pub fn progress_file(&self) -> PathBuf {
        if let Some(path) = &self.progress_file {
            return path.clone();
        }
        self.data_dir
            .clone()
            .unwrap_or_else(default_data_dir)
            .join("progress.json")
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_data_dir() -> PathBuf {
    if env::var_os("RENDER").is_some() {
        log::info!("RENDER is set, storing progress under /data");
        PathBuf::from("/data")
    } else {
        PathBuf::from("data")
    }
}
