use anyhow::Context;
use clap::Parser;
use race_backend::{config::Config, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    start_server(config).await.context("Server failed")
}
