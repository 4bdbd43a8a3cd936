#![cfg(not(tarpaulin_include))]

use clap::Parser;
use csv_uploader::app;
use csv_uploader::config::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; flags and the environment still apply.
    let _ = dotenvy::dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::parse();
    log::info!(
        "starting csv-uploader (page size {}, trailing lines {:?})",
        settings.page_size,
        settings.trailing_lines
    );

    app::run(settings).await
}
