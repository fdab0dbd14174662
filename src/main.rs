// Entrypoint for the catalog console client.
// Keeps `main` small: set up logging, build the API client and hand it to
// the menu loop.

use anyhow::Context;
use catalog_cli::{api::ApiClient, dispatcher::Dispatcher, ui};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with menu output.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // `CATALOG_API_URL` or http://localhost. See `config::Config::from_env`.
    let api = ApiClient::from_env().context("Failed to configure API client")?;
    info!(url = api.url(), "using catalog API");

    let dispatcher = Dispatcher::new(api);
    let mut prompter = ui::DialoguerPrompter;
    let stdout = std::io::stdout();
    ui::run_menu(&dispatcher, &mut prompter, &mut stdout.lock())?;
    Ok(())
}
