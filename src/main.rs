mod app;
mod components;
mod config;
mod ledger;
mod logging;
mod ui;

use color_eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    let _log_guard = logging::init()?;
    let config_path = config::resolve_path();
    let app = app::App::new(config_path)?;
    let terminal = ratatui::init();
    let result = app.run(terminal);
    ratatui::restore();
    result
}
