mod app;
mod config;
mod core;
mod game;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // --- Logging Setup ---
    // Logger goes in first; the real level arrives with the config.
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    log::set_max_level(log::LevelFilter::Warn);

    // --- Configuration ---
    config::load();
    log::set_max_level(config::get().log_level.as_level_filter());
    log::info!("Railbeat starting...");

    // --- Run Application ---
    app::run()
}
