use haptic_gateway::Settings;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load settings: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = haptic_gateway::serve(settings).await {
        log::error!("Server error: {e}");
        std::process::exit(1);
    }
}
