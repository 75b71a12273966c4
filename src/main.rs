use kaizen_agent::{app, persona::presets, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = Config::from_env();
    if let Err(e) = kaizen_agent::tracing::init_tracing("kaizen-agent", config.log_format) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let persona = presets::consultant(config.model.clone());
    let status = app::launch(config, persona).await;

    // Exit directly: the blocking stdin reader would otherwise hold up runtime shutdown
    std::process::exit(i32::from(status.code()));
}
