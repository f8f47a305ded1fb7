use kitchen_server::{Config, Server, ServerState, init_logger_with_file, print_banner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (.env is optional)
    dotenv::dotenv().ok();
    let config = Config::from_env();

    // 2. Logging (console + rotating files under the work dir)
    let log_dir = config.log_dir();
    init_logger_with_file(&config.log_level, config.log_json, Some(&log_dir))?;

    print_banner();
    tracing::info!(
        environment = %config.environment,
        source = %config.order_source_url,
        poll_interval_ms = config.poll_interval_ms,
        "Kitchen server starting..."
    );

    // 3. State (store + source)
    let state = ServerState::initialize(&config)?;

    // 4. HTTP server (starts background tasks, stops them on shutdown)
    if let Err(e) = Server::new(state).run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
