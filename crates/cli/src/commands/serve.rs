//! `learncoach serve`: Start the HTTP gateway.

use learncoach_config::AppConfig;

pub async fn run(
    mut config: AppConfig,
    port_override: Option<u16>,
    host_override: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    if let Some(host) = host_override {
        config.gateway.host = host;
    }

    println!("📚 LearnCoach Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {} ({})", config.provider, config.model);

    learncoach_gateway::start(config).await?;

    Ok(())
}
