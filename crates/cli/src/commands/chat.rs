//! `learncoach chat`: Run a single turn without the HTTP server.

use learncoach_agent::Coordinator;
use learncoach_config::AppConfig;

pub async fn run(
    config: AppConfig,
    message: String,
    user: Option<String>,
    agent: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.missing_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    GEMINI_API_KEY      (Google AI Studio key)");
        eprintln!("    LEARNCOACH_API_KEY  (any provider)");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let user_id = user.unwrap_or_else(|| config.learning.default_user_id.clone());
    let coordinator = Coordinator::from_config(&config)?;

    let outcome = coordinator
        .handle_turn(agent.as_deref(), &message, &user_id)
        .await;
    let (agent_used, response) = match outcome {
        Ok(turn) => {
            let text = turn.text();
            (turn.agent, text)
        }
        Err(e) => (agent.unwrap_or_default(), e.to_string()),
    };

    println!("[{agent_used}]");
    println!("{response}");
    Ok(())
}
