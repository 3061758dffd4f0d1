//! `learncoach config`: Print configuration.

use learncoach_config::AppConfig;

/// Effective configuration as TOML, with the API key masked.
fn render(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut redacted = config.clone();
    if redacted.api_key.is_some() {
        redacted.api_key = Some("***".into());
    }
    toml::to_string_pretty(&redacted)
}

pub fn show(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render(config)?);
    Ok(())
}

pub fn show_default() {
    println!("{}", AppConfig::default_toml());
}
