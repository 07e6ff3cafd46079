use anyhow::Result;
use colored::Colorize;
use lease_quote::{config, pricing::UserRole};
use std::path::Path;

/// Execute the test command
///
/// This validates the configuration file without starting the server
pub fn execute(config_path: &Path) -> Result<()> {
    println!("{}", "Testing configuration...".yellow());

    let cfg = config::load_config(config_path)?;

    println!("{}", "✓ Configuration test successful".green());
    println!();

    println!("{}", "Configuration Summary:".bold());
    println!("  {}: {}:{}", "Server".cyan(), cfg.server.host, cfg.server.port);
    println!("  {}: {}", "Log Level".cyan(), cfg.server.log_level);
    println!("  {}: {}", "Log Format".cyan(), cfg.server.log_format);
    println!("  {}: {}", "Database".cyan(), cfg.database.path);
    println!();

    println!("  {}: {}", "Users".cyan(), cfg.users.len());
    for (idx, user) in cfg.users.iter().enumerate() {
        let status = if user.enabled {
            "enabled".green()
        } else {
            "disabled".red()
        };
        let role = match user.role {
            UserRole::Admin => "admin".to_string(),
            UserRole::Partner => format!("partner, {}% commission", user.commission_percentage),
        };
        println!("    {}. {} [{}] ({})", idx + 1, user.name, role, status);
    }

    Ok(())
}
