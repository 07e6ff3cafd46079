use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use lease_quote::{
    config,
    handlers::settings::validate_rate_update,
    pricing::{
        models::{RateTableUpdate, LEASE_TERMS},
        LeaseRateFactorsData, PricingService,
    },
    server::connect_database,
};
use std::path::Path;

/// Open the configured database and warm a pricing service from it
pub async fn open_pricing(config_path: &Path) -> Result<PricingService> {
    let cfg = config::load_config(config_path)?;
    let pool = connect_database(&cfg.database.path).await?;
    let pricing = PricingService::new(pool);
    pricing.load_cache().await?;
    Ok(pricing)
}

/// Import a rate table file through the regular admin update path
pub async fn import(config_path: &Path, file: &Path, actor: &str) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let update: RateTableUpdate = serde_json::from_str(&content)
        .with_context(|| format!("Invalid rate table in {}", file.display()))?;
    validate_rate_update(&update)?;

    let pricing = open_pricing(config_path).await?;
    let data = pricing.update_rates(update, actor).await?;

    println!(
        "{} {} rate keys imported by {}",
        "✓".green(),
        data.rates.len(),
        actor
    );
    Ok(())
}

/// Print the stored rate table
pub async fn show(config_path: &Path) -> Result<()> {
    let pricing = open_pricing(config_path).await?;
    let data = pricing.rate_data();

    if data.rates.is_empty() {
        println!("{}", "No lease rate factors configured".yellow());
        return Ok(());
    }

    println!("{}", rate_table(&data));
    println!(
        "  {}: {}",
        "Non-return uplift".cyan(),
        data.non_return_uplift_factor
    );
    println!("  {}: {:.2}", "Packing fee".cyan(), data.packing_service_cost);
    if let (Some(at), Some(by)) = (&data.last_updated_at, &data.last_updated_by) {
        println!("  {}: {} by {}", "Last update".cyan(), at.to_rfc3339(), by);
    }
    Ok(())
}

/// Key by term grid; terms a key does not define stay blank
fn rate_table(data: &LeaseRateFactorsData) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![Cell::new("KEY").fg(Color::Cyan)];
    header.extend(
        LEASE_TERMS
            .iter()
            .map(|term| Cell::new(format!("{} M", term)).fg(Color::Cyan)),
    );
    table.set_header(header);

    for (key, row) in &data.rates {
        let mut cells = vec![Cell::new(key)];
        cells.extend(LEASE_TERMS.iter().map(|term| match row.get(term) {
            Some(factor) => Cell::new(format!("{:.4}", factor)),
            None => Cell::new(""),
        }));
        table.add_row(cells);
    }

    table
}
