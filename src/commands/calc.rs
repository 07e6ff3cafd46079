use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use lease_quote::pricing::{
    calculate_tco, item_costs,
    models::{ActingUser, Quote, UserRole},
    rate_table::{candidate_keys, resolve_factor},
    summarize_quote, LeaseRateFactorsData, NamedOptionSummary, TcoResult, TcoSettings,
};
use serde::de::DeserializeOwned;
use std::path::Path;

use super::rates::open_pricing;

/// Price a quote file and print its options and TCO comparison
///
/// Rates and TCO settings come from the given files, falling back to the
/// records stored in the configured database.
pub async fn execute(
    config_path: &Path,
    quote_path: &Path,
    rates_path: Option<&Path>,
    tco_path: Option<&Path>,
    commission: f64,
) -> Result<()> {
    let quote: Quote = read_json(quote_path)?;

    let records: (LeaseRateFactorsData, TcoSettings) = match (rates_path, tco_path) {
        (Some(rates), Some(tco)) => (read_json(rates)?, read_json(tco)?),
        (rates, tco) => {
            let pricing = open_pricing(config_path).await?;
            let rate_data = match rates {
                Some(path) => read_json(path)?,
                None => (*pricing.rate_data()).clone(),
            };
            let tco_settings = match tco {
                Some(path) => read_json(path)?,
                None => (*pricing.tco_settings()).clone(),
            };
            (rate_data, tco_settings)
        }
    };
    let (rate_data, tco_settings) = records;

    let user = ActingUser {
        name: "cli".to_string(),
        role: UserRole::Partner,
        commission_percentage: commission,
    };

    println!(
        "{} {} ({})",
        "Quote:".bold(),
        quote.customer_name,
        quote.status.as_str()
    );
    for option in &quote.options {
        println!();
        println!("{}", option.name.cyan());
        println!("{}", items_table(&option.items, &rate_data, commission));
    }

    println!();
    let summaries = summarize_quote(&quote, &rate_data, commission);
    println!("{}", summary_table(&summaries, &quote.currency));

    match calculate_tco(&quote, &rate_data, &tco_settings, &user) {
        Some(tco) => println!("{}", tco_table(&tco, &quote.currency)),
        None => println!("{}", "Quote has no items, TCO not available".yellow()),
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        header
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    table
}

fn items_table(
    items: &[lease_quote::pricing::CalculationItem],
    rate_data: &LeaseRateFactorsData,
    commission: f64,
) -> Table {
    let mut table = new_table(&[
        "ASSET", "TERM", "QTY", "RATE KEY", "FACTOR", "MONTHLY/UNIT", "MONTHLY", "LEASE TOTAL",
    ]);

    for item in items {
        let costs = item_costs(item, rate_data, commission);
        let source = resolve_factor(&rate_data.rates, &candidate_keys(item), item.lease_term)
            .map(|resolved| Cell::new(resolved.key))
            .unwrap_or_else(|| Cell::new("(none)").fg(Color::Red));

        table.add_row(vec![
            Cell::new(item.asset_type.as_str()),
            Cell::new(item.lease_term),
            Cell::new(item.quantity),
            source,
            Cell::new(format!("{:.5}", costs.factor)),
            Cell::new(format!("{:.2}", costs.monthly_hardware_cost_per_unit)),
            Cell::new(format!("{:.2}", costs.monthly_hardware_cost)),
            Cell::new(format!("{:.2}", costs.total_lease_cost)),
        ]);
    }

    table
}

fn summary_table(options: &[NamedOptionSummary], currency: &str) -> Table {
    let mut table = new_table(&[
        "OPTION",
        "ITEMS",
        "HARDWARE VALUE",
        "MONTHLY",
        "SERVICES",
        "LEASE TOTAL",
        "BUNDLED MONTHLY",
        "BUNDLED TOTAL",
    ]);

    for option in options {
        let s = &option.summary;
        table.add_row(vec![
            Cell::new(&option.name),
            Cell::new(option.item_count),
            Cell::new(money(s.total_hardware_value, currency)),
            Cell::new(money(s.total_monthly_cost, currency)),
            Cell::new(money(s.total_services_cost, currency)),
            Cell::new(money(s.total_lease_cost, currency)),
            Cell::new(money(s.bundled_monthly_cost, currency)),
            Cell::new(money(s.bundled_total_cost, currency)),
        ]);
    }

    table
}

fn tco_table(tco: &TcoResult, currency: &str) -> Table {
    let mut table = new_table(&["TCO", "VALUE"]);
    let rows = [
        ("Devices", tco.total_devices.to_string()),
        (
            "Average term",
            format!(
                "{:.1} months ({:.2} years)",
                tco.weighted_avg_term_months, tco.weighted_avg_term_years
            ),
        ),
        ("WACC", format!("{:.2}%", tco.wacc)),
        ("Purchase price", money(tco.total_purchase_price, currency)),
        ("Cost of capital", money(tco.cost_of_capital, currency)),
        ("Deployment", money(tco.total_deployment_cost, currency)),
        ("Support", money(tco.total_support_cost, currency)),
        ("Downtime", money(tco.total_downtime_cost, currency)),
        ("End-of-life disposal", money(tco.total_eold_cost, currency)),
        ("Residual value", money(-tco.total_residual_value, currency)),
        ("TCO purchase", money(tco.total_tco_for_purchase, currency)),
        ("TCO lease", money(tco.total_lease_cost, currency)),
        (
            "Savings",
            format!(
                "{} ({:.1}%)",
                money(tco.absolute_savings, currency),
                tco.savings_percentage * 100.0
            ),
        ),
    ];

    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    table
}

fn money(value: f64, currency: &str) -> String {
    format!("{:.2} {}", value, currency)
}
