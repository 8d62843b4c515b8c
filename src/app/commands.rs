//! Registry management commands (`--import-csv`, `--export-csv`, `--list`).

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::registry::{ProductRegistry, TrackedProduct};

/// Imports products from `csv_path` and prints how many were added.
pub fn import_products(registry: &ProductRegistry, csv_path: &Path) -> Result<usize> {
    let added = registry
        .import_csv(csv_path)
        .with_context(|| format!("Failed to import products from {}", csv_path.display()))?;
    println!(
        "{} Imported {} product{} from {}",
        "✓".green(),
        added,
        if added == 1 { "" } else { "s" },
        csv_path.display()
    );
    Ok(added)
}

/// Exports every product to `csv_path` and prints how many were written.
pub fn export_products(registry: &ProductRegistry, csv_path: &Path) -> Result<usize> {
    let exported = registry
        .export_csv(csv_path)
        .with_context(|| format!("Failed to export products to {}", csv_path.display()))?;
    if exported == 0 {
        println!("{} No products to export", "!".yellow());
    } else {
        println!(
            "{} Exported {} product{} to {}",
            "✓".green(),
            exported,
            if exported == 1 { "" } else { "s" },
            csv_path.display()
        );
    }
    Ok(exported)
}

/// Prints every tracked product and the registry totals.
pub fn list_products(registry: &ProductRegistry) -> Result<()> {
    let products = registry
        .load_products()
        .context("Failed to load product registry")?;
    if products.is_empty() {
        println!("No products tracked yet. Import some with --import-csv.");
        return Ok(());
    }

    println!("{}", format!("Tracked products ({}):", products.len()).bold());
    for product in &products {
        println!("{}", format_product_line(product));
    }

    let stats = registry.stats().context("Failed to compute registry stats")?;
    println!(
        "\n{} enabled, {} disabled, {} with target price, {} with stock alert",
        stats.enabled, stats.disabled, stats.with_target_price, stats.with_stock_alert
    );
    Ok(())
}

fn format_product_line(product: &TrackedProduct) -> String {
    let status = if product.enabled {
        "on ".green()
    } else {
        "off".red()
    };
    let target = product
        .target_price
        .map(|p| format!("target ${p:.2}"))
        .unwrap_or_else(|| "no target".to_string());
    let last_checked = product.last_checked.as_deref().unwrap_or("never");
    format!(
        "  [{}] {} {} | {} | stock alert: {} | channels: {} | last checked: {}",
        status,
        product.asin.cyan(),
        product.name,
        target,
        if product.stock_alert { "yes" } else { "no" },
        product.alert_channels.join(","),
        last_checked
    )
}
