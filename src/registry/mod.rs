//! Tracked-product registry.
//!
//! A JSON file `{"products": [...]}` holding the products to check each
//! cycle, their alert thresholds and channels. Every operation reads the file,
//! applies the change and writes it back, so the file can be edited by hand
//! between cycles.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_ALERT_CHANNEL;
use crate::error_handling::RegistryError;

fn default_channels() -> Vec<String> {
    vec![DEFAULT_ALERT_CHANNEL.to_string()]
}

fn default_enabled() -> bool {
    true
}

/// One tracked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedProduct {
    /// Site item identifier
    pub asin: String,
    /// Display name
    pub name: String,
    /// Price alert fires when the price is at or below this value
    #[serde(default)]
    pub target_price: Option<f64>,
    /// Whether an in-stock alert is wanted
    #[serde(default)]
    pub stock_alert: bool,
    /// Channel names alerts are sent to
    #[serde(default = "default_channels")]
    pub alert_channels: Vec<String>,
    /// Disabled products are skipped by the cycle
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Creation time (RFC 3339)
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last successful check (`%Y-%m-%d %H:%M:%S`, local time)
    #[serde(default)]
    pub last_checked: Option<String>,
}

impl TrackedProduct {
    /// Creates an enabled product with the default alert channel.
    pub fn new(asin: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            asin: asin.into().trim().to_string(),
            name: name.into().trim().to_string(),
            target_price: None,
            stock_alert: false,
            alert_channels: default_channels(),
            enabled: true,
            created_at: Some(chrono::Local::now().to_rfc3339()),
            last_checked: None,
        }
    }

    /// Sets the target price.
    pub fn with_target_price(mut self, target_price: Option<f64>) -> Self {
        self.target_price = target_price;
        self
    }

    /// Enables or disables the back-in-stock alert.
    pub fn with_stock_alert(mut self, stock_alert: bool) -> Self {
        self.stock_alert = stock_alert;
        self
    }

    /// Replaces the alert channels; an empty list keeps the default.
    pub fn with_channels(mut self, channels: Vec<String>) -> Self {
        if !channels.is_empty() {
            self.alert_channels = channels;
        }
        self
    }
}

/// Counts reported by [`ProductRegistry::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// All products
    pub total: usize,
    /// Products checked each cycle
    pub enabled: usize,
    /// Products skipped by cycles
    pub disabled: usize,
    /// Products with a target price
    pub with_target_price: usize,
    /// Products with a stock alert
    pub with_stock_alert: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    products: Vec<TrackedProduct>,
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(default)]
    asin: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    target_price: String,
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    asin: &'a str,
    name: &'a str,
    target_price: Option<f64>,
    stock_alert: bool,
    enabled: bool,
}

/// JSON-backed product list.
#[derive(Debug, Clone)]
pub struct ProductRegistry {
    path: PathBuf,
}

impl ProductRegistry {
    /// Opens the registry at `path`, creating the file (and its directory)
    /// with an empty product list when missing.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Io` if the directory or file cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let registry = Self {
            path: path.as_ref().to_path_buf(),
        };
        if let Some(parent) = registry.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if !registry.path.exists() {
            registry.save_products(&[])?;
        }
        Ok(registry)
    }

    /// Registry file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All products, enabled or not, in file order.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load_products(&self) -> Result<Vec<TrackedProduct>, RegistryError> {
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let file: RegistryFile = serde_json::from_str(&content)?;
        Ok(file.products)
    }

    /// Replaces the whole product list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_products(&self, products: &[TrackedProduct]) -> Result<(), RegistryError> {
        let file = RegistryFile {
            products: products.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Adds a product.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateAsin` if the ASIN is already tracked.
    pub fn add_product(&self, product: TrackedProduct) -> Result<(), RegistryError> {
        let mut products = self.load_products()?;
        if products.iter().any(|p| p.asin == product.asin) {
            return Err(RegistryError::DuplicateAsin(product.asin));
        }
        log::info!("Tracking {} ({})", product.name, product.asin);
        products.push(product);
        self.save_products(&products)
    }

    /// Applies `change` to the product with `asin`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if no product has this ASIN.
    pub fn update_product<F>(&self, asin: &str, change: F) -> Result<TrackedProduct, RegistryError>
    where
        F: FnOnce(&mut TrackedProduct),
    {
        let mut products = self.load_products()?;
        let product = products
            .iter_mut()
            .find(|p| p.asin == asin)
            .ok_or_else(|| RegistryError::NotFound(asin.to_string()))?;
        change(product);
        let updated = product.clone();
        self.save_products(&products)?;
        Ok(updated)
    }

    /// Stamps the last successful check of a product.
    pub fn update_last_checked(&self, asin: &str, timestamp: &str) -> Result<(), RegistryError> {
        self.update_product(asin, |p| p.last_checked = Some(timestamp.to_string()))
            .map(|_| ())
    }

    /// Removes a product.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if no product has this ASIN.
    pub fn delete_product(&self, asin: &str) -> Result<(), RegistryError> {
        let mut products = self.load_products()?;
        let before = products.len();
        products.retain(|p| p.asin != asin);
        if products.len() == before {
            return Err(RegistryError::NotFound(asin.to_string()));
        }
        self.save_products(&products)
    }

    /// Flips the enabled flag and returns the new state.
    pub fn toggle_product(&self, asin: &str) -> Result<bool, RegistryError> {
        let updated = self.update_product(asin, |p| p.enabled = !p.enabled)?;
        log::info!(
            "Product {} {}",
            asin,
            if updated.enabled { "enabled" } else { "disabled" }
        );
        Ok(updated.enabled)
    }

    /// Product with `asin`, if tracked.
    pub fn get_product(&self, asin: &str) -> Result<Option<TrackedProduct>, RegistryError> {
        Ok(self.load_products()?.into_iter().find(|p| p.asin == asin))
    }

    /// Products the cycle should check.
    pub fn enabled_products(&self) -> Result<Vec<TrackedProduct>, RegistryError> {
        Ok(self
            .load_products()?
            .into_iter()
            .filter(|p| p.enabled)
            .collect())
    }

    /// Imports products from a CSV with columns `asin,name,target_price`.
    ///
    /// Rows without ASIN or name are skipped. An unparseable target price is
    /// logged and imported as no target. Already tracked ASINs are skipped.
    ///
    /// # Returns
    ///
    /// The number of products added.
    ///
    /// # Errors
    ///
    /// Returns an error if the CSV cannot be opened or the registry written.
    pub fn import_csv(&self, csv_path: impl AsRef<Path>) -> Result<usize, RegistryError> {
        let mut reader = csv::Reader::from_path(csv_path.as_ref())?;
        let mut products = self.load_products()?;
        let mut added = 0;

        for row in reader.deserialize::<ImportRow>() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    log::warn!("Skipping malformed CSV row: {e}");
                    continue;
                }
            };
            let asin = row.asin.trim();
            let name = row.name.trim();
            if asin.is_empty() || name.is_empty() {
                continue;
            }
            if products.iter().any(|p| p.asin == asin) {
                log::warn!("Product {asin} already exists, skipping");
                continue;
            }

            let price_text = row.target_price.trim();
            let target_price = if price_text.is_empty() {
                None
            } else {
                match price_text.parse::<f64>() {
                    Ok(price) => Some(price),
                    Err(_) => {
                        log::warn!("Invalid target price for {asin}: {price_text}");
                        None
                    }
                }
            };

            products.push(TrackedProduct::new(asin, name).with_target_price(target_price));
            added += 1;
        }

        self.save_products(&products)?;
        log::info!(
            "Imported {} products from {}",
            added,
            csv_path.as_ref().display()
        );
        Ok(added)
    }

    /// Exports `asin,name,target_price,stock_alert,enabled` rows.
    ///
    /// Nothing is written when the registry is empty.
    ///
    /// # Returns
    ///
    /// The number of products exported.
    pub fn export_csv(&self, csv_path: impl AsRef<Path>) -> Result<usize, RegistryError> {
        let products = self.load_products()?;
        if products.is_empty() {
            log::warn!("No products to export");
            return Ok(0);
        }

        let mut writer = csv::Writer::from_path(csv_path.as_ref())?;
        for product in &products {
            writer.serialize(ExportRow {
                asin: &product.asin,
                name: &product.name,
                target_price: product.target_price,
                stock_alert: product.stock_alert,
                enabled: product.enabled,
            })?;
        }
        writer.flush()?;
        Ok(products.len())
    }

    /// Counts by status and alert settings.
    pub fn stats(&self) -> Result<RegistryStats, RegistryError> {
        let products = self.load_products()?;
        let enabled = products.iter().filter(|p| p.enabled).count();
        Ok(RegistryStats {
            total: products.len(),
            enabled,
            disabled: products.len() - enabled,
            with_target_price: products.iter().filter(|p| p.target_price.is_some()).count(),
            with_stock_alert: products.iter().filter(|p| p.stock_alert).count(),
        })
    }

    /// Removes every product.
    pub fn clear(&self) -> Result<(), RegistryError> {
        self.save_products(&[])
    }
}
