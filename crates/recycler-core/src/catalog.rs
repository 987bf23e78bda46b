//! ============================================================================
//! Catalog - Static Item Data
//! ============================================================================
//! Immutable list of storefront items. Built once at startup (either the
//! builtin catalog or a JSON config file) and shared read-only afterwards.
//! ============================================================================

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::types::*;

/// Immutable item catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and negative prices
    pub fn new(items: Vec<CatalogItem>) -> ShopResult<Self> {
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id.as_str()) {
                return Err(ShopError::Catalog(format!("duplicate item id '{}'", item.id)));
            }
            if item.price.is_nan() || item.price < 0.0 {
                return Err(ShopError::Catalog(format!(
                    "item '{}' has invalid price {}",
                    item.id, item.price
                )));
            }
        }

        debug!("Catalog built with {} items", items.len());
        Ok(Self { items })
    }

    /// Parse a catalog from a JSON array of items
    pub fn from_json(json: &str) -> Result<Self> {
        let items: Vec<CatalogItem> =
            serde_json::from_str(json).context("Failed to parse catalog JSON")?;
        Ok(Self::new(items)?)
    }

    /// Load a catalog JSON file from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read catalog {}: {}", path.display(), e))?;
        let catalog = Self::from_json(&raw)?;
        info!("Loaded {} catalog items from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// The storefront's default catalog
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Look up an item or fail with `NotFound`
    pub fn require(&self, id: &str) -> ShopResult<&CatalogItem> {
        self.get(id).ok_or_else(|| ShopError::NotFound(id.to_string()))
    }

    pub fn price_of(&self, id: &str) -> Option<f64> {
        self.get(id).map(|item| item.price)
    }

    pub fn by_category(&self, category: Category) -> Vec<&CatalogItem> {
        self.items.iter().filter(|item| item.category == category).collect()
    }

    /// Case-insensitive match on name or description
    pub fn search(&self, query: &str) -> Vec<&CatalogItem> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.items.iter().collect();
        }
        self.items
            .iter()
            .filter(|item| {
                item.name.to_lowercase().contains(&needle)
                    || item.description.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn recommended(&self) -> Vec<&CatalogItem> {
        self.items.iter().filter(|item| item.is_recommended).collect()
    }

    /// Items that can drop out of a supply case
    pub fn reward_pool(&self) -> Vec<&CatalogItem> {
        self.items
            .iter()
            .filter(|item| item.category.is_reward_eligible())
            .collect()
    }

    /// Sum of prices for a list of ids; unknown ids count as zero
    pub fn total_of<'a>(&self, ids: impl IntoIterator<Item = &'a ItemId>) -> f64 {
        ids.into_iter().filter_map(|id| self.price_of(id)).sum()
    }
}

fn spec(label: &str, value: &str) -> Specification {
    Specification { label: label.to_string(), value: value.to_string() }
}

static BUILTIN: Lazy<Catalog> = Lazy::new(|| Catalog { items: builtin_items() });

fn builtin_items() -> Vec<CatalogItem> {
    vec![
        CatalogItem {
            specs: vec![spec("VRAM", "24GB GDDR6X"), spec("TDP", "450W")],
            recycled_content: 35,
            is_upcycled: true,
            is_recommended: true,
            rating: 4.9,
            reviews_count: 128,
            reviews: vec![Review {
                id: "r-4090-1".into(),
                user: "Rizky".into(),
                rating: 5,
                comment: "Runs cooler than my new one ever did.".into(),
                date: "2025-01-12".into(),
            }],
            ..CatalogItem::new("rtx-4090-reforged", "RTX 4090 Reforged", Category::GraphicsCard, 1499.0)
                .with_rarity(Rarity::Legendary)
                .with_description("Flagship card rebuilt with reclaimed heatsinks and fresh thermal pads.")
        },
        CatalogItem {
            specs: vec![spec("VRAM", "16GB GDDR6"), spec("TDP", "263W")],
            recycled_content: 40,
            is_upcycled: true,
            rating: 4.6,
            reviews_count: 64,
            ..CatalogItem::new("rx-6800-revival", "RX 6800 Revival", Category::GraphicsCard, 389.0)
                .with_rarity(Rarity::Rare)
                .with_description("Mining-rig veteran, fully re-pasted and stress tested.")
        },
        CatalogItem {
            specs: vec![spec("Cores", "16"), spec("Boost", "5.7GHz")],
            recycled_content: 20,
            is_recommended: true,
            rating: 4.8,
            reviews_count: 90,
            ..CatalogItem::new("ryzen-9-salvage", "Ryzen 9 7950X Salvage", Category::Processor, 459.0)
                .with_rarity(Rarity::Mythical)
                .with_description("Pulled from decommissioned render nodes, binned and verified.")
        },
        CatalogItem {
            specs: vec![spec("Cores", "6"), spec("Boost", "4.4GHz")],
            recycled_content: 25,
            is_upcycled: true,
            rating: 4.2,
            reviews_count: 41,
            ..CatalogItem::new("i5-office-rescue", "Core i5-12400 Office Rescue", Category::Processor, 99.0)
                .with_rarity(Rarity::Common)
                .with_description("Office fleet surplus. Quiet, efficient, dependable.")
        },
        CatalogItem {
            specs: vec![spec("Panel", "27\" IPS"), spec("Refresh", "165Hz")],
            recycled_content: 55,
            is_upcycled: true,
            rating: 4.5,
            reviews_count: 37,
            ..CatalogItem::new("monitor-27-phoenix", "Phoenix 27\" 165Hz", Category::Monitor, 219.0)
                .with_rarity(Rarity::Uncommon)
                .with_description("Refurbished panel in a reclaimed aluminium shell.")
        },
        CatalogItem {
            specs: vec![spec("Switch", "Linear"), spec("Layout", "75%")],
            recycled_content: 70,
            is_upcycled: true,
            rating: 4.7,
            reviews_count: 52,
            ..CatalogItem::new("kb-scrap-75", "Scrapyard 75 Keyboard", Category::Keyboard, 129.0)
                .with_rarity(Rarity::Rare)
                .with_description("Case milled from recycled server rack rails.")
        },
        CatalogItem {
            specs: vec![spec("Sensor", "26K DPI"), spec("Weight", "58g")],
            recycled_content: 60,
            rating: 4.4,
            reviews_count: 29,
            ..CatalogItem::new("mouse-ghost-lite", "Ghost Lite Mouse", Category::Mouse, 59.0)
                .with_rarity(Rarity::Uncommon)
                .with_description("Lightweight shell printed from reclaimed PET.")
        },
        CatalogItem {
            rating: 4.3,
            reviews_count: 210,
            ..CatalogItem::new("case-alpha", "Alpha Supply Case", Category::SupplyCase, 25.0)
                .with_rarity(Rarity::Common)
                .with_description("Sealed supply node with a random hardware drop.")
        },
        CatalogItem {
            rating: 4.6,
            reviews_count: 88,
            ..CatalogItem::new("case-omega", "Omega Supply Case", Category::SupplyCase, 75.0)
                .with_rarity(Rarity::Legendary)
                .with_description("High-tier supply node. Same drop table, better bragging rights.")
        },
        CatalogItem {
            rating: 4.9,
            reviews_count: 300,
            ..CatalogItem::new("steam-wallet-20", "Steam Wallet $20", Category::WalletCredit, 20.0)
                .with_description("Digital wallet credit code.")
        },
    ]
}
