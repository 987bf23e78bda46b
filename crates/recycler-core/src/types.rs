//! ============================================================================
//! Core Types for the Storefront
//! ============================================================================
//! Defines catalog records, checkout enums, chat messages and the shared
//! error type. These types serialize to JSON for the catalog config and for
//! any presentation layer sitting on top of the core.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Catalog item identifier (e.g. "rtx-4090-reforged")
pub type ItemId = String;

/// Result alias used throughout the core
pub type ShopResult<T> = Result<T, ShopError>;

/// Closed set of catalog categories.
/// Logic matches on the variant; `label()` is only for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GraphicsCard,
    Processor,
    Monitor,
    Keyboard,
    Mouse,
    SupplyCase,
    WalletCredit,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::GraphicsCard,
        Category::Processor,
        Category::Monitor,
        Category::Keyboard,
        Category::Mouse,
        Category::SupplyCase,
        Category::WalletCredit,
    ];

    /// Human-readable label shown in the storefront
    pub fn label(&self) -> &'static str {
        match self {
            Category::GraphicsCard => "Graphics Cards",
            Category::Processor => "Processors",
            Category::Monitor => "Displays",
            Category::Keyboard => "Keyboards",
            Category::Mouse => "Mouse",
            Category::SupplyCase => "Supply Cases",
            Category::WalletCredit => "Steam Balance",
        }
    }

    /// Supply cases are the only openable containers
    pub fn is_container(&self) -> bool {
        matches!(self, Category::SupplyCase)
    }

    /// Whether items of this category can drop out of a supply case.
    /// Wallet credit never appears on the reel.
    pub fn is_reward_eligible(&self) -> bool {
        !matches!(self, Category::SupplyCase | Category::WalletCredit)
    }

    /// Parse a CLI-style slug ("gpu", "graphics-card", "case", ...)
    pub fn from_slug(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "gpu" | "graphics_card" | "graphics_cards" => Some(Category::GraphicsCard),
            "cpu" | "processor" | "processors" => Some(Category::Processor),
            "monitor" | "display" | "displays" => Some(Category::Monitor),
            "keyboard" | "keyboards" => Some(Category::Keyboard),
            "mouse" => Some(Category::Mouse),
            "case" | "supply_case" | "supply_cases" => Some(Category::SupplyCase),
            "wallet" | "wallet_credit" | "steam_balance" => Some(Category::WalletCredit),
            _ => None,
        }
    }
}

/// Item rarity tier, ordered from most to least common
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Mythical,
    Legendary,
}

impl Rarity {
    pub fn display_name(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Mythical => "mythical",
            Rarity::Legendary => "legendary",
        }
    }
}

/// Label/value spec row on a product sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub label: String,
    pub value: String,
}

/// Field report left on a catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub user: String,
    pub rating: u8,
    pub comment: String,
    /// ISO date (YYYY-MM-DD)
    pub date: String,
}

/// Immutable catalog record, created once from static configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub category: Category,
    pub price: f64,
    #[serde(default)]
    pub rarity: Option<Rarity>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specs: Vec<Specification>,
    /// Percentage of recycled material (0-100)
    #[serde(default)]
    pub recycled_content: u8,
    #[serde(default)]
    pub is_upcycled: bool,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub reviews_count: u32,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl CatalogItem {
    /// Minimal constructor; the remaining fields take their defaults
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, category: Category, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            price,
            rarity: None,
            description: String::new(),
            specs: Vec::new(),
            recycled_content: 0,
            is_upcycled: false,
            is_recommended: false,
            rating: 0.0,
            reviews_count: 0,
            reviews: Vec::new(),
        }
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = Some(rarity);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_container(&self) -> bool {
        self.category.is_container()
    }
}

/// Closed set of supported payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Qris,
    GoPay,
    Dana,
    PayPal,
    SeaBank,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Qris,
        PaymentMethod::GoPay,
        PaymentMethod::Dana,
        PaymentMethod::PayPal,
        PaymentMethod::SeaBank,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Qris => "QRIS Universal",
            PaymentMethod::GoPay => "GoPay Wallet",
            PaymentMethod::Dana => "DANA Balance",
            PaymentMethod::PayPal => "PayPal Global",
            PaymentMethod::SeaBank => "SeaBank Transfer",
        }
    }

    /// Short CLI-style name ("qris", "gopay", ...)
    pub fn slug(&self) -> &'static str {
        match self {
            PaymentMethod::Qris => "qris",
            PaymentMethod::GoPay => "gopay",
            PaymentMethod::Dana => "dana",
            PaymentMethod::PayPal => "paypal",
            PaymentMethod::SeaBank => "seabank",
        }
    }

    pub fn from_slug(s: &str) -> Option<Self> {
        let needle = s.trim().to_lowercase().replace(['-', '_', ' '], "");
        Self::ALL.into_iter().find(|method| method.slug() == needle)
    }
}

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Error types for the storefront core.
/// Every variant is recoverable and meant to be shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum ShopError {
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    #[error("Invalid item {id}: {reason}")]
    InvalidItem { id: ItemId, reason: String },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Operation already in progress: {0}")]
    AlreadyInProgress(String),

    #[error("External call failed: {0}")]
    ExternalCallFailure(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("No reward items available in the catalog")]
    EmptyRewardPool,

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarity_ordering() {
        assert!(Rarity::Common < Rarity::Uncommon);
        assert!(Rarity::Uncommon < Rarity::Rare);
        assert!(Rarity::Rare < Rarity::Mythical);
        assert!(Rarity::Mythical < Rarity::Legendary);
    }

    #[test]
    fn test_only_supply_cases_are_containers() {
        for category in Category::ALL {
            assert_eq!(category.is_container(), category == Category::SupplyCase);
        }
    }

    #[test]
    fn test_reward_eligibility_excludes_cases_and_credit() {
        assert!(!Category::SupplyCase.is_reward_eligible());
        assert!(!Category::WalletCredit.is_reward_eligible());
        assert!(Category::GraphicsCard.is_reward_eligible());
        assert!(Category::Mouse.is_reward_eligible());
    }

    #[test]
    fn test_category_slug_parsing() {
        assert_eq!(Category::from_slug("gpu"), Some(Category::GraphicsCard));
        assert_eq!(Category::from_slug("Supply-Cases"), Some(Category::SupplyCase));
        assert_eq!(Category::from_slug("steam balance"), Some(Category::WalletCredit));
        assert_eq!(Category::from_slug("toaster"), None);
    }

    #[test]
    fn test_label_is_separate_from_serialized_name() {
        let json = serde_json::to_string(&Category::SupplyCase).unwrap();
        assert_eq!(json, "\"supply_case\"");
        assert_eq!(Category::SupplyCase.label(), "Supply Cases");
    }

    #[test]
    fn test_catalog_item_json_defaults() {
        let item: CatalogItem = serde_json::from_value(serde_json::json!({
            "id": "gpuX",
            "name": "GPU X",
            "category": "graphics_card",
            "price": 500.0
        }))
        .unwrap();
        assert_eq!(item.rarity, None);
        assert!(item.reviews.is_empty());
        assert!(!item.is_container());
    }

    #[test]
    fn test_payment_method_slugs() {
        for method in PaymentMethod::ALL {
            assert_eq!(PaymentMethod::from_slug(method.slug()), Some(method));
        }
        assert_eq!(PaymentMethod::from_slug("Go-Pay"), Some(PaymentMethod::GoPay));
        assert_eq!(PaymentMethod::from_slug("Sea Bank"), Some(PaymentMethod::SeaBank));
        assert_eq!(PaymentMethod::from_slug("cash"), None);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(ShopError::NotFound("x".into()).to_string(), "Item not found: x");
        assert_eq!(ShopError::EmptyCart.to_string(), "Cart is empty");
        assert_eq!(
            ShopError::Config("bad band".into()).to_string(),
            "Invalid configuration: bad band"
        );
    }
}
