//! ============================================================================
//! RECYCLER-CORE: Ijong Mechanics Storefront Engine
//! ============================================================================
//! In-memory commerce and reward logic behind the tech recycler storefront:
//! - Catalog and roster data
//! - Wishlist / cart / inventory collections
//! - Checkout state machine with a simulated payment gateway
//! - Supply case reward reel with an injected random source
//! - Persona-driven chat collaborator (Gemini) with timeout and fallback
//! ============================================================================

pub mod cancel;
pub mod catalog;
pub mod chat;
pub mod checkout;
pub mod collection;
pub mod config;
pub mod gateway;
pub mod reel;
pub mod reviews;
pub mod roster;
pub mod selection;
pub mod storefront;
pub mod tasks;
pub mod types;

// Re-export main types for convenience
pub use types::*;
pub use cancel::CancelToken;
pub use catalog::Catalog;
pub use chat::{ChatBackend, Conversation, GeminiClient, Persona};
pub use checkout::{CheckoutSession, CheckoutStep, PaymentOutcome, PaymentTicket, ShippingInfo};
pub use collection::CollectionState;
pub use config::ShopConfig;
pub use gateway::{PaymentGateway, SimulatedGateway};
pub use reel::{ReelPhase, ReelSession, RewardReel};
pub use roster::{Agent, Roster};
pub use selection::SelectionState;
pub use storefront::Storefront;
pub use tasks::{drive_payment, drive_reveal, SharedStorefront};
