//! ============================================================================
//! Storefront - Session Object
//! ============================================================================
//! Owns all mutable state for one shopper:
//! - collections (wishlist / cart / inventory)
//! - catalog and roster focus
//! - the open checkout session, if any
//! - the reward reel
//! - locally posted field reports
//!
//! Every id coming in from the outside is validated against the catalog.
//! While a checkout session is open the cart is locked, so the frozen
//! checkout total always equals the cart sum.
//! ============================================================================

use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::chat::Persona;
use crate::checkout::*;
use crate::collection::{CollectionState, HeldContainer};
use crate::config::ShopConfig;
use crate::gateway::PaymentGateway;
use crate::reel::{ReelSession, RewardReel};
use crate::reviews::ReviewBoard;
use crate::roster::{Agent, Roster};
use crate::selection::SelectionState;
use crate::types::*;

pub struct Storefront {
    catalog: Arc<Catalog>,
    roster: Arc<Roster>,
    config: ShopConfig,
    collections: CollectionState,
    selection: SelectionState,
    agent_focus: SelectionState,
    checkout: Option<CheckoutSession>,
    reel: RewardReel,
    reviews: HashMap<ItemId, ReviewBoard>,
}

impl Storefront {
    pub fn new(catalog: Arc<Catalog>, roster: Arc<Roster>, config: ShopConfig) -> ShopResult<Self> {
        config.validate().map_err(ShopError::Config)?;
        let reel = RewardReel::from_config(&config)?;
        let agent_focus = roster
            .first()
            .map(|a| SelectionState::focused_on(a.id.clone()))
            .unwrap_or_default();

        info!(
            "Storefront ready: {} catalog items, {} agents",
            catalog.len(),
            roster.agents().len()
        );

        Ok(Self {
            catalog,
            roster,
            config,
            collections: CollectionState::new(),
            selection: SelectionState::new(),
            agent_focus,
            checkout: None,
            reel,
            reviews: HashMap::new(),
        })
    }

    /// Built-in catalog and roster with the given config
    pub fn with_config(config: ShopConfig) -> ShopResult<Self> {
        Self::new(Arc::new(Catalog::builtin()), Arc::new(Roster::builtin()), config)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn roster(&self) -> &Arc<Roster> {
        &self.roster
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn collections(&self) -> &CollectionState {
        &self.collections
    }

    #[cfg(test)]
    pub(crate) fn collections_mut_for_test(&mut self) -> &mut CollectionState {
        &mut self.collections
    }

    // ========================================================================
    // Collections
    // ========================================================================

    /// Returns whether the item is wishlisted afterwards
    pub fn toggle_wishlist(&mut self, id: &str) -> ShopResult<bool> {
        self.catalog.require(id)?;
        Ok(self.collections.toggle_wishlist(id))
    }

    pub fn add_to_cart(&mut self, id: &str) -> ShopResult<()> {
        self.ensure_cart_unlocked()?;
        self.catalog.require(id)?;
        self.collections.add_to_cart(id);
        debug!("Cart +{} ({} lines)", id, self.collections.cart().len());
        Ok(())
    }

    /// Out-of-range positions are a no-op (`Ok(None)`)
    pub fn remove_from_cart(&mut self, position: usize) -> ShopResult<Option<ItemId>> {
        self.ensure_cart_unlocked()?;
        Ok(self.collections.remove_from_cart(position))
    }

    pub fn cart_total(&self) -> f64 {
        self.collections.cart_total(&self.catalog)
    }

    pub fn containers(&self) -> Vec<HeldContainer> {
        self.collections.containers_in_inventory(&self.catalog)
    }

    fn ensure_cart_unlocked(&self) -> ShopResult<()> {
        if self.checkout.is_some() {
            return Err(ShopError::AlreadyInProgress(
                "cart is locked while checkout is open".into(),
            ));
        }
        Ok(())
    }

    // ========================================================================
    // Focus
    // ========================================================================

    /// Unknown ids leave the focus unchanged
    pub fn select_item(&mut self, id: &str) -> bool {
        self.selection.select(self.catalog.as_ref(), id)
    }

    pub fn selected_item(&self) -> Option<&CatalogItem> {
        self.selection.selected().and_then(|id| self.catalog.get(id))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn select_agent(&mut self, id: &str) -> bool {
        self.agent_focus.select(self.roster.as_ref(), id)
    }

    pub fn selected_agent(&self) -> Option<&Agent> {
        self.agent_focus.selected().and_then(|id| self.roster.get(id))
    }

    // ========================================================================
    // Checkout
    // ========================================================================

    pub fn checkout(&self) -> Option<&CheckoutSession> {
        self.checkout.as_ref()
    }

    /// Open a checkout over the current cart. Only one session at a time.
    pub fn begin_checkout(&mut self) -> ShopResult<&CheckoutSession> {
        if self.checkout.is_some() {
            return Err(ShopError::AlreadyInProgress("checkout is already open".into()));
        }
        let session = CheckoutSession::begin(self.collections.cart(), &self.catalog)?;
        Ok(&*self.checkout.insert(session))
    }

    fn checkout_mut(&mut self) -> ShopResult<&mut CheckoutSession> {
        self.checkout
            .as_mut()
            .ok_or_else(|| ShopError::InvalidTransition("no checkout is open".into()))
    }

    pub fn submit_shipping(&mut self, info: ShippingInfo) -> ShopResult<CheckoutStep> {
        self.checkout_mut()?.submit_shipping(info)
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) -> ShopResult<()> {
        self.checkout_mut()?.select_payment_method(method)
    }

    pub fn proceed_to_confirm(&mut self) -> ShopResult<CheckoutStep> {
        self.checkout_mut()?.proceed_to_confirm()
    }

    pub fn begin_payment(&mut self) -> ShopResult<PaymentTicket> {
        self.checkout_mut()?.begin_authorization()
    }

    pub fn abort_payment(&mut self, ticket: &PaymentTicket) -> ShopResult<()> {
        self.checkout_mut()?.abort_authorization(ticket)
    }

    /// Apply the gateway outcome; success migrates the cart immediately
    pub fn settle_payment(
        &mut self,
        ticket: &PaymentTicket,
        outcome: PaymentOutcome,
    ) -> ShopResult<CheckoutStep> {
        let step = self.checkout_mut()?.settle(ticket, outcome)?;
        self.finalize_checkout();
        Ok(step)
    }

    /// Move the cart into inventory if the open session succeeded and has
    /// not migrated yet. Safe to call any number of times.
    pub fn finalize_checkout(&mut self) -> usize {
        let Some(session) = self.checkout.as_mut() else {
            return 0;
        };
        if !session.take_migration() {
            return 0;
        }

        let moved = self.collections.move_cart_to_inventory();
        info!("Checkout {} delivered {} items to inventory", session.id(), moved);
        moved
    }

    /// Discard the session. Collections are untouched except for a pending
    /// success migration, which is applied first.
    pub fn close_checkout(&mut self) -> ShopResult<Option<CheckoutSession>> {
        if let Some(session) = &self.checkout {
            session.ensure_closable()?;
        }
        self.finalize_checkout();

        let closed = self.checkout.take();
        if let Some(session) = &closed {
            debug!("Checkout {} closed at {:?}", session.id(), session.step());
        }
        Ok(closed)
    }

    /// Authorize in place, holding `&mut self` across the gateway call.
    /// Gateway errors leave the session at confirm so payment can be retried;
    /// so does dropping the future before the gateway answers.
    pub async fn pay(&mut self, gateway: &dyn PaymentGateway) -> ShopResult<CheckoutStep> {
        let ticket = self.begin_payment()?;
        let mut pending = PendingPayment { shop: self, ticket: Some(ticket.clone()) };

        let result = gateway.authorize(&ticket).await;
        pending.ticket = None;

        match result {
            Ok(outcome) => pending.shop.settle_payment(&ticket, outcome),
            Err(e) => {
                pending.shop.abort_payment(&ticket)?;
                Err(ShopError::ExternalCallFailure(e.to_string()))
            }
        }
    }

    // ========================================================================
    // Reward reel
    // ========================================================================

    pub fn reel(&self) -> &RewardReel {
        &self.reel
    }

    pub fn open_case<R: Rng + ?Sized>(&mut self, container_id: &str, rng: &mut R) -> ShopResult<&ReelSession> {
        self.reel
            .open(container_id, &mut self.collections, &self.catalog, rng)
    }

    /// Finish the spin and put the reward into inventory
    pub fn complete_reveal(&mut self) -> ShopResult<ItemId> {
        let reward = self.reel.complete_reveal()?;
        self.collections.grant(&reward);
        Ok(reward)
    }

    pub fn reset_reel(&mut self) -> Option<ReelSession> {
        self.reel.reset()
    }

    /// Open and reveal without waiting (scripted runs and tests)
    pub fn open_and_reveal<R: Rng + ?Sized>(&mut self, container_id: &str, rng: &mut R) -> ShopResult<ItemId> {
        self.open_case(container_id, rng)?;
        self.complete_reveal()
    }

    // ========================================================================
    // Field reports & chat personas
    // ========================================================================

    pub fn reviews(&self, id: &str) -> ShopResult<&[Review]> {
        let item = self.catalog.require(id)?;
        Ok(self
            .reviews
            .get(id)
            .map(|board| board.reviews())
            .unwrap_or(item.reviews.as_slice()))
    }

    /// Returns the posted report, or `None` for a blank comment
    pub fn post_review(&mut self, id: &str, comment: &str) -> ShopResult<Option<Review>> {
        let item = self.catalog.require(id)?;
        let board = self
            .reviews
            .entry(id.to_string())
            .or_insert_with(|| ReviewBoard::seeded(item));
        Ok(board.post(comment).cloned())
    }

    pub fn advisor_persona(&self, id: &str) -> ShopResult<Persona> {
        Ok(Persona::tech_advisor(self.catalog.require(id)?))
    }

    pub fn agent_persona(&self, id: &str) -> ShopResult<Persona> {
        self.roster
            .get(id)
            .map(Persona::agent)
            .ok_or_else(|| ShopError::NotFound(id.to_string()))
    }
}

/// Releases the authorization if `Storefront::pay` is dropped mid-call
struct PendingPayment<'a> {
    shop: &'a mut Storefront,
    ticket: Option<PaymentTicket>,
}

impl Drop for PendingPayment<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            warn!("Payment for checkout {} dropped mid-authorization", ticket.session_id);
            if let Err(e) = self.shop.abort_payment(&ticket) {
                debug!("Nothing to release for checkout {}: {}", ticket.session_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reel::ReelPhase;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn shop() -> Storefront {
        let catalog = Catalog::new(vec![
            CatalogItem::new("caseA", "Case A", Category::SupplyCase, 10.0),
            CatalogItem::new("gpuX", "GPU X", Category::GraphicsCard, 500.0),
            CatalogItem::new("cpuY", "CPU Y", Category::Processor, 300.0),
        ])
        .unwrap();
        Storefront::new(Arc::new(catalog), Arc::new(Roster::builtin()), ShopConfig::instant()).unwrap()
    }

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            recipient: "Ijong".into(),
            street: "Jl. Daur Ulang 12".into(),
            city: "Bandung".into(),
            postal_code: "40115".into(),
            phone: "+62 812 0000".into(),
        }
    }

    fn to_confirm(shop: &mut Storefront) {
        shop.begin_checkout().unwrap();
        shop.submit_shipping(shipping()).unwrap();
        shop.select_payment_method(PaymentMethod::Qris).unwrap();
        shop.proceed_to_confirm().unwrap();
    }

    struct Approve;

    #[async_trait]
    impl PaymentGateway for Approve {
        async fn authorize(&self, _ticket: &PaymentTicket) -> anyhow::Result<PaymentOutcome> {
            Ok(PaymentOutcome::Approved { reference: "PAY-TEST".into() })
        }
    }

    struct Broken;

    #[async_trait]
    impl PaymentGateway for Broken {
        async fn authorize(&self, _ticket: &PaymentTicket) -> anyhow::Result<PaymentOutcome> {
            Err(anyhow!("gateway unreachable"))
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ShopConfig {
            payment_decline_rate: 2.0,
            ..ShopConfig::instant()
        };
        let result = Storefront::new(Arc::new(Catalog::builtin()), Arc::new(Roster::builtin()), config);
        assert!(matches!(result, Err(ShopError::Config(ref m)) if m.contains("decline rate")));
    }

    #[test]
    fn test_unknown_ids_rejected() {
        let mut shop = shop();
        assert_eq!(shop.add_to_cart("ghost"), Err(ShopError::NotFound("ghost".into())));
        assert_eq!(shop.toggle_wishlist("ghost"), Err(ShopError::NotFound("ghost".into())));
        assert!(shop.collections().cart().is_empty());
        assert!(shop.collections().wishlist().is_empty());
    }

    #[test]
    fn test_wishlist_toggle_is_involution() {
        let mut shop = shop();
        assert!(shop.toggle_wishlist("gpuX").unwrap());
        assert!(!shop.toggle_wishlist("gpuX").unwrap());
        assert!(shop.collections().wishlist().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_total_and_migration() {
        let mut shop = shop();
        shop.add_to_cart("gpuX").unwrap();
        shop.add_to_cart("gpuX").unwrap();
        shop.add_to_cart("cpuY").unwrap();

        to_confirm(&mut shop);
        assert_eq!(shop.checkout().unwrap().total(), 1300.0);

        assert_eq!(shop.pay(&Approve).await.unwrap(), CheckoutStep::Success);

        assert!(shop.collections().cart().is_empty());
        assert_eq!(shop.collections().inventory(), ["gpuX", "gpuX", "cpuY"]);
    }

    #[tokio::test]
    async fn test_success_migrates_once() {
        let mut shop = shop();
        shop.add_to_cart("gpuX").unwrap();
        to_confirm(&mut shop);
        shop.pay(&Approve).await.unwrap();

        assert_eq!(shop.finalize_checkout(), 0);
        assert_eq!(shop.finalize_checkout(), 0);
        shop.close_checkout().unwrap();

        assert_eq!(shop.collections().inventory_count("gpuX"), 1);
        assert!(shop.checkout().is_none());
    }

    #[test]
    fn test_empty_cart_checkout_rejected() {
        let mut shop = shop();
        assert!(matches!(shop.begin_checkout(), Err(ShopError::EmptyCart)));
        assert!(shop.checkout().is_none());
    }

    #[test]
    fn test_cart_locked_during_checkout() {
        let mut shop = shop();
        shop.add_to_cart("gpuX").unwrap();
        shop.begin_checkout().unwrap();

        assert!(matches!(shop.add_to_cart("cpuY"), Err(ShopError::AlreadyInProgress(_))));
        assert!(matches!(shop.remove_from_cart(0), Err(ShopError::AlreadyInProgress(_))));
        assert!(matches!(shop.begin_checkout(), Err(ShopError::AlreadyInProgress(_))));

        shop.close_checkout().unwrap();
        shop.add_to_cart("cpuY").unwrap();
        assert_eq!(shop.cart_total(), 800.0);
    }

    #[test]
    fn test_close_before_success_keeps_collections() {
        let mut shop = shop();
        shop.add_to_cart("gpuX").unwrap();
        to_confirm(&mut shop);
        let before = shop.collections().clone();

        let closed = shop.close_checkout().unwrap().unwrap();

        assert_eq!(closed.step(), CheckoutStep::Confirm);
        assert_eq!(shop.collections(), &before);
    }

    #[test]
    fn test_close_while_authorizing_rejected() {
        let mut shop = shop();
        shop.add_to_cart("gpuX").unwrap();
        to_confirm(&mut shop);
        shop.begin_payment().unwrap();

        assert!(matches!(shop.close_checkout(), Err(ShopError::AlreadyInProgress(_))));
        assert!(shop.checkout().is_some());
    }

    #[tokio::test]
    async fn test_gateway_error_allows_retry() {
        let mut shop = shop();
        shop.add_to_cart("gpuX").unwrap();
        to_confirm(&mut shop);

        let err = shop.pay(&Broken).await.unwrap_err();
        assert!(matches!(err, ShopError::ExternalCallFailure(_)));
        assert_eq!(shop.checkout().unwrap().step(), CheckoutStep::Confirm);
        assert!(!shop.checkout().unwrap().is_authorizing());

        assert_eq!(shop.pay(&Approve).await.unwrap(), CheckoutStep::Success);
    }

    struct Stalled;

    #[async_trait]
    impl PaymentGateway for Stalled {
        async fn authorize(&self, _ticket: &PaymentTicket) -> anyhow::Result<PaymentOutcome> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_pay_releases_checkout() {
        let mut shop = shop();
        shop.add_to_cart("gpuX").unwrap();
        to_confirm(&mut shop);

        let outcome =
            tokio::time::timeout(std::time::Duration::from_secs(1), shop.pay(&Stalled)).await;
        assert!(outcome.is_err());

        assert!(!shop.checkout().unwrap().is_authorizing());
        assert!(shop.close_checkout().unwrap().is_some());
        shop.add_to_cart("cpuY").unwrap();
    }

    #[test]
    fn test_declined_keeps_cart() {
        let mut shop = shop();
        shop.add_to_cart("gpuX").unwrap();
        to_confirm(&mut shop);
        let ticket = shop.begin_payment().unwrap();

        let step = shop
            .settle_payment(&ticket, PaymentOutcome::Declined { reason: "limit".into() })
            .unwrap();

        assert_eq!(step, CheckoutStep::Failure);
        shop.close_checkout().unwrap();
        assert_eq!(shop.collections().cart(), ["gpuX"]);
        assert!(shop.collections().inventory().is_empty());
    }

    #[test]
    fn test_case_opening_grants_reward() {
        let mut shop = shop();
        shop.collections.grant("caseA");
        let mut rng = StdRng::seed_from_u64(11);

        shop.open_case("caseA", &mut rng).unwrap();
        assert!(shop.collections().inventory().is_empty());

        let reward = shop.complete_reveal().unwrap();
        assert!(reward == "gpuX" || reward == "cpuY");
        assert_eq!(shop.collections().inventory(), [reward.as_str()]);
        assert_eq!(shop.reel().phase(), ReelPhase::Revealed);
    }

    #[test]
    fn test_case_cancel_grants_nothing() {
        let mut shop = shop();
        shop.collections.grant("caseA");
        let mut rng = StdRng::seed_from_u64(12);

        shop.open_case("caseA", &mut rng).unwrap();
        shop.reset_reel();

        assert!(shop.collections().inventory().is_empty());
        assert!(shop.complete_reveal().is_err());
    }

    #[test]
    fn test_containers_grouped() {
        let mut shop = shop();
        shop.collections.grant("caseA");
        shop.collections.grant("gpuX");
        shop.collections.grant("caseA");

        let held = shop.containers();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].id, "caseA");
        assert_eq!(held[0].count, 2);
    }

    #[test]
    fn test_selection_ignores_unknown() {
        let mut shop = shop();
        assert!(shop.select_item("gpuX"));
        assert!(!shop.select_item("ghost"));
        assert_eq!(shop.selected_item().unwrap().id, "gpuX");
    }

    #[test]
    fn test_agent_focus_starts_on_first() {
        let mut shop = shop();
        assert_eq!(shop.selected_agent().unwrap().id, "jett");
        assert!(shop.select_agent("sage"));
        assert!(!shop.select_agent("nobody"));
        assert_eq!(shop.selected_agent().unwrap().id, "sage");
    }

    #[test]
    fn test_reviews_local_to_session() {
        let mut shop = shop();
        assert!(shop.reviews("gpuX").unwrap().is_empty());

        assert!(shop.post_review("gpuX", "").unwrap().is_none());
        let posted = shop.post_review("gpuX", "Clean board").unwrap().unwrap();

        assert_eq!(shop.reviews("gpuX").unwrap(), [posted]);
        assert!(shop.post_review("ghost", "hi").is_err());
    }

    #[test]
    fn test_personas_validate_ids() {
        let shop = shop();
        assert!(shop.advisor_persona("gpuX").unwrap().system_prompt.contains("GPU X"));
        assert_eq!(shop.agent_persona("viper").unwrap().name, "VIPER");
        assert_eq!(shop.agent_persona("nobody"), Err(ShopError::NotFound("nobody".into())));
    }
}
