//! ============================================================================
//! Background Drivers - Payment and Reveal Delays
//! ============================================================================
//! The storefront is shared as `Arc<RwLock<Storefront>>`. Drivers take the
//! write lock only for state transitions and release it before any delay,
//! so readers (views, other commands) are never blocked by a pending
//! payment or a spinning reel. Both drivers honor a `CancelToken`.
//! ============================================================================

use rand::Rng;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cancel::{sleep_or_cancel, CancelToken};
use crate::checkout::{CheckoutStep, PaymentTicket};
use crate::gateway::PaymentGateway;
use crate::storefront::Storefront;
use crate::types::*;

/// Storefront handle shared between the caller and spawned drivers
pub type SharedStorefront = Arc<RwLock<Storefront>>;

pub fn shared(storefront: Storefront) -> SharedStorefront {
    Arc::new(RwLock::new(storefront))
}

/// Releases an in-flight authorization if the driver future is dropped
/// before it settles (timeout, aborted task, dropped request).
struct AuthorizationGuard {
    shop: SharedStorefront,
    ticket: Option<PaymentTicket>,
}

impl AuthorizationGuard {
    fn new(shop: &SharedStorefront, ticket: PaymentTicket) -> Self {
        Self { shop: shop.clone(), ticket: Some(ticket) }
    }

    fn disarm(&mut self) {
        self.ticket = None;
    }
}

impl Drop for AuthorizationGuard {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };
        warn!("Payment driver for checkout {} dropped mid-authorization", ticket.session_id);

        if let Ok(mut guard) = self.shop.try_write() {
            if let Err(e) = guard.abort_payment(&ticket) {
                debug!("Nothing to release for checkout {}: {}", ticket.session_id, e);
            }
            return;
        }

        // Lock is contended; release it from a task once the holder is done
        let shop = self.shop.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = shop.write().await.abort_payment(&ticket) {
                        debug!("Nothing to release for checkout {}: {}", ticket.session_id, e);
                    }
                });
            }
            Err(_) => warn!("No runtime to release checkout {}", ticket.session_id),
        }
    }
}

/// Authorize the open checkout through `gateway`.
///
/// Returns `Ok(None)` if cancelled, in which case the session is released
/// back to the confirm step. Gateway errors also release the session and
/// surface as `ExternalCallFailure`. Dropping the future before it finishes
/// releases the session the same way.
pub async fn drive_payment(
    shop: &SharedStorefront,
    gateway: &dyn PaymentGateway,
    cancel: &CancelToken,
) -> ShopResult<Option<CheckoutStep>> {
    let ticket = shop.write().await.begin_payment()?;
    let mut pending = AuthorizationGuard::new(shop, ticket.clone());

    let result = tokio::select! {
        result = gateway.authorize(&ticket) => Some(result),
        _ = cancel.cancelled() => None,
    };

    let mut guard = shop.write().await;
    pending.disarm();
    match result {
        Some(Ok(outcome)) => guard.settle_payment(&ticket, outcome).map(Some),
        Some(Err(e)) => {
            guard.abort_payment(&ticket)?;
            Err(ShopError::ExternalCallFailure(e.to_string()))
        }
        None => {
            guard.abort_payment(&ticket)?;
            info!("Payment for checkout {} cancelled", ticket.session_id);
            Ok(None)
        }
    }
}

/// Open `container_id` and reveal it after the configured delay.
///
/// The case is consumed as soon as the reel starts. Returns the reward, or
/// `Ok(None)` if cancelled before the reveal (nothing is granted).
pub async fn drive_reveal<R: Rng + ?Sized>(
    shop: &SharedStorefront,
    container_id: &str,
    rng: &mut R,
    cancel: &CancelToken,
) -> ShopResult<Option<ItemId>> {
    let (reel_id, delay) = {
        let mut guard = shop.write().await;
        let reel_id = guard.open_case(container_id, rng)?.id;
        (reel_id, guard.config().reveal_delay())
    };

    let finished = sleep_or_cancel(delay, cancel).await;

    let mut guard = shop.write().await;
    if guard.reel().session().map(|s| s.id) != Some(reel_id) {
        warn!("Reel {} was reset before its reveal", reel_id);
        return Err(ShopError::InvalidTransition("reel was reset during the spin".into()));
    }

    if !finished {
        guard.reset_reel();
        return Ok(None);
    }

    guard.complete_reveal().map(Some)
}
