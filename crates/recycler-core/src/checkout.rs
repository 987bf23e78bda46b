//! ============================================================================
//! Checkout Flow - Linear Purchase State Machine
//! ============================================================================
//! shipping -> payment -> confirm -> success (or failure)
//!
//! - No backward transitions and no skipping
//! - Payment authorization is two-phase (begin / settle) so the session can
//!   be released while the gateway is working; a busy flag rejects a second
//!   authorization in the meantime
//! - Success hands out the cart migration exactly once per session
//! ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Confirm,
    Success,
    Failure,
}

impl CheckoutStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutStep::Success | CheckoutStep::Failure)
    }
}

/// Delivery details. Every field must be non-blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub recipient: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
}

impl ShippingInfo {
    /// Name of the first blank field, if any
    pub fn first_missing_field(&self) -> Option<&'static str> {
        [
            ("recipient", &self.recipient),
            ("street", &self.street),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("phone", &self.phone),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Handed to the payment gateway when authorization starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTicket {
    pub session_id: Uuid,
    pub method: PaymentMethod,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Approved { reference: String },
    Declined { reason: String },
}

/// One pass through the checkout flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    id: Uuid,
    step: CheckoutStep,
    shipping: Option<ShippingInfo>,
    payment_method: Option<PaymentMethod>,
    /// Frozen at session start; the cart is locked while the session is open
    total: f64,
    line_count: usize,
    authorizing: bool,
    migrated: bool,
    reference: Option<String>,
    failure_reason: Option<String>,
    opened_at: DateTime<Utc>,
}

impl CheckoutSession {
    /// Open a session over the given cart. Empty carts are rejected.
    pub fn begin(cart: &[ItemId], catalog: &Catalog) -> ShopResult<Self> {
        if cart.is_empty() {
            return Err(ShopError::EmptyCart);
        }

        let session = Self {
            id: Uuid::new_v4(),
            step: CheckoutStep::Shipping,
            shipping: None,
            payment_method: None,
            total: catalog.total_of(cart),
            line_count: cart.len(),
            authorizing: false,
            migrated: false,
            reference: None,
            failure_reason: None,
            opened_at: Utc::now(),
        };

        info!(
            "Checkout {} opened: {} lines, total {:.2}",
            session.id, session.line_count, session.total
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn shipping(&self) -> Option<&ShippingInfo> {
        self.shipping.as_ref()
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    pub fn is_authorizing(&self) -> bool {
        self.authorizing
    }

    /// Gateway reference after a successful payment
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    fn expect_step(&self, expected: CheckoutStep, action: &str) -> ShopResult<()> {
        if self.step != expected {
            return Err(ShopError::InvalidTransition(format!(
                "cannot {} during {:?} step",
                action, self.step
            )));
        }
        Ok(())
    }

    /// shipping -> payment
    pub fn submit_shipping(&mut self, info: ShippingInfo) -> ShopResult<CheckoutStep> {
        self.expect_step(CheckoutStep::Shipping, "submit shipping")?;

        if let Some(field) = info.first_missing_field() {
            return Err(ShopError::InvalidTransition(format!(
                "shipping field '{}' is required",
                field
            )));
        }

        self.shipping = Some(info);
        self.step = CheckoutStep::Payment;
        debug!("Checkout {} -> Payment", self.id);
        Ok(self.step)
    }

    /// Pick a payment method. Allowed on the payment and confirm steps.
    pub fn select_payment_method(&mut self, method: PaymentMethod) -> ShopResult<()> {
        match self.step {
            CheckoutStep::Payment => {}
            CheckoutStep::Confirm if !self.authorizing => {}
            CheckoutStep::Confirm => {
                return Err(ShopError::AlreadyInProgress(
                    "payment is being authorized".into(),
                ))
            }
            step => {
                return Err(ShopError::InvalidTransition(format!(
                    "cannot choose a payment method during {:?} step",
                    step
                )))
            }
        }

        self.payment_method = Some(method);
        debug!("Checkout {} payment method {:?}", self.id, method);
        Ok(())
    }

    pub fn can_confirm(&self) -> bool {
        self.step == CheckoutStep::Payment && self.payment_method.is_some()
    }

    /// payment -> confirm. Without a chosen method the step stays on
    /// payment (the confirm button is disabled, not an error).
    pub fn proceed_to_confirm(&mut self) -> ShopResult<CheckoutStep> {
        self.expect_step(CheckoutStep::Payment, "proceed to confirm")?;

        if self.payment_method.is_none() {
            debug!("Checkout {} waiting for a payment method", self.id);
            return Ok(self.step);
        }

        self.step = CheckoutStep::Confirm;
        debug!("Checkout {} -> Confirm", self.id);
        Ok(self.step)
    }

    /// Mark the session busy and hand out a ticket for the gateway
    pub fn begin_authorization(&mut self) -> ShopResult<PaymentTicket> {
        if self.authorizing {
            return Err(ShopError::AlreadyInProgress(
                "payment is being authorized".into(),
            ));
        }
        self.expect_step(CheckoutStep::Confirm, "authorize payment")?;

        let method = self.payment_method.ok_or_else(|| {
            ShopError::InvalidTransition("no payment method selected".into())
        })?;

        self.authorizing = true;
        info!(
            "Checkout {} authorizing {:.2} via {}",
            self.id,
            self.total,
            method.label()
        );

        Ok(PaymentTicket {
            session_id: self.id,
            method,
            total: self.total,
        })
    }

    /// Drop the busy flag without an outcome (authorization cancelled)
    pub fn abort_authorization(&mut self, ticket: &PaymentTicket) -> ShopResult<()> {
        self.check_ticket(ticket)?;
        self.authorizing = false;
        warn!("Checkout {} authorization aborted", self.id);
        Ok(())
    }

    /// confirm -> success | failure
    pub fn settle(&mut self, ticket: &PaymentTicket, outcome: PaymentOutcome) -> ShopResult<CheckoutStep> {
        self.check_ticket(ticket)?;

        self.authorizing = false;
        match outcome {
            PaymentOutcome::Approved { reference } => {
                info!("Checkout {} approved ({})", self.id, reference);
                self.reference = Some(reference);
                self.step = CheckoutStep::Success;
            }
            PaymentOutcome::Declined { reason } => {
                warn!("Checkout {} declined: {}", self.id, reason);
                self.failure_reason = Some(reason);
                self.step = CheckoutStep::Failure;
            }
        }
        Ok(self.step)
    }

    fn check_ticket(&self, ticket: &PaymentTicket) -> ShopResult<()> {
        if ticket.session_id != self.id {
            return Err(ShopError::InvalidTransition(
                "payment ticket belongs to another checkout".into(),
            ));
        }
        if !self.authorizing {
            return Err(ShopError::InvalidTransition(
                "no payment authorization in flight".into(),
            ));
        }
        Ok(())
    }

    /// One-shot: true exactly once, and only after success
    pub fn take_migration(&mut self) -> bool {
        if self.step != CheckoutStep::Success || self.migrated {
            return false;
        }
        self.migrated = true;
        true
    }

    pub fn is_migrated(&self) -> bool {
        self.migrated
    }

    /// Sessions can be closed at any point except mid-authorization
    pub fn ensure_closable(&self) -> ShopResult<()> {
        if self.authorizing {
            return Err(ShopError::AlreadyInProgress(
                "cannot close checkout while payment is being authorized".into(),
            ));
        }
        Ok(())
    }
}
