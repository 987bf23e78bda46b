//! ============================================================================
//! Payment Gateway - Authorization Backends
//! ============================================================================
//! The storefront has no real payment processor. `SimulatedGateway` stands
//! in for one: it waits a configured latency (optionally jittered) and then
//! approves, or declines at a configured rate.
//! ============================================================================

use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::checkout::{PaymentOutcome, PaymentTicket};
use crate::config::ShopConfig;

/// Something that can authorize a checkout ticket
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(&self, ticket: &PaymentTicket) -> Result<PaymentOutcome>;
}

/// Latency-only stand-in for a payment processor
pub struct SimulatedGateway {
    latency: Duration,
    jitter: Duration,
    decline_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedGateway {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            jitter: Duration::ZERO,
            decline_rate: 0.0,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn from_config(config: &ShopConfig) -> Self {
        Self::new(Duration::from_millis(config.payment_latency_ms))
            .with_jitter(Duration::from_millis(config.payment_jitter_ms))
            .with_decline_rate(config.payment_decline_rate)
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Clamped to [0, 1]
    pub fn with_decline_rate(mut self, rate: f64) -> Self {
        self.decline_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    /// Deterministic jitter/decline draws for tests and scripted runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn authorize(&self, ticket: &PaymentTicket) -> Result<PaymentOutcome> {
        let (delay, declined) = {
            let mut rng = self.rng.lock().await;
            let jitter_ms = self.jitter.as_millis() as u64;
            let extra = if jitter_ms > 0 { rng.gen_range(0..=jitter_ms) } else { 0 };
            let declined = self.decline_rate > 0.0 && rng.gen_bool(self.decline_rate);
            (self.latency + Duration::from_millis(extra), declined)
        };

        debug!(
            "Simulating {} gateway for {:?}",
            ticket.method.label(),
            delay
        );
        tokio::time::sleep(delay).await;

        if declined {
            info!("Simulated gateway declined checkout {}", ticket.session_id);
            return Ok(PaymentOutcome::Declined {
                reason: format!("{} declined the transaction", ticket.method.label()),
            });
        }

        let reference = format!("PAY-{}", &Uuid::new_v4().simple().to_string()[..8]).to_uppercase();
        Ok(PaymentOutcome::Approved { reference })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;

    fn ticket() -> PaymentTicket {
        PaymentTicket {
            session_id: Uuid::new_v4(),
            method: PaymentMethod::Qris,
            total: 1300.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_gateway_waits_latency() {
        let gateway = SimulatedGateway::new(Duration::from_millis(3500));
        let started = tokio::time::Instant::now();

        let outcome = gateway.authorize(&ticket()).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(3500));
        match outcome {
            PaymentOutcome::Approved { reference } => assert!(reference.starts_with("PAY-")),
            other => panic!("expected approval, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_stays_in_range() {
        let gateway = SimulatedGateway::new(Duration::from_millis(1000))
            .with_jitter(Duration::from_millis(500))
            .with_seed(7);

        for _ in 0..5 {
            let started = tokio::time::Instant::now();
            gateway.authorize(&ticket()).await.unwrap();
            let elapsed = started.elapsed();
            assert!(elapsed >= Duration::from_millis(1000));
            assert!(elapsed <= Duration::from_millis(1501));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_decline_rate_always_declines() {
        let gateway = SimulatedGateway::new(Duration::ZERO).with_decline_rate(1.0);
        let outcome = gateway.authorize(&ticket()).await.unwrap();
        assert!(matches!(outcome, PaymentOutcome::Declined { .. }));
    }

    #[test]
    fn test_decline_rate_clamped() {
        assert_eq!(SimulatedGateway::new(Duration::ZERO).with_decline_rate(4.0).decline_rate, 1.0);
        assert_eq!(SimulatedGateway::new(Duration::ZERO).with_decline_rate(-1.0).decline_rate, 0.0);
        assert_eq!(SimulatedGateway::new(Duration::ZERO).with_decline_rate(f64::NAN).decline_rate, 0.0);
    }
}
