use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::AppConfig;
use crate::services::cart::Cart;

/// Computed totals for a cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

/// Delivery pricing rule: orders under the threshold pay a flat fee,
/// orders at or above it ship free. An empty cart carries no fee.
#[derive(Debug, Clone)]
pub struct PricingPolicy {
    pub free_delivery_threshold: Decimal,
    pub delivery_fee: Decimal,
}

impl PricingPolicy {
    pub fn new(free_delivery_threshold: Decimal, delivery_fee: Decimal) -> Self {
        Self {
            free_delivery_threshold,
            delivery_fee,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Decimal::from(config.free_delivery_threshold),
            Decimal::from(config.delivery_fee),
        )
    }

    pub fn delivery_fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        if subtotal < self.free_delivery_threshold {
            self.delivery_fee
        } else {
            Decimal::ZERO
        }
    }

    pub fn totals(&self, cart: &Cart) -> CartTotals {
        let subtotal = cart.subtotal();
        let delivery_fee = self.delivery_fee_for(subtotal);
        CartTotals {
            subtotal,
            delivery_fee,
            total: subtotal + delivery_fee,
        }
    }
}
