use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    analytics::AnalyticsService,
    catalog::CatalogService,
    geo::DeliveryZone,
    messages::MessageService,
    orders::OrderService,
    pricing::PricingPolicy,
};

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod common;
pub mod messages;
pub mod orders;
pub mod products;
pub mod uploads;

/// Service registry shared by the handlers via `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub messages: MessageService,
    pub analytics: AnalyticsService,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, config: &AppConfig) -> Self {
        let catalog = CatalogService::new(db.clone(), event_sender.clone());
        let orders = OrderService::new(
            db.clone(),
            event_sender.clone(),
            catalog.clone(),
            PricingPolicy::from_config(config),
            DeliveryZone::from_config(config),
        );
        let messages = MessageService::new(db.clone(), event_sender);
        let analytics = AnalyticsService::new(db);
        Self {
            catalog,
            orders,
            messages,
            analytics,
        }
    }
}
