use crate::{
    entities::{message, order, product},
    errors::ServiceError,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Dashboard metrics for the admin back-office.
#[derive(Debug, Clone, Serialize)]
pub struct StorefrontMetrics {
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub today_orders: u64,
    pub today_revenue: Decimal,
    pub total_products: u64,
    pub total_messages: u64,
    pub top_products: Vec<TopProduct>,
    pub daily_revenue: Vec<DailyRevenue>,
    pub generated_at: DateTime<Utc>,
}

/// A product ranked by units sold across all orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProduct {
    pub name: String,
    pub quantity: i64,
}

/// Revenue bucketed by calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    pub date: String,
    pub orders: u64,
    pub revenue: Decimal,
}

const TOP_PRODUCTS_LIMIT: usize = 5;

/// Computes dashboard metrics by scanning the orders table. Order
/// volume for a single storefront stays small enough that the scan
/// beats maintaining aggregate tables.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Arc<DatabaseConnection>,
}

impl AnalyticsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn dashboard_metrics(
        &self,
        trend_days: u32,
    ) -> Result<StorefrontMetrics, ServiceError> {
        let now = Utc::now();
        let today_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc())
            .unwrap_or(now);

        let orders = order::Entity::find()
            .order_by_asc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let total_orders = orders.len() as u64;
        let total_revenue: Decimal = orders.iter().map(|o| o.total).sum();

        let today: Vec<&order::Model> = orders
            .iter()
            .filter(|o| o.created_at >= today_start)
            .collect();
        let today_orders = today.len() as u64;
        let today_revenue: Decimal = today.iter().map(|o| o.total).sum();

        let top_products = top_products(&orders, TOP_PRODUCTS_LIMIT);
        let daily_revenue = daily_revenue(&orders, now, trend_days);

        let total_products = product::Entity::find().count(&*self.db).await?;
        let total_messages = message::Entity::find().count(&*self.db).await?;

        Ok(StorefrontMetrics {
            total_orders,
            total_revenue,
            today_orders,
            today_revenue,
            total_products,
            total_messages,
            top_products,
            daily_revenue,
            generated_at: now,
        })
    }

    /// Revenue trend alone, for the chart endpoint.
    pub async fn revenue_trend(&self, trend_days: u32) -> Result<Vec<DailyRevenue>, ServiceError> {
        let now = Utc::now();
        let cutoff = now - Duration::days(i64::from(trend_days));
        let orders = order::Entity::find()
            .filter(order::Column::CreatedAt.gte(cutoff))
            .all(&*self.db)
            .await?;
        Ok(daily_revenue(&orders, now, trend_days))
    }
}

/// Aggregates units sold per product name from the embedded item JSON.
fn top_products(orders: &[order::Model], limit: usize) -> Vec<TopProduct> {
    let mut by_name: HashMap<String, i64> = HashMap::new();
    for order in orders {
        match order.order_items() {
            Ok(items) => {
                for item in items {
                    *by_name.entry(item.name).or_insert(0) += i64::from(item.quantity);
                }
            }
            Err(e) => warn!(order_id = %order.id, "Skipping order with undecodable items: {}", e),
        }
    }

    let mut ranked: Vec<TopProduct> = by_name
        .into_iter()
        .map(|(name, quantity)| TopProduct { name, quantity })
        .collect();
    // Quantity descending, name ascending as tiebreak for stable output
    ranked.sort_by(|a, b| b.quantity.cmp(&a.quantity).then(a.name.cmp(&b.name)));
    ranked.truncate(limit);
    ranked
}

/// Buckets order totals into the last `days` calendar days, oldest
/// first. Days without orders are present with zero revenue.
fn daily_revenue(orders: &[order::Model], now: DateTime<Utc>, days: u32) -> Vec<DailyRevenue> {
    let today = now.date_naive();
    let mut buckets: Vec<DailyRevenue> = (0..days)
        .rev()
        .map(|back| DailyRevenue {
            date: (today - Duration::days(i64::from(back)))
                .format("%Y-%m-%d")
                .to_string(),
            orders: 0,
            revenue: Decimal::ZERO,
        })
        .collect();

    let index: HashMap<String, usize> = buckets
        .iter()
        .enumerate()
        .map(|(i, b)| (b.date.clone(), i))
        .collect();

    for order in orders {
        let key = order.created_at.date_naive().format("%Y-%m-%d").to_string();
        if let Some(&i) = index.get(&key) {
            buckets[i].orders += 1;
            buckets[i].revenue += order.total;
        }
    }
    buckets
}
