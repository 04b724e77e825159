use crate::{
    entities::order::{self, OrderItem},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        cart::Cart,
        catalog::CatalogService,
        geo::{DeliveryZone, Point},
        pricing::{CartTotals, PricingPolicy},
    },
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Checkout and order-reading service.
///
/// Checkout never trusts client-sent prices: every line is repriced
/// against the product table before totals are computed.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    catalog: CatalogService,
    pricing: PricingPolicy,
    zone: DeliveryZone,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        catalog: CatalogService,
        pricing: PricingPolicy,
        zone: DeliveryZone,
    ) -> Self {
        Self {
            db,
            event_sender,
            catalog,
            pricing,
            zone,
        }
    }

    /// Reprices the requested lines against the live product table and
    /// computes totals. Shared by the quote endpoint and checkout.
    #[instrument(skip(self))]
    pub async fn quote(&self, items: &[OrderItemInput]) -> Result<PricedCart, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::ValidationError(
                "Order must contain at least one item".into(),
            ));
        }
        for item in items {
            if item.quantity < 1 {
                return Err(ServiceError::ValidationError(format!(
                    "Quantity for product {} must be at least 1",
                    item.product_id
                )));
            }
        }

        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let products = self.catalog.find_products(&ids).await?;

        // Duplicate ids in the request merge through the cart
        let mut cart = Cart::new();
        for item in items {
            let product = products.get(&item.product_id).ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", item.product_id))
            })?;
            if !product.is_available {
                return Err(ServiceError::InvalidOperation(format!(
                    "Product '{}' is currently unavailable",
                    product.name
                )));
            }
            cart.add(product.id, &product.name, product.price, item.quantity);
        }

        let totals = self.pricing.totals(&cart);
        let lines = cart
            .lines()
            .iter()
            .map(|l| OrderItem {
                product_id: l.product_id,
                name: l.name.clone(),
                quantity: l.quantity,
                unit_price: l.unit_price,
                line_total: l.line_total(),
            })
            .collect();

        Ok(PricedCart { lines, totals })
    }

    /// Creates an order: validate, reprice, apply the delivery fee,
    /// geofence when a coordinate is present, persist, emit the event.
    #[instrument(skip(self, input), fields(customer = %input.customer_name))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<order::Model, ServiceError> {
        if input.customer_name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Customer name is required".into(),
            ));
        }
        if input.phone.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Phone number is required".into(),
            ));
        }
        if input.address.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Delivery address is required".into(),
            ));
        }

        let priced = self.quote(&input.items).await?;

        // Address-only orders skip the geofence entirely
        let (latitude, longitude, maps_url, distance_km) = match input.location {
            Some(loc) => {
                let point = Point::new(loc.latitude, loc.longitude);
                let distance = self.zone.check(point)?;
                let maps_url = loc.maps_url.unwrap_or_else(|| {
                    format!(
                        "https://maps.google.com/?q={},{}",
                        loc.latitude, loc.longitude
                    )
                });
                (
                    Some(loc.latitude),
                    Some(loc.longitude),
                    Some(maps_url),
                    Some(distance),
                )
            }
            None => (None, None, None, None),
        };

        let order_id = Uuid::new_v4();
        let model = order::ActiveModel {
            id: Set(order_id),
            customer_name: Set(input.customer_name.trim().to_string()),
            phone: Set(input.phone.trim().to_string()),
            address: Set(input.address.trim().to_string()),
            items: Set(serde_json::to_value(&priced.lines)?),
            subtotal: Set(priced.totals.subtotal),
            delivery_fee: Set(priced.totals.delivery_fee),
            total: Set(priced.totals.total),
            latitude: Set(latitude),
            longitude: Set(longitude),
            maps_url: Set(maps_url),
            distance_km: Set(distance_km),
            created_at: Set(Utc::now()),
        };

        let created = model.insert(&*self.db).await?;

        // Telegram delivery happens on the event processor, never here
        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;

        info!("Created order: {} (total {})", order_id, created.total);
        Ok(created)
    }

    /// List orders, newest first, with the total count.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let paginator = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Get an order by id
    pub async fn get_order(&self, order_id: Uuid) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Counts orders created after the referenced order. Powers the
    /// admin "new orders" badge, which polls with the last order it
    /// has seen. No reference (or an unknown one) counts as zero new.
    pub async fn count_new_since(&self, since: Option<Uuid>) -> Result<u64, ServiceError> {
        let Some(since_id) = since else {
            return Ok(0);
        };
        let Some(reference) = order::Entity::find_by_id(since_id).one(&*self.db).await? else {
            return Ok(0);
        };
        let count = order::Entity::find()
            .filter(order::Column::CreatedAt.gt(reference.created_at))
            .count(&*self.db)
            .await?;
        Ok(count)
    }
}

/// One requested line at checkout; price comes from the server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Optional customer coordinate captured by the order form
#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    pub latitude: f64,
    pub longitude: f64,
    pub maps_url: Option<String>,
}

/// Checkout input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub items: Vec<OrderItemInput>,
    pub location: Option<LocationInput>,
}

/// A repriced cart ready to persist or return as a quote
#[derive(Debug, Clone, Serialize)]
pub struct PricedCart {
    pub lines: Vec<OrderItem>,
    #[serde(flatten)]
    pub totals: CartTotals,
}
