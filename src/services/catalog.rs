use crate::{
    entities::{category, product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Catalog service for managing menu products and categories
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Create a new product
    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        validate_product_fields(&input.name, &input.category, input.price)?;

        let product_id = Uuid::new_v4();
        let now = Utc::now();

        let model = product::ActiveModel {
            id: Set(product_id),
            name: Set(input.name.trim().to_string()),
            price: Set(input.price),
            category: Set(input.category.trim().to_string()),
            image_url: Set(input.image_url),
            is_available: Set(input.is_available.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product_id))
            .await;

        info!("Created product: {}", product_id);
        Ok(created)
    }

    /// Update an existing product
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(product_id).await?;
        let mut active: product::ActiveModel = existing.into();

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Product name cannot be empty".into(),
                ));
            }
            active.name = Set(name.trim().to_string());
        }
        if let Some(price) = input.price {
            if price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Product price must be positive".into(),
                ));
            }
            active.price = Set(price);
        }
        if let Some(cat) = input.category {
            if cat.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Product category cannot be empty".into(),
                ));
            }
            active.category = Set(cat.trim().to_string());
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(is_available) = input.is_available {
            active.is_available = Set(is_available);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;

        Ok(updated)
    }

    /// Delete a product
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let result = product::Entity::delete_by_id(product_id)
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;

        info!("Deleted product: {}", product_id);
        Ok(())
    }

    /// Get a product by id
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    /// List products, optionally filtered by category label.
    /// Returns the page plus the total match count.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        category: Option<String>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut query = product::Entity::find().order_by_asc(product::Column::Name);
        if let Some(cat) = category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            query = query.filter(product::Column::Category.eq(cat));
        }

        let paginator = query.paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Batch lookup used by checkout and cart quoting. Returns a map of
    /// the products that exist; callers decide what a missing id means.
    pub async fn find_products(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, product::Model>, ServiceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let found = product::Entity::find()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .all(&*self.db)
            .await?;
        Ok(found.into_iter().map(|p| (p.id, p)).collect())
    }

    /// Create a new category
    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name cannot be empty".into(),
            ));
        }

        let category_id = Uuid::new_v4();
        let model = category::ActiveModel {
            id: Set(category_id),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            created_at: Set(Utc::now()),
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(category_id))
            .await;

        info!("Created category: {}", category_id);
        Ok(created)
    }

    /// Update an existing category
    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        let existing = category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;
        let mut active: category::ActiveModel = existing.into();

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Category name cannot be empty".into(),
                ));
            }
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }

        let updated = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryUpdated(category_id))
            .await;

        Ok(updated)
    }

    /// Delete a category. Products keep their string label; nothing
    /// cascades.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let result = category::Entity::delete_by_id(category_id)
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Category {} not found",
                category_id
            )));
        }

        self.event_sender
            .send_or_log(Event::CategoryDeleted(category_id))
            .await;

        info!("Deleted category: {}", category_id);
        Ok(())
    }

    /// List all categories, oldest first
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(category::Entity::find()
            .order_by_asc(category::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }
}

fn validate_product_fields(name: &str, category: &str, price: Decimal) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "Product name cannot be empty".into(),
        ));
    }
    if category.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "Product category cannot be empty".into(),
        ));
    }
    if price <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "Product price must be positive".into(),
        ));
    }
    Ok(())
}

/// Input for creating a product
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

/// Input for updating a product
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
}

/// Input for creating a category
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub description: Option<String>,
}

/// Input for updating a category
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
}
