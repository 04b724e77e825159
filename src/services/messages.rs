use crate::{
    entities::message,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Contact-message intake and admin inbox.
#[derive(Clone)]
pub struct MessageService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl MessageService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Store a contact-form message
    #[instrument(skip(self, input), fields(from = %input.name))]
    pub async fn create_message(
        &self,
        input: CreateMessageInput,
    ) -> Result<message::Model, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::ValidationError("Name is required".into()));
        }
        if !input.email.contains('@') {
            return Err(ServiceError::ValidationError(
                "A valid email address is required".into(),
            ));
        }
        if input.body.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Message body cannot be empty".into(),
            ));
        }

        let message_id = Uuid::new_v4();
        let model = message::ActiveModel {
            id: Set(message_id),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email.trim().to_string()),
            body: Set(input.body.trim().to_string()),
            created_at: Set(Utc::now()),
        };

        let created = model.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::MessageReceived(message_id))
            .await;

        info!("Stored contact message: {}", message_id);
        Ok(created)
    }

    /// List messages, newest first, with the total count.
    #[instrument(skip(self))]
    pub async fn list_messages(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<message::Model>, u64), ServiceError> {
        let paginator = message::Entity::find()
            .order_by_desc(message::Column::CreatedAt)
            .paginate(&*self.db, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Get a message by id
    pub async fn get_message(&self, message_id: Uuid) -> Result<message::Model, ServiceError> {
        message::Entity::find_by_id(message_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Message {} not found", message_id)))
    }

    /// Delete a message from the inbox
    #[instrument(skip(self))]
    pub async fn delete_message(&self, message_id: Uuid) -> Result<(), ServiceError> {
        let result = message::Entity::delete_by_id(message_id)
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Message {} not found",
                message_id
            )));
        }
        info!("Deleted message: {}", message_id);
        Ok(())
    }

    /// Counts messages received after the referenced one; same badge
    /// semantics as orders.
    pub async fn count_new_since(&self, since: Option<Uuid>) -> Result<u64, ServiceError> {
        let Some(since_id) = since else {
            return Ok(0);
        };
        let Some(reference) = message::Entity::find_by_id(since_id).one(&*self.db).await? else {
            return Ok(0);
        };
        let count = message::Entity::find()
            .filter(message::Column::CreatedAt.gt(reference.created_at))
            .count(&*self.db)
            .await?;
        Ok(count)
    }
}

/// Contact-form input
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMessageInput {
    pub name: String,
    pub email: String,
    pub body: String,
}
