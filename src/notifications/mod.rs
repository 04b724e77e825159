use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::entities::order;

/// Notification errors
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram rejected message for chat {chat_id}: {description}")]
    Rejected { chat_id: String, description: String },
    #[error("No delivery succeeded")]
    AllDeliveriesFailed,
}

/// Seam for pushing order notifications to the staff.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn order_created(&self, order: &order::Model) -> Result<(), NotificationError>;
}

/// Telegram Bot API implementation of [`OrderNotifier`].
///
/// Posts `sendMessage` once per configured chat id. Individual chat
/// failures are logged and skipped; the call only errors when no chat
/// receives the message.
#[derive(Clone)]
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(api_base: String, bot_token: String, chat_ids: Vec<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            bot_token,
            chat_ids,
        }
    }

    /// Builds a notifier from configuration. Returns `None` when the
    /// bot token or chat list is absent, which disables notifications.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let bot_token = config
            .telegram_bot_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())?
            .to_string();
        let chat_ids = config.telegram_chat_id_list();
        if chat_ids.is_empty() {
            warn!("Telegram bot token configured but no chat ids; notifications disabled");
            return None;
        }
        Some(Self::new(
            config.telegram_api_base.clone(),
            bot_token,
            chat_ids,
        ))
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    async fn send_to_chat(&self, chat_id: &str, text: &str) -> Result<(), NotificationError> {
        let response = self
            .http
            .post(self.send_message_url())
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?;

        let status = response.status();
        let body: TelegramResponse = response.json().await.unwrap_or(TelegramResponse {
            ok: status.is_success(),
            description: None,
        });
        if !status.is_success() || !body.ok {
            return Err(NotificationError::Rejected {
                chat_id: chat_id.to_string(),
                description: body
                    .description
                    .unwrap_or_else(|| format!("HTTP {}", status)),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OrderNotifier for TelegramNotifier {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn order_created(&self, order: &order::Model) -> Result<(), NotificationError> {
        let text = format_order_message(order);

        let mut delivered = 0usize;
        for chat_id in &self.chat_ids {
            match self.send_to_chat(chat_id, &text).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!(chat_id, "Telegram delivery failed: {}", e),
            }
        }

        if delivered == 0 {
            return Err(NotificationError::AllDeliveriesFailed);
        }
        info!(delivered, total = self.chat_ids.len(), "Order notification sent");
        Ok(())
    }
}

/// Renders the staff-facing order message (Uzbek, matching the
/// storefront's established notification format).
pub fn format_order_message(order: &order::Model) -> String {
    let items_list = match order.order_items() {
        Ok(items) if !items.is_empty() => items
            .iter()
            .map(|item| {
                format!(
                    "- {} ({} dona) — {} so'm",
                    item.name,
                    item.quantity,
                    group_thousands(item.unit_price)
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        _ => "— Mahsulotlar ro'yxati mavjud emas".to_string(),
    };

    let delivery_info = if order.delivery_fee > Decimal::ZERO {
        format!(
            "\n🚚 Yetkazib berish: {} so'm",
            group_thousands(order.delivery_fee)
        )
    } else {
        String::new()
    };

    let location_info = match (&order.maps_url, order.latitude, order.longitude) {
        (Some(url), Some(lat), Some(lng)) => {
            format!("\n📍 Joylashuv: {}\nKoordinatalar: {:.6}, {:.6}", url, lat, lng)
        }
        (Some(url), _, _) => format!("\n📍 Joylashuv: {}", url),
        _ => String::new(),
    };

    let distance_info = match order.distance_km {
        Some(km) => format!("\n📏 Masofa: {:.1} km", km),
        None => String::new(),
    };

    format!(
        "🧾 Yangi buyurtma!\n\n\
         👤 Ism: {name}\n\
         📞 Telefon: {phone}\n\
         📍 Manzil: {address}{location_info}{distance_info}\n\
         🍽 Mahsulotlar:\n\
         {items_list}\n\n\
         💰 Mahsulotlar: {subtotal} so'm{delivery_info}\n\
         💰 Umumiy summa: {total} so'm\n\
         ⏰ Vaqt: {time}",
        name = order.customer_name,
        phone = order.phone,
        address = order.address,
        subtotal = group_thousands(order.subtotal),
        total = group_thousands(order.total),
        time = order.created_at.to_rfc3339(),
    )
}

/// Groups an amount into comma-separated thousands ("50,000").
/// Amounts are whole so'm; any fractional part is dropped.
fn group_thousands(amount: Decimal) -> String {
    let whole = amount.trunc().to_string();
    let (sign, digits) = match whole.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", whole.as_str()),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}", sign, grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sample_order(delivery_fee: Decimal) -> order::Model {
        let items = serde_json::json!([
            {
                "product_id": Uuid::new_v4(),
                "name": "Mol go'shtli donar",
                "quantity": 2,
                "unit_price": "28000",
                "line_total": "56000"
            },
            {
                "product_id": Uuid::new_v4(),
                "name": "Cola 0.5",
                "quantity": 1,
                "unit_price": "8000",
                "line_total": "8000"
            }
        ]);
        order::Model {
            id: Uuid::new_v4(),
            customer_name: "Aziz".into(),
            phone: "+998901234567".into(),
            address: "Chilonzor 12".into(),
            items,
            subtotal: dec!(64000),
            delivery_fee,
            total: dec!(64000) + delivery_fee,
            latitude: None,
            longitude: None,
            maps_url: None,
            distance_km: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn groups_thousands_with_commas() {
        assert_eq!(group_thousands(dec!(0)), "0");
        assert_eq!(group_thousands(dec!(950)), "950");
        assert_eq!(group_thousands(dec!(8000)), "8,000");
        assert_eq!(group_thousands(dec!(64000)), "64,000");
        assert_eq!(group_thousands(dec!(1250000)), "1,250,000");
    }

    #[test]
    fn message_lists_items_and_totals() {
        let msg = format_order_message(&sample_order(dec!(0)));
        assert!(msg.contains("🧾 Yangi buyurtma!"));
        assert!(msg.contains("👤 Ism: Aziz"));
        assert!(msg.contains("- Mol go'shtli donar (2 dona) — 28,000 so'm"));
        assert!(msg.contains("💰 Mahsulotlar: 64,000 so'm"));
        assert!(msg.contains("💰 Umumiy summa: 64,000 so'm"));
    }

    #[test]
    fn message_omits_delivery_line_when_free() {
        let msg = format_order_message(&sample_order(dec!(0)));
        assert!(!msg.contains("🚚 Yetkazib berish"));
    }

    #[test]
    fn message_includes_delivery_fee_when_charged() {
        let msg = format_order_message(&sample_order(dec!(10000)));
        assert!(msg.contains("🚚 Yetkazib berish: 10,000 so'm"));
        assert!(msg.contains("💰 Umumiy summa: 74,000 so'm"));
    }

    #[test]
    fn message_includes_location_and_distance_when_present() {
        let mut order = sample_order(dec!(0));
        order.latitude = Some(41.2995);
        order.longitude = Some(69.2401);
        order.maps_url = Some("https://maps.google.com/?q=41.2995,69.2401".into());
        order.distance_km = Some(3.27);

        let msg = format_order_message(&order);
        assert!(msg.contains("📍 Joylashuv: https://maps.google.com/?q=41.2995,69.2401"));
        assert!(msg.contains("Koordinatalar: 41.299500, 69.240100"));
        assert!(msg.contains("📏 Masofa: 3.3 km"));
    }

    #[test]
    fn message_handles_empty_items() {
        let mut order = sample_order(dec!(0));
        order.items = serde_json::json!([]);
        let msg = format_order_message(&order);
        assert!(msg.contains("— Mahsulotlar ro'yxati mavjud emas"));
    }
}
