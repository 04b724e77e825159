use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One priced line in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// In-memory cart holding the canonical merge semantics.
///
/// The storefront keeps the cart client-side; this type is the single
/// definition of how lines merge and price, used by quoting and
/// checkout. Invariant: a product id appears in at most one line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units of a product. An existing line for the
    /// same product id is incremented; otherwise a new line is
    /// appended at the end.
    pub fn add(&mut self, product_id: Uuid, name: &str, unit_price: Decimal, quantity: i32) {
        if quantity <= 0 {
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity += quantity;
        } else {
            self.lines.push(CartLine {
                product_id,
                name: name.to_string(),
                unit_price,
                quantity,
            });
        }
    }

    /// Sets a line's quantity. Zero or negative removes the line.
    pub fn set_quantity(&mut self, product_id: Uuid, quantity: i32) {
        if quantity <= 0 {
            self.remove(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
        }
    }

    /// Removes a line entirely. Unknown ids are a no-op.
    pub fn remove(&mut self, product_id: Uuid) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(|l| l.line_total()).sum()
    }
}
