//! Order and order item models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OrderId, OrderItemId, OrderStatus, ProductId, ShopId};

/// An order placed by a shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier (UUID).
    pub id: OrderId,
    /// Ordering shop.
    pub shop_id: ShopId,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Discounted cart total frozen at submission.
    #[serde(default)]
    pub total_amount: Option<f64>,
    /// Free-text delivery estimate set on approval.
    #[serde(default)]
    pub delivery_estimate: Option<String>,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrder {
    /// Ordering shop.
    pub shop_id: ShopId,
    /// Discounted cart total.
    pub total_amount: f64,
    /// Initial state, always [`OrderStatus::Pending`].
    pub status: OrderStatus,
}

/// Patch payload for an order status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderUpdate {
    /// New state.
    pub status: OrderStatus,
    /// Delivery estimate; omitted from the patch when `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_estimate: Option<String>,
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique identifier (UUID).
    pub id: OrderItemId,
    /// Owning order.
    pub order_id: OrderId,
    /// Ordered product.
    pub product_id: ProductId,
    /// Units ordered.
    pub quantity: u32,
    /// Tier price at submission.
    pub unit_price: f64,
    /// `quantity * unit_price`.
    pub total_price: f64,
}

/// Insert payload for an order line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrderItem {
    /// Owning order.
    pub order_id: OrderId,
    /// Ordered product.
    pub product_id: ProductId,
    /// Units ordered.
    pub quantity: u32,
    /// Tier price at submission.
    pub unit_price: f64,
    /// `quantity * unit_price`.
    pub total_price: f64,
}

/// Product code and name embedded in order listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLabel {
    /// Product code.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// An order line as embedded in order listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Units ordered.
    pub quantity: u32,
    /// Tier price at submission.
    pub unit_price: f64,
    /// `quantity * unit_price`.
    pub total_price: f64,
    /// Product label; absent if the product was deleted since.
    #[serde(default, rename = "products")]
    pub product: Option<ProductLabel>,
}

/// An order with its lines, as listed to the owning shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopOrder {
    /// The order record.
    #[serde(flatten)]
    pub order: Order,
    /// Lines of the order.
    #[serde(default)]
    pub order_items: Vec<OrderLine>,
}

/// Owner contact embedded in the joined-orders procedure result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderOwnerContact {
    /// Full name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Shop summary embedded in the joined-orders procedure result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderShopSummary {
    /// Shop name.
    pub name: String,
    /// Shop address.
    pub location: String,
    /// Owner contact.
    #[serde(default)]
    pub profiles: Option<OrderOwnerContact>,
}

/// An order joined with shop, owner and line details, as returned by the
/// administrator listing procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    /// Order identifier.
    pub id: OrderId,
    /// Lifecycle state.
    pub status: OrderStatus,
    /// Discounted total.
    #[serde(default)]
    pub total_amount: Option<f64>,
    /// Delivery estimate.
    #[serde(default)]
    pub delivery_estimate: Option<String>,
    /// Submission timestamp.
    pub created_at: DateTime<Utc>,
    /// Ordering shop.
    #[serde(default)]
    pub shops: Option<OrderShopSummary>,
    /// Lines of the order.
    #[serde(default)]
    pub order_items: Vec<OrderLine>,
}

/// Result of a successful order submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedOrder {
    /// The created order.
    pub order: Order,
    /// The created lines.
    pub items: Vec<OrderItem>,
    /// `false` if the order was placed but the submitted lines could not
    /// be taken out of the stored cart, which may still hold them.
    pub cart_saved: bool,
}
