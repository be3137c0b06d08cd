//! Data models for storefront records.
//!
//! Every record the backend returns is deserialized into one of these
//! types; a payload that does not fit is rejected at the boundary rather
//! than travelling further as loose JSON.

mod category;
mod enums;
mod ids;
mod order;
mod product;
mod shop;
mod user;

pub use category::{Category, CategoryDraft, CategoryRef};
pub use enums::{AppRole, OrderStatus, ShopStatus};
pub use ids::{CategoryId, OrderId, OrderItemId, ProductId, ShopId, UserId};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderDetails, OrderItem, OrderLine, OrderOwnerContact,
    OrderShopSummary, OrderUpdate, ProductLabel, ShopOrder, SubmittedOrder,
};
pub use product::{
    NewProduct, Product, ProductCode, ProductDraft, ProductSnapshot, next_product_code,
};
pub use shop::{NewShop, OwnerProfile, Shop, ShopApplication, ShopRegistration, ShopWithOwner};
pub use user::{AuthUser, NewUserRole, Session, UserRoleRow};
