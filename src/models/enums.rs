//! Enumeration types for constrained backend values.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an order.
///
/// See [`crate::workflow`] for the allowed transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Submitted, awaiting an administrator decision.
    Pending,
    /// Accepted by an administrator.
    Approved,
    /// Declined by an administrator.
    Rejected,
    /// Handed over to the shop.
    Delivered,
}

impl OrderStatus {
    /// Wire representation used by the backend.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Delivered => "delivered",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration state of a shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopStatus {
    /// Registered, awaiting review.
    Pending,
    /// Allowed to place orders.
    Approved,
    /// Declined or suspended.
    Rejected,
}

impl ShopStatus {
    /// Wire representation used by the backend.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl core::fmt::Display for ShopStatus {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application role granted to a user through the `user_roles` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRole {
    /// Manages catalog, shops and the order lifecycle.
    Admin,
    /// Browses the catalog and orders on behalf of an approved shop.
    BusinessOwner,
}

impl core::fmt::Display for AppRole {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match *self {
            Self::Admin => "admin",
            Self::BusinessOwner => "business_owner",
        })
    }
}
