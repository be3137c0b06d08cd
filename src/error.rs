//! Error types for the wholesale storefront library.

use crate::models::{AppRole, OrderStatus, ShopStatus};

/// All errors that can occur when using the storefront client.
#[derive(Debug, thiserror::Error)]
pub enum WholesaleError {
    /// A required startup configuration value is absent.
    #[error("missing required configuration value: {0}")]
    MissingConfig(&'static str),

    /// A configuration value is present but unusable.
    #[error("invalid configuration value for {name}: {reason}")]
    InvalidConfig {
        /// Name of the offending setting.
        name: &'static str,
        /// Human-readable explanation.
        reason: String,
    },

    /// The HTTP transport failed.
    #[cfg(any(feature = "async", feature = "blocking"))]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request URL could not be built.
    #[cfg(any(feature = "async", feature = "blocking"))]
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The backend answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or a fallback description.
        message: String,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend answered successfully but the payload was not usable.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A record fetched from or destined for the backend violates a
    /// boundary constraint.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A referenced record does not exist (or is hidden by row-level
    /// security).
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `"order"`.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Local cart storage failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),

    /// The operation needs a signed-in user but no access token is set.
    #[error("not signed in")]
    Unauthenticated,

    /// The signed-in user lacks the role the operation requires.
    #[error("this action requires the {required} role")]
    Forbidden {
        /// Role that would have allowed the operation.
        required: AppRole,
    },

    /// Order submission was attempted with an empty cart.
    #[error("cart is empty")]
    EmptyCart,

    /// The signed-in user owns no approved shop.
    #[error("no approved shop found for your account")]
    NoApprovedShop,

    /// The signed-in user owns more than one approved shop.
    #[error("expected exactly one approved shop, found {0}")]
    MultipleApprovedShops(usize),

    /// The requested order status change is not allowed.
    #[error("order cannot move from {from} to {to}")]
    InvalidOrderTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },

    /// The requested shop status change is not allowed.
    #[error("shop cannot move from {from} to {to}")]
    InvalidShopTransition {
        /// Current status.
        from: ShopStatus,
        /// Requested status.
        to: ShopStatus,
    },
}

impl WholesaleError {
    /// Returns `true` for errors a UI should answer with a redirect to a
    /// sign-in or fallback view rather than an error notification.
    #[inline]
    #[must_use]
    pub const fn is_authorization(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Forbidden { .. })
    }
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, WholesaleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_from_serde_json() {
        let serde_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err = WholesaleError::from(serde_err);
        assert!(matches!(err, WholesaleError::Serialization(_)));
        let msg = err.to_string();
        assert!(msg.contains("serialization error"));
    }

    #[test]
    fn error_storage_display() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = WholesaleError::Storage(Box::new(inner));
        let msg = err.to_string();
        assert!(msg.contains("storage error"));
        assert!(msg.contains("file missing"));
    }

    #[test]
    fn error_no_approved_shop_is_user_readable() {
        let err = WholesaleError::NoApprovedShop;
        assert_eq!(err.to_string(), "no approved shop found for your account");
    }

    #[test]
    fn error_transition_names_both_states() {
        let err = WholesaleError::InvalidOrderTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        };
        let msg = err.to_string();
        assert!(msg.contains("delivered"));
        assert!(msg.contains("pending"));
    }

    #[test]
    fn authorization_classification() {
        assert!(WholesaleError::Unauthenticated.is_authorization());
        assert!(
            WholesaleError::Forbidden {
                required: AppRole::Admin
            }
            .is_authorization()
        );
        assert!(!WholesaleError::EmptyCart.is_authorization());
        assert!(
            !WholesaleError::Api {
                status: 500,
                message: "boom".to_owned()
            }
            .is_authorization()
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WholesaleError>();
    }
}
