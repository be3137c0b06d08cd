//! Order and shop status state machines.
//!
//! Orders move `pending → approved → delivered` or `pending → rejected`.
//! Shops move `pending → approved | rejected`; administrators may also
//! suspend an approved shop (`approved → rejected`) and re-approve a
//! rejected one. Nothing else is allowed, including "transitions" to the
//! current state.

use crate::error::{Result, WholesaleError};
use crate::models::{OrderStatus, OrderUpdate, ShopStatus};

/// An administrator decision on an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderAction {
    /// Accept a pending order, optionally with a delivery estimate.
    Approve {
        /// Free-text estimate; blank estimates are dropped.
        delivery_estimate: Option<String>,
    },
    /// Decline a pending order.
    Reject,
    /// Mark an approved order as delivered.
    Deliver,
}

impl OrderAction {
    /// Status the action moves an order to.
    #[inline]
    #[must_use]
    pub const fn target(&self) -> OrderStatus {
        match *self {
            Self::Approve { .. } => OrderStatus::Approved,
            Self::Reject => OrderStatus::Rejected,
            Self::Deliver => OrderStatus::Delivered,
        }
    }

    /// Converts the action into the patch sent to the backend.
    ///
    /// A blank delivery estimate is dropped so the stored value is left
    /// untouched.
    #[inline]
    #[must_use]
    pub fn into_update(self) -> OrderUpdate {
        let status = self.target();
        let delivery_estimate = match self {
            Self::Approve { delivery_estimate } => delivery_estimate
                .map(|estimate| estimate.trim().to_owned())
                .filter(|estimate| !estimate.is_empty()),
            Self::Reject | Self::Deliver => None,
        };
        OrderUpdate {
            status,
            delivery_estimate,
        }
    }
}

/// Returns `true` if an order may move from `from` to `to`.
#[inline]
#[must_use]
pub const fn order_transition_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    matches!(
        (from, to),
        (OrderStatus::Pending, OrderStatus::Approved | OrderStatus::Rejected)
            | (OrderStatus::Approved, OrderStatus::Delivered)
    )
}

/// Validates an order transition.
///
/// # Errors
///
/// Returns [`WholesaleError::InvalidOrderTransition`] if the move is not
/// allowed.
#[inline]
pub fn check_order_transition(from: OrderStatus, to: OrderStatus) -> Result<OrderStatus> {
    if order_transition_allowed(from, to) {
        Ok(to)
    } else {
        Err(WholesaleError::InvalidOrderTransition { from, to })
    }
}

/// An administrator decision on a shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShopAction {
    /// Approve a pending shop.
    Approve,
    /// Reject a pending shop.
    Reject,
    /// Suspend an approved shop.
    Suspend,
    /// Re-approve a rejected or suspended shop.
    Reinstate,
}

impl ShopAction {
    /// Status the action moves a shop to.
    #[inline]
    #[must_use]
    pub const fn target(self) -> ShopStatus {
        match self {
            Self::Approve | Self::Reinstate => ShopStatus::Approved,
            Self::Reject | Self::Suspend => ShopStatus::Rejected,
        }
    }

    /// Status the shop must currently be in.
    #[inline]
    #[must_use]
    pub const fn source(self) -> ShopStatus {
        match self {
            Self::Approve | Self::Reject => ShopStatus::Pending,
            Self::Suspend => ShopStatus::Approved,
            Self::Reinstate => ShopStatus::Rejected,
        }
    }
}

/// Returns `true` if a shop may move from `from` to `to`.
#[inline]
#[must_use]
pub const fn shop_transition_allowed(from: ShopStatus, to: ShopStatus) -> bool {
    matches!(
        (from, to),
        (ShopStatus::Pending, ShopStatus::Approved | ShopStatus::Rejected)
            | (ShopStatus::Approved, ShopStatus::Rejected)
            | (ShopStatus::Rejected, ShopStatus::Approved)
    )
}

/// Validates a shop action against the shop's current status.
///
/// The action must start from its own [`ShopAction::source`], so
/// "reject" cannot be used to suspend and "approve" cannot reinstate.
///
/// # Errors
///
/// Returns [`WholesaleError::InvalidShopTransition`] if the move is not
/// allowed.
#[inline]
pub fn check_shop_action(current: ShopStatus, action: ShopAction) -> Result<ShopStatus> {
    let to = action.target();
    if current == action.source() && shop_transition_allowed(current, to) {
        Ok(to)
    } else {
        Err(WholesaleError::InvalidShopTransition { from: current, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// All order states.
    const ORDER_STATES: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Approved,
        OrderStatus::Rejected,
        OrderStatus::Delivered,
    ];

    /// All shop states.
    const SHOP_STATES: [ShopStatus; 3] = [
        ShopStatus::Pending,
        ShopStatus::Approved,
        ShopStatus::Rejected,
    ];

    #[test]
    fn order_transition_table() {
        let mut allowed = Vec::new();
        for from in ORDER_STATES {
            for to in ORDER_STATES {
                if order_transition_allowed(from, to) {
                    allowed.push((from, to));
                }
            }
        }
        assert_eq!(
            allowed,
            vec![
                (OrderStatus::Pending, OrderStatus::Approved),
                (OrderStatus::Pending, OrderStatus::Rejected),
                (OrderStatus::Approved, OrderStatus::Delivered),
            ]
        );
    }

    #[test]
    fn terminal_order_states_have_no_exit() {
        for to in ORDER_STATES {
            assert!(check_order_transition(OrderStatus::Delivered, to).is_err());
            assert!(check_order_transition(OrderStatus::Rejected, to).is_err());
        }
    }

    #[test]
    fn approved_order_cannot_be_rejected() {
        let err = check_order_transition(OrderStatus::Approved, OrderStatus::Rejected).unwrap_err();
        assert!(matches!(
            err,
            WholesaleError::InvalidOrderTransition {
                from: OrderStatus::Approved,
                to: OrderStatus::Rejected
            }
        ));
    }

    #[test]
    fn order_action_targets() {
        assert_eq!(
            OrderAction::Approve {
                delivery_estimate: None
            }
            .target(),
            OrderStatus::Approved
        );
        assert_eq!(OrderAction::Reject.target(), OrderStatus::Rejected);
        assert_eq!(OrderAction::Deliver.target(), OrderStatus::Delivered);
    }

    #[test]
    fn blank_estimate_is_dropped() {
        let update = OrderAction::Approve {
            delivery_estimate: Some("   ".to_owned()),
        }
        .into_update();
        assert_eq!(update.status, OrderStatus::Approved);
        assert!(update.delivery_estimate.is_none());

        let update = OrderAction::Approve {
            delivery_estimate: Some(" 3-5 days ".to_owned()),
        }
        .into_update();
        assert_eq!(update.delivery_estimate.as_deref(), Some("3-5 days"));

        let update = OrderAction::Reject.into_update();
        assert_eq!(update.status, OrderStatus::Rejected);
        assert!(update.delivery_estimate.is_none());
    }

    #[test]
    fn shop_transition_table() {
        let mut allowed = Vec::new();
        for from in SHOP_STATES {
            for to in SHOP_STATES {
                if shop_transition_allowed(from, to) {
                    allowed.push((from, to));
                }
            }
        }
        assert_eq!(
            allowed,
            vec![
                (ShopStatus::Pending, ShopStatus::Approved),
                (ShopStatus::Pending, ShopStatus::Rejected),
                (ShopStatus::Approved, ShopStatus::Rejected),
                (ShopStatus::Rejected, ShopStatus::Approved),
            ]
        );
    }

    #[test]
    fn shop_actions_require_their_source_state() {
        assert_eq!(
            check_shop_action(ShopStatus::Pending, ShopAction::Approve).unwrap(),
            ShopStatus::Approved
        );
        assert_eq!(
            check_shop_action(ShopStatus::Approved, ShopAction::Suspend).unwrap(),
            ShopStatus::Rejected
        );
        assert_eq!(
            check_shop_action(ShopStatus::Rejected, ShopAction::Reinstate).unwrap(),
            ShopStatus::Approved
        );
        assert!(check_shop_action(ShopStatus::Approved, ShopAction::Reject).is_err());
        assert!(check_shop_action(ShopStatus::Rejected, ShopAction::Approve).is_err());
        assert!(check_shop_action(ShopStatus::Pending, ShopAction::Suspend).is_err());
        assert!(check_shop_action(ShopStatus::Approved, ShopAction::Approve).is_err());
    }
}
