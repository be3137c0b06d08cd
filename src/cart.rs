//! Client-local cart.
//!
//! A [`Cart`] is an ordered list of lines keyed by product. It is plain
//! state: persistence goes through [`crate::storage`] and the only
//! mutation path in an application is [`crate::storefront`].

use serde::{Deserialize, Serialize};

use crate::models::{Product, ProductId, ProductSnapshot};
use crate::pricing::{self, DiscountPolicy, PricingSummary};

/// A cart line: a product snapshot and the units wanted.
///
/// Serialized in the same camelCase shape the web storefront keeps in
/// local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product key of the line.
    pub product_id: ProductId,
    /// Units wanted (always at least 1).
    pub quantity: u32,
    /// Product data captured when the line was created.
    pub product: ProductSnapshot,
}

impl CartItem {
    /// Tier price that applies to this line's quantity.
    #[inline]
    #[must_use]
    pub const fn unit_price(&self) -> f64 {
        pricing::resolve_price(&self.product.prices, self.quantity)
    }

    /// `unit_price * quantity`.
    #[inline]
    #[must_use]
    pub fn line_total(&self) -> f64 {
        pricing::line_total(&self.product.prices, self.quantity)
    }
}

/// Ordered collection of cart lines, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    /// Lines in insertion order.
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates an empty cart.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a cart from persisted lines.
    ///
    /// Lines are keyed by their `product_id`; a snapshot carrying a
    /// different id is re-keyed to it. Lines with zero quantity are dropped
    /// and duplicate products merged, so a hand-edited or stale file cannot
    /// break the one-line-per-product rule.
    #[must_use]
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Self::new();
        for item in items {
            let CartItem {
                product_id,
                quantity,
                mut product,
            } = item;
            if product.id != product_id {
                tracing::debug!(
                    product_id = %product_id,
                    snapshot_id = %product.id,
                    "stored line keyed differently from its snapshot"
                );
                product.id = product_id;
            }
            let _changed = cart.add_snapshot(product, i64::from(quantity));
        }
        cart
    }

    /// Returns the lines in insertion order.
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Consumes the cart and returns its lines.
    #[inline]
    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    /// Returns `true` if the cart has no lines.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct products.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines.
    #[inline]
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Returns the line for a product, if any.
    #[inline]
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == *product_id)
    }

    /// Adds `quantity` units of `product`, merging into an existing line.
    ///
    /// Non-positive quantities are ignored. Returns `true` if the cart
    /// changed.
    #[inline]
    pub fn add(&mut self, product: &Product, quantity: i64) -> bool {
        self.add_snapshot(product.snapshot(), quantity)
    }

    /// Adds units of an already captured product snapshot.
    ///
    /// Merging keeps the snapshot of the existing line.
    pub fn add_snapshot(&mut self, snapshot: ProductSnapshot, quantity: i64) -> bool {
        let Some(quantity) = positive_quantity(quantity) else {
            return false;
        };
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == snapshot.id)
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem {
                product_id: snapshot.id.clone(),
                quantity,
                product: snapshot,
            });
        }
        true
    }

    /// Sets the quantity of a line; zero or below removes it.
    ///
    /// Unknown products are ignored. Returns `true` if the cart changed.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> bool {
        let Some(quantity) = positive_quantity(quantity) else {
            return self.remove(product_id);
        };
        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == *product_id)
        {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            Some(_) | None => false,
        }
    }

    /// Removes the line for a product. Removing a missing line is a no-op.
    ///
    /// Returns `true` if a line was removed.
    #[inline]
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != *product_id);
        self.items.len() != before
    }

    /// Takes already ordered lines out of the cart.
    ///
    /// Each matching line loses the ordered units and is removed once none
    /// are left, so units added after the order was taken stay. Returns
    /// `true` if the cart changed.
    pub fn remove_submitted(&mut self, submitted: &[CartItem]) -> bool {
        let mut changed = false;
        for line in submitted {
            if let Some(item) = self
                .items
                .iter_mut()
                .find(|item| item.product_id == line.product_id)
            {
                item.quantity = item.quantity.saturating_sub(line.quantity);
                changed = true;
            }
        }
        self.items.retain(|item| item.quantity > 0);
        changed
    }

    /// Removes every line.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of line totals before any discount.
    #[inline]
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Recomputes subtotal, discount and total under `policy`.
    #[inline]
    #[must_use]
    pub fn summary(&self, policy: DiscountPolicy) -> PricingSummary {
        PricingSummary::compute(
            self.items
                .iter()
                .map(|item| (&item.product.prices, item.quantity)),
            policy,
        )
    }
}

/// Converts a caller quantity into a line quantity; `None` when not
/// positive. Quantities beyond `u32::MAX` saturate.
fn positive_quantity(quantity: i64) -> Option<u32> {
    (quantity > 0).then(|| u32::try_from(quantity).unwrap_or(u32::MAX))
}
