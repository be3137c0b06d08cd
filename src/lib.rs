//! Rust library for a B2B wholesale storefront.
//!
//! Shop owners browse a catalog priced in four volume tiers, collect
//! products in a locally persisted cart and submit it as an order for
//! their approved shop. Administrators manage the catalog, register and
//! approve shops, and move orders through their approval workflow.
//!
//! The backend is a hosted PostgREST-style service; [`client`] talks to
//! it, [`storefront`] combines the client with a [`storage`] backend for
//! the cart. Pricing, the cart and the status workflows are pure and
//! usable without any network feature.
//!
//! # Example
//!
//! ```rust
//! use wholesale_rs::cart::Cart;
//! use wholesale_rs::pricing::{DiscountPolicy, TierPrices, resolve_price};
//!
//! let prices = TierPrices::new(10.0, 9.0, 8.0, 7.0);
//! assert_eq!(resolve_price(&prices, 49), 9.0);
//!
//! let cart = Cart::new();
//! assert_eq!(cart.summary(DiscountPolicy::default()).total, 0.0);
//! ```

pub mod cart;
#[cfg(any(feature = "async", feature = "blocking"))]
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod pricing;
pub mod storage;
#[cfg(any(feature = "async", feature = "blocking"))]
pub mod storefront;
pub mod workflow;
