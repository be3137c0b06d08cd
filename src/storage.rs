//! Pluggable storage backends for the client-local cart.
//!
//! This module defines the [`CartStorage`] (async) and
//! [`BlockingCartStorage`] (blocking) traits via a shared macro, mirroring
//! the client generation pattern in [`crate::client`].

#[cfg(feature = "storage-file")]
mod file;
mod memory;

#[cfg(feature = "storage-file")]
pub use file::FileStorage;
pub use memory::InMemoryStorage;

/// Generates a storage trait (async or blocking) with all cart methods.
///
/// Uses `@methods` to define the method list once, and `@method` to render
/// each method in async (`impl Future + Send`) or blocking (`fn`) style.
macro_rules! define_storage {
    // ── Entry points ────────────────────────────────────────────────
    (
        trait_name: $trait_name:ident,
        trait_doc: $trait_doc:expr,
        mode: async_mode,
    ) => {
        #[doc = $trait_doc]
        pub trait $trait_name: core::fmt::Debug + Send + Sync {
            define_storage!(@methods async_mode);
        }
    };
    (
        trait_name: $trait_name:ident,
        trait_doc: $trait_doc:expr,
        mode: blocking,
    ) => {
        #[doc = $trait_doc]
        pub trait $trait_name: core::fmt::Debug + Send + Sync {
            define_storage!(@methods blocking);
        }
    };

    // ── Single method list (shared between both variants) ───────────
    (@methods $mode:ident) => {
        define_storage!(@method $mode, cart_items,
            "Returns the persisted cart lines in their stored order.\n\nReturns an empty `Vec` if nothing was saved yet.\n\n# Errors\n\nReturns an error if the storage backend fails to read or the stored cart cannot be parsed.",
            -> Result<Vec<CartItem>>);
        define_storage!(@method $mode, save_cart_items,
            "Replaces the persisted cart with `items`.\n\n# Errors\n\nReturns an error if the storage backend fails to write.",
            items: Vec<CartItem>, -> Result<()>);
        define_storage!(@method $mode, clear_cart,
            "Removes the persisted cart.\n\n# Errors\n\nReturns an error if the storage backend fails to write.",
            -> Result<()>);
    };

    // ── Blocking method renderer ────────────────────────────────────
    (@method blocking, $name:ident, $doc:expr,
     $($param:ident: $param_ty:ty,)* -> $ret:ty) => {
        #[doc = $doc]
        fn $name(&self $(, $param: $param_ty)*) -> $ret;
    };

    // ── Async method renderer (returns impl Future + Send) ──────────
    (@method async_mode, $name:ident, $doc:expr,
     $($param:ident: $param_ty:ty,)* -> $ret:ty) => {
        #[doc = $doc]
        fn $name(&self $(, $param: $param_ty)*)
            -> impl core::future::Future<Output = $ret> + Send;
    };
}

#[cfg(feature = "async")]
mod async_storage {
    //! Async storage trait definition.

    use crate::cart::CartItem;
    use crate::error::Result;

    define_storage! {
        trait_name: CartStorage,
        trait_doc: "Async storage backend for the persisted cart.\n\nAll methods take `&self`; implementations use interior mutability\n(e.g. `Mutex`) for thread-safe mutation.",
        mode: async_mode,
    }
}

#[cfg(feature = "blocking")]
mod blocking_storage {
    //! Blocking storage trait definition.

    use crate::cart::CartItem;
    use crate::error::Result;

    define_storage! {
        trait_name: BlockingCartStorage,
        trait_doc: "Blocking storage backend for the persisted cart.\n\nAll methods take `&self`; implementations use interior mutability\n(e.g. `Mutex`) for thread-safe mutation.",
        mode: blocking,
    }
}

#[cfg(feature = "async")]
pub use async_storage::CartStorage;
#[cfg(feature = "blocking")]
pub use blocking_storage::BlockingCartStorage;
