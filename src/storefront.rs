//! High-level storefront with an integrated cart.
//!
//! Combines the low-level HTTP client with a [`CartStorage`] /
//! [`BlockingCartStorage`] backend. The storefront owns the only mutable
//! cart of the application: every change goes through it, is applied under
//! one lock and then persisted. Order submission, the approval workflows,
//! catalog and shop administration and the dashboard counts live here too.
//!
//! Role checks happen locally before any request is sent; the backend's
//! row-level security remains the authority.
//!
//! [`CartStorage`]: crate::storage::CartStorage
//! [`BlockingCartStorage`]: crate::storage::BlockingCartStorage

use std::sync::PoisonError;

use crate::cart::Cart;
use crate::error::{Result, WholesaleError};
use crate::models::{
    AppRole, NewOrderItem, OrderId, OwnerProfile, Session, Shop, ShopStatus, ShopWithOwner, UserId,
};

/// Headline numbers for the administrator dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminStats {
    /// Registered shops.
    pub shops: u64,
    /// Catalog products.
    pub products: u64,
    /// Orders awaiting a decision.
    pub pending_orders: u64,
    /// Product categories.
    pub categories: u64,
}

/// Headline numbers for the business-owner dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerStats {
    /// Catalog products available to order.
    pub products: u64,
    /// Orders placed by the owner's shops.
    pub orders: u64,
}

/// Dashboard numbers for the signed-in user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardStats {
    /// Administrator view.
    Admin(AdminStats),
    /// Business-owner view.
    BusinessOwner(OwnerStats),
}

/// Cached identity of the storefront's user.
#[derive(Debug, Clone, Default)]
enum SessionState {
    /// Not looked up yet, or invalidated by a refresh.
    #[default]
    Unresolved,
    /// Resolved user and roles.
    Active(Session),
    /// Signed out; stays so for the lifetime of the storefront.
    SignedOut,
}

/// The in-memory cart and a counter bumped on every change.
///
/// A save is only final once the revision it wrote is still current.
#[derive(Debug, Default)]
struct CartState {
    /// The authoritative cart.
    cart: Cart,
    /// Number of changes applied so far.
    revision: u64,
}

impl CartState {
    /// Applies `change` and bumps the revision if the cart changed.
    fn apply<F: FnOnce(&mut Cart) -> bool>(&mut self, change: F) -> bool {
        let changed = change(&mut self.cart);
        if changed {
            self.revision = self.revision.wrapping_add(1);
        }
        changed
    }

    /// Replaces the whole cart.
    fn replace(&mut self, cart: Cart) {
        self.cart = cart;
        self.revision = self.revision.wrapping_add(1);
    }

    /// Copy of the cart if it moved past `revision`.
    fn newer_than(&self, revision: u64) -> Option<(Cart, u64)> {
        (self.revision != revision).then(|| (self.cart.clone(), self.revision))
    }
}

/// Fails with [`WholesaleError::Forbidden`] unless `session` holds `role`.
fn require_role(session: &Session, role: AppRole) -> Result<()> {
    if session.has_role(role) {
        Ok(())
    } else {
        tracing::debug!(user_id = %session.user.id, required = %role, "role check failed");
        Err(WholesaleError::Forbidden { required: role })
    }
}

/// Picks the one approved shop an owner orders for.
fn single_approved_shop(shops: Vec<Shop>) -> Result<Shop> {
    let mut approved: Vec<Shop> = shops
        .into_iter()
        .filter(|shop| shop.status == ShopStatus::Approved)
        .collect();
    match approved.len() {
        0 => Err(WholesaleError::NoApprovedShop),
        1 => approved.pop().ok_or(WholesaleError::NoApprovedShop),
        many => Err(WholesaleError::MultipleApprovedShops(many)),
    }
}

/// Freezes the cart's current tier prices into order lines.
fn order_lines(order_id: &OrderId, cart: &Cart) -> Vec<NewOrderItem> {
    cart.items()
        .iter()
        .map(|item| NewOrderItem {
            order_id: order_id.clone(),
            product_id: item.product_id.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price(),
            total_price: item.line_total(),
        })
        .collect()
}

/// Distinct owners of `shops`, in a stable order.
fn owner_ids(shops: &[Shop]) -> Vec<UserId> {
    let mut owners: Vec<UserId> = shops.iter().map(|shop| shop.owner_id.clone()).collect();
    owners.sort_unstable();
    owners.dedup();
    owners
}

/// The most recently created shop called `name`.
fn newest_named(shops: Vec<Shop>, name: &str) -> Option<Shop> {
    shops
        .into_iter()
        .filter(|shop| shop.name == name)
        .max_by_key(|shop| shop.created_at)
}

/// Pairs every shop with its owner's profile.
fn attach_owners(shops: Vec<Shop>, profiles: &[OwnerProfile]) -> Vec<ShopWithOwner> {
    shops
        .into_iter()
        .map(|shop| {
            let owner = profiles
                .iter()
                .find(|profile| profile.user_id == shop.owner_id)
                .cloned();
            ShopWithOwner { shop, owner }
        })
        .collect()
}

/// Wraps a poisoned lock into a [`WholesaleError::Storage`].
fn poisoned<T>(err: &PoisonError<T>) -> WholesaleError {
    WholesaleError::Storage(err.to_string().into())
}

/// Generates a high-level storefront (async or blocking).
macro_rules! define_storefront {
    (
        storefront_name: $storefront:ident,
        builder_name: $builder:ident,
        http_client: $http_client:ty,
        storage_trait: $storage_trait:ident,
        storefront_doc: $storefront_doc:expr,
        builder_doc: $builder_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
    ) => {
        #[doc = $builder_doc]
        #[derive(Debug)]
        pub struct $builder<S: $storage_trait> {
            /// Backend base URL.
            base_url: Option<String>,
            /// Publishable API key.
            publishable_key: Option<String>,
            /// Signed-in user's access token.
            access_token: Option<String>,
            /// Cart discount policy.
            discount_policy: DiscountPolicy,
            /// Cart storage backend.
            storage: Option<S>,
        }

        impl<S: $storage_trait> $builder<S> {
            /// Sets the backend base URL.
            #[inline]
            #[must_use]
            pub fn base_url<T: Into<String>>(mut self, url: T) -> Self {
                self.base_url = Some(url.into());
                self
            }

            /// Sets the publishable API key.
            #[inline]
            #[must_use]
            pub fn publishable_key<T: Into<String>>(mut self, key: T) -> Self {
                self.publishable_key = Some(key.into());
                self
            }

            /// Sets the signed-in user's access token.
            #[inline]
            #[must_use]
            pub fn access_token<T: Into<String>>(mut self, token: T) -> Self {
                self.access_token = Some(token.into());
                self
            }

            /// Sets the cart discount policy.
            #[inline]
            #[must_use]
            pub const fn discount_policy(mut self, policy: DiscountPolicy) -> Self {
                self.discount_policy = policy;
                self
            }

            /// Copies URL, key, token and discount policy from a loaded
            /// [`Config`].
            #[inline]
            #[must_use]
            pub fn config(mut self, config: &Config) -> Self {
                self.base_url = Some(config.url.clone());
                self.publishable_key = Some(config.publishable_key.expose_secret().to_owned());
                self.access_token = config
                    .access_token
                    .as_ref()
                    .map(|token| token.expose_secret().to_owned());
                self.discount_policy = config.discount_policy;
                self
            }

            /// Sets the cart storage backend.
            #[inline]
            #[must_use]
            pub fn storage(mut self, storage: S) -> Self {
                self.storage = Some(storage);
                self
            }

            /// Builds the storefront with an empty cart; call
            /// `restore_cart` to load the persisted one.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::Storage`] if no storage was provided.
            /// Returns [`WholesaleError::MissingConfig`] if the base URL or
            /// publishable key is missing.
            /// Returns [`WholesaleError::Http`] if the HTTP client fails to build.
            #[inline]
            pub fn build(self) -> Result<$storefront<S>> {
                let storage = self.storage.ok_or_else(|| {
                    WholesaleError::Storage("storage backend is required".into())
                })?;

                let mut http_builder = <$http_client>::builder();
                if let Some(url) = self.base_url {
                    http_builder = http_builder.base_url(url);
                }
                if let Some(key) = self.publishable_key {
                    http_builder = http_builder.publishable_key(key);
                }
                if let Some(token) = self.access_token {
                    http_builder = http_builder.access_token(token);
                }
                let client = http_builder.build()?;

                Ok($storefront {
                    client,
                    storage,
                    discount_policy: self.discount_policy,
                    cart: Mutex::new(CartState::default()),
                    session: Mutex::new(SessionState::default()),
                })
            }
        }

        #[doc = $storefront_doc]
        #[derive(Debug)]
        pub struct $storefront<S: $storage_trait> {
            /// Low-level HTTP client.
            client: $http_client,
            /// Cart storage backend.
            storage: S,
            /// Cart discount policy.
            discount_policy: DiscountPolicy,
            /// The authoritative cart and its revision.
            cart: Mutex<CartState>,
            /// Cached session.
            session: Mutex<SessionState>,
        }

        impl<S: $storage_trait> $storefront<S> {
            /// Creates a new builder for configuring the storefront.
            #[inline]
            #[must_use]
            pub const fn builder() -> $builder<S> {
                $builder {
                    base_url: None,
                    publishable_key: None,
                    access_token: None,
                    discount_policy: DiscountPolicy::SubtotalThreshold,
                    storage: None,
                }
            }

            /// Returns the low-level HTTP client.
            #[inline]
            #[must_use]
            pub const fn client(&self) -> &$http_client {
                &self.client
            }

            /// Returns the cart storage backend.
            #[inline]
            #[must_use]
            pub const fn storage(&self) -> &S {
                &self.storage
            }

            /// Returns the discount policy applied to the cart.
            #[inline]
            #[must_use]
            pub const fn discount_policy(&self) -> DiscountPolicy {
                self.discount_policy
            }

            // ── Session ─────────────────────────────────────────────

            /// Returns the signed-in user and roles, resolving them on
            /// first use.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::Unauthenticated`] if there is no
            /// access token, the backend rejects it, or the storefront was
            /// signed out.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn session(&self) -> Result<Session> {
                match self.session_state()? {
                    SessionState::Active(session) => Ok(session),
                    SessionState::SignedOut => Err(WholesaleError::Unauthenticated),
                    SessionState::Unresolved => self.resolve_session() $( .$await_ext )?,
                }
            }

            /// Drops the cached session and resolves it again, e.g. after
            /// an administrator changed the user's roles.
            ///
            /// # Errors
            ///
            /// Same as [`Self::session`].
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn refresh_session(&self) -> Result<Session> {
                if matches!(self.session_state()?, SessionState::SignedOut) {
                    return Err(WholesaleError::Unauthenticated);
                }
                self.resolve_session() $( .$await_ext )?
            }

            /// Forgets the session. Every later operation that needs a user
            /// fails with [`WholesaleError::Unauthenticated`].
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::Storage`] if the session lock is
            /// poisoned.
            #[inline]
            pub fn sign_out(&self) -> Result<()> {
                *self.session.lock().map_err(|err| poisoned(&err))? = SessionState::SignedOut;
                tracing::info!("signed out");
                Ok(())
            }

            // ── Cart ────────────────────────────────────────────────

            /// Loads the persisted cart, replacing the in-memory one.
            ///
            /// A stored cart that cannot be parsed is discarded with a
            /// warning instead of blocking the storefront. Returns the
            /// number of restored lines.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to read.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn restore_cart(&self) -> Result<usize> {
                let items = match self.storage.cart_items() $( .$await_ext )? {
                    Ok(items) => items,
                    Err(WholesaleError::Serialization(err)) => {
                        tracing::warn!(error = %err, "discarding unreadable stored cart");
                        Vec::new()
                    }
                    Err(err) => return Err(err),
                };
                let restored = Cart::from_items(items);
                let lines = restored.len();
                self.lock_cart()?.replace(restored);
                tracing::debug!(lines, "cart restored");
                Ok(lines)
            }

            /// Returns a copy of the cart.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::Storage`] if the cart lock is
            /// poisoned.
            #[inline]
            pub fn cart(&self) -> Result<Cart> {
                Ok(self.lock_cart()?.cart.clone())
            }

            /// Prices the cart under the storefront's discount policy.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::Storage`] if the cart lock is
            /// poisoned.
            #[inline]
            pub fn cart_summary(&self) -> Result<PricingSummary> {
                Ok(self.lock_cart()?.cart.summary(self.discount_policy))
            }

            /// Adds `quantity` units of `product` and persists the cart.
            ///
            /// Non-positive quantities leave the cart untouched. Returns the
            /// updated cart.
            ///
            /// # Errors
            ///
            /// Returns an error if persisting the cart fails.
            #[tracing::instrument(skip_all, fields(product_id = %product.id, quantity = quantity))]
            pub $($async_kw)? fn add_to_cart(&self, product: &Product, quantity: i64) -> Result<Cart> {
                self.change_cart(|cart| cart.add(product, quantity)) $( .$await_ext )?
            }

            /// Fetches a product and adds it to the cart.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::NotFound`] if the product does not
            /// exist, or an error if fetching or persisting fails.
            #[tracing::instrument(skip_all, fields(product_id = %product_id, quantity = quantity))]
            pub $($async_kw)? fn add_product_to_cart(
                &self,
                product_id: &ProductId,
                quantity: i64,
            ) -> Result<Cart> {
                let product = self.client.product(product_id) $( .$await_ext )? ?;
                self.change_cart(|cart| cart.add(&product, quantity)) $( .$await_ext )?
            }

            /// Sets a line's quantity; zero or less removes the line.
            ///
            /// # Errors
            ///
            /// Returns an error if persisting the cart fails.
            #[tracing::instrument(skip_all, fields(product_id = %product_id, quantity = quantity))]
            pub $($async_kw)? fn update_cart_quantity(
                &self,
                product_id: &ProductId,
                quantity: i64,
            ) -> Result<Cart> {
                self.change_cart(|cart| cart.set_quantity(product_id, quantity)) $( .$await_ext )?
            }

            /// Removes a line. Removing an absent line is a no-op.
            ///
            /// # Errors
            ///
            /// Returns an error if persisting the cart fails.
            #[tracing::instrument(skip_all, fields(product_id = %product_id))]
            pub $($async_kw)? fn remove_from_cart(&self, product_id: &ProductId) -> Result<Cart> {
                self.change_cart(|cart| cart.remove(product_id)) $( .$await_ext )?
            }

            /// Empties the cart and its persisted copy.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to write.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn clear_cart(&self) -> Result<()> {
                let revision = {
                    let mut state = self.lock_cart()?;
                    let _changed = state.apply(|cart| {
                        cart.clear();
                        true
                    });
                    state.revision
                };
                self.persist_cart(Cart::new(), revision) $( .$await_ext )?
            }

            // ── Catalog ─────────────────────────────────────────────

            /// Lists the catalog ordered by product code.
            ///
            /// # Errors
            ///
            /// Returns an error if the request fails or a product is
            /// malformed.
            #[inline]
            pub $($async_kw)? fn products(&self) -> Result<Vec<Product>> {
                self.client.products() $( .$await_ext )?
            }

            /// Fetches one product.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::NotFound`] if it does not exist, or
            /// an error if the request fails.
            #[inline]
            pub $($async_kw)? fn product(&self, id: &ProductId) -> Result<Product> {
                self.client.product(id) $( .$await_ext )?
            }

            /// Lists categories ordered by code.
            ///
            /// # Errors
            ///
            /// Returns an error if the request fails.
            #[inline]
            pub $($async_kw)? fn categories(&self) -> Result<Vec<Category>> {
                self.client.categories() $( .$await_ext )?
            }

            /// Creates a category (administrators only).
            ///
            /// # Errors
            ///
            /// Returns an authorization error for non-administrators,
            /// [`WholesaleError::InvalidRecord`] for a blank draft, or an
            /// error if the request fails.
            #[tracing::instrument(skip_all, fields(code = %draft.code))]
            pub $($async_kw)? fn create_category(&self, draft: &CategoryDraft) -> Result<Category> {
                let _admin = self.require(AppRole::Admin) $( .$await_ext )? ?;
                draft.validate()?;
                let category = self.client.create_category(draft) $( .$await_ext )? ?;
                tracing::info!(category_id = %category.id, "category created");
                Ok(category)
            }

            /// Changes a category's code and name (administrators only).
            ///
            /// # Errors
            ///
            /// Same as [`Self::create_category`], plus
            /// [`WholesaleError::NotFound`].
            #[tracing::instrument(skip_all, fields(category_id = %id))]
            pub $($async_kw)? fn update_category(
                &self,
                id: &CategoryId,
                draft: &CategoryDraft,
            ) -> Result<Category> {
                let _admin = self.require(AppRole::Admin) $( .$await_ext )? ?;
                draft.validate()?;
                self.client.update_category(id, draft) $( .$await_ext )?
            }

            /// Deletes a category (administrators only).
            ///
            /// # Errors
            ///
            /// Returns an authorization error for non-administrators, or an
            /// error if the request fails.
            #[tracing::instrument(skip_all, fields(category_id = %id))]
            pub $($async_kw)? fn delete_category(&self, id: &CategoryId) -> Result<()> {
                let _admin = self.require(AppRole::Admin) $( .$await_ext )? ?;
                self.client.delete_category(id) $( .$await_ext )?
            }

            /// Creates a product with a generated code (administrators only).
            ///
            /// The code is the category code followed by one more than the
            /// highest running number already used in that category.
            ///
            /// # Errors
            ///
            /// Returns an authorization error for non-administrators,
            /// [`WholesaleError::InvalidRecord`] for an invalid draft,
            /// [`WholesaleError::NotFound`] for an unknown category, or an
            /// error if a request fails.
            #[tracing::instrument(skip_all, fields(category_id = %draft.category_id))]
            pub $($async_kw)? fn create_product(&self, draft: ProductDraft) -> Result<Product> {
                let _admin = self.require(AppRole::Admin) $( .$await_ext )? ?;
                draft.validate()?;
                let categories = self.client.categories() $( .$await_ext )? ?;
                let category = categories
                    .into_iter()
                    .find(|category| category.id == draft.category_id)
                    .ok_or_else(|| WholesaleError::NotFound {
                        entity: "category",
                        id: draft.category_id.as_inner().to_owned(),
                    })?;
                let codes = self.client.product_codes(&category.id) $( .$await_ext )? ?;
                let code = next_product_code(&category.code, codes.iter().map(String::as_str));
                tracing::debug!(code = %code, "generated product code");
                let product = self
                    .client
                    .create_product(&NewProduct { code, draft })
                    $( .$await_ext )?
                    ?;
                tracing::info!(product_id = %product.id, code = %product.code, "product created");
                Ok(product)
            }

            /// Replaces a product's editable fields (administrators only).
            ///
            /// # Errors
            ///
            /// Same as [`Self::create_product`].
            #[tracing::instrument(skip_all, fields(product_id = %id))]
            pub $($async_kw)? fn update_product(&self, id: &ProductId, draft: &ProductDraft) -> Result<Product> {
                let _admin = self.require(AppRole::Admin) $( .$await_ext )? ?;
                draft.validate()?;
                self.client.update_product(id, draft) $( .$await_ext )?
            }

            /// Deletes a product (administrators only).
            ///
            /// # Errors
            ///
            /// Returns an authorization error for non-administrators, or an
            /// error if the request fails.
            #[tracing::instrument(skip_all, fields(product_id = %id))]
            pub $($async_kw)? fn delete_product(&self, id: &ProductId) -> Result<()> {
                let _admin = self.require(AppRole::Admin) $( .$await_ext )? ?;
                self.client.delete_product(id) $( .$await_ext )?
            }

            // ── Orders ──────────────────────────────────────────────

            /// Turns the cart into a pending order for the owner's approved
            /// shop, then takes the submitted lines out of the cart.
            ///
            /// Unit prices are frozen at the tier the cart quantity reaches
            /// and the order total is the discounted cart total. If the
            /// order lines cannot be stored the order is deleted again and
            /// the original error returned. Once the order is stored the
            /// call succeeds: units added while it was in flight stay in the
            /// cart, and a failure to update the stored cart is logged and
            /// reported through [`SubmittedOrder::cart_saved`].
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::EmptyCart`] for an empty cart, an
            /// authorization error for non-owners,
            /// [`WholesaleError::NoApprovedShop`] or
            /// [`WholesaleError::MultipleApprovedShops`] unless exactly one
            /// approved shop is found, or an error if a request fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn submit_order(&self) -> Result<SubmittedOrder> {
                let cart = self.cart()?;
                if cart.is_empty() {
                    return Err(WholesaleError::EmptyCart);
                }
                let session = self.require(AppRole::BusinessOwner) $( .$await_ext )? ?;
                let shops = self
                    .client
                    .shops_for_owner(&session.user.id, Some(ShopStatus::Approved))
                    $( .$await_ext )?
                    ?;
                let shop = single_approved_shop(shops)?;
                let summary = cart.summary(self.discount_policy);
                tracing::debug!(
                    shop_id = %shop.id,
                    lines = cart.len(),
                    subtotal = summary.subtotal,
                    discount = summary.discount,
                    "submitting order"
                );

                let new_order = NewOrder {
                    shop_id: shop.id,
                    total_amount: summary.total,
                    status: OrderStatus::Pending,
                };
                let order = self.client.insert_order(&new_order) $( .$await_ext )? ?;
                let lines = order_lines(&order.id, &cart);
                let items = match self.client.insert_order_items(&lines) $( .$await_ext )? {
                    Ok(items) => items,
                    Err(err) => {
                        tracing::warn!(order_id = %order.id, error = %err, "order lines failed, deleting order");
                        if let Err(cleanup) = self.client.delete_order(&order.id) $( .$await_ext )? {
                            tracing::warn!(order_id = %order.id, error = %cleanup, "could not delete incomplete order");
                        }
                        return Err(err);
                    }
                };

                let submitted: Vec<CartItem> = cart.into_items();
                let cart_saved = match self
                    .change_cart(|current| current.remove_submitted(&submitted))
                    $( .$await_ext )?
                {
                    Ok(_) => true,
                    Err(err) => {
                        tracing::warn!(order_id = %order.id, error = %err, "order placed but the stored cart was not updated");
                        false
                    }
                };
                tracing::info!(order_id = %order.id, total = summary.total, "order submitted");
                Ok(SubmittedOrder {
                    order,
                    items,
                    cart_saved,
                })
            }

            /// Lists the orders of the signed-in owner's shops, newest first.
            ///
            /// # Errors
            ///
            /// Returns an authorization error for non-owners, or an error if
            /// a request fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn my_orders(&self) -> Result<Vec<ShopOrder>> {
                let session = self.require(AppRole::BusinessOwner) $( .$await_ext )? ?;
                let shops = self
                    .client
                    .shops_for_owner(&session.user.id, None)
                    $( .$await_ext )?
                    ?;
                let mut orders = Vec::new();
                for shop in &shops {
                    orders.extend(self.client.orders_for_shop(&shop.id) $( .$await_ext )? ?);
                }
                orders.sort_by(|left, right| right.order.created_at.cmp(&left.order.created_at));
                Ok(orders)
            }

            /// Lists every order with shop, owner and lines (administrators
            /// only).
            ///
            /// # Errors
            ///
            /// Returns an authorization error for non-administrators, or an
            /// error if the request fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn all_orders(&self) -> Result<Vec<OrderDetails>> {
                let _admin = self.require(AppRole::Admin) $( .$await_ext )? ?;
                self.client.orders_with_details() $( .$await_ext )?
            }

            /// Approves a pending order, storing a non-blank delivery
            /// estimate. The total is left unchanged.
            ///
            /// # Errors
            ///
            /// Returns an authorization error for non-administrators,
            /// [`WholesaleError::InvalidOrderTransition`] unless the order
            /// is pending, or an error if a request fails.
            #[inline]
            pub $($async_kw)? fn approve_order(
                &self,
                id: &OrderId,
                delivery_estimate: Option<String>,
            ) -> Result<Order> {
                self.apply_order_action(id, OrderAction::Approve { delivery_estimate })
                    $( .$await_ext )?
            }

            /// Rejects a pending order.
            ///
            /// # Errors
            ///
            /// Same as [`Self::approve_order`].
            #[inline]
            pub $($async_kw)? fn reject_order(&self, id: &OrderId) -> Result<Order> {
                self.apply_order_action(id, OrderAction::Reject) $( .$await_ext )?
            }

            /// Marks an approved order as delivered.
            ///
            /// # Errors
            ///
            /// Same as [`Self::approve_order`], but the order must be
            /// approved.
            #[inline]
            pub $($async_kw)? fn deliver_order(&self, id: &OrderId) -> Result<Order> {
                self.apply_order_action(id, OrderAction::Deliver) $( .$await_ext )?
            }

            // ── Shops ───────────────────────────────────────────────

            /// Lists all shops, newest first (administrators only).
            ///
            /// # Errors
            ///
            /// Returns an authorization error for non-administrators, or an
            /// error if the request fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn shops(&self) -> Result<Vec<Shop>> {
                let _admin = self.require(AppRole::Admin) $( .$await_ext )? ?;
                self.client.shops() $( .$await_ext )?
            }

            /// Lists all shops with their owners' profiles (administrators
            /// only).
            ///
            /// # Errors
            ///
            /// Same as [`Self::shops`].
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn shops_with_owners(&self) -> Result<Vec<ShopWithOwner>> {
                let shops = self.shops() $( .$await_ext )? ?;
                let owners = owner_ids(&shops);
                let profiles = self.client.owner_profiles(&owners) $( .$await_ext )? ?;
                Ok(attach_owners(shops, &profiles))
            }

            /// Approves a pending shop.
            ///
            /// # Errors
            ///
            /// Returns an authorization error for non-administrators,
            /// [`WholesaleError::InvalidShopTransition`] if the shop is not
            /// pending, or an error if a request fails.
            #[inline]
            pub $($async_kw)? fn approve_shop(&self, id: &ShopId) -> Result<Shop> {
                self.apply_shop_action(id, ShopAction::Approve) $( .$await_ext )?
            }

            /// Rejects a pending shop.
            ///
            /// # Errors
            ///
            /// Same as [`Self::approve_shop`].
            #[inline]
            pub $($async_kw)? fn reject_shop(&self, id: &ShopId) -> Result<Shop> {
                self.apply_shop_action(id, ShopAction::Reject) $( .$await_ext )?
            }

            /// Suspends an approved shop.
            ///
            /// # Errors
            ///
            /// Same as [`Self::approve_shop`], but the shop must be approved.
            #[inline]
            pub $($async_kw)? fn suspend_shop(&self, id: &ShopId) -> Result<Shop> {
                self.apply_shop_action(id, ShopAction::Suspend) $( .$await_ext )?
            }

            /// Re-approves a rejected or suspended shop.
            ///
            /// # Errors
            ///
            /// Same as [`Self::approve_shop`], but the shop must be rejected.
            #[inline]
            pub $($async_kw)? fn reinstate_shop(&self, id: &ShopId) -> Result<Shop> {
                self.apply_shop_action(id, ShopAction::Reinstate) $( .$await_ext )?
            }

            /// Registers an approved shop for an existing user and makes the
            /// user a business owner (administrators only).
            ///
            /// The shop records the administrator in `registered_by`. The
            /// role is only granted if the owner does not hold it yet.
            ///
            /// # Errors
            ///
            /// Returns an authorization error for non-administrators,
            /// [`WholesaleError::InvalidRecord`] for an invalid
            /// registration, or an error if a request fails. A failed role
            /// grant is returned even though the shop was stored.
            #[tracing::instrument(skip_all, fields(owner_id = %registration.owner_id))]
            pub $($async_kw)? fn register_shop(&self, registration: &ShopRegistration) -> Result<Shop> {
                let admin = self.require(AppRole::Admin) $( .$await_ext )? ?;
                registration.validate()?;
                let shop = self
                    .client
                    .insert_shop(&registration.approved_by(&admin.user.id))
                    $( .$await_ext )?
                    ?;
                let roles = self.client.user_roles(&registration.owner_id) $( .$await_ext )? ?;
                if !roles.contains(&AppRole::BusinessOwner) {
                    if let Err(err) = self
                        .client
                        .grant_role(&registration.owner_id, AppRole::BusinessOwner)
                        $( .$await_ext )?
                    {
                        tracing::warn!(shop_id = %shop.id, error = %err, "shop stored but owner role not granted");
                        return Err(err);
                    }
                }
                tracing::info!(shop_id = %shop.id, "shop registered");
                Ok(shop)
            }

            /// Opens a pending shop owned by the signed-in user.
            ///
            /// The backend procedure also grants the business-owner role,
            /// so the session is refreshed afterwards. The new shop is
            /// looked up by name since the procedure returns no row.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::InvalidRecord`] for a blank
            /// application, [`WholesaleError::Unauthenticated`] without a
            /// session, [`WholesaleError::NotFound`] if the created shop is
            /// not visible afterwards, or an error if a request fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn open_shop(&self, application: &ShopApplication) -> Result<Shop> {
                application.validate()?;
                let session = self.session() $( .$await_ext )? ?;
                self.client.create_own_shop(application) $( .$await_ext )? ?;
                let _refreshed = self.refresh_session() $( .$await_ext )? ?;
                let shops = self
                    .client
                    .shops_for_owner(&session.user.id, None)
                    $( .$await_ext )?
                    ?;
                let shop = newest_named(shops, &application.shop_name).ok_or_else(|| {
                    WholesaleError::NotFound {
                        entity: "shop",
                        id: application.shop_name.clone(),
                    }
                })?;
                tracing::info!(shop_id = %shop.id, status = %shop.status, "shop opened");
                Ok(shop)
            }

            // ── Dashboard ───────────────────────────────────────────

            /// Returns the dashboard numbers for the signed-in user's role.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::Forbidden`] if the user holds
            /// neither role, or an error if a request fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn dashboard_stats(&self) -> Result<DashboardStats> {
                let session = self.session() $( .$await_ext )? ?;
                if session.is_admin() {
                    let pending = eq_filter(OrderStatus::Pending.as_str());
                    let stats = AdminStats {
                        shops: self.client.count(table::SHOPS, &[]) $( .$await_ext )? ?,
                        products: self.client.count(table::PRODUCTS, &[]) $( .$await_ext )? ?,
                        pending_orders: self
                            .client
                            .count(table::ORDERS, &[("status", pending.as_str())])
                            $( .$await_ext )?
                            ?,
                        categories: self.client.count(table::CATEGORIES, &[]) $( .$await_ext )? ?,
                    };
                    return Ok(DashboardStats::Admin(stats));
                }
                require_role(&session, AppRole::BusinessOwner)?;
                let products = self.client.count(table::PRODUCTS, &[]) $( .$await_ext )? ?;
                let shops = self
                    .client
                    .shops_for_owner(&session.user.id, None)
                    $( .$await_ext )?
                    ?;
                let orders = if shops.is_empty() {
                    0
                } else {
                    let shop_filter = in_filter(shops.iter().map(|shop| shop.id.as_inner()));
                    self.client
                        .count(table::ORDERS, &[("shop_id", shop_filter.as_str())])
                        $( .$await_ext )?
                        ?
                };
                Ok(DashboardStats::BusinessOwner(OwnerStats { products, orders }))
            }

            // ── Private helpers ─────────────────────────────────────

            /// Returns a copy of the cached session state.
            fn session_state(&self) -> Result<SessionState> {
                Ok(self.session.lock().map_err(|err| poisoned(&err))?.clone())
            }

            /// Looks up the user and roles and caches them.
            $($async_kw)? fn resolve_session(&self) -> Result<Session> {
                let user = self.client.current_user() $( .$await_ext )? ?;
                let roles = self.client.user_roles(&user.id) $( .$await_ext )? ?;
                let session = Session { user, roles };
                tracing::debug!(
                    user_id = %session.user.id,
                    admin = session.is_admin(),
                    business_owner = session.is_business_owner(),
                    "session resolved"
                );
                *self.session.lock().map_err(|err| poisoned(&err))? =
                    SessionState::Active(session.clone());
                Ok(session)
            }

            /// Resolves the session and checks it holds `role`.
            $($async_kw)? fn require(&self, role: AppRole) -> Result<Session> {
                let session = self.session() $( .$await_ext )? ?;
                require_role(&session, role)?;
                Ok(session)
            }

            /// Locks the cart state.
            fn lock_cart(&self) -> Result<MutexGuard<'_, CartState>> {
                self.cart.lock().map_err(|err| poisoned(&err))
            }

            /// Applies a cart change and persists the result if it changed.
            $($async_kw)? fn change_cart<F: FnOnce(&mut Cart) -> bool>(&self, change: F) -> Result<Cart> {
                let (updated, changed, revision) = {
                    let mut state = self.lock_cart()?;
                    let changed = state.apply(change);
                    (state.cart.clone(), changed, state.revision)
                };
                if changed {
                    self.persist_cart(updated.clone(), revision) $( .$await_ext )? ?;
                } else {
                    tracing::trace!("cart unchanged");
                }
                Ok(updated)
            }

            /// Writes `cart`, taken at `revision`, to storage.
            ///
            /// Concurrent changes may finish their writes in any order, so
            /// after each write the current revision is checked and the
            /// newest cart written again until the stored copy is current.
            $($async_kw)? fn persist_cart(&self, cart: Cart, revision: u64) -> Result<()> {
                let mut pending = cart;
                let mut pending_revision = revision;
                loop {
                    let lines = pending.len();
                    if pending.is_empty() {
                        self.storage.clear_cart() $( .$await_ext )? ?;
                    } else {
                        self.storage
                            .save_cart_items(pending.into_items())
                            $( .$await_ext )?
                            ?;
                    }
                    let newer = self.lock_cart()?.newer_than(pending_revision);
                    let Some((latest, latest_revision)) = newer else {
                        tracing::debug!(lines, revision = pending_revision, "cart saved");
                        return Ok(());
                    };
                    tracing::debug!(
                        written = pending_revision,
                        latest = latest_revision,
                        "cart changed while saving, writing again"
                    );
                    pending = latest;
                    pending_revision = latest_revision;
                }
            }

            /// Validates and applies an administrator decision on an order.
            #[tracing::instrument(skip_all, fields(order_id = %id, to = %action.target()))]
            $($async_kw)? fn apply_order_action(&self, id: &OrderId, action: OrderAction) -> Result<Order> {
                let _admin = self.require(AppRole::Admin) $( .$await_ext )? ?;
                let current = self.client.order(id) $( .$await_ext )? ?;
                let _target = check_order_transition(current.status, action.target())?;
                let update = action.into_update();
                let order = self
                    .client
                    .update_order(id, current.status, &update)
                    $( .$await_ext )?
                    ?;
                tracing::info!(from = %current.status, to = %order.status, "order status changed");
                Ok(order)
            }

            /// Validates and applies an administrator decision on a shop.
            #[tracing::instrument(skip_all, fields(shop_id = %id, to = %action.target()))]
            $($async_kw)? fn apply_shop_action(&self, id: &ShopId, action: ShopAction) -> Result<Shop> {
                let _admin = self.require(AppRole::Admin) $( .$await_ext )? ?;
                let current = self.client.shop(id) $( .$await_ext )? ?;
                let target = check_shop_action(current.status, action)?;
                let shop = self
                    .client
                    .update_shop_status(id, current.status, target)
                    $( .$await_ext )?
                    ?;
                tracing::info!(from = %current.status, to = %shop.status, "shop status changed");
                Ok(shop)
            }
        }
    };
}

// ── Async variant ───────────────────────────────────────────────────────

#[cfg(feature = "async")]
mod async_storefront {
    //! Async storefront.

    use std::sync::{Mutex, MutexGuard};

    use secrecy::ExposeSecret;

    use super::{
        AdminStats, CartState, DashboardStats, OwnerStats, SessionState, attach_owners,
        newest_named, order_lines, owner_ids, poisoned, require_role, single_approved_shop,
    };
    use crate::cart::{Cart, CartItem};
    use crate::client::{WholesaleClient, eq_filter, in_filter, table};
    use crate::config::Config;
    use crate::error::{Result, WholesaleError};
    use crate::models::{
        AppRole, Category, CategoryDraft, CategoryId, NewOrder, NewProduct, Order, OrderDetails,
        OrderId, OrderStatus, Product, ProductDraft, ProductId, Session, Shop, ShopId, ShopOrder,
        ShopApplication, ShopRegistration, ShopStatus, ShopWithOwner, SubmittedOrder,
        next_product_code,
    };
    use crate::pricing::{DiscountPolicy, PricingSummary};
    use crate::storage::CartStorage;
    use crate::workflow::{OrderAction, ShopAction, check_order_transition, check_shop_action};

    define_storefront! {
        storefront_name: Storefront,
        builder_name: StorefrontBuilder,
        http_client: WholesaleClient,
        storage_trait: CartStorage,
        storefront_doc: "High-level async storefront with an integrated cart.\n\nUse [`Storefront::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`Storefront`].",
        async_kw: async,
        await_kw: await,
    }
}

// ── Blocking variant ────────────────────────────────────────────────────

#[cfg(feature = "blocking")]
mod blocking_storefront {
    //! Blocking storefront.

    use std::sync::{Mutex, MutexGuard};

    use secrecy::ExposeSecret;

    use super::{
        AdminStats, CartState, DashboardStats, OwnerStats, SessionState, attach_owners,
        newest_named, order_lines, owner_ids, poisoned, require_role, single_approved_shop,
    };
    use crate::cart::{Cart, CartItem};
    use crate::client::{WholesaleBlockingClient, eq_filter, in_filter, table};
    use crate::config::Config;
    use crate::error::{Result, WholesaleError};
    use crate::models::{
        AppRole, Category, CategoryDraft, CategoryId, NewOrder, NewProduct, Order, OrderDetails,
        OrderId, OrderStatus, Product, ProductDraft, ProductId, Session, Shop, ShopId, ShopOrder,
        ShopApplication, ShopRegistration, ShopStatus, ShopWithOwner, SubmittedOrder,
        next_product_code,
    };
    use crate::pricing::{DiscountPolicy, PricingSummary};
    use crate::storage::BlockingCartStorage;
    use crate::workflow::{OrderAction, ShopAction, check_order_transition, check_shop_action};

    define_storefront! {
        storefront_name: StorefrontBlocking,
        builder_name: StorefrontBlockingBuilder,
        http_client: WholesaleBlockingClient,
        storage_trait: BlockingCartStorage,
        storefront_doc: "High-level blocking storefront with an integrated cart.\n\nUse [`StorefrontBlocking::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`StorefrontBlocking`].",
    }
}

#[cfg(feature = "async")]
pub use async_storefront::{Storefront, StorefrontBuilder};
#[cfg(feature = "blocking")]
pub use blocking_storefront::{StorefrontBlocking, StorefrontBlockingBuilder};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthUser, CategoryId, Product, ProductId, ShopId};
    use crate::pricing::TierPrices;

    /// Creates a shop owned by `owner` in `status`.
    fn shop(id: &str, owner: &str, status: ShopStatus) -> Shop {
        Shop {
            id: ShopId::from(id),
            owner_id: UserId::from(owner),
            name: format!("Shop {id}"),
            location: "Market Square".to_owned(),
            latitude: None,
            longitude: None,
            status,
            registered_by: None,
            created_at: None,
        }
    }

    /// Creates a product with the given tier prices.
    fn product(id: &str, prices: TierPrices) -> Product {
        Product {
            id: ProductId::from(id),
            code: format!("BEV{id}"),
            name: format!("Drink {id}"),
            description: None,
            image_url: None,
            prices,
            category_id: CategoryId::from("cat-bev"),
            category: None,
        }
    }

    /// Session holding `roles`.
    fn session(roles: Vec<AppRole>) -> Session {
        Session {
            user: AuthUser {
                id: UserId::from("u-1"),
                email: None,
            },
            roles,
        }
    }

    #[test]
    fn role_check_reports_required_role() {
        let owner = session(vec![AppRole::BusinessOwner]);
        require_role(&owner, AppRole::BusinessOwner).unwrap();
        let err = require_role(&owner, AppRole::Admin).unwrap_err();
        assert!(matches!(
            err,
            WholesaleError::Forbidden {
                required: AppRole::Admin
            }
        ));
        assert!(err.is_authorization());
    }

    #[test]
    fn no_approved_shop() {
        let err = single_approved_shop(vec![
            shop("s-1", "u-1", ShopStatus::Pending),
            shop("s-2", "u-1", ShopStatus::Rejected),
        ])
        .unwrap_err();
        assert!(matches!(err, WholesaleError::NoApprovedShop));
        assert!(matches!(
            single_approved_shop(Vec::new()),
            Err(WholesaleError::NoApprovedShop)
        ));
    }

    #[test]
    fn exactly_one_approved_shop() {
        let picked = single_approved_shop(vec![
            shop("s-1", "u-1", ShopStatus::Rejected),
            shop("s-2", "u-1", ShopStatus::Approved),
        ])
        .unwrap();
        assert_eq!(picked.id, ShopId::from("s-2"));
    }

    #[test]
    fn several_approved_shops_are_ambiguous() {
        let err = single_approved_shop(vec![
            shop("s-1", "u-1", ShopStatus::Approved),
            shop("s-2", "u-1", ShopStatus::Approved),
        ])
        .unwrap_err();
        assert!(matches!(err, WholesaleError::MultipleApprovedShops(2)));
    }

    #[test]
    fn order_lines_freeze_tier_prices() {
        let mut cart = Cart::new();
        let _added = cart.add(&product("1", TierPrices::new(10.0, 9.0, 8.0, 7.0)), 10);
        let _added = cart.add(&product("2", TierPrices::new(3.0, 2.5, 2.0, 1.5)), 120);
        let lines = order_lines(&OrderId::from("o-1"), &cart);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].order_id, OrderId::from("o-1"));
        assert_eq!(lines[0].unit_price, 9.0);
        assert_eq!(lines[0].total_price, 90.0);
        assert_eq!(lines[1].quantity, 120);
        assert_eq!(lines[1].unit_price, 1.5);
        assert_eq!(lines[1].total_price, 180.0);
    }

    #[test]
    fn owners_are_attached_by_user() {
        let shops = vec![
            shop("s-1", "u-2", ShopStatus::Approved),
            shop("s-2", "u-1", ShopStatus::Pending),
            shop("s-3", "u-2", ShopStatus::Rejected),
        ];
        assert_eq!(
            owner_ids(&shops),
            vec![UserId::from("u-1"), UserId::from("u-2")]
        );

        let profiles = vec![OwnerProfile {
            user_id: UserId::from("u-2"),
            full_name: Some("Grace".to_owned()),
            phone: None,
        }];
        let joined = attach_owners(shops, &profiles);
        assert_eq!(joined.len(), 3);
        assert_eq!(
            joined[0].owner.as_ref().and_then(|owner| owner.full_name.as_deref()),
            Some("Grace")
        );
        assert!(joined[1].owner.is_none());
        assert!(joined[2].owner.is_some());
    }

    #[cfg(feature = "blocking")]
    mod blocking {
        use super::*;
        use crate::pricing::DiscountPolicy;
        use crate::storage::{BlockingCartStorage, InMemoryStorage};
        use crate::storefront::StorefrontBlocking;

        /// Storefront pointed at an unroutable backend; only local
        /// operations may be exercised.
        fn offline(storage: InMemoryStorage) -> StorefrontBlocking<InMemoryStorage> {
            StorefrontBlocking::builder()
                .base_url("http://127.0.0.1:9")
                .publishable_key("anon")
                .storage(storage)
                .build()
                .unwrap()
        }

        #[test]
        fn builder_requires_storage() {
            let result = StorefrontBlocking::<InMemoryStorage>::builder()
                .base_url("http://127.0.0.1:9")
                .publishable_key("anon")
                .build();
            assert!(matches!(result, Err(WholesaleError::Storage(_))));
        }

        #[test]
        fn cart_changes_are_persisted() {
            let store = offline(InMemoryStorage::new());
            let water = product("1", TierPrices::new(10.0, 9.0, 8.0, 7.0));

            let cart = store.add_to_cart(&water, 5).unwrap();
            assert_eq!(cart.item_count(), 5);
            let cart = store.add_to_cart(&water, 5).unwrap();
            assert_eq!(cart.len(), 1);
            assert_eq!(cart.items()[0].unit_price(), 9.0);

            let summary = store.cart_summary().unwrap();
            assert_eq!(summary.subtotal, 90.0);
            assert_eq!(summary.total, 90.0);

            let stored = store.storage().cart_items().unwrap();
            assert_eq!(stored, cart.items().to_vec());
        }

        #[test]
        fn ignored_changes_are_not_persisted() {
            let storage = InMemoryStorage::new();
            let store = offline(storage);
            let water = product("1", TierPrices::new(10.0, 9.0, 8.0, 7.0));

            let cart = store.add_to_cart(&water, 0).unwrap();
            assert!(cart.is_empty());
            let cart = store.remove_from_cart(&water.id).unwrap();
            assert!(cart.is_empty());
            assert_eq!(store.storage().saves(), 0);
        }

        #[test]
        fn quantity_zero_removes_line() {
            let store = offline(InMemoryStorage::new());
            let water = product("1", TierPrices::new(10.0, 9.0, 8.0, 7.0));
            let _cart = store.add_to_cart(&water, 3).unwrap();

            let cart = store.update_cart_quantity(&water.id, 0).unwrap();
            assert!(cart.is_empty());
            assert!(store.storage().cart_items().unwrap().is_empty());
        }

        #[test]
        fn restore_loads_and_normalizes() {
            let water = product("1", TierPrices::new(10.0, 9.0, 8.0, 7.0));
            let mut saved = Cart::new();
            let _added = saved.add(&water, 30);
            let mut items = saved.into_items();
            items.push(items[0].clone());
            let store = offline(InMemoryStorage::with_items(items));

            assert_eq!(store.restore_cart().unwrap(), 1);
            assert_eq!(store.cart().unwrap().item_count(), 60);
        }

        #[test]
        fn clear_cart_empties_storage() {
            let store = offline(InMemoryStorage::new());
            let _cart = store
                .add_to_cart(&product("1", TierPrices::new(1.0, 1.0, 1.0, 1.0)), 2)
                .unwrap();
            store.clear_cart().unwrap();
            assert!(store.cart().unwrap().is_empty());
            assert!(store.storage().cart_items().unwrap().is_empty());
        }

        #[test]
        fn empty_cart_is_rejected_before_any_request() {
            let store = offline(InMemoryStorage::new());
            assert!(matches!(
                store.submit_order(),
                Err(WholesaleError::EmptyCart)
            ));
        }

        #[test]
        fn session_needs_access_token() {
            let store = offline(InMemoryStorage::new());
            assert!(matches!(
                store.session(),
                Err(WholesaleError::Unauthenticated)
            ));
            assert!(matches!(
                store.all_orders(),
                Err(WholesaleError::Unauthenticated)
            ));
        }

        #[test]
        fn signed_out_storefront_stays_signed_out() {
            let store = StorefrontBlocking::builder()
                .base_url("http://127.0.0.1:9")
                .publishable_key("anon")
                .access_token("jwt")
                .storage(InMemoryStorage::new())
                .build()
                .unwrap();
            store.sign_out().unwrap();
            assert!(matches!(
                store.session(),
                Err(WholesaleError::Unauthenticated)
            ));
            assert!(matches!(
                store.refresh_session(),
                Err(WholesaleError::Unauthenticated)
            ));
        }

        #[test]
        fn discount_policy_from_builder() {
            let store = StorefrontBlocking::builder()
                .base_url("http://127.0.0.1:9")
                .publishable_key("anon")
                .discount_policy(DiscountPolicy::NoDiscount)
                .storage(InMemoryStorage::new())
                .build()
                .unwrap();
            let _cart = store
                .add_to_cart(&product("1", TierPrices::new(30.0, 30.0, 30.0, 30.0)), 100)
                .unwrap();
            let summary = store.cart_summary().unwrap();
            assert_eq!(summary.subtotal, 3000.0);
            assert_eq!(summary.discount, 0.0);
            assert_eq!(store.discount_policy(), DiscountPolicy::NoDiscount);
        }
    }

    #[cfg(feature = "async")]
    mod concurrent {
        use core::future::Future;
        use core::sync::atomic::{AtomicBool, Ordering};
        use core::time::Duration;

        use super::*;
        use crate::cart::CartItem;
        use crate::storage::{CartStorage, InMemoryStorage};
        use crate::storefront::Storefront;

        /// Storage whose first write finishes after every later one.
        #[derive(Debug, Default)]
        struct SlowFirstWrite {
            /// Where the lines end up.
            inner: InMemoryStorage,
            /// Set once the first write has started.
            started: AtomicBool,
        }

        impl CartStorage for SlowFirstWrite {
            fn cart_items(&self) -> impl Future<Output = Result<Vec<CartItem>>> + Send {
                CartStorage::cart_items(&self.inner)
            }

            fn save_cart_items(
                &self,
                items: Vec<CartItem>,
            ) -> impl Future<Output = Result<()>> + Send {
                let first = !self.started.swap(true, Ordering::SeqCst);
                async move {
                    if first {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                    CartStorage::save_cart_items(&self.inner, items).await
                }
            }

            fn clear_cart(&self) -> impl Future<Output = Result<()>> + Send {
                CartStorage::clear_cart(&self.inner)
            }
        }

        #[tokio::test]
        async fn late_stale_write_is_superseded() {
            let store = Storefront::builder()
                .base_url("http://127.0.0.1:9")
                .publishable_key("anon")
                .storage(SlowFirstWrite::default())
                .build()
                .unwrap();
            let water = product("1", TierPrices::new(10.0, 9.0, 8.0, 7.0));
            let juice = product("2", TierPrices::new(3.0, 2.5, 2.0, 1.5));

            let (first, second) =
                tokio::join!(store.add_to_cart(&water, 1), store.add_to_cart(&juice, 1));
            let _first = first.unwrap();
            let _second = second.unwrap();

            let in_memory = store.cart().unwrap();
            let persisted = CartStorage::cart_items(&store.storage().inner).await.unwrap();
            assert_eq!(in_memory.len(), 2);
            assert_eq!(persisted, in_memory.into_items());
            assert_eq!(store.storage().inner.saves(), 3);
        }
    }
}
