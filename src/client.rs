//! HTTP client for the storefront backend.
//!
//! The backend exposes its tables over a PostgREST interface under
//! `/rest/v1/`, two stored procedures under `/rest/v1/rpc/` and the
//! identity service under `/auth/v1/`. Both async and blocking variants are
//! generated from one definition behind feature flags.

use serde::Serialize;
use url::Url;

use crate::error::{Result, WholesaleError};
use crate::models::ShopStatus;

/// Table endpoint prefix.
const REST_PATH: &str = "/rest/v1/";

/// Identity endpoint returning the user behind the access token.
const USER_PATH: &str = "/auth/v1/user";

/// `Prefer` header value asking for inserted or updated rows back.
const RETURN_REPRESENTATION: &str = "return=representation";

/// `Prefer` header value asking for an exact row count.
const COUNT_EXACT: &str = "count=exact";

/// Product projection with the embedded category label.
const PRODUCT_SELECT: &str = "*,categories(code,name)";

/// Order projection with embedded lines and product labels.
const SHOP_ORDER_SELECT: &str = "*,order_items(quantity,unit_price,total_price,products(code,name))";

/// Remote table and procedure names.
pub mod table {
    /// Catalog products.
    pub const PRODUCTS: &str = "products";
    /// Product categories.
    pub const CATEGORIES: &str = "categories";
    /// Registered shops.
    pub const SHOPS: &str = "shops";
    /// Orders.
    pub const ORDERS: &str = "orders";
    /// Order lines.
    pub const ORDER_ITEMS: &str = "order_items";
    /// Role grants.
    pub const USER_ROLES: &str = "user_roles";
    /// Owner profiles.
    pub const PROFILES: &str = "profiles";
    /// Procedure creating a pending shop for the caller and granting the
    /// caller the business-owner role.
    pub const CREATE_SHOP_RPC: &str = "create_new_shop";
    /// Procedure listing all orders with shop, owner and line details.
    pub const ORDERS_WITH_DETAILS_RPC: &str = "get_orders_with_details";
}

/// Patch payload for a shop status change.
#[derive(Debug, Serialize)]
struct ShopStatusPatch {
    /// New state.
    status: ShopStatus,
}

/// Builds an absolute URL for `path` under `base_url` with query pairs.
fn endpoint(base_url: &str, path: &str, query: &[(&str, &str)]) -> Result<Url> {
    let raw = format!("{base_url}{path}");
    let url = if query.is_empty() {
        Url::parse(&raw)?
    } else {
        Url::parse_with_params(&raw, query)?
    };
    tracing::trace!(url = %url, "built endpoint");
    Ok(url)
}

/// Path of a table endpoint.
fn table_path(name: &str) -> String {
    format!("{REST_PATH}{name}")
}

/// Path of a procedure endpoint.
fn rpc_path(name: &str) -> String {
    format!("{REST_PATH}rpc/{name}")
}

/// Equality filter value.
pub(crate) fn eq_filter(value: &str) -> String {
    format!("eq.{value}")
}

/// Membership filter value; every member is double-quoted.
pub(crate) fn in_filter<'value, I: IntoIterator<Item = &'value str>>(values: I) -> String {
    let quoted: Vec<String> = values
        .into_iter()
        .map(|value| format!("\"{}\"", value.replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

/// Extracts the total from a `Content-Range` header such as `0-24/3573`
/// or `*/0`.
fn parse_content_range(header: Option<&str>) -> Result<u64> {
    let raw = header.ok_or_else(|| {
        WholesaleError::UnexpectedResponse("missing Content-Range header".to_owned())
    })?;
    raw.rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            WholesaleError::UnexpectedResponse(format!("unusable Content-Range header `{raw}`"))
        })
}

/// Takes the single row a filtered request is expected to return.
fn first_row<T>(rows: Vec<T>, entity: &'static str, id: &str) -> Result<T> {
    rows.into_iter().next().ok_or_else(|| WholesaleError::NotFound {
        entity,
        id: id.to_owned(),
    })
}

/// Takes the row an insert is expected to echo back.
fn inserted_row<T>(rows: Vec<T>, entity: &'static str) -> Result<T> {
    rows.into_iter().next().ok_or_else(|| {
        WholesaleError::UnexpectedResponse(format!("backend returned no {entity} row"))
    })
}

/// Generates a backend client (async or blocking) with builder, methods, and tests.
macro_rules! define_client {
    (
        client_name: $client:ident,
        builder_name: $builder:ident,
        http_type: $http_type:ty,
        request_type: $req_type:ty,
        response_type: $resp_type:ty,
        client_doc: $client_doc:expr,
        builder_doc: $builder_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
        $(send_bound: $send_bound:tt,)?
    ) => {
        #[doc = $builder_doc]
        #[derive(Debug)]
        pub struct $builder {
            /// Backend base URL.
            base_url: Option<String>,
            /// Publishable API key.
            publishable_key: Option<SecretString>,
            /// Signed-in user's access token.
            access_token: Option<SecretString>,
        }

        impl $builder {
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
                self.publishable_key = Some(SecretString::from(key.into()));
                self
            }

            /// Sets the signed-in user's access token.
            #[inline]
            #[must_use]
            pub fn access_token<T: Into<String>>(mut self, token: T) -> Self {
                self.access_token = Some(SecretString::from(token.into()));
                self
            }

            /// Copies URL, key and token from a loaded [`Config`].
            #[inline]
            #[must_use]
            pub fn config(mut self, config: &Config) -> Self {
                self.base_url = Some(config.url.clone());
                self.publishable_key = Some(SecretString::from(
                    config.publishable_key.expose_secret().to_owned(),
                ));
                self.access_token = config
                    .access_token
                    .as_ref()
                    .map(|token| SecretString::from(token.expose_secret().to_owned()));
                self
            }

            /// Builds the client.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::MissingConfig`] if the base URL or
            /// the publishable key was not provided.
            /// Returns [`WholesaleError::Http`] if the HTTP client fails to build.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub fn build(self) -> Result<$client> {
                let base_url = self
                    .base_url
                    .ok_or(WholesaleError::MissingConfig(URL_VAR))?
                    .trim_end_matches('/')
                    .to_owned();
                let publishable_key = self
                    .publishable_key
                    .ok_or(WholesaleError::MissingConfig(PUBLISHABLE_KEY_VAR))?;
                tracing::debug!(
                    base_url = %base_url,
                    has_access_token = self.access_token.is_some(),
                    "building client"
                );
                let http = <$http_type>::builder().build()?;

                Ok($client {
                    http,
                    base_url,
                    publishable_key,
                    access_token: self.access_token,
                })
            }
        }

        #[doc = $client_doc]
        #[derive(Debug)]
        pub struct $client {
            /// Underlying HTTP client.
            http: $http_type,
            /// Backend base URL without a trailing slash.
            base_url: String,
            /// Publishable API key.
            publishable_key: SecretString,
            /// Signed-in user's access token.
            access_token: Option<SecretString>,
        }

        impl $client {
            /// Creates a new builder for configuring the client.
            #[inline]
            #[must_use]
            pub const fn builder() -> $builder {
                $builder {
                    base_url: None,
                    publishable_key: None,
                    access_token: None,
                }
            }

            /// Returns `true` if requests run on behalf of a signed-in user.
            #[inline]
            #[must_use]
            pub const fn has_access_token(&self) -> bool {
                self.access_token.is_some()
            }

            // ── Identity ────────────────────────────────────────────

            /// Returns the user behind the access token.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::Unauthenticated`] without a request
            /// if no access token is set, or if the backend rejects it.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn current_user(&self) -> Result<AuthUser> {
                if self.access_token.is_none() {
                    return Err(WholesaleError::Unauthenticated);
                }
                self.get_json(USER_PATH, &[]) $( .$await_ext )?
            }

            /// Returns the roles granted to `user_id`.
            ///
            /// # Errors
            ///
            /// Returns an error if the request or deserialization fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(user_id = %user_id))]
            pub $($async_kw)? fn user_roles(&self, user_id: &UserId) -> Result<Vec<AppRole>> {
                let user_filter = eq_filter(user_id.as_inner());
                let rows: Vec<UserRoleRow> = self
                    .get_json(
                        &table_path(table::USER_ROLES),
                        &[("select", "role"), ("user_id", user_filter.as_str())],
                    )
                    $( .$await_ext )?
                    ?;
                Ok(rows.into_iter().map(|row| row.role).collect())
            }

            // ── Catalog ─────────────────────────────────────────────

            /// Lists the catalog ordered by product code, each product with
            /// its category label.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::InvalidRecord`] if any product
            /// carries unusable prices, or an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn products(&self) -> Result<Vec<Product>> {
                let products: Vec<Product> = self
                    .get_json(
                        &table_path(table::PRODUCTS),
                        &[("select", PRODUCT_SELECT), ("order", "code")],
                    )
                    $( .$await_ext )?
                    ?;
                products.iter().try_for_each(Product::validate)?;
                tracing::debug!(count = products.len(), "fetched products");
                Ok(products)
            }

            /// Fetches one product.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::NotFound`] if no such product is
            /// visible, [`WholesaleError::InvalidRecord`] if its prices are
            /// unusable, or an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(product_id = %id))]
            pub $($async_kw)? fn product(&self, id: &ProductId) -> Result<Product> {
                let id_filter = eq_filter(id.as_inner());
                let rows: Vec<Product> = self
                    .get_json(
                        &table_path(table::PRODUCTS),
                        &[("select", PRODUCT_SELECT), ("id", id_filter.as_str())],
                    )
                    $( .$await_ext )?
                    ?;
                let product = first_row(rows, "product", id.as_inner())?;
                product.validate()?;
                Ok(product)
            }

            /// Lists the codes of all products in a category.
            ///
            /// # Errors
            ///
            /// Returns an error if the request or deserialization fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(category_id = %category_id))]
            pub $($async_kw)? fn product_codes(&self, category_id: &CategoryId) -> Result<Vec<String>> {
                let category_filter = eq_filter(category_id.as_inner());
                let rows: Vec<ProductCode> = self
                    .get_json(
                        &table_path(table::PRODUCTS),
                        &[("select", "code"), ("category_id", category_filter.as_str())],
                    )
                    $( .$await_ext )?
                    ?;
                Ok(rows.into_iter().map(|row| row.code).collect())
            }

            /// Inserts a product and returns the stored row.
            ///
            /// # Errors
            ///
            /// Returns an error if the request fails (a duplicate code
            /// surfaces as [`WholesaleError::Api`]).
            #[inline]
            #[tracing::instrument(skip_all, fields(code = %product.code))]
            pub $($async_kw)? fn create_product(&self, product: &NewProduct) -> Result<Product> {
                let rows: Vec<Product> = self
                    .send_json(
                        Method::POST,
                        &table_path(table::PRODUCTS),
                        &[("select", PRODUCT_SELECT)],
                        product,
                    )
                    $( .$await_ext )?
                    ?;
                inserted_row(rows, "product")
            }

            /// Replaces the editable fields of a product.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::NotFound`] if no row was updated, or
            /// an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(product_id = %id))]
            pub $($async_kw)? fn update_product(&self, id: &ProductId, draft: &ProductDraft) -> Result<Product> {
                let id_filter = eq_filter(id.as_inner());
                let rows: Vec<Product> = self
                    .send_json(
                        Method::PATCH,
                        &table_path(table::PRODUCTS),
                        &[("select", PRODUCT_SELECT), ("id", id_filter.as_str())],
                        draft,
                    )
                    $( .$await_ext )?
                    ?;
                first_row(rows, "product", id.as_inner())
            }

            /// Deletes a product.
            ///
            /// # Errors
            ///
            /// Returns an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(product_id = %id))]
            pub $($async_kw)? fn delete_product(&self, id: &ProductId) -> Result<()> {
                let id_filter = eq_filter(id.as_inner());
                self.delete(&table_path(table::PRODUCTS), &[("id", id_filter.as_str())])
                    $( .$await_ext )?
            }

            /// Lists categories ordered by code.
            ///
            /// # Errors
            ///
            /// Returns an error if the request or deserialization fails.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn categories(&self) -> Result<Vec<Category>> {
                self.get_json(
                    &table_path(table::CATEGORIES),
                    &[("select", "*"), ("order", "code")],
                )
                $( .$await_ext )?
            }

            /// Inserts a category and returns the stored row.
            ///
            /// # Errors
            ///
            /// Returns an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(code = %draft.code))]
            pub $($async_kw)? fn create_category(&self, draft: &CategoryDraft) -> Result<Category> {
                let rows: Vec<Category> = self
                    .send_json(Method::POST, &table_path(table::CATEGORIES), &[], draft)
                    $( .$await_ext )?
                    ?;
                inserted_row(rows, "category")
            }

            /// Updates a category's code and name.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::NotFound`] if no row was updated, or
            /// an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(category_id = %id))]
            pub $($async_kw)? fn update_category(&self, id: &CategoryId, draft: &CategoryDraft) -> Result<Category> {
                let id_filter = eq_filter(id.as_inner());
                let rows: Vec<Category> = self
                    .send_json(
                        Method::PATCH,
                        &table_path(table::CATEGORIES),
                        &[("id", id_filter.as_str())],
                        draft,
                    )
                    $( .$await_ext )?
                    ?;
                first_row(rows, "category", id.as_inner())
            }

            /// Deletes a category.
            ///
            /// # Errors
            ///
            /// Returns an error if the request fails, e.g. because products
            /// still reference the category.
            #[inline]
            #[tracing::instrument(skip_all, fields(category_id = %id))]
            pub $($async_kw)? fn delete_category(&self, id: &CategoryId) -> Result<()> {
                let id_filter = eq_filter(id.as_inner());
                self.delete(&table_path(table::CATEGORIES), &[("id", id_filter.as_str())])
                    $( .$await_ext )?
            }

            // ── Shops ───────────────────────────────────────────────

            /// Lists all visible shops, newest first.
            ///
            /// # Errors
            ///
            /// Returns an error if the request or deserialization fails.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn shops(&self) -> Result<Vec<Shop>> {
                self.get_json(
                    &table_path(table::SHOPS),
                    &[("select", "*"), ("order", "created_at.desc")],
                )
                $( .$await_ext )?
            }

            /// Lists the shops owned by `owner_id`, optionally only those in
            /// `status`.
            ///
            /// # Errors
            ///
            /// Returns an error if the request or deserialization fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(owner_id = %owner_id))]
            pub $($async_kw)? fn shops_for_owner(
                &self,
                owner_id: &UserId,
                status: Option<ShopStatus>,
            ) -> Result<Vec<Shop>> {
                let owner_filter = eq_filter(owner_id.as_inner());
                let status_filter = status.map(|wanted| eq_filter(wanted.as_str()));
                let mut query = vec![("select", "*"), ("owner_id", owner_filter.as_str())];
                if let Some(filter) = status_filter.as_deref() {
                    query.push(("status", filter));
                }
                self.get_json(&table_path(table::SHOPS), &query) $( .$await_ext )?
            }

            /// Fetches one shop.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::NotFound`] if no such shop is
            /// visible, or an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(shop_id = %id))]
            pub $($async_kw)? fn shop(&self, id: &ShopId) -> Result<Shop> {
                let id_filter = eq_filter(id.as_inner());
                let rows: Vec<Shop> = self
                    .get_json(
                        &table_path(table::SHOPS),
                        &[("select", "*"), ("id", id_filter.as_str())],
                    )
                    $( .$await_ext )?
                    ?;
                first_row(rows, "shop", id.as_inner())
            }

            /// Moves a shop from `from` to `to`.
            ///
            /// The update is conditional on the shop still being in `from`,
            /// so a concurrent change makes it match no row.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::NotFound`] if no row matched, or an
            /// error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(shop_id = %id, from = %from, to = %to))]
            pub $($async_kw)? fn update_shop_status(
                &self,
                id: &ShopId,
                from: ShopStatus,
                to: ShopStatus,
            ) -> Result<Shop> {
                let id_filter = eq_filter(id.as_inner());
                let from_filter = eq_filter(from.as_str());
                let rows: Vec<Shop> = self
                    .send_json(
                        Method::PATCH,
                        &table_path(table::SHOPS),
                        &[("id", id_filter.as_str()), ("status", from_filter.as_str())],
                        &ShopStatusPatch { status: to },
                    )
                    $( .$await_ext )?
                    ?;
                first_row(rows, "shop", id.as_inner())
            }

            /// Fetches the profiles of the given users.
            ///
            /// # Errors
            ///
            /// Returns an error if the request or deserialization fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(users = user_ids.len()))]
            pub $($async_kw)? fn owner_profiles(&self, user_ids: &[UserId]) -> Result<Vec<OwnerProfile>> {
                if user_ids.is_empty() {
                    return Ok(Vec::new());
                }
                let users_filter = in_filter(user_ids.iter().map(UserId::as_inner));
                self.get_json(
                    &table_path(table::PROFILES),
                    &[
                        ("select", "user_id,full_name,phone"),
                        ("user_id", users_filter.as_str()),
                    ],
                )
                $( .$await_ext )?
            }

            /// Inserts a shop row and returns it.
            ///
            /// # Errors
            ///
            /// Returns an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(owner_id = %shop.owner_id, status = %shop.status))]
            pub $($async_kw)? fn insert_shop(&self, shop: &NewShop) -> Result<Shop> {
                let rows: Vec<Shop> = self
                    .send_json(Method::POST, &table_path(table::SHOPS), &[], shop)
                    $( .$await_ext )?
                    ?;
                inserted_row(rows, "shop")
            }

            /// Grants `role` to a user.
            ///
            /// # Errors
            ///
            /// Returns an error if the request fails, e.g. because the user
            /// already holds the role.
            #[inline]
            #[tracing::instrument(skip_all, fields(user_id = %user_id, role = %role))]
            pub $($async_kw)? fn grant_role(&self, user_id: &UserId, role: AppRole) -> Result<()> {
                let grant = NewUserRole {
                    user_id: user_id.clone(),
                    role,
                };
                let rows: Vec<UserRoleRow> = self
                    .send_json(Method::POST, &table_path(table::USER_ROLES), &[], &grant)
                    $( .$await_ext )?
                    ?;
                let _granted = inserted_row(rows, "user role")?;
                Ok(())
            }

            /// Calls `create_new_shop` for the signed-in user.
            ///
            /// The procedure returns nothing; look the shop up with
            /// [`Self::shops_for_owner`] afterwards.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::Unauthenticated`] without an access
            /// token, or an error if the procedure fails.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn create_own_shop(&self, application: &ShopApplication) -> Result<()> {
                if !self.has_access_token() {
                    return Err(WholesaleError::Unauthenticated);
                }
                self.call_procedure(table::CREATE_SHOP_RPC, application) $( .$await_ext )?
            }

            // ── Orders ──────────────────────────────────────────────

            /// Inserts an order and returns the stored row.
            ///
            /// # Errors
            ///
            /// Returns an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(shop_id = %order.shop_id))]
            pub $($async_kw)? fn insert_order(&self, order: &NewOrder) -> Result<Order> {
                let rows: Vec<Order> = self
                    .send_json(Method::POST, &table_path(table::ORDERS), &[], order)
                    $( .$await_ext )?
                    ?;
                inserted_row(rows, "order")
            }

            /// Inserts order lines in one request.
            ///
            /// # Errors
            ///
            /// Returns an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(lines = items.len()))]
            pub $($async_kw)? fn insert_order_items(&self, items: &[NewOrderItem]) -> Result<Vec<OrderItem>> {
                self.send_json(Method::POST, &table_path(table::ORDER_ITEMS), &[], items)
                    $( .$await_ext )?
            }

            /// Deletes an order.
            ///
            /// # Errors
            ///
            /// Returns an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(order_id = %id))]
            pub $($async_kw)? fn delete_order(&self, id: &OrderId) -> Result<()> {
                let id_filter = eq_filter(id.as_inner());
                self.delete(&table_path(table::ORDERS), &[("id", id_filter.as_str())])
                    $( .$await_ext )?
            }

            /// Fetches one order.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::NotFound`] if no such order is
            /// visible, or an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(order_id = %id))]
            pub $($async_kw)? fn order(&self, id: &OrderId) -> Result<Order> {
                let id_filter = eq_filter(id.as_inner());
                let rows: Vec<Order> = self
                    .get_json(
                        &table_path(table::ORDERS),
                        &[("select", "*"), ("id", id_filter.as_str())],
                    )
                    $( .$await_ext )?
                    ?;
                first_row(rows, "order", id.as_inner())
            }

            /// Applies a status patch to an order still in `from`.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::NotFound`] if no row matched, or an
            /// error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(order_id = %id, from = %from, to = %update.status))]
            pub $($async_kw)? fn update_order(
                &self,
                id: &OrderId,
                from: OrderStatus,
                update: &OrderUpdate,
            ) -> Result<Order> {
                let id_filter = eq_filter(id.as_inner());
                let from_filter = eq_filter(from.as_str());
                let rows: Vec<Order> = self
                    .send_json(
                        Method::PATCH,
                        &table_path(table::ORDERS),
                        &[("id", id_filter.as_str()), ("status", from_filter.as_str())],
                        update,
                    )
                    $( .$await_ext )?
                    ?;
                first_row(rows, "order", id.as_inner())
            }

            /// Lists a shop's orders, newest first, with their lines.
            ///
            /// # Errors
            ///
            /// Returns an error if the request or deserialization fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(shop_id = %shop_id))]
            pub $($async_kw)? fn orders_for_shop(&self, shop_id: &ShopId) -> Result<Vec<ShopOrder>> {
                let shop_filter = eq_filter(shop_id.as_inner());
                self.get_json(
                    &table_path(table::ORDERS),
                    &[
                        ("select", SHOP_ORDER_SELECT),
                        ("shop_id", shop_filter.as_str()),
                        ("order", "created_at.desc"),
                    ],
                )
                $( .$await_ext )?
            }

            /// Lists every order with shop, owner and line details.
            ///
            /// # Errors
            ///
            /// Returns an error if the procedure or deserialization fails.
            #[inline]
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn orders_with_details(&self) -> Result<Vec<OrderDetails>> {
                self.send_json(
                    Method::POST,
                    &rpc_path(table::ORDERS_WITH_DETAILS_RPC),
                    &[],
                    &serde_json::Map::new(),
                )
                $( .$await_ext )?
            }

            // ── Counts ──────────────────────────────────────────────

            /// Counts the rows of `table_name` matching `filters` without
            /// transferring them.
            ///
            /// # Errors
            ///
            /// Returns [`WholesaleError::UnexpectedResponse`] if the count
            /// header is missing, or an error if the request fails.
            #[inline]
            #[tracing::instrument(skip_all, fields(table = %table_name))]
            pub $($async_kw)? fn count(&self, table_name: &str, filters: &[(&str, &str)]) -> Result<u64> {
                let mut query = vec![("select", "*")];
                query.extend_from_slice(filters);
                let url = endpoint(&self.base_url, &table_path(table_name), &query)?;
                let response: $resp_type = self
                    .authorize(self.http.head(url))
                    .header("Prefer", COUNT_EXACT)
                    .send()
                    $( .$await_ext )?
                    ?;
                let checked = Self::ensure_success(response) $( .$await_ext )? ?;
                let header = checked
                    .headers()
                    .get(CONTENT_RANGE)
                    .and_then(|value| value.to_str().ok());
                let total = parse_content_range(header)?;
                tracing::debug!(total, "counted rows");
                Ok(total)
            }

            // ── Private helpers ─────────────────────────────────────

            /// Adds the API key and bearer token to a request.
            fn authorize(&self, request: $req_type) -> $req_type {
                let bearer = self
                    .access_token
                    .as_ref()
                    .unwrap_or(&self.publishable_key);
                request
                    .header("apikey", self.publishable_key.expose_secret())
                    .bearer_auth(bearer.expose_secret())
            }

            /// Sends an authenticated GET request and deserializes the
            /// response.
            #[tracing::instrument(skip_all, fields(path = %path))]
            $($async_kw)? fn get_json<Resp: serde::de::DeserializeOwned>(
                &self,
                path: &str,
                query: &[(&str, &str)],
            ) -> Result<Resp> {
                let url = endpoint(&self.base_url, path, query)?;
                tracing::trace!("sending GET request");
                let response: $resp_type = self
                    .authorize(self.http.get(url))
                    .send()
                    $( .$await_ext )?
                    ?;
                Self::read_json(response) $( .$await_ext )?
            }

            /// Sends an authenticated JSON request that returns rows and
            /// deserializes them.
            #[tracing::instrument(skip_all, fields(method = %method, path = %path))]
            $($async_kw)? fn send_json<
                Req: serde::Serialize + ?Sized $(+ $send_bound)?,
                Resp: serde::de::DeserializeOwned,
            >(
                &self,
                method: Method,
                path: &str,
                query: &[(&str, &str)],
                body: &Req,
            ) -> Result<Resp> {
                let url = endpoint(&self.base_url, path, query)?;
                tracing::trace!("sending JSON request");
                let response: $resp_type = self
                    .authorize(self.http.request(method, url))
                    .header("Prefer", RETURN_REPRESENTATION)
                    .json(body)
                    .send()
                    $( .$await_ext )?
                    ?;
                Self::read_json(response) $( .$await_ext )?
            }

            /// Calls a procedure that returns no rows, ignoring any body.
            #[tracing::instrument(skip_all, fields(procedure = %name))]
            $($async_kw)? fn call_procedure<Req: serde::Serialize + ?Sized $(+ $send_bound)?>(
                &self,
                name: &str,
                args: &Req,
            ) -> Result<()> {
                let url = endpoint(&self.base_url, &rpc_path(name), &[])?;
                tracing::trace!("calling procedure");
                let response: $resp_type = self
                    .authorize(self.http.post(url))
                    .json(args)
                    .send()
                    $( .$await_ext )?
                    ?;
                let _checked = Self::ensure_success(response) $( .$await_ext )? ?;
                Ok(())
            }

            /// Sends an authenticated DELETE request.
            #[tracing::instrument(skip_all, fields(path = %path))]
            $($async_kw)? fn delete(&self, path: &str, query: &[(&str, &str)]) -> Result<()> {
                let url = endpoint(&self.base_url, path, query)?;
                tracing::trace!("sending DELETE request");
                let response: $resp_type = self
                    .authorize(self.http.delete(url))
                    .send()
                    $( .$await_ext )?
                    ?;
                let _checked = Self::ensure_success(response) $( .$await_ext )? ?;
                Ok(())
            }

            /// Parses a successful response body as JSON.
            $($async_kw)? fn read_json<Resp: serde::de::DeserializeOwned>(
                response: $resp_type,
            ) -> Result<Resp> {
                let checked = Self::ensure_success(response) $( .$await_ext )? ?;
                let body = checked.text() $( .$await_ext )? ?;
                tracing::trace!(body_len = body.len(), "parsing response body");
                serde_json::from_str(&body).map_err(WholesaleError::from)
            }

            /// Passes a success response through and turns anything else
            /// into an error carrying the backend's message.
            $($async_kw)? fn ensure_success(response: $resp_type) -> Result<$resp_type> {
                let status = response.status();
                tracing::debug!(status = %status, "received response");
                if status.is_success() {
                    return Ok(response);
                }
                let message = response
                    .text()
                    $( .$await_ext )?
                    .unwrap_or_else(|_| "unknown error".to_owned());
                tracing::debug!(status = status.as_u16(), message = %message, "API error");
                if status == StatusCode::UNAUTHORIZED {
                    Err(WholesaleError::Unauthenticated)
                } else {
                    Err(WholesaleError::Api {
                        status: status.as_u16(),
                        message,
                    })
                }
            }
        }

    };
}

#[cfg(feature = "async")]
mod async_client {
    //! Async HTTP client for the storefront backend.

    use reqwest::header::CONTENT_RANGE;
    use reqwest::{Method, StatusCode};
    use secrecy::{ExposeSecret, SecretString};

    use super::{
        COUNT_EXACT, PRODUCT_SELECT, RETURN_REPRESENTATION, SHOP_ORDER_SELECT, ShopStatusPatch,
        USER_PATH, endpoint, eq_filter, first_row, in_filter, inserted_row, parse_content_range,
        rpc_path, table, table_path,
    };
    use crate::config::{Config, PUBLISHABLE_KEY_VAR, URL_VAR};
    use crate::error::{Result, WholesaleError};
    use crate::models::{
        AppRole, AuthUser, Category, CategoryDraft, CategoryId, NewOrder, NewOrderItem, NewProduct,
        Order, OrderDetails, OrderId, OrderItem, OrderStatus, OrderUpdate, OwnerProfile, Product,
        NewShop, NewUserRole, ProductCode, ProductDraft, ProductId, Shop, ShopApplication, ShopId,
        ShopOrder, ShopStatus, UserId, UserRoleRow,
    };

    define_client! {
        client_name: WholesaleClient,
        builder_name: WholesaleClientBuilder,
        http_type: reqwest::Client,
        request_type: reqwest::RequestBuilder,
        response_type: reqwest::Response,
        client_doc: "Async client for the storefront backend.\n\nUse [`WholesaleClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`WholesaleClient`].",
        async_kw: async,
        await_kw: await,
        send_bound: Sync,
    }
}

#[cfg(feature = "blocking")]
mod blocking_client {
    //! Blocking (synchronous) HTTP client for the storefront backend.

    use reqwest::header::CONTENT_RANGE;
    use reqwest::{Method, StatusCode};
    use secrecy::{ExposeSecret, SecretString};

    use super::{
        COUNT_EXACT, PRODUCT_SELECT, RETURN_REPRESENTATION, SHOP_ORDER_SELECT, ShopStatusPatch,
        USER_PATH, endpoint, eq_filter, first_row, in_filter, inserted_row, parse_content_range,
        rpc_path, table, table_path,
    };
    use crate::config::{Config, PUBLISHABLE_KEY_VAR, URL_VAR};
    use crate::error::{Result, WholesaleError};
    use crate::models::{
        AppRole, AuthUser, Category, CategoryDraft, CategoryId, NewOrder, NewOrderItem, NewProduct,
        Order, OrderDetails, OrderId, OrderItem, OrderStatus, OrderUpdate, OwnerProfile, Product,
        NewShop, NewUserRole, ProductCode, ProductDraft, ProductId, Shop, ShopApplication, ShopId,
        ShopOrder, ShopStatus, UserId, UserRoleRow,
    };

    define_client! {
        client_name: WholesaleBlockingClient,
        builder_name: WholesaleBlockingClientBuilder,
        http_type: reqwest::blocking::Client,
        request_type: reqwest::blocking::RequestBuilder,
        response_type: reqwest::blocking::Response,
        client_doc: "Blocking (synchronous) client for the storefront backend.\n\nUse [`WholesaleBlockingClient::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`WholesaleBlockingClient`].",
    }
}

#[cfg(feature = "async")]
pub use async_client::{WholesaleClient, WholesaleClientBuilder};
#[cfg(feature = "blocking")]
pub use blocking_client::{WholesaleBlockingClient, WholesaleBlockingClientBuilder};
