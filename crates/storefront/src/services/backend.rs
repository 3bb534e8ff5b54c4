//! Hosted backend client.
//!
//! The storefront talks to the `create-order` function, object storage for
//! quote photos, and the REST tables for orders, order items, discrepancy
//! items and custom price quotes. Every request carries the project's anon
//! key; everything tied to a customer additionally needs their access token.

use std::collections::HashSet;

use eazyy_core::{
    ItemDecision, ItemId, OrderId, OrderStatus, PaymentStatus, QuoteId, QuoteStatus, QuoteUrgency,
    UserId,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

use crate::checkout::{CreatedOrder, OrderBackend, OrderRequest};
use crate::config::BackendConfig;
use crate::orders::{DiscrepancyItem, ItemChange, NewOrderItem, OrderRecord, ReconciliationPlan};
use crate::quote::{QuoteImage, QuoteSubmission, storage_path};

/// Storage bucket holding quote photos.
const QUOTES_BUCKET: &str = "quotes";

/// Cache lifetime for uploaded photos, in seconds.
const UPLOAD_CACHE_CONTROL: &str = "3600";

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The call needs a signed-in customer.
    #[error("You must be logged in to create an order")]
    NotAuthenticated,

    /// No row matched the lookup.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Columns pulled in from a discrepancy's original order item.
const DISCREPANCY_SELECT: &str = "*,original_order_item:original_order_item_id(\
    product_id,service_id,service_name,category_id,category_name)";

/// Custom price quote row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuoteRecord {
    pub id: QuoteId,
    pub status: QuoteStatus,
    pub item_name: String,
    #[serde(default)]
    pub urgency: QuoteUrgency,
    #[serde(default)]
    pub image_url: Vec<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub admin_price: Option<Decimal>,
    #[serde(default)]
    pub admin_note: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Insert payload for a new quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewQuote {
    pub item_name: String,
    pub description: String,
    pub urgency: QuoteUrgency,
    pub image_url: Vec<String>,
    pub user_id: UserId,
    pub status: QuoteStatus,
}

#[derive(Serialize)]
struct OrderItemInsert<'a> {
    order_id: OrderId,
    #[serde(flatten)]
    item: &'a NewOrderItem,
}

#[derive(Serialize)]
struct QuantityUpdate {
    quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    subtotal: Decimal,
}

#[derive(Serialize)]
struct DecisionUpdate {
    customer_item_decision: ItemDecision,
    status: OrderStatus,
}

#[derive(Serialize)]
struct PaidUpdate {
    status: OrderStatus,
    payment_status: PaymentStatus,
}

#[derive(Deserialize)]
struct IdRow<T> {
    id: T,
}

#[derive(Deserialize)]
struct CreateOrderResponse {
    order: CreatedOrder,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "message")]
    error: String,
}

/// Backend API client.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
    access_token: Option<SecretString>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .field("anon_key", &"[REDACTED]")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the anon key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();

        let mut api_key = HeaderValue::from_str(config.anon_key.expose_secret())
            .map_err(|e| BackendError::Parse(format!("Invalid anon key format: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.as_str().trim_end_matches('/').to_owned(),
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// Use a customer session token for subsequent calls.
    #[must_use]
    pub fn with_access_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// A REST table URL with query parameters.
    fn rest_url(&self, table: &str, params: &[(&str, &str)]) -> Result<Url, BackendError> {
        Url::parse_with_params(&self.url(&format!("rest/v1/{table}")), params)
            .map_err(|e| BackendError::Parse(format!("Invalid request URL: {e}")))
    }

    fn customer_token(&self) -> Result<&SecretString, BackendError> {
        self.access_token
            .as_ref()
            .ok_or(BackendError::NotAuthenticated)
    }

    async fn get_rows<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<Vec<T>, BackendError> {
        let token = self.customer_token()?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;
        parse_json(response).await
    }

    async fn patch_rows(&self, url: Url, body: &impl Serialize) -> Result<(), BackendError> {
        let token = self.customer_token()?;
        let response = self
            .client
            .patch(url)
            .bearer_auth(token.expose_secret())
            .json(body)
            .send()
            .await?;
        ensure_success(response).await.map(drop)
    }

    /// Bearer auth with the customer token, falling back to the anon key.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.as_ref().unwrap_or(&self.anon_key);
        request.bearer_auth(token.expose_secret())
    }

    /// Public URL of an object in the quotes bucket.
    #[must_use]
    pub fn public_quote_image_url(&self, path: &str) -> String {
        self.url(&format!("storage/v1/object/public/{QUOTES_BUCKET}/{path}"))
    }

    /// Create an order through the `create-order` function.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotAuthenticated`] without a customer token,
    /// or the backend's `{error}` message if it refuses the order.
    #[instrument(skip_all, fields(items = request.items.len()))]
    pub async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder, BackendError> {
        let token = self.customer_token()?;

        let response = self
            .client
            .post(self.url("functions/v1/create-order"))
            .bearer_auth(token.expose_secret())
            .json(request)
            .send()
            .await?;

        let body: CreateOrderResponse = parse_json(response).await?;
        debug!(order_number = %body.order.order_number, "Backend created order");
        Ok(body.order)
    }

    /// Upload one quote photo to `path` and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns error if the upload is refused.
    #[instrument(skip(self, image), fields(size = image.size()))]
    pub async fn upload_quote_image(
        &self,
        path: &str,
        image: &QuoteImage,
    ) -> Result<String, BackendError> {
        let request = self
            .client
            .post(self.url(&format!("storage/v1/object/{QUOTES_BUCKET}/{path}")))
            .header("Content-Type", image.content_type.as_str())
            .header("Cache-Control", format!("max-age={UPLOAD_CACHE_CONTROL}"))
            .body(image.data.clone());
        let response = self.authorized(request).send().await?;

        ensure_success(response).await?;
        Ok(self.public_quote_image_url(path))
    }

    /// Insert a quote row.
    ///
    /// # Errors
    ///
    /// Returns error if the insert is refused or returns no row.
    #[instrument(skip_all, fields(item_name = %quote.item_name))]
    pub async fn create_quote(&self, quote: &NewQuote) -> Result<QuoteRecord, BackendError> {
        let request = self
            .client
            .post(self.url("rest/v1/custom_price_quotes"))
            .header("Prefer", "return=representation")
            .json(quote);
        let response = self.authorized(request).send().await?;

        let rows: Vec<QuoteRecord> = parse_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::Parse("quote insert returned no rows".to_owned()))
    }

    /// Upload a quote's photos and record it as a pending quote.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotAuthenticated`] without a customer token,
    /// or the first upload or insert error.
    pub async fn submit_quote(
        &self,
        user_id: &UserId,
        submission: QuoteSubmission,
    ) -> Result<QuoteRecord, BackendError> {
        if self.access_token.is_none() {
            return Err(BackendError::NotAuthenticated);
        }

        let mut image_urls = Vec::with_capacity(submission.images.len());
        for image in &submission.images {
            let path = storage_path(user_id, image);
            image_urls.push(self.upload_quote_image(&path, image).await?);
        }

        self.create_quote(&NewQuote {
            item_name: submission.item_name,
            description: submission.description,
            urgency: submission.urgency,
            image_url: image_urls,
            user_id: *user_id,
            status: QuoteStatus::Pending,
        })
        .await
    }
}

impl BackendClient {
    /// A customer's orders with their items, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotAuthenticated`] without a customer token.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, user_id: &UserId) -> Result<Vec<OrderRecord>, BackendError> {
        let user = format!("eq.{user_id}");
        let url = self.rest_url(
            "orders",
            &[
                ("select", "*,order_items(*)"),
                ("user_id", user.as_str()),
                ("order", "created_at.desc"),
            ],
        )?;
        let orders: Vec<OrderRecord> = self.get_rows(url).await?;
        debug!(count = orders.len(), "Fetched orders");
        Ok(orders)
    }

    /// A customer's custom price quotes, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotAuthenticated`] without a customer token.
    #[instrument(skip(self))]
    pub async fn list_quotes(&self, user_id: &UserId) -> Result<Vec<QuoteRecord>, BackendError> {
        let user = format!("eq.{user_id}");
        let url = self.rest_url(
            "custom_price_quotes",
            &[
                ("select", "*"),
                ("user_id", user.as_str()),
                ("order", "created_at.desc"),
            ],
        )?;
        self.get_rows(url).await
    }

    /// One order with its items.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no such order is visible to the
    /// customer.
    #[instrument(skip(self))]
    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderRecord, BackendError> {
        let id = format!("eq.{order_id}");
        let url = self.rest_url(
            "orders",
            &[("select", "*,order_items(*)"), ("id", id.as_str())],
        )?;
        let rows: Vec<OrderRecord> = self.get_rows(url).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("order {order_id}")))
    }

    /// The facility's counted items for an order.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotAuthenticated`] without a customer token.
    #[instrument(skip(self))]
    pub async fn list_discrepancies(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<DiscrepancyItem>, BackendError> {
        let order = format!("eq.{order_id}");
        let url = self.rest_url(
            "discrepancy_items",
            &[("select", DISCREPANCY_SELECT), ("order_id", order.as_str())],
        )?;
        self.get_rows(url).await
    }

    /// Which of `ids` exist in the item catalog.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotAuthenticated`] without a customer token.
    pub async fn known_products(&self, ids: &[ItemId]) -> Result<HashSet<ItemId>, BackendError> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let list = ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
        let filter = format!("in.({list})");
        let url = self.rest_url("items", &[("select", "id"), ("id", filter.as_str())])?;
        let rows: Vec<IdRow<ItemId>> = self.get_rows(url).await?;
        Ok(rows.into_iter().map(|row| row.id).collect())
    }

    /// Write a reconciliation plan: finalize draft discrepancy rows, apply
    /// the item changes, then record the decision and move the order on.
    ///
    /// # Errors
    ///
    /// Returns the first refused write. Earlier writes are not rolled back.
    #[instrument(skip(self, plan), fields(decision = ?plan.decision, changes = plan.changes.len()))]
    pub async fn apply_reconciliation(
        &self,
        order_id: &OrderId,
        plan: &ReconciliationPlan,
    ) -> Result<(), BackendError> {
        for id in &plan.finalize {
            let filter = format!("eq.{id}");
            let url = self.rest_url("discrepancy_items", &[("id", filter.as_str())])?;
            self.patch_rows(url, &serde_json::json!({ "is_temporary": false }))
                .await?;
        }

        for change in &plan.changes {
            match change {
                ItemChange::Update {
                    order_item_id,
                    quantity,
                    subtotal,
                } => {
                    let filter = format!("eq.{order_item_id}");
                    let url = self.rest_url("order_items", &[("id", filter.as_str())])?;
                    let body = QuantityUpdate {
                        quantity: *quantity,
                        subtotal: *subtotal,
                    };
                    self.patch_rows(url, &body).await?;
                }
                ItemChange::Insert(item) => {
                    let token = self.customer_token()?;
                    let response = self
                        .client
                        .post(self.url("rest/v1/order_items"))
                        .bearer_auth(token.expose_secret())
                        .json(&OrderItemInsert {
                            order_id: *order_id,
                            item,
                        })
                        .send()
                        .await?;
                    ensure_success(response).await?;
                }
            }
        }

        let filter = format!("eq.{order_id}");
        let url = self.rest_url("orders", &[("id", filter.as_str())])?;
        let body = DecisionUpdate {
            customer_item_decision: plan.decision,
            status: plan.next_status,
        };
        self.patch_rows(url, &body).await?;
        info!(%order_id, status = %plan.next_status, "Recorded item decision");
        Ok(())
    }

    /// Mark a pending order as paid and ready for pickup. Returns `false` if
    /// the order had already left the pending state.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotAuthenticated`] without a customer token.
    #[instrument(skip(self))]
    pub async fn mark_order_paid(&self, order_number: &str) -> Result<bool, BackendError> {
        let token = self.customer_token()?;
        let number = format!("eq.{order_number}");
        let pending = format!("eq.{}", OrderStatus::Pending);
        let url = self.rest_url(
            "orders",
            &[
                ("order_number", number.as_str()),
                ("status", pending.as_str()),
                ("select", "id"),
            ],
        )?;

        let response = self
            .client
            .patch(url)
            .bearer_auth(token.expose_secret())
            .header("Prefer", "return=representation")
            .json(&PaidUpdate {
                status: OrderStatus::AwaitingPickupCustomer,
                payment_status: PaymentStatus::Paid,
            })
            .send()
            .await?;

        let rows: Vec<IdRow<OrderId>> = parse_json(response).await?;
        Ok(!rows.is_empty())
    }
}

impl OrderBackend for BackendClient {
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder, BackendError> {
        Self::create_order(self, request).await
    }
}

/// Turn a non-2xx response into [`BackendError::Api`], preferring the
/// backend's own `{error}` message over the raw body.
async fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    Err(BackendError::Api {
        status: status.as_u16(),
        message: error_message(&text),
    })
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    ensure_success(response)
        .await?
        .json()
        .await
        .map_err(|e| BackendError::Parse(e.to_string()))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body).map_or_else(|_| body.to_owned(), |b| b.error)
}
