//! Checkout: turning the cart into an order.
//!
//! [`Checkout::place_order`] runs the whole hand-off. It refuses an empty
//! cart, geocodes the pickup address, posts the order to the backend and only
//! then clears the cart. A failure at any step leaves the cart as it was.

use std::future::Future;

use chrono::NaiveDate;
use eazyy_core::{
    CategoryId, Email, FulfillmentType, ItemId, OrderId, OrderType, ServiceId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::cart::{CartLine, CartState, CartStore, CartTotals, ServiceBucket};
use crate::services::backend::BackendError;
use crate::services::geocoding::{Coordinates, Geocoder, GeocodingError};
use crate::storage::KeyValueStore;

/// Default shipping method sent with every order.
pub const DEFAULT_SHIPPING_METHOD: &str = "standard";

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Could not locate pickup address: {0}")]
    Geocoding(#[from] GeocodingError),

    #[error("Order creation failed: {0}")]
    Backend(#[from] BackendError),
}

/// Contact details of the customer placing the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerInfo {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
}

/// Pickup and delivery slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub pickup_date: NaiveDate,
    pub delivery_date: Option<NaiveDate>,
    /// Free-form slot, e.g. `"09:00"`.
    pub estimated_pickup_time: Option<String>,
    pub estimated_dropoff_time: Option<String>,
}

impl Schedule {
    #[must_use]
    pub const fn pickup_on(pickup_date: NaiveDate) -> Self {
        Self {
            pickup_date,
            delivery_date: None,
            estimated_pickup_time: None,
            estimated_dropoff_time: None,
        }
    }
}

/// Everything the customer fills in at checkout besides the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDetails {
    pub customer: CustomerInfo,
    pub shipping_address: String,
    pub shipping_method: String,
    pub special_instructions: Option<String>,
    pub schedule: Schedule,
    pub fulfillment: FulfillmentType,
}

impl CheckoutDetails {
    #[must_use]
    pub fn new(customer: CustomerInfo, shipping_address: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            customer,
            shipping_address: shipping_address.into(),
            shipping_method: DEFAULT_SHIPPING_METHOD.to_owned(),
            special_instructions: None,
            schedule,
            fulfillment: FulfillmentType::default(),
        }
    }
}

/// One order line as the order-creation endpoint expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemPayload {
    pub product_id: ItemId,
    pub product_name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub custom_input_value: Option<Decimal>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub calculated_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_label: Option<String>,
    pub service_id: ServiceId,
    pub category_id: CategoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
}

impl OrderItemPayload {
    fn from_line(bucket: &ServiceBucket, line: &CartLine) -> Self {
        Self {
            product_id: line.item_id,
            product_name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.unwrap_or_default(),
            subtotal: line.line_total().unwrap_or(Decimal::MAX),
            custom_input_value: line.custom_input_value,
            calculated_price: line.calculated_price,
            unit_label: line.unit_label.clone(),
            service_id: bucket.service.id,
            category_id: line.category_id,
            service_name: line
                .service_name
                .clone()
                .or_else(|| Some(bucket.service.name.clone())),
            category_name: line.category_name.clone(),
        }
    }
}

/// Body of the order-creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    pub customer_name: String,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub shipping_address: String,
    pub shipping_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub pickup_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub fulfillment: FulfillmentType,
    pub order_type: OrderType,
    pub items: Vec<OrderItemPayload>,
    /// Decimal degrees as text, the way the backend stores them.
    pub latitude: String,
    pub longitude: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_pickup_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_dropoff_time: Option<String>,
}

impl OrderRequest {
    /// Flatten the cart into an order request.
    ///
    /// A cart holding any unpriced line is booked as a custom-quote order.
    #[must_use]
    pub fn from_cart(cart: &CartState, details: &CheckoutDetails, location: Coordinates) -> Self {
        let items: Vec<OrderItemPayload> = cart
            .buckets()
            .flat_map(|(_, bucket)| {
                bucket
                    .items
                    .iter()
                    .map(move |line| OrderItemPayload::from_line(bucket, line))
            })
            .collect();

        let order_type = if cart.lines().any(|(_, line)| line.unit_price.is_none()) {
            OrderType::CustomQuote
        } else {
            OrderType::Standard
        };

        Self {
            customer_name: details.customer.name.trim().to_owned(),
            email: details.customer.email.clone(),
            phone: details.customer.phone.clone(),
            shipping_address: details.shipping_address.clone(),
            shipping_method: details.shipping_method.clone(),
            special_instructions: details.special_instructions.clone(),
            pickup_date: details.schedule.pickup_date,
            delivery_date: details.schedule.delivery_date,
            fulfillment: details.fulfillment,
            order_type,
            items,
            latitude: location.latitude.to_string(),
            longitude: location.longitude.to_string(),
            estimated_pickup_time: details.schedule.estimated_pickup_time.clone(),
            estimated_dropoff_time: details.schedule.estimated_dropoff_time.clone(),
        }
    }
}

/// Identity of a freshly created order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedOrder {
    pub id: OrderId,
    pub order_number: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
}

/// Creates orders on the backend.
pub trait OrderBackend {
    /// Submit `request` and return the created order.
    fn create_order(
        &self,
        request: &OrderRequest,
    ) -> impl Future<Output = Result<CreatedOrder, BackendError>> + Send;
}

/// Money breakdown shown on the order confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    /// Shipping is free, so the total matches the cart's.
    #[must_use]
    pub fn from_cart(cart: &CartState) -> Self {
        let CartTotals {
            subtotal,
            tax,
            total,
            ..
        } = CartTotals::from_state(cart);
        let shipping_fee = Decimal::ZERO;
        Self {
            subtotal,
            tax,
            shipping_fee,
            total: total.saturating_add(shipping_fee),
        }
    }
}

/// The checkout collaborators.
#[derive(Debug, Clone)]
pub struct Checkout<G, B> {
    geocoder: G,
    backend: B,
}

impl<G: Geocoder, B: OrderBackend> Checkout<G, B> {
    pub const fn new(geocoder: G, backend: B) -> Self {
        Self { geocoder, backend }
    }

    /// Place an order for the cart's contents and clear the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] without any network call when the
    /// cart is empty, and [`CheckoutError::Geocoding`] or
    /// [`CheckoutError::Backend`] if a collaborator fails. The cart is only
    /// cleared once the order exists.
    #[instrument(skip_all, fields(items = cart.total_items()))]
    pub async fn place_order<S: KeyValueStore>(
        &self,
        cart: &mut CartStore<S>,
        details: &CheckoutDetails,
    ) -> Result<CreatedOrder, CheckoutError> {
        if cart.state().is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let location = self.geocoder.geocode(&details.shipping_address).await?;
        let request = OrderRequest::from_cart(cart.state(), details, location);
        let order = self.backend.create_order(&request).await?;

        info!(order_id = %order.id, order_number = %order.order_number, "Order created");
        cart.clear_cart();
        Ok(order)
    }
}
