//! Checkout command.
//!
//! # Usage
//!
//! ```bash
//! ez-cli checkout -n "Anna de Vries" -e anna@example.nl -a "Damrak 1, Amsterdam" \
//!     --pickup-date 2026-03-02 --type delivery
//! ```
//!
//! # Environment Variables
//!
//! - `EAZYY_BACKEND_URL` - Hosted backend base URL
//! - `EAZYY_BACKEND_ANON_KEY` - Project anon key
//! - `EAZYY_ACCESS_TOKEN` - Signed-in customer's session token
//! - `GOOGLE_MAPS_API_KEY` - Geocoding key for the pickup address

use std::path::Path;

use chrono::NaiveDate;
use eazyy_core::{Email, FulfillmentType, Price};
use eazyy_storefront::StorefrontError;
use eazyy_storefront::checkout::{Checkout, CheckoutDetails, CustomerInfo, OrderSummary, Schedule};
use eazyy_storefront::config::StorefrontConfig;
use eazyy_storefront::payment::PaymentRequest;
use eazyy_storefront::services::{BackendClient, GoogleGeocoder};

use super::open_cart;

/// Checkout details as given on the command line.
pub struct CheckoutRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: String,
    pub pickup_date: NaiveDate,
    pub delivery_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub fulfillment: FulfillmentType,
}

impl CheckoutRequest {
    fn into_details(self) -> eazyy_storefront::Result<CheckoutDetails> {
        let email = Email::parse(&self.email)
            .map_err(|e| StorefrontError::BadRequest(format!("Invalid email: {e}")))?;

        let mut details = CheckoutDetails::new(
            CustomerInfo {
                name: self.name,
                email,
                phone: self.phone,
            },
            self.address,
            Schedule {
                delivery_date: self.delivery_date,
                ..Schedule::pickup_on(self.pickup_date)
            },
        );
        details.special_instructions = self.instructions;
        details.fulfillment = self.fulfillment;
        Ok(details)
    }
}

/// Place an order for the persisted cart and print the confirmation.
#[allow(clippy::print_stdout)]
pub async fn run(data_dir: &Path, request: CheckoutRequest) -> eazyy_storefront::Result<()> {
    let details = request.into_details()?;

    let config = StorefrontConfig::from_env()?;
    let api_key = config.google_maps_api_key.clone().ok_or_else(|| {
        StorefrontError::BadRequest("GOOGLE_MAPS_API_KEY is required for checkout".to_owned())
    })?;
    let checkout = Checkout::new(
        GoogleGeocoder::new(api_key)?,
        BackendClient::new(&config.backend)?,
    );

    let mut cart = open_cart(data_dir)?;
    let summary = OrderSummary::from_cart(cart.state());

    tracing::info!("Placing order...");
    let order = checkout.place_order(&mut cart, &details).await?;
    let total = order.total_amount.unwrap_or(summary.total);

    println!("Order {} placed", order.order_number);
    println!("Subtotal: {}", Price::eur(summary.subtotal));
    println!("VAT:      {}", Price::eur(summary.tax));
    println!("Shipping: {}", Price::eur(summary.shipping_fee));
    println!("Total:    {}", Price::eur(total));

    // Unpriced orders are settled after inspection.
    if total.is_zero() {
        println!("Payment will be requested once the items are priced");
    } else {
        let payment = PaymentRequest::eur(total, &order.order_number, details.customer.email.as_str())?;
        println!(
            "Payment due: {} cents via {}",
            payment.amount,
            payment.payment_method_types.join(" or ")
        );
    }
    Ok(())
}
