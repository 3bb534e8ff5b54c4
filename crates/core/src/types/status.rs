//! Status enums for orders, payments and custom price quotes.
//!
//! All enums serialize as the `snake_case` strings the hosted backend stores.

use serde::{Deserialize, Serialize};

/// Lifecycle of a laundry order, from booking to hand-back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Custom-quote orders wait here until a price is agreed.
    #[default]
    Pending,
    AwaitingPickupCustomer,
    InTransitToFacility,
    ArrivedAtFacility,
    Processing,
    /// The facility counted different items than were booked.
    PendingItemConfirmation,
    ReadyForDelivery,
    InTransitToCustomer,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 10] = [
        Self::Pending,
        Self::AwaitingPickupCustomer,
        Self::InTransitToFacility,
        Self::ArrivedAtFacility,
        Self::Processing,
        Self::PendingItemConfirmation,
        Self::ReadyForDelivery,
        Self::InTransitToCustomer,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// The backend's `snake_case` name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingPickupCustomer => "awaiting_pickup_customer",
            Self::InTransitToFacility => "in_transit_to_facility",
            Self::ArrivedAtFacility => "arrived_at_facility",
            Self::Processing => "processing",
            Self::PendingItemConfirmation => "pending_item_confirmation",
            Self::ReadyForDelivery => "ready_for_delivery",
            Self::InTransitToCustomer => "in_transit_to_customer",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the order is in flight and shown on the active-orders screen.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            Self::AwaitingPickupCustomer
                | Self::InTransitToFacility
                | Self::ArrivedAtFacility
                | Self::Processing
                | Self::ReadyForDelivery
                | Self::InTransitToCustomer
        )
    }

    /// Human-readable label, e.g. `"Awaiting Pickup Customer"`.
    #[must_use]
    pub fn label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars).collect()
                })
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Payment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Review state of a custom price quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[default]
    Pending,
    /// An admin has attached a price.
    Quoted,
    Accepted,
    Declined,
}

impl QuoteStatus {
    /// Badge text shown next to a quote.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending Review",
            Self::Quoted => "Quote Ready",
            Self::Accepted => "Accepted",
            Self::Declined => "Declined",
        }
    }
}

/// How quickly a custom quote should be turned around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuoteUrgency {
    #[default]
    Standard,
    Express,
}

impl std::str::FromStr for QuoteUrgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "express" => Ok(Self::Express),
            _ => Err(format!("invalid urgency: {s}")),
        }
    }
}

/// Whether an order is priced from the catalog or by a custom quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Standard,
    CustomQuote,
}

/// How the laundry reaches the facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentType {
    Pickup,
    #[default]
    Delivery,
}

impl std::str::FromStr for FulfillmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pickup" => Ok(Self::Pickup),
            "delivery" => Ok(Self::Delivery),
            _ => Err(format!("invalid fulfillment type: {s}")),
        }
    }
}

/// Customer answer to a facility-reported item discrepancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemDecision {
    Accepted,
    Declined,
}
