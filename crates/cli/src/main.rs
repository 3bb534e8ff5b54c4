//! Eazyy CLI - drive the storefront cart, quotes and checkout from a shell.
//!
//! # Usage
//!
//! ```bash
//! # Add two shirts to the Wash & Iron bucket
//! ez-cli cart add --service-id 6f1c2d3e-4a5b-4c6d-8e7f-901234567890 \
//!     --service-name "Wash & Iron" --item-id 11111111-2222-4333-8444-555555555555 \
//!     --category-id aaaaaaaa-bbbb-4ccc-8ddd-eeeeeeeeeeee --name Shirt --price 5 --quantity 2
//!
//! # Show the cart with totals
//! ez-cli cart show
//!
//! # Check whether a quote request would be accepted
//! ez-cli quote check --description "Silk wedding dress" dress.jpg
//!
//! # Place the order
//! ez-cli checkout --name Anna --email anna@example.nl --address "Damrak 1, Amsterdam" \
//!     --pickup-date 2026-03-02
//!
//! # Follow it
//! ez-cli orders active --user-id <uuid>
//! ```
//!
//! # Commands
//!
//! - `cart` - Inspect and edit the persisted cart
//! - `wishlist` - Toggle and list wishlist items
//! - `quote` - Validate or submit a custom price quote
//! - `checkout` - Turn the cart into an order
//! - `orders` - Track orders and answer facility item counts

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use eazyy_core::{
    FulfillmentType, ItemDecision, ItemId, OrderId, QuoteUrgency, ServiceId, UserId,
};
use eazyy_storefront::orders::OrderView;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "ez-cli")]
#[command(author, version, about = "Eazyy storefront CLI tools")]
struct Cli {
    /// Directory holding the cart and wishlist (defaults to `EAZYY_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Custom price quotes
    Quote {
        #[command(subcommand)]
        action: QuoteAction,
    },
    /// Place an order for the cart's contents
    Checkout(CheckoutArgs),
    /// Track placed orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print every service bucket, its lines and the totals
    Show,
    /// Add a catalog item
    Add(AddArgs),
    /// Remove a line
    Remove {
        service_id: ServiceId,
        item_id: ItemId,
    },
    /// Change a line's quantity by a delta
    Update {
        service_id: ServiceId,
        item_id: ItemId,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(clap::Args)]
struct AddArgs {
    /// Service the item is booked under
    #[arg(long)]
    service_id: String,

    /// Service display name
    #[arg(long)]
    service_name: String,

    /// Service icon name
    #[arg(long, default_value = "")]
    icon: String,

    /// Service accent color
    #[arg(long, default_value = "")]
    color: String,

    /// Catalog item ID
    #[arg(long)]
    item_id: String,

    /// Catalog category ID
    #[arg(long)]
    category_id: String,

    /// Item display name
    #[arg(long)]
    name: String,

    /// Unit price in euros; omit for items priced on inspection
    #[arg(long)]
    price: Option<Decimal>,

    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// Customer-entered measure for per-unit items (e.g. square metres)
    #[arg(long, requires = "unit_label")]
    custom_value: Option<Decimal>,

    /// Unit of the custom measure
    #[arg(long, requires = "custom_value")]
    unit_label: Option<String>,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Add the item if absent, remove it if present
    Toggle { item_id: String },
    /// Print wishlisted item IDs
    List,
}

#[derive(Subcommand)]
enum QuoteAction {
    /// Run the intake checks against local image files
    Check(QuoteArgs),
    /// Upload the images and record a pending quote
    Submit {
        #[command(flatten)]
        quote: QuoteArgs,

        /// Customer the quote belongs to
        #[arg(long)]
        user_id: UserId,
    },
    /// List the customer's quotes, newest first
    List {
        #[arg(long)]
        user_id: UserId,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Orders between pickup and hand-back, newest first
    Active {
        #[arg(long)]
        user_id: UserId,
    },
    /// Delivered orders, newest first
    History {
        #[arg(long)]
        user_id: UserId,
    },
    /// Answer a facility item count
    Confirm {
        order_id: OrderId,

        /// Apply the facility's count
        #[arg(long, conflicts_with = "decline", required_unless_present = "decline")]
        accept: bool,

        /// Keep the booked items
        #[arg(long)]
        decline: bool,
    },
    /// Record the payment processor's final intent status
    Paid {
        order_number: String,

        /// e.g. `succeeded`, `processing`, `requires_action`
        #[arg(long)]
        intent_status: String,
    },
}

#[derive(clap::Args)]
struct QuoteArgs {
    /// What needs cleaning and how
    #[arg(short, long)]
    description: String,

    /// Short name for the item (defaults to the description's first line)
    #[arg(long)]
    item_name: Option<String>,

    /// `standard` or `express`
    #[arg(short, long, default_value = "standard")]
    urgency: QuoteUrgency,

    /// JPG, PNG or WebP photos
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(clap::Args)]
struct CheckoutArgs {
    /// Customer name
    #[arg(short, long)]
    name: String,

    /// Customer email address
    #[arg(short, long)]
    email: String,

    #[arg(long)]
    phone: Option<String>,

    /// Pickup address
    #[arg(short, long)]
    address: String,

    /// Pickup date (YYYY-MM-DD)
    #[arg(long)]
    pickup_date: NaiveDate,

    /// Delivery date (YYYY-MM-DD)
    #[arg(long)]
    delivery_date: Option<NaiveDate>,

    /// Notes for the driver
    #[arg(long)]
    instructions: Option<String>,

    /// `delivery` or `pickup`
    #[arg(long = "type", default_value = "delivery")]
    fulfillment: FulfillmentType,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("eazyy_storefront=info,ez_cli=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = commands::data_dir(cli.data_dir);

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&data_dir)?,
            CartAction::Add(args) => commands::cart::add(&data_dir, args.into_inputs())?,
            CartAction::Remove {
                service_id,
                item_id,
            } => commands::cart::remove(&data_dir, &service_id, &item_id)?,
            CartAction::Update {
                service_id,
                item_id,
                delta,
            } => commands::cart::update(&data_dir, &service_id, &item_id, delta)?,
            CartAction::Clear => commands::cart::clear(&data_dir)?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Toggle { item_id } => commands::wishlist::toggle(&data_dir, &item_id)?,
            WishlistAction::List => commands::wishlist::list(&data_dir)?,
        },
        Commands::Quote { action } => match action {
            QuoteAction::Check(args) => {
                commands::quote::check(args.into_request()).await?;
            }
            QuoteAction::Submit { quote, user_id } => {
                commands::quote::submit(quote.into_request(), &user_id).await?;
            }
            QuoteAction::List { user_id } => commands::quote::list(&user_id).await?,
        },
        Commands::Checkout(args) => {
            commands::checkout::run(&data_dir, args.into_request()).await?;
        }
        Commands::Orders { action } => match action {
            OrdersAction::Active { user_id } => {
                commands::orders::list(&user_id, OrderView::Active).await?;
            }
            OrdersAction::History { user_id } => {
                commands::orders::list(&user_id, OrderView::History).await?;
            }
            OrdersAction::Confirm {
                order_id, accept, ..
            } => {
                let decision = if accept {
                    ItemDecision::Accepted
                } else {
                    ItemDecision::Declined
                };
                commands::orders::confirm(&order_id, decision).await?;
            }
            OrdersAction::Paid {
                order_number,
                intent_status,
            } => commands::orders::paid(&order_number, &intent_status).await?,
        },
    }
    Ok(())
}

impl AddArgs {
    fn into_inputs(self) -> (eazyy_storefront::LineInput, eazyy_storefront::ServiceInput) {
        let service =
            eazyy_storefront::ServiceInput::new(self.service_id, self.service_name.clone())
                .with_style(self.icon, self.color);

        let mut line = eazyy_storefront::LineInput::new(
            self.item_id,
            self.category_id,
            self.name,
            self.price,
            self.quantity,
        );
        if let (Some(measure), Some(unit_label)) = (self.custom_value, self.unit_label) {
            line = line.custom_measure(measure, unit_label);
        }
        line.service_name = Some(self.service_name);

        (line, service)
    }
}

impl QuoteArgs {
    fn into_request(self) -> commands::quote::QuoteRequest {
        commands::quote::QuoteRequest {
            description: self.description,
            item_name: self.item_name,
            urgency: self.urgency,
            images: self.images,
        }
    }
}

impl CheckoutArgs {
    fn into_request(self) -> commands::checkout::CheckoutRequest {
        commands::checkout::CheckoutRequest {
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            pickup_date: self.pickup_date,
            delivery_date: self.delivery_date,
            instructions: self.instructions,
            fulfillment: self.fulfillment,
        }
    }
}
