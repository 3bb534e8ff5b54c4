//! Custom price quote commands.
//!
//! # Usage
//!
//! ```bash
//! # Validate a request without uploading anything
//! ez-cli quote check -d "Silk wedding dress, wine stain" front.jpg back.png
//!
//! # Upload and record it
//! ez-cli quote submit -d "Silk wedding dress" -u express --user-id <uuid> front.jpg
//!
//! # Show the customer's quotes and their prices
//! ez-cli quote list --user-id <uuid>
//! ```
//!
//! # Environment Variables
//!
//! `submit` and `list` need `EAZYY_BACKEND_URL`, `EAZYY_BACKEND_ANON_KEY`
//! and `EAZYY_ACCESS_TOKEN`.

use std::path::{Path, PathBuf};

use eazyy_core::{Price, QuoteUrgency, UserId};
use eazyy_storefront::StorefrontError;
use eazyy_storefront::config::StorefrontConfig;
use eazyy_storefront::quote::{QuoteImage, QuoteIntake, QuoteSubmission};
use eazyy_storefront::services::BackendClient;

/// A quote request as given on the command line.
pub struct QuoteRequest {
    pub description: String,
    pub item_name: Option<String>,
    pub urgency: QuoteUrgency,
    pub images: Vec<PathBuf>,
}

/// Run the intake checks and print the request that would be sent.
#[allow(clippy::print_stdout)]
pub async fn check(request: QuoteRequest) -> eazyy_storefront::Result<()> {
    let submission = build_submission(request).await?;

    println!("Item:    {}", submission.item_name);
    println!("Urgency: {:?}", submission.urgency);
    for image in &submission.images {
        println!(
            "Image:   {} ({}, {} bytes)",
            image.file_name,
            image.content_type,
            image.size()
        );
    }
    println!("Ready to submit");
    Ok(())
}

/// Upload the images and record a pending quote for `user_id`.
#[allow(clippy::print_stdout)]
pub async fn submit(request: QuoteRequest, user_id: &UserId) -> eazyy_storefront::Result<()> {
    let submission = build_submission(request).await?;

    let config = StorefrontConfig::from_env()?;
    let client = BackendClient::new(&config.backend)?;

    tracing::info!(images = submission.images.len(), "Submitting quote request...");
    let record = client.submit_quote(user_id, submission).await?;

    println!("Quote {} is {}", record.id, record.status.label());
    Ok(())
}

/// Print `user_id`'s quotes, newest first.
#[allow(clippy::print_stdout)]
pub async fn list(user_id: &UserId) -> eazyy_storefront::Result<()> {
    let config = StorefrontConfig::from_env()?;
    let client = BackendClient::new(&config.backend)?;

    let quotes = client.list_quotes(user_id).await?;
    if quotes.is_empty() {
        println!("No quotes yet");
        return Ok(());
    }

    for quote in &quotes {
        let price = quote
            .admin_price
            .map_or_else(|| "-".to_owned(), |p| Price::eur(p).to_string());
        println!(
            "{}  {:<12} {:<24} {price}  ({:?})",
            quote.id,
            quote.status.label(),
            quote.item_name,
            quote.urgency
        );
        if let Some(note) = &quote.admin_note {
            println!("    {note}");
        }
    }
    Ok(())
}

async fn build_submission(request: QuoteRequest) -> eazyy_storefront::Result<QuoteSubmission> {
    let mut images = Vec::with_capacity(request.images.len());
    for path in &request.images {
        images.push(read_image(path).await?);
    }

    let mut intake = QuoteIntake::new();
    intake.attach_images(images)?;
    intake.set_description(request.description);
    intake.set_urgency(request.urgency);
    if let Some(item_name) = request.item_name {
        intake.set_item_name(item_name);
    }

    Ok(intake.into_submission()?)
}

async fn read_image(path: &Path) -> eazyy_storefront::Result<QuoteImage> {
    let data = tokio::fs::read(path).await.map_err(|e| {
        StorefrontError::BadRequest(format!("Could not read {}: {e}", path.display()))
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());

    Ok(QuoteImage::from_file_name(file_name, data))
}
