//! Custom price quote intake.
//!
//! Items the catalog cannot price (a wedding dress, a leather sofa cover) are
//! quoted by staff from photos. [`QuoteIntake`] is the gate in front of that:
//! it accepts at most [`MAX_QUOTE_IMAGES`] JPEG, PNG or WebP images of up to
//! [`MAX_IMAGE_BYTES`] each and refuses to submit without a description.
//!
//! Attachment is all-or-nothing: if any file in a batch is invalid, none of
//! the batch is kept.

use eazyy_core::{QuoteUrgency, UserId};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Maximum number of images per quote request.
pub const MAX_QUOTE_IMAGES: usize = 3;

/// Maximum size of a single image (10 MiB).
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Accepted image MIME types.
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// Storage folder for quote images, below the bucket root.
const UPLOAD_PREFIX: &str = "custom-quotes";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteIntakeError {
    #[error("Maximum 3 images allowed")]
    TooManyImages,

    #[error("Only JPG, PNG, or WebP images under 10MB are allowed")]
    UnsupportedImage,

    #[error("At least one image is required")]
    NoImages,

    #[error("A description is required")]
    EmptyDescription,

    #[error("No image at position {0}")]
    ImageIndexOutOfRange(usize),
}

/// An image selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct QuoteImage {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl QuoteImage {
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Build from a file name, deriving the content type from its extension.
    #[must_use]
    pub fn from_file_name(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name)
            .unwrap_or("application/octet-stream")
            .to_owned();
        Self {
            file_name,
            content_type,
            data,
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Lower-cased file extension, or an empty string.
    #[must_use]
    pub fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }

    fn is_acceptable(&self) -> bool {
        ALLOWED_IMAGE_TYPES.contains(&self.content_type.as_str()) && self.size() <= MAX_IMAGE_BYTES
    }
}

impl std::fmt::Debug for QuoteImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteImage")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// MIME type for a file name, if it is one of the accepted image types.
#[must_use]
pub fn guess_content_type(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// A quote request being filled in.
#[derive(Debug, Clone, Default)]
pub struct QuoteIntake {
    images: Vec<QuoteImage>,
    description: String,
    item_name: Option<String>,
    urgency: QuoteUrgency,
}

impl QuoteIntake {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a batch of images.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteIntakeError::TooManyImages`] if the batch would take
    /// the request over the limit, or [`QuoteIntakeError::UnsupportedImage`]
    /// if any image has a disallowed type or is too large. On error the
    /// current selection is unchanged.
    pub fn attach_images(
        &mut self,
        batch: impl IntoIterator<Item = QuoteImage>,
    ) -> Result<usize, QuoteIntakeError> {
        let batch: Vec<QuoteImage> = batch.into_iter().collect();

        if self.images.len() + batch.len() > MAX_QUOTE_IMAGES {
            return Err(QuoteIntakeError::TooManyImages);
        }
        if !batch.iter().all(QuoteImage::is_acceptable) {
            return Err(QuoteIntakeError::UnsupportedImage);
        }

        debug!(count = batch.len(), "Attached quote images");
        self.images.extend(batch);
        Ok(self.images.len())
    }

    /// Remove the image at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteIntakeError::ImageIndexOutOfRange`] if there is no
    /// image at `index`.
    pub fn remove_image(&mut self, index: usize) -> Result<QuoteImage, QuoteIntakeError> {
        if index >= self.images.len() {
            return Err(QuoteIntakeError::ImageIndexOutOfRange(index));
        }
        Ok(self.images.remove(index))
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_item_name(&mut self, item_name: impl Into<String>) {
        let item_name = item_name.into();
        self.item_name = (!item_name.trim().is_empty()).then_some(item_name);
    }

    pub const fn set_urgency(&mut self, urgency: QuoteUrgency) {
        self.urgency = urgency;
    }

    #[must_use]
    pub fn images(&self) -> &[QuoteImage] {
        &self.images
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn urgency(&self) -> QuoteUrgency {
        self.urgency
    }

    /// Whether the request has at least one image and a non-blank description.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    fn validate(&self) -> Result<(), QuoteIntakeError> {
        if self.images.is_empty() {
            return Err(QuoteIntakeError::NoImages);
        }
        if self.description.trim().is_empty() {
            return Err(QuoteIntakeError::EmptyDescription);
        }
        Ok(())
    }

    /// Finish the request.
    ///
    /// Without an explicit item name, the first line of the description is
    /// used.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteIntakeError::NoImages`] or
    /// [`QuoteIntakeError::EmptyDescription`] if the request is incomplete.
    pub fn into_submission(self) -> Result<QuoteSubmission, QuoteIntakeError> {
        self.validate()?;

        let item_name = self.item_name.unwrap_or_else(|| {
            self.description
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or_default()
                .to_owned()
        });

        Ok(QuoteSubmission {
            item_name,
            description: self.description,
            urgency: self.urgency,
            images: self.images,
        })
    }
}

/// A complete quote request, ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSubmission {
    pub item_name: String,
    pub description: String,
    pub urgency: QuoteUrgency,
    pub images: Vec<QuoteImage>,
}

/// Object path for an uploaded quote image: `custom-quotes/{user}/{uuid}.{ext}`.
#[must_use]
pub fn storage_path(user_id: &UserId, image: &QuoteImage) -> String {
    format!(
        "{UPLOAD_PREFIX}/{user_id}/{}.{}",
        Uuid::new_v4(),
        image.extension()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn jpeg(name: &str) -> QuoteImage {
        QuoteImage::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF])
    }

    #[test]
    fn test_fourth_image_is_rejected() {
        let mut intake = QuoteIntake::new();
        assert_eq!(
            intake
                .attach_images([jpeg("a.jpg"), jpeg("b.jpg"), jpeg("c.jpg")])
                .unwrap(),
            3
        );

        assert_eq!(
            intake.attach_images([jpeg("d.jpg")]),
            Err(QuoteIntakeError::TooManyImages)
        );
        assert_eq!(intake.images().len(), 3);
    }

    #[test]
    fn test_oversized_image_rejects_whole_batch() {
        let mut intake = QuoteIntake::new();
        let big = QuoteImage::new("big.png", "image/png", vec![0; MAX_IMAGE_BYTES + 1]);

        assert_eq!(
            intake.attach_images([jpeg("ok.jpg"), big]),
            Err(QuoteIntakeError::UnsupportedImage)
        );
        assert!(intake.images().is_empty());
    }

    #[test]
    fn test_image_at_size_limit_is_accepted() {
        let mut intake = QuoteIntake::new();
        let exact = QuoteImage::new("exact.webp", "image/webp", vec![0; MAX_IMAGE_BYTES]);
        assert!(intake.attach_images([exact]).is_ok());
    }

    #[test]
    fn test_disallowed_type_rejected() {
        let mut intake = QuoteIntake::new();
        let gif = QuoteImage::new("cat.gif", "image/gif", vec![1]);
        assert_eq!(
            intake.attach_images([gif]),
            Err(QuoteIntakeError::UnsupportedImage)
        );
        assert_eq!(
            QuoteIntakeError::UnsupportedImage.to_string(),
            "Only JPG, PNG, or WebP images under 10MB are allowed"
        );
        assert_eq!(
            QuoteIntakeError::TooManyImages.to_string(),
            "Maximum 3 images allowed"
        );
    }

    #[test]
    fn test_can_submit_requires_image_and_description() {
        let mut intake = QuoteIntake::new();
        assert!(!intake.can_submit());

        intake.set_description("   \n ");
        intake.attach_images([jpeg("a.jpg")]).unwrap();
        assert!(!intake.can_submit());

        intake.set_description("Silk dress, red wine stain");
        assert!(intake.can_submit());

        intake.remove_image(0).unwrap();
        assert!(!intake.can_submit());
        assert_eq!(
            intake.remove_image(0),
            Err(QuoteIntakeError::ImageIndexOutOfRange(0))
        );
    }

    #[test]
    fn test_submission_defaults_item_name_to_first_line() {
        let mut intake = QuoteIntake::new();
        intake.attach_images([jpeg("a.jpg")]).unwrap();
        intake.set_description("Wedding dress\nLace sleeves, 2 layers");
        intake.set_urgency(QuoteUrgency::Express);

        let submission = intake.into_submission().unwrap();
        assert_eq!(submission.item_name, "Wedding dress");
        assert_eq!(submission.urgency, QuoteUrgency::Express);
    }

    #[test]
    fn test_submission_refuses_incomplete_request() {
        let mut intake = QuoteIntake::new();
        intake.set_description("Sofa cover");
        assert_eq!(
            intake.into_submission(),
            Err(QuoteIntakeError::NoImages)
        );
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("photo.JPG"), Some("image/jpeg"));
        assert_eq!(guess_content_type("photo.webp"), Some("image/webp"));
        assert_eq!(guess_content_type("photo.heic"), None);
        assert_eq!(guess_content_type("photo"), None);

        let image = QuoteImage::from_file_name("scan.tiff", vec![]);
        assert_eq!(image.content_type, "application/octet-stream");
    }

    #[test]
    fn test_storage_path_layout() {
        let user = UserId::parse("12345678-1234-4234-8234-123456789abc").unwrap();
        let path = storage_path(&user, &jpeg("Photo.JPEG"));

        let rest = path
            .strip_prefix("custom-quotes/12345678-1234-4234-8234-123456789abc/")
            .unwrap();
        let (stem, ext) = rest.split_once('.').unwrap();
        assert_eq!(ext, "jpeg");
        assert!(eazyy_core::is_valid_uuid(stem));
    }
}
