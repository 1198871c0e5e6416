//! Admin form models and their validation.
//!
//! Every form is checked before a request is built; a failed check carries
//! the notice the admin sees.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use stoneart_core::{CategoryId, Email, Price, ProductStatus};

use crate::error::{AdminError, Result};

/// Most images a product may carry.
pub const MAX_IMAGES: usize = 4;

// =============================================================================
// Images
// =============================================================================

/// An image file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Wrap in-memory bytes, inferring the type from the file extension.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` unless the extension names an image type.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self> {
        let file_name = file_name.into();
        let mime = image_mime(&file_name).ok_or_else(|| {
            AdminError::invalid("Invalid file type", "Please upload only image files")
        })?;
        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }

    /// Read an image from disk.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` for non-image files and `AdminError::Io`
    /// if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        image_mime(&file_name).ok_or_else(|| {
            AdminError::invalid("Invalid file type", "Please upload only image files")
        })?;
        let bytes = std::fs::read(path).map_err(|source| AdminError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(file_name, bytes)
    }

    fn into_part(self) -> Result<Part> {
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(self.mime)?)
    }
}

/// `image/*` type for a file name, by extension.
#[must_use]
pub fn image_mime(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "avif" => Some("image/avif"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

// =============================================================================
// Products
// =============================================================================

/// Fields shared by the create and edit product forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    /// Rich-text HTML.
    pub description: String,
    pub price: Price,
    pub category_id: CategoryId,
    pub status: ProductStatus,
}

impl ProductFields {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AdminError::invalid(
                "Missing Information",
                "Please enter a product name",
            ));
        }
        Ok(())
    }

    fn to_form(&self) -> Form {
        Form::new()
            .text("name", self.name.trim().to_string())
            .text("description", self.description.clone())
            .text("price", self.price.to_string())
            .text("category_id", self.category_id.to_string())
            .text("status", self.status.to_string())
    }
}

fn check_image_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(AdminError::invalid(
            "No images",
            "Please include at least one product image",
        ));
    }
    if count > MAX_IMAGES {
        return Err(AdminError::invalid(
            "Maximum images reached",
            "You can only have up to 4 images per product",
        ));
    }
    Ok(())
}

fn attach_images(mut form: Form, images: Vec<ImageUpload>) -> Result<Form> {
    for image in images {
        form = form.part("images", image.into_part()?);
    }
    Ok(form)
}

/// New product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductForm {
    pub fields: ProductFields,
    pub images: Vec<ImageUpload>,
}

impl ProductForm {
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` for a blank name or an image count
    /// outside 1..=4.
    pub fn validate(&self) -> Result<()> {
        self.fields.validate()?;
        check_image_count(self.images.len())
    }

    /// Multipart body for `POST /admin/product`.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or a part cannot be built.
    pub fn into_multipart(self) -> Result<Form> {
        self.validate()?;
        attach_images(self.fields.to_form(), self.images)
    }
}

/// Edit of an existing product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUpdateForm {
    pub fields: ProductFields,
    /// Already uploaded images to keep.
    pub existing_image_urls: Vec<String>,
    /// Images to add.
    pub images: Vec<ImageUpload>,
}

impl ProductUpdateForm {
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` for a blank name or a combined image
    /// count outside 1..=4.
    pub fn validate(&self) -> Result<()> {
        self.fields.validate()?;
        check_image_count(self.existing_image_urls.len() + self.images.len())
    }

    /// Multipart body for `PUT /admin/product/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or a part cannot be built.
    pub fn into_multipart(self) -> Result<Form> {
        self.validate()?;
        let existing = serde_json::to_string(&self.existing_image_urls)
            .unwrap_or_else(|_| "[]".to_string());
        let form = self
            .fields
            .to_form()
            .text("existing_image_urls", existing);
        attach_images(form, self.images)
    }
}

// =============================================================================
// Categories & admins
// =============================================================================

/// Body of `POST /admin/category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryForm {
    pub name: String,
}

impl CategoryForm {
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` for a blank name.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AdminError::invalid(
                "Missing Information",
                "Please enter a category name",
            ));
        }
        Ok(())
    }
}

/// New administrator account.
#[derive(Debug)]
pub struct RegisterAdminForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
}

/// Body of `POST /admin/register`.
#[derive(Serialize)]
pub(crate) struct RegisterAdminBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    role: &'static str,
}

impl RegisterAdminForm {
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` if a field is blank or the email does
    /// not parse.
    pub fn validate(&self) -> Result<Email> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.expose_secret().is_empty()
        {
            return Err(AdminError::invalid(
                "Missing Information",
                "Please fill in all fields",
            ));
        }
        Email::parse(&self.email).map_err(|_| {
            AdminError::invalid("Invalid email", "Please enter a valid email address")
        })
    }

    pub(crate) fn body<'a>(&'a self, email: &'a Email) -> RegisterAdminBody<'a> {
        RegisterAdminBody {
            name: self.name.trim(),
            email: email.as_str(),
            password: self.password.expose_secret(),
            role: "admin",
        }
    }
}

/// Change of the signed-in admin's password.
#[derive(Debug)]
pub struct PasswordChangeForm {
    pub current_password: SecretString,
    pub new_password: SecretString,
    pub confirm_password: SecretString,
}

/// Body of `POST /admin/reset`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PasswordResetBody<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

impl PasswordChangeForm {
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` if a field is blank or the confirmation
    /// does not match.
    pub fn validate(&self) -> Result<()> {
        let current = self.current_password.expose_secret();
        let new = self.new_password.expose_secret();
        let confirm = self.confirm_password.expose_secret();

        if current.is_empty() || new.is_empty() || confirm.is_empty() {
            return Err(AdminError::invalid(
                "Missing Information",
                "Please fill in all password fields",
            ));
        }
        if new != confirm {
            return Err(AdminError::invalid(
                "Password Mismatch",
                "New password and confirmation do not match",
            ));
        }
        Ok(())
    }

    pub(crate) fn body(&self) -> PasswordResetBody<'_> {
        PasswordResetBody {
            current_password: self.current_password.expose_secret(),
            new_password: self.new_password.expose_secret(),
        }
    }
}
