//! Product image references.

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder shown when a product has no image at the requested index.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Ordered list of image URLs for a product or cart line.
///
/// The backend returns either a JSON array or a string holding a JSON array
/// (`"[\"a.jpg\"]"`), and `null` for products without images. All three
/// deserialize here; serialization is always a plain array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ImageRefs(Vec<String>);

impl ImageRefs {
    /// Wrap a list of URLs.
    #[must_use]
    pub const fn new(urls: Vec<String>) -> Self {
        Self(urls)
    }

    /// URL at `index`, or the placeholder.
    #[must_use]
    pub fn get_or_placeholder(&self, index: usize) -> &str {
        self.0.get(index).map_or(PLACEHOLDER_IMAGE, String::as_str)
    }

    /// First image, or the placeholder.
    #[must_use]
    pub fn primary(&self) -> &str {
        self.get_or_placeholder(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for ImageRefs {
    fn from(urls: Vec<String>) -> Self {
        Self(urls)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawImageRefs {
    List(Vec<String>),
    Encoded(String),
}

impl<'de> Deserialize<'de> for ImageRefs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<RawImageRefs>::deserialize(deserializer)?;
        match raw {
            None => Ok(Self::default()),
            Some(RawImageRefs::List(urls)) => Ok(Self(urls)),
            Some(RawImageRefs::Encoded(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(Self::default());
                }
                if text.starts_with('[') {
                    serde_json::from_str::<Vec<String>>(text)
                        .map(Self)
                        .map_err(serde::de::Error::custom)
                } else {
                    // A bare URL string.
                    Ok(Self(vec![text.to_string()]))
                }
            }
        }
    }
}
