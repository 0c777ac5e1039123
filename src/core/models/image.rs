//! Machine image identifiers and the deprecation registry
//!
//! An image identifier has the form `family:version`. The registry holds the
//! exact identifiers that are obsolete; lookups are plain string equality.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Images retired by the CI provider, always part of the registry
pub const BUILTIN_DEPRECATED_IMAGES: &[&str] = &["ubuntu-2204:2023.08.1", "android:2023.11.1"];

/// Tag used when the operator does not name a replacement tag
pub const DEFAULT_TAG: &str = "default";

/// Family portion of an image identifier: everything before the first `:`
///
/// An identifier without a `:` is all family.
#[must_use]
pub fn image_family(image: &str) -> &str {
    image.split_once(':').map_or(image, |(family, _)| family)
}

/// Build the replacement identifier for a deprecated image
///
/// An empty (or blank) tag selects [`DEFAULT_TAG`].
#[must_use]
pub fn replacement_image(old_image: &str, tag: &str) -> String {
    let tag = tag.trim();
    let tag = if tag.is_empty() { DEFAULT_TAG } else { tag };
    format!("{}:{tag}", image_family(old_image))
}

/// Static set of deprecated image identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeprecationRegistry {
    images: BTreeSet<String>,
}

impl Default for DeprecationRegistry {
    fn default() -> Self {
        Self::with_images(BUILTIN_DEPRECATED_IMAGES.iter().copied())
    }
}

impl DeprecationRegistry {
    /// Registry containing exactly the given identifiers
    pub fn with_images<I, S>(images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            images: normalize(images).collect(),
        }
    }

    /// Built-in registry extended with extra identifiers
    pub fn builtin_with<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        registry.images.extend(normalize(extra));
        registry
    }

    /// Whether `image` is deprecated (exact match only)
    #[must_use]
    pub fn is_deprecated(&self, image: &str) -> bool {
        self.images.contains(image)
    }

    /// Iterate over the registered identifiers in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(String::as_str)
    }

    /// Number of registered identifiers
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

fn normalize<I, S>(images: I) -> impl Iterator<Item = String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    images.into_iter().filter_map(|image| {
        let image: String = image.into();
        let image = image.trim();
        (!image.is_empty()).then(|| image.to_string())
    })
}
