//! Content and document identifiers.
//!
//! A resolution request names content by a [`ContentKey`] (`type`, `id`).
//! Stores index it by its canonical [`CacheKey`] string `type:id`, and the
//! admin API refers to it by an [`ExternalId`] digest so raw identifiers never
//! travel in admin URLs.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::borrow::Borrow;
use std::fmt;

/// Generate a newtype ID wrapper over `String`.
///
/// The macro produces a struct with:
/// - `as_str()` and `into_string()` accessors
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Ord`, `Serialize`, `Deserialize`
/// - `Display`, `AsRef<str>` and `Borrow<str>` delegating to the inner string
/// - `From<String>` and `From<&str>` conversions
macro_rules! string_id {
    ($($(#[doc = $doc:expr])* $name:ident),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                /// Borrow the inner string.
                #[must_use]
                pub fn as_str(&self) -> &str {
                    &self.0
                }

                /// Consume the ID, returning the inner string.
                #[must_use]
                pub fn into_string(self) -> String {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl AsRef<str> for $name {
                fn as_ref(&self) -> &str {
                    &self.0
                }
            }

            impl Borrow<str> for $name {
                fn borrow(&self) -> &str {
                    &self.0
                }
            }

            impl From<String> for $name {
                fn from(s: String) -> Self {
                    Self(s)
                }
            }

            impl From<&str> for $name {
                fn from(s: &str) -> Self {
                    Self(s.to_owned())
                }
            }
        )+
    };
}

string_id! {
    /// Canonical `type:id` key of a piece of content.
    CacheKey,
    /// Stable digest of a [`CacheKey`], safe to expose in admin URLs.
    ExternalId,
    /// Identifier of a registered upstream provider (`addon-…`).
    ProviderId,
}

impl CacheKey {
    /// Build the canonical key string for `(kind, id)`.
    pub fn normalize(kind: &str, id: &str) -> Self {
        Self(format!("{kind}:{id}"))
    }
}

impl ExternalId {
    /// SHA-1 of the key string, base64url without padding.
    pub fn derive(key: &CacheKey) -> Self {
        let digest = Sha1::digest(key.as_str().as_bytes());
        Self(URL_SAFE_NO_PAD.encode(digest))
    }
}

/// The `(type, id)` pair a client asks streams for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentKey {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl ContentKey {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::normalize(&self.kind, &self.id)
    }

    pub fn external_id(&self) -> ExternalId {
        ExternalId::derive(&self.cache_key())
    }

    /// Series and TV content look up episodic metadata.
    pub fn is_episodic(&self) -> bool {
        matches!(self.kind.as_str(), "series" | "tv")
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
