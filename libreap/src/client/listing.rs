//! Wire types for the registry listing endpoints.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;

/// Response from the catalog endpoint (`GET <base>/_catalog`).
#[derive(Debug, Deserialize)]
pub(crate) struct CatalogResponse {
    /// Repository names relative to the base URL
    #[serde(default)]
    pub(crate) repositories: Vec<String>,
}

/// Response from the tags endpoint (`GET <repo>/tags/list`).
///
/// Besides the plain tag list, the registry returns a `manifest` object
/// keyed by digest. The entries are kept in document order.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ImageListing {
    /// Manifest metadata keyed by digest, in the order the registry sent them
    #[serde(default, deserialize_with = "ordered_manifests")]
    pub manifest: Vec<(String, ManifestEntry)>,

    /// Every tag in the repository
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Metadata for a single manifest in an [`ImageListing`].
///
/// The registry encodes the numeric fields as strings; plain numbers are
/// accepted too.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    #[serde(default, deserialize_with = "string_or_number")]
    pub image_size_bytes: u64,

    #[serde(default)]
    pub layer_id: String,

    #[serde(default)]
    pub media_type: String,

    /// Tags currently pointing at this digest
    #[serde(default)]
    pub tag: Vec<String>,

    #[serde(default, deserialize_with = "string_or_number")]
    pub time_created_ms: u64,

    #[serde(default, deserialize_with = "string_or_number")]
    pub time_uploaded_ms: u64,
}

fn ordered_manifests<'de, D>(deserializer: D) -> Result<Vec<(String, ManifestEntry)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedManifests;

    impl<'de> Visitor<'de> for OrderedManifests {
        type Value = Vec<(String, ManifestEntry)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of digest to manifest metadata")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((digest, entry)) = map.next_entry::<String, ManifestEntry>()? {
                entries.push((digest, entry));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedManifests)
}

fn string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) if s.trim().is_empty() => Ok(0),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected an integer, got {:?}", s))),
    }
}
