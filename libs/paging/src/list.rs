use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::page::{Page, PageInfo};
use crate::Error;

/// Either wire shape of a list response. An object must carry a `content`
/// key; `null` there reads as no items.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    Bare(Vec<T>),
    Paged {
        #[serde(deserialize_with = "nullable_items")]
        content: Vec<T>,
        #[serde(default, rename = "totalElements")]
        total_elements: Option<u64>,
        #[serde(default)]
        number: Option<u64>,
        #[serde(default)]
        size: Option<u64>,
    },
}

impl<T> ListBody<T> {
    /// Items in server order, whichever shape carried them.
    pub fn into_items(self) -> Vec<T> {
        match self {
            ListBody::Bare(items) => items,
            ListBody::Paged { content, .. } => content,
        }
    }

    /// Total element count: the page's `totalElements`, or the array length.
    pub fn total(&self) -> u64 {
        match self {
            ListBody::Bare(items) => items.len() as u64,
            ListBody::Paged {
                content,
                total_elements,
                ..
            } => total_elements.unwrap_or(content.len() as u64),
        }
    }

    /// Normalize into a [`Page`]; a bare array becomes a single page holding everything.
    pub fn into_page(self) -> Page<T> {
        let total = self.total();
        match self {
            ListBody::Bare(items) => {
                let size = items.len() as u64;
                Page::new(
                    items,
                    PageInfo {
                        number: 0,
                        size,
                        total_elements: total,
                    },
                )
            }
            ListBody::Paged {
                content,
                number,
                size,
                ..
            } => {
                let size = size.unwrap_or(content.len() as u64);
                Page::new(
                    content,
                    PageInfo {
                        number: number.unwrap_or(0),
                        size,
                        total_elements: total,
                    },
                )
            }
        }
    }
}

fn nullable_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decode a list from raw JSON, accepting either shape.
pub fn decode_list<T: DeserializeOwned>(body: &[u8]) -> Result<ListBody<T>, Error> {
    serde_json::from_slice(body).map_err(Error::Shape)
}
