//! Content variants for campaign and template bodies.
//!
//! The stored editor-type code selects exactly one variant. Decoding is total so that
//! editor types introduced by other tools degrade to [`ContentVariant::Unknown`] instead of
//! failing reads; encoding only exists for variants this service can round-trip.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// Editor-type code written by the Unlayer editor.
pub const UNLAYER_EDITOR_TYPE: i32 = 5;

/// Content of a campaign or template, as produced by a specific editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentVariant {
    Unlayer {
        html_complete: String,
        /// Opaque editor design document (JSON text).
        meta: String,
        /// Empty when nothing was stored.
        preview_image: String,
    },
    Unknown {
        editor_type: i32,
    },
}

/// Column values written for a content row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedContent {
    pub editor_type: i32,
    pub html: String,
    pub meta: String,
    pub preview_image: String,
}

impl ContentVariant {
    /// Decode a stored row into a variant. Never fails.
    pub fn resolve(
        editor_type: i32,
        html: String,
        meta: String,
        preview_image: Option<String>,
    ) -> Self {
        match editor_type {
            UNLAYER_EDITOR_TYPE => ContentVariant::Unlayer {
                html_complete: html,
                meta,
                preview_image: preview_image.unwrap_or_default(),
            },
            other => ContentVariant::Unknown { editor_type: other },
        }
    }

    /// Encode the variant into persistable columns.
    pub fn serialize(&self) -> Result<PersistedContent, AppError> {
        match self {
            ContentVariant::Unlayer {
                html_complete,
                meta,
                preview_image,
            } => Ok(PersistedContent {
                editor_type: UNLAYER_EDITOR_TYPE,
                html: html_complete.clone(),
                meta: meta.clone(),
                preview_image: preview_image.clone(),
            }),
            ContentVariant::Unknown { .. } => {
                Err(AppError::UnsupportedContentKind(self.kind_name()))
            }
        }
    }

    pub fn editor_type(&self) -> i32 {
        match self {
            ContentVariant::Unlayer { .. } => UNLAYER_EDITOR_TYPE,
            ContentVariant::Unknown { editor_type } => *editor_type,
        }
    }

    /// Human readable kind, used in error messages and logs.
    pub fn kind_name(&self) -> String {
        match self {
            ContentVariant::Unlayer { .. } => "unlayer".to_string(),
            ContentVariant::Unknown { editor_type } => {
                format!("unknown (editor type {})", editor_type)
            }
        }
    }

    #[cfg(test)]
    pub fn html(&self) -> Option<&str> {
        match self {
            ContentVariant::Unlayer { html_complete, .. } => Some(html_complete),
            ContentVariant::Unknown { .. } => None,
        }
    }
}

/// Wire shape of a content body.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBody {
    #[serde(rename_all = "camelCase")]
    Unlayer {
        html_content: String,
        meta: Value,
        preview_image: String,
    },
    #[serde(rename_all = "camelCase")]
    Unknown { editor_type: i32 },
}

impl From<&ContentVariant> for ContentBody {
    fn from(content: &ContentVariant) -> Self {
        match content {
            ContentVariant::Unlayer {
                html_complete,
                meta,
                preview_image,
            } => ContentBody::Unlayer {
                html_content: html_complete.clone(),
                // Stored meta is opaque; pass it through as a string if it is not JSON.
                meta: serde_json::from_str(meta).unwrap_or_else(|_| Value::String(meta.clone())),
                preview_image: preview_image.clone(),
            },
            ContentVariant::Unknown { editor_type } => ContentBody::Unknown {
                editor_type: *editor_type,
            },
        }
    }
}

/// Request body carrying content for a campaign or template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRequest {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default)]
    pub meta: Option<Value>,
    #[serde(default)]
    pub preview_image: Option<String>,
}

impl ContentRequest {
    /// Validate the declared type and required fields.
    pub fn into_variant(self) -> Result<ContentVariant, AppError> {
        if self.content_type != "unlayer" {
            return Err(AppError::Validation(format!(
                "Content type '{}' is not supported",
                self.content_type
            )));
        }

        let html_complete = self
            .html_content
            .ok_or_else(|| AppError::Validation("htmlContent is required".to_string()))?;
        let meta = match self.meta {
            None | Some(Value::Null) => {
                return Err(AppError::Validation("meta is required".to_string()))
            }
            Some(Value::String(raw)) => raw,
            Some(document) => document.to_string(),
        };

        Ok(ContentVariant::Unlayer {
            html_complete,
            meta,
            preview_image: self.preview_image.unwrap_or_default(),
        })
    }
}
