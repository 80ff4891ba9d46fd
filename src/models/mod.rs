//! Data models for campaign content, templates and promo codes.

mod campaign;
mod content;
mod promo_code;
mod template;

pub use campaign::*;
pub use content::*;
pub use promo_code::*;
pub use template::*;

use serde::Serialize;

/// Body returned by creation endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResource {
    pub created_resource_id: i64,
}
