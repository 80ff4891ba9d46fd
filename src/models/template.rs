//! Template model and DTOs.

use serde::{Deserialize, Serialize};

use super::{ContentBody, ContentRequest, ContentVariant};
use crate::errors::AppError;

/// A template as stored. Library templates have no owning account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateModel {
    pub id: i64,
    pub account_name: Option<String>,
    pub is_public: bool,
    pub name: String,
    pub content: ContentVariant,
}

/// Request body for creating or updating a template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRequest {
    pub template_name: String,
    #[serde(flatten)]
    pub content: ContentRequest,
}

impl TemplateRequest {
    /// Validate the request and split it into name and content.
    pub fn into_parts(self) -> Result<(String, ContentVariant), AppError> {
        let name = self.template_name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("templateName is required".to_string()));
        }
        let name = name.to_string();
        let content = self.content.into_variant()?;
        Ok((name, content))
    }
}

/// Response for GET template.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    pub template_id: i64,
    pub template_name: String,
    pub is_public: bool,
    #[serde(flatten)]
    pub content: ContentBody,
}

impl From<&TemplateModel> for TemplateResponse {
    fn from(model: &TemplateModel) -> Self {
        Self {
            template_id: model.id,
            template_name: model.name.clone(),
            is_public: model.is_public,
            content: ContentBody::from(&model.content),
        }
    }
}
