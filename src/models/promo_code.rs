//! Promo code model and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Kind of discount a promo code grants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromoCodeType {
    Money,
    Percent,
}

impl PromoCodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromoCodeType::Money => "money",
            PromoCodeType::Percent => "percent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "money" => Some(PromoCodeType::Money),
            "percent" => Some(PromoCodeType::Percent),
            _ => None,
        }
    }
}

/// A promo code attached to a campaign. Identity is `(campaign_id, id)`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeModel {
    pub id: i64,
    pub campaign_id: i64,
    #[serde(rename = "type")]
    pub promo_type: PromoCodeType,
    pub value: f64,
    pub include_shipping: bool,
    pub first_purchase: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
}

/// Request body for creating or updating a promo code.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeRequest {
    #[serde(rename = "type")]
    pub promo_type: PromoCodeType,
    pub value: f64,
    #[serde(default)]
    pub include_shipping: bool,
    #[serde(default)]
    pub first_purchase: bool,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub categories: Option<String>,
}

impl PromoCodeRequest {
    /// Validate and bind the request to a `(campaign_id, id)` pair.
    pub fn into_model(self, campaign_id: i64, id: i64) -> Result<PromoCodeModel, AppError> {
        if !self.value.is_finite() || self.value <= 0.0 {
            return Err(AppError::Validation(
                "value must be a positive number".to_string(),
            ));
        }
        if self.promo_type == PromoCodeType::Percent && self.value > 100.0 {
            return Err(AppError::Validation(
                "percent value cannot exceed 100".to_string(),
            ));
        }
        if let Some(min_price) = self.min_price {
            if min_price < 0.0 {
                return Err(AppError::Validation(
                    "minPrice cannot be negative".to_string(),
                ));
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(AppError::Validation(
                    "endDate must not precede startDate".to_string(),
                ));
            }
        }

        Ok(PromoCodeModel {
            id,
            campaign_id,
            promo_type: self.promo_type,
            value: self.value,
            include_shipping: self.include_shipping,
            first_purchase: self.first_purchase,
            min_price: self.min_price,
            start_date: self.start_date,
            end_date: self.end_date,
            categories: self.categories,
        })
    }
}
