//! Content repository: reads and writes campaign content, templates and promo codes.
//!
//! Uses prepared statements and transactions for data integrity.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use serde::Serialize;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use crate::errors::AppError;
use crate::html::{extract_field_names, extract_hyperlinks};
use crate::models::{
    CampaignContentModel, CampaignState, CampaignStatusUpdate, ContentVariant, PromoCodeModel,
    PromoCodeType, TemplateModel, CONTENT_EDITED_STEP,
};
use crate::reconcile::{FieldLinkBatch, HyperlinkDelta};

/// Outcome of a campaign content save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSaveSummary {
    pub fields_linked: u64,
    pub hyperlinks_added: usize,
    pub hyperlinks_removed: usize,
}

/// Database repository for all content operations.
#[derive(Clone)]
pub struct ContentRepository {
    pool: SqlitePool,
}

impl ContentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== TEMPLATE OPERATIONS ====================

    /// Get a template owned by the account or shared publicly.
    pub async fn get_template(
        &self,
        account_name: &str,
        template_id: i64,
    ) -> Result<Option<TemplateModel>, AppError> {
        let row = sqlx::query(
            r#"SELECT id_template, account_name, is_public, name, editor_type,
                      html_code, meta, preview_image
               FROM templates
               WHERE id_template = ? AND active = 1 AND (account_name = ? OR is_public = 1)"#,
        )
        .bind(template_id)
        .bind(account_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(template_from_row))
    }

    /// Create a private template for the account and return its id.
    pub async fn create_template(
        &self,
        account_name: &str,
        name: &str,
        content: &ContentVariant,
    ) -> Result<i64, AppError> {
        let persisted = content.serialize()?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"INSERT INTO templates (
                account_name, is_public, active, name, editor_type, html_code, meta,
                preview_image, created_at, modified_at
            ) VALUES (?, 0, 1, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(account_name)
        .bind(name)
        .bind(persisted.editor_type)
        .bind(&persisted.html)
        .bind(&persisted.meta)
        .bind(non_empty(&persisted.preview_image))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let template_id = result.last_insert_rowid();
        tracing::info!(account = account_name, template_id, "template created");
        Ok(template_id)
    }

    /// Update a private template of the account.
    ///
    /// Only Unlayer content can be written; anything else fails before the store is touched.
    pub async fn update_template(
        &self,
        account_name: &str,
        template: &TemplateModel,
    ) -> Result<(), AppError> {
        let persisted = template.content.serialize()?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"UPDATE templates SET
                name = ?, editor_type = ?, html_code = ?, meta = ?, preview_image = ?,
                modified_at = ?
            WHERE id_template = ? AND account_name = ? AND is_public = 0 AND active = 1"#,
        )
        .bind(&template.name)
        .bind(persisted.editor_type)
        .bind(&persisted.html)
        .bind(&persisted.meta)
        .bind(non_empty(&persisted.preview_image))
        .bind(&now)
        .bind(template.id)
        .bind(account_name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::RelationNotFound(format!(
                "Template {} does not exist for account {}",
                template.id, account_name
            )));
        }

        tracing::info!(account = account_name, template_id = template.id, "template updated");
        Ok(())
    }

    // ==================== CAMPAIGN OPERATIONS ====================

    /// Compute the campaign state for the account.
    pub async fn get_campaign_state(
        &self,
        account_name: &str,
        campaign_id: i64,
    ) -> Result<CampaignState, AppError> {
        let mut conn = self.pool.acquire().await?;
        campaign_state_in(&mut conn, account_name, campaign_id).await
    }

    /// Get the content of a campaign of the account.
    ///
    /// Returns `None` when the campaign is not the account's or has no content yet.
    pub async fn get_campaign_content(
        &self,
        account_name: &str,
        campaign_id: i64,
    ) -> Result<Option<CampaignContentModel>, AppError> {
        let row = sqlx::query(
            r#"SELECT c.status, c.preview_image, co.editor_type, co.html, co.meta
               FROM campaigns c
               JOIN contents co ON co.id_campaign = c.id_campaign
               WHERE c.id_campaign = ? AND c.account_name = ?"#,
        )
        .bind(campaign_id)
        .bind(account_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let status: Option<i32> = row.get("status");
            let editor_type: i32 = row.get("editor_type");
            CampaignContentModel {
                campaign_id,
                state: CampaignState::evaluate(true, true, Some(editor_type), status),
                content: ContentVariant::resolve(
                    editor_type,
                    row.get("html"),
                    row.get("meta"),
                    row.get("preview_image"),
                ),
            }
        }))
    }

    /// Save campaign content and everything derived from it.
    ///
    /// The writability check, content row, field links, hyperlinks and campaign status
    /// all run in one transaction.
    pub async fn save_campaign_content(
        &self,
        account_name: &str,
        campaign_id: i64,
        content: &ContentVariant,
    ) -> Result<ContentSaveSummary, AppError> {
        let persisted = content.serialize()?;

        let mut tx = self.pool.begin().await?;

        let state = campaign_state_in(&mut tx, account_name, campaign_id).await?;
        if !state.own_campaign_exists {
            return Err(AppError::NotFound(format!(
                "Campaign {} not found",
                campaign_id
            )));
        }
        if !state.is_writable {
            return Err(AppError::Validation(format!(
                "Campaign {} is read only",
                campaign_id
            )));
        }

        sqlx::query(
            r#"INSERT INTO contents (id_campaign, editor_type, html, meta, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id_campaign) DO UPDATE SET
                   editor_type = excluded.editor_type,
                   html = excluded.html,
                   meta = excluded.meta,
                   updated_at = excluded.updated_at"#,
        )
        .bind(campaign_id)
        .bind(persisted.editor_type)
        .bind(&persisted.html)
        .bind(&persisted.meta)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let field_names = extract_field_names(&persisted.html);
        let field_ids = field_ids_by_name(&mut tx, account_name, &field_names).await?;
        let fields_linked = Self::link_fields(&mut tx, campaign_id, &field_ids).await?;

        let hyperlinks = extract_hyperlinks(&persisted.html);
        let delta = Self::reconcile_hyperlinks(&mut tx, campaign_id, &hyperlinks).await?;

        Self::update_campaign_status(
            &mut tx,
            campaign_id,
            &CampaignStatusUpdate {
                current_step: CONTENT_EDITED_STEP,
                editor_type: persisted.editor_type,
                preview_image: non_empty(&persisted.preview_image),
            },
        )
        .await?;

        tx.commit().await?;

        let summary = ContentSaveSummary {
            fields_linked,
            hyperlinks_added: delta.to_add.len(),
            hyperlinks_removed: delta.to_remove.len(),
        };
        tracing::info!(
            account = account_name,
            campaign_id,
            editor_type = content.editor_type(),
            fields_linked = summary.fields_linked,
            hyperlinks_added = summary.hyperlinks_added,
            hyperlinks_removed = summary.hyperlinks_removed,
            "campaign content saved"
        );
        Ok(summary)
    }

    /// Replace a campaign's content with the content of a template.
    pub async fn create_campaign_content_from_template(
        &self,
        account_name: &str,
        campaign_id: i64,
        template_id: i64,
    ) -> Result<ContentSaveSummary, AppError> {
        let template = self
            .get_template(account_name, template_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Template {} not found", template_id)))?;

        self.save_campaign_content(account_name, campaign_id, &template.content)
            .await
    }

    /// Record the editing step, content editor type and preview image of a campaign.
    ///
    /// A `None` preview image clears the stored one.
    pub async fn update_campaign_status(
        conn: &mut SqliteConnection,
        campaign_id: i64,
        update: &CampaignStatusUpdate,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE campaigns SET
                current_step = ?, content_type = ?, preview_image = ?, updated_at = ?
            WHERE id_campaign = ?"#,
        )
        .bind(update.current_step)
        .bind(update.editor_type)
        .bind(&update.preview_image)
        .bind(Utc::now().to_rfc3339())
        .bind(campaign_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::RelationNotFound(format!(
                "Campaign {} does not exist",
                campaign_id
            )));
        }
        Ok(())
    }

    // ==================== ASSOCIATION OPERATIONS ====================

    /// Link field ids to a content row without unlinking anything. Returns inserted rows.
    pub async fn link_fields(
        conn: &mut SqliteConnection,
        content_id: i64,
        field_ids: &[i64],
    ) -> Result<u64, AppError> {
        let batch = FieldLinkBatch::new(content_id, field_ids);
        let sql = batch.sql();
        let mut query = sqlx::query(&sql).bind(batch.content_id());
        if let Some(staged) = batch.staged_array()? {
            query = query.bind(staged);
        }
        let result = query.execute(&mut *conn).await?;

        tracing::debug!(
            content_id,
            staged = batch.staged().len(),
            inserted = result.rows_affected(),
            "field links written"
        );
        Ok(result.rows_affected())
    }

    /// Make the persisted hyperlinks of a content row equal `desired`.
    ///
    /// Links present on both sides keep their rows.
    pub async fn reconcile_hyperlinks(
        conn: &mut SqliteConnection,
        content_id: i64,
        desired: &BTreeSet<String>,
    ) -> Result<HyperlinkDelta, AppError> {
        let persisted: BTreeSet<String> =
            sqlx::query("SELECT url FROM content_hyperlinks WHERE id_content = ?")
                .bind(content_id)
                .fetch_all(&mut *conn)
                .await?
                .iter()
                .map(|row| row.get("url"))
                .collect();

        let delta = HyperlinkDelta::compute(desired, &persisted);
        if delta.is_empty() {
            return Ok(delta);
        }

        for url in &delta.to_remove {
            sqlx::query("DELETE FROM content_hyperlinks WHERE id_content = ? AND url = ?")
                .bind(content_id)
                .bind(url)
                .execute(&mut *conn)
                .await?;
        }

        let now = Utc::now().to_rfc3339();
        let to_add: Vec<&String> = delta.to_add.iter().collect();
        for chunk in to_add.chunks(INSERT_CHUNK_ROWS) {
            let mut insert: QueryBuilder<Sqlite> =
                QueryBuilder::new("INSERT INTO content_hyperlinks (id_content, url, created_at) ");
            insert.push_values(chunk, |mut row, url| {
                row.push_bind(content_id)
                    .push_bind(url.to_string())
                    .push_bind(now.clone());
            });
            insert.build().execute(&mut *conn).await?;
        }

        tracing::debug!(
            content_id,
            added = delta.to_add.len(),
            removed = delta.to_remove.len(),
            "hyperlinks reconciled"
        );
        Ok(delta)
    }

    // ==================== PROMO CODE OPERATIONS ====================

    /// Create a promo code for a campaign and return its id.
    pub async fn create_promo_code(&self, promo_code: &PromoCodeModel) -> Result<i64, AppError> {
        let result = sqlx::query(
            r#"INSERT INTO promo_codes (
                id_campaign, type, value, include_shipping, first_purchase,
                min_price, start_date, end_date, categories
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(promo_code.campaign_id)
        .bind(promo_code.promo_type.as_str())
        .bind(promo_code.value)
        .bind(promo_code.include_shipping as i32)
        .bind(promo_code.first_purchase as i32)
        .bind(promo_code.min_price)
        .bind(promo_code.start_date)
        .bind(promo_code.end_date)
        .bind(&promo_code.categories)
        .execute(&self.pool)
        .await?;

        let promo_code_id = result.last_insert_rowid();
        tracing::info!(
            campaign_id = promo_code.campaign_id,
            promo_code_id,
            "promo code created"
        );
        Ok(promo_code_id)
    }

    /// Get a promo code by its `(campaign_id, id)` pair.
    pub async fn get_promo_code(
        &self,
        campaign_id: i64,
        promo_code_id: i64,
    ) -> Result<Option<PromoCodeModel>, AppError> {
        let row = sqlx::query(
            r#"SELECT id_promo_code, id_campaign, type, value, include_shipping, first_purchase,
                      min_price, start_date, end_date, categories
               FROM promo_codes WHERE id_promo_code = ? AND id_campaign = ?"#,
        )
        .bind(promo_code_id)
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(promo_code_from_row).transpose()
    }

    /// Update a promo code. A pair with no persisted row is reported as a missing relation.
    pub async fn update_promo_code(&self, promo_code: &PromoCodeModel) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE promo_codes SET
                type = ?, value = ?, include_shipping = ?, first_purchase = ?,
                min_price = ?, start_date = ?, end_date = ?, categories = ?
            WHERE id_promo_code = ? AND id_campaign = ?"#,
        )
        .bind(promo_code.promo_type.as_str())
        .bind(promo_code.value)
        .bind(promo_code.include_shipping as i32)
        .bind(promo_code.first_purchase as i32)
        .bind(promo_code.min_price)
        .bind(promo_code.start_date)
        .bind(promo_code.end_date)
        .bind(&promo_code.categories)
        .bind(promo_code.id)
        .bind(promo_code.campaign_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::RelationNotFound(format!(
                "Promo code {} does not exist in campaign {}",
                promo_code.id, promo_code.campaign_id
            )));
        }

        Ok(())
    }
}

// Bound parameters per statement stay well below SQLite's variable limit
const INSERT_CHUNK_ROWS: usize = 300;
const LOOKUP_CHUNK_NAMES: usize = 500;

async fn campaign_state_in(
    conn: &mut SqliteConnection,
    account_name: &str,
    campaign_id: i64,
) -> Result<CampaignState, AppError> {
    let row = sqlx::query(
        r#"SELECT c.status, co.editor_type
           FROM campaigns c
           LEFT JOIN contents co ON co.id_campaign = c.id_campaign
           WHERE c.id_campaign = ? AND c.account_name = ?"#,
    )
    .bind(campaign_id)
    .bind(account_name)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(match row {
        Some(row) => {
            let status: Option<i32> = row.get("status");
            let editor_type: Option<i32> = row.get("editor_type");
            CampaignState::evaluate(true, editor_type.is_some(), editor_type, status)
        }
        None => CampaignState::not_found(),
    })
}

/// Resolve field names to ids, keeping document order and repetitions.
///
/// Names match case-insensitively against basic fields and the account's own fields;
/// an account field shadows a basic field with the same name. Unknown names are skipped.
async fn field_ids_by_name(
    conn: &mut SqliteConnection,
    account_name: &str,
    names: &[String],
) -> Result<Vec<i64>, AppError> {
    let distinct: BTreeSet<String> = names.iter().map(|name| name.to_lowercase()).collect();
    let distinct: Vec<String> = distinct.into_iter().collect();

    let mut ids_by_name: HashMap<String, i64> = HashMap::new();
    for chunk in distinct.chunks(LOOKUP_CHUNK_NAMES) {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id_field, lower(name) AS lower_name FROM fields \
             WHERE (account_name IS NULL OR account_name = ",
        );
        query.push_bind(account_name.to_string());
        query.push(") AND lower(name) IN (");
        let mut separated = query.separated(", ");
        for name in chunk {
            separated.push_bind(name.clone());
        }
        separated.push_unseparated(") ORDER BY account_name IS NULL, id_field");

        for row in query.build().fetch_all(&mut *conn).await? {
            ids_by_name
                .entry(row.get("lower_name"))
                .or_insert_with(|| row.get("id_field"));
        }
    }

    Ok(names
        .iter()
        .filter_map(|name| ids_by_name.get(&name.to_lowercase()).copied())
        .collect())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// Helper functions for row conversion

fn template_from_row(row: &sqlx::sqlite::SqliteRow) -> TemplateModel {
    let is_public: i32 = row.get("is_public");
    TemplateModel {
        id: row.get("id_template"),
        account_name: row.get("account_name"),
        is_public: is_public != 0,
        name: row.get("name"),
        content: ContentVariant::resolve(
            row.get("editor_type"),
            row.get("html_code"),
            row.get("meta"),
            row.get("preview_image"),
        ),
    }
}

fn promo_code_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<PromoCodeModel, AppError> {
    let type_str: String = row.get("type");
    let promo_type = PromoCodeType::parse(&type_str)
        .ok_or_else(|| AppError::Internal(format!("Unknown promo code type {:?}", type_str)))?;
    let include_shipping: i32 = row.get("include_shipping");
    let first_purchase: i32 = row.get("first_purchase");

    Ok(PromoCodeModel {
        id: row.get("id_promo_code"),
        campaign_id: row.get("id_campaign"),
        promo_type,
        value: row.get("value"),
        include_shipping: include_shipping != 0,
        first_purchase: first_purchase != 0,
        min_price: row.get("min_price"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        categories: row.get("categories"),
    })
}
