//! Affiliate companies and video matches

use chrono::Utc;
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::{conflict_on_unique, json_column};
use crate::models::{AffiliateCompany, AffiliateMatch};
use crate::{Error, Result};

const DUPLICATE_NAME: &str = "Ya existe una empresa con este nombre";

/// Create / update payload for a company
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub affiliate_url: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl CompanyInput {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().chars().count() < 2 {
            return Err(Error::InvalidInput(
                "El nombre debe tener al menos 2 caracteres".into(),
            ));
        }
        if !is_http_url(&self.affiliate_url) {
            return Err(Error::InvalidInput(
                "La URL de afiliación debe ser válida".into(),
            ));
        }
        if let Some(logo) = self.logo_url.as_deref().filter(|l| !l.trim().is_empty()) {
            if !is_http_url(logo) {
                return Err(Error::InvalidInput("La URL del logo debe ser válida".into()));
            }
        }
        Ok(())
    }

    fn clean_keywords(&self) -> Vec<String> {
        self.keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    (value.starts_with("http://") || value.starts_with("https://")) && value.len() > "https://".len()
}

fn company_from_row(row: &SqliteRow) -> Result<AffiliateCompany> {
    Ok(AffiliateCompany {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        logo_url: row.try_get("logo_url")?,
        affiliate_url: row.try_get("affiliate_url")?,
        keywords: json_column(row.try_get("keywords")?)?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn match_from_row(row: &SqliteRow) -> Result<AffiliateMatch> {
    Ok(AffiliateMatch {
        id: row.try_get("id")?,
        video_id: row.try_get("video_id")?,
        company_id: row.try_get("company_id")?,
        notified: row.try_get("notified")?,
        included_by_youtuber: row.try_get("included_by_youtuber")?,
        created_at: row.try_get("created_at")?,
        company_name: row.try_get("company_name")?,
        affiliate_url: row.try_get("affiliate_url")?,
    })
}

pub async fn list_companies(pool: &SqlitePool, active_only: bool) -> Result<Vec<AffiliateCompany>> {
    let sql = if active_only {
        "SELECT * FROM affiliate_companies WHERE active = 1 ORDER BY name"
    } else {
        "SELECT * FROM affiliate_companies ORDER BY name"
    };
    let rows = sqlx::query(sql).fetch_all(pool).await?;
    rows.iter().map(company_from_row).collect()
}

pub async fn get_company(pool: &SqlitePool, id: i64) -> Result<Option<AffiliateCompany>> {
    let row = sqlx::query("SELECT * FROM affiliate_companies WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(company_from_row).transpose()
}

pub async fn create_company(pool: &SqlitePool, input: &CompanyInput) -> Result<AffiliateCompany> {
    input.validate()?;

    let row = sqlx::query(
        r#"
        INSERT INTO affiliate_companies (name, description, logo_url, affiliate_url, keywords, active, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(input.name.trim())
    .bind(&input.description)
    .bind(&input.logo_url)
    .bind(input.affiliate_url.trim())
    .bind(serde_json::to_string(&input.clean_keywords())?)
    .bind(input.active.unwrap_or(true))
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;

    company_from_row(&row)
}

/// Update a company; the flag is true when it went from inactive to active
pub async fn update_company(
    pool: &SqlitePool,
    id: i64,
    input: &CompanyInput,
) -> Result<(AffiliateCompany, bool)> {
    input.validate()?;

    let existing = get_company(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound("Empresa no encontrada".into()))?;
    let active = input.active.unwrap_or(true);

    let row = sqlx::query(
        r#"
        UPDATE affiliate_companies
        SET name = ?, description = ?, logo_url = ?, affiliate_url = ?, keywords = ?, active = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(input.name.trim())
    .bind(&input.description)
    .bind(&input.logo_url)
    .bind(input.affiliate_url.trim())
    .bind(serde_json::to_string(&input.clean_keywords())?)
    .bind(active)
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;

    Ok((company_from_row(&row)?, active && !existing.active))
}

pub async fn delete_company(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM affiliate_companies WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Empresa no encontrada".into()));
    }
    Ok(())
}

/// Insert companies by name, skipping existing ones (case-insensitive)
///
/// Imported companies have no affiliate URL until an admin edits them.
/// Returns `(created, skipped)`.
pub async fn import_company_names(pool: &SqlitePool, names: &[String]) -> Result<(u64, u64)> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;
    let mut created = 0;

    for name in names {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO affiliate_companies (name, affiliate_url, keywords, active, created_at) \
             VALUES (?, '', '[]', 1, ?)",
        )
        .bind(name.trim())
        .bind(now)
        .execute(&mut *tx)
        .await?;
        created += result.rows_affected();
    }

    tx.commit().await?;
    Ok((created, names.len() as u64 - created))
}

/// Record a (video, company) match unless one exists; true when inserted
pub async fn record_match(pool: &SqlitePool, video_id: i64, company_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO affiliate_matches (video_id, company_id, notified, included_by_youtuber, created_at) \
         VALUES (?, ?, 0, 0, ?)",
    )
    .bind(video_id)
    .bind(company_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_notified(pool: &SqlitePool, video_id: i64, company_id: i64) -> Result<()> {
    sqlx::query("UPDATE affiliate_matches SET notified = 1 WHERE video_id = ? AND company_id = ?")
        .bind(video_id)
        .bind(company_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Match active companies against a title, returning the newly matched ones
pub async fn scan_video(pool: &SqlitePool, video_id: i64, title: &str) -> Result<Vec<AffiliateCompany>> {
    let mut new_matches = Vec::new();
    for company in list_companies(pool, true).await? {
        if company.matches_title(title) && record_match(pool, video_id, company.id).await? {
            new_matches.push(company);
        }
    }
    Ok(new_matches)
}

/// Match one company against every live video, returning newly matched video ids
pub async fn scan_videos_for_company(pool: &SqlitePool, company: &AffiliateCompany) -> Result<Vec<i64>> {
    if !company.active {
        return Ok(Vec::new());
    }

    let rows = sqlx::query("SELECT id, title FROM videos WHERE is_deleted = 0")
        .fetch_all(pool)
        .await?;

    let mut new_matches = Vec::new();
    for row in rows {
        let video_id: i64 = row.try_get("id")?;
        let title: String = row.try_get("title")?;
        if company.matches_title(&title) && record_match(pool, video_id, company.id).await? {
            new_matches.push(video_id);
        }
    }
    Ok(new_matches)
}

const MATCH_SELECT: &str = r#"
    SELECT m.id, m.video_id, m.company_id, m.notified, m.included_by_youtuber, m.created_at,
           c.name AS company_name, c.affiliate_url AS affiliate_url
    FROM affiliate_matches m
    LEFT JOIN affiliate_companies c ON c.id = m.company_id
"#;

pub async fn list_matches_for_video(pool: &SqlitePool, video_id: i64) -> Result<Vec<AffiliateMatch>> {
    let rows = sqlx::query(&format!("{} WHERE m.video_id = ? ORDER BY c.name", MATCH_SELECT))
        .bind(video_id)
        .fetch_all(pool)
        .await?;
    rows.iter().map(match_from_row).collect()
}

pub async fn get_match(pool: &SqlitePool, id: i64) -> Result<Option<AffiliateMatch>> {
    let row = sqlx::query(&format!("{} WHERE m.id = ?", MATCH_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(match_from_row).transpose()
}

/// Record whether the youtuber included the affiliate link
pub async fn set_inclusion(pool: &SqlitePool, id: i64, included: bool) -> Result<AffiliateMatch> {
    let result = sqlx::query("UPDATE affiliate_matches SET included_by_youtuber = ? WHERE id = ?")
        .bind(included)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Coincidencia no encontrada".into()));
    }
    get_match(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound("Coincidencia no encontrada".into()))
}
