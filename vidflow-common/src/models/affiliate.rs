//! Affiliate companies and per-video matches

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateCompany {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub affiliate_url: String,
    pub keywords: Vec<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl AffiliateCompany {
    /// Case-insensitive check of `title` against the company name and keywords
    pub fn matches_title(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        std::iter::once(&self.name)
            .chain(self.keywords.iter())
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .any(|term| title.contains(&term))
    }
}

/// A video whose title mentions an affiliate company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateMatch {
    pub id: i64,
    pub video_id: i64,
    pub company_id: i64,
    pub notified: bool,
    pub included_by_youtuber: bool,
    pub created_at: DateTime<Utc>,
    pub company_name: Option<String>,
    pub affiliate_url: Option<String>,
}
