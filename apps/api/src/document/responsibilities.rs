//! Responsibility Loader — categorized bullet points for each work experience.
//!
//! Two backends behind one trait:
//! - `PgResponsibilityLoader`: one query per work experience, issued while the
//!   work experience section is assembled.
//! - `PrefetchedResponsibilities`: one batch query for every id up front, then
//!   lookups from memory. A failed batch leaves every entry without bullets.
//!
//! The composer only sees `&dyn ResponsibilityLoader` and treats any error as
//! "no responsibilities for this entry".

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::cv::repository::{fetch_responsibilities, fetch_responsibilities_batch};
use crate::errors::AppError;
use crate::models::cv::{ResponsibilityCategory, ResponsibilityRow};

#[async_trait]
pub trait ResponsibilityLoader: Send + Sync {
    async fn load(&self, work_experience_id: Uuid)
        -> Result<Vec<ResponsibilityCategory>, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Per-entry loader
// ────────────────────────────────────────────────────────────────────────────

pub struct PgResponsibilityLoader {
    pool: PgPool,
}

impl PgResponsibilityLoader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResponsibilityLoader for PgResponsibilityLoader {
    async fn load(
        &self,
        work_experience_id: Uuid,
    ) -> Result<Vec<ResponsibilityCategory>, AppError> {
        let rows = fetch_responsibilities(&self.pool, work_experience_id).await?;
        Ok(group_rows(rows)
            .remove(&work_experience_id)
            .unwrap_or_default())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Batch loader
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PrefetchedResponsibilities {
    by_work_experience: HashMap<Uuid, Vec<ResponsibilityCategory>>,
}

impl PrefetchedResponsibilities {
    /// Loads responsibilities for every id in a single round-trip.
    ///
    /// A failed query is logged and yields an empty loader: the document is
    /// still produced, just without bullets.
    pub async fn prefetch(pool: &PgPool, work_experience_ids: &[Uuid]) -> Self {
        if work_experience_ids.is_empty() {
            return Self::default();
        }
        match fetch_responsibilities_batch(pool, work_experience_ids).await {
            Ok(rows) => {
                let by_work_experience = group_rows(rows);
                tracing::debug!(
                    "Prefetched responsibilities for {}/{} work experiences",
                    by_work_experience.len(),
                    work_experience_ids.len()
                );
                Self { by_work_experience }
            }
            Err(e) => {
                warn!(
                    "Failed to prefetch responsibilities for {} work experiences: {e}",
                    work_experience_ids.len()
                );
                Self::default()
            }
        }
    }

    #[cfg(test)]
    pub fn from_map(by_work_experience: HashMap<Uuid, Vec<ResponsibilityCategory>>) -> Self {
        Self { by_work_experience }
    }
}

#[async_trait]
impl ResponsibilityLoader for PrefetchedResponsibilities {
    async fn load(
        &self,
        work_experience_id: Uuid,
    ) -> Result<Vec<ResponsibilityCategory>, AppError> {
        Ok(self
            .by_work_experience
            .get(&work_experience_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Folds flat join rows into ordered categories per work experience.
///
/// Rows must arrive ordered by category then item; that order is kept.
/// Categories without any non-blank item are dropped.
pub fn group_rows(rows: Vec<ResponsibilityRow>) -> HashMap<Uuid, Vec<ResponsibilityCategory>> {
    let mut grouped: HashMap<Uuid, Vec<(Uuid, ResponsibilityCategory)>> = HashMap::new();

    for row in rows {
        let categories = grouped.entry(row.work_experience_id).or_default();
        let idx = match categories.iter().position(|(id, _)| *id == row.category_id) {
            Some(idx) => idx,
            None => {
                categories.push((
                    row.category_id,
                    ResponsibilityCategory {
                        name: row.category_name,
                        items: Vec::new(),
                    },
                ));
                categories.len() - 1
            }
        };
        if let Some(item) = row.item.filter(|i| !i.trim().is_empty()) {
            categories[idx].1.items.push(item);
        }
    }

    grouped
        .into_iter()
        .map(|(we_id, categories)| {
            let categories: Vec<_> = categories
                .into_iter()
                .map(|(_, c)| c)
                .filter(|c| !c.items.is_empty())
                .collect();
            (we_id, categories)
        })
        .collect()
}
