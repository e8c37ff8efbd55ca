//! Read-side queries for one CV. The schema belongs to the editor; these
//! queries only project it. Section rows come back in the editor's order
//! (`sort_order`, then creation time) and are never re-sorted downstream.

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::cv::{
    Education, Interest, Membership, Profile, Project, QualificationEquivalence, RawCertification,
    RawCvAggregate, ResponsibilityRow, Skill, WorkExperience,
};

/// Loads every section of a CV. Returns `None` if the CV does not exist;
/// a CV without a profile row comes back with `profile: None`.
pub async fn load_cv_aggregate(
    pool: &PgPool,
    cv_id: Uuid,
) -> Result<Option<RawCvAggregate>, sqlx::Error> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM cvs WHERE id = $1)")
        .bind(cv_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Ok(None);
    }

    let profile = sqlx::query_as::<_, Profile>(
        r#"
        SELECT id, full_name, email, phone, address, photo_url, bio, linkedin_url
        FROM profiles
        WHERE cv_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(cv_id)
    .fetch_optional(pool)
    .await?;

    let work_experiences = sqlx::query_as::<_, WorkExperience>(
        r#"
        SELECT id, company_name, position,
               start_date::text AS start_date, end_date::text AS end_date, description
        FROM work_experiences
        WHERE cv_id = $1
        ORDER BY sort_order, created_at
        "#,
    )
    .bind(cv_id)
    .fetch_all(pool)
    .await?;

    let projects = sqlx::query_as::<_, Project>(
        r#"
        SELECT id, title, description,
               start_date::text AS start_date, end_date::text AS end_date, url
        FROM projects
        WHERE cv_id = $1
        ORDER BY sort_order, created_at
        "#,
    )
    .bind(cv_id)
    .fetch_all(pool)
    .await?;

    let skills = sqlx::query_as::<_, Skill>(
        r#"
        SELECT id, name, level, category
        FROM skills
        WHERE cv_id = $1
        ORDER BY sort_order, created_at
        "#,
    )
    .bind(cv_id)
    .fetch_all(pool)
    .await?;

    let education = sqlx::query_as::<_, Education>(
        r#"
        SELECT id, institution, degree,
               start_date::text AS start_date, end_date::text AS end_date, description
        FROM education
        WHERE cv_id = $1
        ORDER BY sort_order, created_at
        "#,
    )
    .bind(cv_id)
    .fetch_all(pool)
    .await?;

    // Both date columns exist: older rows filled `date_obtained`.
    let certifications = sqlx::query_as::<_, RawCertification>(
        r#"
        SELECT id, name, issuer, issuing_organization,
               date_issued::text AS date_issued, date_obtained::text AS date_obtained,
               expiry_date::text AS expiry_date, NULL::text AS date_expires,
               url, credential_url, description
        FROM certifications
        WHERE cv_id = $1
        ORDER BY sort_order, created_at
        "#,
    )
    .bind(cv_id)
    .fetch_all(pool)
    .await?;

    let memberships = sqlx::query_as::<_, Membership>(
        r#"
        SELECT id, organisation, role,
               start_date::text AS start_date, end_date::text AS end_date, description
        FROM memberships
        WHERE cv_id = $1
        ORDER BY sort_order, created_at
        "#,
    )
    .bind(cv_id)
    .fetch_all(pool)
    .await?;

    let qualification_equivalences = sqlx::query_as::<_, QualificationEquivalence>(
        r#"
        SELECT id, qualification, equivalent_to, description
        FROM qualification_equivalences
        WHERE cv_id = $1
        ORDER BY sort_order, created_at
        "#,
    )
    .bind(cv_id)
    .fetch_all(pool)
    .await?;

    let interests = sqlx::query_as::<_, Interest>(
        r#"
        SELECT id, name, description
        FROM interests
        WHERE cv_id = $1
        ORDER BY sort_order, created_at
        "#,
    )
    .bind(cv_id)
    .fetch_all(pool)
    .await?;

    debug!(
        "Loaded CV {cv_id}: {} jobs, {} projects, {} skills, {} education, {} certifications",
        work_experiences.len(),
        projects.len(),
        skills.len(),
        education.len(),
        certifications.len()
    );

    Ok(Some(RawCvAggregate {
        profile,
        work_experiences,
        projects,
        skills,
        education,
        certifications,
        memberships,
        qualification_equivalences,
        interests,
    }))
}

/// Responsibility rows of one work experience, ordered by category then item.
pub async fn fetch_responsibilities(
    pool: &PgPool,
    work_experience_id: Uuid,
) -> Result<Vec<ResponsibilityRow>, sqlx::Error> {
    sqlx::query_as::<_, ResponsibilityRow>(
        r#"
        SELECT c.work_experience_id, c.id AS category_id, c.name AS category_name,
               i.content AS item
        FROM responsibility_categories c
        LEFT JOIN responsibility_items i ON i.category_id = c.id
        WHERE c.work_experience_id = $1
        ORDER BY c.sort_order, c.created_at, i.sort_order, i.created_at
        "#,
    )
    .bind(work_experience_id)
    .fetch_all(pool)
    .await
}

/// Same as `fetch_responsibilities`, for many work experiences in one query.
pub async fn fetch_responsibilities_batch(
    pool: &PgPool,
    work_experience_ids: &[Uuid],
) -> Result<Vec<ResponsibilityRow>, sqlx::Error> {
    sqlx::query_as::<_, ResponsibilityRow>(
        r#"
        SELECT c.work_experience_id, c.id AS category_id, c.name AS category_name,
               i.content AS item
        FROM responsibility_categories c
        LEFT JOIN responsibility_items i ON i.category_id = c.id
        WHERE c.work_experience_id = ANY($1)
        ORDER BY c.work_experience_id, c.sort_order, c.created_at, i.sort_order, i.created_at
        "#,
    )
    .bind(work_experience_ids)
    .fetch_all(pool)
    .await
}

pub async fn profile_exists(pool: &PgPool, profile_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM profiles WHERE id = $1)")
        .bind(profile_id)
        .fetch_one(pool)
        .await
}

/// Points the profile at a newly uploaded photo. Returns false if no row matched.
pub async fn update_profile_photo(
    pool: &PgPool,
    profile_id: Uuid,
    photo_url: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE profiles SET photo_url = $1, updated_at = NOW() WHERE id = $2")
        .bind(photo_url)
        .bind(profile_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
