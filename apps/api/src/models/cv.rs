//! CV section records as stored by the editor and consumed by document assembly.
//!
//! Dates are kept as the strings the editor stored (`YYYY-MM-DD` mostly);
//! `document::format` is the only place that interprets them.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub photo_url: Option<String>,
    pub bio: Option<String>,
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct WorkExperience {
    pub id: Uuid,
    pub company_name: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<String>,
    /// `None` means the position is current.
    pub end_date: Option<String>,
    pub description: Option<String>,
}

/// A named group of responsibility bullets attached to one work experience.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponsibilityCategory {
    pub name: String,
    pub items: Vec<String>,
}

/// Flat join row: one responsibility item with its category.
#[derive(Debug, Clone, FromRow)]
pub struct ResponsibilityRow {
    pub work_experience_id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub item: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Project {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Skill {
    pub id: Uuid,
    pub name: Option<String>,
    pub level: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Education {
    pub id: Uuid,
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

/// Certification as stored. Older rows and forms use different names for the
/// same fields; see `cv::normalize::normalize_certification`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct RawCertification {
    pub id: Uuid,
    pub name: Option<String>,
    pub issuer: Option<String>,
    pub issuing_organization: Option<String>,
    pub date_issued: Option<String>,
    pub date_obtained: Option<String>,
    pub expiry_date: Option<String>,
    pub date_expires: Option<String>,
    pub url: Option<String>,
    pub credential_url: Option<String>,
    pub description: Option<String>,
}

/// Canonical certification consumed by the assembler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub id: Uuid,
    pub name: Option<String>,
    pub issuer: Option<String>,
    pub issued: Option<String>,
    pub expiry: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Membership {
    pub id: Uuid,
    pub organisation: Option<String>,
    pub role: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct QualificationEquivalence {
    pub id: Uuid,
    pub qualification: Option<String>,
    pub equivalent_to: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Interest {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Everything one CV holds, as loaded from storage or posted by the editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCvAggregate {
    pub profile: Option<Profile>,
    pub work_experiences: Vec<WorkExperience>,
    pub projects: Vec<Project>,
    pub skills: Vec<Skill>,
    pub education: Vec<Education>,
    pub certifications: Vec<RawCertification>,
    pub memberships: Vec<Membership>,
    pub qualification_equivalences: Vec<QualificationEquivalence>,
    pub interests: Vec<Interest>,
}

/// Normalized aggregate handed to the document composer.
#[derive(Debug, Clone, Default)]
pub struct CvDocumentInput {
    pub profile: Option<Profile>,
    pub work_experiences: Vec<WorkExperience>,
    pub projects: Vec<Project>,
    pub skills: Vec<Skill>,
    pub education: Vec<Education>,
    pub certifications: Vec<Certification>,
    pub memberships: Vec<Membership>,
    pub qualification_equivalences: Vec<QualificationEquivalence>,
    pub interests: Vec<Interest>,
}
