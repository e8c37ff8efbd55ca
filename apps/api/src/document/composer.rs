//! Document Composer — runs the section assemblers in their fixed order and
//! wraps the result in page setup, footer and styles.
//!
//! Flow: profile check → photo embed → header → sections → description.
//! The only fatal condition is a missing profile; everything else degrades.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cv::normalize::normalize_aggregate;
use crate::document::blocks::{
    classic_style_sheet, Block, DocumentDescription, DocumentInfo, Footer, PageSetup, TextStyle,
};
use crate::document::photo::{embed_photo, FallbackReason, PhotoOutcome, PhotoSource};
use crate::document::responsibilities::ResponsibilityLoader;
use crate::document::sections::{
    assemble_certifications, assemble_education, assemble_interests, assemble_memberships,
    assemble_projects, assemble_qualification_equivalence, assemble_skills,
    assemble_work_experience, display,
};
use crate::document::DocumentError;
use crate::models::cv::{CvDocumentInput, Profile, RawCvAggregate};

const GENERIC_FILE_NAME: &str = "CV.pdf";
const UNTITLED_TITLE: &str = "Curriculum Vitae";

// ────────────────────────────────────────────────────────────────────────────
// Options
// ────────────────────────────────────────────────────────────────────────────

/// Which sections appear in the document. All on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectionToggles {
    pub profile: bool,
    pub work_experience: bool,
    pub projects: bool,
    pub skills: bool,
    pub education: bool,
    pub certifications: bool,
    pub memberships: bool,
    pub interests: bool,
    pub qualification_equivalence: bool,
}

impl Default for SectionToggles {
    fn default() -> Self {
        Self {
            profile: true,
            work_experience: true,
            projects: true,
            skills: true,
            education: true,
            certifications: true,
            memberships: true,
            interests: true,
            qualification_equivalence: true,
        }
    }
}

/// Layout template. Only the classic layout exists; the field is accepted so
/// clients can already send their choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Template {
    #[default]
    Classic,
}

impl Template {
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint.map(|h| h.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("classic") | Some("default") => Template::Classic,
            Some(other) => {
                debug!("Unknown template '{other}', using classic");
                Template::Classic
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportOptions {
    pub sections: SectionToggles,
    pub include_photo: bool,
    pub template: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            sections: SectionToggles::default(),
            include_photo: true,
            template: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Composition
// ────────────────────────────────────────────────────────────────────────────

/// Builds the complete document description for one CV.
///
/// Section order is fixed: profile header, work experience, projects, skills,
/// education, certifications, memberships, qualification equivalence,
/// interests.
pub async fn compose_document(
    input: &CvDocumentInput,
    options: &ExportOptions,
    responsibilities: &dyn ResponsibilityLoader,
    photos: &dyn PhotoSource,
) -> Result<DocumentDescription, DocumentError> {
    let profile = input.profile.as_ref().ok_or(DocumentError::MissingProfile)?;
    let toggles = &options.sections;
    let template = Template::from_hint(options.template.as_deref());
    debug!("Composing document with {template:?} template");

    let mut content = Vec::new();

    if toggles.profile {
        let photo = embed_photo(photos, profile.photo_url.as_deref(), options.include_photo).await;
        content.extend(profile_header(profile, photo));
    }

    content.extend(
        assemble_work_experience(&input.work_experiences, toggles.work_experience, responsibilities)
            .await,
    );
    content.extend(assemble_projects(&input.projects, toggles.projects));
    content.extend(assemble_skills(&input.skills, toggles.skills));
    content.extend(assemble_education(&input.education, toggles.education));
    content.extend(assemble_certifications(&input.certifications, toggles.certifications));
    content.extend(assemble_memberships(&input.memberships, toggles.memberships));
    content.extend(assemble_qualification_equivalence(
        &input.qualification_equivalences,
        toggles.qualification_equivalence,
    ));
    content.extend(assemble_interests(&input.interests, toggles.interests));

    let author = display(profile.full_name.as_ref());
    let title = match &author {
        Some(name) => format!("{name} - CV"),
        None => UNTITLED_TITLE.to_string(),
    };

    Ok(DocumentDescription {
        info: DocumentInfo { title, author },
        page: PageSetup::default(),
        footer: Footer::page_counter(),
        default_style: DocumentDescription::default_style(),
        styles: classic_style_sheet(),
        content,
    })
}

/// Name, contact line, LinkedIn and bio; placed beside the photo when one
/// was embedded.
fn profile_header(profile: &Profile, photo: PhotoOutcome) -> Vec<Block> {
    let mut text = Vec::new();

    if let Some(name) = display(profile.full_name.as_ref()) {
        text.push(Block::text(name, TextStyle::Name));
    }

    let contact: Vec<String> = [&profile.email, &profile.phone, &profile.address]
        .into_iter()
        .filter_map(|field| display(field.as_ref()))
        .collect();
    if !contact.is_empty() {
        text.push(Block::text(contact.join(" | "), TextStyle::Contact));
    }

    if let Some(linkedin) = display(profile.linkedin_url.as_ref()) {
        text.push(Block::text(linkedin, TextStyle::Link));
    }
    if let Some(bio) = display(profile.bio.as_ref()) {
        text.push(Block::text(bio, TextStyle::Body));
    }

    match photo {
        PhotoOutcome::Embedded(image) => vec![Block::Columns {
            columns: vec![vec![Block::Image(image)], text],
        }],
        PhotoOutcome::Fallback(FallbackReason::Failed(cause)) => {
            debug!("Text-only profile header, photo failed: {cause}");
            text
        }
        PhotoOutcome::Fallback(reason) => {
            debug!("Text-only profile header: {reason:?}");
            text
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generate & download
// ────────────────────────────────────────────────────────────────────────────

/// A composed document plus the file name the client saves it under.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub file_name: String,
    pub document: DocumentDescription,
}

/// Normalizes raw CV data once, composes it, and names the download after
/// the profile.
pub async fn generate_export(
    raw: RawCvAggregate,
    options: &ExportOptions,
    responsibilities: &dyn ResponsibilityLoader,
    photos: &dyn PhotoSource,
) -> Result<GeneratedDocument, DocumentError> {
    let input = normalize_aggregate(raw);
    let document = compose_document(&input, options, responsibilities, photos).await?;
    let file_name = download_file_name(input.profile.as_ref());

    info!(
        "Generated document '{}' with {} top-level blocks",
        file_name,
        document.content.len()
    );

    Ok(GeneratedDocument {
        file_name,
        document,
    })
}

/// `Jane_Doe_CV.pdf`, or `CV.pdf` when the profile has no usable name.
pub fn download_file_name(profile: Option<&Profile>) -> String {
    let name = profile
        .and_then(|p| display(p.full_name.as_ref()))
        .map(|name| {
            name.split_whitespace()
                .map(|word| {
                    word.chars()
                        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '\''))
                        .collect::<String>()
                })
                .filter(|word| !word.is_empty())
                .collect::<Vec<_>>()
                .join("_")
        })
        .filter(|name| !name.is_empty());

    match name {
        Some(name) => format!("{name}_CV.pdf"),
        None => GENERIC_FILE_NAME.to_string(),
    }
}
