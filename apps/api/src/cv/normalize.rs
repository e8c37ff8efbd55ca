//! Input boundary: maps stored/posted CV data onto the canonical records the
//! assemblers read. Runs once per generation, before composing.

use crate::models::cv::{Certification, CvDocumentInput, RawCertification, RawCvAggregate};

/// Resolves the certification field aliases.
///
/// When both spellings are filled the canonical one wins (`date_issued` over
/// `date_obtained`, `issuer` over `issuing_organization`, `expiry_date` over
/// `date_expires`, `url` over `credential_url`). Blank values count as absent.
pub fn normalize_certification(raw: RawCertification) -> Certification {
    Certification {
        id: raw.id,
        name: raw.name,
        issuer: first_present(raw.issuer, raw.issuing_organization),
        issued: first_present(raw.date_issued, raw.date_obtained),
        expiry: first_present(raw.expiry_date, raw.date_expires),
        url: first_present(raw.url, raw.credential_url),
        description: raw.description,
    }
}

pub fn normalize_aggregate(raw: RawCvAggregate) -> CvDocumentInput {
    CvDocumentInput {
        profile: raw.profile,
        work_experiences: raw.work_experiences,
        projects: raw.projects,
        skills: raw.skills,
        education: raw.education,
        certifications: raw
            .certifications
            .into_iter()
            .map(normalize_certification)
            .collect(),
        memberships: raw.memberships,
        qualification_equivalences: raw.qualification_equivalences,
        interests: raw.interests,
    }
}

fn first_present(canonical: Option<String>, alias: Option<String>) -> Option<String> {
    let present = |v: &String| !v.trim().is_empty();
    canonical.filter(present).or_else(|| alias.filter(present))
}
