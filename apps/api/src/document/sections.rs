//! Section Assemblers — one per CV section.
//!
//! Shared contract:
//! - disabled or empty input → no blocks at all (not even the heading)
//! - otherwise one heading, then one `Block::Entry` per renderable record,
//!   in input order
//! - a record without its primary field is skipped with a warning; the rest
//!   of the section is unaffected
//!
//! Skills are grouped by category, one entry per category.

use tracing::warn;
use uuid::Uuid;

use crate::document::blocks::{Block, TextStyle};
use crate::document::format::{decode_entities, format_date, format_date_range};
use crate::document::responsibilities::ResponsibilityLoader;
use crate::models::cv::{
    Certification, Education, Interest, Membership, Project, QualificationEquivalence,
    ResponsibilityCategory, Skill, WorkExperience,
};

pub const WORK_EXPERIENCE_TITLE: &str = "Work Experience";
pub const PROJECTS_TITLE: &str = "Projects";
pub const SKILLS_TITLE: &str = "Skills";
pub const EDUCATION_TITLE: &str = "Education";
pub const CERTIFICATIONS_TITLE: &str = "Certifications";
pub const MEMBERSHIPS_TITLE: &str = "Memberships";
pub const QUALIFICATION_EQUIVALENCE_TITLE: &str = "Qualification Equivalence";
pub const INTERESTS_TITLE: &str = "Interests";

/// Bucket for skills without a category.
pub const DEFAULT_SKILL_CATEGORY: &str = "Other";

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Trimmed, entity-decoded text, or `None` when blank.
pub(crate) fn display(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(decode_entities)
}

/// Blocks of a single record, built top to bottom.
struct EntryBuilder {
    blocks: Vec<Block>,
}

impl EntryBuilder {
    /// Primary line with an optional right-aligned date range.
    fn new(primary: String, dates: Option<String>) -> Self {
        Self {
            blocks: vec![Block::Row {
                left: primary,
                right: dates,
                left_style: TextStyle::EntryTitle,
                right_style: TextStyle::DateRange,
            }],
        }
    }

    fn line(mut self, text: Option<String>, style: TextStyle) -> Self {
        if let Some(text) = text {
            self.blocks.push(Block::text(text, style));
        }
        self
    }

    fn subtitle(self, text: Option<String>) -> Self {
        self.line(text, TextStyle::EntrySubtitle)
    }

    fn link(self, url: Option<String>) -> Self {
        self.line(url, TextStyle::Link)
    }

    fn paragraph(self, text: Option<String>) -> Self {
        self.line(text, TextStyle::Body)
    }

    fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    fn build(self) -> Block {
        Block::Entry {
            blocks: self.blocks,
        }
    }
}

/// Heading followed by one entry per record that `render` accepts.
fn section<T>(
    title: &str,
    records: &[T],
    enabled: bool,
    render: impl Fn(&T) -> Option<Block>,
) -> Vec<Block> {
    if !enabled || records.is_empty() {
        return Vec::new();
    }
    let mut blocks = Vec::with_capacity(records.len() + 1);
    blocks.push(Block::heading(title));
    blocks.extend(records.iter().filter_map(render));
    blocks
}

fn skip(section: &str, id: Uuid, field: &str) -> Option<Block> {
    warn!("Skipping {section} record {id}: missing {field}");
    None
}

fn dates(start: Option<&String>, end: Option<&String>) -> Option<String> {
    format_date_range(start.map(String::as_str), end.map(String::as_str))
}

// ────────────────────────────────────────────────────────────────────────────
// Work experience
// ────────────────────────────────────────────────────────────────────────────

/// Work experience entries with their responsibilities folded in.
///
/// Responsibilities are loaded one entry at a time, in input order. A failed
/// load only costs that entry its bullets.
pub async fn assemble_work_experience(
    records: &[WorkExperience],
    enabled: bool,
    loader: &dyn ResponsibilityLoader,
) -> Vec<Block> {
    if !enabled || records.is_empty() {
        return Vec::new();
    }

    let mut blocks = vec![Block::heading(WORK_EXPERIENCE_TITLE)];
    for job in records {
        let Some(position) = display(job.position.as_ref()) else {
            skip("work experience", job.id, "position");
            continue;
        };

        let date_line = dates(job.start_date.as_ref(), job.end_date.as_ref());
        let mut entry = EntryBuilder::new(position, date_line)
            .subtitle(display(job.company_name.as_ref()))
            .paragraph(display(job.description.as_ref()));

        for block in responsibility_blocks(&load_responsibilities(loader, job.id).await) {
            entry.push(block);
        }
        blocks.push(entry.build());
    }
    blocks
}

async fn load_responsibilities(
    loader: &dyn ResponsibilityLoader,
    work_experience_id: Uuid,
) -> Vec<ResponsibilityCategory> {
    if work_experience_id.is_nil() {
        return Vec::new();
    }
    match loader.load(work_experience_id).await {
        Ok(categories) => categories,
        Err(e) => {
            warn!("Failed to load responsibilities for work experience {work_experience_id}: {e}");
            Vec::new()
        }
    }
}

fn responsibility_blocks(categories: &[ResponsibilityCategory]) -> Vec<Block> {
    let mut blocks = Vec::new();
    for category in categories {
        let items: Vec<String> = category
            .items
            .iter()
            .filter_map(|item| display(Some(item)))
            .collect();
        if items.is_empty() {
            continue;
        }
        if let Some(name) = display(Some(&category.name)) {
            blocks.push(Block::text(name, TextStyle::CategoryLabel));
        }
        blocks.push(Block::Bullets {
            items,
            style: TextStyle::Body,
        });
    }
    blocks
}

// ────────────────────────────────────────────────────────────────────────────
// Remaining sections
// ────────────────────────────────────────────────────────────────────────────

pub fn assemble_projects(records: &[Project], enabled: bool) -> Vec<Block> {
    section(PROJECTS_TITLE, records, enabled, |project| {
        let Some(title) = display(project.title.as_ref()) else {
            return skip("project", project.id, "title");
        };
        Some(
            EntryBuilder::new(title, dates(project.start_date.as_ref(), project.end_date.as_ref()))
                .paragraph(display(project.description.as_ref()))
                .link(display(project.url.as_ref()))
                .build(),
        )
    })
}

/// Skills grouped by category, categories in order of first appearance.
/// Each category is one entry: the label, then a comma-separated line.
pub fn assemble_skills(records: &[Skill], enabled: bool) -> Vec<Block> {
    if !enabled || records.is_empty() {
        return Vec::new();
    }

    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for skill in records {
        let Some(name) = display(skill.name.as_ref()) else {
            skip("skill", skill.id, "name");
            continue;
        };
        let label = match display(skill.level.as_ref()) {
            Some(level) => format!("{name} ({level})"),
            None => name,
        };
        let category =
            display(skill.category.as_ref()).unwrap_or_else(|| DEFAULT_SKILL_CATEGORY.to_string());

        match groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, names)) => names.push(label),
            None => groups.push((category, vec![label])),
        }
    }

    let mut blocks = vec![Block::heading(SKILLS_TITLE)];
    blocks.extend(groups.into_iter().map(|(category, names)| Block::Entry {
        blocks: vec![
            Block::text(category, TextStyle::CategoryLabel),
            Block::text(names.join(", "), TextStyle::Body),
        ],
    }));
    blocks
}

/// Degree is the main line and institution the subtitle. A record with only
/// an institution promotes it to the main line; one with neither is skipped.
pub fn assemble_education(records: &[Education], enabled: bool) -> Vec<Block> {
    section(EDUCATION_TITLE, records, enabled, |education| {
        let degree = display(education.degree.as_ref());
        let institution = display(education.institution.as_ref());
        let (primary, subtitle) = match (degree, institution) {
            (Some(degree), institution) => (degree, institution),
            (None, Some(institution)) => (institution, None),
            (None, None) => return skip("education", education.id, "degree and institution"),
        };
        Some(
            EntryBuilder::new(
                primary,
                dates(education.start_date.as_ref(), education.end_date.as_ref()),
            )
            .subtitle(subtitle)
            .paragraph(display(education.description.as_ref()))
            .build(),
        )
    })
}

/// Certifications show the issue date, extended to `issued - expiry` when the
/// certification expires. A missing expiry is not "Present".
pub fn assemble_certifications(records: &[Certification], enabled: bool) -> Vec<Block> {
    section(CERTIFICATIONS_TITLE, records, enabled, |cert| {
        let Some(name) = display(cert.name.as_ref()) else {
            return skip("certification", cert.id, "name");
        };
        let issued = display(cert.issued.as_ref()).map(|d| format_date(Some(d.as_str())));
        let expiry = display(cert.expiry.as_ref()).map(|d| format_date(Some(d.as_str())));
        let date_line = match (issued, expiry) {
            (Some(issued), Some(expiry)) => Some(format!("{issued} - {expiry}")),
            (Some(issued), None) => Some(issued),
            (None, Some(expiry)) => Some(format!("Expires {expiry}")),
            (None, None) => None,
        };
        Some(
            EntryBuilder::new(name, date_line)
                .subtitle(display(cert.issuer.as_ref()))
                .link(display(cert.url.as_ref()))
                .paragraph(display(cert.description.as_ref()))
                .build(),
        )
    })
}

pub fn assemble_memberships(records: &[Membership], enabled: bool) -> Vec<Block> {
    section(MEMBERSHIPS_TITLE, records, enabled, |membership| {
        let Some(organisation) = display(membership.organisation.as_ref()) else {
            return skip("membership", membership.id, "organisation");
        };
        Some(
            EntryBuilder::new(
                organisation,
                dates(membership.start_date.as_ref(), membership.end_date.as_ref()),
            )
            .subtitle(display(membership.role.as_ref()))
            .paragraph(display(membership.description.as_ref()))
            .build(),
        )
    })
}

pub fn assemble_qualification_equivalence(
    records: &[QualificationEquivalence],
    enabled: bool,
) -> Vec<Block> {
    section(QUALIFICATION_EQUIVALENCE_TITLE, records, enabled, |qe| {
        let Some(qualification) = display(qe.qualification.as_ref()) else {
            return skip("qualification equivalence", qe.id, "qualification");
        };
        Some(
            EntryBuilder::new(qualification, None)
                .subtitle(display(qe.equivalent_to.as_ref()).map(|e| format!("Equivalent to: {e}")))
                .paragraph(display(qe.description.as_ref()))
                .build(),
        )
    })
}

pub fn assemble_interests(records: &[Interest], enabled: bool) -> Vec<Block> {
    section(INTERESTS_TITLE, records, enabled, |interest| {
        let Some(name) = display(interest.name.as_ref()) else {
            return skip("interest", interest.id, "name");
        };
        Some(
            EntryBuilder::new(name, None)
                .paragraph(display(interest.description.as_ref()))
                .build(),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::document::responsibilities::tests::FlakyLoader;
    use crate::document::responsibilities::PrefetchedResponsibilities;

    fn some(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn headings(blocks: &[Block]) -> usize {
        blocks.iter().filter(|b| b.is_heading()).count()
    }

    fn entries(blocks: &[Block]) -> Vec<&Block> {
        blocks.iter().filter(|b| b.is_entry()).collect()
    }

    fn job(position: &str, company: &str, start: &str, end: Option<&str>) -> WorkExperience {
        WorkExperience {
            id: Uuid::new_v4(),
            position: some(position),
            company_name: some(company),
            start_date: some(start),
            end_date: end.map(str::to_string),
            description: None,
        }
    }

    fn skill(name: Option<&str>, category: Option<&str>) -> Skill {
        Skill {
            id: Uuid::new_v4(),
            name: name.map(str::to_string),
            level: None,
            category: category.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_work_experience_entry_has_open_ended_dates() {
        let loader = PrefetchedResponsibilities::default();
        let blocks = assemble_work_experience(
            &[job("Engineer", "Acme", "2020-01-01", None)],
            true,
            &loader,
        )
        .await;

        assert_eq!(headings(&blocks), 1);
        assert_eq!(entries(&blocks).len(), 1);
        match &blocks[1] {
            Block::Entry { blocks } => {
                assert_eq!(
                    blocks[0],
                    Block::Row {
                        left: "Engineer".into(),
                        right: some("01/2020 - Present"),
                        left_style: TextStyle::EntryTitle,
                        right_style: TextStyle::DateRange,
                    }
                );
                assert_eq!(blocks[1], Block::text("Acme", TextStyle::EntrySubtitle));
            }
            other => panic!("expected entry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_work_experience_disabled_is_empty() {
        let loader = PrefetchedResponsibilities::default();
        let blocks = assemble_work_experience(
            &[job("Engineer", "Acme", "2020-01-01", None)],
            false,
            &loader,
        )
        .await;
        assert!(blocks.is_empty());
    }

    #[tokio::test]
    async fn test_responsibility_failure_degrades_per_entry() {
        let (first, second) = (
            job("Engineer", "Acme", "2018-01-01", Some("2019-12-31")),
            job("Lead", "Initech", "2020-01-01", None),
        );
        let loader = FlakyLoader {
            data: HashMap::from([(
                second.id,
                vec![ResponsibilityCategory {
                    name: "Leadership".into(),
                    items: vec!["Hired &amp; onboarded 6 engineers".into()],
                }],
            )]),
            failing: vec![first.id],
            calls: Mutex::new(Vec::new()),
        };

        let blocks =
            assemble_work_experience(&[first.clone(), second.clone()], true, &loader).await;

        assert_eq!(entries(&blocks).len(), 2);
        assert_eq!(*loader.calls.lock().unwrap(), vec![first.id, second.id]);

        let Block::Entry { blocks: lead } = &blocks[2] else {
            panic!("expected entry");
        };
        assert!(lead.contains(&Block::text("Leadership", TextStyle::CategoryLabel)));
        assert!(lead.contains(&Block::Bullets {
            items: vec!["Hired & onboarded 6 engineers".into()],
            style: TextStyle::Body,
        }));

        let Block::Entry { blocks: engineer } = &blocks[1] else {
            panic!("expected entry");
        };
        assert!(!engineer.iter().any(|b| matches!(b, Block::Bullets { .. })));
    }

    #[tokio::test]
    async fn test_work_experience_without_position_is_skipped_and_not_loaded() {
        let mut nameless = job("x", "Acme", "2020-01-01", None);
        nameless.position = None;
        let kept = job("Engineer", "Acme", "2021-01-01", None);
        let loader = FlakyLoader {
            data: HashMap::new(),
            failing: vec![],
            calls: Mutex::new(Vec::new()),
        };

        let blocks = assemble_work_experience(&[nameless, kept.clone()], true, &loader).await;
        assert_eq!(entries(&blocks).len(), 1);
        assert_eq!(*loader.calls.lock().unwrap(), vec![kept.id]);
    }

    #[test]
    fn test_skills_grouped_into_one_line() {
        let blocks = assemble_skills(
            &[
                skill(Some("Go"), Some("Languages")),
                skill(Some("SQL"), Some("Languages")),
            ],
            true,
        );
        assert_eq!(
            blocks,
            vec![
                Block::heading("Skills"),
                Block::Entry {
                    blocks: vec![
                        Block::text("Languages", TextStyle::CategoryLabel),
                        Block::text("Go, SQL", TextStyle::Body),
                    ],
                },
            ]
        );
    }

    #[test]
    fn test_skills_default_category_and_first_seen_order() {
        let blocks = assemble_skills(
            &[
                skill(Some("Docker"), None),
                skill(Some("Rust"), Some("Languages")),
                skill(Some("Kubernetes"), Some("  ")),
                skill(None, Some("Languages")),
            ],
            true,
        );
        let texts: Vec<&str> = blocks.iter().flat_map(Block::texts).collect();
        assert_eq!(
            texts,
            vec!["Skills", "Other", "Docker, Kubernetes", "Languages", "Rust"]
        );
    }

    #[test]
    fn test_skill_level_is_shown_in_parentheses() {
        let mut rust = skill(Some("Rust"), Some("Languages"));
        rust.level = some("Expert");
        let texts: Vec<String> = assemble_skills(&[rust], true)
            .iter()
            .flat_map(Block::texts)
            .map(str::to_string)
            .collect();
        assert!(texts.contains(&"Rust (Expert)".to_string()));
    }

    #[test]
    fn test_certification_without_name_is_skipped() {
        let blocks = assemble_certifications(
            &[Certification {
                issuer: some("AWS"),
                issued: some("2022-03-01"),
                ..Default::default()
            }],
            true,
        );
        assert_eq!(headings(&blocks), 1);
        assert!(entries(&blocks).is_empty());
    }

    #[test]
    fn test_certification_skip_preserves_order_of_the_rest() {
        let cert = |name: Option<&str>| Certification {
            id: Uuid::new_v4(),
            name: name.map(str::to_string),
            ..Default::default()
        };
        let blocks = assemble_certifications(
            &[cert(Some("CKA")), cert(None), cert(Some("CISSP"))],
            true,
        );
        let titles: Vec<&str> = entries(&blocks)
            .into_iter()
            .map(|b| b.texts()[0])
            .collect();
        assert_eq!(titles, vec!["CKA", "CISSP"]);
    }

    #[test]
    fn test_certification_dates_do_not_say_present() {
        let blocks = assemble_certifications(
            &[
                Certification {
                    name: some("CKA"),
                    issued: some("2022-03-01"),
                    ..Default::default()
                },
                Certification {
                    name: some("PMP"),
                    issued: some("2019-05-10"),
                    expiry: some("2025-05-10"),
                    ..Default::default()
                },
            ],
            true,
        );
        let texts: Vec<&str> = blocks.iter().flat_map(Block::texts).collect();
        assert!(texts.contains(&"03/2022"));
        assert!(texts.contains(&"05/2019 - 05/2025"));
        assert!(!texts.contains(&"Present"));
    }

    #[test]
    fn test_disabled_sections_are_empty_regardless_of_content() {
        let project = Project {
            title: some("Compiler"),
            ..Default::default()
        };
        assert!(assemble_projects(&[project], false).is_empty());
        assert!(assemble_skills(&[skill(Some("Go"), None)], false).is_empty());
        assert!(assemble_education(
            &[Education {
                institution: some("MIT"),
                ..Default::default()
            }],
            false
        )
        .is_empty());
        assert!(assemble_memberships(
            &[Membership {
                organisation: some("IEEE"),
                ..Default::default()
            }],
            false
        )
        .is_empty());
        assert!(assemble_interests(
            &[Interest {
                name: some("Chess"),
                ..Default::default()
            }],
            false
        )
        .is_empty());
    }

    #[test]
    fn test_disabled_certifications_and_equivalences_are_empty() {
        let certs = [Certification {
            name: some("CKA"),
            issued: some("2022-03-01"),
            ..Default::default()
        }];
        assert!(assemble_certifications(&certs, false).is_empty());

        let equivalences = [QualificationEquivalence {
            qualification: some("Licence"),
            equivalent_to: some("Bachelor's degree"),
            ..Default::default()
        }];
        assert!(assemble_qualification_equivalence(&equivalences, false).is_empty());
    }

    #[test]
    fn test_nameless_skills_disabled_or_enabled() {
        let nameless = [skill(None, Some("Languages")), skill(Some("  "), None)];
        assert!(assemble_skills(&nameless, false).is_empty());
        assert_eq!(assemble_skills(&nameless, true), vec![Block::heading("Skills")]);
    }

    #[test]
    fn test_empty_sections_have_no_heading() {
        assert!(assemble_projects(&[], true).is_empty());
        assert!(assemble_certifications(&[], true).is_empty());
        assert!(assemble_qualification_equivalence(&[], true).is_empty());
    }

    #[test]
    fn test_one_entry_per_record_in_input_order() {
        let education = [("BSc Physics", "Oxford"), ("MSc Robotics", "ETH Zürich"), ("PhD", "MIT")]
            .map(|(degree, institution)| Education {
                id: Uuid::new_v4(),
                institution: some(institution),
                degree: some(degree),
                start_date: some("2010-09-01"),
                end_date: some("2012-06-30"),
                description: None,
            });
        let blocks = assemble_education(&education, true);
        assert_eq!(headings(&blocks), 1);
        let titles: Vec<&str> = entries(&blocks)
            .into_iter()
            .map(|b| b.texts()[0])
            .collect();
        assert_eq!(titles, vec!["BSc Physics", "MSc Robotics", "PhD"]);
    }

    #[test]
    fn test_education_degree_leads_and_institution_follows() {
        let blocks = assemble_education(
            &[Education {
                degree: some("MSc Computer Science"),
                institution: some("University of Edinburgh"),
                start_date: some("2014-09-01"),
                end_date: some("2015-08-31"),
                ..Default::default()
            }],
            true,
        );
        let Block::Entry { blocks: entry } = &blocks[1] else {
            panic!("expected entry");
        };
        assert_eq!(
            entry[0],
            Block::Row {
                left: "MSc Computer Science".into(),
                right: some("09/2014 - 08/2015"),
                left_style: TextStyle::EntryTitle,
                right_style: TextStyle::DateRange,
            }
        );
        assert_eq!(
            entry[1],
            Block::text("University of Edinburgh", TextStyle::EntrySubtitle)
        );
    }

    #[test]
    fn test_education_without_degree_uses_institution() {
        let blocks = assemble_education(
            &[
                Education {
                    institution: some("Lycée Henri-IV"),
                    ..Default::default()
                },
                Education::default(),
            ],
            true,
        );
        let entries = entries(&blocks);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].texts(), vec!["Lycée Henri-IV"]);
    }

    #[test]
    fn test_text_is_entity_decoded() {
        let blocks = assemble_projects(
            &[Project {
                title: some("Tom &amp; Jerry"),
                description: some("&lt;3 &quot;fun&quot;"),
                ..Default::default()
            }],
            true,
        );
        let texts: Vec<&str> = blocks.iter().flat_map(Block::texts).collect();
        assert!(texts.contains(&"Tom & Jerry"));
        assert!(texts.contains(&"<3 \"fun\""));
    }

    #[test]
    fn test_qualification_equivalence_subtitle() {
        let blocks = assemble_qualification_equivalence(
            &[QualificationEquivalence {
                qualification: some("Licence en Informatique"),
                equivalent_to: some("UK Bachelor's degree"),
                ..Default::default()
            }],
            true,
        );
        let texts: Vec<&str> = blocks.iter().flat_map(Block::texts).collect();
        assert_eq!(
            texts,
            vec![
                "Qualification Equivalence",
                "Licence en Informatique",
                "Equivalent to: UK Bachelor's degree"
            ]
        );
    }

    #[test]
    fn test_membership_role_and_dates() {
        let blocks = assemble_memberships(
            &[Membership {
                organisation: some("British Computer Society"),
                role: some("Member"),
                start_date: some("2015-02-01"),
                ..Default::default()
            }],
            true,
        );
        let texts: Vec<&str> = blocks.iter().flat_map(Block::texts).collect();
        assert_eq!(
            texts,
            vec![
                "Memberships",
                "British Computer Society",
                "02/2015 - Present",
                "Member"
            ]
        );
    }
}
