//! Extracts structured content back out of hand-edited `.tex` section files.
//!
//! This is the inverse of `generator` for documents that were edited in the
//! web editor rather than regenerated from YAML. Extraction is regex-based and
//! tolerant: unrecognized lines are skipped, never rejected.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::content::{ContentError, Degree, Job, Project, ProjectKind, ResumeContent, SkillList, SkillTable};
use crate::latex::escape::clean_latex;

struct Patterns {
    job_header: Regex,
    achievement: Regex,
    job_summary: Regex,
    degree: Regex,
    skill_header: Regex,
    github_project: Regex,
    homelab_project: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static regex");
        Patterns {
            job_header: re(r"\\entry\*\[\\role\{([^}]+)\}\]([^|]+)\|\s*\\company\{([^}]+)\}"),
            // One level of nested braces, e.g. \achievement{Cut \metric{40\%} of toil}.
            achievement: re(r"\\achievement\{((?:[^{}]|\{[^{}]*\})*)\}"),
            job_summary: re(r"\\emph\{\\relsize\{-?\d+\}((?:[^{}]|\{[^{}]*\})*)\}"),
            degree: re(r"\\entry\*\[\\textbf\{([^}]+)\}\]([^|\n]+)\|([^\n]+)"),
            skill_header: re(r"\\entry\*\[\\textbf\{([^}]+)\}\]"),
            github_project: re(r"\\githubproject\{([^}]+)\}\{([^}]+)\}\{([^}]+)\}"),
            homelab_project: re(
                r"\\achievement\{\\textbf\{([^}]+)\}\s*--\s*((?:[^{}]|\{[^{}]*\})*)\}",
            ),
        }
    })
}

/// Parses the body of `employment.tex`.
///
/// A job's body runs from its header to the next `\entry*` or the closing
/// `\end{rubric}`, whichever comes first.
pub fn parse_employment(tex: &str) -> Vec<Job> {
    let p = patterns();
    let headers: Vec<_> = p.job_header.captures_iter(tex).collect();
    let mut jobs = Vec::with_capacity(headers.len());

    for caps in headers {
        let header_end = caps.get(0).map_or(0, |m| m.end());
        let rest = &tex[header_end..];
        let body_len = [rest.find("\\entry*"), rest.find("\\end{rubric}")]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(rest.len());
        let body = &rest[..body_len];

        let summary = p
            .job_summary
            .captures(body)
            .map(|c| clean_latex(&c[1]))
            .unwrap_or_default();
        let achievements = p
            .achievement
            .captures_iter(body)
            .map(|c| clean_latex(&c[1]))
            .filter(|a| !a.is_empty())
            .collect();

        jobs.push(Job {
            title: clean_latex(&caps[1]),
            dates: caps[2].trim().to_string(),
            company: clean_latex(&caps[3]),
            summary,
            achievements,
        });
    }
    jobs
}

/// Parses the body of `education.tex`. Details are everything after the `|`
/// on the entry line.
pub fn parse_education(tex: &str) -> Vec<Degree> {
    patterns()
        .degree
        .captures_iter(tex)
        .map(|caps| Degree {
            degree: clean_latex(&caps[1]),
            dates: caps[2].trim().to_string(),
            details: clean_latex(&caps[3]),
            achievements: Vec::new(),
        })
        .collect()
}

/// Parses the body of `skills.tex`.
///
/// A category's skills are the non-blank lines following its header, up to a
/// blank line or the next `\entry*`, `\vspace` or `\end`.
pub fn parse_skills(tex: &str) -> SkillTable {
    let mut table = SkillTable::default();

    for caps in patterns().skill_header.captures_iter(tex) {
        let header_end = caps.get(0).map_or(0, |m| m.end());
        let rest = tex[header_end..].trim_start();

        let mut collected = Vec::new();
        for line in rest.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty()
                || trimmed.starts_with("\\entry*")
                || trimmed.starts_with("\\vspace")
                || trimmed.starts_with("\\end")
            {
                break;
            }
            collected.push(trimmed);
        }
        if collected.is_empty() {
            continue;
        }

        table.push(
            clean_latex(&caps[1]),
            SkillList::Text(clean_latex(&collected.join(" "))),
        );
    }
    table
}

/// Parses the body of `projects.tex`: `\githubproject` entries and
/// `\achievement{\textbf{name} -- description}` home-lab entries.
pub fn parse_projects(tex: &str) -> Vec<Project> {
    let p = patterns();
    let mut found: Vec<(usize, Project)> = Vec::new();

    for caps in p.github_project.captures_iter(tex) {
        found.push((
            caps.get(0).map_or(0, |m| m.start()),
            Project {
                name: clean_latex(&caps[1]),
                description: clean_latex(&caps[2]),
                url: caps[3].trim().to_string(),
                kind: ProjectKind::Github,
            },
        ));
    }
    for caps in p.homelab_project.captures_iter(tex) {
        found.push((
            caps.get(0).map_or(0, |m| m.start()),
            Project {
                name: clean_latex(&caps[1]),
                description: clean_latex(&caps[2]),
                url: String::new(),
                kind: ProjectKind::Homelab,
            },
        ));
    }

    // Keep document order across both entry styles.
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, project)| project).collect()
}

/// Reads a project's four section files into structured content.
///
/// Contact details and summary live in the main document, not the section
/// files, so they are left empty. A missing section file yields an empty
/// section.
pub fn parse_project_dir(dir: &Path) -> Result<ResumeContent, ContentError> {
    Ok(ResumeContent {
        employment: parse_employment(&read_section(dir, "employment.tex")?),
        education: parse_education(&read_section(dir, "education.tex")?),
        projects: parse_projects(&read_section(dir, "projects.tex")?),
        skills: parse_skills(&read_section(dir, "skills.tex")?),
        ..Default::default()
    })
}

fn read_section(dir: &Path, file: &str) -> Result<String, ContentError> {
    let path = dir.join(file);
    match std::fs::read_to_string(&path) {
        Ok(tex) => Ok(tex),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Section file {} not found; treating as empty", path.display());
            Ok(String::new())
        }
        Err(source) => Err(ContentError::Read { path, source }),
    }
}
