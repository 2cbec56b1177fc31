//! Renders structured content into the `.tex` section files that the main
//! document (`cv-llt.tex`) `\input`s.
//!
//! Text fields are inserted as authored: `content.yaml` is written in LaTeX,
//! so achievements may carry `\tech{}`/`\metric{}` and must not be escaped.
//! Only project names are treated as identifiers and have `_` escaped.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::content::{ProjectKind, ResumeContent, SkillList};
use crate::latex::escape::escape_underscores;

const BANNER_RULE: &str = "%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%%";
const JOB_SPACING: &str = "\\vspace{0.5\\baselineskip}";
const ENTRY_SPACING: &str = "\\vspace{0.3\\baselineskip}";

/// The four generated section files, in the order they are written.
pub const SECTION_FILES: [&str; 4] = ["employment.tex", "education.tex", "projects.tex", "skills.tex"];

pub struct LatexGenerator<'a> {
    content: &'a ResumeContent,
    highlighted: HashSet<&'a str>,
}

impl<'a> LatexGenerator<'a> {
    pub fn new(content: &'a ResumeContent) -> Self {
        let highlighted = content.highlighted_skills.iter().map(String::as_str).collect();
        Self {
            content,
            highlighted,
        }
    }

    fn format_skill(&self, skill: &str) -> String {
        if self.highlighted.contains(skill) {
            format!("\\tech{{{skill}}}")
        } else {
            skill.to_string()
        }
    }

    pub fn render_employment(&self) -> String {
        let mut lines = open_rubric("PROFESSIONAL EXPERIENCE", "Professional Experience");

        for job in &self.content.employment {
            lines.push(format!(
                "\\entry*[\\role{{{}}}]{} | \\company{{{}}}",
                job.title, job.dates, job.company
            ));
            lines.push(String::new());

            if !job.summary.is_empty() {
                lines.push(format!("\\emph{{\\relsize{{-1}}{}}}", job.summary));
                lines.push(String::new());
                lines.push(String::new());
            }

            for achievement in &job.achievements {
                lines.push(format!("\\achievement{{{achievement}}}"));
                lines.push(String::new());
            }

            lines.push(JOB_SPACING.to_string());
            lines.push(String::new());
        }

        // No spacing after the last job.
        if lines.len() >= 2 && lines[lines.len() - 2] == JOB_SPACING {
            lines.truncate(lines.len() - 2);
        }

        close_rubric(lines)
    }

    pub fn render_education(&self) -> String {
        let mut lines = open_rubric("EDUCATION SECTION", "Education");

        for degree in &self.content.education {
            lines.push(format!(
                "\\entry*[\\textbf{{{}}}]{} | {{\\small {}}}",
                degree.degree, degree.dates, degree.details
            ));
            lines.push(String::new());

            for achievement in &degree.achievements {
                lines.push(format!("    \\achievement{{{achievement}}}"));
                lines.push(String::new());
            }

            lines.push(ENTRY_SPACING.to_string());
        }

        close_rubric(lines)
    }

    pub fn render_projects(&self) -> String {
        let mut lines = open_rubric("PROJECTS & HOME LAB", "Curated Projects");

        for project in &self.content.projects {
            let name = escape_underscores(&project.name);
            match project.kind {
                ProjectKind::Homelab => lines.push(format!(
                    "\\achievement{{\\textbf{{{name}}} -- {}}}",
                    project.description
                )),
                ProjectKind::Github => lines.push(format!(
                    "\\githubproject{{{name}}}{{{}}}{{{}}}",
                    project.description, project.url
                )),
                ProjectKind::Other => {}
            }
            lines.push(String::new());
        }

        close_rubric(lines)
    }

    pub fn render_skills(&self) -> String {
        let mut lines = open_rubric("SKILLS SECTION", "Curated Skills");

        for (category, skills) in self.content.skills.iter() {
            lines.push(format!("\\entry*[\\textbf{{{category}}}]"));
            match skills {
                SkillList::List(items) => {
                    let formatted: Vec<String> =
                        items.iter().map(|s| self.format_skill(s)).collect();
                    lines.push(formatted.join(", "));
                }
                SkillList::Text(text) => lines.push(text.clone()),
            }
            lines.push(String::new());
            lines.push(ENTRY_SPACING.to_string());
        }

        close_rubric(lines)
    }

    /// Renders every section, paired with its file name.
    pub fn render_all(&self) -> Vec<(&'static str, String)> {
        vec![
            (SECTION_FILES[0], self.render_employment()),
            (SECTION_FILES[1], self.render_education()),
            (SECTION_FILES[2], self.render_projects()),
            (SECTION_FILES[3], self.render_skills()),
        ]
    }

    /// Writes all section files into `dir`, returning the written paths.
    pub fn write_all(&self, dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(SECTION_FILES.len());
        for (file, source) in self.render_all() {
            let path = dir.join(file);
            std::fs::write(&path, source)?;
            info!("Generated {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

fn open_rubric(banner: &str, heading: &str) -> Vec<String> {
    vec![
        BANNER_RULE.to_string(),
        format!("% {banner}"),
        BANNER_RULE.to_string(),
        String::new(),
        format!("\\begin{{rubric}}{{{heading}}}"),
        String::new(),
    ]
}

fn close_rubric(mut lines: Vec<String>) -> String {
    lines.push("\\end{rubric}".to_string());
    lines.join("\n")
}
