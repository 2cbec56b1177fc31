//! Document model for Word output.
//!
//! `build_blocks` decides *what* goes into the document for a given style;
//! `writer` only decides how each block looks in OOXML. Keeping the two apart
//! lets the section logic be tested without unpacking a `.docx` archive.

use serde::{Deserialize, Serialize};

use crate::content::{Contact, ResumeContent};

/// Accent color used for rules and project links in the formatted style.
pub const MARKER_COLOR: &str = "7A1D0A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStyle {
    /// Styled résumé: rules between sections, skills table, accent colors.
    Formatted,
    /// Machine-readable résumé for applicant tracking systems.
    Ats,
}

impl DocStyle {
    pub fn file_name(self) -> &'static str {
        match self {
            DocStyle::Formatted => "resume_formatted.docx",
            DocStyle::Ats => "resume_ats.docx",
        }
    }
}

/// How the contact line labels its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactLabels {
    /// `me@x.com | 555 | LinkedIn: ... | GitHub: ...`
    Plain,
    /// `Email: me@x.com | Phone: 555 | Location: ... | ...`
    Labelled,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    /// Size in points; `None` inherits the body size.
    pub size_pt: Option<u8>,
    pub color: Option<&'static str>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Span {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Span {
            bold: true,
            ..Span::plain(text)
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Span {
            italic: true,
            ..Span::plain(text)
        }
    }

    fn sized(mut self, size_pt: Option<u8>) -> Self {
        self.size_pt = size_pt;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph { spans: Vec<Span>, centered: bool, indented: bool },
    Bullet(String),
    /// Horizontal separator under a section.
    Rule,
    /// Empty paragraph between entries.
    Spacer,
    /// Two-column category/skills table.
    SkillTable(Vec<(String, String)>),
}

impl Block {
    fn para(spans: Vec<Span>) -> Self {
        Block::Paragraph {
            spans,
            centered: false,
            indented: false,
        }
    }
}

struct Builder {
    style: DocStyle,
    blocks: Vec<Block>,
}

impl Builder {
    /// Size override that applies only to the formatted style.
    fn formatted_size(&self, size_pt: u8) -> Option<u8> {
        match self.style {
            DocStyle::Formatted => Some(size_pt),
            DocStyle::Ats => None,
        }
    }

    fn heading(&mut self, level: u8, text: impl Into<String>) {
        self.blocks.push(Block::Heading {
            level,
            text: text.into(),
        });
    }

    fn rule(&mut self) {
        if self.style == DocStyle::Formatted {
            self.blocks.push(Block::Rule);
        }
    }

    fn header(&mut self, contact: &Contact, labels: ContactLabels) {
        self.heading(1, contact.name.clone().unwrap_or_else(|| "Your Name".to_string()));

        let line = contact_items(contact, labels).join(" | ");
        let size = self.formatted_size(10);
        self.blocks.push(Block::Paragraph {
            spans: vec![Span::plain(line).sized(size)],
            centered: true,
            indented: false,
        });
        self.rule();
    }

    fn summary(&mut self, summary: &str) {
        let summary = summary.trim();
        if summary.is_empty() {
            return;
        }
        self.heading(2, "Professional Summary");
        self.blocks.push(Block::para(vec![Span::plain(summary)]));
        self.rule();
    }

    fn employment(&mut self, content: &ResumeContent) {
        if content.employment.is_empty() {
            return;
        }
        self.heading(2, "Professional Experience");

        for job in &content.employment {
            self.blocks.push(Block::para(vec![
                Span::bold(job.title.clone()).sized(Some(12)),
                Span::plain(format!(" | {}", job.company)),
            ]));
            let size = self.formatted_size(10);
            self.blocks
                .push(Block::para(vec![Span::italic(job.dates.clone()).sized(size)]));

            if !job.summary.is_empty() {
                let span = match self.style {
                    DocStyle::Formatted => Span::italic(job.summary.clone()).sized(Some(10)),
                    DocStyle::Ats => Span::plain(job.summary.clone()),
                };
                self.blocks.push(Block::Paragraph {
                    spans: vec![span],
                    centered: false,
                    indented: true,
                });
            }

            for achievement in &job.achievements {
                self.blocks.push(Block::Bullet(achievement.clone()));
            }
            self.blocks.push(Block::Spacer);
        }
        self.rule();
    }

    fn education(&mut self, content: &ResumeContent) {
        if content.education.is_empty() {
            return;
        }
        self.heading(2, "Education");

        for degree in &content.education {
            self.blocks
                .push(Block::para(vec![Span::bold(degree.degree.clone()).sized(Some(11))]));
            let size = self.formatted_size(10);
            self.blocks.push(Block::para(vec![Span::italic(format!(
                "{} | {}",
                degree.dates, degree.details
            ))
            .sized(size)]));
            for achievement in &degree.achievements {
                self.blocks.push(Block::Bullet(achievement.clone()));
            }
        }
        self.rule();
    }

    fn projects(&mut self, content: &ResumeContent) {
        if content.projects.is_empty() {
            return;
        }
        self.heading(2, "Technical Projects");

        for project in &content.projects {
            let mut spans = vec![Span::bold(project.name.clone())];
            if !project.description.is_empty() {
                spans.push(Span::plain(format!(": {}", project.description)));
            }
            self.blocks.push(Block::para(spans));

            if !project.url.is_empty() {
                let mut url = Span::italic(format!("URL: {}", project.url));
                if self.style == DocStyle::Formatted {
                    url.size_pt = Some(9);
                    url.color = Some(MARKER_COLOR);
                }
                self.blocks.push(Block::para(vec![url]));
            }
        }
        self.rule();
    }

    fn skills(&mut self, content: &ResumeContent) {
        if content.skills.is_empty() {
            return;
        }
        self.heading(2, "Technical Skills");

        match self.style {
            DocStyle::Ats => {
                for (category, list) in content.skills.iter() {
                    self.blocks.push(Block::para(vec![
                        Span::bold(format!("{category}: ")),
                        Span::plain(list.joined(", ")),
                    ]));
                }
            }
            DocStyle::Formatted => {
                let rows = content
                    .skills
                    .iter()
                    .map(|(category, list)| (category.to_string(), list.joined(", ")))
                    .collect();
                self.blocks.push(Block::SkillTable(rows));
            }
        }
    }
}

fn contact_items(contact: &Contact, labels: ContactLabels) -> Vec<String> {
    let fields = [
        ("Email", &contact.email),
        ("Phone", &contact.phone),
        ("Location", &contact.location),
        ("LinkedIn", &contact.linkedin),
        ("GitHub", &contact.github),
    ];

    fields
        .iter()
        .filter_map(|(label, value)| {
            let value = value.as_deref().filter(|v| !v.is_empty())?;
            let always_labelled = matches!(*label, "LinkedIn" | "GitHub");
            Some(if labels == ContactLabels::Labelled || always_labelled {
                format!("{label}: {value}")
            } else {
                value.to_string()
            })
        })
        .collect()
}

/// Lays out a résumé as document blocks, section by section.
pub fn build_blocks(content: &ResumeContent, style: DocStyle) -> Vec<Block> {
    build_blocks_with(content, style, ContactLabels::Plain)
}

pub fn build_blocks_with(
    content: &ResumeContent,
    style: DocStyle,
    labels: ContactLabels,
) -> Vec<Block> {
    let mut builder = Builder {
        style,
        blocks: Vec::new(),
    };
    builder.header(&content.contact, labels);
    builder.summary(&content.summary);
    builder.employment(content);
    builder.education(content);
    builder.projects(content);
    builder.skills(content);
    builder.blocks
}
