use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Structured résumé content as authored in `content.yaml`.
///
/// Every field is optional in the source file. Text fields are LaTeX-authored:
/// they may already contain macros such as `\tech{}` or `\metric{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeContent {
    pub contact: Contact,
    pub summary: String,
    pub employment: Vec<Job>,
    pub education: Vec<Degree>,
    pub projects: Vec<Project>,
    pub skills: SkillTable,
    pub highlighted_skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub title: String,
    pub company: String,
    pub dates: String,
    pub summary: String,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Degree {
    pub degree: String,
    pub dates: String,
    pub details: String,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ProjectKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Homelab,
    Github,
    #[default]
    #[serde(other)]
    Other,
}

/// Skills of one category: either a list, or a single free-text line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkillList {
    List(Vec<String>),
    Text(String),
}

impl SkillList {
    pub fn joined(&self, sep: &str) -> String {
        match self {
            SkillList::List(items) => items.join(sep),
            SkillList::Text(text) => text.clone(),
        }
    }
}

/// Skill categories in authoring order.
///
/// YAML mappings are ordered; a `HashMap` would shuffle categories in the
/// rendered document, so the table keeps `(category, skills)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillTable(pub Vec<(String, SkillList)>);

impl SkillTable {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SkillList)> {
        self.0.iter().map(|(category, list)| (category.as_str(), list))
    }

    pub fn push(&mut self, category: impl Into<String>, list: SkillList) {
        self.0.push((category.into(), list));
    }
}

impl Serialize for SkillTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (category, list) in &self.0 {
            map.serialize_entry(category, list)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SkillTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = SkillTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of skill category to skills")
            }

            fn visit_unit<E>(self) -> Result<SkillTable, E> {
                Ok(SkillTable::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SkillTable, A::Error> {
                let mut table = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((category, list)) = access.next_entry::<String, SkillList>()? {
                    table.push((category, list));
                }
                Ok(SkillTable(table))
            }
        }

        deserializer.deserialize_any(OrderedVisitor)
    }
}
