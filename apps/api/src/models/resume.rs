use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The structured resume record produced by generation and edited by the form and the chat.
///
/// Every field is defaultable so a partially populated document still deserializes.
/// The document is a plain value: edits produce a new value that replaces the old one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeDocument {
    pub overview: Overview,
    pub contact_info: ContactInfo,
    pub skills: Vec<String>,
    pub work_experience: Vec<WorkExperience>,
    pub projects: Vec<Project>,
    pub education: Vec<Education>,
    pub certifications: Vec<Certification>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overview {
    pub name: String,
    pub current_role: String,
    pub company: String,
    pub professional_summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub phone: String,
    pub email: String,
    pub location: String,
    /// Platform name → URL, in the order the platforms were added.
    pub profile_links: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkExperience {
    pub title: String,
    pub company: String,
    pub duration: String,
    pub location: String,
    pub description: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub duration: String,
    pub description: Vec<String>,
    pub technologies: Vec<String>,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub duration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub date: String,
    pub credential_id: String,
}

impl ResumeDocument {
    /// Canonical serialization handed to the language model as context.
    /// Field order follows the struct declarations and map order is preserved.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Display name of the subject, used for export filenames.
    pub fn subject_name(&self) -> &str {
        self.overview.name.trim()
    }
}
