//! Evaluation template document.
//!
//! Templates live in a single JSON file shaped `{ "templates": [...] }`.
//! Unlike the key-value mirror, errors here are returned: callers decide
//! how to report them. The document always keeps at least one template.

use crate::error::{Error, Result};
use crate::types::{Question, Template};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct TemplatesDocument {
    #[serde(default)]
    templates: Vec<Template>,
}

/// Field-wise update for a template. The id never changes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub questions: Option<Vec<Question>>,
}

/// The template a fresh install starts with.
pub fn default_template() -> Template {
    let rating = |id: &str, label: &str| Question {
        id: id.to_string(),
        label: label.to_string(),
        kind: "rating".to_string(),
        stars: true,
        options: None,
    };
    let text = |id: &str, label: &str| Question {
        id: id.to_string(),
        label: label.to_string(),
        kind: "text".to_string(),
        stars: false,
        options: None,
    };

    Template {
        id: "distraction-evaluation".to_string(),
        name: "Distraction & Focus Evaluation".to_string(),
        description:
            "Comprehensive evaluation covering distractions, focus, engagement, and productivity"
                .to_string(),
        questions: vec![
            rating("focus", "How focused were you overall?"),
            Question {
                id: "main-distraction".to_string(),
                label: "What distracted you most?".to_string(),
                kind: "choice".to_string(),
                stars: false,
                options: Some(vec![
                    "Phone".to_string(),
                    "Social media".to_string(),
                    "Noise".to_string(),
                    "People".to_string(),
                    "Nothing".to_string(),
                ]),
            },
            rating("engagement", "How engaged were you with the material?"),
            rating("productivity", "How productive was the session?"),
            rating("energy", "How was your energy level?"),
            rating(
                "distraction-handling",
                "How well did you handle distractions?",
            ),
            text("improve", "What would you change next time?"),
        ],
    }
}

/// File-backed template store.
pub struct TemplateStore {
    path: PathBuf,
}

impl TemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the default template if the document does not exist yet.
    pub fn ensure_default(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        tracing::info!(path = %self.path.display(), "Writing default template document");
        self.write(&TemplatesDocument {
            templates: vec![default_template()],
        })
    }

    /// All templates. A missing document lists as empty.
    pub fn list(&self) -> Result<Vec<Template>> {
        Ok(self.read()?.templates)
    }

    pub fn get(&self, id: &str) -> Result<Template> {
        self.read()?
            .templates
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))
    }

    /// Insert, or replace the template with the same id.
    pub fn upsert(&self, template: Template) -> Result<Template> {
        if template.id.trim().is_empty() || template.name.trim().is_empty() {
            return Err(Error::Validation(
                "template needs an id and a name".to_string(),
            ));
        }

        let mut doc = self.read()?;
        match doc.templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template.clone(),
            None => doc.templates.push(template.clone()),
        }
        self.write(&doc)?;

        tracing::info!(template_id = %template.id, "Template saved");
        Ok(template)
    }

    pub fn update(&self, id: &str, patch: TemplatePatch) -> Result<Template> {
        let mut doc = self.read()?;
        let template = doc
            .templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))?;

        if let Some(name) = patch.name {
            template.name = name;
        }
        if let Some(description) = patch.description {
            template.description = description;
        }
        if let Some(questions) = patch.questions {
            template.questions = questions;
        }
        let updated = template.clone();

        self.write(&doc)?;
        tracing::info!(template_id = id, "Template updated");
        Ok(updated)
    }

    /// Remove a template. The last remaining template cannot be deleted.
    pub fn delete(&self, id: &str) -> Result<Template> {
        let mut doc = self.read()?;
        let index = doc
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))?;

        if doc.templates.len() <= 1 {
            return Err(Error::LastTemplate);
        }

        let deleted = doc.templates.remove(index);
        self.write(&doc)?;
        tracing::info!(template_id = id, "Template deleted");
        Ok(deleted)
    }

    fn read(&self) -> Result<TemplatesDocument> {
        if !self.path.exists() {
            return Ok(TemplatesDocument::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, doc: &TemplatesDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        doc.serialize(&mut ser)?;

        std::fs::write(&self.path, buf)?;
        Ok(())
    }
}
