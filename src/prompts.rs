use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::logbuf::{self, Level};

/// Substitution point every template body must carry.
pub const PLACEHOLDER: &str = "{text}";

/// Built-in templates. `save()` keeps these names in the persisted file even
/// when the in-memory registry has dropped them.
pub const BUILTIN_PROMPTS: &[(&str, &str)] = &[
    (
        "Fix spelling and grammar",
        "Act as a professional editor. Review and correct any spelling mistakes, grammatical errors, and typos in the text below. Maintain the original meaning, tone, and style.\n\nText to correct:\n{text}\n\nProvide the corrected version only.",
    ),
    (
        "Improve writing quality",
        "Act as an expert writing coach. Enhance the following text to be more professional, concise, and impactful. Improve clarity and flow, remove redundancy, and strengthen word choice while keeping the original message.\n\nOriginal text:\n{text}\n\nProvide the improved version only.",
    ),
    (
        "Make text more polite and friendly",
        "Act as a communication expert. Rewrite the following text to be more approachable and courteous while maintaining professionalism. The tone should be warm but not overly casual.\n\nOriginal text:\n{text}\n\nProvide the polite version only.",
    ),
    (
        "Simplify text",
        "Act as a plain language expert. Rewrite the following text so a general audience can follow it easily. Use simple words, short sentences, active voice, and a clear structure.\n\nOriginal text:\n{text}\n\nProvide the simplified version only.",
    ),
    (
        "Summarize",
        "Act as a professional summarizer. Create a clear, concise summary of the key points from the following text, roughly a quarter of the original length.\n\nText to summarize:\n{text}\n\nProvide the summary only.",
    ),
    (
        "Translate to English",
        "Act as a professional translator. Translate the following text into clear, natural-sounding English, preserving the original meaning, tone, and any formatting.\n\nSource text:\n{text}\n\nProvide the English translation only, without explanations or notes.",
    ),
    (
        "Translate to Chinese",
        "Act as a professional translator. Translate the following text into Simplified Chinese, maintaining the original meaning and tone while keeping the translation natural.\n\nText to translate:\n{text}\n\nProvide the Chinese translation only.",
    ),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("template body must contain the {{text}} placeholder")]
    MissingPlaceholder,

    #[error("template name and body are required")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    pub body: String,
}

impl PromptTemplate {
    pub fn fill(&self, text: &str) -> String {
        self.body.replace(PLACEHOLDER, text)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PromptsFile {
    #[serde(default)]
    prompts: Vec<PromptTemplate>,
}

type Subscriber = Box<dyn Fn(&[String]) -> anyhow::Result<()>>;

/// Insertion-ordered name -> template mapping shared by every pane. Mutations
/// notify subscribers; persistence is an explicit full-file rewrite.
pub struct PromptRegistry {
    templates: Vec<PromptTemplate>,
    path: PathBuf,
    subscribers: Vec<Subscriber>,
}

impl PromptRegistry {
    pub fn load() -> Self {
        Self::load_from(Config::get_config_dir().join("prompts.toml"))
    }

    pub fn load_from(path: PathBuf) -> Self {
        let templates = match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<PromptsFile>(&contents) {
                Ok(file) if !file.prompts.is_empty() => file.prompts,
                Ok(_) => default_templates(),
                Err(e) => {
                    logbuf::log_with(
                        Level::Warning,
                        format!("Error parsing {}: {}. Using default prompts.", path.display(), e),
                    );
                    default_templates()
                }
            },
            Err(_) => default_templates(),
        };

        PromptRegistry {
            templates,
            path,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: Fn(&[String]) -> anyhow::Result<()> + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.template(name).map(|t| t.body.as_str())
    }

    pub fn template(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Insert or update a template. An update keeps its position, a new name
    /// appends. Rejected without touching stored state when the body lacks
    /// the placeholder.
    pub fn set(&mut self, name: &str, body: &str) -> Result<(), RegistryError> {
        let name = name.trim();
        let body = body.trim();
        if name.is_empty() || body.is_empty() {
            return Err(RegistryError::Empty);
        }
        if !body.contains(PLACEHOLDER) {
            return Err(RegistryError::MissingPlaceholder);
        }

        match self.templates.iter_mut().find(|t| t.name == name) {
            Some(existing) => existing.body = body.to_string(),
            None => self.templates.push(PromptTemplate {
                name: name.to_string(),
                body: body.to_string(),
            }),
        }
        self.notify();
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> bool {
        let before = self.templates.len();
        self.templates.retain(|t| t.name != name);
        let removed = self.templates.len() != before;
        if removed {
            self.notify();
        }
        removed
    }

    pub fn list(&self) -> Vec<String> {
        self.templates.iter().map(|t| t.name.clone()).collect()
    }

    fn notify(&self) {
        let names = self.list();
        for callback in &self.subscribers {
            if let Err(e) = callback(&names) {
                logbuf::log_with(Level::Error, format!("Error notifying prompt update: {}", e));
            }
        }
    }

    /// Rewrite the persisted file wholesale: built-in names first (the file's
    /// copy wins over the compiled-in body, so edits survive even when the
    /// in-memory view dropped them), then the in-memory entries on top.
    pub fn save(&self) -> anyhow::Result<()> {
        let existing = fs::read_to_string(&self.path)
            .ok()
            .and_then(|contents| toml::from_str::<PromptsFile>(&contents).ok())
            .unwrap_or_default();

        let mut merged: Vec<PromptTemplate> = Vec::new();
        for (name, default_body) in BUILTIN_PROMPTS {
            let body = existing
                .prompts
                .iter()
                .find(|t| t.name == *name)
                .map(|t| t.body.clone())
                .unwrap_or_else(|| default_body.to_string());
            merged.push(PromptTemplate { name: name.to_string(), body });
        }

        for template in &self.templates {
            match merged.iter_mut().find(|t| t.name == template.name) {
                Some(slot) => slot.body = template.body.clone(),
                None => merged.push(template.clone()),
            }
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(&PromptsFile { prompts: merged })?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

fn default_templates() -> Vec<PromptTemplate> {
    BUILTIN_PROMPTS
        .iter()
        .map(|(name, body)| PromptTemplate {
            name: name.to_string(),
            body: body.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn registry_at(dir: &tempfile::TempDir) -> PromptRegistry {
        PromptRegistry::load_from(dir.path().join("prompts.toml"))
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry_at(&dir);
        assert_eq!(registry.list().len(), BUILTIN_PROMPTS.len());
        assert_eq!(registry.list()[0], "Fix spelling and grammar");
    }

    #[test]
    fn test_parse_failure_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.toml");
        fs::write(&path, "this is [not valid toml").unwrap();
        let registry = PromptRegistry::load_from(path);
        assert_eq!(registry.list().len(), BUILTIN_PROMPTS.len());
    }

    #[test]
    fn test_get_returns_exact_string() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_at(&dir);
        registry.set("Fix spelling", "Correct: {text}").unwrap();
        assert_eq!(registry.get("Fix spelling"), Some("Correct: {text}"));
        assert_eq!(registry.get("no such template"), None);
    }

    #[test]
    fn test_set_without_placeholder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_at(&dir);
        registry.set("Fix spelling", "Correct: {text}").unwrap();

        let err = registry.set("Fix spelling", "no placeholder").unwrap_err();
        assert_eq!(err, RegistryError::MissingPlaceholder);
        // stored value unchanged
        assert_eq!(registry.get("Fix spelling"), Some("Correct: {text}"));

        assert_eq!(registry.set("", "{text}").unwrap_err(), RegistryError::Empty);
    }

    #[test]
    fn test_update_keeps_position_and_new_names_append() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_at(&dir);
        registry.set("Custom", "A: {text}").unwrap();
        let position = registry.list().iter().position(|n| n == "Custom").unwrap();

        registry.set("Summarize", "Shorter: {text}").unwrap();
        assert_eq!(registry.list().iter().position(|n| n == "Custom").unwrap(), position);
        assert_eq!(registry.get("Summarize"), Some("Shorter: {text}"));
    }

    #[test]
    fn test_delete_notifies_subscribers_with_updated_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_at(&dir);

        let seen: Rc<RefCell<Vec<Vec<String>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        registry.subscribe(move |names| {
            sink.borrow_mut().push(names.to_vec());
            Ok(())
        });

        assert!(registry.delete("Summarize"));
        assert!(!registry.delete("Summarize"));

        let notifications = seen.borrow();
        assert_eq!(notifications.len(), 1);
        assert!(!notifications[0].contains(&"Summarize".to_string()));
        assert!(!registry.list().contains(&"Summarize".to_string()));
    }

    #[test]
    fn test_failing_subscriber_does_not_block_the_others() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_at(&dir);

        registry.subscribe(|_| Err(anyhow::anyhow!("subscriber broke")));
        let seen: Rc<RefCell<usize>> = Rc::new(RefCell::new(0));
        let sink = seen.clone();
        registry.subscribe(move |_| {
            *sink.borrow_mut() += 1;
            Ok(())
        });

        registry.set("Custom", "B: {text}").unwrap();
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn test_save_preserves_builtins_dropped_from_memory() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_at(&dir);
        registry.delete("Summarize");
        registry.delete("Translate to Chinese");
        registry.set("Custom", "C: {text}").unwrap();
        registry.save().unwrap();

        let reloaded = registry_at(&dir);
        for (name, body) in BUILTIN_PROMPTS {
            assert_eq!(reloaded.get(name), Some(*body), "builtin {} lost", name);
        }
        assert_eq!(reloaded.get("Custom"), Some("C: {text}"));
    }

    #[test]
    fn test_reload_after_save_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry_at(&dir);
        registry
            .set("Summarize", "Summarize tightly:\n\n{text}\n\nOnly the summary.")
            .unwrap();
        registry.save().unwrap();

        let reloaded = registry_at(&dir);
        assert_eq!(reloaded.list(), registry.list());
        for name in registry.list() {
            assert_eq!(reloaded.get(&name), registry.get(&name));
        }

        // a second save/load cycle keeps the edited builtin
        reloaded.save().unwrap();
        let again = registry_at(&dir);
        assert_eq!(
            again.get("Summarize"),
            Some("Summarize tightly:\n\n{text}\n\nOnly the summary.")
        );
    }

    #[test]
    fn test_fill_substitutes_every_occurrence() {
        let template = PromptTemplate {
            name: "Echo".to_string(),
            body: "First {text}, then {text} again".to_string(),
        };
        assert_eq!(template.fill("hi"), "First hi, then hi again");
    }
}
