use serde::{Deserialize, Serialize};

// =============================================================================
// Registry Types
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// A skill advertised by an agent. Tags drive tag-based routing; examples
/// are documentation only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub examples: Vec<String>,
}

impl SkillDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_examples(mut self, examples: Vec<String>) -> Self {
        self.examples = examples;
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// One entry of the agent registry.
///
/// Immutable for the lifetime of the snapshot it was loaded into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub skills: Vec<SkillDescriptor>,
}

impl AgentDescriptor {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            url: url.into(),
            version: default_version(),
            enabled: true,
            skills: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_skill(mut self, skill: SkillDescriptor) -> Self {
        self.skills.push(skill);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether any of this agent's skills carries `tag`.
    pub fn has_skill_tag(&self, tag: &str) -> bool {
        self.skills.iter().any(|s| s.has_tag(tag))
    }

    /// Build the public agent card for this registry entry.
    pub fn to_card(&self) -> AgentCard {
        let skills = if self.skills.is_empty() {
            vec![SkillDescriptor::new("default", "Default")]
        } else {
            self.skills.clone()
        };
        let name = if self.name.is_empty() {
            "Agent".to_string()
        } else {
            self.name.clone()
        };
        AgentCard::new(name, self.url.clone())
            .with_description(self.description.clone())
            .with_version(self.version.clone())
            .with_skills(skills)
    }
}

// =============================================================================
// Agent Card (A2A discovery document)
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
}

/// Discovery document served at `/.well-known/agent.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    pub default_input_modes: Vec<String>,
    pub default_output_modes: Vec<String>,
    pub capabilities: AgentCapabilities,
    pub skills: Vec<SkillDescriptor>,
}

impl AgentCard {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            url: url.into(),
            version: default_version(),
            default_input_modes: vec!["text".to_string()],
            default_output_modes: vec!["text".to_string()],
            capabilities: AgentCapabilities { streaming: true },
            skills: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_skills(mut self, skills: Vec<SkillDescriptor>) -> Self {
        self.skills = skills;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_entry_defaults() {
        let agent: AgentDescriptor =
            serde_json::from_str(r#"{"id": "a", "url": "http://localhost:9000"}"#).unwrap();
        assert!(agent.enabled);
        assert_eq!(agent.version, "1.0.0");
        assert!(agent.skills.is_empty());
    }

    #[test]
    fn test_card_gets_default_skill() {
        let card = AgentDescriptor::new("a", "http://localhost:9000").to_card();
        assert_eq!(card.skills.len(), 1);
        assert_eq!(card.skills[0].id, "default");

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["defaultInputModes"][0], "text");
        assert_eq!(json["capabilities"]["streaming"], true);
    }

    #[test]
    fn test_skill_tag_lookup() {
        let agent = AgentDescriptor::new("v", "http://v")
            .with_skill(SkillDescriptor::new("validate", "Validate").with_tags(&["validation", "check"]));
        assert!(agent.has_skill_tag("check"));
        assert!(!agent.has_skill_tag("portfolio"));
    }
}
