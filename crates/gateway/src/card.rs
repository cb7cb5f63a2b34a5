//! Agent card construction for the host.

use std::collections::HashSet;

use agent_mesh_core::{
    types::{AgentCard, SkillDescriptor, ToolDescriptor},
    Error, Result,
};

use crate::registry::RegistrySnapshot;

pub const HOST_AGENT_NAME: &str = "A2A Host Agent";

/// Build the host card from the enabled agents and any discovered tools.
///
/// Skills are deduplicated by id, first occurrence wins. Fails when the
/// registry has no enabled agents.
pub fn host_card(snapshot: &RegistrySnapshot, tools: &[ToolDescriptor], url: impl Into<String>) -> Result<AgentCard> {
    if snapshot.is_empty() {
        return Err(Error::registry(
            "No agents in registry; ensure the registry has at least one enabled agent",
        ));
    }

    let mut seen = HashSet::new();
    let mut skills: Vec<SkillDescriptor> = snapshot
        .list()
        .flat_map(|agent| agent.skills.iter())
        .filter(|skill| !skill.id.is_empty() && seen.insert(skill.id.clone()))
        .cloned()
        .collect();

    let tool_names: Vec<&str> = tools
        .iter()
        .map(|t| t.name.as_str())
        .filter(|n| !n.is_empty())
        .collect();
    if !tool_names.is_empty() {
        skills.push(
            SkillDescriptor::new("mcp_registry_tools", "MCP registry tools")
                .with_description(format!("Tools from the MCP registry: {}", tool_names.join(", ")))
                .with_tags(&["mcp", "tools", "registry"])
                .with_examples(tool_names.iter().take(3).map(|n| format!("Use {}", n)).collect()),
        );
    }

    if skills.is_empty() {
        skills.push(
            SkillDescriptor::new("default", "Default").with_description("Route to registered agents"),
        );
    }

    Ok(AgentCard::new(HOST_AGENT_NAME, url)
        .with_description(
            "Routes requests to agents in the agent registry and exposes MCP registry tools via the MCP Tool Agent.",
        )
        .with_skills(skills))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_mesh_core::types::AgentDescriptor;

    fn skill(id: &str) -> SkillDescriptor {
        SkillDescriptor::new(id, id.to_uppercase())
    }

    #[test]
    fn test_empty_registry_fails() {
        assert!(host_card(&RegistrySnapshot::default(), &[], "http://h").is_err());
    }

    #[test]
    fn test_skills_deduplicated_with_tool_skill() {
        let snapshot = RegistrySnapshot::new(vec![
            AgentDescriptor::new("a", "http://a").with_skill(skill("x")).with_skill(skill("y")),
            AgentDescriptor::new("b", "http://b").with_skill(skill("x")),
            AgentDescriptor::new("c", "http://c").with_skill(skill("z")).disabled(),
        ]);
        let tools: Vec<_> = ["add", "greet", "echo", "just_fun_random"]
            .iter()
            .map(|n| ToolDescriptor::new(*n, ""))
            .collect();

        let card = host_card(&snapshot, &tools, "http://h").unwrap();
        let ids: Vec<_> = card.skills.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "mcp_registry_tools"]);

        let tool_skill = &card.skills[2];
        assert_eq!(tool_skill.examples, vec!["Use add", "Use greet", "Use echo"]);
        assert!(tool_skill.has_tag("registry"));
    }

    #[test]
    fn test_default_skill_when_nothing_declared() {
        let snapshot = RegistrySnapshot::new(vec![AgentDescriptor::new("a", "http://a")]);
        let card = host_card(&snapshot, &[], "http://h").unwrap();
        assert_eq!(card.skills.len(), 1);
        assert_eq!(card.skills[0].id, "default");
        assert_eq!(card.url, "http://h");
    }
}
