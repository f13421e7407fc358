//! Renders the "## Available Tools" section `PromptBuilder` appends to an
//! agent's base instruction: one subsection per tool, with its name,
//! description, and parameter table.

use serde_json::Value;

use super::r#trait::ToolSpec;

pub struct PromptBuilder;

impl PromptBuilder {
    /// Appends a tools section to `base_instruction`. Returns
    /// `base_instruction` unchanged when `tools` is empty.
    pub fn build(base_instruction: &str, tools: &[ToolSpec]) -> String {
        if tools.is_empty() {
            return base_instruction.to_string();
        }

        let mut section = String::from("\n\n## Available Tools\n\n");
        for tool in tools {
            section.push_str(&format!("### {}\n\n{}\n\n", tool.name, tool.description));
            if tool.parameters.is_empty() {
                section.push_str("No parameters.\n\n");
            } else {
                section.push_str("| Parameter | Type | Required | Description |\n");
                section.push_str("|---|---|---|---|\n");
                for p in &tool.parameters {
                    section.push_str(&format!(
                        "| {} | {} | {} | {} |\n",
                        p.name,
                        p.type_name,
                        if p.required { "yes" } else { "no" },
                        p.description.as_deref().unwrap_or(""),
                    ));
                }
                section.push('\n');
            }
            section.push_str("Example call:\n\n```json\n");
            section.push_str(&serde_json::to_string_pretty(&example_call(tool)).unwrap_or_default());
            section.push_str("\n```\n\n");
        }

        format!("{base_instruction}{section}")
    }
}

/// Builds a representative example-argument object from a tool's typed
/// parameter list, one placeholder value per declared type.
fn example_call(tool: &ToolSpec) -> Value {
    let mut args = serde_json::Map::new();
    for p in &tool.parameters {
        let placeholder = match p.type_name.as_str() {
            "integer" | "number" => Value::from(0),
            "boolean" => Value::from(false),
            "array" => Value::Array(vec![]),
            "object" => Value::Object(serde_json::Map::new()),
            _ => Value::String(format!("<{}>", p.name)),
        };
        args.insert(p.name.clone(), placeholder);
    }
    serde_json::json!({ "name": tool.name, "arguments": Value::Object(args) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::r#trait::ToolParameter;

    fn sample_tool() -> ToolSpec {
        ToolSpec {
            name: "list_tables".into(),
            description: "Lists database tables".into(),
            input_schema: serde_json::json!({"type": "object"}),
            parameters: vec![ToolParameter {
                name: "schema".into(),
                type_name: "string".into(),
                required: false,
                description: Some("optional schema filter".into()),
            }],
            is_agent_tool: false,
        }
    }

    #[test]
    fn empty_tool_list_is_a_no_op() {
        assert_eq!(PromptBuilder::build("Base instruction.", &[]), "Base instruction.");
    }

    #[test]
    fn renders_tool_section_with_parameters_and_example() {
        let out = PromptBuilder::build("Base.", &[sample_tool()]);
        assert!(out.starts_with("Base."));
        assert!(out.contains("## Available Tools"));
        assert!(out.contains("list_tables"));
        assert!(out.contains("schema"));
        assert!(out.contains("\"name\": \"list_tables\""));
    }

    #[test]
    fn tool_without_parameters_states_so() {
        let mut tool = sample_tool();
        tool.parameters.clear();
        let out = PromptBuilder::build("Base.", &[tool]);
        assert!(out.contains("No parameters."));
    }
}
