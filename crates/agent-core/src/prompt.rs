//! Prompt rewriting
//!
//! Hooks that reshape `(instructions, prompt)` before a backend call, plus the
//! default writer that describes tools in plain text for models that cannot
//! receive tool schemas.

use crate::tool::Tool;

/// System text and prompt after rewriting
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewrittenPrompt {
    /// `None` or empty means the request carries no system text
    pub system: Option<String>,
    pub prompt: String,
}

impl RewrittenPrompt {
    /// Keep the instructions as system text and the prompt as is
    pub fn unchanged(instructions: &str, prompt: &str) -> Self {
        Self {
            system: Some(instructions.to_string()),
            prompt: prompt.to_string(),
        }
    }
}

/// `(instructions, prompt)` rewrite applied by a tool-calling adapter
pub type PromptRetriever = dyn Fn(&str, &str) -> RewrittenPrompt + Send + Sync;

/// `(tools, instructions, prompt)` rewrite applied by a non-tool-calling adapter
pub type ToolPromptWriter = dyn Fn(&[Tool], &str, &str) -> RewrittenPrompt + Send + Sync;

/// Markdown listing of each tool with its parameters and JSON schema
pub fn tool_catalog(tools: &[Tool]) -> String {
    let mut section = String::from("## Available Tools\n\n");

    for tool in tools {
        section.push_str(&format!("### {}\n", tool.name()));
        section.push_str(&format!("{}\n", tool.description()));

        let parameters = tool.parameters();
        if !parameters.properties.is_empty() {
            section.push_str("**Parameters:**\n");
            for param in &parameters.properties {
                let required = if param.required { " (required)" } else { "" };
                section.push_str(&format!(
                    "- `{}` ({}){}: {}\n",
                    param.name, param.param_type, required, param.description
                ));
            }
        }
        section.push_str(&format!("Schema: {}\n\n", parameters.to_json_schema()));
    }

    section
}

/// Default writer for planning models: everything goes into the user prompt
/// and the system text is dropped.
pub fn plan_with_tools(tools: &[Tool], instructions: &str, prompt: &str) -> RewrittenPrompt {
    let mut text = format!(
        "I was given the instructions: {instructions}\n\nand need help resolving this question.\n\n"
    );
    if tools.is_empty() {
        text.push_str("I have no tools available.\n\n");
    } else {
        text.push_str("I have the following tools available, with instructions on how to use them:\n\n");
        text.push_str(&tool_catalog(tools));
    }
    if !prompt.is_empty() {
        text.push_str(prompt);
        text.push_str("\n\n");
    }
    text.push_str(
        "Given the information above, say what I should do next with the tools I have. \
         A valid answer either explains how to use a tool or states that no tool is needed \
         and answers the question.",
    );

    RewrittenPrompt {
        system: None,
        prompt: text,
    }
}
