//! Prompt templates for the context chat engine

use crate::index::ScoredNode;

/// Template wrapping retrieved node text
pub const CONTEXT_TEMPLATE: &str =
    "Context information is below.\n--------------------\n{context_str}\n--------------------\n";

/// Prompt builder for context chat
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render one node: metadata lines, a blank line, then the text
    pub fn format_node(node: &ScoredNode) -> String {
        let metadata: Vec<String> = node
            .node
            .metadata
            .iter()
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => format!("{}: {}", key, s),
                other => format!("{}: {}", key, other),
            })
            .collect();

        if metadata.is_empty() {
            node.node.text.clone()
        } else {
            format!("{}\n\n{}", metadata.join("\n"), node.node.text)
        }
    }

    /// Build the context block from retrieved nodes
    pub fn build_context(nodes: &[ScoredNode]) -> String {
        let context_str = nodes
            .iter()
            .map(Self::format_node)
            .collect::<Vec<_>>()
            .join("\n\n");

        CONTEXT_TEMPLATE.replace("{context_str}", &context_str)
    }

    /// System message: the fixed system prompt followed by the context block
    pub fn build_system_message(system_prompt: &str, nodes: &[ScoredNode]) -> String {
        let context = Self::build_context(nodes);
        if system_prompt.is_empty() {
            context
        } else {
            format!("{}\n{}", system_prompt, context)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexNode;
    use serde_json::{json, Map};

    fn node(text: &str, metadata: Map<String, serde_json::Value>) -> ScoredNode {
        ScoredNode {
            node: IndexNode {
                id: "n1".to_string(),
                text: text.to_string(),
                metadata,
                embedding: vec![1.0],
            },
            score: 0.9,
        }
    }

    #[test]
    fn test_node_with_metadata() {
        let mut metadata = Map::new();
        metadata.insert("file_name".to_string(), json!("labour.pdf"));
        metadata.insert("page_label".to_string(), json!(4));

        let rendered = PromptBuilder::format_node(&node("Unemployment is 5%.", metadata));
        assert!(rendered.starts_with("file_name: labour.pdf\npage_label: 4\n\n"));
        assert!(rendered.ends_with("Unemployment is 5%."));
    }

    #[test]
    fn test_system_message_layout() {
        let message = PromptBuilder::build_system_message(
            "You are a chatbot.",
            &[node("Lagos is the largest city.", Map::new())],
        );

        assert_eq!(
            message,
            "You are a chatbot.\nContext information is below.\n--------------------\n\
             Lagos is the largest city.\n--------------------\n"
        );
    }

    #[test]
    fn test_empty_context() {
        let context = PromptBuilder::build_context(&[]);
        assert!(context.contains("--------------------\n\n--------------------"));
    }
}
