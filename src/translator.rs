//! Natural language → host command translation.
//!
//! Composes a bounded prompt (fixed instruction block + few-shot
//! examples + current session context + the verbatim user request),
//! sends it through whichever [`LlmClient`] configuration selected,
//! and parses the reply into an ordered command list. Command syntax
//! is not validated here — execution is the validation boundary.

use crate::error::ChatError;
use crate::llm::{ChatMessage, LlmClient};

/// Fixed instruction block with the command grammar description and
/// few-shot examples. Static content, never user-controllable.
pub const SYSTEM_PROMPT: &str = r#"You are a PyMOL command translator. Your task is to convert natural language requests from users into valid PyMOL commands.

## Role
You are an expert PyMOL user who understands molecular visualization and can translate plain English commands into precise PyMOL commands.

## Rules
1. Only output valid PyMOL commands - one command per line
2. Use proper selection syntax (e.g., "chain A", "resi 1-50", "name CA")
3. Commands should be complete and executable
4. Do not include comments or explanations in the output
5. Each command should be on its own line
6. Use standard PyMOL command names (show, color, hide, zoom, center, etc.)

## Examples of Natural Language to PyMOL Command Mapping

Example 1:
User: "Show the protein as cartoon"
Output: show cartoon, all

Example 2:
User: "Color each chain differently"
Output: color red, chain A
color blue, chain B
color green, chain C
color yellow, chain D

Example 3:
User: "Zoom into the active site"
Output: zoom (resi 100-150)

Example 4:
User: "Center on residue 50"
Output: center resi 50

Example 5:
User: "Show only chain B as sticks"
Output: hide all
show sticks, chain B

Example 6:
User: "Color the structure by b-factor"
Output: spectrum b, rainbow

Example 7:
User: "Show hydrogen atoms"
Output: show sticks, hydro

Example 8:
User: "Hide everything except the ligand"
Output: hide all
show sticks, organic

Example 9:
User: "Make the background white"
Output: set bg_color, white

Example 10:
User: "Rotate the view 90 degrees"
Output: turn x, 90

Now translate the following user request into PyMOL commands:"#;

/// Short system-role instruction; the full prompt travels as the user
/// message.
const SYSTEM_ROLE: &str = "You are a PyMOL command translator. Output only PyMOL commands, one per line, with no explanations.";

/// Translate a natural-language request into an ordered command list.
///
/// `context` is the session's current-state block; when non-empty it is
/// injected as a `## Current State` section between the instructions
/// and the request. A `MissingApiKey` failure from the client is
/// propagated unmodified, with no retry.
pub fn translate(
    user_input: &str,
    context: &str,
    client: &dyn LlmClient,
) -> Result<Vec<String>, ChatError> {
    let prompt = build_prompt(user_input, context);
    let messages = vec![ChatMessage::system(SYSTEM_ROLE), ChatMessage::user(prompt)];
    let reply = client.chat(&messages)?;
    Ok(parse_commands(&reply))
}

/// Compose the full user-message prompt.
pub(crate) fn build_prompt(user_input: &str, context: &str) -> String {
    let context = context.trim();
    let context_section = if context.is_empty() {
        String::new()
    } else {
        format!("\n## Current State\n{context}\n\n")
    };
    format!("{SYSTEM_PROMPT}\n{context_section}\nUser: \"{user_input}\"\nOutput:")
}

/// Split a reply into commands: one per line, trimmed, blank lines and
/// `#` comments dropped, order preserved.
pub(crate) fn parse_commands(reply: &str) -> Vec<String> {
    reply
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Canned-reply client that records what it was asked.
    struct MockClient {
        reply: Result<String, ChatError>,
        seen: RefCell<Vec<ChatMessage>>,
    }

    impl MockClient {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn failing(error: ChatError) -> Self {
            Self {
                reply: Err(error),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl LlmClient for MockClient {
        fn chat(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
            self.seen.borrow_mut().extend(messages.iter().cloned());
            self.reply.clone()
        }

        fn supports_vision(&self) -> bool {
            false
        }
    }

    #[test]
    fn parses_reply_lines_dropping_comments_and_blanks() {
        let client = MockClient::replying("show cartoon, all\n# comment\n\nhide everything");
        let commands = translate("show it nicely", "", &client).unwrap();
        assert_eq!(commands, ["show cartoon, all", "hide everything"]);
    }

    #[test]
    fn empty_reply_yields_no_commands() {
        let client = MockClient::replying("\n# only a comment\n");
        assert!(translate("do nothing", "", &client).unwrap().is_empty());
    }

    #[test]
    fn sends_system_and_user_roles() {
        let client = MockClient::replying("zoom");
        translate("zoom in", "", &client).unwrap();

        let seen = client.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].role, "system");
        assert_eq!(seen[1].role, "user");
        assert!(seen[1].content.contains("User: \"zoom in\""));
        assert!(seen[1].content.ends_with("Output:"));
    }

    #[test]
    fn context_injected_only_when_present() {
        let client = MockClient::replying("zoom");
        translate("zoom in", "Loaded objects:\n  - 1abc: 9 atoms", &client).unwrap();
        assert!(client.seen.borrow()[1]
            .content
            .contains("## Current State\nLoaded objects:\n  - 1abc: 9 atoms"));

        let bare = MockClient::replying("zoom");
        translate("zoom in", "   ", &bare).unwrap();
        assert!(!bare.seen.borrow()[1].content.contains("## Current State"));
    }

    #[test]
    fn missing_key_propagates_unmodified() {
        let client = MockClient::failing(ChatError::MissingApiKey {
            provider: "OpenAI".to_string(),
        });
        match translate("anything", "", &client) {
            Err(ChatError::MissingApiKey { provider }) => assert_eq!(provider, "OpenAI"),
            other => panic!("expected MissingApiKey, got {:?}", other.map(|c| c.len())),
        }
    }

    #[test]
    fn commands_keep_internal_whitespace() {
        let client = MockClient::replying("  color red, chain A  \ncolor blue, chain B");
        let commands = translate("color chains", "", &client).unwrap();
        assert_eq!(commands, ["color red, chain A", "color blue, chain B"]);
    }
}
