//! Chat transcript markup.
//!
//! Wraps rendered message content in the message boxes the chat page
//! expects and renders whole histories loaded from the server.

mod history;

pub use history::parse_history;
use serde::{Deserialize, Serialize};

use crate::markdown::{Renderer, escape_script_literal};

/// Shown in place of the transcript when history cannot be loaded.
pub const HISTORY_LOAD_FAILED: &str = "<p>Failed to load chat history. Please try again.</p>";

const WELCOME_MESSAGE: &str = "Hi there! 👋 \n\
I'm MAVIS – your **Multi-tasking AI Virtual Intelligent Solution**. \
Think of me as your personal AI assistant, Ready to help with anything you need! 💡🤖 \n\
How can I assist you today?";

const EDIT_BUTTON: &str = "<button class=\"edit-btn\"><i class=\"fas fa-edit\"></i></button>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Bot,
}

impl Role {
    fn css_class(self) -> &'static str {
        match self {
            Role::Human => "user-message",
            Role::Bot => "ai-message",
        }
    }
}

/// One chat message. Content is Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
        }
    }
}

/// Renders a message box with its content and action buttons.
///
/// Human messages get an edit button; every message gets a copy button
/// carrying the original Markdown.
pub fn render_message(renderer: &Renderer, message: &Message) -> String {
    let content = renderer.render(&message.content);
    let edit = match message.role {
        Role::Human => EDIT_BUTTON,
        Role::Bot => "",
    };
    format!(
        "<div class=\"message {class}\">\n\
         <div class=\"message-content\">{content}</div>\n\
         <div class=\"message-buttons\">{edit}\
         <button class=\"copy-btn\" onclick=\"navigator.clipboard.writeText('{literal}');\">\
         <i class=\"fas fa-copy\"></i></button></div>\n\
         </div>\n",
        class = message.role.css_class(),
        literal = escape_script_literal(&message.content),
    )
}

/// Renders the greeting shown at the top of a new conversation.
pub fn render_welcome(renderer: &Renderer) -> String {
    format!(
        "<div class=\"message welcome-message\">\n\
         <div class=\"message-content\">{}</div>\n\
         </div>\n",
        renderer.render(WELCOME_MESSAGE)
    )
}

/// Renders messages in order, optionally preceded by the welcome message.
pub fn render_transcript(renderer: &Renderer, messages: &[Message], welcome: bool) -> String {
    let mut out = String::new();
    if welcome {
        out.push_str(&render_welcome(renderer));
    }
    for message in messages {
        out.push_str(&render_message(renderer, message));
    }
    tracing::debug!(messages = messages.len(), welcome, "rendered transcript");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_message_has_edit_and_copy() {
        let html = render_message(&Renderer::default(), &Message::human("hello"));
        assert!(html.starts_with("<div class=\"message user-message\">"));
        assert!(html.contains("<div class=\"message-content\"><p>hello</p>\n</div>"));
        assert!(html.contains("class=\"edit-btn\""));
        assert!(html.contains("writeText('hello');"));
    }

    #[test]
    fn test_bot_message_has_no_edit_button() {
        let html = render_message(&Renderer::default(), &Message::bot("**hi**"));
        assert!(html.starts_with("<div class=\"message ai-message\">"));
        assert!(html.contains("<strong>hi</strong>"));
        assert!(!html.contains("edit-btn"));
    }

    #[test]
    fn test_copy_button_carries_raw_markdown() {
        let html = render_message(&Renderer::default(), &Message::bot("it's **\"bold\"**\nnext"));
        assert!(html.contains(r"writeText('it\'s **&quot;bold&quot;**\nnext');"));
    }

    #[test]
    fn test_welcome_message_rendered_as_markdown() {
        let html = render_welcome(&Renderer::default());
        assert!(html.contains("welcome-message"));
        assert!(html.contains("<strong>Multi-tasking AI Virtual Intelligent Solution</strong>"));
        assert!(!html.contains("copy-btn"));
    }

    #[test]
    fn test_transcript_order_and_welcome() {
        let messages = [Message::human("first"), Message::bot("second")];
        let html = render_transcript(&Renderer::default(), &messages, true);
        let welcome = html.find("welcome-message").unwrap();
        let first = html.find("first").unwrap();
        let second = html.find("second").unwrap();
        assert!(welcome < first && first < second);
    }

    #[test]
    fn test_transcript_without_welcome() {
        let html = render_transcript(&Renderer::default(), &[], false);
        assert!(html.is_empty());
    }

    #[test]
    fn test_message_serde_roles() {
        let message: Message = serde_json::from_str(r#"{"role":"bot","content":"x"}"#).unwrap();
        assert_eq!(message, Message::bot("x"));
    }
}
