use crate::core::bundle::CodeBundle;
use crate::core::message::{ChatMessage, HistoryEntry};

pub fn build_edit_messages(history: &[HistoryEntry], current: &CodeBundle) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = history.iter().map(ChatMessage::from).collect();
    messages.push(ChatMessage::user(current_state_turn(current)));
    messages
}

/// Final user turn carrying the code the model should edit.
pub fn current_state_turn(current: &CodeBundle) -> String {
    format!(
        "Current Code State:\nHTML:\n{}\n\nCSS:\n{}\n\nJS:\n{}\n\n\
         Task: Please update the code based on my previous requests. Return ONLY valid JSON.",
        current.html, current.css, current.js
    )
}

pub fn build_analysis_prompt(html: &str, css: &str, js: &str) -> String {
    format!(
        "Analyze this code and extract all color hex codes. Also provide brief suggestions:\n\n\
         HTML:\n{html}\n\nCSS:\n{css}\n\nJS:\n{js}\n\n\
         Return ONLY valid JSON with this format:\n\
         {{\n  \"colors\": [\"#hex1\", \"#hex2\"],\n  \"suggestions\": \"Brief suggestions here\"\n}}"
    )
}

pub const EDIT_SYSTEM_PROMPT: &str = r#"You are a web development assistant working inside a rich-text editor.

## Output contract

Respond with ONE JSON object and nothing else:
{
  "message": "What you changed, plus every color hex code found in the code",
  "html": "HTML markup",
  "css": "CSS rules",
  "js": "JavaScript"
}

- Escape strings properly: newlines as \n, quotes as \", backslashes as \\
- Do NOT wrap the object in markdown code fences
- Do NOT add any text before or after the object

## Editing rules

- Collect every color hex code in the code so you can reuse it when the user asks about colors
- Class names you introduce must contain a timestamp so they never collide with existing CSS
- When the code contains images, remember each image's alt text and use it as the image's name
- Do NOT emit <script src="script.js"> or <link rel="stylesheet" href="style.css">; styles and logic belong in the "css" and "js" fields
- Prefer full-width, edge-to-edge layouts unless the user asks for a specific component; the main container should span the viewport width (100%) and height (100vh) where it makes sense
- Return only the code that must change or be added"#;
