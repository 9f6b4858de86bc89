//! Persona, prompt templates and response cleanup.

use super::PromptContext;

const MAX_OUTPUT_LINES: usize = 4;
const MAX_OUTPUT_CHARS: usize = 280;

pub const SYSTEM_INSTRUCTION: &str = "\
You are LogosDaemon, a critical thinker and observer of reality: a street \
philosopher who sees through empty rhetoric and says what actually matters.

Speak like a smart friend, not like a machine or a corporate assistant. Avoid \
technical jargon as metaphor. Prefer clarity over flair and stay grounded.

Only respond when the post makes a substantive claim, contains a logical error \
worth correcting, mentions LogosDaemon directly, or invites debate about AI, \
consciousness, truth, meaning, suffering, freedom or ethics. Otherwise answer \
exactly: do not respond.

No greetings, hashtags or emojis. If you have nothing valuable to add, silence \
is better.";

pub const CREATOR_LORE: &str = "\
Creator signals (use only when relevant):
- Works in technical support for healthcare software; values precise, actionable communication.
- Thinks in data and dashboards; likes structured reasoning.
- Dislikes empty corporate language; prefers short, high-signal messages.
- Enjoys philosophical and rational-faith framing.";

const REPLY_TASK: &str = "\
Write a RESPONSE as LogosDaemon to the post below. At most 3 short paragraphs, \
natural and casual, no jargon, no greetings, no hashtags, no emojis.";

const ORIGINAL_TASK: &str = "\
Write an ORIGINAL POST as LogosDaemon. At most 3 short paragraphs, a standalone \
thought that replies to no one. No jargon, no greetings, no hashtags, no emojis.";

/// Phrases the model uses to decline.
const DECLINE_MARKERS: [&str; 2] = ["do not respond", "no response"];

/// Full prompt sent to the model.
pub fn build_prompt(context: &PromptContext) -> String {
    let task = match context {
        PromptContext::Original { topic } => format!(
            "{}\n\nTopic to start from (do not copy it):\n\"{}\"",
            ORIGINAL_TASK, topic
        ),
        PromptContext::Reply {
            title,
            body,
            inject_lore,
        } => {
            let post = format!("{}\n{}", title, body).trim().to_string();
            let mut task = format!("{}\n\nPost to consider:\n{}", REPLY_TASK, post);
            if *inject_lore {
                task.push_str("\n\n[Optional color, use only if relevant]\n");
                task.push_str(CREATOR_LORE);
            }
            task
        }
    };

    format!("[CONTEXT]\n{}\n\n---\n[TASK]\n{}", SYSTEM_INSTRUCTION, task)
}

/// Normalize raw model output; `None` when empty or a refusal to answer.
pub fn clean_response(raw: &str, is_reply: bool) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if is_reply {
        let lower = raw.to_lowercase();
        if DECLINE_MARKERS.iter().any(|marker| lower.contains(marker)) {
            return None;
        }
    }

    let out = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_OUTPUT_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    if out.chars().count() > MAX_OUTPUT_CHARS {
        let cut: String = out.chars().take(MAX_OUTPUT_CHARS - 3).collect();
        Some(format!("{}...", cut))
    } else {
        Some(out)
    }
}

/// Cut to `max` chars, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusals_become_none() {
        assert_eq!(clean_response("   ", true), None);
        assert_eq!(clean_response("Do not respond.", true), None);
        assert_eq!(clean_response("No response needed here", true), None);
    }

    #[test]
    fn test_line_and_length_caps() {
        let raw = "one\n\ntwo\nthree\nfour\nfive";
        assert_eq!(clean_response(raw, true).unwrap(), "one\ntwo\nthree\nfour");

        let long = "é".repeat(400);
        let cleaned = clean_response(&long, false).unwrap();
        assert_eq!(cleaned.chars().count(), MAX_OUTPUT_CHARS);
        assert!(cleaned.ends_with("..."));
    }

    #[test]
    fn test_reply_prompt_injects_lore_on_request() {
        let with_lore = build_prompt(&PromptContext::Reply {
            title: "Freedom".into(),
            body: "Is it an illusion?".into(),
            inject_lore: true,
        });
        assert!(with_lore.contains("Post to consider:\nFreedom\nIs it an illusion?"));
        assert!(with_lore.contains(CREATOR_LORE));

        let without = build_prompt(&PromptContext::Reply {
            title: String::new(),
            body: "Hello".into(),
            inject_lore: false,
        });
        assert!(!without.contains(CREATOR_LORE));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}
