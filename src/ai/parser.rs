//! Parser module for processing completion text.
//!
//! Command generation expects a single JSON object of the form
//! `{"command": ..., "explanation": ..., "safety": "safe" | "dangerous"}`.
//! Models frequently wrap it in markdown fences or ignore the format entirely,
//! so decoding never fails: anything that does not match the shape exactly
//! degrades to a fallback proposal built from the first line of text.

use std::fmt;

use serde::Deserialize;

/// Explanation attached to proposals that could not be decoded.
pub const FALLBACK_EXPLANATION: &str = "Generated command";

const FENCE_MARKERS: [&str; 2] = ["```json", "```"];

/// Advisory risk tag. Not verified against what the command actually does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyClass {
    Safe,
    Dangerous,
    Unknown,
}

impl fmt::Display for SafetyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyClass::Safe => f.write_str("safe"),
            SafetyClass::Dangerous => f.write_str("dangerous"),
            SafetyClass::Unknown => f.write_str("unknown"),
        }
    }
}

/// A candidate shell command for one user request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandProposal {
    pub request: String,
    pub command: String,
    pub explanation: String,
    pub safety: SafetyClass,
}

/// Outcome of decoding a generation completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// The completion matched the expected object exactly.
    Structured(CommandProposal),
    /// The completion did not match; the proposal was built from its first line.
    Fallback(CommandProposal),
}

impl Decoded {
    pub fn proposal(&self) -> &CommandProposal {
        match self {
            Decoded::Structured(p) | Decoded::Fallback(p) => p,
        }
    }

    pub fn into_proposal(self) -> CommandProposal {
        match self {
            Decoded::Structured(p) | Decoded::Fallback(p) => p,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Decoded::Structured(_))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum DeclaredSafety {
    Safe,
    Dangerous,
}

#[derive(Debug, Deserialize)]
struct RawProposal {
    command: String,
    explanation: String,
    safety: DeclaredSafety,
}

/// Remove markdown fence markers anywhere in the text, then trim.
pub fn clean_completion(text: &str) -> String {
    let mut cleaned = text.trim().to_string();
    for marker in FENCE_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned.trim().to_string()
}

/// Decode a generation completion into a proposal for `request`.
pub fn parse_command_proposal(request: &str, completion: &str) -> Decoded {
    let cleaned = clean_completion(completion);

    match serde_json::from_str::<RawProposal>(&cleaned) {
        // An empty command stays empty; the controller rejects it.
        Ok(raw) => Decoded::Structured(CommandProposal {
            request: request.to_string(),
            command: raw.command.trim().to_string(),
            explanation: raw.explanation,
            safety: match raw.safety {
                DeclaredSafety::Safe => SafetyClass::Safe,
                DeclaredSafety::Dangerous => SafetyClass::Dangerous,
            },
        }),
        Err(e) => {
            tracing::debug!("Completion is not a structured proposal ({}), using fallback", e);
            fallback(request, &cleaned)
        }
    }
}

fn fallback(request: &str, cleaned: &str) -> Decoded {
    Decoded::Fallback(CommandProposal {
        request: request.to_string(),
        command: cleaned.lines().next().unwrap_or_default().to_string(),
        explanation: FALLBACK_EXPLANATION.to_string(),
        safety: SafetyClass::Unknown,
    })
}

/// Free-text explanation: cleaned, otherwise verbatim.
pub fn parse_explanation(completion: &str) -> String {
    clean_completion(completion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_format() {
        let completion = r#"{"command":"ls -la","explanation":"lists all files","safety":"safe"}"#;

        let decoded = parse_command_proposal("list files", completion);
        assert!(decoded.is_structured());
        let proposal = decoded.into_proposal();
        assert_eq!(proposal.request, "list files");
        assert_eq!(proposal.command, "ls -la");
        assert_eq!(proposal.explanation, "lists all files");
        assert_eq!(proposal.safety, SafetyClass::Safe);
    }

    #[test]
    fn test_parse_fenced_pretty_printed() {
        let completion = r#"
```json
{
    "command": "rm -rf ./tmp",
    "explanation": "Recursively deletes the tmp folder",
    "safety": "dangerous"
}
```
        "#;

        let decoded = parse_command_proposal("delete temp folder", completion);
        assert!(decoded.is_structured());
        assert_eq!(decoded.proposal().command, "rm -rf ./tmp");
        assert_eq!(decoded.proposal().safety, SafetyClass::Dangerous);
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let completion =
            r#"{"command":"df -h","explanation":"disk usage","safety":"safe","confidence":0.9}"#;
        let decoded = parse_command_proposal("show disk usage", completion);
        assert!(decoded.is_structured());
        assert_eq!(decoded.proposal().command, "df -h");
    }

    #[test]
    fn test_prose_falls_back_to_first_line() {
        let decoded = parse_command_proposal("clean tmp", "Sure! rm -rf /tmp");
        assert_eq!(
            decoded,
            Decoded::Fallback(CommandProposal {
                request: "clean tmp".to_string(),
                command: "Sure! rm -rf /tmp".to_string(),
                explanation: "Generated command".to_string(),
                safety: SafetyClass::Unknown,
            })
        );
    }

    #[test]
    fn test_multiline_fallback_keeps_only_first_line() {
        let completion = "```\nfind . -name '*.py'\n```\nThis finds python files.";
        let decoded = parse_command_proposal("find python files", completion);
        assert!(!decoded.is_structured());
        assert_eq!(decoded.proposal().command, "find . -name '*.py'");
    }

    #[test]
    fn test_undeclared_safety_value_falls_back() {
        let completion = r#"{"command":"ls","explanation":"list","safety":"unknown"}"#;
        let decoded = parse_command_proposal("list", completion);
        assert!(!decoded.is_structured());
        assert_eq!(decoded.proposal().safety, SafetyClass::Unknown);
        assert_eq!(decoded.proposal().explanation, FALLBACK_EXPLANATION);
        assert_eq!(decoded.proposal().command, completion);
    }

    #[test]
    fn test_safety_is_case_sensitive() {
        let completion = r#"{"command":"ls","explanation":"list","safety":"SAFE"}"#;
        assert!(!parse_command_proposal("list", completion).is_structured());
    }

    #[test]
    fn test_missing_key_falls_back() {
        let completion = r#"{"command":"ls","safety":"safe"}"#;
        let decoded = parse_command_proposal("list", completion);
        assert!(!decoded.is_structured());
        assert_eq!(decoded.proposal().command, completion);
    }

    #[test]
    fn test_non_string_command_falls_back() {
        let completion = r#"{"command":["ls","-la"],"explanation":"list","safety":"safe"}"#;
        assert!(!parse_command_proposal("list", completion).is_structured());
    }

    #[test]
    fn test_empty_command_is_not_replaced_by_json_text() {
        let completion = "{\n  \"command\": \"\",\n  \"explanation\": \"nothing\",\n  \"safety\": \"safe\"\n}";
        let decoded = parse_command_proposal("noop", completion);
        assert!(decoded.is_structured());
        assert_eq!(decoded.proposal().command, "");
        assert_eq!(decoded.proposal().safety, SafetyClass::Safe);
    }

    #[test]
    fn test_empty_completion_yields_empty_command() {
        let decoded = parse_command_proposal("anything", "   \n ");
        assert!(!decoded.is_structured());
        assert_eq!(decoded.proposal().command, "");
        assert_eq!(decoded.proposal().safety, SafetyClass::Unknown);
    }

    #[test]
    fn test_parse_explanation_strips_fences_only() {
        let completion = "\n```\n1. The file does not exist.\n2. Check the path.\n```\n";
        assert_eq!(
            parse_explanation(completion),
            "1. The file does not exist.\n2. Check the path."
        );
        assert_eq!(parse_explanation("  plain text  "), "plain text");
    }
}
