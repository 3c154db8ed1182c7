//! Prompt building utilities for inference requests.
//!
//! Two prompts are produced: one that asks the model to translate a request
//! into a single JSON proposal, and one that asks it to diagnose a command
//! (optionally with its captured error output).

use crate::platform::{Dialect, Platform};

/// Builds prompts for the platform detected at startup.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    platform: Platform,
}

impl PromptBuilder {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Prompt asking for a `{command, explanation, safety}` object.
    pub fn generation_prompt(&self, request: &str) -> String {
        let dialect_rule = match self.platform.dialect() {
            Dialect::PowerShell => "- Use PowerShell commands",
            Dialect::Posix => "- Use bash/POSIX shell commands",
        };

        format!(
            r#"You are a {label} command line expert. Convert this natural language request into a shell command.

User request: {request}

Respond ONLY with a JSON object in this exact format:
{{
    "command": "the actual command to run",
    "explanation": "brief explanation of what the command does",
    "safety": "safe" or "dangerous"
}}

Important:
{dialect_rule}
- Mark commands that delete/modify files as "dangerous"
- Keep commands simple and practical
- Only output the JSON, nothing else"#,
            label = self.platform.expert_label(),
            request = request.trim(),
            dialect_rule = dialect_rule,
        )
    }

    /// Prompt asking what went wrong with `command` and how to fix it.
    ///
    /// `error_output` may be empty, in which case the model is effectively
    /// asked to explain the command itself.
    pub fn explain_prompt(&self, command: &str, error_output: &str) -> String {
        format!(
            "A command failed with an error. Explain what went wrong and suggest a fix.\n\n\
             Shell: {label}\n\
             Command: {command}\n\
             Error: {error}\n\n\
             Provide:\n\
             1. What the error means\n\
             2. Why it happened\n\
             3. How to fix it\n\n\
             Keep it concise and practical.",
            label = self.platform.expert_label(),
            command = command,
            error = error_output.trim_end(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_prompt_posix() {
        let builder = PromptBuilder::new(Platform::from_os("linux"));
        let prompt = builder.generation_prompt("  list all files ");

        assert!(prompt.starts_with("You are a Linux/Unix command line expert."));
        assert!(prompt.contains("User request: list all files\n"));
        assert!(prompt.contains(r#""command": "the actual command to run""#));
        assert!(prompt.contains(r#""safety": "safe" or "dangerous""#));
        assert!(prompt.contains("bash/POSIX"));
        assert!(!prompt.contains("PowerShell"));
        assert!(prompt.ends_with("Only output the JSON, nothing else"));
    }

    #[test]
    fn test_generation_prompt_powershell() {
        let builder = PromptBuilder::new(Platform::from_os("windows"));
        let prompt = builder.generation_prompt("show disk usage");

        assert!(prompt.starts_with("You are a Windows PowerShell command line expert."));
        assert!(prompt.contains("- Use PowerShell commands"));
        assert!(!prompt.contains("bash"));
    }

    #[test]
    fn test_generation_prompt_macos_label() {
        let prompt = PromptBuilder::new(Platform::from_os("macos")).generation_prompt("x");
        assert!(prompt.contains("macOS/Unix command line expert"));
    }

    #[test]
    fn test_explain_prompt_with_error() {
        let builder = PromptBuilder::new(Platform::from_os("linux"));
        let prompt = builder.explain_prompt("cat missing.txt", "cat: missing.txt: No such file or directory\n");

        assert!(prompt.contains("Command: cat missing.txt\n"));
        assert!(prompt.contains("Error: cat: missing.txt: No such file or directory\n"));
        assert!(prompt.contains("3. How to fix it"));
    }

    #[test]
    fn test_explain_prompt_with_empty_error() {
        let builder = PromptBuilder::new(Platform::from_os("linux"));
        let prompt = builder.explain_prompt("tar -xzf a.tgz", "");

        assert!(prompt.contains("Command: tar -xzf a.tgz\n"));
        assert!(prompt.contains("Error: \n"));
    }
}
