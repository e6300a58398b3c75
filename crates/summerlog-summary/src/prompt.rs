//! Prompt construction

use std::fmt::Write;

use crate::SummaryRequest;

pub const SYSTEM_PROMPT: &str =
    "You are a concise, practical SRE assistant who provides summaries in Markdown.";

/// System and user messages for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Last `max_chars` characters of `text`, never splitting a character.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((start, _)) => &text[start..],
        None => text,
    }
}

/// Build the prompt from redacted bundles, keeping the newest `max_log_chars`
/// characters of each container's logs.
pub fn build_prompt(request: &SummaryRequest, max_log_chars: usize) -> Prompt {
    let mut user = format!(
        "You are an expert SRE assistant. Your task is to analyze the following Docker \
         container logs from {} and provide a clear, actionable summary.\n\n",
        request.window.describe()
    );

    user.push_str(
        "Please structure your response in Markdown as follows:\n\n\
         ### 1. Overall Health Summary\n\
         - A brief, one-sentence summary of the system's health. If everything is normal, \
         state that clearly.\n\n\
         ### 2. Key Events & Issues\n\
         - Use a bulleted list to describe significant events, warnings, or errors.\n\
         - For each item, name the affected container and the severity.\n\
         - **IMPORTANT**: Wrap the severity level in a span tag with a class matching \
         the severity:\n\
           - HIGH: `<span class=\"severity-high\">HIGH</span>`\n\
           - MEDIUM: `<span class=\"severity-medium\">MEDIUM</span>`\n\
           - LOW: `<span class=\"severity-low\">LOW</span>`\n\n\
         ### 3. Recommendations & Next Steps\n\
         - For each issue identified, provide a numbered list of recommended actions to \
         investigate or resolve it.\n\
         - If no issues are found, recommend continued monitoring.\n\n\
         Sensitive values have been replaced with [REDACTED:...] placeholders; do not \
         speculate about them.\n\n",
    );

    if !request.failed.is_empty() {
        let _ = writeln!(
            user,
            "Logs could not be collected from: {}. Mention this in the summary.\n",
            request.failed.join(", ")
        );
    }

    user.push_str("Here are the logs:\n");
    for bundle in &request.bundles {
        let logs = tail_chars(bundle.text(), max_log_chars);
        let _ = write!(
            user,
            "\n## Container: {}\n\n```\n{}\n```\n",
            bundle.container(),
            logs.trim_end()
        );
    }

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}
