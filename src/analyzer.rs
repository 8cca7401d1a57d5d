use crate::model::LogAnalysis;

const ERROR_TERMS: &[&str] = &["error", "failed", "fatal", "exception"];
const WARNING_TERMS: &[&str] = &["warning", "warn"];

const SUGGEST_MEMORY: &str = "Consider increasing memory allocation";
const SUGGEST_TIME_LIMIT: &str = "Consider increasing time limit for the job";
const SUGGEST_KILLED: &str = "Job was killed - check resource limits and usage";

/// First 10 matching lines per category; enough to point at the failure
/// without shipping the whole log back.
const EXCERPT_CAP: usize = 10;
const PREVIEW_CHARS: usize = 5000;

/// Single linear pass over the decoded log text. Case-insensitive substring
/// checks only; a line may land in both the error and warning lists, and
/// every suggestion trigger is evaluated independently per line.
pub fn analyze(file_name: &str, content: &str) -> LogAnalysis {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut suggestions: Vec<String> = Vec::new();

    for (i, line) in content.split('\n').enumerate() {
        let line_no = i + 1;
        let lower = line.to_lowercase();

        if errors.len() < EXCERPT_CAP && ERROR_TERMS.iter().any(|t| lower.contains(t)) {
            errors.push(format!("Line {}: {}", line_no, line.trim()));
        }
        if warnings.len() < EXCERPT_CAP && WARNING_TERMS.iter().any(|t| lower.contains(t)) {
            warnings.push(format!("Line {}: {}", line_no, line.trim()));
        }

        if lower.contains("out of memory") || lower.contains("oom") {
            push_unique(&mut suggestions, SUGGEST_MEMORY);
        }
        if lower.contains("timeout") || lower.contains("time limit") {
            push_unique(&mut suggestions, SUGGEST_TIME_LIMIT);
        }
        if lower.contains("killed") {
            push_unique(&mut suggestions, SUGGEST_KILLED);
        }
    }

    let (preview, truncated) = preview_chars(content, PREVIEW_CHARS);

    LogAnalysis {
        file_name: file_name.to_string(),
        file_size: content.len(),
        line_count: content.split('\n').count(),
        content: preview,
        truncated,
        errors,
        warnings,
        suggestions,
    }
}

fn push_unique(suggestions: &mut Vec<String>, suggestion: &str) {
    if !suggestions.iter().any(|s| s == suggestion) {
        suggestions.push(suggestion.to_string());
    }
}

/// First `limit` characters (not bytes) of the raw text.
fn preview_chars(content: &str, limit: usize) -> (String, bool) {
    match content.char_indices().nth(limit) {
        Some((byte_idx, _)) => (content[..byte_idx].to_string(), true),
        None => (content.to_string(), false),
    }
}
