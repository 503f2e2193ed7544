// ABOUTME: Turns a raw extractor run into a resolve outcome
// ABOUTME: Heuristic matching on yt-dlp diagnostic text, kept in one place

use crate::error::ResolveError;
use crate::extractor::ExtractionResult;

/// Upper bound on diagnostic text echoed back to callers
pub const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    ContentUnavailable,
    UnsupportedUrl,
    NoUrlFound,
    ExtractionFailed(String),
    Timeout,
    InternalError(String),
}

impl Outcome {
    pub fn into_result(self) -> Result<String, ResolveError> {
        match self {
            Outcome::Success(url) => Ok(url),
            Outcome::ContentUnavailable => Err(ResolveError::ContentUnavailable),
            Outcome::UnsupportedUrl => Err(ResolveError::UnsupportedUrl),
            Outcome::NoUrlFound => Err(ResolveError::NoUrlFound),
            Outcome::ExtractionFailed(detail) => Err(ResolveError::ExtractionFailed(detail)),
            Outcome::Timeout => Err(ResolveError::Timeout),
            Outcome::InternalError(detail) => Err(ResolveError::Internal(detail)),
        }
    }
}

pub fn classify(result: &ExtractionResult) -> Outcome {
    if result.timed_out {
        return Outcome::Timeout;
    }

    if let Some(message) = &result.process_error {
        return Outcome::InternalError(truncate_chars(message, MAX_ERROR_CHARS).to_string());
    }

    if !result.succeeded() {
        let error_text = error_text(result);

        // yt-dlp wording, e.g. "Private video" or "Sign in to confirm your age"
        if error_text.contains("Private video") || error_text.contains("Sign in") {
            return Outcome::ContentUnavailable;
        }
        if error_text.contains("Unsupported URL") || error_text.contains("No video") {
            return Outcome::UnsupportedUrl;
        }
        return Outcome::ExtractionFailed(truncate_chars(error_text, MAX_ERROR_CHARS).to_string());
    }

    let url = result.stdout.trim();
    if url.is_empty() {
        Outcome::NoUrlFound
    } else {
        Outcome::Success(url.to_string())
    }
}

fn error_text(result: &ExtractionResult) -> &str {
    if !result.stderr.is_empty() {
        &result.stderr
    } else if !result.stdout.is_empty() {
        &result.stdout
    } else {
        "Unknown error"
    }
}

/// Longest prefix of `s` holding at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
