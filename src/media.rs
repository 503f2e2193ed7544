// ABOUTME: Container type inference from a resolved media URL
// ABOUTME: Substring heuristic over the URL, defaulting to mp4

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Mp4,
    M3u8,
    Webm,
    Mov,
}

impl MediaType {
    /// First match wins: `.m3u8`, then `.webm`, then `.mov`.
    pub fn infer(url: &str) -> Self {
        let url = url.to_lowercase();
        if url.contains(".m3u8") {
            MediaType::M3u8
        } else if url.contains(".webm") {
            MediaType::Webm
        } else if url.contains(".mov") {
            MediaType::Mov
        } else {
            MediaType::Mp4
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Mp4 => "mp4",
            MediaType::M3u8 => "m3u8",
            MediaType::Webm => "webm",
            MediaType::Mov => "mov",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
