//! Typed view of the detection service's nested response.
//!
//! The service answers with result-sets → pages → blocks → lines → words.
//! Every level defaults to empty, and the single validated-parse step fails
//! closed: any missing key, wrong type, or empty list flattens to an empty
//! string rather than surfacing a parse error.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
struct BatchAnalyzeResponse {
    #[serde(default)]
    results: Vec<AnalyzeResult>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    results: Vec<FeatureResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureResult {
    #[serde(default)]
    text_detection: TextAnnotation,
}

#[derive(Debug, Default, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Default, Deserialize)]
struct Page {
    #[serde(default)]
    blocks: Vec<Block>,
}

#[derive(Debug, Default, Deserialize)]
struct Block {
    #[serde(default)]
    lines: Vec<Line>,
}

#[derive(Debug, Default, Deserialize)]
struct Line {
    #[serde(default)]
    words: Vec<Word>,
}

#[derive(Debug, Default, Deserialize)]
struct Word {
    #[serde(default)]
    text: String,
}

/// Flatten a raw detection response into ordered text.
///
/// Word texts are joined with single spaces per line, lines with newlines
/// across all blocks of the first page, and the result is trimmed.
pub fn flatten_text(raw: &Value) -> String {
    let parsed: BatchAnalyzeResponse = match serde_json::from_value(raw.clone()) {
        Ok(parsed) => parsed,
        Err(_) => return String::new(),
    };

    let Some(page) = parsed
        .results
        .first()
        .and_then(|set| set.results.first())
        .and_then(|feature| feature.text_detection.pages.first())
    else {
        return String::new();
    };

    let mut lines = Vec::new();
    for block in &page.blocks {
        for line in &block.lines {
            let words: Vec<&str> = line.words.iter().map(|w| w.text.as_str()).collect();
            lines.push(words.join(" "));
        }
    }
    lines.join("\n").trim().to_string()
}
