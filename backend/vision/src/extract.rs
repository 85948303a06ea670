//! Tolerant field rules over recognized text.
//!
//! Rules are independent and order-insensitive; each returns `None` on
//! no-match. The only cross-rule dependency is the task-name fallback, which
//! derives a name from the task-identifier line when the label is absent.

use once_cell::sync::Lazy;
use regex::Regex;
use verstbot_core::ExtractedFields;

/// Bracketed numerator/denominator task reference, e.g. `[12/50]`.
static TASK_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\s*(\d+\s*/\s*\d+)\s*\]").unwrap());

/// Any bracketed token, used when the numeric form is absent.
static ANY_BRACKET: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\[\]\n]+)\]").unwrap());

/// Text after a `Задание:`-style label, up to the next break or punctuation.
static TASK_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)задани[ея]\s*[:№-]?\s*([^\n.,;:()\[\]]+)").unwrap());

/// `Время:`-style label followed by an hours/minutes figure.
static ELAPSED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)время[^0-9\n]*((?:\d{1,2}\s*ч[а-яё.]*\s*)?\d{1,3}\s*мин[а-яё.]*|\d{1,2}:\d{2}|\d{1,2}\s*ч[а-яё.]*)",
    )
    .unwrap()
});

/// Parenthesized distance, preferred when present: `(5 км)`.
static KM_PAREN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*(\d+(?:[.,]\d+)?)\s*[-\s]*км\.?\s*\)").unwrap());

/// Bare distance: `5 км`.
static KM_BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*[-\s]*км").unwrap());

/// Run every field rule over `text`. Total: rules that do not match resolve
/// to `None`, and no input can fail.
pub fn extract_fields(text: &str) -> ExtractedFields {
    let task_id = TASK_REF
        .captures(text)
        .map(|c| compact_id(&c[1]))
        .or_else(|| ANY_BRACKET.captures(text).map(|c| c[1].trim().to_string()));

    let task_name = TASK_NAME
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| name_from_id_line(text));

    let elapsed = ELAPSED.captures(text).map(|c| c[1].trim().to_string());

    let distance_km = KM_PAREN
        .captures(text)
        .or_else(|| KM_BARE.captures(text))
        .map(|c| c[1].to_string());

    ExtractedFields {
        task_id,
        task_name,
        elapsed,
        distance_km,
    }
}

/// `12 / 50` and `12/50` are the same reference.
fn compact_id(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Fallback naming: the task-identifier line minus the bracketed token.
fn name_from_id_line(text: &str) -> Option<String> {
    for line in text.lines() {
        let Some(found) = TASK_REF.find(line).or_else(|| ANY_BRACKET.find(line)) else {
            continue;
        };
        let rest = format!("{}{}", &line[..found.start()], &line[found.end()..]);
        let cleaned = rest
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '.' | ',' | ';'))
            .to_string();
        if !cleaned.is_empty() {
            return Some(cleaned);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_task_sheet_extracts_all_fields() {
        let fields = extract_fields("[12/50] Задание: Доставка (5 км)");
        assert_eq!(fields.task_id.as_deref(), Some("12/50"));
        assert_eq!(fields.task_name.as_deref(), Some("Доставка"));
        assert_eq!(fields.distance_km.as_deref(), Some("5"));
    }

    #[test]
    fn label_free_text_resolves_every_field_to_none() {
        let fields = extract_fields("обычное сообщение без меток");
        assert!(fields.is_empty());

        assert!(extract_fields("").is_empty());
    }

    #[test]
    fn parenthesized_distance_beats_bare_distance() {
        let fields = extract_fields("осталось 3 км до точки (7 км)");
        assert_eq!(fields.distance_km.as_deref(), Some("7"));
    }

    #[test]
    fn bare_distance_matches_alone() {
        let fields = extract_fields("Пробег 12 км");
        assert_eq!(fields.distance_km.as_deref(), Some("12"));
    }

    #[test]
    fn fractional_distance_keeps_separator() {
        let fields = extract_fields("маршрут (2,5 км)");
        assert_eq!(fields.distance_km.as_deref(), Some("2,5"));
    }

    #[test]
    fn numeric_reference_beats_generic_bracket() {
        let fields = extract_fields("[срочно] этап [3/9]");
        assert_eq!(fields.task_id.as_deref(), Some("3/9"));
    }

    #[test]
    fn generic_bracket_is_the_fallback_id() {
        let fields = extract_fields("Наряд [АБВ-12] выдан");
        assert_eq!(fields.task_id.as_deref(), Some("АБВ-12"));
    }

    #[test]
    fn spaced_reference_is_compacted() {
        let fields = extract_fields("[ 12 / 50 ]");
        assert_eq!(fields.task_id.as_deref(), Some("12/50"));
    }

    #[test]
    fn name_falls_back_to_identifier_line() {
        let fields = extract_fields("[4/10] Самокат\nВремя: 45 мин");
        assert_eq!(fields.task_name.as_deref(), Some("Самокат"));
    }

    #[test]
    fn elapsed_hours_and_minutes() {
        let fields = extract_fields("Время: 1 ч 20 мин");
        assert_eq!(fields.elapsed.as_deref(), Some("1 ч 20 мин"));
    }

    #[test]
    fn elapsed_minutes_only_with_wordy_label() {
        let fields = extract_fields("Время в пути — 45 мин");
        assert_eq!(fields.elapsed.as_deref(), Some("45 мин"));
    }

    #[test]
    fn elapsed_clock_style() {
        let fields = extract_fields("Время 1:25");
        assert_eq!(fields.elapsed.as_deref(), Some("1:25"));
    }

    #[test]
    fn distance_without_km_token_stays_unset() {
        let fields = extract_fields("[2/2] Задание: Разгрузка");
        assert_eq!(fields.task_id.as_deref(), Some("2/2"));
        assert!(fields.distance_km.is_none());
    }
}
