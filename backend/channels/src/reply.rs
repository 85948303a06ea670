//! Outbound reply rendering.
//!
//! Replies use Telegram's HTML markup mode; everything that originates from
//! recognized text or the template sheet is escaped.

use teloxide::utils::html;
use verstbot_core::{ExtractedFields, NOT_FOUND, TemplateRow};

/// Telegram caps messages at 4096 characters; leave room for the summary
/// header above the recognized-text block.
const RECOGNIZED_TEXT_LIMIT: usize = 3000;

pub const GREETING: &str = "Привет! Я ассистент-бот. Пришлите фото задания \
или используйте команду /template <ключевое слово>.";

pub const RECOGNITION_FAILED: &str =
    "Не удалось распознать текст на фото. Попробуйте отправить его ещё раз.";

pub const TEMPLATE_NOT_FOUND: &str = "Шаблон не найден.";

pub const TEMPLATE_USAGE: &str = "Укажите ключевое слово: /template оплата";

pub const TEMPLATE_LOOKUP_FAILED: &str =
    "Не удалось открыть базу шаблонов. Попробуйте позже.";

/// Render the photo-event summary: the four extracted fields (sentinel for
/// misses) followed by the recognized text in a code block.
pub fn render_summary(fields: &ExtractedFields, recognized: &str) -> String {
    let field = |value: &Option<String>| match value {
        Some(v) => html::escape(v),
        None => NOT_FOUND.to_string(),
    };
    let distance = match &fields.distance_km {
        Some(km) => format!("{} км", html::escape(km)),
        None => NOT_FOUND.to_string(),
    };

    let mut out = format!(
        "<b>Задание:</b> {}\n<b>Название:</b> {}\n<b>Время:</b> {}\n<b>Километраж:</b> {}",
        field(&fields.task_id),
        field(&fields.task_name),
        field(&fields.elapsed),
        distance,
    );

    let recognized = recognized.trim();
    if !recognized.is_empty() {
        out.push_str("\n\n<b>Распознанный текст:</b>\n<code>");
        out.push_str(&html::escape(&clipped(recognized, RECOGNIZED_TEXT_LIMIT)));
        out.push_str("</code>");
    }
    out
}

/// Render one template row: bold category, body, optional link.
pub fn render_template(row: &TemplateRow) -> String {
    let mut out = String::new();
    if !row.category.is_empty() {
        out.push_str("<b>");
        out.push_str(&html::escape(&row.category));
        out.push_str("</b>\n");
    }
    out.push_str(&html::escape(&row.template));
    if let Some(link) = &row.link {
        out.push('\n');
        out.push_str(&html::escape(link));
    }
    out
}

/// Cut `text` to at most `limit` characters, marking the cut with an ellipsis.
fn clipped(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        None => text.to_string(),
        Some((end, _)) => format!("{}…", &text[..end]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_renders_all_fields() {
        let fields = ExtractedFields {
            task_id: Some("12/50".into()),
            task_name: Some("Доставка".into()),
            elapsed: Some("1 ч 20 мин".into()),
            distance_km: Some("5".into()),
        };
        let out = render_summary(&fields, "[12/50] Задание: Доставка (5 км)");
        assert!(out.contains("<b>Задание:</b> 12/50"));
        assert!(out.contains("<b>Название:</b> Доставка"));
        assert!(out.contains("<b>Километраж:</b> 5 км"));
        assert!(out.contains("<code>"));
    }

    #[test]
    fn missing_fields_render_the_sentinel() {
        let out = render_summary(&ExtractedFields::default(), "просто текст");
        assert_eq!(out.matches(NOT_FOUND).count(), 4);
    }

    #[test]
    fn summary_without_text_omits_the_code_block() {
        let out = render_summary(&ExtractedFields::default(), "   ");
        assert!(!out.contains("<code>"));
    }

    #[test]
    fn recognized_text_is_escaped() {
        let out = render_summary(&ExtractedFields::default(), "a <b> & c");
        assert!(out.contains("a &lt;b&gt; &amp; c"));
    }

    #[test]
    fn long_recognized_text_is_clipped() {
        let long = "я".repeat(5000);
        let out = render_summary(&ExtractedFields::default(), &long);
        assert!(out.contains('…'));
        assert!(out.chars().count() < 3500);
    }

    #[test]
    fn template_with_category_and_link() {
        let row = TemplateRow {
            keywords: "оплата".into(),
            category: "Финансы".into(),
            template: "Оплата проходит до конца дня.".into(),
            link: Some("https://example.com".into()),
        };
        let out = render_template(&row);
        assert_eq!(
            out,
            "<b>Финансы</b>\nОплата проходит до конца дня.\nhttps://example.com"
        );
    }

    #[test]
    fn template_without_extras_is_just_the_body() {
        let row = TemplateRow {
            keywords: "к".into(),
            category: String::new(),
            template: "Ответ".into(),
            link: None,
        };
        assert_eq!(render_template(&row), "Ответ");
    }
}
