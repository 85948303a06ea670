//! Template store over a spreadsheet's value grid.
//!
//! The sheet's first row is a header row; every following row is one canned
//! reply. Columns are located by header name so the sheet can be reordered
//! without touching the bot.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use verstbot_auth::{AuthError, TokenCache};
use verstbot_core::TemplateRow;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const SHEET_RANGE: &str = "A1:E";

const KEYWORDS_COLUMN: &str = "Ключевые слова";
const CATEGORY_COLUMN: &str = "Категория";
const TEMPLATE_COLUMN: &str = "Шаблон (текст сообщения)";
const LINK_COLUMN: &str = "Ссылка";

/// Template store transport/status failures.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("template store unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("template store returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Spreadsheet-backed store of canned reply templates.
pub struct TemplateStore {
    http: Client,
    tokens: Arc<TokenCache>,
    endpoint: String,
    sheet_id: String,
}

impl TemplateStore {
    pub fn new(
        tokens: Arc<TokenCache>,
        endpoint: impl Into<String>,
        sheet_id: impl Into<String>,
    ) -> Result<Self, SheetError> {
        let http = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            http,
            tokens,
            endpoint: endpoint.into(),
            sheet_id: sheet_id.into(),
        })
    }

    /// Fetch the whole sheet and map it into rows, in sheet order.
    pub async fn list_records(&self) -> Result<Vec<TemplateRow>, SheetError> {
        let token = self.tokens.bearer_token().await?;
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.endpoint, self.sheet_id, SHEET_RANGE
        );

        let response = self.http.get(&url).bearer_auth(&token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let grid: ValueRange = response.json().await?;
        let records = records_from_values(&grid.values);
        debug!(rows = records.len(), "template sheet fetched");
        Ok(records)
    }

    /// Rows whose keyword column contains `keyword`, case-insensitively, in
    /// sheet order.
    pub async fn find(&self, keyword: &str) -> Result<Vec<TemplateRow>, SheetError> {
        let records = self.list_records().await?;
        Ok(records
            .into_iter()
            .filter(|row| keyword_matches(row, keyword))
            .collect())
    }
}

/// Case-insensitive substring match against the keyword column.
pub fn keyword_matches(row: &TemplateRow, keyword: &str) -> bool {
    row.keywords.to_lowercase().contains(&keyword.to_lowercase())
}

/// Map a raw value grid (header row + data rows) into template rows.
///
/// Missing trailing cells read as empty; an empty link cell maps to `None`.
pub fn records_from_values(values: &[Vec<String>]) -> Vec<TemplateRow> {
    let Some((headers, rows)) = values.split_first() else {
        return Vec::new();
    };

    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let keywords_at = column(KEYWORDS_COLUMN);
    let category_at = column(CATEGORY_COLUMN);
    let template_at = column(TEMPLATE_COLUMN);
    let link_at = column(LINK_COLUMN);

    let cell = |row: &[String], at: Option<usize>| {
        at.and_then(|i| row.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    rows.iter()
        .map(|row| {
            let link = cell(row, link_at);
            TemplateRow {
                keywords: cell(row, keywords_at),
                category: cell(row, category_at),
                template: cell(row, template_at),
                link: (!link.is_empty()).then_some(link),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn sample_grid() -> Vec<Vec<String>> {
        grid(&[
            &[
                "Ключевые слова",
                "Категория",
                "Шаблон (текст сообщения)",
                "Ссылка",
            ],
            &["оплата, счёт", "Финансы", "Оплата проходит до конца дня.", ""],
            &["доставка", "Логистика", "Курьер уже в пути.", "https://example.com/track"],
            &["оплата наличными", "Финансы", "Наличные принимает только офис.", ""],
        ])
    }

    #[test]
    fn rows_map_in_sheet_order() {
        let records = records_from_values(&sample_grid());
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].category, "Финансы");
        assert_eq!(records[1].link.as_deref(), Some("https://example.com/track"));
        assert_eq!(records[2].template, "Наличные принимает только офис.");
    }

    #[test]
    fn keyword_matches_two_rows_in_order() {
        let records = records_from_values(&sample_grid());
        let hits: Vec<_> = records
            .iter()
            .filter(|row| keyword_matches(row, "оплата"))
            .collect();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].template, "Оплата проходит до конца дня.");
        assert_eq!(hits[1].template, "Наличные принимает только офис.");
    }

    #[test]
    fn matching_ignores_case() {
        let records = records_from_values(&sample_grid());
        assert!(keyword_matches(&records[1], "ДОСТАВКА"));
        assert!(!keyword_matches(&records[1], "оплата"));
    }

    #[test]
    fn ragged_rows_read_missing_cells_as_empty() {
        let mut values = sample_grid();
        values.push(vec!["пропуск".to_string()]);

        let records = records_from_values(&values);
        let last = records.last().unwrap();
        assert_eq!(last.keywords, "пропуск");
        assert_eq!(last.template, "");
        assert!(last.link.is_none());
    }

    #[test]
    fn reordered_columns_still_map_by_header() {
        let values = grid(&[
            &["Шаблон (текст сообщения)", "Ключевые слова"],
            &["Ответ", "ключ"],
        ]);
        let records = records_from_values(&values);
        assert_eq!(records[0].template, "Ответ");
        assert_eq!(records[0].keywords, "ключ");
        assert_eq!(records[0].category, "");
    }

    #[test]
    fn empty_grid_yields_no_records() {
        assert!(records_from_values(&[]).is_empty());
        assert!(records_from_values(&grid(&[&["Ключевые слова"]])).is_empty());
    }
}
