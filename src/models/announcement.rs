//! Announcement row and record structures.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};

/// Number of columns kept from every board row.
pub const ROW_WIDTH: usize = 5;

/// Field names of an [`AnnouncementRecord`], in column order.
pub const FIELD_NAMES: [&str; ROW_WIDTH] = ["id", "title", "author", "viewCount", "postedDate"];

/// Date layout used by the `postedDate` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One positional board row: id, title, author, view count, posted date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct AnnouncementRow([String; ROW_WIDTH]);

impl AnnouncementRow {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        view_count: impl Into<String>,
        posted_date: impl Into<String>,
    ) -> Self {
        Self([
            id.into(),
            title.into(),
            author.into(),
            view_count.into(),
            posted_date.into(),
        ])
    }

    /// Build a row from table cells, keeping the first five.
    ///
    /// Returns `None` when fewer than five cells are present.
    pub fn from_cells<I>(cells: I) -> Option<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cells = cells.into_iter();
        let fields = [
            cells.next()?,
            cells.next()?,
            cells.next()?,
            cells.next()?,
            cells.next()?,
        ];
        Some(Self(fields))
    }

    pub fn id(&self) -> &str {
        &self.0[0]
    }

    pub fn title(&self) -> &str {
        &self.0[1]
    }

    pub fn author(&self) -> &str {
        &self.0[2]
    }

    pub fn view_count(&self) -> &str {
        &self.0[3]
    }

    pub fn posted_date(&self) -> &str {
        &self.0[4]
    }

    /// All five fields in column order.
    pub fn fields(&self) -> &[String; ROW_WIDTH] {
        &self.0
    }

    /// Parsed `postedDate`, if it follows `YYYY-MM-DD`.
    pub fn posted_on(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.posted_date().trim(), DATE_FORMAT).ok()
    }

    /// Format the row for display using a template.
    ///
    /// Supported placeholders:
    /// - `{id}`, `{title}`, `{author}`, `{view_count}`, `{posted_date}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{id}", self.id())
            .replace("{title}", self.title())
            .replace("{author}", self.author())
            .replace("{view_count}", self.view_count())
            .replace("{posted_date}", self.posted_date())
    }

    /// Same as [`format`](Self::format), with the title cut to `max_graphemes`.
    pub fn format_truncated(&self, template: &str, max_graphemes: usize) -> String {
        let mut row = self.clone();
        row.0[1] = truncate_graphemes(self.title(), max_graphemes);
        row.format(template)
    }
}

impl TryFrom<Vec<String>> for AnnouncementRow {
    type Error = AppError;

    fn try_from(fields: Vec<String>) -> Result<Self> {
        let actual = fields.len();
        let fields: [String; ROW_WIDTH] = fields
            .try_into()
            .map_err(|_| AppError::shape(ROW_WIDTH, actual))?;
        Ok(Self(fields))
    }
}

impl From<AnnouncementRow> for Vec<String> {
    fn from(row: AnnouncementRow) -> Self {
        row.0.into()
    }
}

/// A row keyed by field name, as consumed by report writers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub view_count: String,
    pub posted_date: String,
}

impl AnnouncementRecord {
    /// Look up a field by its record name (`viewCount`, not `view_count`).
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries()
            .into_iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    /// `(name, value)` pairs in column order.
    pub fn entries(&self) -> [(&'static str, &str); ROW_WIDTH] {
        [
            (FIELD_NAMES[0], &self.id),
            (FIELD_NAMES[1], &self.title),
            (FIELD_NAMES[2], &self.author),
            (FIELD_NAMES[3], &self.view_count),
            (FIELD_NAMES[4], &self.posted_date),
        ]
    }
}

impl From<&AnnouncementRow> for AnnouncementRecord {
    fn from(row: &AnnouncementRow) -> Self {
        let [id, title, author, view_count, posted_date] = row.fields().clone();
        Self {
            id,
            title,
            author,
            view_count,
            posted_date,
        }
    }
}

/// Keep rows posted within `days` of `today`.
///
/// Rows whose date does not parse are skipped with a warning. A window
/// reaching past the calendar range keeps every dated row.
pub fn filter_recent(
    rows: &[AnnouncementRow],
    today: NaiveDate,
    days: i64,
) -> Vec<&AnnouncementRow> {
    let cutoff = Duration::try_days(days).and_then(|window| today.checked_sub_signed(window));
    rows.iter()
        .filter(|row| match row.posted_on() {
            Some(date) => cutoff.is_none_or(|cutoff| date >= cutoff),
            None => {
                log::warn!(
                    "Skipping announcement {} with malformed date '{}'",
                    row.id(),
                    row.posted_date()
                );
                false
            }
        })
        .collect()
}

fn truncate_graphemes(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
