use crate::error::AppError;
use crate::market::types::{PairRegistry, Timeframe, DEFAULT_PAIR, DEFAULT_TIMEFRAME};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_THEME: &str = "dark";
pub const DEFAULT_LOCALE: &str = "en";

fn now_unix_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_millis().min(i64::MAX as u128) as i64,
        Err(_) => 0,
    }
}

/// The persisted slice of UI state: what the original kept in cookies and
/// localStorage, now stored through an explicit adapter.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UiPreferencesSnapshot {
    pub theme: String,
    pub locale: String,
    pub pair: String,
    pub timeframe: Timeframe,
    pub updated_at_ms: i64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SaveUiPreferencesArgs {
    pub theme: Option<String>,
    pub locale: Option<String>,
    pub pair: Option<String>,
    pub timeframe: Option<Timeframe>,
}

#[derive(Debug, Clone)]
pub struct NormalizedUiPreferences {
    pub theme: String,
    pub locale: String,
    pub pair: String,
    pub timeframe: Timeframe,
}

impl SaveUiPreferencesArgs {
    pub fn normalize(self, registry: &PairRegistry) -> Result<NormalizedUiPreferences, AppError> {
        let theme = self
            .theme
            .unwrap_or_else(|| DEFAULT_THEME.to_string())
            .trim()
            .to_ascii_lowercase();
        if theme != "light" && theme != "dark" {
            return Err(AppError::InvalidArgument(
                "theme must be 'light' or 'dark'".to_string(),
            ));
        }

        let locale = self
            .locale
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
            .trim()
            .to_ascii_lowercase();
        if locale.is_empty() || !locale.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-') {
            return Err(AppError::InvalidArgument(
                "locale must be a non-empty language tag".to_string(),
            ));
        }

        let pair = self
            .pair
            .unwrap_or_else(|| DEFAULT_PAIR.to_string())
            .trim()
            .to_ascii_uppercase();
        if !registry.contains(&pair) {
            return Err(AppError::UnknownPair(pair));
        }

        Ok(NormalizedUiPreferences {
            theme,
            locale,
            pair,
            timeframe: self.timeframe.unwrap_or(DEFAULT_TIMEFRAME),
        })
    }
}

fn map_preferences_row(row: &sqlx::sqlite::SqliteRow) -> Result<UiPreferencesSnapshot, AppError> {
    let timeframe_raw: String = row.try_get("timeframe")?;

    Ok(UiPreferencesSnapshot {
        theme: row.try_get("theme")?,
        locale: row.try_get("locale")?,
        pair: row.try_get("pair")?,
        timeframe: Timeframe::parse_str(&timeframe_raw)?,
        updated_at_ms: row.try_get("updated_at_ms")?,
    })
}

async fn ensure_preferences_seed(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query(
        "INSERT OR IGNORE INTO ui_preferences (id, theme, locale, pair, timeframe, updated_at_ms) VALUES (1, ?, ?, ?, ?, ?)",
    )
    .bind(DEFAULT_THEME)
    .bind(DEFAULT_LOCALE)
    .bind(DEFAULT_PAIR)
    .bind(DEFAULT_TIMEFRAME.as_str())
    .bind(now_unix_ms())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_ui_preferences(pool: &SqlitePool) -> Result<UiPreferencesSnapshot, AppError> {
    ensure_preferences_seed(pool).await?;

    let row = sqlx::query(
        "SELECT theme, locale, pair, timeframe, updated_at_ms FROM ui_preferences WHERE id = 1",
    )
    .fetch_one(pool)
    .await?;

    map_preferences_row(&row)
}

pub async fn save_ui_preferences(
    pool: &SqlitePool,
    registry: &PairRegistry,
    args: SaveUiPreferencesArgs,
) -> Result<UiPreferencesSnapshot, AppError> {
    let normalized = args.normalize(registry)?;

    sqlx::query(
        "INSERT INTO ui_preferences (id, theme, locale, pair, timeframe, updated_at_ms) VALUES (1, ?, ?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET theme=excluded.theme, locale=excluded.locale, pair=excluded.pair, timeframe=excluded.timeframe, updated_at_ms=excluded.updated_at_ms",
    )
    .bind(&normalized.theme)
    .bind(&normalized.locale)
    .bind(&normalized.pair)
    .bind(normalized.timeframe.as_str())
    .bind(now_unix_ms())
    .execute(pool)
    .await?;

    get_ui_preferences(pool).await
}
