use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_PAIR: &str = "UZS-USD";
pub const DEFAULT_TIMEFRAME: Timeframe = Timeframe::M1;
pub const DEFAULT_STARTUP_MODE: StartupMode = StartupMode::LiveFirst;
pub const DEFAULT_HISTORY_LIMIT: u16 = 200;
pub const DEFAULT_ANIMATION_INTERVAL_MS: u64 = 16;
pub const MIN_ANIMATION_INTERVAL_MS: u64 = 8;
pub const MAX_ANIMATION_INTERVAL_MS: u64 = 1_000;
pub const MIN_HISTORY_LIMIT: u16 = 1;
pub const MAX_HISTORY_LIMIT: u16 = 200;

/// Hard cap on every cached candle series; oldest entries are evicted first.
pub const SERIES_CAP: usize = 200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Live,
    Stopped,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "10m")]
    M10,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M10 => "10m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
        }
    }

    pub fn parse_str(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(Self::M1),
            "5m" => Ok(Self::M5),
            "10m" => Ok(Self::M10),
            "15m" => Ok(Self::M15),
            "30m" => Ok(Self::M30),
            "1h" => Ok(Self::H1),
            other => Err(AppError::InvalidArgument(format!(
                "unsupported timeframe '{other}'"
            ))),
        }
    }

    pub fn duration_secs(self) -> i64 {
        match self {
            Self::M1 => 60,
            Self::M5 => 300,
            Self::M10 => 600,
            Self::M15 => 900,
            Self::M30 => 1_800,
            Self::H1 => 3_600,
        }
    }
}

/// Static per-pair price transform parameters. Loaded once at startup and
/// immutable for the process lifetime.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairConfig {
    pub symbol: String,
    pub display_decimals: u32,
    pub api_decimals: u32,
    pub invert_for_api: bool,
}

#[derive(Debug, Clone)]
pub struct PairRegistry {
    pairs: HashMap<String, PairConfig>,
}

impl PairRegistry {
    pub fn new(configs: impl IntoIterator<Item = PairConfig>) -> Self {
        let pairs = configs
            .into_iter()
            .map(|config| (config.symbol.clone(), config))
            .collect();
        Self { pairs }
    }

    /// The pairs the hosted backend serves. UZS-USD is quoted inverted on the
    /// wire (a sub-unit rate) and shown as ~12k on screen.
    pub fn builtin() -> Self {
        Self::new([
            PairConfig {
                symbol: "UZS-USD".to_string(),
                display_decimals: 2,
                api_decimals: 11,
                invert_for_api: true,
            },
            PairConfig {
                symbol: "XAUUSD".to_string(),
                display_decimals: 2,
                api_decimals: 2,
                invert_for_api: false,
            },
            PairConfig {
                symbol: "BTCUSD".to_string(),
                display_decimals: 2,
                api_decimals: 2,
                invert_for_api: false,
            },
            PairConfig {
                symbol: "EURUSD".to_string(),
                display_decimals: 5,
                api_decimals: 5,
                invert_for_api: false,
            },
        ])
    }

    pub fn get(&self, symbol: &str) -> Result<&PairConfig, AppError> {
        self.pairs
            .get(symbol)
            .ok_or_else(|| AppError::UnknownPair(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.pairs.contains_key(symbol)
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.pairs.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

/// A candle in display orientation. `time` is unix seconds and unique within
/// a series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// A candle exactly as received from the backend: API orientation, decimal
/// strings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WireCandle {
    pub time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

/// Latest bid/ask in display orientation. Replaced wholesale on every quote
/// message; no history is kept.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplayQuote {
    pub bid: f64,
    pub ask: f64,
    pub spread: f64,
    pub ts: i64,
}

/// Inbound socket frames. The backend envelope carries extra fields (`pair`,
/// `timeframe`, `ts`) which serde ignores here.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamMessage {
    Snapshot {
        candles: Vec<WireCandle>,
    },
    Candle {
        candle: WireCandle,
    },
    Quote {
        bid: String,
        ask: String,
        spread: String,
        ts: i64,
    },
}

pub fn parse_stream_message(payload: &mut [u8]) -> Result<StreamMessage, AppError> {
    let message: StreamMessage = simd_json::serde::from_slice(payload)?;
    Ok(message)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StartupMode {
    LiveFirst,
    HistoryFirst,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartStreamArgs {
    pub pair: Option<String>,
    pub timeframe: Option<Timeframe>,
    pub startup_mode: Option<StartupMode>,
    pub history_limit: Option<u16>,
    pub animate: Option<bool>,
    pub animation_interval_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub pair: String,
    pub timeframe: Timeframe,
    pub startup_mode: StartupMode,
    pub history_limit: u16,
    pub animate: bool,
    pub animation_interval_ms: u64,
}

impl StartStreamArgs {
    pub fn normalize(self, registry: &PairRegistry) -> Result<StreamConfig, AppError> {
        let pair = self
            .pair
            .unwrap_or_else(|| DEFAULT_PAIR.to_string())
            .trim()
            .to_ascii_uppercase();
        if !registry.contains(&pair) {
            return Err(AppError::UnknownPair(pair));
        }

        let history_limit = self.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if !(MIN_HISTORY_LIMIT..=MAX_HISTORY_LIMIT).contains(&history_limit) {
            return Err(AppError::InvalidArgument(format!(
                "historyLimit must be between {MIN_HISTORY_LIMIT} and {MAX_HISTORY_LIMIT}"
            )));
        }

        let animation_interval_ms = self
            .animation_interval_ms
            .unwrap_or(DEFAULT_ANIMATION_INTERVAL_MS);
        if !(MIN_ANIMATION_INTERVAL_MS..=MAX_ANIMATION_INTERVAL_MS)
            .contains(&animation_interval_ms)
        {
            return Err(AppError::InvalidArgument(format!(
                "animationIntervalMs must be between {MIN_ANIMATION_INTERVAL_MS} and {MAX_ANIMATION_INTERVAL_MS}"
            )));
        }

        Ok(StreamConfig {
            pair,
            timeframe: self.timeframe.unwrap_or(DEFAULT_TIMEFRAME),
            startup_mode: self.startup_mode.unwrap_or(DEFAULT_STARTUP_MODE),
            history_limit,
            animate: self.animate.unwrap_or(true),
            animation_interval_ms,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSession {
    pub running: bool,
    pub pair: String,
    pub timeframe: Timeframe,
    pub startup_mode: StartupMode,
    pub history_limit: u16,
    pub animate: bool,
    pub animation_interval_ms: u64,
}

impl StreamSession {
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            running: true,
            pair: config.pair.clone(),
            timeframe: config.timeframe,
            startup_mode: config.startup_mode,
            history_limit: config.history_limit,
            animate: config.animate,
            animation_interval_ms: config.animation_interval_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStopResult {
    pub stopped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamStatusSnapshot {
    pub state: ConnectionState,
    pub pair: String,
    pub timeframe: Timeframe,
    pub last_time: Option<i64>,
    pub last_price: Option<f64>,
    pub reason: Option<String>,
}

impl StreamStatusSnapshot {
    pub fn stopped(pair: String, reason: Option<String>) -> Self {
        Self {
            state: ConnectionState::Stopped,
            pair,
            timeframe: DEFAULT_TIMEFRAME,
            last_time: None,
            last_price: None,
            reason,
        }
    }
}
