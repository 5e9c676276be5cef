use crate::error::AppError;
use crate::market::types::{Timeframe, WireCandle};
use reqwest::Client;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type MarketWsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const DEFAULT_HTTP_BASE_URL: &str = "https://api.tradeconsole.example";
pub const DEFAULT_WS_BASE_URL: &str = "wss://api.tradeconsole.example";

/// The market socket is scoped to one (pair, timeframe); changing either
/// means tearing this connection down and opening a new one.
pub fn ws_endpoint(ws_base_url: &str, pair: &str, timeframe: Timeframe) -> String {
    format!(
        "{}/ws/market?pair={}&timeframe={}",
        ws_base_url.trim_end_matches('/'),
        pair,
        timeframe.as_str()
    )
}

fn candles_endpoint(base_url: &str, pair: &str, timeframe: Timeframe, limit: u16) -> String {
    format!(
        "{}/api/market/candles?pair={}&timeframe={}&limit={}",
        base_url.trim_end_matches('/'),
        pair,
        timeframe.as_str(),
        limit
    )
}

pub async fn connect_market_stream(
    ws_base_url: &str,
    pair: &str,
    timeframe: Timeframe,
) -> Result<MarketWsStream, AppError> {
    let (stream, _response) = connect_async(ws_endpoint(ws_base_url, pair, timeframe)).await?;
    Ok(stream)
}

#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    error: String,
}

/// Fetches recent history over REST. The backend returns a plain JSON array
/// of wire candles, oldest first.
pub async fn fetch_candle_history(
    client: &Client,
    base_url: &str,
    pair: &str,
    timeframe: Timeframe,
    limit: u16,
) -> Result<Vec<WireCandle>, AppError> {
    let response = client
        .get(candles_endpoint(base_url, pair, timeframe, limit))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let reason = response
            .json::<BackendErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());
        return Err(AppError::InvalidArgument(format!(
            "candle history request failed: {reason}"
        )));
    }

    let candles = response.json::<Vec<WireCandle>>().await?;
    Ok(candles)
}
