use crate::market::animate::synthetic_frame;
use crate::market::backend::{connect_market_stream, fetch_candle_history};
use crate::market::events::{EventBus, MarketEvent};
use crate::market::reconcile::{ApplyOutcome, SeriesCache};
use crate::market::transform::{display_spread, to_display_candle, to_display_quote};
use crate::market::types::{
    parse_stream_message, Candle, ConnectionState, DisplayQuote, PairConfig, StartupMode,
    StreamConfig, StreamMessage, StreamStatusSnapshot, Timeframe,
};
use futures_util::StreamExt;
use parking_lot::Mutex;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Connection endpoints resolved from the application settings at stream
/// start; the stream never reads ambient globals.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub http_base_url: String,
    pub ws_base_url: String,
}

/// Everything the socket handler and the animation tick mutate. Both run
/// under this one mutex, so the series cache never sees interleaved writes.
#[derive(Debug, Default)]
pub struct SharedMarketState {
    pub series: SeriesCache,
    pub last_quote: Option<DisplayQuote>,
    /// Spread in display units before display rounding; drives the animator.
    pub animation_spread: Option<f64>,
    /// The newest candle as the backend sent it. The animator derives frames
    /// from this baseline only, never from its own output.
    pub last_real_candle: Option<Candle>,
    pub last_price: Option<f64>,
    pub last_time: Option<i64>,
}

impl SharedMarketState {
    /// Clears the references a previous run left behind. The series cache
    /// itself survives so switching back to a timeframe repaints instantly,
    /// but a fresh stream must never animate against another run's bar or
    /// quote.
    pub fn reset_run_refs(&mut self) {
        self.last_quote = None;
        self.animation_spread = None;
        self.last_real_candle = None;
        self.last_price = None;
        self.last_time = None;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    SnapshotApplied { count: usize },
    CandleApplied(ApplyOutcome),
    QuoteApplied,
    /// Well-formed frame with values the transform rejects; dropped silently.
    Dropped,
}

/// Applies one parsed socket message to the shared state. Pure with respect
/// to its inputs: the caller owns locking and event emission.
pub fn ingest_message(
    state: &mut SharedMarketState,
    pair_config: &PairConfig,
    timeframe: Timeframe,
    message: StreamMessage,
) -> IngestOutcome {
    match message {
        StreamMessage::Snapshot { candles } => {
            let mut display = Vec::with_capacity(candles.len());
            for wire in &candles {
                match to_display_candle(wire, pair_config) {
                    Ok(candle) => display.push(candle),
                    Err(_) => return IngestOutcome::Dropped,
                }
            }

            let buffer = state.series.buffer_mut(&pair_config.symbol, timeframe);
            buffer.replace_with_snapshot(display);
            let count = buffer.len();
            let newest = buffer.last().cloned();

            state.last_real_candle = newest.clone();
            state.last_price = newest.as_ref().map(|candle| candle.close);
            state.last_time = newest.map(|candle| candle.time);
            IngestOutcome::SnapshotApplied { count }
        }
        StreamMessage::Candle { candle } => {
            let display = match to_display_candle(&candle, pair_config) {
                Ok(candle) => candle,
                Err(_) => return IngestOutcome::Dropped,
            };

            let outcome = state
                .series
                .buffer_mut(&pair_config.symbol, timeframe)
                .apply_update(display.clone());

            if !matches!(outcome, ApplyOutcome::Stale { .. }) {
                state.last_price = Some(display.close);
                state.last_time = Some(display.time);
                state.last_real_candle = Some(display);
            }
            IngestOutcome::CandleApplied(outcome)
        }
        StreamMessage::Quote { bid, ask, ts, .. } => {
            let quote = match to_display_quote(&bid, &ask, ts, pair_config) {
                Ok(quote) => quote,
                Err(_) => return IngestOutcome::Dropped,
            };
            let raw_spread = match (bid.trim().parse::<f64>(), ask.trim().parse::<f64>()) {
                (Ok(wire_bid), Ok(wire_ask)) => display_spread(wire_bid, wire_ask, pair_config),
                _ => return IngestOutcome::Dropped,
            };

            state.last_quote = Some(quote);
            state.animation_spread = Some(raw_spread);
            IngestOutcome::QuoteApplied
        }
    }
}

/// Runs one market stream until the socket ends or the token is cancelled.
///
/// There is deliberately no reconnect loop: a socket failure only flips the
/// status indicator, and the consumer restarts the stream when pair or
/// timeframe changes.
pub async fn run_market_stream(
    config: StreamConfig,
    pair_config: PairConfig,
    settings: ConnectionSettings,
    shared_state: Arc<Mutex<SharedMarketState>>,
    events: EventBus,
    status_store: Arc<RwLock<StreamStatusSnapshot>>,
    cancel_token: CancellationToken,
) {
    {
        let mut state = shared_state.lock();
        state.reset_run_refs();
    }

    publish_status(
        &status_store,
        &events,
        &shared_state,
        ConnectionState::Connecting,
        &config.pair,
        config.timeframe,
        Some("opening market socket".to_string()),
    )
    .await;

    if config.startup_mode == StartupMode::HistoryFirst {
        bootstrap_history(&config, &pair_config, &settings, &shared_state, &events).await;
        if cancel_token.is_cancelled() {
            publish_status(
                &status_store,
                &events,
                &shared_state,
                ConnectionState::Stopped,
                &config.pair,
                config.timeframe,
                Some("stream cancelled during history bootstrap".to_string()),
            )
            .await;
            return;
        }
    }

    let animator_token = cancel_token.child_token();
    let animator_handle = if config.animate {
        Some(tokio::spawn(run_animator(
            config.clone(),
            pair_config.clone(),
            Arc::clone(&shared_state),
            events.clone(),
            animator_token.clone(),
        )))
    } else {
        None
    };

    let final_state = stream_until_closed(
        &config,
        &pair_config,
        &settings,
        &shared_state,
        &events,
        &status_store,
        &cancel_token,
    )
    .await;

    // Idempotent: the parent token may already be cancelled.
    animator_token.cancel();
    if let Some(handle) = animator_handle {
        let _ = handle.await;
    }

    publish_status(
        &status_store,
        &events,
        &shared_state,
        final_state,
        &config.pair,
        config.timeframe,
        Some(match final_state {
            ConnectionState::Error => "market socket failed".to_string(),
            _ => "market stream stopped".to_string(),
        }),
    )
    .await;
}

async fn stream_until_closed(
    config: &StreamConfig,
    pair_config: &PairConfig,
    settings: &ConnectionSettings,
    shared_state: &Arc<Mutex<SharedMarketState>>,
    events: &EventBus,
    status_store: &Arc<RwLock<StreamStatusSnapshot>>,
    cancel_token: &CancellationToken,
) -> ConnectionState {
    let mut stream = tokio::select! {
        _ = cancel_token.cancelled() => return ConnectionState::Stopped,
        connected = connect_market_stream(&settings.ws_base_url, &config.pair, config.timeframe) => {
            match connected {
                Ok(stream) => stream,
                Err(error) => {
                    warn!(pair = %config.pair, timeframe = config.timeframe.as_str(), %error, "market socket connect failed");
                    return ConnectionState::Error;
                }
            }
        }
    };

    publish_status(
        status_store,
        events,
        shared_state,
        ConnectionState::Live,
        &config.pair,
        config.timeframe,
        Some("market socket connected".to_string()),
    )
    .await;

    loop {
        let frame = tokio::select! {
            _ = cancel_token.cancelled() => return ConnectionState::Stopped,
            next_message = stream.next() => next_message,
        };

        let Some(frame_result) = frame else {
            return ConnectionState::Stopped;
        };

        match frame_result {
            Ok(Message::Text(text_payload)) => {
                let mut owned_payload = text_payload.into_bytes();
                handle_payload(
                    owned_payload.as_mut_slice(),
                    config,
                    pair_config,
                    shared_state,
                    events,
                );
            }
            Ok(Message::Binary(mut binary_payload)) => {
                handle_payload(
                    binary_payload.as_mut_slice(),
                    config,
                    pair_config,
                    shared_state,
                    events,
                );
            }
            Ok(Message::Close(_)) => return ConnectionState::Stopped,
            Ok(_) => {}
            Err(error) => {
                warn!(pair = %config.pair, %error, "market socket frame error");
                return ConnectionState::Error;
            }
        }
    }
}

fn handle_payload(
    payload: &mut [u8],
    config: &StreamConfig,
    pair_config: &PairConfig,
    shared_state: &Arc<Mutex<SharedMarketState>>,
    events: &EventBus,
) {
    let message = match parse_stream_message(payload) {
        Ok(message) => message,
        Err(error) => {
            // Malformed frames degrade to a stale display, nothing more.
            debug!(pair = %config.pair, %error, "dropping malformed market frame");
            return;
        }
    };

    let (outcome, snapshot_candles, candle, quote) = {
        let mut state = shared_state.lock();
        let outcome = ingest_message(&mut state, pair_config, config.timeframe, message);
        let (snapshot_candles, candle, quote) = match &outcome {
            IngestOutcome::SnapshotApplied { .. } => {
                let candles = state
                    .series
                    .buffer(&pair_config.symbol, config.timeframe)
                    .map(|buffer| buffer.candles().to_vec())
                    .unwrap_or_default();
                (Some(candles), None, None)
            }
            IngestOutcome::CandleApplied(apply) if !matches!(apply, ApplyOutcome::Stale { .. }) => {
                (None, state.last_real_candle.clone(), None)
            }
            IngestOutcome::QuoteApplied => (None, None, state.last_quote),
            _ => (None, None, None),
        };
        (outcome, snapshot_candles, candle, quote)
    };

    if let IngestOutcome::CandleApplied(ApplyOutcome::Stale { incoming, last }) = outcome {
        debug!(pair = %config.pair, incoming, last, "dropping stale candle update");
    }

    if let Some(candles) = snapshot_candles {
        events.publish(MarketEvent::Snapshot {
            pair: config.pair.clone(),
            timeframe: config.timeframe,
            candles,
        });
    }
    if let Some(candle) = candle {
        events.publish(MarketEvent::Candle {
            pair: config.pair.clone(),
            timeframe: config.timeframe,
            candle,
            synthetic: false,
        });
    }
    if let Some(quote) = quote {
        events.publish(MarketEvent::Quote {
            pair: config.pair.clone(),
            quote,
        });
    }
}

/// Cosmetic intra-bar driver. Each tick re-reads the shared state, so a
/// snapshot replacing the series between ticks is picked up on the next one;
/// an empty series or missing quote is a no-op.
async fn run_animator(
    config: StreamConfig,
    pair_config: PairConfig,
    shared_state: Arc<Mutex<SharedMarketState>>,
    events: EventBus,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(config.animation_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                let frame = {
                    let mut state = shared_state.lock();
                    let (Some(base), Some(spread)) = (state.last_real_candle.clone(), state.animation_spread) else {
                        continue;
                    };
                    let frame = synthetic_frame(
                        &base,
                        spread,
                        pair_config.display_decimals,
                        now_unix_ms(),
                    );
                    // Same path as a real in-progress bar update; the
                    // baseline above stays untouched.
                    state
                        .series
                        .buffer_mut(&pair_config.symbol, config.timeframe)
                        .apply_update(frame.clone());
                    frame
                };

                events.publish(MarketEvent::Candle {
                    pair: config.pair.clone(),
                    timeframe: config.timeframe,
                    candle: frame,
                    synthetic: true,
                });
            }
        }
    }
}

async fn bootstrap_history(
    config: &StreamConfig,
    pair_config: &PairConfig,
    settings: &ConnectionSettings,
    shared_state: &Arc<Mutex<SharedMarketState>>,
    events: &EventBus,
) {
    let client = Client::new();
    let candles = match fetch_candle_history(
        &client,
        &settings.http_base_url,
        &config.pair,
        config.timeframe,
        config.history_limit,
    )
    .await
    {
        Ok(candles) => candles,
        Err(error) => {
            // The socket snapshot will fill the chart; history is best-effort.
            warn!(pair = %config.pair, %error, "candle history bootstrap failed");
            return;
        }
    };

    let (outcome, snapshot) = {
        let mut state = shared_state.lock();
        let outcome = ingest_message(
            &mut state,
            pair_config,
            config.timeframe,
            StreamMessage::Snapshot { candles },
        );
        let snapshot = state
            .series
            .buffer(&pair_config.symbol, config.timeframe)
            .map(|buffer| buffer.candles().to_vec())
            .unwrap_or_default();
        (outcome, snapshot)
    };

    if matches!(outcome, IngestOutcome::SnapshotApplied { .. }) {
        events.publish(MarketEvent::Snapshot {
            pair: config.pair.clone(),
            timeframe: config.timeframe,
            candles: snapshot,
        });
    }
}

async fn publish_status(
    status_store: &Arc<RwLock<StreamStatusSnapshot>>,
    events: &EventBus,
    shared_state: &Arc<Mutex<SharedMarketState>>,
    state: ConnectionState,
    pair: &str,
    timeframe: Timeframe,
    reason: Option<String>,
) {
    let (last_time, last_price) = {
        let readable = shared_state.lock();
        (readable.last_time, readable.last_price)
    };

    let snapshot = StreamStatusSnapshot {
        state,
        pair: pair.to_string(),
        timeframe,
        last_time,
        last_price,
        reason,
    };

    {
        let mut writable = status_store.write().await;
        *writable = snapshot.clone();
    }

    events.publish(MarketEvent::Status(snapshot));
}

fn now_unix_ms() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration.as_millis().min(i64::MAX as u128) as i64,
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::types::WireCandle;

    fn inverted_pair() -> PairConfig {
        PairConfig {
            symbol: "UZS-USD".to_string(),
            display_decimals: 2,
            api_decimals: 11,
            invert_for_api: true,
        }
    }

    fn direct_pair() -> PairConfig {
        PairConfig {
            symbol: "BTCUSD".to_string(),
            display_decimals: 2,
            api_decimals: 2,
            invert_for_api: false,
        }
    }

    fn wire_candle(time: i64, close: &str) -> WireCandle {
        WireCandle {
            time,
            open: close.to_string(),
            high: close.to_string(),
            low: close.to_string(),
            close: close.to_string(),
        }
    }

    fn stream_config(pair: &str, timeframe: Timeframe) -> StreamConfig {
        StreamConfig {
            pair: pair.to_string(),
            timeframe,
            startup_mode: StartupMode::LiveFirst,
            history_limit: 60,
            animate: true,
            animation_interval_ms: 8,
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn snapshot_sets_price_and_time_reference() {
        let mut state = SharedMarketState::default();
        let outcome = ingest_message(
            &mut state,
            &direct_pair(),
            Timeframe::M1,
            StreamMessage::Snapshot {
                candles: vec![wire_candle(60, "68500.10"), wire_candle(120, "68501.25")],
            },
        );

        assert_eq!(outcome, IngestOutcome::SnapshotApplied { count: 2 });
        assert_eq!(state.last_time, Some(120));
        assert_eq!(state.last_price, Some(68_501.25));
        assert_eq!(
            state
                .series
                .buffer("BTCUSD", Timeframe::M1)
                .map(|buffer| buffer.len()),
            Some(2)
        );
    }

    #[test]
    fn snapshot_transforms_through_pair_inversion() {
        let mut state = SharedMarketState::default();
        ingest_message(
            &mut state,
            &inverted_pair(),
            Timeframe::M1,
            StreamMessage::Snapshot {
                candles: vec![WireCandle {
                    time: 100,
                    open: "10".to_string(),
                    high: "12".to_string(),
                    low: "9".to_string(),
                    close: "11".to_string(),
                }],
            },
        );

        let buffer = state.series.buffer("UZS-USD", Timeframe::M1).expect("buffer");
        assert_eq!(
            buffer.candles(),
            &[Candle {
                time: 100,
                open: 0.10,
                high: 0.11,
                low: 0.08,
                close: 0.09,
            }]
        );
    }

    #[test]
    fn newer_candle_appends_and_updates_reference() {
        let mut state = SharedMarketState::default();
        ingest_message(
            &mut state,
            &direct_pair(),
            Timeframe::M1,
            StreamMessage::Snapshot {
                candles: vec![wire_candle(60, "100")],
            },
        );

        let outcome = ingest_message(
            &mut state,
            &direct_pair(),
            Timeframe::M1,
            StreamMessage::Candle {
                candle: wire_candle(120, "101"),
            },
        );

        assert_eq!(
            outcome,
            IngestOutcome::CandleApplied(ApplyOutcome::Appended { evicted: false })
        );
        assert_eq!(state.last_time, Some(120));
        assert_eq!(state.last_price, Some(101.0));
        assert_eq!(state.last_real_candle.as_ref().map(|c| c.time), Some(120));
    }

    #[test]
    fn stale_candle_leaves_state_untouched() {
        let mut state = SharedMarketState::default();
        ingest_message(
            &mut state,
            &direct_pair(),
            Timeframe::M1,
            StreamMessage::Snapshot {
                candles: vec![wire_candle(60, "100"), wire_candle(120, "101")],
            },
        );

        let outcome = ingest_message(
            &mut state,
            &direct_pair(),
            Timeframe::M1,
            StreamMessage::Candle {
                candle: wire_candle(30, "90"),
            },
        );

        assert_eq!(
            outcome,
            IngestOutcome::CandleApplied(ApplyOutcome::Stale {
                incoming: 30,
                last: 120
            })
        );
        assert_eq!(state.last_time, Some(120));
        assert_eq!(state.last_price, Some(101.0));
    }

    #[test]
    fn quote_replaces_wholesale_and_records_animation_spread() {
        let mut state = SharedMarketState::default();

        ingest_message(
            &mut state,
            &inverted_pair(),
            Timeframe::M1,
            StreamMessage::Quote {
                bid: "10".to_string(),
                ask: "12.5".to_string(),
                spread: "2.5".to_string(),
                ts: 1,
            },
        );
        ingest_message(
            &mut state,
            &inverted_pair(),
            Timeframe::M1,
            StreamMessage::Quote {
                bid: "10".to_string(),
                ask: "11".to_string(),
                spread: "1".to_string(),
                ts: 2,
            },
        );

        let quote = state.last_quote.expect("latest quote kept");
        assert_eq!(quote.ts, 2);
        // Display spread of the latest quote: 1/10 - 1/11.
        let spread = state.animation_spread.expect("spread recorded");
        assert!((spread - (0.1 - 1.0 / 11.0)).abs() < 1e-12);
    }

    #[test]
    fn malformed_values_inside_valid_frame_are_dropped() {
        let mut state = SharedMarketState::default();
        let outcome = ingest_message(
            &mut state,
            &direct_pair(),
            Timeframe::M1,
            StreamMessage::Candle {
                candle: wire_candle(60, "not-a-price"),
            },
        );

        assert_eq!(outcome, IngestOutcome::Dropped);
        assert!(state.series.buffer("BTCUSD", Timeframe::M1).is_none());
        assert!(state.last_price.is_none());
    }

    #[test]
    fn run_reset_clears_refs_but_keeps_series() {
        let mut state = SharedMarketState::default();
        ingest_message(
            &mut state,
            &inverted_pair(),
            Timeframe::M1,
            StreamMessage::Snapshot {
                candles: vec![wire_candle(100, "11")],
            },
        );
        ingest_message(
            &mut state,
            &inverted_pair(),
            Timeframe::M1,
            StreamMessage::Quote {
                bid: "10".to_string(),
                ask: "11".to_string(),
                spread: "1".to_string(),
                ts: 1,
            },
        );

        state.reset_run_refs();

        assert!(state.last_real_candle.is_none());
        assert!(state.animation_spread.is_none());
        assert!(state.last_quote.is_none());
        assert!(state.last_price.is_none());
        assert!(state.last_time.is_none());
        assert_eq!(
            state.series.buffer("UZS-USD", Timeframe::M1).map(|b| b.len()),
            Some(1)
        );
    }

    #[tokio::test]
    async fn animator_idles_after_timeframe_switch_reset() {
        init_tracing();

        let shared = Arc::new(Mutex::new(SharedMarketState::default()));
        {
            let mut state = shared.lock();
            ingest_message(
                &mut state,
                &inverted_pair(),
                Timeframe::M1,
                StreamMessage::Snapshot {
                    candles: vec![wire_candle(100, "11")],
                },
            );
            ingest_message(
                &mut state,
                &inverted_pair(),
                Timeframe::M1,
                StreamMessage::Quote {
                    bid: "10".to_string(),
                    ask: "11".to_string(),
                    spread: "1".to_string(),
                    ts: 1,
                },
            );
            // What a restart does before the new socket opens.
            state.reset_run_refs();
        }

        let events = EventBus::new();
        let mut receiver = events.subscribe();
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(run_animator(
            stream_config("UZS-USD", Timeframe::M5),
            inverted_pair(),
            Arc::clone(&shared),
            events.clone(),
            cancel_token.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(60)).await;
        cancel_token.cancel();
        handle.await.expect("animator task joins");

        {
            let state = shared.lock();
            // Without a baseline for this run, the fresh series stays empty
            // and the previous timeframe's buffer is untouched.
            assert!(state.series.buffer("UZS-USD", Timeframe::M5).is_none());
            assert_eq!(
                state.series.buffer("UZS-USD", Timeframe::M1).map(|b| b.len()),
                Some(1)
            );
        }
        assert!(matches!(
            receiver.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn animator_drives_frames_for_the_active_series() {
        init_tracing();

        let shared = Arc::new(Mutex::new(SharedMarketState::default()));
        {
            let mut state = shared.lock();
            ingest_message(
                &mut state,
                &direct_pair(),
                Timeframe::M5,
                StreamMessage::Snapshot {
                    candles: vec![wire_candle(300, "68500.00")],
                },
            );
            ingest_message(
                &mut state,
                &direct_pair(),
                Timeframe::M5,
                StreamMessage::Quote {
                    bid: "68499.50".to_string(),
                    ask: "68500.50".to_string(),
                    spread: "1".to_string(),
                    ts: 1,
                },
            );
        }

        let events = EventBus::new();
        let mut receiver = events.subscribe();
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(run_animator(
            stream_config("BTCUSD", Timeframe::M5),
            direct_pair(),
            Arc::clone(&shared),
            events.clone(),
            cancel_token.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(60)).await;
        cancel_token.cancel();
        handle.await.expect("animator task joins");

        {
            let state = shared.lock();
            let buffer = state
                .series
                .buffer("BTCUSD", Timeframe::M5)
                .expect("series seeded");
            // Frames replace the open bar in place, never append.
            assert_eq!(buffer.len(), 1);
            assert_eq!(buffer.last().map(|candle| candle.time), Some(300));
        }

        match receiver.recv().await.expect("frame event published") {
            MarketEvent::Candle {
                timeframe,
                synthetic,
                candle,
                ..
            } => {
                assert!(synthetic);
                assert_eq!(timeframe, Timeframe::M5);
                assert_eq!(candle.time, 300);
            }
            other => panic!("expected a candle event, got {other:?}"),
        }
    }

    #[test]
    fn timeframe_switch_keeps_previous_buffer() {
        let mut state = SharedMarketState::default();
        ingest_message(
            &mut state,
            &direct_pair(),
            Timeframe::M1,
            StreamMessage::Snapshot {
                candles: vec![wire_candle(60, "100")],
            },
        );
        ingest_message(
            &mut state,
            &direct_pair(),
            Timeframe::M5,
            StreamMessage::Snapshot {
                candles: vec![wire_candle(300, "101"), wire_candle(600, "102")],
            },
        );

        assert_eq!(
            state.series.buffer("BTCUSD", Timeframe::M1).map(|b| b.len()),
            Some(1)
        );
        assert_eq!(
            state.series.buffer("BTCUSD", Timeframe::M5).map(|b| b.len()),
            Some(2)
        );
    }
}
