use crate::error::AppError;
use crate::market::pipeline::run_market_stream;
use crate::market::types::{
    ConnectionState, StartStreamArgs, StreamSession, StreamStatusSnapshot, StreamStopResult,
};
use crate::state::{AppState, StreamHandle};
use std::sync::Arc;

/// Starts (or restarts) the market stream. Any running stream is cancelled
/// and joined first, so pair/timeframe changes never leak a socket or an
/// animation task.
pub async fn start_stream(
    state: &AppState,
    args: Option<StartStreamArgs>,
) -> Result<StreamSession, AppError> {
    let config = args.unwrap_or_default().normalize(&state.pairs)?;
    let pair_config = state.pairs.get(&config.pair)?.clone();

    let existing_handle = {
        let mut stream_slot = state.stream.lock().await;
        stream_slot.take()
    };
    if let Some(handle) = existing_handle {
        handle.cancellation_token.cancel();
        let _ = handle.join_handle.await;
    }

    let cancellation_token = tokio_util::sync::CancellationToken::new();
    let task_token = cancellation_token.clone();
    let runtime_config = config.clone();
    let connection_settings = state.connection_settings();
    let shared_market = Arc::clone(&state.market);
    let events = state.events.clone();
    let status_store = Arc::clone(&state.stream_status);

    let join_handle = tokio::spawn(async move {
        run_market_stream(
            runtime_config,
            pair_config,
            connection_settings,
            shared_market,
            events,
            status_store,
            task_token,
        )
        .await;
    });

    {
        let mut stream_slot = state.stream.lock().await;
        *stream_slot = Some(StreamHandle {
            cancellation_token,
            join_handle,
        });
    }

    Ok(StreamSession::from_config(&config))
}

/// Idempotent: stopping an already-stopped stream reports `stopped: false`
/// and changes nothing.
pub async fn stop_stream(state: &AppState) -> Result<StreamStopResult, AppError> {
    let existing_handle = {
        let mut stream_slot = state.stream.lock().await;
        stream_slot.take()
    };

    let stopped = if let Some(handle) = existing_handle {
        handle.cancellation_token.cancel();
        let _ = handle.join_handle.await;
        true
    } else {
        false
    };

    {
        let (current_pair, current_timeframe) = {
            let readable = state.stream_status.read().await;
            (readable.pair.clone(), readable.timeframe)
        };
        let mut writable = state.stream_status.write().await;
        *writable = StreamStatusSnapshot {
            state: ConnectionState::Stopped,
            pair: current_pair,
            timeframe: current_timeframe,
            last_time: None,
            last_price: None,
            reason: Some("stream stopped by command".to_string()),
        };
    }

    Ok(StreamStopResult { stopped })
}

pub async fn stream_status(state: &AppState) -> Result<StreamStatusSnapshot, AppError> {
    let snapshot = state.stream_status.read().await.clone();
    Ok(snapshot)
}

pub fn list_pairs(state: &AppState) -> Vec<String> {
    state.pairs.symbols()
}
