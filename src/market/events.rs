use crate::market::types::{Candle, DisplayQuote, StreamStatusSnapshot, Timeframe};
use serde::Serialize;
use tokio::sync::broadcast;

pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Everything the display layer can subscribe to. A slow subscriber lags and
/// drops (broadcast semantics); the cache remains the source of truth, so a
/// dropped event only delays the next repaint.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketEvent {
    Snapshot {
        pair: String,
        timeframe: Timeframe,
        candles: Vec<Candle>,
    },
    Candle {
        pair: String,
        timeframe: Timeframe,
        candle: Candle,
        /// True for cosmetic intra-bar frames; never authoritative data.
        synthetic: bool,
    },
    Quote {
        pair: String,
        quote: DisplayQuote,
    },
    Status(StreamStatusSnapshot),
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MarketEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.sender.subscribe()
    }

    /// Publishing with no subscribers is fine; the event is simply dropped.
    pub fn publish(&self, event: MarketEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
