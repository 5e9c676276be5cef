pub mod commands;
pub mod db;
pub mod error;
pub mod market;
pub mod state;

pub use commands::health::health;
pub use commands::preferences::{preferences_get, preferences_save};
pub use commands::stream::{list_pairs, start_stream, stop_stream, stream_status};
pub use db::initialize_pool;
pub use error::AppError;
pub use market::events::MarketEvent;
pub use state::AppState;
