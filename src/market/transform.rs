use crate::error::AppError;
use crate::market::types::{Candle, DisplayQuote, PairConfig, WireCandle};

/// Half-away-from-zero rounding at `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Reciprocal with a zero guard: the backend emits "0" for pairs that have no
/// quote yet, and 1/0 must not leak an infinity into the display series.
pub fn invert_price(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        1.0 / value
    }
}

/// Maps a single wire-orientation price into display orientation.
pub fn display_price(raw: f64, config: &PairConfig) -> f64 {
    let oriented = if config.invert_for_api {
        invert_price(raw)
    } else {
        raw
    };
    round_to(oriented, config.display_decimals)
}

fn parse_price(raw: &str) -> Result<f64, AppError> {
    let value = raw.trim().parse::<f64>()?;
    if !value.is_finite() {
        return Err(AppError::InvalidArgument(format!(
            "price '{raw}' is not finite"
        )));
    }
    Ok(value)
}

/// Converts a wire candle into display orientation.
///
/// When the pair is inverted the reciprocal flips price ordering, so the
/// display high comes from the wire low and vice versa.
pub fn to_display_candle(wire: &WireCandle, config: &PairConfig) -> Result<Candle, AppError> {
    let open = parse_price(&wire.open)?;
    let high = parse_price(&wire.high)?;
    let low = parse_price(&wire.low)?;
    let close = parse_price(&wire.close)?;

    let candle = if config.invert_for_api {
        Candle {
            time: wire.time,
            open: round_to(invert_price(open), config.display_decimals),
            high: round_to(invert_price(low), config.display_decimals),
            low: round_to(invert_price(high), config.display_decimals),
            close: round_to(invert_price(close), config.display_decimals),
        }
    } else {
        Candle {
            time: wire.time,
            open: round_to(open, config.display_decimals),
            high: round_to(high, config.display_decimals),
            low: round_to(low, config.display_decimals),
            close: round_to(close, config.display_decimals),
        }
    };

    Ok(candle)
}

/// Converts a wire quote into display orientation. Bid and ask swap under
/// inversion (the best bid in one direction is the best ask in the other);
/// the spread is recomputed from the transformed sides so it stays
/// non-negative and in display units.
pub fn to_display_quote(
    bid: &str,
    ask: &str,
    ts: i64,
    config: &PairConfig,
) -> Result<DisplayQuote, AppError> {
    let wire_bid = parse_price(bid)?;
    let wire_ask = parse_price(ask)?;

    let (display_bid, display_ask) = if config.invert_for_api {
        (invert_price(wire_ask), invert_price(wire_bid))
    } else {
        (wire_bid, wire_ask)
    };

    let display_bid = round_to(display_bid, config.display_decimals);
    let display_ask = round_to(display_ask, config.display_decimals);

    Ok(DisplayQuote {
        bid: display_bid,
        ask: display_ask,
        spread: (display_ask - display_bid).max(0.0),
        ts,
    })
}

/// Display-unit spread for the animator, without rounding to display ticks
/// (sub-tick spreads still need to drive a visible amplitude).
pub fn display_spread(wire_bid: f64, wire_ask: f64, config: &PairConfig) -> f64 {
    if config.invert_for_api {
        (invert_price(wire_bid) - invert_price(wire_ask)).abs()
    } else {
        (wire_ask - wire_bid).abs()
    }
}
