use crate::market::transform::round_to;
use crate::market::types::Candle;

/// Fraction of the display-unit spread used as oscillation amplitude.
pub const SPREAD_AMPLITUDE_FACTOR: f64 = 0.35;
/// Amplitude bounds, in display ticks.
pub const MIN_AMPLITUDE_TICKS: f64 = 1.0;
pub const MAX_AMPLITUDE_TICKS: f64 = 250.0;
/// Oscillation period of the cosmetic wobble.
pub const WOBBLE_PERIOD_MS: f64 = 1_400.0;

/// One display tick for a pair, e.g. 0.01 at two display decimals.
pub fn display_tick(display_decimals: u32) -> f64 {
    10f64.powi(-(display_decimals as i32))
}

/// Oscillation amplitude derived from the current display-unit spread,
/// clamped so thin spreads still move the line and wide ones do not swamp
/// the chart.
pub fn amplitude_from_spread(display_spread: f64, display_decimals: u32) -> f64 {
    let tick = display_tick(display_decimals);
    (display_spread.abs() * SPREAD_AMPLITUDE_FACTOR)
        .clamp(MIN_AMPLITUDE_TICKS * tick, MAX_AMPLITUDE_TICKS * tick)
}

/// The perturbed close for a given wall-clock phase. Purely cosmetic; the
/// amplitude caller guarantees it is small relative to the price.
pub fn synthetic_close(base_close: f64, amplitude: f64, phase_ms: i64) -> f64 {
    let phase = (phase_ms as f64 / WOBBLE_PERIOD_MS) * std::f64::consts::TAU;
    base_close + amplitude * phase.sin()
}

/// Builds the cosmetic frame for the current bar. `base` must be the last
/// *real* candle for the series: deriving from previously synthesized values
/// would let the jitter ratchet the recorded high/low, so the running max/min
/// is always taken against the real bar.
pub fn synthetic_frame(base: &Candle, display_spread: f64, display_decimals: u32, phase_ms: i64) -> Candle {
    let amplitude = amplitude_from_spread(display_spread, display_decimals);
    // Snap to the display grid so cosmetic frames carry the same precision
    // as the rest of the series.
    let close = round_to(
        synthetic_close(base.close, amplitude, phase_ms),
        display_decimals,
    );

    Candle {
        time: base.time,
        open: base.open,
        high: base.high.max(close),
        low: base.low.min(close),
        close,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::reconcile::{ApplyOutcome, SeriesBuffer};

    fn base_candle() -> Candle {
        Candle {
            time: 600,
            open: 1.10,
            high: 1.15,
            low: 1.05,
            close: 1.12,
        }
    }

    #[test]
    fn amplitude_is_clamped_to_tick_bounds() {
        let tick = display_tick(2);

        // A hairline spread still produces one visible tick of movement.
        assert_eq!(amplitude_from_spread(1e-9, 2), MIN_AMPLITUDE_TICKS * tick);
        // A blown-out spread is capped.
        assert_eq!(amplitude_from_spread(100.0, 2), MAX_AMPLITUDE_TICKS * tick);
    }

    #[test]
    fn amplitude_scales_with_spread_between_bounds() {
        let amplitude = amplitude_from_spread(0.20, 2);
        assert!((amplitude - 0.07).abs() < 1e-12);
    }

    #[test]
    fn synthetic_close_stays_within_amplitude_envelope() {
        for phase_ms in (0..3_000).step_by(17) {
            let close = synthetic_close(1.12, 0.01, phase_ms);
            assert!(close >= 1.11 - 1e-12 && close <= 1.13 + 1e-12);
        }
    }

    #[test]
    fn frame_keeps_time_and_open_and_extends_extremes() {
        let base = base_candle();
        let frame = synthetic_frame(&base, 0.2, 2, 350);

        assert_eq!(frame.time, base.time);
        assert_eq!(frame.open, base.open);
        assert!(frame.high >= base.high);
        assert!(frame.low <= base.low);
        assert!(frame.high >= frame.close && frame.low <= frame.close);
    }

    #[test]
    fn frame_close_lands_on_the_display_grid() {
        let base = base_candle();
        for phase_ms in (0..2_800).step_by(137) {
            let frame = synthetic_frame(&base, 0.2, 2, phase_ms);
            let scaled = frame.close * 100.0;
            assert!(
                (scaled - scaled.round()).abs() < 1e-9,
                "close {} is off the two-decimal grid",
                frame.close
            );
        }
    }

    #[test]
    fn frame_writes_through_the_normal_update_path() {
        let mut buffer = SeriesBuffer::new();
        buffer.apply_update(base_candle());

        let frame = synthetic_frame(&base_candle(), 0.2, 2, 350);
        let outcome = buffer.apply_update(frame.clone());

        // Same timestamp as the open bar, so it replaces in place.
        assert_eq!(outcome, ApplyOutcome::ReplacedLast);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.last(), Some(&frame));
    }

    #[test]
    fn real_update_is_never_compared_against_synthetic_extremes() {
        let mut buffer = SeriesBuffer::new();
        let base = base_candle();
        buffer.apply_update(base.clone());

        // A wobble pushes the displayed high above the real one.
        let frame = synthetic_frame(&base, 2.0, 2, 350);
        assert!(frame.high > base.high);
        buffer.apply_update(frame);

        // The next real update replaces the bar wholesale, discarding the
        // synthetic extremes; a fresh frame derived from it only sees real
        // highs and lows.
        let real = Candle {
            time: 600,
            open: 1.10,
            high: 1.16,
            low: 1.05,
            close: 1.14,
        };
        buffer.apply_update(real.clone());
        assert_eq!(buffer.last(), Some(&real));

        let next_frame = synthetic_frame(&real, 0.0, 2, 0);
        assert_eq!(next_frame.high, real.high.max(next_frame.close));
    }
}
