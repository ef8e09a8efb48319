//! Motion model: horizontal sweep of the active block and the speed control mapping.

use crate::game::Block;
use std::fmt;

/// Slowest sweep, in columns per tick.
pub const MIN_SPEED: f64 = 0.05;
/// Fastest sweep, in columns per tick. The per-lock ramp never goes past this.
pub const MAX_SPEED: f64 = 0.25;
/// Added to the speed after every successful lock.
pub const SPEED_RAMP: f64 = 0.01;

/// Sweep direction of the active block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Left,
    #[default]
    Right,
}

impl Direction {
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }
}

/// Advance the block one tick and bounce it off the field edges.
///
/// The position is clamped before the direction flips, so the block never overshoots
/// the edge it touched.
pub fn advance(block: Block, direction: Direction, speed: f64, cols: u16) -> (Block, Direction) {
    let mut next = block;
    next.col_start += direction.sign() * speed;

    let span = f64::from(next.col_span);
    let cols = f64::from(cols);
    if next.col_start + span >= cols {
        next.col_start = cols - span;
        (next, Direction::Left)
    } else if next.col_start <= 0.0 {
        next.col_start = 0.0;
        (next, Direction::Right)
    } else {
        (next, direction)
    }
}

/// External speed control value, always within [`SpeedSetting::MIN`, `SpeedSetting::MAX`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSetting(f64);

impl SpeedSetting {
    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 10.0;
    /// Maps to 0.15 columns per tick.
    pub const DEFAULT: f64 = 5.5;
    /// Runtime adjustment step (speed keys).
    pub const STEP: f64 = 0.5;

    /// Clamp any value into range; NaN falls back to the default.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.max(Self::MIN).min(Self::MAX))
    }

    /// Parse raw user input. Never fails: garbage gives the default, out-of-range clamps.
    pub fn from_input(s: &str) -> Self {
        s.trim()
            .parse::<f64>()
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Sweep speed in columns per tick for this setting.
    pub fn speed(self) -> f64 {
        map_speed(self.0)
    }

    pub fn faster(self) -> Self {
        Self::new(self.0 + Self::STEP)
    }

    pub fn slower(self) -> Self {
        Self::new(self.0 - Self::STEP)
    }
}

impl Default for SpeedSetting {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for SpeedSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// clap value parser for `--speed`. Infallible by design of [`SpeedSetting::from_input`].
pub fn parse_speed_setting(s: &str) -> Result<SpeedSetting, std::convert::Infallible> {
    Ok(SpeedSetting::from_input(s))
}

/// Linear map from a control value in [1, 10] to a speed in [`MIN_SPEED`, `MAX_SPEED`].
pub fn map_speed(value: f64) -> f64 {
    (MAX_SPEED - MIN_SPEED) * (value - 1.0) / 9.0 + MIN_SPEED
}

/// Speed after a successful lock.
#[inline]
pub fn ramp(speed: f64) -> f64 {
    (speed + SPEED_RAMP).min(MAX_SPEED)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLS: u16 = 7;

    fn block(col_start: f64, col_span: u16) -> Block {
        Block {
            row: 10,
            col_start,
            col_span,
        }
    }

    #[test]
    fn test_advance_moves_by_speed() {
        let (b, d) = advance(block(2.0, 3), Direction::Right, 0.15, COLS);
        assert!((b.col_start - 2.15).abs() < 1e-9);
        assert_eq!(d, Direction::Right);

        let (b, d) = advance(block(2.0, 3), Direction::Left, 0.15, COLS);
        assert!((b.col_start - 1.85).abs() < 1e-9);
        assert_eq!(d, Direction::Left);
    }

    #[test]
    fn test_right_edge_clamps_then_reverses() {
        let (b, d) = advance(block(3.9, 3), Direction::Right, 0.25, COLS);
        assert_eq!(b.col_start, 4.0);
        assert_eq!(d, Direction::Left);
    }

    #[test]
    fn test_left_edge_clamps_then_reverses() {
        let (b, d) = advance(block(0.1, 3), Direction::Left, 0.25, COLS);
        assert_eq!(b.col_start, 0.0);
        assert_eq!(d, Direction::Right);
    }

    #[test]
    fn test_no_flip_before_touching_edge() {
        // 3.7 + 0.25 + 3 = 6.95 < 7
        let (b, d) = advance(block(3.7, 3), Direction::Right, 0.25, COLS);
        assert!((b.col_start - 3.95).abs() < 1e-9);
        assert_eq!(d, Direction::Right);
    }

    #[test]
    fn test_exact_touch_flips() {
        let (b, d) = advance(block(3.75, 3), Direction::Right, 0.25, COLS);
        assert_eq!(b.col_start, 4.0);
        assert_eq!(d, Direction::Left);
    }

    #[test]
    fn test_stays_in_bounds_over_many_ticks() {
        for span in 1..=COLS {
            let mut b = block(0.0, span);
            let mut d = Direction::Right;
            for i in 0..2_000 {
                let speed = MIN_SPEED + (i % 21) as f64 * 0.01;
                (b, d) = advance(b, d, speed, COLS);
                assert!(b.col_start >= 0.0, "span {span}: {b:?}");
                assert!(b.col_start + f64::from(span) <= f64::from(COLS), "span {span}: {b:?}");
            }
        }
    }

    #[test]
    fn test_full_width_block_pins_to_zero() {
        let (b, d) = advance(block(0.0, COLS), Direction::Right, 0.2, COLS);
        assert_eq!(b.col_start, 0.0);
        assert_eq!(d, Direction::Left);
        let (b, _) = advance(b, d, 0.2, COLS);
        assert_eq!(b.col_start, 0.0);
    }

    #[test]
    fn test_map_speed_endpoints() {
        assert!((map_speed(1.0) - MIN_SPEED).abs() < 1e-12);
        assert!((map_speed(10.0) - MAX_SPEED).abs() < 1e-12);
        assert!((map_speed(5.5) - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_speed_setting_clamps_input() {
        assert_eq!(SpeedSetting::from_input("0").value(), 1.0);
        assert_eq!(SpeedSetting::from_input("42").value(), 10.0);
        assert_eq!(SpeedSetting::from_input(" 3 ").value(), 3.0);
        assert_eq!(SpeedSetting::from_input("fast").value(), SpeedSetting::DEFAULT);
        assert_eq!(SpeedSetting::from_input("NaN").value(), SpeedSetting::DEFAULT);
        assert_eq!(SpeedSetting::from_input("-inf").value(), 1.0);
    }

    #[test]
    fn test_speed_setting_steps_stay_in_range() {
        let mut s = SpeedSetting::new(9.5);
        s = s.faster().faster();
        assert_eq!(s.value(), 10.0);
        let mut s = SpeedSetting::new(1.5);
        s = s.slower().slower();
        assert_eq!(s.value(), 1.0);
    }

    #[test]
    fn test_ramp_is_capped() {
        let mut speed = MIN_SPEED;
        for _ in 0..100 {
            speed = ramp(speed);
            assert!(speed <= MAX_SPEED);
        }
        assert_eq!(speed, MAX_SPEED);
    }
}
