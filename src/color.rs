//! Sequential YlOrRd colour scale and legend geometry.

use serde::Serialize;

pub const LEGEND_TITLE: &str = "Participation gap (%)";
const LEGEND_STOPS: usize = 11;
const LEGEND_TICKS: usize = 5;

/// Maps a value in `domain` onto YlOrRd. `domain[0]` is the yellow end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequentialScale {
    domain: [f64; 2],
}

impl SequentialScale {
    pub fn new(domain: [f64; 2]) -> Self {
        Self { domain }
    }

    /// Position on the scheme, clamped to `[0, 1]`.
    pub fn position(&self, v: f64) -> f64 {
        let [d0, d1] = self.domain;
        ((v - d0) / (d1 - d0)).clamp(0.0, 1.0)
    }

    /// `#rrggbb` for a finite value, `None` otherwise.
    pub fn color(&self, v: f64) -> Option<String> {
        if !v.is_finite() {
            return None;
        }
        let c = colorous::YELLOW_ORANGE_RED.eval_continuous(self.position(v));
        Some(format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b))
    }

    /// `(min, max)` of the domain regardless of direction.
    pub fn extent(&self) -> (f64, f64) {
        let [a, b] = self.domain;
        (a.min(b), a.max(b))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendSpec {
    pub title: String,
    pub min: f64,
    pub max: f64,
    pub stops: Vec<GradientStop>,
    pub ticks: Vec<Tick>,
}

impl LegendSpec {
    /// Gradient from `min` to `max` (left to right) with "nice" ticks.
    pub fn for_scale(scale: &SequentialScale) -> Self {
        let (min, max) = scale.extent();
        let stops = (0..LEGEND_STOPS)
            .map(|i| {
                let t = i as f64 / (LEGEND_STOPS - 1) as f64;
                GradientStop {
                    offset: t,
                    color: scale.color(min + t * (max - min)).unwrap_or_default(),
                }
            })
            .collect();
        let ticks = nice_ticks(min, max, LEGEND_TICKS)
            .into_iter()
            .map(|value| Tick {
                value,
                label: format!("{value}%"),
            })
            .collect();
        Self {
            title: LEGEND_TITLE.to_string(),
            min,
            max,
            stops,
            ticks,
        }
    }
}

/// Tick step of 1, 2, 5 or 10 × 10^k closest to `span / count`.
fn tick_step(span: f64, count: usize) -> f64 {
    let raw = span / count.max(1) as f64;
    let power = 10f64.powf(raw.log10().floor());
    let err = raw / power;
    let factor = if err >= 50f64.sqrt() {
        10.0
    } else if err >= 10f64.sqrt() {
        5.0
    } else if err >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * power
}

/// Round tick values inside `[min, max]`.
pub fn nice_ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    if !(min.is_finite() && max.is_finite()) || max <= min {
        return Vec::new();
    }
    let step = tick_step(max - min, count);
    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}
