use serde::Serialize;

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Domain – the input interval of a linear scale
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Domain {
    pub low: f64,
    pub high: f64,
}

impl Domain {
    pub fn new(low: f64, high: f64) -> Self {
        Domain { low, high }
    }

    /// Domain spanning an observed `[min, max]`.
    pub fn from_extent(min: f64, max: f64) -> Self {
        Domain::new(min.min(max), min.max(max))
    }

    /// Lower the low bound by `margin × |low|` so the smallest point is not
    /// drawn flush against the axis (e.g. `0.05` for 5%).
    pub fn widen_low(self, margin: f64) -> Self {
        Domain::new(self.low - margin * self.low.abs(), self.high)
    }

    /// Replace a zero-width domain `[v, v]` by `[v - 1, v + 1]`.
    pub fn or_fallback(self) -> Self {
        if self.low == self.high {
            Domain::new(self.low - 1.0, self.high + 1.0)
        } else {
            self
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !self.low.is_finite() || !self.high.is_finite() || self.low == self.high
    }

    /// Extend both bounds outward to multiples of a round tick step
    /// (1, 2 or 5 × 10ⁿ) chosen for roughly `count` ticks.
    pub fn nice(self, count: usize) -> Self {
        if self.is_degenerate() || count == 0 {
            return self;
        }
        let (low, high) = if self.low <= self.high {
            (self.low, self.high)
        } else {
            (self.high, self.low)
        };
        let step = tick_step(low, high, count);
        let nice = Domain::new((low / step).floor() * step, (high / step).ceil() * step);
        if self.low <= self.high {
            nice
        } else {
            Domain::new(nice.high, nice.low)
        }
    }
}

fn tick_step(low: f64, high: f64, count: usize) -> f64 {
    let span = high - low;
    let raw = span / count as f64;
    let mut step = 10f64.powf(raw.log10().floor());
    let err = step / raw;
    if err <= 0.15 {
        step *= 10.0;
    } else if err <= 0.35 {
        step *= 5.0;
    } else if err <= 0.75 {
        step *= 2.0;
    }
    step
}

// ---------------------------------------------------------------------------
// LinearScale
// ---------------------------------------------------------------------------

/// Maps `domain` linearly onto `range`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    domain: Domain,
    range: [f64; 2],
}

impl LinearScale {
    /// Fails with [`PipelineError::DegenerateDomain`] when the domain has
    /// zero width; widen it first (see [`Domain::or_fallback`]).
    pub fn new(domain_low: f64, domain_high: f64, range_low: f64, range_high: f64) -> Result<Self> {
        LinearScale::from_domain(Domain::new(domain_low, domain_high), range_low, range_high)
    }

    pub fn from_domain(domain: Domain, range_low: f64, range_high: f64) -> Result<Self> {
        if domain.is_degenerate() {
            return Err(PipelineError::DegenerateDomain {
                low: domain.low,
                high: domain.high,
            });
        }
        Ok(LinearScale {
            domain,
            range: [range_low, range_high],
        })
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    pub fn apply(&self, value: f64) -> f64 {
        let [range_low, range_high] = self.range;
        range_low
            + (value - self.domain.low) / (self.domain.high - self.domain.low)
                * (range_high - range_low)
    }

    /// Map an output value back into the domain. A zero-width range maps
    /// everything to the low domain bound.
    pub fn invert(&self, output: f64) -> f64 {
        let [range_low, range_high] = self.range;
        if range_low == range_high {
            return self.domain.low;
        }
        self.domain.low
            + (output - range_low) / (range_high - range_low) * (self.domain.high - self.domain.low)
    }
}

/// Closure form of [`LinearScale::new`].
pub fn build_linear_scale(
    domain_low: f64,
    domain_high: f64,
    range_low: f64,
    range_high: f64,
) -> Result<impl Fn(f64) -> f64> {
    let scale = LinearScale::new(domain_low, domain_high, range_low, range_high)?;
    Ok(move |value: f64| scale.apply(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_round_trip_points() {
        let scale = build_linear_scale(0.0, 100.0, 0.0, 200.0).unwrap();
        assert_eq!(scale(0.0), 0.0);
        assert_eq!(scale(100.0), 200.0);
        assert_eq!(scale(50.0), 100.0);
    }

    #[test]
    fn test_inverted_range_and_invert() {
        let scale = LinearScale::new(0.0, 10.0, 400.0, 0.0).unwrap();
        assert_eq!(scale.apply(0.0), 400.0);
        assert_eq!(scale.apply(10.0), 0.0);
        assert_eq!(scale.apply(2.5), 300.0);
        assert_eq!(scale.invert(300.0), 2.5);
    }

    #[test]
    fn test_degenerate_domain() {
        let err = LinearScale::new(3.0, 3.0, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, PipelineError::DegenerateDomain { .. }));
        assert!(LinearScale::new(f64::NAN, 3.0, 0.0, 1.0).is_err());

        let fallback = Domain::new(3.0, 3.0).or_fallback();
        assert_eq!(fallback, Domain::new(2.0, 4.0));
        assert!(LinearScale::from_domain(fallback, 0.0, 1.0).is_ok());
    }

    #[test]
    fn test_widen_low() {
        assert_eq!(Domain::from_extent(10.0, 20.0).widen_low(0.05), Domain::new(9.5, 20.0));
        assert_eq!(Domain::from_extent(-10.0, 20.0).widen_low(0.05), Domain::new(-10.5, 20.0));
        assert_eq!(Domain::from_extent(20.0, 10.0), Domain::new(10.0, 20.0));
    }

    #[test]
    fn test_nice() {
        assert_eq!(Domain::new(0.95, 97.3).nice(10), Domain::new(0.0, 100.0));
        assert_eq!(Domain::new(-4.4, 12.8).nice(10), Domain::new(-6.0, 14.0));
        assert_eq!(Domain::new(5.0, 5.0).nice(10), Domain::new(5.0, 5.0));
    }
}
