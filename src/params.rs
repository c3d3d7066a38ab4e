use std::f64::consts::TAU;

use crate::error::{HeroError, HeroResult};

/// A sine pulse remapped from `[-1, 1]` onto `[base, base + amplitude]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Oscillator {
    pub base: f64,
    pub amplitude: f64,
    /// Cycles per loop.
    pub frequency: f64,
    /// Radians.
    pub phase: f64,
}

impl Oscillator {
    pub const fn new(base: f64, amplitude: f64, frequency: f64, phase: f64) -> Self {
        Self {
            base,
            amplitude,
            frequency,
            phase,
        }
    }

    /// Samples at loop position `t` in `[0, 1)`.
    pub fn sample(&self, t: f64) -> f64 {
        self.base + self.amplitude * (0.5 + 0.5 * (TAU * t * self.frequency + self.phase).sin())
    }

    pub fn min(&self) -> f64 {
        self.base
    }

    pub fn max(&self) -> f64 {
        self.base + self.amplitude
    }
}

pub const BAR_1: Oscillator = Oscillator::new(40.0, 120.0, 1.0, 0.0);
pub const BAR_2: Oscillator = Oscillator::new(40.0, 120.0, 1.4, 1.2);
pub const BAR_3: Oscillator = Oscillator::new(40.0, 120.0, 0.8, 2.5);
pub const PULSE: Oscillator = Oscillator::new(0.3, 0.5, 2.0, 0.0);

/// Loop position of `index` within a sequence of `frame_count` frames.
pub fn frame_time(index: u32, frame_count: u32) -> HeroResult<f64> {
    if frame_count == 0 {
        return Err(HeroError::validation("frame_count must be non-zero"));
    }
    if index >= frame_count {
        return Err(HeroError::validation(format!(
            "frame index {index} out of range 0..{frame_count}"
        )));
    }
    Ok(f64::from(index) / f64::from(frame_count))
}

/// Per-frame values for the scene's substitution slots.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameParams {
    /// Progress bar fill widths, in scene units.
    pub w1: f64,
    pub w2: f64,
    pub w3: f64,
    /// Opacity of the status dot.
    pub p1: f64,
}

impl FrameParams {
    pub fn at(index: u32, frame_count: u32) -> HeroResult<Self> {
        let t = frame_time(index, frame_count)?;
        Ok(Self::at_time(t))
    }

    pub fn at_time(t: f64) -> Self {
        let p = Self {
            w1: BAR_1.sample(t),
            w2: BAR_2.sample(t),
            w3: BAR_3.sample(t),
            p1: PULSE.sample(t),
        };
        debug_assert!(
            [(BAR_1, p.w1), (BAR_2, p.w2), (BAR_3, p.w3), (PULSE, p.p1)]
                .iter()
                .all(|(osc, v)| (osc.min()..=osc.max()).contains(v)),
            "frame parameters out of range at t={t}: {p:?}"
        );
        p
    }

    /// Slot name and formatted value pairs, ready for template substitution.
    pub fn slots(&self) -> [(&'static str, String); 4] {
        [
            ("w1", format!("{:.1}", self.w1)),
            ("w2", format!("{:.1}", self.w2)),
            ("w3", format!("{:.1}", self.w3)),
            ("p1", format!("{:.2}", self.p1)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn first_frame_matches_closed_form() {
        let p = FrameParams::at(0, 40).unwrap();
        assert!(approx(p.w1, 100.0));
        assert!(approx(p.p1, 0.55));

        let slots = p.slots();
        assert_eq!(slots[0], ("w1", "100.0".to_string()));
        assert_eq!(slots[3], ("p1", "0.55".to_string()));
    }

    #[test]
    fn quarter_loop_hits_bar_1_peak() {
        // t = 0.25 puts BAR_1 at sin(pi/2) and PULSE at sin(pi).
        let p = FrameParams::at(10, 40).unwrap();
        assert!(approx(p.w1, 160.0));
        assert!(approx(p.p1, 0.55));
    }

    #[test]
    fn parameters_stay_within_bounds() {
        for n in [1u32, 7, 40, 240] {
            for i in 0..n {
                let p = FrameParams::at(i, n).unwrap();
                for w in [p.w1, p.w2, p.w3] {
                    assert!((40.0..=160.0).contains(&w), "width {w} at {i}/{n}");
                }
                assert!((0.3..=0.8).contains(&p.p1), "opacity {} at {i}/{n}", p.p1);
            }
        }
        assert_eq!(BAR_2.min(), 40.0);
        assert_eq!(BAR_2.max(), 160.0);
        assert!(approx(PULSE.max(), 0.8));
    }

    #[test]
    fn parameters_are_deterministic() {
        for i in 0..40 {
            assert_eq!(FrameParams::at(i, 40).unwrap(), FrameParams::at(i, 40).unwrap());
        }
    }

    #[test]
    fn bars_are_out_of_phase() {
        let p = FrameParams::at(0, 40).unwrap();
        assert!(!approx(p.w1, p.w2));
        assert!(!approx(p.w2, p.w3));
    }

    #[test]
    fn frame_time_rejects_bad_indices() {
        assert!(frame_time(0, 0).is_err());
        assert!(frame_time(40, 40).is_err());
        assert!(approx(frame_time(20, 40).unwrap(), 0.5));
    }
}
