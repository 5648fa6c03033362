//! Phase accumulators and PolyBLEP band-limited waveforms.

use std::f32::consts::TAU;

/// PolyBLEP (polynomial band-limited step) residual.
///
/// `t` is the phase in [0, 1), `dt` the phase increment per sample. Non-zero
/// only within one increment of the wrap; negative just after it, positive
/// just before it.
#[inline]
pub fn poly_blep(t: f32, dt: f32) -> f32 {
  if dt <= 0.0 { return 0.0; }
  if t < dt {
    let t = t / dt;
    2.0 * t - t * t - 1.0
  } else if t > 1.0 - dt {
    let t = (t - 1.0) / dt;
    t * t + 2.0 * t + 1.0
  } else {
    0.0
  }
}

/// Variable-width pulse with both edges corrected.
#[inline]
pub fn pulse(phase: f32, width: f32, dt: f32) -> f32 {
  let mut v = if phase < width { 1.0 } else { -1.0 };
  v += poly_blep(phase, dt);
  v -= poly_blep((phase - width).rem_euclid(1.0), dt);
  v
}

#[inline]
pub fn saw(phase: f32, dt: f32) -> f32 { 2.0 * phase - 1.0 - poly_blep(phase, dt) }

#[inline]
pub fn triangle(phase: f32) -> f32 { if phase < 0.5 { 4.0 * phase - 1.0 } else { 3.0 - 4.0 * phase } }

#[inline]
pub fn sine(phase: f32) -> f32 { (TAU * phase).sin() }

/// Normalised phase accumulator. Read the phase, then `advance`.
#[derive(Clone, Debug, Default)]
pub struct Phasor { phase: f32 }

impl Phasor {
  pub fn new(phase: f32) -> Self { Self { phase: phase.rem_euclid(1.0) } }
  #[inline]
  pub fn phase(&self) -> f32 { self.phase }
  /// Move by `inc` cycles; returns true when the phase wrapped.
  #[inline]
  pub fn advance(&mut self, inc: f32) -> bool {
    self.phase += inc;
    if self.phase >= 1.0 { self.phase -= self.phase.floor(); true }
    else if self.phase < 0.0 { self.phase = self.phase.rem_euclid(1.0); false }
    else { false }
  }
  #[inline]
  pub fn reset(&mut self, phase: f32) { self.phase = phase; }
}

/// Sine LFO returning -1..1.
#[derive(Clone, Debug, Default)]
pub struct Lfo { phasor: Phasor }

impl Lfo {
  pub fn with_phase(phase: f32) -> Self { Self { phasor: Phasor::new(phase) } }
  #[inline]
  pub fn next(&mut self, rate_hz: f32, sr: f32) -> f32 {
    let v = sine(self.phasor.phase());
    self.phasor.advance(rate_hz.max(0.0) / sr);
    v
  }
  pub fn phase(&self) -> f32 { self.phasor.phase() }
  pub fn reset(&mut self, phase: f32) { self.phasor.reset(phase); }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blep_is_zero_away_from_edges() {
    let dt = 0.01;
    for t in [0.011f32, 0.2, 0.5, 0.8, 0.989] {
      assert_eq!(poly_blep(t, dt), 0.0, "t={t}");
    }
  }

  #[test]
  fn blep_edges_are_mirrored() {
    let dt = 0.01;
    let after = poly_blep(0.005, dt);
    let before = poly_blep(0.995, dt);
    assert!(after < 0.0 && before > 0.0);
    assert!((after.abs() - before.abs()).abs() < 0.1);
  }

  #[test]
  fn pulse_steps_are_softened() {
    let sr = 48_000.0;
    let dt = 5_000.0 / sr;
    let mut ph = Phasor::default();
    let mut prev_blep = pulse(ph.phase(), 0.3, dt);
    let mut prev_naive = if ph.phase() < 0.3 { 1.0f32 } else { -1.0 };
    let (mut max_blep, mut max_naive) = (0.0f32, 0.0f32);
    ph.advance(dt);
    for _ in 0..4_800 {
      let p = ph.phase();
      let b = pulse(p, 0.3, dt);
      let n = if p < 0.3 { 1.0 } else { -1.0 };
      max_blep = max_blep.max((b - prev_blep).abs());
      max_naive = max_naive.max((n - prev_naive).abs());
      prev_blep = b; prev_naive = n;
      ph.advance(dt);
    }
    assert_eq!(max_naive, 2.0);
    assert!(max_blep < 1.6, "got {max_blep}");
  }

  #[test]
  fn waveforms_stay_bounded() {
    let dt = 440.0 / 48_000.0;
    let mut ph = Phasor::default();
    for _ in 0..48_000 {
      let p = ph.phase();
      for v in [pulse(p, 0.1, dt), saw(p, dt), triangle(p), sine(p)] {
        assert!(v.abs() <= 1.5, "{v}");
      }
      ph.advance(dt);
    }
  }

  #[test]
  fn phasor_wraps_and_reports() {
    let mut ph = Phasor::new(0.9);
    assert!(!ph.advance(0.05));
    assert!(ph.advance(0.1));
    assert!((ph.phase() - 0.05).abs() < 1e-6);
  }

  #[test]
  fn lfo_is_periodic() {
    let mut lfo = Lfo::default();
    let sr = 1_000.0;
    let first = lfo.next(10.0, sr);
    for _ in 0..99 { lfo.next(10.0, sr); }
    assert!((lfo.next(10.0, sr) - first).abs() < 1e-3);
  }
}
