use std::f32::consts::PI;

/// Trapezoidal state-variable filter. One call yields all four responses.
#[derive(Clone, Debug)]
pub struct Svf {
  ic1eq: f32,
  ic2eq: f32,
  g: f32,
  k: f32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SvfOut { pub lp: f32, pub hp: f32, pub bp: f32, pub notch: f32 }

impl Svf {
  pub fn new() -> Self { Self { ic1eq: 0.0, ic2eq: 0.0, g: 0.1, k: 0.5 } }

  pub fn set_params(&mut self, cutoff: f32, q: f32, sr: f32) {
    let fc = cutoff.clamp(1.0, 0.49 * sr);
    self.g = (PI * (fc / sr)).tan();
    self.k = 1.0 / q.max(0.001);
  }

  #[inline]
  pub fn process(&mut self, x: f32) -> SvfOut {
    let g = self.g; let k = self.k;
    let v1 = (self.ic1eq + g * (x - self.ic2eq)) / (1.0 + g * (g + k));
    let v2 = self.ic2eq + g * v1;
    self.ic1eq = 2.0 * v1 - self.ic1eq;
    self.ic2eq = 2.0 * v2 - self.ic2eq;
    let hp = x - k * v1 - v2;
    SvfOut { lp: v2, hp, bp: v1, notch: hp + v2 }
  }

  pub fn reset(&mut self) { self.ic1eq = 0.0; self.ic2eq = 0.0; }
}

impl Default for Svf {
  fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bandpass_peaks_at_cutoff() {
    let sr = 48_000.0;
    let level = |f: f32| {
      let mut s = Svf::new();
      s.set_params(1_000.0, 4.0, sr);
      let mut peak = 0.0f32;
      for i in 0..24_000 {
        let y = s.process((2.0 * PI * f * i as f32 / sr).sin()).bp;
        if i > 12_000 { peak = peak.max(y.abs()); }
      }
      peak
    };
    let at = level(1_000.0);
    assert!(at > 3.0 * level(100.0));
    assert!(at > 3.0 * level(10_000.0));
  }

  #[test]
  fn lowpass_settles_to_dc() {
    let mut s = Svf::new();
    s.set_params(500.0, 0.707, 48_000.0);
    let mut y = SvfOut::default();
    for _ in 0..10_000 { y = s.process(1.0); }
    assert!((y.lp - 1.0).abs() < 1e-3);
    assert!(y.hp.abs() < 1e-3);
  }
}
