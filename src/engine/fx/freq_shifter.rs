use std::f32::consts::TAU;

use super::{mix, EffectMetadata, EffectUnit};
use crate::engine::dsp::allpass::HilbertPair;
use crate::engine::params::ParamSpec;

static PARAMS: [ParamSpec; 2] = [
  ParamSpec::new("shift", "Shift", -2_000.0, 2_000.0, 100.0, Some("Hz")),
  ParamSpec::new("mix", "Mix", 0.0, 1.0, 1.0, None),
];

pub static METADATA: EffectMetadata = EffectMetadata { id: "freqshifter", name: "Frequency Shifter", parameters: &PARAMS };

/// Single-sideband shifter: Hilbert pair per channel, quadrature oscillator,
/// upper sideband `i·cos − q·sin`.
pub struct FreqShifter {
  sr: f32,
  hilbert_l: HilbertPair,
  hilbert_r: HilbertPair,
  /// Oscillator phase in cycles, kept in [0, 1).
  phase: f32,
  shift: f32,
  wet: f32,
}

impl FreqShifter {
  pub fn new(sr: f32) -> Self {
    Self { sr, hilbert_l: HilbertPair::new(), hilbert_r: HilbertPair::new(), phase: 0.0, shift: PARAMS[0].default, wet: PARAMS[1].default }
  }
}

impl EffectUnit for FreqShifter {
  fn metadata(&self) -> &'static EffectMetadata { &METADATA }

  fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    let (s, c) = (TAU * self.phase).sin_cos();
    self.phase = (self.phase + self.shift / self.sr).rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if self.phase >= 1.0 { self.phase = 0.0; }
    let (il, ql) = self.hilbert_l.process(l);
    let (ir, qr) = self.hilbert_r.process(r);
    let yl = il * c - ql * s;
    let yr = ir * c - qr * s;
    (mix(l, yl, self.wet), mix(r, yr, self.wet))
  }

  fn apply_param(&mut self, index: usize, value: f32) {
    match index {
      0 => self.shift = value,
      1 => self.wet = value,
      _ => {}
    }
  }

  fn reset(&mut self) {
    self.hilbert_l.reset();
    self.hilbert_r.reset();
    self.phase = 0.0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rustfft::{num_complex::Complex, FftPlanner};

  const SR: f32 = 48_000.0;
  const N: usize = 16_384;

  /// Magnitude spectrum of the left output for a sine input.
  fn spectrum(shift: f32, input_hz: f32) -> Vec<f32> {
    let mut fs = FreqShifter::new(SR);
    fs.set_param(0, shift);
    fs.set_param(1, 1.0);
    // let the all-pass network settle
    for i in 0..4_800 { fs.process((TAU * input_hz * i as f32 / SR).sin(), 0.0); }
    let mut buf: Vec<Complex<f32>> = (0..N)
      .map(|k| {
        let i = k + 4_800;
        let (y, _) = fs.process((TAU * input_hz * i as f32 / SR).sin(), 0.0);
        // Hann window
        let w = 0.5 - 0.5 * (TAU * k as f32 / N as f32).cos();
        Complex::new(y * w, 0.0)
      })
      .collect();
    FftPlanner::new().plan_fft_forward(N).process(&mut buf);
    buf[..N / 2].iter().map(|c| c.norm()).collect()
  }

  fn bin_of(hz: f32) -> usize { (hz * N as f32 / SR).round() as usize }

  fn peak_bin(mag: &[f32]) -> usize {
    mag.iter().enumerate().fold((0, 0.0f32), |best, (i, &m)| if m > best.1 { (i, m) } else { best }).0
  }

  #[test]
  fn shifts_sine_up() {
    let mag = spectrum(200.0, 1_000.0);
    let peak = peak_bin(&mag);
    assert!((peak as i64 - bin_of(1_200.0) as i64).abs() <= 1, "peak at bin {peak}");
    assert!(mag[bin_of(800.0)] < 0.05 * mag[peak]);
    assert!(mag[bin_of(1_000.0)] < 0.05 * mag[peak]);
  }

  #[test]
  fn negative_shift_moves_down() {
    let mag = spectrum(-300.0, 1_000.0);
    let peak = peak_bin(&mag);
    assert!((peak as i64 - bin_of(700.0) as i64).abs() <= 1, "peak at bin {peak}");
  }

  #[test]
  fn zero_shift_is_a_pure_phase_change() {
    let mut fs = FreqShifter::new(SR);
    fs.set_param(0, 0.0);
    fs.set_param(1, 1.0);
    let mut peak = 0.0f32;
    for i in 0..48_000 {
      let (y, _) = fs.process((TAU * 440.0 * i as f32 / SR).sin(), 0.0);
      if i > 4_800 { peak = peak.max(y.abs()); }
    }
    assert!((peak - 1.0).abs() < 0.02, "{peak}");
  }

  #[test]
  fn oscillator_phase_stays_wrapped() {
    let mut fs = FreqShifter::new(SR);
    fs.set_param(0, -2_000.0);
    for _ in 0..10_000 {
      fs.process(0.1, 0.1);
      assert!((0.0..1.0).contains(&fs.phase));
    }
  }
}
