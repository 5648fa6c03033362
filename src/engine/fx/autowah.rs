use super::{mix, EffectMetadata, EffectUnit};
use crate::engine::dsp::svf::Svf;
use crate::engine::params::ParamSpec;

const MS: Option<&str> = Some("ms");

static PARAMS: [ParamSpec; 7] = [
  ParamSpec::new("attack", "Attack", 1.0, 100.0, 10.0, MS),
  ParamSpec::new("release", "Release", 10.0, 1_000.0, 120.0, MS),
  ParamSpec::new("sensitivity", "Sensitivity", 0.0, 10.0, 2.0, None),
  ParamSpec::new("base_freq", "Base Freq", 100.0, 2_000.0, 350.0, Some("Hz")),
  ParamSpec::new("range", "Range", 0.0, 5.0, 3.0, Some("oct")),
  ParamSpec::new("q", "Q", 0.5, 10.0, 3.0, None),
  ParamSpec::new("mix", "Mix", 0.0, 1.0, 1.0, None),
];

pub static METADATA: EffectMetadata = EffectMetadata { id: "autowah", name: "Auto-Wah", parameters: &PARAMS };

#[inline]
fn follower_coeff(ms: f32, sr: f32) -> f32 { (-1.0 / (ms * 0.001 * sr)).exp() }

/// Envelope follower steering a resonant band-pass.
pub struct AutoWah {
  sr: f32,
  svf_l: Svf,
  svf_r: Svf,
  env: f32,
  attack_c: f32,
  release_c: f32,
  sensitivity: f32,
  base_freq: f32,
  range: f32,
  q: f32,
  wet: f32,
}

impl AutoWah {
  pub fn new(sr: f32) -> Self {
    Self {
      sr,
      svf_l: Svf::new(),
      svf_r: Svf::new(),
      env: 0.0,
      attack_c: follower_coeff(PARAMS[0].default, sr),
      release_c: follower_coeff(PARAMS[1].default, sr),
      sensitivity: PARAMS[2].default,
      base_freq: PARAMS[3].default,
      range: PARAMS[4].default,
      q: PARAMS[5].default,
      wet: PARAMS[6].default,
    }
  }

  pub fn envelope(&self) -> f32 { self.env }

  /// Band-pass centre for the current envelope.
  pub fn center(&self) -> f32 {
    self.base_freq * (self.range * (self.env * self.sensitivity).min(1.0)).exp2()
  }
}

impl EffectUnit for AutoWah {
  fn metadata(&self) -> &'static EffectMetadata { &METADATA }

  fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    let level = 0.5 * (l.abs() + r.abs());
    let c = if level > self.env { self.attack_c } else { self.release_c };
    self.env = c * self.env + (1.0 - c) * level;
    let fc = self.center();
    self.svf_l.set_params(fc, self.q, self.sr);
    self.svf_r.set_params(fc, self.q, self.sr);
    let yl = self.svf_l.process(l).bp;
    let yr = self.svf_r.process(r).bp;
    (mix(l, yl, self.wet), mix(r, yr, self.wet))
  }

  fn apply_param(&mut self, index: usize, value: f32) {
    match index {
      0 => self.attack_c = follower_coeff(value, self.sr),
      1 => self.release_c = follower_coeff(value, self.sr),
      2 => self.sensitivity = value,
      3 => self.base_freq = value,
      4 => self.range = value,
      5 => self.q = value,
      6 => self.wet = value,
      _ => {}
    }
  }

  fn reset(&mut self) {
    self.svf_l.reset();
    self.svf_r.reset();
    self.env = 0.0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn louder_input_opens_the_filter() {
    let sr = 48_000.0;
    let mut w = AutoWah::new(sr);
    let at_rest = w.center();
    assert_eq!(at_rest, PARAMS[3].default);
    for i in 0..4_800 {
      let x = 0.8 * (std::f32::consts::TAU * 220.0 * i as f32 / sr).sin();
      w.process(x, x);
    }
    assert!(w.center() > 2.0 * at_rest, "{}", w.center());
    for _ in 0..(1.5 * sr) as usize { w.process(0.0, 0.0); }
    assert!(w.envelope() < 1e-3);
  }

  #[test]
  fn centre_never_exceeds_range() {
    let mut w = AutoWah::new(48_000.0);
    w.set_param(2, 10.0);
    for _ in 0..10_000 { w.process(1.0, 1.0); }
    let top = PARAMS[3].default * PARAMS[4].default.exp2();
    assert!(w.center() <= top * 1.0001);
  }
}
