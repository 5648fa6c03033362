use super::{mix, EffectMetadata, EffectUnit};
use crate::engine::params::ParamSpec;

static PARAMS: [ParamSpec; 3] = [
  ParamSpec::new("bits", "Bits", 1.0, 16.0, 8.0, None),
  ParamSpec::new("downsample", "Downsample", 1.0, 32.0, 1.0, None),
  ParamSpec::new("mix", "Mix", 0.0, 1.0, 1.0, None),
];

pub static METADATA: EffectMetadata = EffectMetadata { id: "bitcrusher", name: "Bit Crusher", parameters: &PARAMS };

pub struct BitCrusher {
  bits: u32,
  factor: u32,
  wet: f32,
  hold_l: f32,
  hold_r: f32,
  cnt: u32,
}

impl BitCrusher {
  pub fn new() -> Self {
    Self { bits: PARAMS[0].default as u32, factor: PARAMS[1].default as u32, wet: PARAMS[2].default, hold_l: 0.0, hold_r: 0.0, cnt: 0 }
  }

  #[inline]
  fn quantize(x: f32, bits: u32) -> f32 {
    let half = (1u32 << bits) as f32 / 2.0;
    ((x * half).round() / half).clamp(-1.0, 1.0)
  }
}

impl Default for BitCrusher {
  fn default() -> Self { Self::new() }
}

impl EffectUnit for BitCrusher {
  fn metadata(&self) -> &'static EffectMetadata { &METADATA }

  fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    if self.cnt == 0 {
      self.hold_l = Self::quantize(l, self.bits);
      self.hold_r = Self::quantize(r, self.bits);
    }
    self.cnt += 1;
    if self.cnt >= self.factor { self.cnt = 0; }
    (mix(l, self.hold_l, self.wet), mix(r, self.hold_r, self.wet))
  }

  fn apply_param(&mut self, index: usize, value: f32) {
    match index {
      0 => self.bits = (value.round() as u32).clamp(1, 16),
      1 => self.factor = (value.round() as u32).clamp(1, 32),
      2 => self.wet = value,
      _ => {}
    }
  }

  fn reset(&mut self) {
    self.hold_l = 0.0;
    self.hold_r = 0.0;
    self.cnt = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn one_bit_gives_three_levels() {
    for x in [-0.9f32, -0.2, 0.0, 0.3, 0.7] {
      let q = BitCrusher::quantize(x, 1);
      assert!(q == -1.0 || q == 0.0 || q == 1.0, "{x} -> {q}");
    }
    assert!((BitCrusher::quantize(0.3, 16) - 0.3).abs() < 1e-4);
  }

  #[test]
  fn downsample_holds_samples() {
    let mut c = BitCrusher::new();
    c.set_param(0, 16.0);
    c.set_param(1, 4.0);
    let out: Vec<f32> = (0..8).map(|i| c.process(i as f32 * 0.1, 0.0).0).collect();
    assert_eq!(out[0], out[3]);
    assert_ne!(out[3], out[4]);
    assert_eq!(out[4], out[7]);
  }
}
