use super::{mix, EffectMetadata, EffectUnit};
use crate::engine::dsp::util::db_to_gain;
use crate::engine::params::ParamSpec;

const DB: Option<&str> = Some("dB");

static PARAMS: [ParamSpec; 4] = [
  ParamSpec::new("drive", "Drive", 0.0, 36.0, 6.0, DB),
  ParamSpec::new("threshold", "Threshold", 0.05, 1.0, 0.7, None),
  ParamSpec::new("output", "Output", -24.0, 6.0, 0.0, DB),
  ParamSpec::new("mix", "Mix", 0.0, 1.0, 1.0, None),
];

pub static METADATA: EffectMetadata = EffectMetadata { id: "hardclip", name: "Hard Clip", parameters: &PARAMS };

/// Static clipper: gain up, flat-top at ±threshold, trim.
pub struct HardClip {
  drive: f32,
  threshold: f32,
  output: f32,
  wet: f32,
}

impl HardClip {
  pub fn new() -> Self {
    Self {
      drive: db_to_gain(PARAMS[0].default),
      threshold: PARAMS[1].default,
      output: db_to_gain(PARAMS[2].default),
      wet: PARAMS[3].default,
    }
  }

  #[inline]
  fn shape(&self, x: f32) -> f32 { (x * self.drive).clamp(-self.threshold, self.threshold) * self.output }
}

impl Default for HardClip {
  fn default() -> Self { Self::new() }
}

impl EffectUnit for HardClip {
  fn metadata(&self) -> &'static EffectMetadata { &METADATA }

  fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    (mix(l, self.shape(l), self.wet), mix(r, self.shape(r), self.wet))
  }

  fn apply_param(&mut self, index: usize, value: f32) {
    match index {
      0 => self.drive = db_to_gain(value),
      1 => self.threshold = value,
      2 => self.output = db_to_gain(value),
      3 => self.wet = value,
      _ => {}
    }
  }

  fn reset(&mut self) {}
}
