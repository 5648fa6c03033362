use super::{EffectMetadata, EffectUnit};
use crate::engine::dsp::oscillator::Lfo;
use crate::engine::params::ParamSpec;

static PARAMS: [ParamSpec; 3] = [
  ParamSpec::new("rate", "Rate", 0.1, 20.0, 5.0, Some("Hz")),
  ParamSpec::new("depth", "Depth", 0.0, 1.0, 0.5, None),
  ParamSpec::new("stereo_phase", "Stereo Phase", 0.0, 180.0, 0.0, Some("deg")),
];

pub static METADATA: EffectMetadata = EffectMetadata { id: "tremolo", name: "Tremolo", parameters: &PARAMS };

pub struct Tremolo {
  sr: f32,
  lfo: Lfo,
  rate: f32,
  depth: f32,
  /// Right channel offset in cycles.
  offset: f32,
}

impl Tremolo {
  pub fn new(sr: f32) -> Self {
    Self { sr, lfo: Lfo::default(), rate: PARAMS[0].default, depth: PARAMS[1].default, offset: PARAMS[2].default / 360.0 }
  }

  #[inline]
  fn gain(&self, m: f32) -> f32 { 1.0 - self.depth * (0.5 + 0.5 * m) }
}

impl EffectUnit for Tremolo {
  fn metadata(&self) -> &'static EffectMetadata { &METADATA }

  fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    let ph = self.lfo.phase();
    let mr = (std::f32::consts::TAU * (ph + self.offset)).sin();
    let ml = self.lfo.next(self.rate, self.sr);
    (l * self.gain(ml), r * self.gain(mr))
  }

  fn apply_param(&mut self, index: usize, value: f32) {
    match index {
      0 => self.rate = value,
      1 => self.depth = value,
      2 => self.offset = value / 360.0,
      _ => {}
    }
  }

  fn reset(&mut self) { self.lfo.reset(0.0); }
}
