use super::{mix, EffectMetadata, EffectUnit};
use crate::engine::dsp::delay_line::DelayLine;
use crate::engine::dsp::oscillator::Lfo;
use crate::engine::params::ParamSpec;

const HZ: Option<&str> = Some("Hz");
const MS: Option<&str> = Some("ms");
/// Right LFO runs a quarter cycle ahead.
const STEREO_OFFSET: f32 = 0.25;

static PARAMS: [ParamSpec; 4] = [
  ParamSpec::new("rate", "Rate", 0.05, 5.0, 0.8, HZ),
  ParamSpec::new("depth", "Depth", 0.0, 10.0, 3.0, MS),
  ParamSpec::new("delay", "Delay", 7.0, 30.0, 15.0, MS),
  ParamSpec::new("mix", "Mix", 0.0, 1.0, 0.5, None),
];

pub static METADATA: EffectMetadata = EffectMetadata { id: "chorus", name: "Chorus", parameters: &PARAMS };

pub struct Chorus {
  sr: f32,
  line_l: DelayLine,
  line_r: DelayLine,
  lfo_l: Lfo,
  lfo_r: Lfo,
  rate: f32,
  depth_ms: f32,
  delay_ms: f32,
  wet: f32,
}

impl Chorus {
  pub fn new(sr: f32) -> Self {
    let max_s = (PARAMS[1].max + PARAMS[2].max) * 0.001 + 0.002;
    Self {
      sr,
      line_l: DelayLine::with_max_seconds(max_s, sr),
      line_r: DelayLine::with_max_seconds(max_s, sr),
      lfo_l: Lfo::with_phase(0.0),
      lfo_r: Lfo::with_phase(STEREO_OFFSET),
      rate: PARAMS[0].default,
      depth_ms: PARAMS[1].default,
      delay_ms: PARAMS[2].default,
      wet: PARAMS[3].default,
    }
  }
}

impl EffectUnit for Chorus {
  fn metadata(&self) -> &'static EffectMetadata { &METADATA }

  fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    let to_samp = self.sr * 0.001;
    let ml = self.lfo_l.next(self.rate, self.sr) * 0.5 + 0.5;
    let mr = self.lfo_r.next(self.rate, self.sr) * 0.5 + 0.5;
    let yl = self.line_l.read((self.delay_ms + ml * self.depth_ms) * to_samp);
    let yr = self.line_r.read((self.delay_ms + mr * self.depth_ms) * to_samp);
    self.line_l.push(l);
    self.line_r.push(r);
    (mix(l, yl, self.wet), mix(r, yr, self.wet))
  }

  fn apply_param(&mut self, index: usize, value: f32) {
    match index {
      0 => self.rate = value,
      1 => self.depth_ms = value,
      2 => self.delay_ms = value,
      3 => self.wet = value,
      _ => {}
    }
  }

  fn reset(&mut self) {
    self.line_l.clear();
    self.line_r.clear();
    self.lfo_l.reset(0.0);
    self.lfo_r.reset(STEREO_OFFSET);
  }
}
