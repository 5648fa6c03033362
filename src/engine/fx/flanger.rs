use super::{mix, EffectMetadata, EffectUnit};
use crate::engine::dsp::delay_line::DelayLine;
use crate::engine::dsp::oscillator::Lfo;
use crate::engine::params::ParamSpec;

const MS: Option<&str> = Some("ms");

static PARAMS: [ParamSpec; 5] = [
  ParamSpec::new("rate", "Rate", 0.05, 5.0, 0.25, Some("Hz")),
  ParamSpec::new("delay", "Delay", 0.5, 5.0, 1.0, MS),
  ParamSpec::new("depth", "Depth", 0.0, 5.0, 2.0, MS),
  ParamSpec::new("feedback", "Feedback", -0.95, 0.95, 0.5, None),
  ParamSpec::new("mix", "Mix", 0.0, 1.0, 0.5, None),
];

pub static METADATA: EffectMetadata = EffectMetadata { id: "flanger", name: "Flanger", parameters: &PARAMS };

/// Short LFO-swept delay with signed feedback; sweep stays inside 0.5..10 ms.
pub struct Flanger {
  sr: f32,
  line_l: DelayLine,
  line_r: DelayLine,
  lfo_l: Lfo,
  lfo_r: Lfo,
  fb_l: f32,
  fb_r: f32,
  rate: f32,
  delay_ms: f32,
  depth_ms: f32,
  feedback: f32,
  wet: f32,
}

impl Flanger {
  pub fn new(sr: f32) -> Self {
    Self {
      sr,
      line_l: DelayLine::with_max_seconds(0.012, sr),
      line_r: DelayLine::with_max_seconds(0.012, sr),
      lfo_l: Lfo::with_phase(0.0),
      lfo_r: Lfo::with_phase(0.33),
      fb_l: 0.0,
      fb_r: 0.0,
      rate: PARAMS[0].default,
      delay_ms: PARAMS[1].default,
      depth_ms: PARAMS[2].default,
      feedback: PARAMS[3].default,
      wet: PARAMS[4].default,
    }
  }
}

impl EffectUnit for Flanger {
  fn metadata(&self) -> &'static EffectMetadata { &METADATA }

  fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    let to_samp = self.sr * 0.001;
    let ml = self.lfo_l.next(self.rate, self.sr) * 0.5 + 0.5;
    let mr = self.lfo_r.next(self.rate, self.sr) * 0.5 + 0.5;
    let yl = self.line_l.read((self.delay_ms + ml * self.depth_ms) * to_samp);
    let yr = self.line_r.read((self.delay_ms + mr * self.depth_ms) * to_samp);
    self.line_l.push(l + self.feedback * self.fb_l);
    self.line_r.push(r + self.feedback * self.fb_r);
    self.fb_l = yl;
    self.fb_r = yr;
    (mix(l, yl, self.wet), mix(r, yr, self.wet))
  }

  fn apply_param(&mut self, index: usize, value: f32) {
    match index {
      0 => self.rate = value,
      1 => self.delay_ms = value,
      2 => self.depth_ms = value,
      3 => self.feedback = value,
      4 => self.wet = value,
      _ => {}
    }
  }

  fn reset(&mut self) {
    self.line_l.clear();
    self.line_r.clear();
    self.lfo_l.reset(0.0);
    self.lfo_r.reset(0.33);
    self.fb_l = 0.0;
    self.fb_r = 0.0;
  }
}
