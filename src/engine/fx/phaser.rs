use super::{mix, EffectMetadata, EffectUnit};
use crate::engine::dsp::allpass::FirstOrderAllpass;
use crate::engine::dsp::oscillator::Lfo;
use crate::engine::params::ParamSpec;

const HZ: Option<&str> = Some("Hz");
const MAX_STAGES: usize = 12;

static PARAMS: [ParamSpec; 6] = [
  ParamSpec::new("rate", "Rate", 0.05, 5.0, 0.5, HZ),
  ParamSpec::new("stages", "Stages", 2.0, 12.0, 4.0, None),
  ParamSpec::new("min_freq", "Min Freq", 50.0, 2_000.0, 200.0, HZ),
  ParamSpec::new("max_freq", "Max Freq", 200.0, 12_000.0, 2_000.0, HZ),
  ParamSpec::new("feedback", "Feedback", 0.0, 0.9, 0.4, None),
  ParamSpec::new("mix", "Mix", 0.0, 1.0, 0.5, None),
];

pub static METADATA: EffectMetadata = EffectMetadata { id: "phaser", name: "Phaser", parameters: &PARAMS };

struct Channel {
  stages: [FirstOrderAllpass; MAX_STAGES],
  fb: f32,
  lfo: Lfo,
}

impl Channel {
  fn new(phase: f32) -> Self {
    Self { stages: std::array::from_fn(|_| FirstOrderAllpass::new()), fb: 0.0, lfo: Lfo::with_phase(phase) }
  }

  #[inline]
  fn tick(&mut self, x: f32, fc: f32, n: usize, feedback: f32, sr: f32) -> f32 {
    let a1 = FirstOrderAllpass::coeff(fc, sr);
    let mut y = x + feedback * self.fb;
    for ap in self.stages.iter_mut().take(n) {
      ap.set_coeff(a1);
      y = ap.tick(y);
    }
    self.fb = y;
    y
  }

  fn reset(&mut self, phase: f32) {
    for ap in self.stages.iter_mut() { ap.reset(); }
    self.fb = 0.0;
    self.lfo.reset(phase);
  }
}

/// Cascade of first-order all-passes swept exponentially between two
/// corner frequencies.
pub struct Phaser {
  sr: f32,
  left: Channel,
  right: Channel,
  rate: f32,
  stages: usize,
  min_freq: f32,
  max_freq: f32,
  feedback: f32,
  wet: f32,
}

impl Phaser {
  pub fn new(sr: f32) -> Self {
    Self {
      sr,
      left: Channel::new(0.0),
      right: Channel::new(0.25),
      rate: PARAMS[0].default,
      stages: PARAMS[1].default as usize,
      min_freq: PARAMS[2].default,
      max_freq: PARAMS[3].default,
      feedback: PARAMS[4].default,
      wet: PARAMS[5].default,
    }
  }

  #[inline]
  fn sweep(&self, m: f32) -> f32 {
    let (lo, hi) = if self.min_freq <= self.max_freq { (self.min_freq, self.max_freq) } else { (self.max_freq, self.min_freq) };
    lo * (hi / lo).powf(m)
  }
}

impl EffectUnit for Phaser {
  fn metadata(&self) -> &'static EffectMetadata { &METADATA }

  fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    let ml = self.left.lfo.next(self.rate, self.sr) * 0.5 + 0.5;
    let mr = self.right.lfo.next(self.rate, self.sr) * 0.5 + 0.5;
    let (fl, fr) = (self.sweep(ml), self.sweep(mr));
    let yl = self.left.tick(l, fl, self.stages, self.feedback, self.sr);
    let yr = self.right.tick(r, fr, self.stages, self.feedback, self.sr);
    (mix(l, yl, self.wet), mix(r, yr, self.wet))
  }

  fn apply_param(&mut self, index: usize, value: f32) {
    match index {
      0 => self.rate = value,
      1 => self.stages = (value.round() as usize).clamp(2, MAX_STAGES),
      2 => self.min_freq = value,
      3 => self.max_freq = value,
      4 => self.feedback = value,
      5 => self.wet = value,
      _ => {}
    }
  }

  fn reset(&mut self) {
    self.left.reset(0.0);
    self.right.reset(0.25);
  }
}
