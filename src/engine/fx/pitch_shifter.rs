use std::f32::consts::PI;

use super::{mix, EffectMetadata, EffectUnit};
use crate::engine::dsp::delay_line::DelayLine;
use crate::engine::dsp::util::semitones_to_ratio;
use crate::engine::params::ParamSpec;

static PARAMS: [ParamSpec; 3] = [
  ParamSpec::new("semitones", "Semitones", -12.0, 12.0, 7.0, Some("st")),
  ParamSpec::new("window", "Window", 20.0, 200.0, 60.0, Some("ms")),
  ParamSpec::new("mix", "Mix", 0.0, 1.0, 1.0, None),
];

pub static METADATA: EffectMetadata = EffectMetadata { id: "pitchshifter", name: "Pitch Shifter", parameters: &PARAMS };

/// How far past the nominal splice point a new grain may start.
const SEARCH_S: f32 = 0.015;
/// Length of the segment compared when choosing a splice.
const CORR_S: f32 = 0.008;
/// Closest a tap may read behind the write head.
const MIN_DELAY: f32 = 2.0;

/// Two read taps sweep a delay line at the resampling rate, crossfaded with
/// complementary Hann gains. When a tap is silent it jumps to a new start
/// point; the jump is chosen by cross-correlation against the other tap so
/// the two stay in phase through the next crossfade.
pub struct PitchShifter {
  sr: f32,
  line_l: DelayLine,
  line_r: DelayLine,
  /// Read delay of each tap, in samples.
  delay: [f32; 2],
  /// Grain position of tap 0 in [0, 1); tap 1 runs half a grain ahead.
  phase: f32,
  ratio: f32,
  /// Grain length in samples.
  grain: f32,
  wet: f32,
  search: usize,
  corr_len: usize,
}

impl PitchShifter {
  pub fn new(sr: f32) -> Self {
    let max_s = PARAMS[1].max * 0.001 + 2.0 * SEARCH_S + CORR_S + 0.005;
    let mut ps = Self {
      sr,
      line_l: DelayLine::with_max_seconds(max_s, sr),
      line_r: DelayLine::with_max_seconds(max_s, sr),
      delay: [MIN_DELAY; 2],
      phase: 0.0,
      ratio: semitones_to_ratio(PARAMS[0].default),
      grain: PARAMS[1].default * 0.001 * sr,
      wet: PARAMS[2].default,
      search: (SEARCH_S * sr) as usize,
      corr_len: ((CORR_S * sr) as usize).max(1),
    };
    ps.delay = [ps.nominal_start(); 2];
    ps
  }

  /// Earliest start delay that keeps a rising tap behind the write head for a whole grain.
  #[inline]
  fn nominal_start(&self) -> f32 { MIN_DELAY + ((self.ratio - 1.0) * self.grain).max(0.0) }

  #[inline]
  fn mono(&self, delay: usize) -> f32 { self.line_l.tap(delay) + self.line_r.tap(delay) }

  /// Restart `tap` at the candidate delay whose recent history best matches the other tap's.
  fn splice(&mut self, tap: usize) {
    let other = self.delay[1 - tap];
    let reference = other.round().max(1.0) as usize;
    let first = self.nominal_start().ceil() as usize + 1;
    let mut best = first;
    let mut best_score = f32::MIN;
    for cand in first..=first + self.search {
      let mut xy = 0.0f32;
      let mut yy = 0.0f32;
      for k in 0..self.corr_len {
        let a = self.mono(reference + k);
        let b = self.mono(cand + k);
        xy += a * b;
        yy += b * b;
      }
      let score = xy / (yy + 1e-9).sqrt();
      if score > best_score {
        best_score = score;
        best = cand;
      }
    }
    let d = other + (best as f32 - reference as f32);
    self.delay[tap] = d.clamp(MIN_DELAY, self.line_l.max_delay());
  }
}

impl EffectUnit for PitchShifter {
  fn metadata(&self) -> &'static EffectMetadata { &METADATA }

  fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    let ga = (PI * self.phase).sin().powi(2);
    let gb = 1.0 - ga;
    let [da, db] = self.delay;
    let yl = self.line_l.read(da) * ga + self.line_l.read(db) * gb;
    let yr = self.line_r.read(da) * ga + self.line_r.read(db) * gb;
    self.line_l.push(l);
    self.line_r.push(r);

    // delay shrinks when shifting up, grows when shifting down
    let step = 1.0 - self.ratio;
    let max = self.line_l.max_delay();
    for d in self.delay.iter_mut() { *d = (*d + step).clamp(MIN_DELAY, max); }

    let prev = self.phase;
    self.phase += 1.0 / self.grain;
    if self.phase >= 1.0 {
      self.phase = (self.phase - 1.0).min(0.999);
      self.splice(0);
    } else if prev < 0.5 && self.phase >= 0.5 {
      self.splice(1);
    }
    (mix(l, yl, self.wet), mix(r, yr, self.wet))
  }

  fn apply_param(&mut self, index: usize, value: f32) {
    match index {
      0 => self.ratio = semitones_to_ratio(value),
      1 => self.grain = value * 0.001 * self.sr,
      2 => self.wet = value,
      _ => {}
    }
  }

  fn reset(&mut self) {
    self.line_l.clear();
    self.line_r.clear();
    self.phase = 0.0;
    self.delay = [self.nominal_start(); 2];
  }
}
