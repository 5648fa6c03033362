use super::{mix, EffectMetadata, EffectUnit};
use crate::engine::dsp::delay_line::DelayLine;
use crate::engine::dsp::util::Smooth;
use crate::engine::params::ParamSpec;

const SEC: Option<&str> = Some("s");
const MAX_TIME: f32 = 2.0;
/// Upper bound on feedback + cross feedback so the loop always decays.
const MAX_LOOP_GAIN: f32 = 0.98;

static PARAMS: [ParamSpec; 5] = [
  ParamSpec::new("time_left", "Time L", 0.001, MAX_TIME, 0.25, SEC),
  ParamSpec::new("time_right", "Time R", 0.001, MAX_TIME, 0.375, SEC),
  ParamSpec::new("feedback", "Feedback", 0.0, 0.95, 0.35, None),
  ParamSpec::new("cross_feedback", "Cross FB", 0.0, 0.95, 0.0, None),
  ParamSpec::new("mix", "Mix", 0.0, 1.0, 0.3, None),
];

pub static METADATA: EffectMetadata = EffectMetadata { id: "delay", name: "Stereo Delay", parameters: &PARAMS };

/// Two delay lines with independent times, own feedback and cross feedback.
pub struct Delay {
  sr: f32,
  line_l: DelayLine,
  line_r: DelayLine,
  time_l: f32,
  time_r: f32,
  feedback: f32,
  cross: f32,
  wet: f32,
  time_l_s: Smooth,
  time_r_s: Smooth,
  fb_s: Smooth,
  cross_s: Smooth,
  wet_s: Smooth,
}

impl Delay {
  pub fn new(sr: f32) -> Self {
    let mut d = Self {
      sr,
      line_l: DelayLine::with_max_seconds(MAX_TIME, sr),
      line_r: DelayLine::with_max_seconds(MAX_TIME, sr),
      time_l: PARAMS[0].default,
      time_r: PARAMS[1].default,
      feedback: PARAMS[2].default,
      cross: PARAMS[3].default,
      wet: PARAMS[4].default,
      time_l_s: Smooth::new(sr, 15.0),
      time_r_s: Smooth::new(sr, 15.0),
      fb_s: Smooth::new(sr, 8.0),
      cross_s: Smooth::new(sr, 8.0),
      wet_s: Smooth::new(sr, 8.0),
    };
    d.snap_smoothers();
    d
  }

  /// Loop gains after limiting their sum.
  fn loop_gains(&self) -> (f32, f32) {
    let sum = self.feedback + self.cross;
    if sum > MAX_LOOP_GAIN {
      let k = MAX_LOOP_GAIN / sum;
      (self.feedback * k, self.cross * k)
    } else {
      (self.feedback, self.cross)
    }
  }

  fn snap_smoothers(&mut self) {
    let (fb, cross) = self.loop_gains();
    self.time_l_s.snap(self.time_l * self.sr);
    self.time_r_s.snap(self.time_r * self.sr);
    self.fb_s.snap(fb);
    self.cross_s.snap(cross);
    self.wet_s.snap(self.wet);
  }
}

impl EffectUnit for Delay {
  fn metadata(&self) -> &'static EffectMetadata { &METADATA }

  fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    let (fb_t, cross_t) = self.loop_gains();
    let dl = self.time_l_s.next(self.time_l * self.sr);
    let dr = self.time_r_s.next(self.time_r * self.sr);
    let fb = self.fb_s.next(fb_t);
    let cross = self.cross_s.next(cross_t);
    let wet = self.wet_s.next(self.wet);
    // read before write: no instantaneous feedback path
    let yl = self.line_l.read(dl);
    let yr = self.line_r.read(dr);
    self.line_l.push(l + yl * fb + yr * cross);
    self.line_r.push(r + yr * fb + yl * cross);
    (mix(l, yl, wet), mix(r, yr, wet))
  }

  fn apply_param(&mut self, index: usize, value: f32) {
    match index {
      0 => self.time_l = value,
      1 => self.time_r = value,
      2 => self.feedback = value,
      3 => self.cross = value,
      4 => self.wet = value,
      _ => {}
    }
  }

  fn reset(&mut self) {
    self.line_l.clear();
    self.line_r.clear();
    self.snap_smoothers();
  }
}
