//! ADSR generator with one-pole exponential segments.
//!
//! Each segment approaches its target with a coefficient chosen so the ramp
//! covers ~99% of the distance in the configured time, whatever the sample rate.

use crate::engine::params::AdsrParams;

/// ln(100): number of time constants in a 99% settle.
const SETTLE_K: f32 = 4.6;
/// Attack aims slightly past 1.0 so the ramp reaches full scale without a final jump.
const ATTACK_TARGET: f32 = 1.01;
const SILENCE: f32 = 1e-4;
const SUSTAIN_EPS: f32 = 1e-4;
/// Length of the forced ramp used by panic.
pub const KILL_TIME: f32 = 0.005;

/// Per-sample coefficient for a segment of `time` seconds. `time <= 0` snaps.
#[inline]
pub fn env_coeff(time: f32, sr: f32) -> f32 {
  if !(time > 0.0) { return 1.0; }
  let x = 1.0 / ((time / SETTLE_K) * sr);
  -(-x).exp_m1()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage { Idle, Attack, Decay, Sustain, Release }

#[derive(Clone, Debug)]
pub struct Adsr {
  sr: f32,
  stage: Stage,
  level: f32,
  attack_c: f32,
  decay_c: f32,
  release_c: f32,
  sustain: f32,
  last: Option<AdsrParams>,
  killing: bool,
}

impl Adsr {
  pub fn new(sr: f32) -> Self {
    let mut env = Self { sr, stage: Stage::Idle, level: 0.0, attack_c: 1.0, decay_c: 1.0, release_c: 1.0, sustain: 1.0, last: None, killing: false };
    env.set(&AdsrParams { attack: 0.01, decay: 0.1, sustain: 0.8, release: 0.2 });
    env
  }

  /// Update segment times; coefficients are only recomputed when something changed.
  pub fn set(&mut self, p: &AdsrParams) {
    if self.last.as_ref() == Some(p) { return; }
    self.attack_c = env_coeff(p.attack, self.sr);
    self.decay_c = env_coeff(p.decay, self.sr);
    self.release_c = env_coeff(p.release, self.sr);
    self.sustain = p.sustain.clamp(0.0, 1.0);
    self.last = Some(*p);
  }

  /// Start (or re-arm) the attack from whatever level the envelope is at.
  pub fn gate_on(&mut self) { self.stage = Stage::Attack; self.killing = false; }

  pub fn gate_off(&mut self) {
    if self.stage != Stage::Idle { self.stage = Stage::Release; }
  }

  /// Short forced release used by panic; still a ramp, never a hard zero.
  pub fn kill(&mut self) {
    if self.stage != Stage::Idle { self.stage = Stage::Release; self.killing = true; }
  }

  pub fn reset(&mut self) { self.stage = Stage::Idle; self.level = 0.0; self.killing = false; }

  #[inline]
  pub fn stage(&self) -> Stage { self.stage }
  #[inline]
  pub fn level(&self) -> f32 { self.level }
  #[inline]
  pub fn is_idle(&self) -> bool { self.stage == Stage::Idle }

  #[inline]
  pub fn next(&mut self) -> f32 {
    match self.stage {
      Stage::Idle => { self.level = 0.0; }
      Stage::Attack => {
        self.level += self.attack_c * (ATTACK_TARGET - self.level);
        if self.level >= 1.0 { self.level = 1.0; self.stage = Stage::Decay; }
      }
      Stage::Decay => {
        self.level += self.decay_c * (self.sustain - self.level);
        if (self.level - self.sustain).abs() < SUSTAIN_EPS { self.level = self.sustain; self.stage = Stage::Sustain; }
      }
      Stage::Sustain => {
        // follow live sustain edits without a step
        self.level += self.decay_c * (self.sustain - self.level);
      }
      Stage::Release => {
        let c = if self.killing { env_coeff(KILL_TIME, self.sr) } else { self.release_c };
        self.level += c * (0.0 - self.level);
        if self.level < SILENCE { self.level = 0.0; self.stage = Stage::Idle; self.killing = false; }
      }
    }
    self.level
  }
}
