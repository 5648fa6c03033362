//! Cascaded biquad lowpass/highpass bank with lazily recomputed coefficients.
//!
//! Coefficients come from the bilinear transform with a pre-warped cutoff
//! (the RBJ cookbook forms). Every stage shares one coefficient set; only the
//! delay elements are per stage.

use std::f64::consts::PI;

/// Cutoff must move at least this much (Hz) before coefficients are rebuilt.
pub const CUTOFF_EPS: f32 = 0.1;
pub const RES_EPS: f32 = 0.001;
pub const MIN_CUTOFF: f32 = 10.0;
pub const MAX_RESONANCE: f32 = 0.99;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
  /// Two identical stages, 24 dB/oct.
  Lowpass24,
  /// Three identical stages, 18 dB/oct.
  Highpass18,
}

impl FilterKind {
  #[inline]
  pub fn stages(self) -> usize { match self { FilterKind::Lowpass24 => 2, FilterKind::Highpass18 => 3 } }
}

#[inline]
pub fn resonance_to_q(res: f32) -> f32 { 1.0 / (2.0 - 2.0 * res.clamp(0.0, MAX_RESONANCE) + 0.1) }

#[derive(Clone, Copy, Debug, PartialEq)]
struct Coeffs { b0: f32, b1: f32, b2: f32, a1: f32, a2: f32 }

impl Coeffs {
  const PASS: Coeffs = Coeffs { b0: 1.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0 };

  fn design(kind: FilterKind, cutoff: f32, q: f32, sr: f32) -> Self {
    let w0 = 2.0 * PI * cutoff as f64 / sr as f64;
    let (sin_w0, cos_w0) = w0.sin_cos();
    let alpha = sin_w0 / (2.0 * q as f64);
    let a0 = 1.0 + alpha;
    let (b0, b1, b2) = match kind {
      FilterKind::Lowpass24 => { let b1 = 1.0 - cos_w0; (b1 * 0.5, b1, b1 * 0.5) }
      FilterKind::Highpass18 => { let b1 = -(1.0 + cos_w0); (-b1 * 0.5, b1, -b1 * 0.5) }
    };
    Coeffs {
      b0: (b0 / a0) as f32,
      b1: (b1 / a0) as f32,
      b2: (b2 / a0) as f32,
      a1: (-2.0 * cos_w0 / a0) as f32,
      a2: ((1.0 - alpha) / a0) as f32,
    }
  }
}

#[derive(Clone, Copy, Debug, Default)]
struct StageState { x1: f32, x2: f32, y1: f32, y2: f32 }

#[derive(Clone, Debug)]
pub struct FilterBank {
  sr: f32,
  kind: FilterKind,
  coeffs: Coeffs,
  stages: [StageState; 3],
  last_cutoff: f32,
  last_res: f32,
  last_kind: Option<FilterKind>,
  updates: u32,
}

impl FilterBank {
  pub fn new(kind: FilterKind, sr: f32) -> Self {
    Self { sr, kind, coeffs: Coeffs::PASS, stages: [StageState::default(); 3], last_cutoff: -1.0, last_res: -1.0, last_kind: None, updates: 0 }
  }

  /// Retune the bank. Changes below the hysteresis thresholds are ignored.
  pub fn set(&mut self, kind: FilterKind, cutoff: f32, resonance: f32) {
    let max = 0.45 * self.sr;
    let cutoff = if cutoff.is_finite() { cutoff.clamp(MIN_CUTOFF, max) } else if self.last_cutoff > 0.0 { self.last_cutoff } else { max };
    let res = if resonance.is_finite() { resonance.clamp(0.0, MAX_RESONANCE) } else { 0.0 };
    if self.last_kind == Some(kind)
      && (cutoff - self.last_cutoff).abs() < CUTOFF_EPS
      && (res - self.last_res).abs() < RES_EPS
    {
      return;
    }
    self.kind = kind;
    self.coeffs = Coeffs::design(kind, cutoff, resonance_to_q(res), self.sr);
    self.last_cutoff = cutoff;
    self.last_res = res;
    self.last_kind = Some(kind);
    self.updates = self.updates.wrapping_add(1);
  }

  #[inline]
  pub fn process(&mut self, x: f32) -> f32 {
    let c = self.coeffs;
    let mut sig = x;
    for st in self.stages.iter_mut().take(self.kind.stages()) {
      let y = c.b0 * sig + c.b1 * st.x1 + c.b2 * st.x2 - c.a1 * st.y1 - c.a2 * st.y2;
      st.x2 = st.x1; st.x1 = sig;
      st.y2 = st.y1; st.y1 = y;
      sig = y;
    }
    sig
  }

  /// Clear delay elements; coefficients are kept.
  pub fn reset(&mut self) { self.stages = [StageState::default(); 3]; }

  /// Effective (clamped) cutoff of the current coefficient set.
  pub fn cutoff(&self) -> f32 { self.last_cutoff }
  pub fn kind(&self) -> FilterKind { self.kind }
  /// How many times coefficients have been rebuilt.
  pub fn coefficient_updates(&self) -> u32 { self.updates }
}
