//! All-pass sections: a tunable first-order stage (phaser) and a fixed
//! second-order network producing a quadrature pair (frequency shifter).

/// First-order all-pass with a tunable break frequency.
#[derive(Clone, Debug, Default)]
pub struct FirstOrderAllpass {
  a1: f32,
  zm1: f32,
}

impl FirstOrderAllpass {
  pub fn new() -> Self { Self { a1: 0.0, zm1: 0.0 } }
  /// Coefficient for a 90° point at `fc`; one value can be shared by a whole cascade.
  #[inline]
  pub fn coeff(fc: f32, sr: f32) -> f32 {
    let w = (std::f32::consts::PI * (fc / sr).clamp(1e-5, 0.49)).tan();
    (1.0 - w) / (1.0 + w)
  }
  #[inline]
  pub fn set_coeff(&mut self, a1: f32) { self.a1 = a1; }
  #[inline]
  pub fn set_fc(&mut self, fc: f32, sr: f32) { self.a1 = Self::coeff(fc, sr); }
  #[inline]
  pub fn tick(&mut self, x: f32) -> f32 {
    let y = -self.a1 * x + self.zm1;
    self.zm1 = x + self.a1 * y;
    y
  }
  pub fn reset(&mut self) { self.zm1 = 0.0; }
}

/// Polyphase half-band coefficients (12 stages, transition 0.0009). Even
/// entries form the in-phase path, odd entries the quadrature path.
const HILBERT_COEFFS: [f32; 12] = [
  0.079_697_604_925, 0.273_465_341_408, 0.492_331_349_164, 0.674_520_601_924,
  0.802_626_090_111, 0.884_328_222_730, 0.933_600_930_199, 0.962_415_559_514,
  0.979_036_892_643, 0.988_662_341_237, 0.994_446_709_566, 0.998_337_224_827,
];

/// `y[n] = c·(x[n] + y[n-2]) − x[n-2]`
#[derive(Clone, Copy, Debug, Default)]
struct Z2Allpass { c: f32, x1: f32, x2: f32, y1: f32, y2: f32 }

impl Z2Allpass {
  #[inline]
  fn tick(&mut self, x: f32) -> f32 {
    let y = self.c * (x + self.y2) - self.x2;
    self.x2 = self.x1; self.x1 = x;
    self.y2 = self.y1; self.y1 = y;
    y
  }
}

/// Broadband 90° phase splitter. `process` returns `(i, q)` where `q` lags
/// `i` by a quarter cycle across roughly 20 Hz .. 0.45·sr.
#[derive(Clone, Debug)]
pub struct HilbertPair {
  in_phase: [Z2Allpass; 6],
  quadrature: [Z2Allpass; 6],
  q_delay: f32,
}

impl HilbertPair {
  pub fn new() -> Self {
    let mut in_phase = [Z2Allpass::default(); 6];
    let mut quadrature = [Z2Allpass::default(); 6];
    for k in 0..6 {
      in_phase[k].c = HILBERT_COEFFS[2 * k];
      quadrature[k].c = HILBERT_COEFFS[2 * k + 1];
    }
    Self { in_phase, quadrature, q_delay: 0.0 }
  }

  #[inline]
  pub fn process(&mut self, x: f32) -> (f32, f32) {
    let i = self.in_phase.iter_mut().fold(x, |s, ap| ap.tick(s));
    let q_now = self.quadrature.iter_mut().fold(x, |s, ap| ap.tick(s));
    let q = self.q_delay;
    self.q_delay = q_now;
    (i, q)
  }

  pub fn reset(&mut self) {
    for ap in self.in_phase.iter_mut().chain(self.quadrature.iter_mut()) {
      ap.x1 = 0.0; ap.x2 = 0.0; ap.y1 = 0.0; ap.y2 = 0.0;
    }
    self.q_delay = 0.0;
  }
}

impl Default for HilbertPair {
  fn default() -> Self { Self::new() }
}
