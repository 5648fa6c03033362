#[inline]
pub fn midi_to_hz(note: f32) -> f32 { 440.0 * (2.0_f32).powf((note - 69.0) / 12.0) }

#[inline]
pub fn semitones_to_ratio(st: f32) -> f32 { (2.0_f32).powf(st / 12.0) }

/// Equal-power pan law: `l² + r² == 1` for every pan in -1..1.
#[inline]
pub fn equal_power_pan(pan: f32) -> (f32, f32) {
  let p = if pan.is_nan() { 0.0 } else { pan.clamp(-1.0, 1.0) };
  ((0.5 * (1.0 - p)).sqrt(), (0.5 * (1.0 + p)).sqrt())
}

#[inline]
pub fn db_to_gain(db: f32) -> f32 { (10.0f32).powf(db / 20.0) }

#[inline]
pub fn soft_clip(x: f32) -> f32 { (x.tanh()).clamp(-1.0, 1.0) }

/// Replace NaN/inf with silence.
#[inline]
pub fn finite_or_zero(x: f32) -> f32 { if x.is_finite() { x } else { 0.0 } }

/// One-pole parameter smoother.
#[derive(Clone, Debug)]
pub struct Smooth { pub y: f32, a: f32 }

impl Smooth {
  pub fn new(sr: f32, ms: f32) -> Self {
    Self { y: 0.0, a: Self::pole(sr, ms) }
  }
  /// Start already settled on `value` so the first samples are not a ramp from zero.
  pub fn settled(sr: f32, ms: f32, value: f32) -> Self {
    Self { y: value, a: Self::pole(sr, ms) }
  }
  #[inline]
  fn pole(sr: f32, ms: f32) -> f32 { if ms <= 0.0 { 0.0 } else { (-1.0 / (ms * 0.001 * sr)).exp() } }
  #[inline]
  pub fn snap(&mut self, value: f32) { self.y = value; }
  #[inline]
  pub fn next(&mut self, target: f32) -> f32 { self.y = self.a * self.y + (1.0 - self.a) * target; self.y }
}

/// xorshift32 white noise in -1..1; seeded so renders are reproducible.
#[derive(Clone, Debug)]
pub struct Noise { state: u32 }

impl Noise {
  pub fn new(seed: u32) -> Self { Self { state: if seed == 0 { 0x1234_5678 } else { seed } } }
  pub fn reseed(&mut self, seed: u32) { *self = Self::new(seed); }
  #[inline]
  pub fn next(&mut self) -> f32 {
    let mut x = self.state;
    x ^= x << 13; x ^= x >> 17; x ^= x << 5;
    self.state = x;
    ((x as f32) * 2.328_306_4e-10) * 2.0 - 1.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn midi_to_hz_reference_points() {
    assert_eq!(midi_to_hz(69.0), 440.0);
    assert!((midi_to_hz(60.0) - 261.6256).abs() < 1e-3);
    assert_eq!(midi_to_hz(81.0) / midi_to_hz(69.0), 2.0);
  }

  #[test]
  fn pan_is_equal_power() {
    let mut p = -1.0f32;
    while p <= 1.0 {
      let (l, r) = equal_power_pan(p);
      assert!((l * l + r * r - 1.0).abs() < 1e-4, "pan {p}: {l} {r}");
      p += 0.01;
    }
    let (l, r) = equal_power_pan(0.0);
    assert_eq!(l, r);
    assert!((l - 0.5f32.sqrt()).abs() < 1e-7);
    assert_eq!(equal_power_pan(-1.0), (1.0, 0.0));
    assert_eq!(equal_power_pan(1.0), (0.0, 1.0));
  }

  #[test]
  fn smooth_converges() {
    let mut s = Smooth::new(48_000.0, 5.0);
    for _ in 0..4800 { s.next(1.0); }
    assert!((s.y - 1.0).abs() < 1e-3);
    let mut snap = Smooth::settled(48_000.0, 5.0, 0.3);
    assert!((snap.next(0.3) - 0.3).abs() < 1e-6);
  }

  #[test]
  fn noise_stays_in_range_and_repeats() {
    let mut a = Noise::new(7);
    let mut b = Noise::new(7);
    for _ in 0..10_000 {
      let x = a.next();
      assert!((-1.0..=1.0).contains(&x));
      assert_eq!(x, b.next());
    }
  }

  #[test]
  fn finite_guard() {
    assert_eq!(finite_or_zero(f32::NAN), 0.0);
    assert_eq!(finite_or_zero(f32::INFINITY), 0.0);
    assert_eq!(finite_or_zero(0.25), 0.25);
  }
}
