/// Circular buffer with fractional (linear) reads.
///
/// Read first, then push: `read(d)` returns the sample pushed `d` pushes ago.
#[derive(Clone, Debug)]
pub struct DelayLine {
  buf: Vec<f32>,
  wr: usize,
}

impl DelayLine {
  pub fn new(max_delay: usize) -> Self {
    let len = (max_delay + 2).max(4);
    Self { buf: vec![0.0; len], wr: 0 }
  }

  pub fn with_max_seconds(seconds: f32, sr: f32) -> Self {
    Self::new((seconds.max(0.0) * sr).ceil() as usize)
  }

  /// Longest delay (in samples) that can be read.
  #[inline]
  pub fn max_delay(&self) -> f32 { (self.buf.len() - 2) as f32 }

  #[inline]
  fn wrap(&self, i: isize) -> usize {
    let m = self.buf.len() as isize;
    let mut k = i % m;
    if k < 0 { k += m; }
    k as usize
  }

  #[inline]
  pub fn read(&self, delay: f32) -> f32 {
    let d = if delay.is_finite() { delay.clamp(1.0, self.max_delay()) } else { 1.0 };
    let idx = self.wr as f32 - d;
    let i0 = idx.floor();
    let frac = idx - i0;
    let s0 = self.buf[self.wrap(i0 as isize)];
    let s1 = self.buf[self.wrap(i0 as isize + 1)];
    s0 + (s1 - s0) * frac
  }

  /// Whole-sample read without interpolation, `delay` pushes back.
  #[inline]
  pub fn tap(&self, delay: usize) -> f32 {
    let d = delay.clamp(1, self.buf.len() - 1);
    self.buf[self.wrap(self.wr as isize - d as isize)]
  }

  #[inline]
  pub fn push(&mut self, x: f32) {
    self.buf[self.wr] = x;
    self.wr += 1;
    if self.wr >= self.buf.len() { self.wr = 0; }
  }

  pub fn clear(&mut self) {
    self.buf.fill(0.0);
    self.wr = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn integer_delay_returns_pushed_sample() {
    let mut d = DelayLine::new(16);
    d.push(1.0);
    for _ in 0..4 { d.push(0.0); }
    assert_eq!(d.read(5.0), 1.0);
    assert_eq!(d.read(4.0), 0.0);
  }

  #[test]
  fn fractional_read_interpolates() {
    let mut d = DelayLine::new(8);
    d.push(1.0);
    d.push(0.0);
    // halfway between 1 and 2 samples back
    assert!((d.read(1.5) - 0.5).abs() < 1e-6);
  }

  #[test]
  fn out_of_range_delays_are_clamped() {
    let mut d = DelayLine::new(8);
    d.push(0.25);
    assert_eq!(d.read(0.0), 0.25);
    assert!(d.read(1e9).is_finite());
    assert_eq!(d.read(f32::NAN), 0.25);
  }

  #[test]
  fn tap_agrees_with_integer_read() {
    let mut d = DelayLine::new(32);
    for i in 0..40 { d.push(i as f32); }
    for k in 1..30 { assert_eq!(d.tap(k), d.read(k as f32)); }
    assert_eq!(d.tap(0), d.tap(1));
  }

  #[test]
  fn clear_silences() {
    let mut d = DelayLine::new(8);
    for _ in 0..20 { d.push(1.0); }
    d.clear();
    for k in 1..8 { assert_eq!(d.read(k as f32), 0.0); }
  }
}
