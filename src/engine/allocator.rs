use crate::engine::params::SynthParams;
use crate::engine::voice::Voice;

pub const MAX_VOICES: usize = 8;

/// Fixed voice pool with note → voice mapping and stealing.
///
/// Steal order: lowest-index idle voice, else the oldest voice already in
/// release, else the oldest sounding voice. Start stamps come from a
/// monotonic note-on counter so ties cannot happen.
pub struct VoiceAllocator {
  voices: Vec<Voice>,
  note_map: [Option<u8>; 128],
  clock: u64,
  sustain_down: bool,
  bend: f32,
  pressure: f32,
}

impl VoiceAllocator {
  pub fn new(sr: f32) -> Self {
    Self {
      voices: (0..MAX_VOICES).map(|i| Voice::new(i, sr)).collect(),
      note_map: [None; 128],
      clock: 0,
      sustain_down: false,
      bend: 0.0,
      pressure: 0.0,
    }
  }

  pub fn voices(&self) -> &[Voice] { &self.voices }

  pub fn active_count(&self) -> usize { self.voices.iter().filter(|v| v.is_active()).count() }

  /// Voice currently mapped to `note`, if the note is held.
  pub fn voice_for(&self, note: u8) -> Option<&Voice> {
    self.note_map.get(note as usize).copied().flatten().map(|i| &self.voices[i as usize])
  }

  pub fn note_on(&mut self, note: u8, velocity: f32) {
    if note > 127 { return; }
    let vel = if velocity.is_nan() { 0.0 } else { velocity.clamp(0.0, 1.0) };
    self.clock += 1;
    if let Some(i) = self.note_map[note as usize] {
      let v = &mut self.voices[i as usize];
      if v.note() == Some(note) {
        v.note_on(note, vel, self.clock);
        return;
      }
    }
    let i = self.pick_voice();
    if let Some(old) = self.voices[i].note() {
      if self.note_map[old as usize] == Some(i as u8) { self.note_map[old as usize] = None; }
    }
    self.voices[i].note_on(note, vel, self.clock);
    self.note_map[note as usize] = Some(i as u8);
  }

  fn pick_voice(&self) -> usize {
    if let Some(v) = self.voices.iter().find(|v| !v.is_active()) {
      return v.index();
    }
    let oldest = |releasing: bool| {
      self.voices.iter()
        .filter(|v| !releasing || v.is_releasing())
        .min_by_key(|v| v.started_at())
        .map(|v| v.index())
    };
    oldest(true).or_else(|| oldest(false)).unwrap_or(0)
  }

  pub fn note_off(&mut self, note: u8) {
    let Some(slot) = self.note_map.get_mut(note as usize) else { return };
    let Some(i) = *slot else { return };
    let v = &mut self.voices[i as usize];
    if v.note() != Some(note) { *slot = None; return; }
    if self.sustain_down {
      // keep the mapping so a repeat of the note lands on the same voice
      v.hold_for_sustain();
    } else {
      v.note_off();
      *slot = None;
    }
  }

  pub fn set_sustain(&mut self, down: bool) {
    self.sustain_down = down;
    if down { return; }
    for v in self.voices.iter_mut().filter(|v| v.is_sustained()) {
      if let Some(n) = v.note() {
        if self.note_map[n as usize] == Some(v.index() as u8) { self.note_map[n as usize] = None; }
      }
      v.note_off();
    }
  }

  /// Every sounding voice enters its normal release.
  pub fn all_notes_off(&mut self) {
    for v in self.voices.iter_mut() { v.note_off(); }
    self.note_map = [None; 128];
  }

  /// Every voice ramps to silence over a few milliseconds.
  pub fn panic(&mut self) {
    for v in self.voices.iter_mut() { v.kill(); }
    self.note_map = [None; 128];
    self.sustain_down = false;
  }

  pub fn set_pitch_bend(&mut self, semitones: f32) {
    self.bend = if semitones.is_finite() { semitones } else { 0.0 };
  }

  pub fn set_aftertouch(&mut self, pressure: f32) {
    self.pressure = if pressure.is_nan() { 0.0 } else { pressure.clamp(0.0, 1.0) };
  }

  pub fn prepare(&mut self, p: &SynthParams) {
    for v in self.voices.iter_mut() { v.prepare(p, self.bend, self.pressure); }
  }

  #[inline]
  pub fn next_frame(&mut self, p: &SynthParams) -> (f32, f32) {
    let mut l = 0.0;
    let mut r = 0.0;
    for v in self.voices.iter_mut() {
      let (vl, vr) = v.next_frame(p);
      l += vl;
      r += vr;
    }
    (l, r)
  }
}
