//! Raw MIDI byte decoding for the messages the synth reacts to.
//!
//! Transport and device enumeration live outside the crate; whoever owns the
//! MIDI port hands the bytes to [`crate::SynthController::handle_midi`].

pub const BEND_CENTER: u16 = 8192;
pub const BEND_MAX: u16 = 16383;

pub const CC_SUSTAIN: u8 = 64;
pub const CC_ALL_SOUND_OFF: u8 = 120;
pub const CC_ALL_NOTES_OFF: u8 = 123;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiMessage {
  NoteOn { channel: u8, note: u8, velocity: u8 },
  NoteOff { channel: u8, note: u8 },
  /// 14-bit value, 8192 = centre.
  PitchBend { channel: u8, value: u16 },
  ChannelPressure { channel: u8, value: u8 },
  ControlChange { channel: u8, controller: u8, value: u8 },
  Other,
}

impl MidiMessage {
  /// Decode one short message. Returns `None` for an empty slice; truncated or
  /// unsupported messages decode to `Other`.
  pub fn parse(bytes: &[u8]) -> Option<Self> {
    let status = *bytes.first()?;
    let channel = status & 0x0F;
    let data = |i: usize| bytes.get(i).map(|b| b & 0x7F);
    let msg = match (status & 0xF0, data(1), data(2)) {
      (0x90, Some(note), Some(0)) => MidiMessage::NoteOff { channel, note },
      (0x90, Some(note), Some(velocity)) => MidiMessage::NoteOn { channel, note, velocity },
      (0x80, Some(note), Some(_)) => MidiMessage::NoteOff { channel, note },
      (0xE0, Some(lsb), Some(msb)) => MidiMessage::PitchBend { channel, value: (lsb as u16) | ((msb as u16) << 7) },
      (0xD0, Some(value), _) => MidiMessage::ChannelPressure { channel, value },
      (0xB0, Some(controller), Some(value)) => MidiMessage::ControlChange { channel, controller, value },
      _ => MidiMessage::Other,
    };
    Some(msg)
  }
}

/// Normalise a 14-bit bend value to -1..1 (both ends reach exactly ±1).
#[inline]
pub fn bend_normalized(value: u16) -> f32 {
  let v = value.min(BEND_MAX) as f32 - BEND_CENTER as f32;
  if v >= 0.0 { v / (BEND_MAX - BEND_CENTER) as f32 } else { v / BEND_CENTER as f32 }
}

/// 14-bit bend value to semitones for a given bend range.
#[inline]
pub fn bend_to_semitones(value: u16, range: f32) -> f32 { bend_normalized(value) * range }
