use super::fx::EffectSlot;

/// Control → render messages. Everything that needs heap work (building an
/// effect unit) happens before the message is sent.
pub enum EngineMsg {
  NoteOn { note: u8, vel: f32 },
  NoteOff { note: u8 },
  /// Channel pressure, already normalised to 0..1.
  Aftertouch { value: f32 },
  PitchBend { semitones: f32 },
  Sustain { down: bool },
  AllNotesOff,
  Panic,
  InsertEffect { position: usize, slot: EffectSlot },
  RemoveEffect { instance: u32 },
  MoveEffect { instance: u32, position: usize },
  /// Swap a unit for a freshly built one of the same kind (reset without
  /// allocating on the render thread).
  ReplaceEffect { slot: EffectSlot },
  SetEffectEnabled { instance: u32, enabled: bool },
  SetEffectParam { instance: u32, index: usize, value: f32 },
}

/// Render → control messages.
pub enum EngineStatus {
  VoiceCount(usize),
  /// A unit that left the chain; dropped on the control side.
  Retired(EffectSlot),
}

impl std::fmt::Debug for EngineMsg {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      EngineMsg::NoteOn { note, vel } => write!(f, "NoteOn({note}, {vel})"),
      EngineMsg::NoteOff { note } => write!(f, "NoteOff({note})"),
      EngineMsg::Aftertouch { value } => write!(f, "Aftertouch({value})"),
      EngineMsg::PitchBend { semitones } => write!(f, "PitchBend({semitones})"),
      EngineMsg::Sustain { down } => write!(f, "Sustain({down})"),
      EngineMsg::AllNotesOff => write!(f, "AllNotesOff"),
      EngineMsg::Panic => write!(f, "Panic"),
      EngineMsg::InsertEffect { position, slot } => write!(f, "InsertEffect({}#{} at {position})", slot.effect_id(), slot.instance),
      EngineMsg::RemoveEffect { instance } => write!(f, "RemoveEffect({instance})"),
      EngineMsg::MoveEffect { instance, position } => write!(f, "MoveEffect({instance} to {position})"),
      EngineMsg::ReplaceEffect { slot } => write!(f, "ReplaceEffect({}#{})", slot.effect_id(), slot.instance),
      EngineMsg::SetEffectEnabled { instance, enabled } => write!(f, "SetEffectEnabled({instance}, {enabled})"),
      EngineMsg::SetEffectParam { instance, index, value } => write!(f, "SetEffectParam({instance}, {index}, {value})"),
    }
  }
}
