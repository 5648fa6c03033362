use thiserror::Error;

/// Failures reported to control-plane callers. None of these ever reach the
/// render callback.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
  #[error("midi note {0} is outside 0..=127")]
  InvalidNote(i32),
  #[error("unknown parameter `{0}`")]
  UnknownParam(String),
  #[error("unknown effect `{0}`")]
  UnknownEffect(String),
  #[error("no effect instance with id {0} in the chain")]
  UnknownInstance(u32),
  #[error("effect chain is full ({0} units)")]
  ChainFull(usize),
  #[error("control queue is full, message dropped")]
  QueueFull,
  #[error("render engine is gone")]
  Disconnected,
}
