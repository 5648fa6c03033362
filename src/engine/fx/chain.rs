use super::EffectSlot;

/// Ordered effect slots living on the render thread. Capacity is reserved up
/// front, so edits never allocate; removed units are handed back to the
/// caller to be dropped elsewhere.
pub struct FxChain {
  slots: Vec<EffectSlot>,
}

impl FxChain {
  pub fn with_capacity(max_len: usize) -> Self { Self { slots: Vec::with_capacity(max_len) } }

  pub fn len(&self) -> usize { self.slots.len() }
  pub fn is_empty(&self) -> bool { self.slots.is_empty() }
  pub fn capacity(&self) -> usize { self.slots.capacity() }

  fn position_of(&self, instance: u32) -> Option<usize> {
    self.slots.iter().position(|s| s.instance == instance)
  }

  /// Insert at `position` (clamped to the end). A full chain gives the slot back.
  pub fn insert(&mut self, position: usize, slot: EffectSlot) -> Result<(), EffectSlot> {
    if self.slots.len() >= self.slots.capacity() { return Err(slot); }
    let at = position.min(self.slots.len());
    self.slots.insert(at, slot);
    Ok(())
  }

  pub fn remove(&mut self, instance: u32) -> Option<EffectSlot> {
    self.position_of(instance).map(|i| self.slots.remove(i))
  }

  /// Move a unit to `position` (clamped); the relative order of the rest is kept.
  pub fn move_to(&mut self, instance: u32, position: usize) -> bool {
    let Some(from) = self.position_of(instance) else { return false };
    let to = position.min(self.slots.len() - 1);
    if from < to {
      self.slots[from..=to].rotate_left(1);
    } else if to < from {
      self.slots[to..=from].rotate_right(1);
    }
    true
  }

  /// Swap in a fresh unit with the same instance id, returning the old one.
  /// An unknown instance returns the new slot instead.
  pub fn replace(&mut self, slot: EffectSlot) -> EffectSlot {
    match self.position_of(slot.instance) {
      Some(i) => std::mem::replace(&mut self.slots[i], slot),
      None => slot,
    }
  }

  pub fn set_enabled(&mut self, instance: u32, enabled: bool) -> bool {
    self.position_of(instance).map(|i| self.slots[i].set_enabled(enabled)).is_some()
  }

  pub fn set_param(&mut self, instance: u32, index: usize, value: f32) -> bool {
    self.position_of(instance).map(|i| self.slots[i].set_param(index, value)).is_some()
  }

  pub fn instances(&self) -> impl Iterator<Item = u32> + '_ { self.slots.iter().map(|s| s.instance) }

  #[inline]
  pub fn process(&mut self, l: f32, r: f32) -> (f32, f32) {
    self.slots.iter_mut().fold((l, r), |(l, r), slot| slot.process(l, r))
  }
}
