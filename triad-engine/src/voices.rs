//! Note registry: which keys are sounding, and since when.
//!
//! A [`Note`] is only a pair of timestamps plus a key; the sound itself comes
//! from the shared oscillators and envelope. The registry keeps notes in
//! insertion order, never holds two active entries for one key, and drops
//! notes the mixing pass has marked finished.

/// Slots reserved up front so ordinary playing does not allocate.
pub const DEFAULT_CAPACITY: usize = 64;

/// One sounding (or fading) key.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Note {
    pub key: i32,
    /// Trigger time in seconds.
    pub on: f64,
    /// Release time in seconds; `None` until the key is first released.
    pub off: Option<f64>,
    /// Cleared by the mixing pass once the note has faded out.
    pub active: bool,
}

impl Note {
    #[inline]
    fn new(key: i32, now: f64) -> Self {
        Self { key, on: now, off: None, active: true }
    }

    /// Held while never released, or retriggered after the last release.
    #[inline]
    pub fn is_held(&self) -> bool {
        self.off.map_or(true, |off| self.on > off)
    }

    /// Released strictly after the latest trigger. Only these notes may be
    /// retired when their envelope reaches zero.
    #[inline]
    pub fn is_retirable(&self) -> bool {
        self.off.is_some_and(|off| off > self.on)
    }
}

#[derive(Clone, Debug)]
pub struct NoteRegistry {
    notes: Vec<Note>,
}

impl Default for NoteRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl NoteRegistry {
    pub fn with_capacity(cap: usize) -> Self {
        Self { notes: Vec::with_capacity(cap) }
    }

    /// Start `key` at `now`, or restart it if it is already sounding.
    /// Returns `true` when a new entry was created.
    pub fn trigger(&mut self, key: i32, now: f64) -> bool {
        match self.notes.iter_mut().find(|n| n.key == key && n.active) {
            Some(note) => {
                note.on = now;
                false
            }
            None => {
                self.notes.push(Note::new(key, now));
                true
            }
        }
    }

    /// Stamp every entry for `key` as released at `now`.
    /// Returns how many entries matched.
    pub fn release(&mut self, key: i32, now: f64) -> usize {
        let mut hits = 0;
        for note in self.notes.iter_mut().filter(|n| n.key == key) {
            note.off = Some(now);
            hits += 1;
        }
        hits
    }

    /// Stamp every entry as released at `now`. Returns how many there were.
    pub fn release_all(&mut self, now: f64) -> usize {
        for note in &mut self.notes {
            note.off = Some(now);
        }
        self.notes.len()
    }

    /// Drop every note marked inactive, keeping the order of the rest.
    /// Returns the number removed.
    pub fn prune(&mut self) -> usize {
        let before = self.notes.len();
        self.notes.retain(|n| n.active);
        before - self.notes.len()
    }

    #[inline] pub fn len(&self) -> usize { self.notes.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.notes.is_empty() }

    #[inline]
    pub fn contains(&self, key: i32) -> bool {
        self.notes.iter().any(|n| n.key == key)
    }

    #[inline]
    pub fn get(&self, key: i32) -> Option<&Note> {
        self.notes.iter().find(|n| n.key == key)
    }

    #[inline] pub fn iter(&self) -> impl Iterator<Item = &Note> { self.notes.iter() }
    #[inline] pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Note> { self.notes.iter_mut() }

    /// Forget every note immediately (no release tail).
    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_creates_held_note() {
        let mut reg = NoteRegistry::default();
        assert!(reg.trigger(4, 0.0));
        let note = reg.get(4).copied().unwrap();
        assert!(note.is_held());
        assert!(!note.is_retirable());
        assert_eq!(note.on, 0.0);
        assert_eq!(note.off, None);
    }

    #[test]
    fn retrigger_does_not_duplicate() {
        let mut reg = NoteRegistry::default();
        reg.trigger(0, 0.0);
        reg.trigger(7, 0.1);
        assert!(!reg.trigger(0, 0.5));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get(0).unwrap().on, 0.5);
    }

    #[test]
    fn release_then_retrigger_holds_again() {
        let mut reg = NoteRegistry::default();
        reg.trigger(2, 1.0);
        assert_eq!(reg.release(2, 1.5), 1);
        let released = *reg.get(2).unwrap();
        assert!(!released.is_held());
        assert!(released.is_retirable());

        reg.trigger(2, 1.7);
        let again = *reg.get(2).unwrap();
        assert!(again.is_held());
        assert!(!again.is_retirable());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn same_instant_release_is_not_retirable() {
        let mut reg = NoteRegistry::default();
        reg.trigger(3, 2.0);
        reg.release(3, 2.0);
        let note = *reg.get(3).unwrap();
        assert!(!note.is_held());
        assert!(!note.is_retirable());
    }

    #[test]
    fn release_all_stamps_every_entry() {
        let mut reg = NoteRegistry::default();
        reg.trigger(0, 0.0);
        reg.trigger(4, 0.25);
        assert_eq!(reg.release_all(1.0), 2);
        assert!(reg.iter().all(|n| n.off == Some(1.0) && n.is_retirable()));
        assert_eq!(NoteRegistry::default().release_all(1.0), 0);
    }

    #[test]
    fn release_of_unknown_key_is_a_no_op() {
        let mut reg = NoteRegistry::default();
        reg.trigger(1, 0.0);
        assert_eq!(reg.release(9, 0.2), 0);
        assert!(reg.get(1).unwrap().is_held());
    }

    #[test]
    fn prune_keeps_order() {
        let mut reg = NoteRegistry::default();
        for k in 0..5 {
            reg.trigger(k, 0.0);
        }
        for n in reg.iter_mut().filter(|n| n.key % 2 == 1) {
            n.active = false;
        }
        assert_eq!(reg.prune(), 2);
        let keys: Vec<i32> = reg.iter().map(|n| n.key).collect();
        assert_eq!(keys, vec![0, 2, 4]);
    }

    #[test]
    fn inactive_entry_does_not_block_a_new_trigger() {
        let mut reg = NoteRegistry::default();
        reg.trigger(5, 0.0);
        reg.iter_mut().for_each(|n| n.active = false);
        assert!(reg.trigger(5, 1.0));
        assert_eq!(reg.len(), 2);
        reg.prune();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(5).unwrap().on, 1.0);
    }
}
