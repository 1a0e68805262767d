//! Note sequences the CLI performs: an arpeggio or a held chord.
//!
//! A [`Score`] is a time-sorted list of note-on/note-off cues in seconds plus
//! an end time that leaves room for the last release tail. The live player
//! sleeps between cues on the control thread; the offline renderer advances
//! the synth clock up to each cue.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoteEvent {
    On(i32),
    Off(i32),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Cue {
    pub at: f64,
    pub event: NoteEvent,
}

#[derive(Clone, Debug, Default)]
pub struct Score {
    cues: Vec<Cue>,
    end: f64,
}

impl Score {
    /// Each note in turn for `length` seconds, `gap` seconds apart.
    pub fn arpeggio(notes: &[i32], length: f64, gap: f64, tail: f64) -> Self {
        let (length, gap) = (length.max(0.0), gap.max(0.0));
        let mut cues = Vec::with_capacity(notes.len() * 2);
        let mut t = 0.0;
        for &key in notes {
            cues.push(Cue { at: t, event: NoteEvent::On(key) });
            cues.push(Cue { at: t + length, event: NoteEvent::Off(key) });
            t += length + gap;
        }
        Self::finish(cues, tail)
    }

    /// All notes together for `length` seconds.
    pub fn chord(notes: &[i32], length: f64, tail: f64) -> Self {
        let length = length.max(0.0);
        let cues = notes
            .iter()
            .map(|&key| Cue { at: 0.0, event: NoteEvent::On(key) })
            .chain(notes.iter().map(|&key| Cue { at: length, event: NoteEvent::Off(key) }))
            .collect();
        Self::finish(cues, tail)
    }

    fn finish(mut cues: Vec<Cue>, tail: f64) -> Self {
        // stable: an Off and a re-On of the same key at one instant keep their order
        cues.sort_by(|a, b| a.at.total_cmp(&b.at));
        // A release and retrigger at the same instant would leave on == off,
        // which the engine treats as released. Retriggering alone restarts the
        // attack and keeps the note held.
        let cues: Vec<Cue> = cues
            .iter()
            .enumerate()
            .filter(|&(i, c)| !retriggered_at_once(c, &cues[i + 1..]))
            .map(|(_, c)| *c)
            .collect();
        let last = cues.last().map_or(0.0, |c| c.at);
        Self { cues, end: last + tail.max(0.0) }
    }

    #[inline] pub fn cues(&self) -> &[Cue] { &self.cues }

    /// Total running time in seconds, tail included.
    #[inline] pub fn end(&self) -> f64 { self.end }
}

/// `cue` is an `Off(k)` with an `On(k)` later at the same time.
fn retriggered_at_once(cue: &Cue, rest: &[Cue]) -> bool {
    let NoteEvent::Off(key) = cue.event else { return false };
    rest.iter()
        .take_while(|c| c.at == cue.at)
        .any(|c| c.event == NoteEvent::On(key))
}
