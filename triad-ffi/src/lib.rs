//! C ABI wrapper for the Triad synth.
//!
//! Exposes functions to create/destroy a synth, trigger and release notes,
//! render interleaved samples, and edit the patch.
//!
//! ABI notes
//! - All functions are `extern "C"` and `#[no_mangle]`.
//! - Opaque handle type: `TriadSynth` (heap-allocated; you own/delete it).
//! - Render path produces **mono** internally and duplicates to N channels.
//! - Slots are `0..=2`; waveform codes are `0` sine, `1` square, `2` saw,
//!   `3` triangle, `4` analog saw, `5` noise. Anything else is ignored.
//!
//! Threading
//! - The synth is internally locked: one control thread may trigger/release
//!   while one audio thread renders. Only `triad_destroy` needs exclusive use.

use triad_core::dsp::to_i16;
use triad_engine::{Oscillator, Slot, Synth, Waveform};

/// Opaque synth handle we hand to C.
pub struct TriadSynth {
    inner: Synth,
}

fn synth<'a>(handle: *const TriadSynth) -> Option<&'a Synth> {
    // SAFETY: callers pass either null or a live pointer from `triad_create`.
    unsafe { handle.as_ref() }.map(|h| &h.inner)
}

fn edit_slot(handle: *const TriadSynth, slot: u32, f: impl FnOnce(&mut Oscillator)) {
    let Some(s) = synth(handle) else { return };
    let Some(slot) = usize::try_from(slot).ok().and_then(Slot::from_index) else { return };
    s.edit_oscillator(slot, f);
}

// --- Creation / destruction -------------------------------------------------------

/// Create a synth with the default patch, clocked at `sample_rate`.
#[no_mangle]
pub extern "C" fn triad_create(sample_rate: u32) -> *mut TriadSynth {
    Box::into_raw(Box::new(TriadSynth { inner: Synth::new(sample_rate) }))
}

/// Destroy a synth previously returned by `triad_create`.
#[no_mangle]
pub extern "C" fn triad_destroy(handle: *mut TriadSynth) {
    if !handle.is_null() {
        // SAFETY: pointer came from `Box::into_raw` in `triad_create`.
        unsafe { drop(Box::from_raw(handle)) };
    }
}

// --- Notes -----------------------------------------------------------------------

/// Start (or restart) note `key`, in semitones from middle C.
#[no_mangle]
pub extern "C" fn triad_trigger(handle: *const TriadSynth, key: i32) {
    if let Some(s) = synth(handle) {
        s.trigger(key);
    }
}

#[no_mangle]
pub extern "C" fn triad_release(handle: *const TriadSynth, key: i32) {
    if let Some(s) = synth(handle) {
        s.release(key);
    }
}

/// Number of registered notes, including ones still in their release tail.
#[no_mangle]
pub extern "C" fn triad_active_notes(handle: *const TriadSynth) -> u32 {
    synth(handle).map_or(0, |s| u32::try_from(s.active_notes()).unwrap_or(u32::MAX))
}

/// Current sample-clock time in seconds.
#[no_mangle]
pub extern "C" fn triad_time(handle: *const TriadSynth) -> f64 {
    synth(handle).map_or(0.0, Synth::time)
}

// --- Rendering -------------------------------------------------------------------

/// Render `frames` of audio into an interleaved f32 buffer with `channels` channels.
///
/// Returns the number of frames rendered (0 on error).
#[no_mangle]
pub extern "C" fn triad_render_f32(
    handle: *const TriadSynth,
    out_interleaved: *mut f32,
    frames: u32,
    channels: u32,
) -> u32 {
    let Some(s) = synth(handle) else { return 0 };
    if out_interleaved.is_null() || frames == 0 || channels == 0 {
        return 0;
    }
    let ch = channels as usize;
    // SAFETY: caller guarantees room for `frames * channels` samples.
    let out = unsafe { std::slice::from_raw_parts_mut(out_interleaved, frames as usize * ch) };
    #[allow(clippy::cast_possible_truncation)]
    s.render_interleaved_with(out, ch, |v| v as f32);
    frames
}

/// Same as [`triad_render_f32`], as signed 16-bit PCM.
#[no_mangle]
pub extern "C" fn triad_render_i16(
    handle: *const TriadSynth,
    out_interleaved: *mut i16,
    frames: u32,
    channels: u32,
) -> u32 {
    let Some(s) = synth(handle) else { return 0 };
    if out_interleaved.is_null() || frames == 0 || channels == 0 {
        return 0;
    }
    let ch = channels as usize;
    // SAFETY: caller guarantees room for `frames * channels` samples.
    let out = unsafe { std::slice::from_raw_parts_mut(out_interleaved, frames as usize * ch) };
    s.render_interleaved_with(out, ch, to_i16);
    frames
}

// --- Patch -----------------------------------------------------------------------

/// Master volume, clamped to [0, 1].
#[no_mangle]
pub extern "C" fn triad_set_master_volume(handle: *const TriadSynth, volume: f64) {
    if let Some(s) = synth(handle) {
        s.set_master_volume(volume);
    }
}

#[no_mangle]
pub extern "C" fn triad_osc_set_waveform(handle: *const TriadSynth, slot: u32, code: u32) {
    let Some(w) = Waveform::from_code(code) else { return };
    edit_slot(handle, slot, |o| o.set_waveform(w));
}

#[no_mangle]
pub extern "C" fn triad_osc_set_amplitude(handle: *const TriadSynth, slot: u32, amplitude: f64) {
    edit_slot(handle, slot, |o| o.set_amplitude(amplitude));
}

/// Harmonic count for the analog saw, clamped to [2, 100].
#[no_mangle]
pub extern "C" fn triad_osc_set_partials(handle: *const TriadSynth, slot: u32, partials: u32) {
    edit_slot(handle, slot, |o| o.set_partials(partials));
}

#[no_mangle]
pub extern "C" fn triad_osc_set_vibrato(handle: *const TriadSynth, slot: u32, hz: f64, depth: f64) {
    edit_slot(handle, slot, |o| {
        o.set_vibrato_frequency(hz);
        o.set_vibrato_depth(depth);
    });
}

#[no_mangle]
pub extern "C" fn triad_osc_set_tremolo(handle: *const TriadSynth, slot: u32, hz: f64, depth: f64) {
    edit_slot(handle, slot, |o| {
        o.set_tremolo_frequency(hz);
        o.set_tremolo_depth(depth);
    });
}

/// Coarse tune in semitones, clamped to [-36, 36].
#[no_mangle]
pub extern "C" fn triad_osc_set_tune(handle: *const TriadSynth, slot: u32, semitones: i32) {
    edit_slot(handle, slot, |o| o.set_tune(semitones));
}

/// Fine tune in Hz, clamped to [-1, 1].
#[no_mangle]
pub extern "C" fn triad_osc_set_fine_tune(handle: *const TriadSynth, slot: u32, hz: f64) {
    edit_slot(handle, slot, |o| o.set_fine_tune(hz));
}

/// Replace every envelope stage at once; values are clamped like the setters.
#[no_mangle]
pub extern "C" fn triad_set_envelope(
    handle: *const TriadSynth,
    attack: f64,
    decay: f64,
    sustain: f64,
    release: f64,
    start: f64,
) {
    if let Some(s) = synth(handle) {
        s.edit_envelope(|e| {
            e.set_attack(attack);
            e.set_decay(decay);
            e.set_sustain_amplitude(sustain);
            e.set_release(release);
            e.set_start_amplitude(start);
        });
    }
}

// ------------------------------------ Tests --------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn null_handles_are_ignored() {
        triad_trigger(ptr::null(), 0);
        triad_release(ptr::null(), 0);
        triad_set_master_volume(ptr::null(), 0.3);
        triad_osc_set_tune(ptr::null(), 0, 3);
        triad_destroy(ptr::null_mut());
        assert_eq!(triad_active_notes(ptr::null()), 0);
        assert_eq!(triad_time(ptr::null()), 0.0);
        let mut buf = [1.0f32; 4];
        assert_eq!(triad_render_f32(ptr::null(), buf.as_mut_ptr(), 2, 2), 0);
        assert_eq!(buf, [1.0; 4]);
    }

    #[test]
    fn notes_and_render_through_the_abi() {
        let h = triad_create(1_000);
        triad_trigger(h, 0);
        triad_trigger(h, 7);
        assert_eq!(triad_active_notes(h), 2);

        let mut buf = vec![0.0f32; 200 * 2];
        assert_eq!(triad_render_f32(h, buf.as_mut_ptr(), 200, 2), 200);
        assert!(buf.chunks(2).all(|f| f[0] == f[1]));
        assert!(buf.iter().any(|&s| s != 0.0));
        assert!((triad_time(h) - 0.2).abs() < 1e-9);

        let mut pcm = vec![0i16; 100];
        assert_eq!(triad_render_i16(h, pcm.as_mut_ptr(), 100, 1), 100);
        assert!(pcm.iter().any(|&s| s != 0));

        assert_eq!(triad_render_f32(h, ptr::null_mut(), 10, 1), 0);
        assert_eq!(triad_render_f32(h, buf.as_mut_ptr(), 10, 0), 0);
        triad_destroy(h);
    }

    #[test]
    fn release_retires_notes() {
        let h = triad_create(1_000);
        triad_set_envelope(h, 0.01, 0.01, 0.5, 0.05, 1.0);
        triad_trigger(h, 3);
        let mut buf = vec![0.0f32; 100];
        triad_render_f32(h, buf.as_mut_ptr(), 100, 1);
        triad_release(h, 3);
        triad_render_f32(h, buf.as_mut_ptr(), 100, 1);
        assert_eq!(triad_active_notes(h), 0);
        triad_destroy(h);
    }

    #[test]
    fn slot_setters_clamp_and_skip_bad_codes() {
        let h = triad_create(48_000);
        triad_osc_set_waveform(h, 1, 4);
        triad_osc_set_waveform(h, 1, 99);
        triad_osc_set_waveform(h, 3, 1);
        triad_osc_set_amplitude(h, 0, 7.0);
        triad_osc_set_partials(h, 2, 1);
        triad_osc_set_vibrato(h, 0, 250.0, -1.0);
        triad_osc_set_tremolo(h, 2, 4.0, 0.25);
        triad_osc_set_tune(h, 0, -50);
        triad_osc_set_fine_tune(h, 2, 0.5);
        triad_set_master_volume(h, 2.0);

        // SAFETY: `h` is live until destroyed below.
        let s = unsafe { &(*h).inner };
        let one = s.oscillator(Slot::One);
        let two = s.oscillator(Slot::Two);
        let three = s.oscillator(Slot::Three);
        assert_eq!(two.waveform(), Waveform::AnalogSaw);
        assert_eq!(one.waveform(), Waveform::Sine);
        assert_eq!(one.amplitude(), 1.0);
        assert_eq!(three.partials(), 2);
        assert_eq!(one.vibrato_frequency(), 100.0);
        assert_eq!(one.vibrato_depth(), 0.0);
        assert_eq!(three.tremolo_frequency(), 4.0);
        assert_eq!(three.tremolo_depth(), 0.25);
        assert_eq!(one.tune(), -36);
        assert_eq!(three.fine_tune(), 0.5);
        assert_eq!(s.master_volume(), 1.0);
        triad_destroy(h);
    }
}
