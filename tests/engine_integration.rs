//! Engine-level tests: MIDI sources driving the voice bank.

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use approx::assert_relative_eq;
use notewire::prelude::*;

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn chord_from_two_devices() {
    let midi = VirtualMidi::new();
    let keys = midi.connect_input("keys", "Keys");
    let pads = midi.connect_input("pads", "Pads");
    let engine = NotewireEngine::builder()
        .virtual_backend(midi.clone())
        .watch_topology(false)
        .build()
        .unwrap();
    assert!(engine.is_ready());
    assert_eq!(engine.inputs().len(), 2);

    midi.send(&keys, &[0x90, 60, 127]);
    midi.send(&keys, &[0x90, 64, 127]);
    midi.send(&pads, &[0x90, 67, 127]);

    let voices = engine.voices().active_voices();
    assert_eq!(voices.len(), 3);
    assert_relative_eq!(voices[0].frequency, 261.625_57, max_relative = 1e-5);
    assert_relative_eq!(engine.voices().output_level(), 0.75, max_relative = 1e-6);

    midi.send(&pads, &[0x80, 64, 0]);
    assert!(engine.voices().voice(0, 64).is_none());
}

#[test]
fn hot_plugged_keyboard_plays_without_reinitializing() {
    let midi = VirtualMidi::new();
    let engine = NotewireEngine::builder()
        .virtual_backend(midi.clone())
        .build()
        .unwrap();
    assert!(engine.inputs().is_empty());

    let late = midi.connect_input("late", "USB Keyboard");
    assert!(wait_until(Duration::from_secs(2), || engine.inputs().len() == 1));

    midi.send(&late, &[0x9F, 69, 64]);
    let voice = engine.voices().voice(15, 69).unwrap();
    assert_relative_eq!(voice.frequency, 440.0);
    assert_eq!(engine.midi().list_inputs()[0].name, "USB Keyboard");
}

#[test]
fn user_handlers_coexist_with_voices() {
    let midi = VirtualMidi::new();
    let id = midi.connect_input("keys", "Keys");
    let engine = NotewireEngine::builder()
        .virtual_backend(midi.clone())
        .watch_topology(false)
        .build()
        .unwrap();

    let bend = Arc::new(AtomicI32::new(0));
    let programs = Arc::new(AtomicUsize::new(0));
    let b = bend.clone();
    let p = programs.clone();
    engine
        .midi()
        .on_pitch_bend(move |value, _, _| b.store(i32::from(value), Ordering::SeqCst))
        .on_program_change(move |_, _| {
            p.fetch_add(1, Ordering::SeqCst);
        });

    midi.send(&id, &[0xE0, 0x7F, 0x7F]);
    midi.send(&id, &[0xC0, 5]);
    midi.send(&id, &[0x90, 60, 100]);

    assert_eq!(bend.load(Ordering::SeqCst), 8191);
    assert_eq!(programs.load(Ordering::SeqCst), 1);
    assert_eq!(engine.voices().active_count(), 1);
}

#[test]
fn overwriting_note_slot_detaches_voices() {
    let midi = VirtualMidi::new();
    let id = midi.connect_input("keys", "Keys");
    let engine = NotewireEngine::builder()
        .virtual_backend(midi.clone())
        .watch_topology(false)
        .build()
        .unwrap();

    let seen = Arc::new(AtomicUsize::new(0));
    let s = seen.clone();
    engine.midi().on_note_on(move |_, _, _| {
        s.fetch_add(1, Ordering::SeqCst);
    });

    midi.send(&id, &[0x90, 60, 100]);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert!(engine.voices().is_silent());
}

#[test]
fn denied_access_engine_is_inert() {
    let midi = VirtualMidi::new().deny_access("blocked by user");
    let id = midi.connect_input("keys", "Keys");
    let engine = NotewireEngine::builder()
        .virtual_backend(midi.clone())
        .build()
        .unwrap();

    assert!(!engine.is_ready());
    assert!(matches!(engine.midi().state(), AccessState::Failed(_)));
    assert!(!midi.send(&id, &[0x90, 60, 100]));
    assert!(engine.voices().is_silent());

    let err = engine.midi().initialize().unwrap_err();
    let err: notewire::Error = err.into();
    assert!(matches!(err, notewire::Error::Midi(_)));
}
