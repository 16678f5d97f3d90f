//! End-to-end tests over the virtual backend: access, attach, hot-plug.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use notewire_midi_io::{
    AccessState, Error, EventKind, MidiSystem, PortState, SourceId, VirtualMidi,
};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    NoteOn(u8, u8, u8),
    NoteOff(u8, u8, u8),
    Controller(u8, u8, u8),
    PitchBend(i16, u8, u16),
}

fn recording_system(midi: &VirtualMidi, watch: bool) -> (MidiSystem, Arc<Mutex<Vec<Call>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let system = MidiSystem::builder()
        .backend(midi.clone())
        .watch_topology(watch)
        .build()
        .unwrap();

    let on = calls.clone();
    let off = calls.clone();
    let cc = calls.clone();
    let bend = calls.clone();
    system
        .on_note_on(move |n, v, c| on.lock().push(Call::NoteOn(n, v, c)))
        .on_note_off(move |n, v, c| off.lock().push(Call::NoteOff(n, v, c)))
        .on_controller_change(move |n, v, c| cc.lock().push(Call::Controller(n, v, c)))
        .on_pitch_bend(move |b, c, raw| bend.lock().push(Call::PitchBend(b, c, raw)));

    (system, calls)
}

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
fn messages_from_every_source_reach_one_parser() {
    let midi = VirtualMidi::new();
    let keys = midi.connect_input("keys", "Keys");
    let pads = midi.connect_input("pads", "Pads");
    let (system, calls) = recording_system(&midi, false);
    system.initialize().unwrap();

    midi.send(&keys, &[0x90, 60, 100]);
    midi.send(&pads, &[0x99, 36, 127]);
    midi.send(&keys, &[0x80, 60, 64]);
    midi.send(&pads, &[0xE0, 0x00, 0x40]);

    assert_eq!(
        *calls.lock(),
        vec![
            Call::NoteOn(60, 100, 0),
            Call::NoteOn(36, 127, 9),
            Call::NoteOff(60, 64, 0),
            Call::PitchBend(0, 0, 8192),
        ]
    );
}

#[test]
fn note_on_velocity_zero_is_note_off() {
    let midi = VirtualMidi::new();
    let id = midi.connect_input("keys", "Keys");
    let (system, calls) = recording_system(&midi, false);
    system.initialize().unwrap();

    midi.send(&id, &[0x93, 64, 0]);
    assert_eq!(*calls.lock(), vec![Call::NoteOff(64, 0, 3)]);
}

#[test]
fn system_messages_are_ignored() {
    let midi = VirtualMidi::new();
    let id = midi.connect_input("keys", "Keys");
    let (system, calls) = recording_system(&midi, false);
    system.initialize().unwrap();

    for status in 0xF0..=0xFFu8 {
        midi.send(&id, &[status, 1, 2]);
    }
    midi.send(&id, &[0x90]);
    assert!(calls.lock().is_empty());
}

#[test]
fn initializing_twice_does_not_duplicate_dispatch() {
    let midi = VirtualMidi::new();
    let id = midi.connect_input("keys", "Keys");
    let (system, calls) = recording_system(&midi, false);
    system.initialize().unwrap();
    system.initialize().unwrap();

    // Explicit re-attach through the registry too
    let registry = system.registry().unwrap();
    registry.attach_all();

    midi.send(&id, &[0xB0, 7, 90]);
    assert_eq!(*calls.lock(), vec![Call::Controller(7, 90, 0)]);
    assert_eq!(midi.access_requests(), 1);
}

#[test]
fn hot_plugged_source_is_attached_by_watcher() {
    let midi = VirtualMidi::new();
    let (system, calls) = recording_system(&midi, true);
    system.initialize().unwrap();
    assert!(system.list_inputs().is_empty());

    let late = midi.connect_input("late", "Hot-plugged");
    let registry = system.registry().unwrap();
    assert!(wait_until(Duration::from_secs(2), || registry.is_attached(&late)));

    midi.send(&late, &[0x90, 72, 80]);
    assert_eq!(*calls.lock(), vec![Call::NoteOn(72, 80, 0)]);
}

#[test]
fn hot_plugged_source_is_attached_manually() {
    let midi = VirtualMidi::new();
    let (system, calls) = recording_system(&midi, false);
    system.initialize().unwrap();

    let late = midi.connect_input("late", "Hot-plugged");
    assert!(!midi.send(&late, &[0x90, 72, 80]));
    assert_eq!(system.process_topology_events(), 1);

    assert!(midi.send(&late, &[0x90, 72, 80]));
    assert_eq!(*calls.lock(), vec![Call::NoteOn(72, 80, 0)]);
}

#[test]
fn unplugged_source_is_recorded_and_replug_resumes() {
    let midi = VirtualMidi::new();
    let id = midi.connect_input("keys", "Keys");
    let (system, calls) = recording_system(&midi, false);
    system.initialize().unwrap();

    midi.disconnect(&id);
    system.process_topology_events();
    let registry = system.registry().unwrap();
    assert_eq!(registry.source(&id).unwrap().state, PortState::Disconnected);
    assert!(!midi.send(&id, &[0x90, 60, 100]));

    midi.connect_input("keys", "Keys");
    system.process_topology_events();
    assert!(midi.send(&id, &[0x90, 60, 100]));
    assert_eq!(*calls.lock(), vec![Call::NoteOn(60, 100, 0)]);
}

#[test]
fn output_ports_are_never_attached() {
    let midi = VirtualMidi::new();
    midi.connect_output("synth", "Synth Out");
    let (system, _) = recording_system(&midi, false);
    system.initialize().unwrap();

    midi.connect_output("synth-2", "Another Out");
    system.process_topology_events();

    assert!(system.list_inputs().is_empty());
    assert_eq!(midi.attached_count(), 0);
}

#[test]
fn denied_access_leaves_system_inert() {
    let midi = VirtualMidi::new().deny_access("permission refused");
    let id = midi.connect_input("keys", "Keys");
    let (system, calls) = recording_system(&midi, true);

    let err = system.initialize().unwrap_err();
    assert!(err.is_access_failure());
    assert!(matches!(system.state(), AccessState::Failed(ref r) if r.contains("permission refused")));

    // No retry
    assert!(matches!(system.initialize(), Err(Error::Inert)));
    assert_eq!(midi.access_requests(), 1);

    midi.connect_input("late", "Hot-plugged");
    assert!(!midi.send(&id, &[0x90, 60, 100]));
    assert!(calls.lock().is_empty());
    assert!(system.registry().is_none());
}

#[test]
fn handlers_can_change_while_sources_send() {
    let midi = VirtualMidi::new();
    let id = midi.connect_input("keys", "Keys");
    let (system, calls) = recording_system(&midi, false);
    system.initialize().unwrap();

    let sender = {
        let midi = midi.clone();
        let id = id.clone();
        thread::spawn(move || {
            for _ in 0..500 {
                midi.send(&id, &[0x90, 60, 100]);
            }
        })
    };
    for _ in 0..50 {
        system.clear_handler(EventKind::ProgramChange);
        system.on_program_change(|_, _| {});
    }
    sender.join().unwrap();

    assert_eq!(calls.lock().len(), 500);
}

#[test]
fn clones_share_state() {
    let midi = VirtualMidi::new();
    let id = SourceId::from("keys");
    midi.connect_input(id.clone(), "Keys");
    let (system, calls) = recording_system(&midi, false);

    let other = system.clone();
    other.initialize().unwrap();
    assert!(system.is_ready());

    midi.send(&id, &[0x90, 61, 1]);
    assert_eq!(calls.lock().len(), 1);
}
