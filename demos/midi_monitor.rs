//! # MIDI Monitor
//!
//! Attach to every MIDI input (including ones plugged in while running) and
//! log each normalized event.
//!
//! **Concepts:** One-shot access, hot-plug, handler table, voice bank
//!
//! ```bash
//! cargo run --example midi_monitor -- 60
//! ```

use std::time::Duration;

use notewire::prelude::*;
use tracing::info;

const DEFAULT_SECONDS: u64 = 30;

fn main() -> notewire::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let seconds = match std::env::args().nth(1) {
        Some(arg) => arg.parse().map_err(|_| {
            notewire::Error::InvalidConfig(format!("expected a number of seconds, got '{arg}'"))
        })?,
        None => DEFAULT_SECONDS,
    };

    let engine = NotewireEngine::builder()
        .client_name("notewire-monitor")
        .build()?;

    if !engine.is_ready() {
        println!("MIDI access unavailable: {:?}", engine.midi().state());
        return Ok(());
    }

    println!("MIDI inputs:");
    let inputs = engine.inputs();
    if inputs.is_empty() {
        println!("  (none yet, plug in a controller)");
    }
    for port in &inputs {
        println!("  [{}] {}", port.id, port.name);
    }

    // Keep the voice bank wiring and log on top of it
    let voices = engine.voices().clone();
    let released = engine.voices().clone();
    engine
        .midi()
        .on_note_on(move |note, velocity, channel| {
            voices.note_on(note, velocity, channel);
            info!(
                "note on  ch{:<2} {:>3} vel {:>3} ({:.1} Hz)",
                channel,
                note,
                velocity,
                note_to_hz(note)
            );
        })
        .on_note_off(move |note, velocity, channel| {
            released.note_off(note, channel);
            info!("note off ch{:<2} {:>3} vel {:>3}", channel, note, velocity);
        })
        .on_poly_key_pressure(|note, pressure, channel| {
            info!("poly at  ch{:<2} {:>3} = {}", channel, note, pressure);
        })
        .on_controller_change(|controller, value, channel| {
            info!("cc       ch{:<2} {:>3} = {}", channel, controller, value);
        })
        .on_program_change(|program, channel| {
            info!("program  ch{:<2} {}", channel, program);
        })
        .on_channel_pressure(|pressure, channel| {
            info!("pressure ch{:<2} {}", channel, pressure);
        })
        .on_pitch_bend(|bend, channel, raw| {
            info!("bend     ch{:<2} {:+} (raw {})", channel, bend, raw);
        });

    println!("\nListening for {} seconds...", seconds);
    std::thread::sleep(Duration::from_secs(seconds));

    println!(
        "Done. {} input(s) seen, {} voice(s) still sounding.",
        engine.inputs().len(),
        engine.voices().active_count()
    );
    Ok(())
}
