//! virtuoso-keys CLI: interactive keyboard instrument over stdin.
//!
//! Usage:
//!   vk-cli            line-oriented REPL (type `help`)
//!   vk-cli --midi     also connect the first available MIDI input port

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use midir::{MidiInput, MidiInputConnection};
use vk_engine::{InstrumentKind, NullTone, ToneGenerator};
use vk_ir::{note_name, KeyRange, Mode, NOTE_NAMES};
use vk_master::{ControlError, Controller};

fn main() {
    env_logger::init();

    let use_midi = std::env::args().any(|a| a == "--midi");
    let mut ctrl = Controller::new(Arc::new(Mutex::new(NullTone)) as Arc<Mutex<dyn ToneGenerator>>);

    let (midi_tx, midi_rx) = mpsc::channel::<[u8; 3]>();
    let _midi_connection = if use_midi { connect_midi(midi_tx) } else { None };

    println!("virtuoso-keys (type `help` for commands)");
    let stdin = io::stdin();
    loop {
        drain_midi(&mut ctrl, &midi_rx);
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        drain_midi(&mut ctrl, &midi_rx);

        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = parts.first() else { continue };
        match command {
            "quit" | "exit" => break,
            "help" => print_help(),
            _ => run_command(&mut ctrl, &midi_rx, command, &parts[1..]),
        }
    }

    ctrl.stop_playback();
    ctrl.stop_pitch_monitor();
}

fn run_command(ctrl: &mut Controller, midi_rx: &Receiver<[u8; 3]>, command: &str, args: &[&str]) {
    match command {
        "on" => {
            if let Some(pitch) = parse_pitch(args.first()) {
                ctrl.press_key(pitch);
                println!("{} down", note_name(pitch));
            }
        }
        "off" => {
            if let Some(pitch) = parse_pitch(args.first()) {
                ctrl.release_key(pitch);
                println!("{} up", note_name(pitch));
            }
        }
        "held" => println!("{:?}", ctrl.held_pitches()),
        "chord" => match ctrl.chord() {
            Some(label) => println!("{}", label),
            None => println!("no chord"),
        },
        "scale" => scale_command(ctrl, args),
        "rec" => report(ctrl.start_recording().map(|_| "recording...".into())),
        "stop" => {
            if ctrl.is_recording() {
                let count = ctrl.stop_recording();
                println!("recorded {} notes", count);
            } else {
                ctrl.stop_playback();
                println!("stopped");
            }
        }
        "play" => report(
            ctrl.play(Box::new(|| println!("\nplayback finished")))
                .map(|_| "playing...".into()),
        ),
        "export" => {
            let path = args.first().copied().unwrap_or("recording.mid");
            report(export(ctrl, path));
        }
        "inst" => match args.first().and_then(|n| InstrumentKind::from_name(n)) {
            Some(kind) => {
                ctrl.set_instrument(kind);
                println!("instrument: {}", kind.name());
            }
            None => {
                let names: Vec<&str> = InstrumentKind::ALL.iter().map(|k| k.name()).collect();
                println!("instruments: {}", names.join(", "));
            }
        },
        "vol" => {
            if let Some(v) = args.first().and_then(|a| a.parse::<u8>().ok()) {
                ctrl.set_volume(v);
                println!("volume: {}", v.min(100));
            }
        }
        "sustain" => {
            if let Some(s) = args.first().and_then(|a| a.parse::<f64>().ok()) {
                ctrl.set_sustain(s);
                println!("sustain release: {}s", s);
            }
        }
        "pitch" => match args.first() {
            Some(&"on") => report(ctrl.start_pitch_monitor().map(|_| "pitch monitor on".into())),
            Some(&"off") => {
                ctrl.stop_pitch_monitor();
                println!("pitch monitor off");
            }
            _ => match ctrl.detected_pitch() {
                Some(pitch) => println!("detected: {}", note_name(pitch)),
                None => println!("no confident pitch"),
            },
        },
        "listen" => listen(ctrl, midi_rx, args),
        other => println!("unknown command: {} (try `help`)", other),
    }
}

fn drain_midi(ctrl: &mut Controller, rx: &Receiver<[u8; 3]>) {
    while let Ok(data) = rx.try_recv() {
        ctrl.midi_message(&data);
    }
}

fn scale_command(ctrl: &Controller, args: &[&str]) {
    let root = args
        .first()
        .and_then(|name| NOTE_NAMES.iter().position(|n| n.eq_ignore_ascii_case(name)));
    let mode = match args.get(1).copied() {
        Some("minor") => Mode::Minor,
        _ => Mode::Major,
    };
    let Some(root) = root else {
        println!("usage: scale <root> [major|minor], e.g. `scale C major`");
        return;
    };
    let pitches = ctrl.scale_highlight(root as u8, mode, KeyRange::KEYS_37);
    let names: Vec<String> = pitches.iter().map(|&p| note_name(p)).collect();
    println!("{}", names.join(" "));
}

/// Consume MIDI events for a while, showing the chord as it changes.
fn listen(ctrl: &mut Controller, midi_rx: &Receiver<[u8; 3]>, args: &[&str]) {
    let seconds: u64 = args.first().and_then(|a| a.parse().ok()).unwrap_or(10);
    println!("listening for {}s...", seconds);
    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut last_chord = None;
    while Instant::now() < deadline {
        if let Ok(data) = midi_rx.recv_timeout(Duration::from_millis(50)) {
            ctrl.midi_message(&data);
        }
        let chord = ctrl.chord();
        if chord != last_chord {
            match chord {
                Some(label) => println!("  {}", label),
                None => {}
            }
            last_chord = chord;
        }
    }
}

fn export(ctrl: &Controller, path: &str) -> Result<String, ControlError> {
    let bytes = ctrl.export_midi()?;
    match std::fs::write(path, &bytes) {
        Ok(()) => Ok(format!("wrote {} ({} bytes)", path, bytes.len())),
        Err(err) => Ok(format!("could not write {}: {}", path, err)),
    }
}

fn report(result: Result<String, ControlError>) {
    match result {
        Ok(msg) => println!("{}", msg),
        Err(err) => println!("error: {}", err),
    }
}

fn parse_pitch(arg: Option<&&str>) -> Option<u8> {
    let pitch = arg.and_then(|a| a.parse::<u8>().ok()).filter(|&p| p <= 127);
    if pitch.is_none() {
        println!("expected a MIDI pitch 0-127");
    }
    pitch
}

fn connect_midi(tx: Sender<[u8; 3]>) -> Option<MidiInputConnection<()>> {
    let input = match MidiInput::new("virtuoso-keys") {
        Ok(input) => input,
        Err(err) => {
            log::warn!("MIDI unavailable: {}", err);
            return None;
        }
    };
    let ports = input.ports();
    let Some(port) = ports.first() else {
        println!("no MIDI input ports found");
        return None;
    };
    let name = input.port_name(port).unwrap_or_else(|_| "unknown".into());
    match input.connect(
        port,
        "vk-input",
        move |_stamp, message, _| {
            if message.len() >= 3 {
                let _ = tx.send([message[0], message[1], message[2]]);
            }
        },
        (),
    ) {
        Ok(conn) => {
            println!("connected MIDI device: {}", name);
            Some(conn)
        }
        Err(err) => {
            log::warn!("could not connect {}: {}", name, err);
            None
        }
    }
}

fn print_help() {
    println!(
        "\
  on <pitch>         press a key (MIDI pitch, 60 = middle C)
  off <pitch>        release a key
  held               list held pitches
  chord              name the held chord
  scale <root> [m]   show scale pitches, e.g. `scale C major`
  rec / stop         start / stop recording (stop also halts playback)
  play               replay the recording
  export [file]      write the recording as a .mid file
  inst [name]        select instrument, or list them
  vol <0-100>        set volume
  sustain <sec>      set sustain release
  pitch [on|off]     pitch monitor control, bare `pitch` shows detection
  listen [sec]       follow MIDI input, printing chords (with --midi)
  quit"
    );
}
