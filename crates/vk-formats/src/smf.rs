//! Standard MIDI File (format 0) encoding.
//!
//! One track, fixed 120 BPM tempo map. Internal times are seconds; at 480
//! ticks per quarter and 500 000 µs per quarter, one second is exactly 960
//! ticks, so timestamps pass through without tempo math. Velocity leaves its
//! internal [0, 1] scale only here, rescaled to the format's 0-127.

use std::io::Write;

use vk_ir::Timeline;

/// Ticks per quarter note in the file header.
pub const TICKS_PER_QUARTER: u16 = 480;

/// Tempo meta value: 500 000 µs per quarter note (120 BPM).
pub const TEMPO_USEC_PER_QUARTER: u32 = 500_000;

const TICKS_PER_SECOND: f64 = 960.0;

/// Write a timeline as a complete SMF byte stream.
pub fn write_smf(w: &mut impl Write, timeline: &Timeline) -> std::io::Result<()> {
    let track = encode_track(timeline);
    write_header_chunk(w)?;
    write_track_chunk(w, &track)
}

/// Encode a timeline to SMF bytes in memory.
pub fn timeline_to_smf(timeline: &Timeline) -> Vec<u8> {
    let mut buf = Vec::new();
    write_smf(&mut buf, timeline).expect("Vec<u8> write cannot fail");
    buf
}

fn write_header_chunk(w: &mut impl Write) -> std::io::Result<()> {
    w.write_all(b"MThd")?;
    w.write_all(&6u32.to_be_bytes())?;
    w.write_all(&0u16.to_be_bytes())?; // format 0
    w.write_all(&1u16.to_be_bytes())?; // one track
    w.write_all(&TICKS_PER_QUARTER.to_be_bytes())
}

fn write_track_chunk(w: &mut impl Write, track: &[u8]) -> std::io::Result<()> {
    w.write_all(b"MTrk")?;
    w.write_all(&(track.len() as u32).to_be_bytes())?;
    w.write_all(track)
}

/// A track event before delta encoding.
struct TrackEvent {
    tick: u64,
    /// Ordering rank at equal ticks: note-offs precede note-ons so a
    /// repeated pitch is not cut by the previous instance's release
    rank: u8,
    bytes: [u8; 3],
}

fn encode_track(timeline: &Timeline) -> Vec<u8> {
    let mut events: Vec<TrackEvent> = Vec::with_capacity(timeline.len() * 2);
    for note in timeline.events() {
        let velocity = scale_velocity(note.velocity);
        events.push(TrackEvent {
            tick: seconds_to_ticks(note.onset),
            rank: 1,
            bytes: [0x90, note.pitch & 0x7F, velocity],
        });
        events.push(TrackEvent {
            tick: seconds_to_ticks(note.end()),
            rank: 0,
            bytes: [0x80, note.pitch & 0x7F, 0],
        });
    }
    events.sort_by_key(|e| (e.tick, e.rank));

    let mut track = Vec::new();
    // Tempo meta at tick 0
    write_vlq(&mut track, 0);
    track.extend_from_slice(&[0xFF, 0x51, 0x03]);
    track.extend_from_slice(&TEMPO_USEC_PER_QUARTER.to_be_bytes()[1..]);

    let mut last_tick = 0u64;
    for event in &events {
        write_vlq(&mut track, event.tick - last_tick);
        track.extend_from_slice(&event.bytes);
        last_tick = event.tick;
    }

    // End of track
    write_vlq(&mut track, 0);
    track.extend_from_slice(&[0xFF, 0x2F, 0x00]);
    track
}

fn seconds_to_ticks(seconds: f64) -> u64 {
    (seconds.max(0.0) * TICKS_PER_SECOND).round() as u64
}

fn scale_velocity(velocity: f32) -> u8 {
    (velocity.clamp(0.0, 1.0) * 127.0).round() as u8
}

/// MIDI variable-length quantity: big-endian 7-bit groups, high bit set on
/// all but the last byte.
fn write_vlq(out: &mut Vec<u8>, value: u64) {
    let mut shift = 63 / 7 * 7;
    while shift > 0 && (value >> shift) & 0x7F == 0 {
        shift -= 7;
    }
    while shift > 0 {
        out.push(0x80 | ((value >> shift) & 0x7F) as u8);
        shift -= 7;
    }
    out.push((value & 0x7F) as u8);
}

#[cfg(test)]
mod tests {
    use super::*;
    use vk_ir::NoteEvent;

    fn vlq(value: u64) -> Vec<u8> {
        let mut out = Vec::new();
        write_vlq(&mut out, value);
        out
    }

    #[test]
    fn vlq_encoding() {
        assert_eq!(vlq(0), [0x00]);
        assert_eq!(vlq(0x40), [0x40]);
        assert_eq!(vlq(0x7F), [0x7F]);
        assert_eq!(vlq(0x80), [0x81, 0x00]);
        assert_eq!(vlq(0x2000), [0xC0, 0x00]);
        assert_eq!(vlq(0x0FFF_FFFF), [0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn header_is_format_zero_single_track() {
        let bytes = timeline_to_smf(&Timeline::new());
        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(&bytes[4..8], &6u32.to_be_bytes());
        assert_eq!(&bytes[8..10], &0u16.to_be_bytes());
        assert_eq!(&bytes[10..12], &1u16.to_be_bytes());
        assert_eq!(&bytes[12..14], &480u16.to_be_bytes());
        assert_eq!(&bytes[14..18], b"MTrk");
    }

    #[test]
    fn track_length_matches_payload() {
        let mut tl = Timeline::new();
        tl.push(NoteEvent::new(60, 1.0, 0.0, 0.5));
        let bytes = timeline_to_smf(&tl);

        let len = u32::from_be_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]) as usize;
        assert_eq!(bytes.len(), 22 + len);
    }

    #[test]
    fn single_note_produces_expected_track_bytes() {
        let mut tl = Timeline::new();
        tl.push(NoteEvent::new(60, 1.0, 0.0, 0.5));
        let bytes = timeline_to_smf(&tl);

        let track = &bytes[22..];
        let expected: Vec<u8> = [
            &[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20][..], // tempo 500000
            &[0x00, 0x90, 60, 127][..],                      // note on at tick 0
            &[0x83, 0x60, 0x80, 60, 0][..],                  // note off at tick 480
            &[0x00, 0xFF, 0x2F, 0x00][..],                   // end of track
        ]
        .concat();
        assert_eq!(track, expected.as_slice());
    }

    #[test]
    fn events_are_delta_ordered_regardless_of_completion_order() {
        let mut tl = Timeline::new();
        // Finalized out of onset order
        tl.push(NoteEvent::new(64, 0.5, 1.0, 0.5));
        tl.push(NoteEvent::new(60, 0.5, 0.0, 2.0));
        let bytes = timeline_to_smf(&tl);
        let track = &bytes[22..];

        // First note message after the tempo meta is the tick-0 attack of 60
        assert_eq!(&track[7..11], &[0x00, 0x90, 60, 64]);
    }

    #[test]
    fn velocity_rescales_to_0_127() {
        let mut tl = Timeline::new();
        tl.push(NoteEvent::new(60, 0.0, 0.0, 0.1));
        tl.push(NoteEvent::new(61, 0.5, 0.2, 0.1));
        tl.push(NoteEvent::new(62, 1.0, 0.4, 0.1));
        let bytes = timeline_to_smf(&tl);

        let velocities: Vec<u8> = bytes
            .windows(2)
            .zip(bytes.iter().skip(2))
            .filter(|(pair, _)| pair[0] == 0x90)
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(velocities, [0, 64, 127]);
    }

    #[test]
    fn seconds_map_to_960_ticks() {
        assert_eq!(seconds_to_ticks(0.0), 0);
        assert_eq!(seconds_to_ticks(0.5), 480);
        assert_eq!(seconds_to_ticks(1.0), 960);
        assert_eq!(seconds_to_ticks(2.25), 2160);
    }
}
