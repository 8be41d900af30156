//! End-to-end decoding of synthetic replays

mod common;

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use proptest::prelude::*;
use tempfile::NamedTempFile;

use common::{assemble, init_tracing, ReplayBuilder};
use rf2_vcr::config::UnknownVersionPolicy;
use rf2_vcr::cursor::ByteCursor;
use rf2_vcr::format::{FormatVariant, SectionKind};
use rf2_vcr::model::{DiagnosticKind, EventKind, PitLaneAction, SessionType};
use rf2_vcr::sections::{
    FrameBlockDecoder, RosterDecoder, SectionContext, SectionDecoder, SessionInfoDecoder,
};
use rf2_vcr::source::ReplaySource;
use rf2_vcr::{decode, DecodeError, DecoderConfig, ReplayDecoder};

fn race(version: u32) -> ReplayBuilder {
    ReplayBuilder::new(version)
        .driver(7, "Alice")
        .driver(11, "Bob")
        .session("Spa")
        .frame(0.0, &[0, 1])
        .event(0xFF, 1, 10, &[5])
        .frame(0.1, &[0, 1])
        .frame(0.2, &[1])
        .event(1, 5, 2, &[34])
}

#[test]
fn test_minimal_v1_file() {
    init_tracing();
    let data = assemble(1, &[Vec::new()]);
    assert_eq!(data.len(), 16);

    let model = decode(&data).unwrap();
    assert_eq!(model.header().variant, FormatVariant::V1);
    assert_eq!(model.frames().count(), 0);
    assert!(model.is_clean());
}

#[test]
fn test_bad_magic() {
    let mut data = assemble(1, &[Vec::new()]);
    data[..4].copy_from_slice(b"XYZ\0");
    assert!(matches!(
        decode(&data),
        Err(DecodeError::UnrecognizedFormat { .. })
    ));
}

#[test]
fn test_section_past_end() {
    let mut data = b"RCV\0".to_vec();
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&16u32.to_le_bytes());
    data.extend_from_slice(&4096u32.to_le_bytes());
    data.resize(100, 0);

    let err = decode(&data).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedHeader { offset: 8, .. }));
}

#[test]
fn test_full_decode_per_version() {
    init_tracing();
    for version in 1..=3 {
        let model = decode(&race(version).build()).unwrap();
        assert!(model.is_clean(), "v{version}: {:?}", model.diagnostics());

        assert_eq!(model.roster().len(), 2);
        assert_eq!(model.participant(1).unwrap().name, "Bob");
        assert_eq!(model.participant(1).unwrap().number, 11);

        let session = model.session_info().unwrap();
        assert_eq!(session.track, "Spa");
        assert_eq!(session.session_type, SessionType::Race(1));

        assert_eq!(model.frame_count(), 3);
        let last = model.frames().last().unwrap();
        assert!(last.vehicle(0).is_none());
        let car = last.vehicle(1).unwrap();
        assert_eq!(car.gear, 2);
        assert_eq!(car.engine_rpm, 6500);
        assert_eq!(car.controls.throttle, 30);
        assert_eq!(car.controls.brake, 10);
        assert_eq!(car.traction_control, 1);
        assert!(car.flags.headlights);
        assert_eq!(car.velocity.is_some(), version >= 3);
        assert_eq!(car.speed_raw.is_some(), version >= 2);

        assert_eq!(model.trailer().is_some(), version >= 2);
    }
}

#[test]
fn test_v3_trailer_matches() {
    let model = decode(&race(3).build()).unwrap();
    let trailer = model.trailer().unwrap();

    assert_eq!(trailer.frame_count, 3);
    assert_eq!(trailer.entry_count, 7);
    assert!(trailer.frames_crc32.is_some());
    assert!((trailer.duration() - 0.2).abs() < 1e-6);
}

#[test]
fn test_events_carry_frame_time() {
    let model = decode(&race(2).build()).unwrap();
    let events: Vec<_> = model.events().collect();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0, 0.0);
    assert_eq!(events[0].1.slot, None);
    assert_eq!(events[0].1.kind, EventKind::StartLights { state: 5 });
    assert_eq!(events[1].0, 0.2);
    assert_eq!(
        events[1].1.kind,
        EventKind::PitLane {
            action: PitLaneAction::PitEntry
        }
    );
}

#[test]
fn test_decoding_is_deterministic() {
    let data = race(3).build();
    let first = decode(&data).unwrap();
    let second = decode(&data).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn test_sections_decode_in_isolation() {
    let data = race(2).build();
    let model = decode(&data).unwrap();
    let config = DecoderConfig::default();
    let ctx = SectionContext::new(model.header().variant, &config);

    let entry = model.header().section(SectionKind::Roster).unwrap();
    let mut cursor =
        ByteCursor::scoped(&data, entry.offset as usize, entry.length as usize).unwrap();
    let roster = RosterDecoder::default().decode(&mut cursor, &ctx).unwrap();
    assert_eq!(roster.value, model.roster());

    let entry = model.header().section(SectionKind::SessionInfo).unwrap();
    let mut cursor =
        ByteCursor::scoped(&data, entry.offset as usize, entry.length as usize).unwrap();
    let session = SessionInfoDecoder.decode(&mut cursor, &ctx).unwrap();
    assert_eq!(session.value.as_ref(), model.session_info());
}

#[test]
fn test_frames_decode_in_isolation() {
    let data = race(3).build();
    let model = decode(&data).unwrap();
    let config = DecoderConfig::default();
    let ctx = SectionContext::new(model.header().variant, &config);

    let entry = model.header().section(SectionKind::Frames).unwrap();
    let mut cursor =
        ByteCursor::scoped(&data, entry.offset as usize, entry.length as usize).unwrap();
    let block = FrameBlockDecoder.decode(&mut cursor, &ctx).unwrap();

    assert!(block.diagnostics.is_empty());
    assert!(block.value.complete);
    assert_eq!(block.value.frames.len(), 3);
    assert_eq!(block.value.frames.as_slice(), model.frames().as_slice());
    assert_eq!(cursor.remaining(), 0);
}

#[test]
fn test_frames_iterator_restarts() {
    let model = decode(&race(1).build()).unwrap();

    let forward: Vec<f32> = model.frames().map(|f| f.timestamp).collect();
    let again: Vec<f32> = model.frames().map(|f| f.timestamp).collect();
    let mut backward: Vec<f32> = model.frames().rev().map(|f| f.timestamp).collect();
    backward.reverse();

    assert_eq!(forward, vec![0.0, 0.1, 0.2]);
    assert_eq!(forward, again);
    assert_eq!(forward, backward);
    assert_eq!(model.frames().len(), 3);
    assert_eq!(model.frames().nth(2).map(|f| f.timestamp), Some(0.2));
}

#[test]
fn test_truncated_frame_section() {
    let builder = race(2);
    let mut sections = builder.sections();
    let full = decode(&builder.build()).unwrap();
    let last_frame = {
        let single = ReplayBuilder::new(2).frame(0.2, &[1]).event(1, 5, 2, &[34]);
        single.frames_section().len()
    };

    let frames = sections[2].clone();
    for cut in 1..last_frame {
        sections[2] = frames[..frames.len() - cut].to_vec();
        let model = decode(&assemble(2, &sections)).unwrap();

        assert_eq!(model.frame_count(), 2, "cut {cut}");
        assert_eq!(
            model.frames().as_slice(),
            &full.frames().as_slice()[..2]
        );
        assert_eq!(model.diagnostics().len(), 1, "cut {cut}");
        assert_eq!(model.diagnostics()[0].section, Some(SectionKind::Frames));
        assert!(matches!(
            model.diagnostics()[0].kind,
            DiagnosticKind::TruncatedSection { records: 2, .. }
        ));
    }
}

#[test]
fn test_v2_header_over_v1_roster() {
    let data = race(2).roster_layout(1).build();
    let model = decode(&data).unwrap();

    assert_eq!(model.roster()[0].name, "Alice");
    assert_eq!(model.roster()[1].vehicle, "GT3 Car");
    assert_eq!(model.roster()[0].team, None);
    assert_eq!(model.diagnostics().len(), 1);
    assert_eq!(model.diagnostics()[0].section, Some(SectionKind::Roster));
    assert_eq!(
        model.diagnostics()[0].kind,
        DiagnosticKind::LayoutFallback {
            declared: FormatVariant::V2,
            used: FormatVariant::V1,
        }
    );
    assert_eq!(model.header().compatibility_warning(), None);
    let warning = model.compatibility_warning().unwrap();
    assert!(warning.contains("roster"), "{warning}");
    assert!(warning.contains("V1"), "{warning}");
}

#[test]
fn test_unknown_version_falls_back() {
    let mut data = race(3).build();
    data[4..8].copy_from_slice(&9u32.to_le_bytes());

    let model = decode(&data).unwrap();
    assert_eq!(model.header().variant, FormatVariant::Unknown(9));
    assert!(model.header().compatibility_warning().is_some());
    assert_eq!(model.frame_count(), 3);
    assert_eq!(
        model.diagnostics()[0].kind,
        DiagnosticKind::UnknownVersion {
            version: 9,
            fallback: FormatVariant::V3,
        }
    );
}

#[test]
fn test_unknown_version_rejected_by_config() {
    let mut data = race(3).build();
    data[4..8].copy_from_slice(&9u32.to_le_bytes());

    let mut config = DecoderConfig::default();
    config.unknown_version = UnknownVersionPolicy::Reject;
    let err = ReplayDecoder::new(config).decode(&data).unwrap_err();
    assert_eq!(err, DecodeError::UnknownVersion { version: 9 });
}

#[test]
fn test_config_file_and_source() {
    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(config_file, "verify_checksum = false\n\n[limits]\nmax_frames = 2").unwrap();
    let config = DecoderConfig::from_file(config_file.path()).unwrap();

    let mut replay = NamedTempFile::new().unwrap();
    replay.write_all(&race(3).build()).unwrap();
    replay.flush().unwrap();

    let source = ReplaySource::open(replay.path()).unwrap();
    let model = source.decode(&ReplayDecoder::new(config)).unwrap();

    assert_eq!(model.frame_count(), 2);
    assert_eq!(
        model.diagnostics()[0].kind,
        DiagnosticKind::FrameLimitReached { limit: 2 }
    );
}

#[test]
fn test_gzip_replay_decodes_like_plain() {
    let data = race(3).build();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&data).unwrap();

    let mut replay = NamedTempFile::new().unwrap();
    replay.write_all(&encoder.finish().unwrap()).unwrap();
    replay.flush().unwrap();

    let source = ReplaySource::open(replay.path()).unwrap();
    assert!(source.is_gzip());

    let model = source.decode(&ReplayDecoder::default()).unwrap();
    let plain = decode(&data).unwrap();
    assert_eq!(model.frame_count(), 3);
    assert!(model.is_clean());
    assert_eq!(model, plain);
}

proptest! {
    #[test]
    fn prop_arbitrary_input_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode(&data);
    }

    #[test]
    fn prop_short_input_is_rejected(data in proptest::collection::vec(any::<u8>(), 0..16)) {
        prop_assert!(decode(&data).is_err());
    }

    #[test]
    fn prop_prefixes_never_panic(version in 1u32..=3, cut in 0usize..400) {
        let data = race(version).build();
        let end = cut.min(data.len());
        let _ = decode(&data[..end]);
    }

    #[test]
    fn prop_corrupted_byte_never_panics(version in 1u32..=3, index in any::<prop::sample::Index>(), byte in any::<u8>()) {
        let mut data = race(version).build();
        let i = index.index(data.len());
        data[i] = byte;
        if let Ok(model) = decode(&data) {
            let again = decode(&data).unwrap();
            prop_assert_eq!(model.frame_count(), again.frame_count());
            prop_assert_eq!(model.diagnostics().len(), again.diagnostics().len());
        }
    }
}
