use std::{fs, io::Cursor};

use rand::{rngs::StdRng, Rng, SeedableRng};
use sdo_core::{
    decode_or_report, header_of, read_all_packets, validate, ArchiveReader, ArchiveWriter,
    SdoHeaderExt, SdoPacketExt,
};
use sdo_types::{SdoError, SdoHeader, SdoPacket, HEADER_FIELDS, HEADER_SIZE, PACKET_SIZE};
use tempfile::NamedTempFile;

// ===========================================================================
// Helpers - детерминированные тест-данные
// ===========================================================================

/// Пакет с пилообразными отсчётами в обоих срезах.
fn deterministic_packet(bsn: u64) -> SdoPacket {
    let mut packet = SdoPacket::new(SdoHeader::nominal(302, bsn));

    for (t, body) in packet.bodies.iter_mut().enumerate() {
        for (i, s) in body.samples_mut().iter_mut().enumerate() {
            *s = ((i % 256) as i16 - 128) * (t as i16 + 1);
        }
    }

    packet
}

fn random_header(rng: &mut StdRng) -> SdoHeader {
    SdoHeader {
        reserved_1: rng.gen_range(0..1u64 << 59),
        clock: rng.gen_range(0..2),
        sdo_mode: rng.gen_range(0..4),
        lane_id: rng.gen_range(0..4),
        station_id: rng.gen(),
        words_per_block: rng.gen(),
        blocks_per_packet: rng.gen(),
        sync: rng.gen_range(0..2),
        reserved_0: rng.gen_range(0..1u16 << 13),
        bsn: rng.gen_range(0..1u64 << 50),
    }
}

/// Архив из `n` корректных пакетов с последовательными BSN.
fn build_archive(n: u64) -> Vec<u8> {
    (0..n)
        .flat_map(|bsn| deterministic_packet(1_000 + bsn).encode().unwrap())
        .collect()
}

// ===========================================================================
// Round-trip
// ===========================================================================

#[test]
fn test_random_header_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x5D0);

    for _ in 0..1_000 {
        let header = random_header(&mut rng);
        let bytes = header.encode().unwrap();
        assert_eq!(SdoHeader::decode(&bytes), header);
    }
}

#[test]
fn test_random_raw_bytes_reencode_identically() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..1_000 {
        let mut raw = [0u8; HEADER_SIZE];
        rng.fill(&mut raw[..]);
        assert_eq!(SdoHeader::decode(&raw).encode().unwrap(), raw);
    }
}

#[test]
fn test_packet_file_round_trip() {
    let tmp = NamedTempFile::new().unwrap();
    let packets: Vec<SdoPacket> = (0..3).map(deterministic_packet).collect();

    {
        let mut writer = ArchiveWriter::create(tmp.path()).unwrap();
        for p in &packets {
            writer.write_packet(&p.encode().unwrap()).unwrap();
        }
        writer.finish().unwrap();
    }

    assert_eq!(
        fs::metadata(tmp.path()).unwrap().len(),
        3 * PACKET_SIZE as u64
    );

    let mut reader = ArchiveReader::open(tmp.path()).unwrap();
    let raws = read_all_packets(&mut reader).unwrap();

    assert_eq!(raws.len(), 3);
    for (raw, original) in raws.iter().zip(&packets) {
        let decoded = SdoPacket::decode(&raw[..]).unwrap();
        assert_eq!(&decoded, original);
        assert_eq!(decoded.encode().unwrap(), raw.to_vec(), "byte-identical");
    }
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn test_invalid_count_independent_of_corrupted_field() {
    // Портим по очереди words_per_block и blocks_per_packet, остальные поля
    // на результат не влияют
    let mut invalid = 0;
    let mut valid = 0;

    for field in HEADER_FIELDS {
        let mut header = SdoHeader::nominal(1, 1);
        match field.name {
            "words_per_block" => header.words_per_block = 767,
            "blocks_per_packet" => header.blocks_per_packet = 3,
            "station_id" => header.station_id = 0,
            "bsn" => header.bsn = 0,
            "clock" => header.clock = 1,
            "sync" => header.sync = 1,
            _ => {}
        }

        if validate(&header) {
            valid += 1;
        } else {
            invalid += 1;
        }
    }

    assert_eq!(invalid, 2);
    assert_eq!(valid, HEADER_FIELDS.len() - 2);
}

#[test]
fn test_decode_archive_with_invalid_records() {
    let mut raw = build_archive(2);

    let mut bad = SdoHeader::nominal(1, 99);
    bad.blocks_per_packet = 0;
    raw.extend_from_slice(&SdoPacket::new(bad).encode().unwrap());

    let mut reader = ArchiveReader::new(Cursor::new(raw));
    let mut reports = Vec::new();
    let mut invalid_ids = Vec::new();

    for (id, rec) in (0u64..).zip(&mut reader) {
        match decode_or_report(&rec.unwrap()[..], id) {
            Ok(text) => reports.push(text),
            Err(SdoError::InvalidHeader { id }) => invalid_ids.push(id),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(reports.len(), 2);
    assert_eq!(invalid_ids, vec![2]);
    assert!(reports[1].contains("bsn        1001"));
}

#[test]
fn test_truncated_archive_is_not_a_record() {
    let mut raw = build_archive(2);
    raw.truncate(PACKET_SIZE + PACKET_SIZE / 2);

    let mut reader = ArchiveReader::new(Cursor::new(raw));
    let packets = read_all_packets(&mut reader).unwrap();

    assert_eq!(packets.len(), 1);
    assert_eq!(reader.stats().truncated_bytes, (PACKET_SIZE / 2) as u64);
    assert_eq!(header_of(&packets[0][..]).unwrap().bsn, 1_000);
}
