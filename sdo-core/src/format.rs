//! Бинарный формат пакетов AARTFAAC Uniboard (SDO).
//!
//! ```text
//! [0..22)       HEADER   176 бит упакованных битовых полей (см. layout)
//! [22..6166)    BODY 0   3072 × i16 LE, временной срез 0
//! [6166..12310) BODY 1   3072 × i16 LE, временной срез 1
//! ```
//!
//! Единственная проверка корректности - структурная:
//! `words_per_block × blocks_per_packet × 4 == BODY_SIZE`.

use byteorder::{ByteOrder, LittleEndian};
use sdo_types::{
    BitField, SdoBody, SdoError, SdoHeader, SdoPacket, SdoResult, BODIES_PER_PACKET,
    BODY_SAMPLES, BODY_SIZE, FIELD_BLOCKS_PER_PACKET, FIELD_BSN, FIELD_CLOCK, FIELD_LANE_ID,
    FIELD_RESERVED_0, FIELD_RESERVED_1, FIELD_SDO_MODE, FIELD_STATION_ID, FIELD_SYNC,
    FIELD_WORDS_PER_BLOCK, HEADER_SIZE, NUM_BYTES_PER_WORD, PACKET_SIZE,
};

use crate::binary::{read_bits, write_bits};

/// Кодек заголовка поверх [`SdoHeader`].
pub trait SdoHeaderExt: Sized {
    /// Разбирает 22 байта заголовка. Любые байты дают какой-то заголовок.
    fn decode(buf: &[u8; HEADER_SIZE]) -> Self;

    /// Кодирует заголовок. Ошибка, если значение не влезает в своё поле.
    fn encode(&self) -> SdoResult<[u8; HEADER_SIZE]>;

    /// Заявленный размер полезной нагрузки в байтах.
    fn payload_size(&self) -> u64;

    fn is_valid(&self) -> bool {
        validate_payload_size(self.payload_size())
    }
}

/// Кодек временного среза.
pub trait SdoBodyExt: Sized {
    fn decode(buf: &[u8]) -> SdoResult<Self>;

    fn encode_into(
        &self,
        out: &mut [u8],
    ) -> SdoResult<()>;

    fn encode(&self) -> Vec<u8>;
}

/// Кодек целого пакета.
pub trait SdoPacketExt: Sized {
    fn decode(buf: &[u8]) -> SdoResult<Self>;

    fn encode(&self) -> SdoResult<Vec<u8>>;
}

impl SdoHeaderExt for SdoHeader {
    fn decode(buf: &[u8; HEADER_SIZE]) -> Self {
        let get = |f: BitField| read_bits(buf, f.offset, f.width);

        SdoHeader {
            reserved_1: get(FIELD_RESERVED_1),
            clock: get(FIELD_CLOCK) as u8,
            sdo_mode: get(FIELD_SDO_MODE) as u8,
            lane_id: get(FIELD_LANE_ID) as u8,
            station_id: get(FIELD_STATION_ID) as u16,
            words_per_block: get(FIELD_WORDS_PER_BLOCK) as u16,
            blocks_per_packet: get(FIELD_BLOCKS_PER_PACKET) as u16,
            sync: get(FIELD_SYNC) as u8,
            reserved_0: get(FIELD_RESERVED_0) as u16,
            bsn: get(FIELD_BSN),
        }
    }

    fn encode(&self) -> SdoResult<[u8; HEADER_SIZE]> {
        let mut buf = [0u8; HEADER_SIZE];

        put_field(&mut buf, FIELD_RESERVED_1, self.reserved_1)?;
        put_field(&mut buf, FIELD_CLOCK, self.clock as u64)?;
        put_field(&mut buf, FIELD_SDO_MODE, self.sdo_mode as u64)?;
        put_field(&mut buf, FIELD_LANE_ID, self.lane_id as u64)?;
        put_field(&mut buf, FIELD_STATION_ID, self.station_id as u64)?;
        put_field(&mut buf, FIELD_WORDS_PER_BLOCK, self.words_per_block as u64)?;
        put_field(&mut buf, FIELD_BLOCKS_PER_PACKET, self.blocks_per_packet as u64)?;
        put_field(&mut buf, FIELD_SYNC, self.sync as u64)?;
        put_field(&mut buf, FIELD_RESERVED_0, self.reserved_0 as u64)?;
        put_field(&mut buf, FIELD_BSN, self.bsn)?;

        Ok(buf)
    }

    fn payload_size(&self) -> u64 {
        // 16 × 16 бит × 4 - в u64 переполнение невозможно
        self.words_per_block as u64 * self.blocks_per_packet as u64 * NUM_BYTES_PER_WORD as u64
    }
}

impl SdoBodyExt for SdoBody {
    fn decode(buf: &[u8]) -> SdoResult<Self> {
        if buf.len() != BODY_SIZE {
            return Err(SdoError::invalid_length(BODY_SIZE, buf.len()));
        }

        let mut samples = vec![0i16; BODY_SAMPLES];
        LittleEndian::read_i16_into(buf, &mut samples);

        SdoBody::from_samples(samples)
    }

    fn encode_into(
        &self,
        out: &mut [u8],
    ) -> SdoResult<()> {
        if out.len() != BODY_SIZE {
            return Err(SdoError::invalid_length(BODY_SIZE, out.len()));
        }

        LittleEndian::write_i16_into(self.samples(), out);

        Ok(())
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; BODY_SIZE];
        LittleEndian::write_i16_into(self.samples(), &mut out);
        out
    }
}

impl SdoPacketExt for SdoPacket {
    fn decode(buf: &[u8]) -> SdoResult<Self> {
        if buf.len() != PACKET_SIZE {
            return Err(SdoError::invalid_length(PACKET_SIZE, buf.len()));
        }

        let header = header_of(buf)?;
        let body_at = |i: usize| {
            let start = HEADER_SIZE + i * BODY_SIZE;
            SdoBody::decode(&buf[start..start + BODY_SIZE])
        };

        Ok(SdoPacket {
            header,
            bodies: [body_at(0)?, body_at(1)?],
        })
    }

    fn encode(&self) -> SdoResult<Vec<u8>> {
        let mut buf = vec![0u8; PACKET_SIZE];
        buf[..HEADER_SIZE].copy_from_slice(&self.header.encode()?);

        for (i, body) in self.bodies.iter().enumerate().take(BODIES_PER_PACKET) {
            let start = HEADER_SIZE + i * BODY_SIZE;
            body.encode_into(&mut buf[start..start + BODY_SIZE])?;
        }

        Ok(buf)
    }
}

/// Структурная проверка заголовка: заявленная полезная нагрузка равна
/// размеру одного среза.
pub fn validate(header: &SdoHeader) -> bool {
    header.is_valid()
}

fn validate_payload_size(payload: u64) -> bool {
    payload == BODY_SIZE as u64
}

/// Разбирает только заголовок в начале сырого пакета.
pub fn header_of(raw: &[u8]) -> SdoResult<SdoHeader> {
    let bytes: &[u8; HEADER_SIZE] = raw
        .get(..HEADER_SIZE)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| SdoError::invalid_length(HEADER_SIZE, raw.len()))?;

    Ok(SdoHeader::decode(bytes))
}

/// Проверяет сырой буфер: полный размер пакета и корректный заголовок.
pub fn validate_raw(raw: &[u8]) -> bool {
    raw.len() == PACKET_SIZE && header_of(raw).map(|h| validate(&h)).unwrap_or(false)
}

fn put_field(
    buf: &mut [u8; HEADER_SIZE],
    field: BitField,
    value: u64,
) -> SdoResult<()> {
    if value > field.max_value() {
        return Err(SdoError::FieldOverflow {
            field: field.name,
            value,
            width: field.width,
        });
    }

    write_bits(buf, field.offset, field.width, value);

    Ok(())
}
