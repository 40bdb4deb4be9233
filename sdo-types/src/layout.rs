//! Константы бинарного формата пакетов AARTFAAC Uniboard (SDO).
//!
//! Пакет = пользовательский заголовок (22 байта) + 2 временных среза.
//! Всё упаковано без выравнивания, многобайтовые значения - little-endian
//! (порядок байт хоста, на котором записывались архивы).

/// Число поддиапазонов в одном временном срезе.
pub const NUM_SUBBANDS: usize = 8;

/// Число диполей на поддиапазон.
pub const NUM_DIPOLES: usize = 96;

/// Число поляризаций на диполь.
pub const NUM_POLARIZATIONS: usize = 2;

/// Размер "слова" в байтах для `words_per_block`.
pub const NUM_BYTES_PER_WORD: usize = 4;

/// Количество временных срезов (body) в одном пакете.
pub const BODIES_PER_PACKET: usize = 2;

/// Отсчётов `i16` в одном срезе: subband × dipole × pol × [re, im].
pub const BODY_SAMPLES: usize = NUM_SUBBANDS * NUM_DIPOLES * NUM_POLARIZATIONS * 2;

/// Размер одного среза в байтах (6144).
pub const BODY_SIZE: usize = BODY_SAMPLES * std::mem::size_of::<i16>();

/// Размер заголовка в битах: сумма ширин всех полей.
pub const HEADER_BITS: usize = 176;

/// Размер заголовка в байтах (22).
pub const HEADER_SIZE: usize = HEADER_BITS / 8;

/// Размер одного пакета (и одной записи архива) в байтах (12310).
pub const PACKET_SIZE: usize = HEADER_SIZE + BODIES_PER_PACKET * BODY_SIZE;

/// Номинальное значение `words_per_block`: 8 поддиапазонов × 96 диполей.
pub const NOMINAL_WORDS_PER_BLOCK: u16 = (NUM_SUBBANDS * NUM_DIPOLES) as u16;

/// Номинальное значение `blocks_per_packet`.
pub const NOMINAL_BLOCKS_PER_PACKET: u16 = 2;

/// Описание одного битового поля заголовка: смещение и ширина в битах.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    pub name: &'static str,
    pub offset: usize,
    pub width: u32,
}

impl BitField {
    const fn new(
        name: &'static str,
        offset: usize,
        width: u32,
    ) -> Self {
        Self {
            name,
            offset,
            width,
        }
    }

    /// Максимальное значение, помещающееся в поле.
    pub const fn max_value(&self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }
}

// Смещения считаются от младшего бита байта 0 (LSB-first).
pub const FIELD_RESERVED_1: BitField = BitField::new("reserved_1", 0, 59);
pub const FIELD_CLOCK: BitField = BitField::new("clock", 59, 1);
pub const FIELD_SDO_MODE: BitField = BitField::new("sdo_mode", 60, 2);
pub const FIELD_LANE_ID: BitField = BitField::new("lane_id", 62, 2);
pub const FIELD_STATION_ID: BitField = BitField::new("station_id", 64, 16);
pub const FIELD_WORDS_PER_BLOCK: BitField = BitField::new("words_per_block", 80, 16);
pub const FIELD_BLOCKS_PER_PACKET: BitField = BitField::new("blocks_per_packet", 96, 16);
pub const FIELD_SYNC: BitField = BitField::new("sync", 112, 1);
pub const FIELD_RESERVED_0: BitField = BitField::new("reserved_0", 113, 13);
pub const FIELD_BSN: BitField = BitField::new("bsn", 126, 50);

/// Все поля в порядке следования.
pub const HEADER_FIELDS: [BitField; 10] = [
    FIELD_RESERVED_1,
    FIELD_CLOCK,
    FIELD_SDO_MODE,
    FIELD_LANE_ID,
    FIELD_STATION_ID,
    FIELD_WORDS_PER_BLOCK,
    FIELD_BLOCKS_PER_PACKET,
    FIELD_SYNC,
    FIELD_RESERVED_0,
    FIELD_BSN,
];
