use crate::{NOMINAL_BLOCKS_PER_PACKET, NOMINAL_WORDS_PER_BLOCK};

/// Пользовательский заголовок пакета Uniboard (22 байта, битовые поля).
///
/// Раскладка битов описана в [`crate::layout`]. Зарезервированные поля
/// хранятся, чтобы повторное кодирование давало те же байты.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SdoHeader {
    /// Не используется (59 бит)
    pub reserved_1: u64,
    /// Источник тактирования (1 бит)
    pub clock: u8,
    /// Режим вывода SDO (2 бита)
    pub sdo_mode: u8,
    /// Идентификатор линии (2 бита)
    pub lane_id: u8,
    /// Идентификатор станции
    pub station_id: u16,
    /// Число 4-байтовых слов в блоке (ожидается 768)
    pub words_per_block: u16,
    /// Число блоков в пакете (ожидается 2)
    pub blocks_per_packet: u16,
    /// Флаг синхронизации (1 бит)
    pub sync: u8,
    /// Не используется (13 бит)
    pub reserved_0: u16,
    /// Block sequence number (50 бит), общий для двух срезов пакета
    pub bsn: u64,
}

impl SdoHeader {
    /// Заголовок с номинальными размерами блока и заданным BSN.
    pub fn nominal(
        station_id: u16,
        bsn: u64,
    ) -> Self {
        Self {
            station_id,
            words_per_block: NOMINAL_WORDS_PER_BLOCK,
            blocks_per_packet: NOMINAL_BLOCKS_PER_PACKET,
            bsn,
            ..Default::default()
        }
    }
}
