use crate::{SdoBody, SdoHeader, PACKET_SIZE};

/// Пакет Uniboard: заголовок + два временных среза с общим BSN.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SdoPacket {
    pub header: SdoHeader,
    pub bodies: [SdoBody; 2],
}

/// Сырой пакет фиксированного размера (единица ввода/вывода и записи архива).
pub type RawPacket = Box<[u8; PACKET_SIZE]>;

impl SdoPacket {
    pub fn new(header: SdoHeader) -> Self {
        Self {
            header,
            bodies: [SdoBody::zeroed(), SdoBody::zeroed()],
        }
    }
}
