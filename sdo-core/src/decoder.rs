use sdo_types::{SdoError, SdoHeader, SdoResult, PACKET_SIZE};

use crate::format::{header_of, validate};

/// Человекочитаемый отчёт по заголовку с порядковым номером `id`.
pub fn render(
    header: &SdoHeader,
    id: u64,
) -> String {
    format!(
        "--------- {id} ---------\n\
         clock      {}\n\
         sdo_mode   {}\n\
         lane_id    {}\n\
         station_id {}\n\
         words      {}\n\
         blocks     {}\n\
         sync       {}\n\
         bsn        {}\n",
        header.clock,
        header.sdo_mode,
        header.lane_id,
        header.station_id,
        header.words_per_block,
        header.blocks_per_packet,
        header.sync,
        header.bsn,
    )
}

/// Разбирает сырой пакет и возвращает отчёт.
///
/// `Err(SdoError::InvalidHeader { id })` - заголовок не прошёл проверку
/// размера; `Err(SdoError::InvalidLength)` - буфер короче пакета.
/// Печать - забота вызывающего.
pub fn decode_or_report(
    raw: &[u8],
    id: u64,
) -> SdoResult<String> {
    if raw.len() < PACKET_SIZE {
        return Err(SdoError::invalid_length(PACKET_SIZE, raw.len()));
    }

    let header = header_of(raw)?;

    if !validate(&header) {
        return Err(SdoError::InvalidHeader { id });
    }

    Ok(render(&header, id))
}
