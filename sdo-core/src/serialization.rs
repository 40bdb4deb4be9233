use std::{
    fs::File,
    io::{BufReader, BufWriter, ErrorKind, Read, Write},
    path::Path,
};

use log::{debug, warn};
use sdo_types::{RawPacket, SdoError, SdoResult, PACKET_SIZE};

/// Потоковый писатель архива: пакеты подряд, без заголовка и разделителей.
pub struct ArchiveWriter<W: Write> {
    writer: BufWriter<W>,
    packets_written: u64,
}

/// Потоковый читатель архива фиксированного размера записи.
pub struct ArchiveReader<R: Read> {
    reader: BufReader<R>,
    stats: ReadStats,
    eof: bool,
}

/// Статистика, накопленная [`ArchiveReader`] в процессе чтения.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReadStats {
    /// Полных записей прочитано.
    pub records: u64,
    /// Байт в усечённом хвосте (не является записью).
    pub truncated_bytes: u64,
}

impl ArchiveWriter<File> {
    /// Создаёт (или перезаписывает) файл архива.
    pub fn create<P: AsRef<Path>>(path: P) -> SdoResult<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::new(inner),
            packets_written: 0,
        }
    }

    /// Записывает один сырой пакет. Длина должна быть ровно [`PACKET_SIZE`].
    pub fn write_packet(
        &mut self,
        raw: &[u8],
    ) -> SdoResult<()> {
        if raw.len() != PACKET_SIZE {
            return Err(SdoError::invalid_length(PACKET_SIZE, raw.len()));
        }

        self.writer.write_all(raw)?;
        self.packets_written += 1;

        Ok(())
    }

    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.packets_written * PACKET_SIZE as u64
    }

    /// Сбрасывает буфер и возвращает общее число записанных байт.
    pub fn finish(mut self) -> SdoResult<u64> {
        self.writer.flush()?;
        let bytes = self.bytes_written();

        self.writer
            .into_inner()
            .map_err(|e| SdoError::Io(e.into_error()))?;

        debug!("Archive finished: {} packets, {bytes} B", self.packets_written);

        Ok(bytes)
    }
}

impl ArchiveReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> SdoResult<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            stats: ReadStats::default(),
            eof: false,
        }
    }

    /// Возвращает следующую полную запись или `None` на EOF.
    ///
    /// Неполный хвост файла записью не считается: он учитывается в
    /// [`ReadStats::truncated_bytes`] и чтение завершается.
    pub fn next_packet(&mut self) -> Option<SdoResult<RawPacket>> {
        if self.eof {
            return None;
        }

        let mut raw: RawPacket = Box::new([0u8; PACKET_SIZE]);
        let mut filled = 0;

        while filled < PACKET_SIZE {
            match self.reader.read(&mut raw[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.eof = true;
                    return Some(Err(SdoError::Io(e)));
                }
            }
        }

        if filled < PACKET_SIZE {
            self.eof = true;

            if filled > 0 {
                self.stats.truncated_bytes += filled as u64;
                warn!(
                    "Truncated record at id {}: {filled} of {PACKET_SIZE} B, skipping",
                    self.stats.records
                );
            }

            return None;
        }

        self.stats.records += 1;

        Some(Ok(raw))
    }

    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }
}

impl<R: Read> Iterator for ArchiveReader<R> {
    type Item = SdoResult<RawPacket>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet()
    }
}

/// Читает все полные записи архива.
pub fn read_all_packets<R: Read>(reader: &mut ArchiveReader<R>) -> SdoResult<Vec<RawPacket>> {
    let mut packets = Vec::new();

    while let Some(res) = reader.next_packet() {
        packets.push(res?);
    }

    Ok(packets)
}
