use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use log::{debug, info};
use sdo_core::{decode_or_report, ArchiveReader};
use sdo_types::SdoError;

use crate::{CaptureError, CaptureResult};

/// Итог разбора архива.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Записей с корректным заголовком (напечатан отчёт)
    pub decoded: u64,
    /// Записей с некорректным заголовком
    pub invalid: u64,
    /// Байт усечённого хвоста, не ставшего записью
    pub truncated_bytes: u64,
}

/// Сессия разбора архива (single-threaded).
pub struct ReplaySession<R: Read> {
    reader: ArchiveReader<R>,
    max_packets: Option<u64>,
}

impl ReplayStats {
    pub fn records(&self) -> u64 {
        self.decoded + self.invalid
    }
}

impl ReplaySession<File> {
    /// Открывает архив. Ошибка открытия - `CaptureError::InvalidFile`.
    pub fn open(
        path: &Path,
        max_packets: Option<u64>,
    ) -> CaptureResult<Self> {
        let file = File::open(path).map_err(|source| CaptureError::InvalidFile {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Replaying {path:?}");

        Ok(Self::new(file, max_packets))
    }
}

impl<R: Read> ReplaySession<R> {
    pub fn new(
        reader: R,
        max_packets: Option<u64>,
    ) -> Self {
        Self {
            reader: ArchiveReader::new(reader),
            max_packets,
        }
    }

    /// Разбирает записи по порядку: отчёт о корректных - в `out`,
    /// `Invalid header for id N` - в `err`.
    pub fn run<O: Write, E: Write>(
        mut self,
        out: &mut O,
        err: &mut E,
    ) -> CaptureResult<ReplayStats> {
        let mut stats = ReplayStats::default();

        for id in 0u64.. {
            if self.max_packets.is_some_and(|max| id >= max) {
                debug!("Packet limit reached ({id})");
                break;
            }

            let raw = match self.reader.next_packet() {
                Some(res) => res?,
                None => break,
            };

            match decode_or_report(&raw[..], id) {
                Ok(report) => {
                    out.write_all(report.as_bytes())?;
                    stats.decoded += 1;
                }
                Err(e @ SdoError::InvalidHeader { .. }) => {
                    writeln!(err, "{e}")?;
                    stats.invalid += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        out.flush()?;
        stats.truncated_bytes = self.reader.stats().truncated_bytes;

        info!(
            "Replay done: {} decoded, {} invalid, {} B truncated",
            stats.decoded, stats.invalid, stats.truncated_bytes
        );

        Ok(stats)
    }
}
