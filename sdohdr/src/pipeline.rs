use std::{
    path::Path,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use sdo_core::{validate_raw, ArchiveWriter};
use sdo_types::{RawPacket, PACKET_SIZE};

use crate::{
    metrics::CaptureSummary,
    source::{Acquired, PacketSource},
    CaptureError, CaptureResult, SdohdrConfig,
};

/// Состояние цикла захвата.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Running,
    Stopped,
}

/// Цикл захвата с ограничением по времени (single-threaded).
pub struct CaptureLoop {
    duration: Duration,
    max_packets: Option<u64>,
    state: CaptureState,
}

/// Результат захвата: счётчики и сохранённые пакеты в порядке приёма.
#[derive(Debug)]
pub struct CaptureOutcome {
    pub summary: CaptureSummary,
    pub packets: Vec<RawPacket>,
}

impl CaptureLoop {
    pub fn new(
        duration: Duration,
        max_packets: Option<u64>,
    ) -> Self {
        Self {
            duration,
            max_packets,
            state: CaptureState::Idle,
        }
    }

    pub fn from_config(config: &SdohdrConfig) -> Self {
        Self::new(config.duration, config.max_packets)
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Запускает захват. Блокируется до дедлайна, EOF или лимита пакетов.
    ///
    /// Дедлайн проверяется после каждой попытки получения, поэтому
    /// превышение не больше одного интервала ожидания источника.
    pub fn run(
        &mut self,
        source: &mut dyn PacketSource,
    ) -> CaptureResult<CaptureOutcome> {
        let start = Instant::now();
        let deadline = start.checked_add(self.duration).ok_or_else(|| {
            CaptureError::config(format!(
                "capture duration {:.0}s is too large",
                self.duration.as_secs_f64()
            ))
        })?;
        self.state = CaptureState::Running;

        info!(
            "Capturing from {} for {:.1}s",
            source.describe(),
            self.duration.as_secs_f64()
        );

        let mut summary = CaptureSummary::default();
        let mut packets: Vec<RawPacket> = Vec::new();
        let mut buf: RawPacket = Box::new([0u8; PACKET_SIZE]);

        while self.state == CaptureState::Running {
            let acquired = match source.acquire(&mut buf, deadline) {
                Ok(a) => a,
                Err(e) => {
                    self.state = CaptureState::Stopped;
                    return Err(e);
                }
            };

            match acquired {
                Acquired::Packet(n) => {
                    summary.bytes_received += n as u64;

                    if n == PACKET_SIZE && validate_raw(&buf[..]) {
                        summary.valid += 1;
                        summary.bytes_accepted += n as u64;
                        packets.push(std::mem::replace(&mut buf, Box::new([0u8; PACKET_SIZE])));
                    } else {
                        summary.invalid += 1;
                        debug!("Invalid packet #{} ({n} B)", summary.packets() - 1);
                    }

                    if let Some(max) = self.max_packets {
                        if summary.packets() >= max {
                            info!("Packet limit reached ({max}). Stopping...");
                            self.state = CaptureState::Stopped;
                        }
                    }
                }
                Acquired::Idle => {}
                Acquired::Partial(n) => {
                    summary.bytes_discarded += n as u64;
                    self.state = CaptureState::Stopped;
                }
                Acquired::Eof => {
                    info!("End of input. Stopping...");
                    self.state = CaptureState::Stopped;
                }
            }

            if Instant::now() >= deadline {
                self.state = CaptureState::Stopped;
            }
        }

        summary.duration = start.elapsed();

        if summary.bytes_discarded > 0 {
            warn!(
                "Discarded {} B of an incomplete packet",
                summary.bytes_discarded
            );
        }

        Ok(CaptureOutcome { summary, packets })
    }
}

/// Записывает пакеты подряд в файл; возвращает число записанных байт.
pub fn write_archive(
    path: &Path,
    packets: &[RawPacket],
) -> CaptureResult<u64> {
    let mut writer = ArchiveWriter::create(path).map_err(|e| into_file_error(path, e))?;

    for p in packets {
        writer.write_packet(&p[..])?;
    }

    Ok(writer.finish()?)
}

/// Полная сессия захвата: цикл + запись архива в `config.file_path`.
pub fn run_capture(
    config: &SdohdrConfig,
    source: &mut dyn PacketSource,
) -> CaptureResult<CaptureSummary> {
    let mut capture = CaptureLoop::from_config(config);
    let CaptureOutcome {
        mut summary,
        packets,
    } = capture.run(source)?;

    summary.bytes_written = write_archive(&config.file_path, &packets)?;

    info!(
        "Captured {} packets in {:.1}s ({:.1} MB/s, {:.2}% invalid) -> {:?}",
        summary.packets(),
        summary.duration.as_secs_f64(),
        summary.receive_speed_mbps(),
        summary.invalid_rate_pct(),
        config.file_path
    );

    Ok(summary)
}

fn into_file_error(
    path: &Path,
    e: sdo_types::SdoError,
) -> CaptureError {
    match e {
        sdo_types::SdoError::Io(source) => CaptureError::InvalidFile {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, io::Cursor};

    use sdo_core::SdoPacketExt;
    use sdo_types::{SdoHeader, SdoPacket};
    use tempfile::NamedTempFile;

    use super::*;
    use crate::source::StreamSource;

    /// Источник со сценарием: выдаёт заранее заданные результаты по очереди.
    struct ScriptedSource {
        script: VecDeque<(Vec<u8>, Acquired)>,
    }

    impl PacketSource for ScriptedSource {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        fn acquire(
            &mut self,
            buf: &mut [u8; PACKET_SIZE],
            _deadline: Instant,
        ) -> CaptureResult<Acquired> {
            match self.script.pop_front() {
                Some((bytes, result)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(result)
                }
                None => Ok(Acquired::Eof),
            }
        }
    }

    fn valid_bytes(bsn: u64) -> Vec<u8> {
        SdoPacket::new(SdoHeader::nominal(1, bsn)).encode().unwrap()
    }

    fn invalid_bytes() -> Vec<u8> {
        let mut h = SdoHeader::nominal(1, 0);
        h.words_per_block = 100;
        SdoPacket::new(h).encode().unwrap()
    }

    #[test]
    fn test_loop_classifies_packets() {
        let mut src = ScriptedSource {
            script: VecDeque::from(vec![
                (valid_bytes(1), Acquired::Packet(PACKET_SIZE)),
                (invalid_bytes(), Acquired::Packet(PACKET_SIZE)),
                (Vec::new(), Acquired::Idle),
                (valid_bytes(2), Acquired::Packet(PACKET_SIZE)),
                (vec![0u8; 40], Acquired::Packet(40)),
            ]),
        };

        let mut capture = CaptureLoop::new(Duration::from_secs(5), None);
        assert_eq!(capture.state(), CaptureState::Idle);

        let outcome = capture.run(&mut src).unwrap();
        let s = &outcome.summary;

        assert_eq!(capture.state(), CaptureState::Stopped);
        assert_eq!(s.valid, 2);
        assert_eq!(s.invalid, 2);
        assert_eq!(s.bytes_received, 3 * PACKET_SIZE as u64 + 40);
        assert_eq!(s.bytes_accepted, 2 * PACKET_SIZE as u64);
        assert_eq!(outcome.packets.len(), 2);
        assert_eq!(outcome.packets[1][..], valid_bytes(2)[..]);
    }

    #[test]
    fn test_loop_respects_max_packets() {
        let data: Vec<u8> = (0..5).flat_map(valid_bytes).collect();
        let mut src = StreamSource::new(Cursor::new(data), Duration::from_millis(10));

        let mut capture = CaptureLoop::new(Duration::from_secs(5), Some(3));
        let outcome = capture.run(&mut src).unwrap();

        assert_eq!(outcome.summary.valid, 3);
        assert_eq!(outcome.packets.len(), 3);
    }

    #[test]
    fn test_loop_partial_stops_and_discards() {
        let mut src = ScriptedSource {
            script: VecDeque::from(vec![
                (valid_bytes(1), Acquired::Packet(PACKET_SIZE)),
                (Vec::new(), Acquired::Partial(500)),
                (valid_bytes(2), Acquired::Packet(PACKET_SIZE)),
            ]),
        };

        let outcome = CaptureLoop::new(Duration::from_secs(5), None)
            .run(&mut src)
            .unwrap();

        assert_eq!(outcome.summary.valid, 1);
        assert_eq!(outcome.summary.bytes_discarded, 500);
        assert_eq!(outcome.summary.bytes_received, PACKET_SIZE as u64);
    }

    #[test]
    fn test_loop_zero_duration_stops_after_one_attempt() {
        let mut src = ScriptedSource {
            script: VecDeque::from(vec![
                (valid_bytes(1), Acquired::Packet(PACKET_SIZE)),
                (valid_bytes(2), Acquired::Packet(PACKET_SIZE)),
            ]),
        };

        let outcome = CaptureLoop::new(Duration::ZERO, None).run(&mut src).unwrap();
        assert_eq!(outcome.summary.valid, 1);
    }

    #[test]
    fn test_loop_rejects_unrepresentable_deadline() {
        let duration = crate::parse_duration_secs("1e19").unwrap();
        let mut src = StreamSource::new(Cursor::new(Vec::new()), Duration::from_millis(10));

        let mut capture = CaptureLoop::new(duration, None);
        match capture.run(&mut src) {
            Err(CaptureError::Config(msg)) => assert!(msg.contains("duration")),
            other => panic!("expected Config error, got {other:?}"),
        }
        assert_eq!(capture.state(), CaptureState::Idle);
    }

    #[test]
    fn test_run_capture_writes_archive() {
        let tmp = NamedTempFile::new().unwrap();
        let config = SdohdrConfig {
            file_path: tmp.path().to_path_buf(),
            ..Default::default()
        };

        let mut data = valid_bytes(1);
        data.extend_from_slice(&invalid_bytes());
        data.extend_from_slice(&valid_bytes(3));
        let mut src = StreamSource::new(Cursor::new(data.clone()), Duration::from_millis(10));

        let summary = run_capture(&config, &mut src).unwrap();

        assert_eq!(summary.valid, 2);
        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.bytes_received, 3 * PACKET_SIZE as u64);
        assert_eq!(summary.bytes_written, 2 * PACKET_SIZE as u64);

        let written = std::fs::read(tmp.path()).unwrap();
        assert_eq!(&written[..PACKET_SIZE], &data[..PACKET_SIZE]);
        assert_eq!(&written[PACKET_SIZE..], &data[2 * PACKET_SIZE..]);
    }

    #[test]
    fn test_write_archive_bad_path() {
        let path = std::env::temp_dir().join("no-such-dir-sdohdr").join("out.bin");
        match write_archive(&path, &[]) {
            Err(CaptureError::InvalidFile { .. }) => {}
            other => panic!("expected InvalidFile, got {other:?}"),
        }
    }
}
