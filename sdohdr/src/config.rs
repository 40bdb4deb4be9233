use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use crate::{CaptureError, CaptureResult};

/// Режим работы (выбор при старте).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// Чтение архива и печать заголовков.
    Replay,
    /// Захват по UDP на указанном порту.
    CaptureUdp { port: u16 },
    /// Захват из стандартного ввода.
    CaptureStdin,
}

/// Полная конфигурация запуска.
#[derive(Debug, Clone)]
pub struct SdohdrConfig {
    /// Режим
    pub mode: CaptureMode,
    /// Файл архива: источник в режиме Replay, приёмник при захвате
    pub file_path: PathBuf,
    /// Длительность захвата
    pub duration: Duration,
    /// Ограничение числа разобранных пакетов (None = без ограничения)
    pub max_packets: Option<u64>,
    /// Адрес привязки UDP-сокета
    pub bind_addr: IpAddr,
    /// Максимальное время одного ожидания recv/poll
    pub poll_interval: Duration,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl CaptureMode {
    /// Выбирает режим по флагам `-u` и `-i`.
    pub fn from_flags(
        port: Option<u16>,
        stdin: bool,
    ) -> CaptureResult<Self> {
        match (port, stdin) {
            (Some(_), true) => Err(CaptureError::config(
                "-u and -i are mutually exclusive",
            )),
            (Some(0), false) => Err(CaptureError::config("UDP port must be non-zero")),
            (Some(port), false) => Ok(CaptureMode::CaptureUdp { port }),
            (None, true) => Ok(CaptureMode::CaptureStdin),
            (None, false) => Ok(CaptureMode::Replay),
        }
    }

    pub fn is_capture(&self) -> bool {
        !matches!(self, CaptureMode::Replay)
    }
}

impl SdohdrConfig {
    /// Проверяет конфигурацию до любого ввода/вывода.
    pub fn validate(&self) -> CaptureResult<()> {
        if self.file_path.as_os_str().is_empty() {
            return Err(CaptureError::config("file name must not be empty"));
        }

        if self.file_path.is_dir() {
            return Err(CaptureError::config(format!(
                "{:?} is a directory",
                self.file_path
            )));
        }

        // Архив пишется после захвата: каталог проверяем заранее
        if self.mode.is_capture() {
            let parent = match self.file_path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };

            if !parent.is_dir() {
                return Err(CaptureError::config(format!(
                    "Invalid filename {:?}: directory {parent:?} does not exist",
                    self.file_path
                )));
            }
        }

        if self.mode.is_capture() && Instant::now().checked_add(self.duration).is_none() {
            return Err(CaptureError::config(format!(
                "capture duration {:.0}s is too large",
                self.duration.as_secs_f64()
            )));
        }

        if self.poll_interval.is_zero() {
            return Err(CaptureError::config("poll interval must be > 0"));
        }

        if self.max_packets == Some(0) {
            return Err(CaptureError::config("packet count must be > 0"));
        }

        Ok(())
    }

    /// Адрес привязки для режима UDP.
    pub fn udp_addr(&self) -> Option<SocketAddr> {
        match self.mode {
            CaptureMode::CaptureUdp { port } => Some(SocketAddr::new(self.bind_addr, port)),
            _ => None,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for CaptureMode {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            CaptureMode::Replay => write!(f, "replay"),
            CaptureMode::CaptureUdp { port } => write!(f, "udp:{port}"),
            CaptureMode::CaptureStdin => write!(f, "stdin"),
        }
    }
}

impl Default for SdohdrConfig {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Replay,
            file_path: PathBuf::from("sdo.bin"),
            duration: Duration::from_secs(10),
            max_packets: None,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Парсит длительность в секундах (дробная часть допускается).
///
/// # Примеры
/// ```
/// use sdohdr::config::parse_duration_secs;
/// assert_eq!(parse_duration_secs("10").unwrap().as_millis(), 10_000);
/// assert_eq!(parse_duration_secs("0.25").unwrap().as_millis(), 250);
/// assert!(parse_duration_secs("-1").is_err());
/// ```
pub fn parse_duration_secs(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|e| format!("Invalid duration '{s}': {e}"))?;

    Duration::try_from_secs_f64(secs).map_err(|e| format!("Invalid duration '{s}': {e}"))
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_secs() {
        assert_eq!(parse_duration_secs("10.0").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration_secs("0").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration_secs(" 1.5 ").unwrap(), Duration::from_millis(1_500));
        assert!(parse_duration_secs("abc").is_err());
        assert!(parse_duration_secs("-0.5").is_err());
        assert!(parse_duration_secs("inf").is_err());
        assert!(parse_duration_secs("NaN").is_err());
    }

    #[test]
    fn test_mode_from_flags() {
        assert_eq!(CaptureMode::from_flags(None, false).unwrap(), CaptureMode::Replay);
        assert_eq!(
            CaptureMode::from_flags(Some(53_234), false).unwrap(),
            CaptureMode::CaptureUdp { port: 53_234 }
        );
        assert_eq!(
            CaptureMode::from_flags(None, true).unwrap(),
            CaptureMode::CaptureStdin
        );
        assert!(CaptureMode::from_flags(Some(1), true).is_err());
        assert!(CaptureMode::from_flags(Some(0), false).is_err());
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(CaptureMode::Replay.to_string(), "replay");
        assert_eq!(CaptureMode::CaptureUdp { port: 5 }.to_string(), "udp:5");
        assert_eq!(CaptureMode::CaptureStdin.to_string(), "stdin");
        assert!(CaptureMode::CaptureStdin.is_capture());
        assert!(!CaptureMode::Replay.is_capture());
    }

    #[test]
    fn test_config_validate() {
        assert!(SdohdrConfig::default().validate().is_ok());

        let empty = SdohdrConfig {
            file_path: PathBuf::new(),
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let dir = SdohdrConfig {
            file_path: std::env::temp_dir(),
            ..Default::default()
        };
        assert!(dir.validate().is_err());

        let zero_count = SdohdrConfig {
            max_packets: Some(0),
            ..Default::default()
        };
        assert!(zero_count.validate().is_err());

        let huge = SdohdrConfig {
            mode: CaptureMode::CaptureStdin,
            duration: parse_duration_secs("1e19").unwrap(),
            ..Default::default()
        };
        assert!(huge.validate().unwrap_err().to_string().contains("duration"));
    }

    #[test]
    fn test_config_validate_capture_output_dir() {
        let missing = std::env::temp_dir().join("sdohdr-no-such-dir").join("out.bin");

        let capture = SdohdrConfig {
            mode: CaptureMode::CaptureUdp { port: 4_000 },
            file_path: missing.clone(),
            ..Default::default()
        };
        let err = capture.validate().unwrap_err();
        assert!(matches!(err, CaptureError::Config(_)));
        assert!(err.to_string().contains("Invalid filename"));

        let stdin = SdohdrConfig {
            mode: CaptureMode::CaptureStdin,
            file_path: missing.clone(),
            ..Default::default()
        };
        assert!(stdin.validate().is_err());

        // Имя без каталога: пишем в текущий
        let bare = SdohdrConfig {
            mode: CaptureMode::CaptureStdin,
            file_path: PathBuf::from("out.bin"),
            ..Default::default()
        };
        assert!(bare.validate().is_ok());

        // При разборе отсутствие файла обнаруживает open
        let replay = SdohdrConfig {
            file_path: missing,
            ..Default::default()
        };
        assert!(replay.validate().is_ok());
    }

    #[test]
    fn test_udp_addr() {
        let config = SdohdrConfig {
            mode: CaptureMode::CaptureUdp { port: 4_000 },
            ..Default::default()
        };
        assert_eq!(config.udp_addr().unwrap().to_string(), "0.0.0.0:4000");
        assert!(SdohdrConfig::default().udp_addr().is_none());
    }
}
