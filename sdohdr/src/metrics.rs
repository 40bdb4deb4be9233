use std::time::Duration;

/// Счётчики одного запуска цикла захвата.
///
/// Значение возвращается из цикла, глобального состояния нет.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Пакетов прошло проверку и сохранено
    pub valid: u64,
    /// Пакетов не прошло проверку
    pub invalid: u64,
    /// Всего байт получено в завершённых пакетах (валидных и нет)
    pub bytes_received: u64,
    /// Байт в сохранённых пакетах
    pub bytes_accepted: u64,
    /// Байт записано в архив
    pub bytes_written: u64,
    /// Байт неполного пакета, отброшенного по дедлайну или EOF
    pub bytes_discarded: u64,
    /// Фактическая длительность захвата
    pub duration: Duration,
}

impl CaptureSummary {
    pub fn packets(&self) -> u64 {
        self.valid + self.invalid
    }

    /// Скорость приёма в МБ/с.
    pub fn receive_speed_mbps(&self) -> f64 {
        let secs = self.duration.as_secs_f64();

        if secs < 1e-9 {
            return 0.0;
        }

        self.bytes_received as f64 / secs / 1_000_000.0
    }

    /// Процент невалидных пакетов (0.0-100.0).
    pub fn invalid_rate_pct(&self) -> f64 {
        let total = self.packets();

        if total == 0 {
            0.0
        } else {
            self.invalid as f64 / total as f64 * 100.0
        }
    }
}

impl std::fmt::Display for CaptureSummary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "Valid   {}", self.valid)?;
        writeln!(f, "Invalid {}", self.invalid)?;
        write!(
            f,
            "Total   {}B received, {}B written",
            self.bytes_received, self.bytes_written
        )
    }
}
