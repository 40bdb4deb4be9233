use thiserror::Error;

/// Результат для операций с пакетами SDO
pub type SdoResult<T> = std::result::Result<T, SdoError>;

/// Ошибки формата пакетов SDO.
#[derive(Debug, Error)]
pub enum SdoError {
    /// Заголовок не прошёл структурную проверку размера
    #[error("Invalid header for id {id}")]
    InvalidHeader { id: u64 },

    /// Значение не помещается в битовое поле
    #[error("Field {field} value {value} does not fit in {width} bits")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        width: u32,
    },

    /// Буфер неверной длины
    #[error("Invalid length: expected {expected} bytes, found {found}")]
    InvalidLength { expected: usize, found: usize },

    /// Индекс отсчёта вне диапазона
    #[error("Sample index out of range: {0}")]
    OutOfRange(String),

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdoError {
    pub fn invalid_length(
        expected: usize,
        found: usize,
    ) -> Self {
        Self::InvalidLength { expected, found }
    }

    pub fn out_of_range<S: Into<String>>(s: S) -> Self {
        Self::OutOfRange(s.into())
    }
}
