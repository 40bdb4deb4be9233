use std::path::PathBuf;

use sdo_types::SdoError;
use thiserror::Error;

pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// Некорректная конфигурация (флаги, имя файла)
    #[error("Config error: {0}")]
    Config(String),

    /// Файл архива не открывается / не создаётся
    #[error("Invalid filename {path:?}: {source}")]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Не удалось создать или привязать UDP-сокет
    #[error("Bind failed on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Ошибка ввода/вывода во время захвата
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка формата пакетов
    #[error("SDO error: {0}")]
    Sdo(#[from] SdoError),
}

impl CaptureError {
    pub fn config<S: Into<String>>(s: S) -> Self {
        Self::Config(s.into())
    }
}
