//! Библиотека формата пакетов AARTFAAC Uniboard (SDO)
//!
//! Побитовый кодек заголовка, структурная проверка, декодер для печати и
//! чтение/запись архивов из пакетов фиксированного размера.
//!
//! # Быстрый старт
//!
//! ```
//! use sdo_core::{decode_or_report, SdoPacketExt};
//! use sdo_types::{SdoHeader, SdoPacket};
//!
//! let raw = SdoPacket::new(SdoHeader::nominal(1, 42)).encode()?;
//! let report = decode_or_report(&raw, 0)?;
//! assert!(report.contains("bsn        42"));
//! # Ok::<(), sdo_types::SdoError>(())
//! ```

pub mod binary;
pub mod decoder;
pub mod format;
pub mod serialization;

pub use binary::*;
pub use decoder::*;
pub use format::*;
pub use serialization::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
