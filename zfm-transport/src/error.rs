//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Port not open")]
    NotOpen,

    #[error("Port already open")]
    AlreadyOpen,

    #[error("Read timeout")]
    ReadTimeout,

    #[error("Link closed by the other end")]
    LinkClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),
}
