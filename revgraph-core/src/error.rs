// Copyright 2025 Revgraph (https://github.com/revgraph)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Core error types

use thiserror::Error;

/// Result type for core wire operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while decoding wire frames
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Frame does not start with the expected magic bytes
    #[error("bad frame magic")]
    BadMagic,

    /// Frame was written by an unknown format version
    #[error("unsupported frame version: {0}")]
    UnsupportedVersion(u8),

    /// Frame ended before the named field could be read
    #[error("truncated frame while reading {0}")]
    Truncated(&'static str),

    /// A variable-length field exceeds what the frame format can carry
    #[error("frame field too large: {0}")]
    Oversized(&'static str),

    /// A text field does not hold valid UTF-8
    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(&'static str),
}
