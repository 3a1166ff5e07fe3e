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

//! Binary wire framing
//!
//! Fixed-width big-endian framing for messages and metadata, versioned for
//! schema evolution.
//!
//! **Message frame:**
//! ```text
//! ┌──────────┬─────────┬───────┬───────────┬──────────┬────────────┐
//! │ magic[4] │ ver u8  │ flags │ object 16 │ vers 16  │ [prev 16]  │
//! ├──────────┴─────────┴───────┴───────────┴──────────┴────────────┤
//! │ merges: u16 count + count * 16                                 │
//! │ payload kind: u16 len + utf8                                   │
//! │ allow-write: u16 count + count * (u16 len + utf8)              │
//! │ payload: u32 len + bytes (only when the payload flag is set)   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! **Meta frame:** three big-endian i64 values (partition, offset,
//! timestamp), 24 bytes total.
//!
//! Merge parents are a set on the wire: duplicate ids collapse on decode.

use crate::error::{CoreError, CoreResult};
use crate::header::RevisionHeader;
use crate::message::{LogMeta, RevisionMessage};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Message frame magic bytes.
pub const FRAME_MAGIC: &[u8; 4] = b"RVG1";

/// Current message frame version.
pub const FRAME_VERSION: u8 = 1;

/// Meta frame length in bytes.
pub const META_FRAME_LEN: usize = 24;

const FLAG_PREVIOUS: u8 = 0b0000_0001;
const FLAG_PAYLOAD: u8 = 0b0000_0010;
const FLAG_INHERIT_WRITE: u8 = 0b0000_0100;

/// Encode a message into a wire frame.
pub fn encode_message(msg: &RevisionMessage) -> CoreResult<Vec<u8>> {
    let header = &msg.header;
    if header.merges.len() > u16::MAX as usize {
        return Err(CoreError::Oversized("merge set"));
    }
    if header.payload_kind.len() > u16::MAX as usize {
        return Err(CoreError::Oversized("payload kind"));
    }
    if header.allow_write.len() > u16::MAX as usize {
        return Err(CoreError::Oversized("allow-write list"));
    }

    let mut out = Vec::with_capacity(64 + header.merges.len() * 16);
    out.extend_from_slice(FRAME_MAGIC);
    out.push(FRAME_VERSION);

    let mut flags = 0u8;
    if header.previous.is_some() {
        flags |= FLAG_PREVIOUS;
    }
    if msg.payload.is_some() {
        flags |= FLAG_PAYLOAD;
    }
    if header.inherit_write {
        flags |= FLAG_INHERIT_WRITE;
    }
    out.push(flags);

    out.extend_from_slice(header.object_id.as_bytes());
    out.extend_from_slice(header.version.as_bytes());
    if let Some(previous) = header.previous {
        out.extend_from_slice(previous.as_bytes());
    }

    out.extend_from_slice(&(header.merges.len() as u16).to_be_bytes());
    for parent in &header.merges {
        out.extend_from_slice(parent.as_bytes());
    }

    out.extend_from_slice(&(header.payload_kind.len() as u16).to_be_bytes());
    out.extend_from_slice(header.payload_kind.as_bytes());

    out.extend_from_slice(&(header.allow_write.len() as u16).to_be_bytes());
    for role in &header.allow_write {
        if role.len() > u16::MAX as usize {
            return Err(CoreError::Oversized("allow-write role"));
        }
        out.extend_from_slice(&(role.len() as u16).to_be_bytes());
        out.extend_from_slice(role.as_bytes());
    }

    if let Some(payload) = &msg.payload {
        if payload.len() > u32::MAX as usize {
            return Err(CoreError::Oversized("payload"));
        }
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
    }

    Ok(out)
}

/// Decode a message from a wire frame.
pub fn decode_message(bytes: &[u8]) -> CoreResult<RevisionMessage> {
    let mut cursor = Cursor::new(bytes);

    if cursor.take(4, "magic")? != FRAME_MAGIC {
        return Err(CoreError::BadMagic);
    }
    let version = cursor.u8("frame version")?;
    if version != FRAME_VERSION {
        return Err(CoreError::UnsupportedVersion(version));
    }
    let flags = cursor.u8("flags")?;

    let object_id = cursor.uuid("object id")?;
    let version_id = cursor.uuid("version id")?;
    let previous = if flags & FLAG_PREVIOUS != 0 {
        Some(cursor.uuid("previous version")?)
    } else {
        None
    };

    let merge_count = cursor.u16("merge count")?;
    let mut merges = BTreeSet::new();
    for _ in 0..merge_count {
        merges.insert(cursor.uuid("merge parent")?);
    }

    let kind_len = cursor.u16("payload kind length")? as usize;
    let payload_kind = String::from_utf8(cursor.take(kind_len, "payload kind")?.to_vec())
        .map_err(|_| CoreError::InvalidUtf8("payload kind"))?;

    let role_count = cursor.u16("allow-write count")?;
    let mut allow_write = Vec::with_capacity(role_count as usize);
    for _ in 0..role_count {
        let role_len = cursor.u16("allow-write role length")? as usize;
        let role = String::from_utf8(cursor.take(role_len, "allow-write role")?.to_vec())
            .map_err(|_| CoreError::InvalidUtf8("allow-write role"))?;
        allow_write.push(role);
    }

    let payload = if flags & FLAG_PAYLOAD != 0 {
        let len = cursor.u32("payload length")? as usize;
        Some(cursor.take(len, "payload")?.to_vec())
    } else {
        None
    };

    Ok(RevisionMessage::new(
        RevisionHeader {
            object_id,
            version: version_id,
            previous,
            merges,
            payload_kind,
            inherit_write: flags & FLAG_INHERIT_WRITE != 0,
            allow_write,
        },
        payload,
    ))
}

/// Encode placement metadata.
pub fn encode_meta(meta: &LogMeta) -> [u8; META_FRAME_LEN] {
    let mut out = [0u8; META_FRAME_LEN];
    out[0..8].copy_from_slice(&meta.partition().to_be_bytes());
    out[8..16].copy_from_slice(&meta.offset().to_be_bytes());
    out[16..24].copy_from_slice(&meta.timestamp().to_be_bytes());
    out
}

/// Decode placement metadata. The result is not frozen.
pub fn decode_meta(bytes: &[u8]) -> CoreResult<LogMeta> {
    if bytes.len() < META_FRAME_LEN {
        return Err(CoreError::Truncated("meta frame"));
    }
    let mut field = [0u8; 8];
    field.copy_from_slice(&bytes[0..8]);
    let partition = i64::from_be_bytes(field);
    field.copy_from_slice(&bytes[8..16]);
    let offset = i64::from_be_bytes(field);
    field.copy_from_slice(&bytes[16..24]);
    let timestamp = i64::from_be_bytes(field);
    Ok(LogMeta::new(partition, offset, timestamp))
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize, what: &'static str) -> CoreResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(CoreError::Truncated(what))?;
        if end > self.buf.len() {
            return Err(CoreError::Truncated(what));
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, what: &'static str) -> CoreResult<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &'static str) -> CoreResult<u16> {
        let bytes = self.take(2, what)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self, what: &'static str) -> CoreResult<u32> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn uuid(&mut self, what: &'static str) -> CoreResult<Uuid> {
        let bytes = self.take(16, what)?;
        let mut raw = [0u8; 16];
        raw.copy_from_slice(bytes);
        Ok(Uuid::from_bytes(raw))
    }
}
