use rayon::prelude::*;

use skiff_store::StoredObject;
use skiff_types::ObjectId;

use crate::entry::type_byte;
use crate::error::{PackError, PackResult};
use crate::index::PackIndex;

pub const PACK_MAGIC: &[u8; 4] = b"SKFP";
pub const PACK_VERSION: u32 = 1;
/// Magic, version and entry count, four bytes each.
pub(crate) const HEADER_LEN: usize = 12;
/// BLAKE3 digest of everything before it.
pub(crate) const TRAILER_LEN: usize = 32;

const ZSTD_LEVEL: i32 = 3;

/// Lays out queued objects as a pack.
///
/// Each entry is a type byte, the LEB128 body length, the LEB128 compressed
/// length, then the zstd-compressed body. Entries appear in the order they
/// were added.
#[derive(Debug, Default)]
pub struct PackWriter {
    objects: Vec<(ObjectId, StoredObject)>,
}

impl PackWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `object` under an id the caller already knows.
    pub fn add(&mut self, id: ObjectId, object: StoredObject) {
        self.objects.push((id, object));
    }

    pub fn add_stored_object(&mut self, object: &StoredObject) {
        self.add(object.compute_id(), object.clone());
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn finish_to_bytes(self) -> PackResult<(Vec<u8>, PackIndex)> {
        let bodies = self
            .objects
            .iter()
            .map(|(id, obj)| compress(id, obj))
            .collect::<PackResult<Vec<_>>>()?;
        self.assemble(bodies)
    }

    /// Same output as [`finish_to_bytes`](Self::finish_to_bytes), with the
    /// compression spread over `pool`.
    pub fn finish_on_pool(self, pool: &rayon::ThreadPool) -> PackResult<(Vec<u8>, PackIndex)> {
        let bodies = pool.install(|| {
            self.objects
                .par_iter()
                .map(|(id, obj)| compress(id, obj))
                .collect::<PackResult<Vec<_>>>()
        })?;
        self.assemble(bodies)
    }

    fn assemble(self, bodies: Vec<Vec<u8>>) -> PackResult<(Vec<u8>, PackIndex)> {
        let count = u32::try_from(self.objects.len())
            .map_err(|_| PackError::CompressionFailed("more than u32::MAX objects".into()))?;

        let payload: usize = bodies.iter().map(Vec::len).sum();
        let mut out = Vec::with_capacity(HEADER_LEN + payload + TRAILER_LEN);
        out.extend_from_slice(PACK_MAGIC);
        out.extend_from_slice(&PACK_VERSION.to_be_bytes());
        out.extend_from_slice(&count.to_be_bytes());

        let mut located = Vec::with_capacity(self.objects.len());
        for ((id, obj), body) in self.objects.iter().zip(bodies) {
            located.push((*id, crc32fast::hash(&body), out.len() as u64));
            out.push(type_byte(obj.kind));
            encode_varint(&mut out, obj.data.len() as u64);
            encode_varint(&mut out, body.len() as u64);
            out.extend_from_slice(&body);
        }

        let checksum: [u8; TRAILER_LEN] = blake3::hash(&out).into();
        out.extend_from_slice(&checksum);
        Ok((out, PackIndex::build(located, checksum)))
    }
}

fn compress(id: &ObjectId, object: &StoredObject) -> PackResult<Vec<u8>> {
    zstd::encode_all(object.data.as_slice(), ZSTD_LEVEL)
        .map_err(|e| PackError::CompressionFailed(format!("{}: {e}", id.short_hex())))
}

/// Append `value` as unsigned LEB128.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Read an unsigned LEB128 value, returning it with the bytes consumed.
pub(crate) fn decode_varint(data: &[u8]) -> PackResult<(u64, usize)> {
    let bad = |reason: &str| PackError::CorruptEntry {
        offset: 0,
        reason: reason.into(),
    };
    let mut value = 0u64;
    for (i, &byte) in data.iter().enumerate() {
        let shift = 7 * i as u32;
        if shift >= u64::BITS {
            return Err(bad("varint overflow"));
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(bad("truncated varint"))
}
