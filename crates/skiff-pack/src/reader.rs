use tracing::debug;

use skiff_store::{ObjectKind, StoredObject};
use skiff_types::ObjectId;

use crate::entry::kind_from_type_byte;
use crate::error::{PackError, PackResult};
use crate::index::PackIndex;
use crate::writer::{decode_varint, HEADER_LEN, PACK_MAGIC, PACK_VERSION, TRAILER_LEN};

/// Smallest possible entry: a type byte and two one-byte lengths.
const MIN_ENTRY_LEN: usize = 3;

/// Largest body an entry may declare.
pub const MAX_ENTRY_SIZE: u64 = 1 << 30;

/// Reads objects from a pack using an index for random access.
#[derive(Debug)]
pub struct PackReader {
    pack_data: Vec<u8>,
    index: PackIndex,
}

/// One decoded entry and where it ended.
struct RawEntry {
    kind: ObjectKind,
    data: Vec<u8>,
    crc: u32,
    end: usize,
}

impl PackReader {
    /// Open from raw bytes and an index produced alongside them.
    pub fn from_bytes(pack_data: Vec<u8>, index: PackIndex) -> PackResult<Self> {
        check_header(&pack_data)?;
        Ok(Self { pack_data, index })
    }

    /// Open pack bytes received without an index: verify the trailer, then
    /// decode every entry and derive its id from its content.
    pub fn index_pack(pack_data: Vec<u8>) -> PackResult<Self> {
        let count = check_header(&pack_data)?;
        verify_trailer(&pack_data)?;

        let body_end = pack_data.len() - TRAILER_LEN;
        let fits = (body_end - HEADER_LEN) / MIN_ENTRY_LEN;
        let mut entries = Vec::with_capacity((count as usize).min(fits));
        let mut pos = HEADER_LEN;
        for _ in 0..count {
            let raw = decode_entry(&pack_data[..body_end], pos)?;
            let id = StoredObject::new(raw.kind, raw.data).compute_id();
            entries.push((id, raw.crc, pos as u64));
            pos = raw.end;
        }
        if pos != body_end {
            return Err(PackError::CorruptEntry {
                offset: pos as u64,
                reason: "trailing data after last entry".into(),
            });
        }

        let mut checksum = [0u8; 32];
        checksum.copy_from_slice(&pack_data[body_end..]);
        let index = PackIndex::build(entries, checksum);
        debug!(objects = index.object_count(), "indexed pack");
        Ok(Self { pack_data, index })
    }

    /// Check the BLAKE3 trailer against the pack body and the index.
    pub fn verify_checksum(&self) -> PackResult<()> {
        verify_trailer(&self.pack_data)?;
        let trailer = &self.pack_data[self.pack_data.len() - TRAILER_LEN..];
        if trailer != self.index.pack_checksum {
            return Err(PackError::ChecksumMismatch);
        }
        Ok(())
    }

    /// Read an object by ID.
    pub fn read_object(&self, id: &ObjectId) -> PackResult<Option<StoredObject>> {
        let Some((offset, expected_crc)) = self.index.lookup(id) else {
            return Ok(None);
        };
        let raw = decode_entry(&self.pack_data, offset as usize)?;
        if raw.crc != expected_crc {
            return Err(PackError::CrcMismatch { id: *id });
        }
        Ok(Some(StoredObject::new(raw.kind, raw.data)))
    }

    /// Every object in the pack, in id order.
    pub fn objects(&self) -> impl Iterator<Item = PackResult<(ObjectId, StoredObject)>> + '_ {
        self.index.object_ids.iter().map(move |id| {
            let obj = self.read_object(id)?.ok_or_else(|| PackError::CorruptEntry {
                offset: 0,
                reason: format!("indexed object {id} is not readable"),
            })?;
            Ok((*id, obj))
        })
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.index.contains(id)
    }

    pub fn object_count(&self) -> usize {
        self.index.object_count()
    }

    pub fn index(&self) -> &PackIndex {
        &self.index
    }

    pub fn object_ids(&self) -> &[ObjectId] {
        &self.index.object_ids
    }
}

fn read_u32(data: &[u8], pos: usize) -> PackResult<u32> {
    data.get(pos..pos + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or_else(|| PackError::CorruptEntry {
            offset: pos as u64,
            reason: "truncated header".into(),
        })
}

/// Validate magic and version; returns the object count.
fn check_header(data: &[u8]) -> PackResult<u32> {
    if data.len() < HEADER_LEN {
        return Err(PackError::CorruptEntry {
            offset: 0,
            reason: "pack data too short".into(),
        });
    }
    if &data[0..4] != PACK_MAGIC {
        return Err(PackError::InvalidMagic {
            expected: String::from_utf8_lossy(PACK_MAGIC).into(),
            actual: String::from_utf8_lossy(&data[0..4]).into(),
        });
    }
    let version = read_u32(data, 4)?;
    if version != PACK_VERSION {
        return Err(PackError::UnsupportedVersion(version));
    }
    read_u32(data, 8)
}

fn verify_trailer(data: &[u8]) -> PackResult<()> {
    if data.len() < HEADER_LEN + TRAILER_LEN {
        return Err(PackError::ChecksumMismatch);
    }
    let (body, trailer) = data.split_at(data.len() - TRAILER_LEN);
    if blake3::hash(body).as_bytes() != trailer {
        return Err(PackError::ChecksumMismatch);
    }
    Ok(())
}

fn decode_entry(data: &[u8], offset: usize) -> PackResult<RawEntry> {
    let corrupt = |reason: String| PackError::CorruptEntry {
        offset: offset as u64,
        reason,
    };

    let mut pos = offset;
    let type_byte = *data
        .get(pos)
        .ok_or_else(|| corrupt("offset beyond pack data".into()))?;
    pos += 1;
    let kind =
        kind_from_type_byte(type_byte).ok_or_else(|| corrupt(format!("unknown type byte: {type_byte}")))?;

    let (uncompressed_size, consumed) = decode_varint(&data[pos..])?;
    pos += consumed;
    if uncompressed_size > MAX_ENTRY_SIZE {
        return Err(corrupt(format!(
            "declared size {uncompressed_size} exceeds {MAX_ENTRY_SIZE}"
        )));
    }
    let (compressed_size, consumed) = decode_varint(&data[pos..])?;
    pos += consumed;

    let end = usize::try_from(compressed_size)
        .ok()
        .and_then(|len| pos.checked_add(len))
        .filter(|end| *end <= data.len())
        .ok_or_else(|| corrupt("compressed data extends beyond pack".into()))?;
    let compressed = &data[pos..end];
    let crc = crc32fast::hash(compressed);

    // The declared size bounds the output buffer.
    let decompressed = zstd::bulk::decompress(compressed, uncompressed_size as usize)
        .map_err(|e| PackError::DecompressionFailed(e.to_string()))?;
    if decompressed.len() as u64 != uncompressed_size {
        return Err(corrupt(format!(
            "size mismatch: expected {uncompressed_size}, got {}",
            decompressed.len()
        )));
    }

    Ok(RawEntry {
        kind,
        data: decompressed,
        crc,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{encode_varint, PackWriter};

    fn blob(content: &[u8]) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, content.to_vec())
    }

    /// A pack holding one blob entry whose header claims `declared` bytes.
    fn pack_with_entry(declared: u64, compressed: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(PACK_MAGIC);
        data.extend_from_slice(&PACK_VERSION.to_be_bytes());
        data.extend_from_slice(&1u32.to_be_bytes());
        data.push(3);
        encode_varint(&mut data, declared);
        encode_varint(&mut data, compressed.len() as u64);
        data.extend_from_slice(compressed);
        let trailer = *blake3::hash(&data).as_bytes();
        data.extend_from_slice(&trailer);
        data
    }

    fn pack_of(objects: &[StoredObject]) -> (Vec<u8>, PackIndex) {
        let mut writer = PackWriter::new();
        for obj in objects {
            writer.add_stored_object(obj);
        }
        writer.finish_to_bytes().unwrap()
    }

    #[test]
    fn read_back_with_writer_index() {
        let tree = StoredObject::new(ObjectKind::Tree, b"tree content".to_vec());
        let (bytes, index) = pack_of(&[blob(b"hello world"), tree.clone()]);
        let reader = PackReader::from_bytes(bytes, index).unwrap();

        assert_eq!(reader.object_count(), 2);
        reader.verify_checksum().unwrap();
        let read = reader.read_object(&tree.compute_id()).unwrap().unwrap();
        assert_eq!(read.kind, ObjectKind::Tree);
        assert_eq!(read.data, b"tree content");
        assert!(reader
            .read_object(&ObjectId::from_bytes(b"missing"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn index_pack_rebuilds_the_same_index() {
        let objects: Vec<StoredObject> = (0..10)
            .map(|i| blob(format!("object-{i}").as_bytes()))
            .collect();
        let (bytes, index) = pack_of(&objects);
        let reader = PackReader::index_pack(bytes).unwrap();

        assert_eq!(reader.object_ids(), index.object_ids.as_slice());
        let read: Vec<(ObjectId, StoredObject)> =
            reader.objects().collect::<PackResult<_>>().unwrap();
        assert_eq!(read.len(), 10);
        for (id, obj) in read {
            assert_eq!(obj.compute_id(), id);
        }
    }

    #[test]
    fn empty_pack() {
        let (bytes, _) = pack_of(&[]);
        let reader = PackReader::index_pack(bytes).unwrap();
        assert_eq!(reader.object_count(), 0);
    }

    #[test]
    fn large_object_compresses() {
        let large = vec![0xABu8; 100_000];
        let (bytes, index) = pack_of(&[blob(&large)]);
        assert!(bytes.len() < large.len());
        let reader = PackReader::from_bytes(bytes, index).unwrap();
        let id = blob(&large).compute_id();
        assert_eq!(reader.read_object(&id).unwrap().unwrap().data, large);
    }

    #[test]
    fn flipped_byte_fails_checksum() {
        let (mut bytes, _) = pack_of(&[blob(b"payload")]);
        bytes[HEADER_LEN + 4] ^= 0xFF;
        assert!(matches!(
            PackReader::index_pack(bytes),
            Err(PackError::ChecksumMismatch)
        ));
    }

    #[test]
    fn bad_magic_and_version() {
        let mut data = vec![0u8; 100];
        data[0..4].copy_from_slice(b"BADM");
        let idx = PackIndex::build(vec![], [0u8; 32]);
        assert!(matches!(
            PackReader::from_bytes(data.clone(), idx.clone()),
            Err(PackError::InvalidMagic { .. })
        ));

        data[0..4].copy_from_slice(PACK_MAGIC);
        data[4..8].copy_from_slice(&99u32.to_be_bytes());
        assert!(matches!(
            PackReader::from_bytes(data, idx.clone()),
            Err(PackError::UnsupportedVersion(99))
        ));

        assert!(matches!(
            PackReader::from_bytes(vec![1, 2, 3], idx),
            Err(PackError::CorruptEntry { .. })
        ));
    }

    #[test]
    fn entry_count_beyond_body_is_an_error() {
        let mut data = Vec::new();
        data.extend_from_slice(PACK_MAGIC);
        data.extend_from_slice(&PACK_VERSION.to_be_bytes());
        data.extend_from_slice(&u32::MAX.to_be_bytes());
        let trailer = *blake3::hash(&data).as_bytes();
        data.extend_from_slice(&trailer);

        assert!(matches!(
            PackReader::index_pack(data),
            Err(PackError::CorruptEntry { offset: 12, .. })
        ));
    }

    #[test]
    fn entry_expanding_past_declared_size_is_rejected() {
        let compressed = zstd::encode_all(vec![0u8; 1 << 20].as_slice(), 3).unwrap();
        let data = pack_with_entry(16, &compressed);
        assert!(matches!(
            PackReader::index_pack(data),
            Err(PackError::DecompressionFailed(_))
        ));
    }

    #[test]
    fn oversized_declared_entry_is_rejected() {
        let compressed = zstd::encode_all(&b"tiny"[..], 3).unwrap();
        let data = pack_with_entry(MAX_ENTRY_SIZE + 1, &compressed);
        assert!(matches!(
            PackReader::index_pack(data),
            Err(PackError::CorruptEntry { .. })
        ));
    }

    #[test]
    fn entry_matching_declared_size_decodes() {
        let compressed = zstd::encode_all(&b"exact"[..], 3).unwrap();
        let reader = PackReader::index_pack(pack_with_entry(5, &compressed)).unwrap();
        let id = blob(b"exact").compute_id();
        assert_eq!(reader.read_object(&id).unwrap().unwrap().data, b"exact");
    }
}
