use skiff_types::ObjectId;

/// Pack index for random-access lookups.
///
/// Mirrors the layout of git's pack index: a 256-slot fan-out table over
/// the first id byte, the sorted ids, and parallel CRC32 and offset arrays.
/// The index is built by the writer and rebuilt by the receiving side when
/// it indexes a pack; it never travels with the pack.
#[derive(Clone, Debug)]
pub struct PackIndex {
    pub fan_out: [u32; 256],
    pub object_ids: Vec<ObjectId>,
    pub crc32s: Vec<u32>,
    pub offsets: Vec<u64>,
    pub pack_checksum: [u8; 32],
}

impl PackIndex {
    /// Index `(id, crc32, offset)` triples for the pack whose trailer is
    /// `pack_checksum`.
    pub fn build(mut entries: Vec<(ObjectId, u32, u64)>, pack_checksum: [u8; 32]) -> Self {
        entries.sort_unstable_by_key(|&(id, _, _)| id);

        let mut fan_out = [0u32; 256];
        for (id, _, _) in &entries {
            fan_out[usize::from(id.as_bytes()[0])] += 1;
        }
        // Turn per-byte counts into cumulative counts.
        for i in 1..fan_out.len() {
            fan_out[i] += fan_out[i - 1];
        }

        let (object_ids, (crc32s, offsets)) = entries
            .into_iter()
            .map(|(id, crc, offset)| (id, (crc, offset)))
            .unzip();

        Self {
            fan_out,
            object_ids,
            crc32s,
            offsets,
            pack_checksum,
        }
    }

    /// Where `id` starts in the pack, and the crc of its compressed body.
    pub fn lookup(&self, id: &ObjectId) -> Option<(u64, u32)> {
        let first = usize::from(id.as_bytes()[0]);
        let lo = first.checked_sub(1).map_or(0, |prev| self.fan_out[prev] as usize);
        let hi = self.fan_out[first] as usize;

        let slot = lo + self.object_ids.get(lo..hi)?.binary_search(id).ok()?;
        Some((self.offsets[slot], self.crc32s[slot]))
    }

    pub fn object_count(&self) -> usize {
        self.object_ids.len()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.lookup(id).is_some()
    }
}
