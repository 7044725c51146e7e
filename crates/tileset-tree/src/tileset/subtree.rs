//! Binary subtree files for implicit tilesets.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic "subt" | version u32 = 1 | jsonByteLength u64 | binaryByteLength u64
//! JSON chunk, padded with spaces to a multiple of 8 bytes
//! binary chunk: bitstreams, each starting on an 8-byte boundary, zero padded
//! ```
//!
//! Bits are indexed least significant bit first within each byte. Tile and
//! content bitstreams hold one bit per tile of the subtree, level by level,
//! Morton ordered within a level; the child-subtree bitstream holds one bit
//! per cell of the level just below the subtree.

use serde::{Deserialize, Serialize};

use crate::{Result, SubdivisionScheme, TileAddress, TilingError};

const MAGIC: &[u8; 4] = b"subt";
const VERSION: u32 = 1;
const HEADER_LEN: usize = 24;
const ALIGNMENT: usize = 8;

/// A fixed-length bit vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitstream {
    bytes: Vec<u8>,
    len: u64,
}

impl Bitstream {
    /// Creates an all-zero bitstream of `len` bits.
    pub fn new(len: u64) -> Self {
        Self {
            bytes: vec![0; len.div_ceil(8) as usize],
            len,
        }
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sets bit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub fn set(&mut self, index: u64) {
        assert!(index < self.len, "bit {index} out of range {}", self.len);
        self.bytes[(index / 8) as usize] |= 1 << (index % 8);
    }

    /// Reads bit `index`; out-of-range bits read as unset.
    pub fn get(&self, index: u64) -> bool {
        index < self.len && self.bytes[(index / 8) as usize] & (1 << (index % 8)) != 0
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> u64 {
        self.bytes.iter().map(|b| u64::from(b.count_ones())).sum()
    }

    /// `Some(value)` when every bit equals `value`.
    pub fn constant(&self) -> Option<bool> {
        match self.count_ones() {
            0 => Some(false),
            n if n == self.len => Some(true),
            _ => None,
        }
    }

    /// Backing bytes, with unused high bits of the last byte clear.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn from_bytes(bytes: &[u8], len: u64) -> Self {
        let mut stream = Self::new(len);
        let n = stream.bytes.len();
        stream.bytes.copy_from_slice(&bytes[..n]);
        if let (Some(last), tail @ 1..) = (stream.bytes.last_mut(), len % 8) {
            *last &= (1u8 << tail) - 1;
        }
        stream
    }

    fn filled(len: u64, value: bool) -> Self {
        let mut stream = Self::new(len);
        if value {
            for i in 0..len {
                stream.set(i);
            }
        }
        stream
    }
}

/// Availability of one subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtree {
    scheme: SubdivisionScheme,
    levels: u32,
    tiles: Bitstream,
    content: Bitstream,
    child_subtrees: Bitstream,
}

impl Subtree {
    /// Creates an empty subtree spanning `levels` levels.
    pub fn new(scheme: SubdivisionScheme, levels: u32) -> Self {
        let child_count = u64::from(scheme.branching()).pow(levels);
        Self {
            scheme,
            levels,
            tiles: Bitstream::new(scheme.tiles_in_levels(levels)),
            content: Bitstream::new(scheme.tiles_in_levels(levels)),
            child_subtrees: Bitstream::new(child_count),
        }
    }

    #[inline]
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Bit index of a tile given relative to the subtree root.
    pub fn tile_index(&self, relative: &TileAddress) -> u64 {
        self.scheme.tiles_in_levels(relative.level) + relative.morton_index(self.scheme)
    }

    /// Marks a tile (relative to the subtree root) as available.
    pub fn set_tile(&mut self, relative: &TileAddress) {
        let index = self.tile_index(relative);
        self.tiles.set(index);
    }

    /// Marks a tile (relative to the subtree root) as having content.
    pub fn set_content(&mut self, relative: &TileAddress) {
        let index = self.tile_index(relative);
        self.content.set(index);
    }

    /// Marks the child subtree rooted at `relative` (at relative level `levels`).
    pub fn set_child_subtree(&mut self, relative: &TileAddress) {
        debug_assert_eq!(relative.level, self.levels);
        self.child_subtrees.set(relative.morton_index(self.scheme));
    }

    pub fn is_tile_available(&self, relative: &TileAddress) -> bool {
        relative.level < self.levels && self.tiles.get(self.tile_index(relative))
    }

    pub fn is_content_available(&self, relative: &TileAddress) -> bool {
        relative.level < self.levels && self.content.get(self.tile_index(relative))
    }

    pub fn is_child_subtree_available(&self, relative: &TileAddress) -> bool {
        relative.level == self.levels && self.child_subtrees.get(relative.morton_index(self.scheme))
    }

    #[inline]
    pub fn tiles(&self) -> &Bitstream {
        &self.tiles
    }

    #[inline]
    pub fn content(&self) -> &Bitstream {
        &self.content
    }

    #[inline]
    pub fn child_subtrees(&self) -> &Bitstream {
        &self.child_subtrees
    }

    /// Encodes the subtree as a binary `.subtree` file.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut binary = Vec::new();
        let mut views = Vec::new();
        let mut describe = |stream: &Bitstream| match stream.constant() {
            Some(value) => AvailabilityJson::constant(value),
            None => {
                let offset = binary.len();
                binary.extend_from_slice(stream.as_bytes());
                pad(&mut binary, 0);
                views.push(BufferViewJson {
                    buffer: 0,
                    byte_offset: offset,
                    byte_length: stream.as_bytes().len(),
                });
                AvailabilityJson::bitstream(views.len() - 1, stream.count_ones())
            }
        };

        let tile_availability = describe(&self.tiles);
        let content_availability = vec![describe(&self.content)];
        let child_subtree_availability = describe(&self.child_subtrees);

        let buffers = if binary.is_empty() {
            Vec::new()
        } else {
            vec![BufferJson {
                byte_length: binary.len(),
            }]
        };
        let header = SubtreeJson {
            buffers,
            buffer_views: views,
            tile_availability,
            content_availability,
            child_subtree_availability,
        };

        let mut json = serde_json::to_vec(&header)?;
        pad(&mut json, b' ');

        let mut out = Vec::with_capacity(HEADER_LEN + json.len() + binary.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&(json.len() as u64).to_le_bytes());
        out.extend_from_slice(&(binary.len() as u64).to_le_bytes());
        out.extend_from_slice(&json);
        out.extend_from_slice(&binary);
        Ok(out)
    }

    /// Decodes a binary `.subtree` file.
    ///
    /// Only internal buffers are supported.
    pub fn from_bytes(bytes: &[u8], scheme: SubdivisionScheme, levels: u32) -> Result<Self> {
        let invalid = |msg: &str| TilingError::InvalidSubtree(msg.to_owned());

        if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
            return Err(invalid("missing subt header"));
        }
        let read_u64 = |at: usize| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[at..at + 8]);
            u64::from_le_bytes(raw) as usize
        };
        let json_len = read_u64(8);
        let binary_len = read_u64(16);
        let end = HEADER_LEN
            .checked_add(json_len)
            .and_then(|n| n.checked_add(binary_len))
            .ok_or_else(|| invalid("chunk lengths overflow"))?;
        if bytes.len() < end {
            return Err(invalid("truncated subtree"));
        }

        let json: SubtreeJson = serde_json::from_slice(&bytes[HEADER_LEN..HEADER_LEN + json_len])?;
        let binary = &bytes[HEADER_LEN + json_len..end];

        let mut subtree = Self::new(scheme, levels);
        let read = |avail: &AvailabilityJson, len: u64| -> Result<Bitstream> {
            match (avail.constant, avail.bitstream) {
                (Some(value), _) => Ok(Bitstream::filled(len, value != 0)),
                (None, Some(view)) => {
                    let view = json
                        .buffer_views
                        .get(view)
                        .ok_or_else(|| invalid("unknown buffer view"))?;
                    let end = view.byte_offset + view.byte_length;
                    if end > binary.len() || view.byte_length < len.div_ceil(8) as usize {
                        return Err(invalid("buffer view out of range"));
                    }
                    Ok(Bitstream::from_bytes(&binary[view.byte_offset..end], len))
                }
                (None, None) => Err(invalid("availability without bitstream or constant")),
            }
        };

        subtree.tiles = read(&json.tile_availability, subtree.tiles.len())?;
        let content = json
            .content_availability
            .first()
            .ok_or_else(|| invalid("missing content availability"))?;
        subtree.content = read(content, subtree.content.len())?;
        subtree.child_subtrees =
            read(&json.child_subtree_availability, subtree.child_subtrees.len())?;
        Ok(subtree)
    }
}

fn pad(buf: &mut Vec<u8>, fill: u8) {
    let padded = buf.len().next_multiple_of(ALIGNMENT);
    buf.resize(padded, fill);
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubtreeJson {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    buffers: Vec<BufferJson>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    buffer_views: Vec<BufferViewJson>,
    tile_availability: AvailabilityJson,
    content_availability: Vec<AvailabilityJson>,
    child_subtree_availability: AvailabilityJson,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferJson {
    byte_length: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewJson {
    buffer: usize,
    byte_offset: usize,
    byte_length: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bitstream: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    available_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    constant: Option<u8>,
}

impl AvailabilityJson {
    fn constant(value: bool) -> Self {
        Self {
            bitstream: None,
            available_count: None,
            constant: Some(u8::from(value)),
        }
    }

    fn bitstream(view: usize, available_count: u64) -> Self {
        Self {
            bitstream: Some(view),
            available_count: Some(available_count),
            constant: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitstream_is_lsb_first() {
        let mut bits = Bitstream::new(10);
        bits.set(0);
        bits.set(3);
        bits.set(9);
        assert_eq!(bits.as_bytes(), &[0b0000_1001, 0b0000_0010]);
        assert!(bits.get(3));
        assert!(!bits.get(4));
        assert!(!bits.get(100));
        assert_eq!(bits.count_ones(), 3);
        assert_eq!(bits.constant(), None);
    }

    #[test]
    fn constant_detection() {
        assert_eq!(Bitstream::new(5).constant(), Some(false));
        assert_eq!(Bitstream::filled(5, true).constant(), Some(true));
    }

    #[test]
    fn tile_index_follows_level_offsets() {
        let q = Subtree::new(SubdivisionScheme::Quadtree, 3);
        assert_eq!(q.tile_index(&TileAddress::ROOT), 0);
        assert_eq!(q.tile_index(&TileAddress::new(1, 0, 1)), 1 + 2);
        assert_eq!(q.tile_index(&TileAddress::new(2, 3, 3)), 5 + 15);
        assert_eq!(q.tiles().len(), 21);
        assert_eq!(q.child_subtrees().len(), 64);

        let o = Subtree::new(SubdivisionScheme::Octree, 2);
        assert_eq!(o.tile_index(&TileAddress::new_octree(1, 1, 1, 1)), 1 + 7);
        assert_eq!(o.tiles().len(), 9);
    }

    #[test]
    fn empty_subtree_is_all_constants() {
        let bytes = Subtree::new(SubdivisionScheme::Quadtree, 2).to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"subt");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 1);

        let json_len = u64::from_le_bytes(bytes[8..16].try_into().unwrap()) as usize;
        let binary_len = u64::from_le_bytes(bytes[16..24].try_into().unwrap());
        assert_eq!(binary_len, 0);
        assert_eq!(json_len % 8, 0);
        assert_eq!(bytes.len(), HEADER_LEN + json_len);

        let json: serde_json::Value =
            serde_json::from_slice(&bytes[HEADER_LEN..HEADER_LEN + json_len]).unwrap();
        assert_eq!(json["tileAvailability"], serde_json::json!({ "constant": 0 }));
        assert!(json.get("buffers").is_none());
    }

    #[test]
    fn bitstreams_are_aligned_and_round_trip() {
        let mut subtree = Subtree::new(SubdivisionScheme::Quadtree, 2);
        subtree.set_tile(&TileAddress::ROOT);
        subtree.set_tile(&TileAddress::new(1, 1, 0));
        subtree.set_content(&TileAddress::new(1, 1, 0));
        subtree.set_child_subtree(&TileAddress::new(2, 3, 0));

        let bytes = subtree.to_bytes().unwrap();
        let json_len = u64::from_le_bytes(bytes[8..16].try_into().unwrap()) as usize;
        let binary_len = u64::from_le_bytes(bytes[16..24].try_into().unwrap()) as usize;
        assert_eq!(json_len % 8, 0);
        // three bitstreams of 1, 1 and 2 bytes, each padded to 8
        assert_eq!(binary_len, 24);

        let binary = &bytes[HEADER_LEN + json_len..];
        // root is bit 0, (1, 1, 0) is bit 1 + 1
        assert_eq!(binary[0], 0b0000_0101);
        assert_eq!(binary[8], 0b0000_0100);
        // (2, 3, 0) has Morton index 0b0101
        assert_eq!(&binary[16..18], &[0b0010_0000, 0]);

        let decoded = Subtree::from_bytes(&bytes, SubdivisionScheme::Quadtree, 2).unwrap();
        assert_eq!(decoded, subtree);
        assert!(decoded.is_content_available(&TileAddress::new(1, 1, 0)));
        assert!(decoded.is_child_subtree_available(&TileAddress::new(2, 3, 0)));
    }

    #[test]
    fn bitstream_reads_its_prefix_of_a_padded_view() {
        // 10 bits occupy 2 bytes; bits past the end and the padding are dropped
        let stream = Bitstream::from_bytes(&[0b1000_0001, 0b1111_0010, 0xff, 0, 0, 0, 0, 0], 10);
        assert_eq!(stream.as_bytes(), &[0b1000_0001, 0b10]);
        assert!(stream.get(0) && stream.get(7) && stream.get(9));
        assert_eq!(stream.count_ones(), 3);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Subtree::from_bytes(b"nope", SubdivisionScheme::Quadtree, 1).is_err());
        let mut bytes = Subtree::new(SubdivisionScheme::Quadtree, 1).to_bytes().unwrap();
        bytes.truncate(30);
        assert!(Subtree::from_bytes(&bytes, SubdivisionScheme::Quadtree, 1).is_err());
    }
}
