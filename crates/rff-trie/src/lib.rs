//! A trie mapping byte sequences to unique, sequential integer identifiers.
//!
//! [`Trie::hash`] returns the existing identifier when the sequence was seen
//! before and allocates the next identifier otherwise, so identifiers are
//! dense and ordered by first insertion. The empty sequence is always 0.
//!
//! The implementation is tuned for one thing: bounding allocations to
//! N + 2·log₂N for N distinct insertions. Three devices get it there:
//!
//! - **Flat arena.** Nodes are not structs; they are runs of cells inside a
//!   single `Vec<u32>`, addressed by the index of their first cell. Field
//!   accesses are `nodes[node_i + OFFSET]`. Dropping the arena drops the
//!   whole trie.
//! - **Compressed edges.** Each node carries a multi-byte label, stored as
//!   a `[start, end)` range into one of the dictionary values, so storing
//!   `ABC` and `ABD` takes three nodes (`AB`, `C`, `D`) rather than four.
//!   The first four label bytes are additionally packed little-endian into
//!   one cell (`first`) so the inner loop rarely touches the backing value.
//! - **Depth-scaled child tables.** Every node owns a child hash table of
//!   [`hash_size_at_len`] slots, keyed by the child's first byte modulo the
//!   size. Shallow, high-fanout levels get 256 slots for O(1) descent;
//!   deep levels shrink to a single slot and fall back to the sibling list.
//!
//! Two kinds of node address appear throughout: `node_i` is the arena index
//! of a node's first cell; `node_r` is the arena index of a *cell holding*
//! a `node_i` (a parent's child slot or a sibling link). Splicing a node in
//! or out is a single write through `node_r`.

/// Field offsets within a node's run of arena cells.
const FIRST: usize = 0;
const BUFFER: usize = 1;
const START: usize = 2;
const END: usize = 3;
const REFERENCE: usize = 4;
const NEXT_SIBLING: usize = 5;
const CHILDREN: usize = 6;

/// Child hash-table size for a node whose prefix has the given length.
///
/// Decreases exponentially, reaching 1 at length 7: short prefixes spend
/// memory to avoid sibling traversal, long prefixes trade lookups for
/// memory.
const fn hash_size_at_len(len: usize) -> usize {
    if len < 2 {
        256
    } else if len < 7 {
        256 >> (len - 2)
    } else {
        1
    }
}

/// Dictionary trie over byte sequences.
pub struct Trie {
    /// The node arena. Index 0 is the root (all-zero fields).
    nodes: Vec<u32>,
    /// Values indexed by their identifier; `values[0]` is empty.
    values: Vec<Vec<u8>>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    /// An empty dictionary containing only the empty sequence (id 0).
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![0; CHILDREN + hash_size_at_len(0)],
            values: vec![Vec::new()],
        }
    }

    /// The values registered so far, indexed by identifier.
    #[must_use]
    pub fn values(&self) -> &[Vec<u8>] {
        &self.values
    }

    /// The number of distinct sequences registered, counting the empty one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.len() == 1
    }

    /// Consume the trie, handing the value dictionary to the caller.
    #[must_use]
    pub fn into_values(self) -> Vec<Vec<u8>> {
        self.values
    }

    /// Return the unique identifier for `bytes`, registering it if new.
    ///
    /// `values()[id]` equals `bytes` afterwards. The slice is copied only
    /// when a fresh identifier is allocated; lookups of known sequences do
    /// not allocate.
    #[allow(clippy::missing_panics_doc)]
    pub fn hash(&mut self, bytes: &[u8]) -> u32 {
        if bytes.is_empty() {
            return 0;
        }

        // Cursor state over the current node's edge label. The initial
        // values match the root node's fields (all zero, never written),
        // so there is no point reading them from the arena.
        let mut b_start: usize = 0;
        let mut b_end: usize = 0;
        let mut b_pos: usize = 0;
        let mut b_first: u32 = 0;

        let mut node_i: usize = 0;
        let mut node_r: usize = 0;

        let mut i_pos: usize = 0;
        while i_pos < bytes.len() {
            let i_byte = u32::from(bytes[i_pos]);

            if b_pos == b_end {
                // At the end of this node's edge: descend into the child
                // starting with the next input byte.
                let hash_size = hash_size_at_len(i_pos);

                let mut child_r = node_i + CHILDREN + (i_byte as usize % hash_size);
                let mut child_i = self.nodes[child_r] as usize;

                // Walk the sibling list for the child with the right
                // initial byte.
                while child_i != 0 {
                    b_first = self.nodes[child_i + FIRST];
                    if b_first & 0xFF == i_byte {
                        break;
                    }
                    child_r = child_i + NEXT_SIBLING;
                    child_i = self.nodes[child_r] as usize;
                }

                if child_i == 0 {
                    // No child starts with this byte: the remaining input
                    // becomes a new leaf.
                    return self.add_new_child(child_r, bytes, i_pos);
                }

                node_i = child_i;
                node_r = child_r;
                b_start = self.nodes[node_i + START] as usize;
                b_end = self.nodes[node_i + END] as usize;

                // The sibling search already matched the first label byte.
                b_pos = b_start + 1;
                i_pos += 1;
                continue;
            }

            // Read the next label byte from the packed prefix when
            // possible, from the backing value otherwise.
            let b_offset = b_pos - b_start;
            let b_byte = if b_offset < 4 {
                (b_first >> (b_offset * 8)) & 0xFF
            } else {
                let buffer = self.nodes[node_i + BUFFER] as usize;
                u32::from(self.values[buffer][b_pos])
            };

            if b_byte == i_byte {
                b_pos += 1;
                i_pos += 1;
                continue;
            }

            // Mid-edge mismatch: split the edge here.
            return self.add_new_node(node_i, node_r, bytes, i_pos, b_pos);
        }

        // Input exhausted without structural conflict.

        if b_end > b_pos {
            // The input ends inside this node's edge: split and put the
            // new reference on the middle node.
            return self.add_new_end(node_i, node_r, bytes, b_pos);
        }

        let reference = self.nodes[node_i + REFERENCE];
        if reference == 0 {
            let fresh = self.add_new_reference(bytes);
            self.nodes[node_i + REFERENCE] = fresh;
            return fresh;
        }

        reference
    }

    /// The first up-to-four bytes of `bytes[pos..]` packed little-endian.
    fn get_first(bytes: &[u8], pos: usize) -> u32 {
        let mut result = u32::from(bytes[pos]);
        let mut i = 1;
        while i < 4 && pos + i < bytes.len() {
            result += u32::from(bytes[pos + i]) << (i * 8);
            i += 1;
        }
        result
    }

    /// Split the edge of `node_i` at `b_pos` because the input diverges at
    /// `i_pos`: insert a middle node covering the matched prefix, re-hang
    /// the old node under it, and add a leaf for the input tail.
    fn add_new_node(
        &mut self,
        node_i: usize,
        node_r: usize,
        bytes: &[u8],
        i_pos: usize,
        b_pos: usize,
    ) -> u32 {
        let buffer = self.nodes[node_i + BUFFER];
        let divergence = self.values[buffer as usize][b_pos];

        // Create the middle node covering the shared prefix.
        let mid_i = self.nodes.len();
        let mid_hash_size = hash_size_at_len(i_pos);

        let old_first = self.nodes[node_i + FIRST];
        let old_start = self.nodes[node_i + START];
        let old_sibling = self.nodes[node_i + NEXT_SIBLING];
        self.nodes.push(old_first);
        self.nodes.push(buffer);
        self.nodes.push(old_start);
        self.nodes.push(b_pos as u32);
        self.nodes.push(0); // reference
        self.nodes.push(old_sibling);
        self.nodes
            .resize(self.nodes.len() + mid_hash_size, 0); // children

        self.nodes[mid_i + CHILDREN + (usize::from(divergence) % mid_hash_size)] = node_i as u32;

        // Replace the old node with the middle node in its parent slot.
        self.nodes[node_r] = mid_i as u32;

        // The old node now covers only the unmatched edge suffix.
        let new_first = Self::get_first(&self.values[buffer as usize], b_pos);
        self.nodes[node_i + FIRST] = new_first;
        self.nodes[node_i + START] = b_pos as u32;
        self.nodes[node_i + NEXT_SIBLING] = 0;

        // Insert the leaf for the input tail under the middle node.
        let child_r = mid_i + CHILDREN + (usize::from(bytes[i_pos]) % mid_hash_size);
        self.add_new_child(child_r, bytes, i_pos)
    }

    /// Split the edge of `node_i` at `b_pos` because the input ended there:
    /// same surgery as [`add_new_node`] but the middle node carries the new
    /// reference instead of gaining a second child.
    fn add_new_end(&mut self, node_i: usize, node_r: usize, bytes: &[u8], b_pos: usize) -> u32 {
        let reference = self.add_new_reference(bytes);
        let mid_hash_size = hash_size_at_len(bytes.len());

        let buffer = self.nodes[node_i + BUFFER];
        let divergence = self.values[buffer as usize][b_pos];

        let mid_i = self.nodes.len();

        let old_first = self.nodes[node_i + FIRST];
        let old_start = self.nodes[node_i + START];
        let old_sibling = self.nodes[node_i + NEXT_SIBLING];
        self.nodes.push(old_first);
        self.nodes.push(buffer);
        self.nodes.push(old_start);
        self.nodes.push(b_pos as u32);
        self.nodes.push(reference);
        self.nodes.push(old_sibling);
        self.nodes
            .resize(self.nodes.len() + mid_hash_size, 0); // children

        self.nodes[mid_i + CHILDREN + (usize::from(divergence) % mid_hash_size)] = node_i as u32;

        self.nodes[node_r] = mid_i as u32;

        let new_first = Self::get_first(&self.values[buffer as usize], b_pos);
        self.nodes[node_i + FIRST] = new_first;
        self.nodes[node_i + START] = b_pos as u32;
        self.nodes[node_i + NEXT_SIBLING] = 0;

        reference
    }

    /// Allocate a leaf for `bytes[i_pos..]`, prepend it to the sibling list
    /// rooted at cell `child_r`, and return its fresh identifier.
    ///
    /// The leaf's label is backed by the value's own copy of the bytes, so
    /// no extra label storage is allocated.
    fn add_new_child(&mut self, child_r: usize, bytes: &[u8], i_pos: usize) -> u32 {
        let reference = self.add_new_reference(bytes);
        let hash_size = hash_size_at_len(bytes.len());

        let child_i = self.nodes.len();
        let next_sibling = self.nodes[child_r];

        self.nodes.push(Self::get_first(bytes, i_pos));
        self.nodes.push(reference); // buffer: the value doubles as label storage
        self.nodes.push(i_pos as u32);
        self.nodes.push(bytes.len() as u32);
        self.nodes.push(reference);
        self.nodes.push(next_sibling);
        self.nodes.resize(self.nodes.len() + hash_size, 0); // children

        self.nodes[child_r] = child_i as u32;

        reference
    }

    /// Copy `bytes` into a freshly owned value and return its identifier.
    ///
    /// The copy is what lets callers pass in slices of transient input
    /// buffers: once an identifier exists, its backing storage belongs to
    /// the dictionary.
    #[allow(clippy::cast_possible_truncation)]
    fn add_new_reference(&mut self, bytes: &[u8]) -> u32 {
        let reference = self.values.len() as u32;
        self.values.push(bytes.to_vec());
        reference
    }
}
