//! Canonical Huffman code construction: frequency table to code lengths,
//! code lengths to canonical codewords, and the decoder built from those
//! same lengths.
//!
//! Two implementations handed the same `freq[256]` (or the same
//! `len[256]`) must produce bit-identical results on any platform. That
//! determinism comes from two rules: ties in the priority queue break on
//! the minimum leaf symbol in the subtree, and canonical codewords are
//! assigned in ascending `(length, symbol)` order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Codes longer than this are not supported by the decoder; lengths are
/// clipped and rebalanced (see [`limit_code_lengths`]) before this is ever
/// reached in practice.
pub const MAX_CODE_LEN: u8 = 32;

/// Per-symbol code lengths, the persisted form of a code table. Index `s`
/// is the length of symbol `s`'s code, or `0` if `s` does not appear in the
/// chunk.
pub type CodeLengths = [u8; 256];

/// A canonical Huffman codeword: its bit pattern and bit length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuffmanCode {
    pub codeword: u32,
    pub length: u8,
}

/// Per-symbol codewords, `None` where the symbol has no code.
pub type CodeTable = [Option<HuffmanCode>; 256];

enum Node {
    Leaf(u8),
    Internal(Box<Node>, Box<Node>),
}

struct HeapItem {
    freq: u64,
    min_symbol: u16,
    node: Node,
}

impl PartialEq for HeapItem {
    fn eq(&self, other: &Self) -> bool {
        self.freq == other.freq && self.min_symbol == other.min_symbol
    }
}
impl Eq for HeapItem {}

impl PartialOrd for HeapItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.freq
            .cmp(&other.freq)
            .then(self.min_symbol.cmp(&other.min_symbol))
    }
}

fn build_tree(freq: &[u64; 256]) -> Option<Node> {
    let mut heap = BinaryHeap::new();
    for (sym, &f) in freq.iter().enumerate() {
        if f > 0 {
            heap.push(Reverse(HeapItem {
                freq: f,
                min_symbol: sym as u16,
                node: Node::Leaf(sym as u8),
            }));
        }
    }

    if heap.is_empty() {
        return None;
    }

    while heap.len() > 1 {
        let Reverse(a) = heap.pop().unwrap();
        let Reverse(b) = heap.pop().unwrap();
        heap.push(Reverse(HeapItem {
            freq: a.freq + b.freq,
            min_symbol: a.min_symbol.min(b.min_symbol),
            node: Node::Internal(Box::new(a.node), Box::new(b.node)),
        }));
    }

    Some(heap.pop().unwrap().0.node)
}

fn walk_depths(node: &Node, depth: u8, lens: &mut CodeLengths) {
    match node {
        Node::Leaf(sym) => lens[*sym as usize] = depth,
        Node::Internal(l, r) => {
            walk_depths(l, depth + 1, lens);
            walk_depths(r, depth + 1, lens);
        }
    }
}

/// Builds per-symbol code lengths from a frequency table.
///
/// Zero non-zero symbols (an empty chunk) yields all-zero lengths. Exactly
/// one non-zero symbol yields length 1 for it, so a single bit decodes it.
/// Otherwise an optimal prefix code is built by a deterministic
/// priority-queue construction and length-limited to [`MAX_CODE_LEN`] if
/// needed.
///
/// # Examples
///
/// ```
/// use dczf_core::histogram::histogram;
/// use dczf_core::huffman::build_code_lengths;
/// let freq = histogram(b"ABRACADABRA");
/// let lens = build_code_lengths(&freq);
/// assert!(lens[b'A' as usize] > 0);
/// assert_eq!(lens[b'Z' as usize], 0);
/// ```
pub fn build_code_lengths(freq: &[u64; 256]) -> CodeLengths {
    let nonzero = freq.iter().filter(|&&f| f > 0).count();
    let mut lens = [0u8; 256];

    if nonzero == 0 {
        return lens;
    }
    if nonzero == 1 {
        let sym = freq.iter().position(|&f| f > 0).unwrap();
        lens[sym] = 1;
        return lens;
    }

    let tree = build_tree(freq).expect("nonzero count was checked above");
    walk_depths(&tree, 0, &mut lens);

    if lens.iter().any(|&l| l > MAX_CODE_LEN) {
        limit_code_lengths(&mut lens, MAX_CODE_LEN);
    }

    lens
}

/// Clips any length exceeding `max_len` and rebalances the length
/// histogram so the Kraft inequality holds again, by repeatedly
/// decrementing an overlong code's count and compensating with two codes
/// one bit shorter — the standard overflow-fix pass.
fn limit_code_lengths(lens: &mut CodeLengths, max_len: u8) {
    let max_len = max_len as usize;
    let observed_max = *lens.iter().max().unwrap_or(&0) as usize;
    if observed_max <= max_len {
        return;
    }

    let mut bl_count = vec![0u32; observed_max + 1];
    for &l in lens.iter() {
        if l > 0 {
            bl_count[l as usize] += 1;
        }
    }

    let mut overflow: i64 = 0;
    for bits in (max_len + 1)..bl_count.len() {
        overflow += bl_count[bits] as i64;
        bl_count[bits] = 0;
    }
    bl_count[max_len] += overflow as u32;

    while overflow > 0 {
        let mut bits = max_len - 1;
        while bits > 0 && bl_count[bits] == 0 {
            bits -= 1;
        }
        debug_assert!(bits > 0, "no shorter code available to rebalance against");
        bl_count[bits] -= 1;
        bl_count[bits + 1] += 2;
        bl_count[max_len] -= 1;
        overflow -= 1;
    }

    // Re-assign: symbols with the longest original codes get the longest
    // rebalanced codes. Ties break on ascending symbol for determinism.
    let mut order: Vec<usize> = (0..256).filter(|&s| lens[s] > 0).collect();
    order.sort_by(|&a, &b| lens[b].cmp(&lens[a]).then(a.cmp(&b)));

    let mut idx = 0;
    for bits in (1..=max_len).rev() {
        for _ in 0..bl_count[bits] {
            lens[order[idx]] = bits as u8;
            idx += 1;
        }
    }
    debug_assert_eq!(idx, order.len());
}

/// Decodes canonical Huffman codes built from a [`CodeLengths`] table.
///
/// For each length `L`, the first codeword at that length and how many
/// codes exist there are recorded, alongside the sorted-by-`(length,
/// symbol)` symbol list; decoding an `L`-bit value checks whether it falls
/// within `[first_code_at_L, first_code_at_L + count_at_L)`.
pub struct CanonicalDecoder {
    max_length: u8,
    first_code: Vec<u32>,
    first_index: Vec<usize>,
    count: Vec<u32>,
    symbols_sorted: Vec<u8>,
}

impl CanonicalDecoder {
    pub fn max_length(&self) -> u8 {
        self.max_length
    }

    /// Attempts to decode an `length`-bit `code`. Returns `None` if no
    /// symbol has a matching `(codeword, length)` pair, meaning the caller
    /// should accumulate more bits (if `length < max_length()`) or declare
    /// the stream corrupt.
    pub fn decode(&self, code: u32, length: u8) -> Option<u8> {
        let length = length as usize;
        if length == 0 || length >= self.first_code.len() {
            return None;
        }
        let count = self.count[length];
        if count == 0 {
            return None;
        }
        let first_code = self.first_code[length];
        if code < first_code {
            return None;
        }
        let offset = code - first_code;
        if offset >= count {
            return None;
        }
        Some(self.symbols_sorted[self.first_index[length] + offset as usize])
    }
}

/// Builds both the per-symbol codeword table (used by the encoder) and the
/// decoder from the same `code_lengths`, in a single canonical-order pass,
/// so the two can never drift out of sync with each other.
///
/// # Examples
///
/// ```
/// use dczf_core::huffman::{build_code_lengths, build_codes_and_decoder};
/// use dczf_core::histogram::histogram;
/// let freq = histogram(b"ABRACADABRA");
/// let lens = build_code_lengths(&freq);
/// let (codes, decoder) = build_codes_and_decoder(&lens);
/// let a = codes[b'A' as usize].unwrap();
/// assert_eq!(decoder.decode(a.codeword, a.length), Some(b'A'));
/// ```
pub fn build_codes_and_decoder(lens: &CodeLengths) -> (CodeTable, CanonicalDecoder) {
    let mut entries: Vec<(u8, u8)> = (0u16..256)
        .filter_map(|s| {
            let l = lens[s as usize];
            if l > 0 { Some((s as u8, l)) } else { None }
        })
        .collect();
    entries.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    let max_length = entries.last().map(|&(_, l)| l).unwrap_or(0);
    let table_len = max_length as usize + 1;
    let mut first_code = vec![0u32; table_len];
    let mut first_index = vec![0usize; table_len];
    let mut count = vec![0u32; table_len];
    let mut symbols_sorted = Vec::with_capacity(entries.len());
    let mut codes: CodeTable = std::array::from_fn(|_| None);

    let mut code: u32 = 0;
    let mut prev_len: u8 = 0;
    for (i, &(sym, len)) in entries.iter().enumerate() {
        code <<= len - prev_len;
        if count[len as usize] == 0 {
            first_code[len as usize] = code;
            first_index[len as usize] = i;
        }
        codes[sym as usize] = Some(HuffmanCode { codeword: code, length: len });
        symbols_sorted.push(sym);
        count[len as usize] += 1;
        code += 1;
        prev_len = len;
    }

    (
        codes,
        CanonicalDecoder {
            max_length,
            first_code,
            first_index,
            count,
            symbols_sorted,
        },
    )
}

/// Checks the Kraft inequality `sum(2^-len) <= 1` over non-zero lengths.
/// Returns `(sum_numerator, sum_denominator)` as `2^max_len`-scaled
/// integers so callers can compare exactly without floating point.
pub fn kraft_sum_scaled(lens: &CodeLengths) -> (u64, u64) {
    let max_len = *lens.iter().max().unwrap_or(&0);
    if max_len == 0 {
        return (0, 1);
    }
    let denom = 1u64 << max_len;
    let numerator: u64 = lens
        .iter()
        .filter(|&&l| l > 0)
        .map(|&l| denom >> l)
        .sum();
    (numerator, denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::histogram;

    #[test]
    fn empty_chunk_has_all_zero_lengths() {
        let freq = [0u64; 256];
        assert_eq!(build_code_lengths(&freq), [0u8; 256]);
    }

    #[test]
    fn single_symbol_gets_length_one() {
        let mut freq = [0u64; 256];
        freq[b'A' as usize] = 42;
        let lens = build_code_lengths(&freq);
        assert_eq!(lens[b'A' as usize], 1);
        assert_eq!(lens.iter().filter(|&&l| l > 0).count(), 1);
    }

    #[test]
    fn kraft_inequality_holds_for_real_distribution() {
        let freq = histogram(b"ABRACADABRA");
        let lens = build_code_lengths(&freq);
        let (num, denom) = kraft_sum_scaled(&lens);
        assert!(num <= denom);
    }

    #[test]
    fn canonical_assignment_is_deterministic() {
        let freq = histogram(b"the quick brown fox jumps over the lazy dog");
        let lens = build_code_lengths(&freq);
        let (codes_a, _) = build_codes_and_decoder(&lens);
        let (codes_b, _) = build_codes_and_decoder(&lens);
        assert_eq!(codes_a, codes_b);
    }

    #[test]
    fn encode_then_decode_round_trips_every_symbol() {
        let freq = histogram(b"ABRACADABRA");
        let lens = build_code_lengths(&freq);
        let (codes, decoder) = build_codes_and_decoder(&lens);
        for sym in b"ABRACADABRA" {
            let code = codes[*sym as usize].unwrap();
            assert_eq!(decoder.decode(code.codeword, code.length), Some(*sym));
        }
    }

    #[test]
    fn length_limiting_preserves_kraft_equality() {
        // A skewed distribution (roughly Fibonacci-weighted) that would
        // naturally produce a tree deeper than MAX_CODE_LEN.
        let mut freq = [0u64; 256];
        let (mut a, mut b) = (1u64, 1u64);
        for sym in 0..120usize {
            freq[sym] = a;
            let next = a + b;
            a = b;
            b = next;
        }
        let lens = build_code_lengths(&freq);
        assert!(lens.iter().all(|&l| l <= MAX_CODE_LEN));
        let (num, denom) = kraft_sum_scaled(&lens);
        assert!(num <= denom);
    }
}
