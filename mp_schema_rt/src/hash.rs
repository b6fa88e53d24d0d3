/***************************************************************************************************
 * Copyright (c) 2023-2024 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all copies or
 * substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * mp_schema_rt perfect hash functions
 *
 * Builds a collision-free hash over a static set of field-name strings so the schema layer can
 * route map keys in constant time without string comparisons. The builder greedily samples
 * character columns (and optionally the length), refining collision domains until every string
 * is distinguished; string sets it cannot crack within four samples fall back to FNV1a seeded
 * from a caller-supplied random pool. The resulting function is a compact 32-bit descriptor
 * evaluated by [`eval_hash`].
 *
 * Descriptor encoding, by family byte (bits 24..31):
 *
 * - `0x00`                 build failure
 * - `0x01..=0x03`          sum of 1..3 sampled characters; low 24 bits are the positions
 * - `0x04..=0x07`          as above plus the string length in the sum
 * - `0x09..=0x0f`          same samples packed as bitfields for a wider, collision-safer result
 * - `> 0x0f`               FNV1a of a 4-byte big-endian prefix (the descriptor itself), then
 *                          the string
 **************************************************************************************************/

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// FNV1a-32 offset basis.
const FNV1A_OFFSET_BASIS: u32 = 0x811c_9dc5;
/// FNV1a-32 prime.
const FNV1A_PRIME: u32 = 0x0100_0193;

/// Descriptor bit set when the string length takes part in the hash.
const USE_LENGTH_BIT: u32 = 0x0400_0000;
/// Descriptor bit selecting the packed wide-result families over the 8-bit-sum ones.
const WIDE_FAMILY_BIT: u32 = 0x0800_0000;
/// Families with any of these bits set need the true string length at evaluation time.
const NEEDS_LENGTH_MASK: u32 = 0xf400_0000;

/// Marks the last element of a collision domain in the builder's index list.
const DOMAIN_END_BIT: u32 = 0x8000_0000;
const IDX_MASK: u32 = 0x7fff_ffff;

/// Above this set size column sampling stops paying for itself (and the generation counter
/// could wrap); go straight to the FNV1a fallback.
const MAX_GREEDY_STRINGS: usize = 1000;

/// Build a 32-bit descriptor of a hash function that is collision-free over `strings`.
///
/// `random` seeds the FNV1a fallback; at least 4 bytes are needed for the fallback to have any
/// candidates. Returns 0 when no collision-free function was found (or the set is empty).
///
/// The sampled-position families index characters at fixed positions, all strictly below the
/// shortest string's length, so the descriptor stays valid for exactly the given set.
#[cfg_attr(feature = "trace", trace)]
pub fn create_hash(strings: &[&[u8]], random: &[u8]) -> u32 {
    let n = strings.len();
    if n == 0 {
        return 0;
    }
    if n > MAX_GREEDY_STRINGS {
        return create_fnv(strings, random);
    }

    let mut use_len = false;
    let mut sample_pos: [i32; 4] = [256; 4];
    let mut sample_count = 0usize;
    // candidate positions must stay below the shortest length met so far
    let mut max_len: i32 = 256;

    // The active strings, partitioned into collision domains; the last element of each domain
    // carries DOMAIN_END_BIT. Initially one domain holding everything.
    let mut indices: Vec<u32> = (0..n as u32).collect();
    indices[n - 1] |= DOMAIN_END_BIT;
    let mut scratch: Vec<u32> = vec![0; n];
    let mut probes = [0u32; 128];
    let mut n_active = n;

    loop {
        // Score every candidate position (and the length, while unselected) by the number of
        // intra-domain clashes it leaves. Entries of `probes` are stamped with a generation
        // that advances at each domain boundary, so domains never clash with each other.
        for p in probes.iter_mut() {
            *p = 0;
        }
        let mut gen: u32 = 1;
        let mut collisions_min = n_active + 1;
        let mut best_pos: i32 = 0;
        let first = if use_len { 0 } else { -1 };

        'positions: for pos in first..max_len {
            let mut collisions = 0usize;
            for &idx in indices[..n_active].iter() {
                let s = strings[(idx & IDX_MASK) as usize];
                let probe = if pos == -1 {
                    0x7f & s.len()
                } else if pos as usize == s.len() {
                    // this column runs off some string; no further column is usable
                    max_len = pos;
                    break 'positions;
                } else {
                    (s[pos as usize] & 0x7f) as usize
                };
                if probes[probe] == gen {
                    collisions += 1;
                } else {
                    probes[probe] = gen;
                }
                gen += idx >> 31;
            }
            if collisions < collisions_min {
                collisions_min = collisions;
                best_pos = pos;
            }
        }

        if best_pos == -1 {
            use_len = true;
        } else {
            sample_pos[sample_count] = best_pos;
            sample_count += 1;
        }

        if collisions_min == 0 && sample_count <= 3 {
            return encode_descriptor(strings, &mut sample_pos, sample_count, use_len);
        }
        if sample_count == 4 {
            // too many samples, yet no (encodable) solution
            return create_fnv(strings, random);
        }

        n_active = split_domains(strings, &mut indices, &mut scratch, &mut probes, n_active, best_pos);
        std::mem::swap(&mut indices, &mut scratch);
    }
}

/// Pack the chosen samples into a descriptor, preferring the 8-bit-sum family and upgrading to
/// the wide family when the sums still clash on the verification table.
fn encode_descriptor(
    strings: &[&[u8]],
    sample_pos: &mut [i32; 4],
    sample_count: usize,
    use_len: bool,
) -> u32 {
    sample_pos[..3].sort_unstable();

    let mut func = (sample_count as u32) << 24
        | ((sample_pos[0] as u32) & 255) << 16
        | ((sample_pos[1] as u32) & 255) << 8
        | (sample_pos[2] as u32) & 255;
    if use_len {
        func |= USE_LENGTH_BIT;
    }
    // check if we can get away with the simple func
    if collisions_found(func, strings) {
        func |= WIDE_FAMILY_BIT;
    }
    func
}

/// Split every collision domain by the character at `best_pos` (or by length), dropping the
/// domains that end up with a single member: those strings are already distinguished. Returns
/// the new number of active strings; the new partition is written to `scratch`.
///
/// `probes` serves first as per-domain class counters, then as descending output cursors; the
/// touched entries are zeroed again before the next domain, tracked by a bitmap over probe
/// value pairs.
fn split_domains(
    strings: &[&[u8]],
    indices: &mut Vec<u32>,
    scratch: &mut Vec<u32>,
    probes: &mut [u32; 128],
    n_active: usize,
    best_pos: i32,
) -> usize {
    for p in probes.iter_mut() {
        *p = 0;
    }
    let mut o = 0usize;
    let mut i = 0usize;
    while i < n_active {
        // count the classes of one domain; first-seen members become the ends of the new
        // (reverse-filled) domains
        let mut map: u64 = 0;
        let mut j = i;
        loop {
            let idx = indices[j];
            let probe = classify(strings[(idx & IDX_MASK) as usize], best_pos);
            map |= 1u64 << (probe / 2);
            probes[probe] += 1;
            if idx & DOMAIN_END_BIT != 0 {
                if probes[probe] != 1 {
                    indices[j] = idx & IDX_MASK;
                }
                break;
            }
            if probes[probe] == 1 {
                indices[j] = DOMAIN_END_BIT | idx;
            }
            j += 1;
        }
        let end = j + 1;

        // assign output ranges for the new domains; singletons park on a scratch slot past the
        // surviving strings and are dropped
        let mut map_copy = map;
        while map_copy != 0 {
            let pos = 2 * map_copy.trailing_zeros() as usize;
            for probe in pos..pos + 2 {
                probes[probe] = if probes[probe] > 1 {
                    o += probes[probe] as usize;
                    o as u32
                } else {
                    n_active as u32
                };
            }
            map_copy &= map_copy - 1;
        }

        // place members in reverse order
        for j in i..end {
            let idx = indices[j];
            let probe = classify(strings[(idx & IDX_MASK) as usize], best_pos);
            probes[probe] -= 1;
            scratch[probes[probe] as usize] = idx;
        }
        i = end;

        // zero out the entries we touched
        while map != 0 {
            let pos = 2 * map.trailing_zeros() as usize;
            probes[pos] = 0;
            probes[pos + 1] = 0;
            map &= map - 1;
        }
    }
    o
}

/// The splitting classifier: length (7 bits) for the length pseudo-position, otherwise the
/// character at `pos`. Reaching the end of a string classifies as NUL.
#[inline]
fn classify(s: &[u8], pos: i32) -> usize {
    if pos == -1 {
        0x7f & s.len()
    } else {
        match s.get(pos as usize) {
            Some(&c) => (c & 0x7f) as usize,
            None => 0,
        }
    }
}

/// FNV1a fallback: slide a 4-byte window over the random pool and take the first big-endian
/// value that lands in the FNV family (top byte above 0x0f) and hashes the set without
/// collisions. Returns 0 when the pool is exhausted.
fn create_fnv(strings: &[&[u8]], random: &[u8]) -> u32 {
    if random.len() < 4 {
        return 0;
    }
    for window in random.windows(4) {
        let v = u32::from_be_bytes([window[0], window[1], window[2], window[3]]);
        if v >> 24 > 0xf && !collisions_found(v, strings) {
            return v;
        }
    }
    0
}

/// Evaluate a descriptor against a string.
///
/// `len` must be the true string length whenever [`descriptor_needs_length`] holds for `func`;
/// it may be 0 otherwise. Sampled positions at or beyond the end of the string read as NUL.
#[cfg_attr(feature = "trace", trace)]
pub fn eval_hash(func: u32, s: &[u8], len: usize) -> u32 {
    let family = func >> 24;
    if family > 0xf {
        let prefix = func.to_be_bytes();
        let seed = eval_fnv1a(FNV1A_OFFSET_BASIS, &prefix);
        return eval_fnv1a(seed, &s[..len]);
    }

    let a = at(s, func >> 16 & 0xff);
    let b = at(s, func >> 8 & 0xff);
    let c = at(s, func & 0xff);
    let len = len as u32;

    match family {
        0x1 => a,
        0x2 => a + b,
        0x3 => a + b + c,
        0x4 => len,
        0x5 => len.wrapping_add(a),
        0x6 => len.wrapping_add(a + b),
        0x7 => len.wrapping_add(a + b + c),
        0x9 => a,
        0xa => a << 8 | b,
        0xb => a << 16 | b << 8 | c,
        0xc => len,
        0xd => len << 8 | a,
        0xe => len << 16 | a << 8 | b,
        0xf => len << 24 | a << 16 | b << 8 | c,
        _ => 0,
    }
}

#[inline]
fn at(s: &[u8], pos: u32) -> u32 {
    match s.get(pos as usize) {
        Some(&c) => c as u32,
        None => 0,
    }
}

/// FNV1a-32 over `bytes`, continuing from `seed`.
#[inline]
pub fn eval_fnv1a(seed: u32, bytes: &[u8]) -> u32 {
    let mut res = seed;
    for &b in bytes {
        res = (res ^ b as u32).wrapping_mul(FNV1A_PRIME);
    }
    res
}

/// Whether [`eval_hash`] needs the true string length for this descriptor. Factored out so
/// callers computing lengths lazily can test it in isolation.
#[inline]
pub fn descriptor_needs_length(func: u32) -> bool {
    func & NEEDS_LENGTH_MASK != 0
}

/// Compare a candidate key against the string a hash hit selected. False when the lengths
/// differ or the key is empty; empty keys never match anything.
#[inline]
pub fn key_eq(key: &[u8], s: &[u8]) -> bool {
    !key.is_empty() && key.len() == s.len() && key == s
}

/// Linear probe of a hash-driven lookup table: index of the first element equal to `k`, or of
/// the last element when nothing matches. The last element is the table's miss fallback, so
/// `tab` must not be empty.
pub fn search<T: PartialEq>(tab: &[T], k: T) -> usize {
    let last = tab.len().saturating_sub(1);
    let mut i = 0;
    while i != last && tab[i] != k {
        i += 1;
    }
    i
}

/// Probe the descriptor over the whole set with an open-addressed table of the next power of
/// two above `n` buckets. The probe sequence is the classic dict recurrence
/// `j = 5j + 1 + perturb; perturb >>= 5`; a collision is a previously occupied bucket on the
/// chain holding an equal hash.
fn collisions_found(func: u32, strings: &[&[u8]]) -> bool {
    let n = strings.len();
    if n < 2 {
        return false;
    }

    // bucket_count = 2 ** k, important for the index mask
    let mut bucket_count = 1usize;
    while bucket_count <= n {
        bucket_count *= 2;
    }

    let mut buckets = vec![0u32; bucket_count];
    let mut bitmap = vec![0u64; (bucket_count + 63) / 64];

    for s in strings {
        let len = if descriptor_needs_length(func) { s.len() } else { 0 };
        let hash = eval_hash(func, s, len);

        let mut j: u32 = 0;
        let mut perturb = hash;
        loop {
            j = j.wrapping_mul(5).wrapping_add(1).wrapping_add(perturb);
            perturb >>= 5;

            let index = j as usize & (bucket_count - 1);
            let mask = 1u64 << (index & 63);
            if bitmap[index / 64] & mask != 0 {
                // bucket used; maybe a collision
                if buckets[index] == hash {
                    return true;
                }
            } else {
                bitmap[index / 64] |= mask;
                buckets[index] = hash;
                break;
            }
        }
    }
    false
}
