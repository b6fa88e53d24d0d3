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
 * Test cases for the perfect-hash builder and its runtime companions: injectivity over the
 * input set, evaluator stability, the FNV1a fallback, and the lookup helpers.
 **************************************************************************************************/

extern crate mp_schema_rt;

use mp_schema_rt::hasher::{
    create_hash, descriptor_needs_length, eval_fnv1a, eval_hash, key_eq, search,
};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use std::collections::HashSet;

/// Evaluate `func` the way schema lookups do: pass the length only when the descriptor wants it.
fn hash_of(func: u32, s: &[u8]) -> u32 {
    let len = if descriptor_needs_length(func) { s.len() } else { 0 };
    eval_hash(func, s, len)
}

/// Assert that `func` separates every string in `strings`.
fn assert_injective(func: u32, strings: &[&[u8]]) {
    let mut seen = HashSet::new();
    for s in strings {
        let h = hash_of(func, s);
        assert!(
            seen.insert(h),
            "hash {:#010x} repeats under func {:#010x} for {:?}",
            h,
            func,
            String::from_utf8_lossy(s)
        );
    }
}

#[test]
fn separates_three_month_names() {
    println!("<======================= separates_three_month_names =======================>");
    let names: &[&[u8]] = &[b"March", b"May", b"June"];
    let func = create_hash(names, &[0xde, 0xad, 0xbe, 0xef]);
    assert_ne!(func, 0);
    assert_injective(func, names);
}

#[test]
fn separates_all_twelve_months() {
    println!("<======================= separates_all_twelve_months =======================>");
    let names: &[&[u8]] = &[
        b"January", b"February", b"March", b"April", b"May", b"June", b"July", b"August",
        b"September", b"October", b"November", b"December",
    ];
    let func = create_hash(names, &[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc]);
    assert_ne!(func, 0);
    assert_injective(func, names);
}

#[test]
fn separates_schema_field_names() {
    println!("<======================= separates_schema_field_names =======================>");
    let names: &[&[u8]] = &[
        b"id", b"uid", b"name", b"namespace", b"type", b"fields", b"items", b"values",
        b"default", b"aliases", b"doc", b"symbols", b"size", b"order",
    ];
    let func = create_hash(names, b"0123456789abcdef");
    assert_ne!(func, 0);
    assert_injective(func, names);
}

#[test]
fn upgrades_to_wide_family_when_sums_collide() {
    println!("<================== upgrades_to_wide_family_when_sums_collide ==================>");
    // Positions 0 and 1 distinguish the set, but the 8-bit sums of the samples collide
    // ('a'+'b' == 'b'+'a'), so the builder must hand out the packed family.
    let names: &[&[u8]] = &[b"ab", b"ba", b"aa"];
    let func = create_hash(names, &[0x55; 8]);
    assert_ne!(func, 0);
    assert_eq!(func >> 24, 0x0a);
    assert_injective(func, names);
}

#[test]
fn single_string_and_empty_set() {
    println!("<======================= single_string_and_empty_set =======================>");
    assert_eq!(create_hash(&[], &[0x10, 0x20, 0x30, 0x40]), 0);

    let func = create_hash(&[b"lonely"], &[0x10, 0x20, 0x30, 0x40]);
    assert_ne!(func, 0);
}

#[test]
fn evaluator_is_stable() {
    println!("<========================== evaluator_is_stable ==========================>");
    let names: &[&[u8]] = &[b"alpha", b"beta", b"gamma", b"delta"];
    let func = create_hash(names, &[0xaa, 0xbb, 0xcc, 0xdd]);
    assert_ne!(func, 0);
    for s in names {
        let first = hash_of(func, s);
        for _ in 0..10 {
            assert_eq!(hash_of(func, s), first);
        }
    }
}

#[test]
fn large_sets_fall_back_to_fnv1a() {
    println!("<======================== large_sets_fall_back_to_fnv1a ========================>");
    // 1001 distinct names skip column sampling entirely
    let owned: Vec<Vec<u8>> = (0..1001)
        .map(|i| format!("field_{:04}", i).into_bytes())
        .collect();
    let names: Vec<&[u8]> = owned.iter().map(|v| v.as_slice()).collect();

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let pool: Vec<u8> = (0..256).map(|_| rng.gen()).collect();

    let func = create_hash(&names, &pool);
    assert_ne!(func, 0);
    assert!(func >> 24 > 0xf, "expected an FNV1a descriptor, got {:#010x}", func);

    let mut seen = HashSet::new();
    for s in &names {
        assert!(seen.insert(hash_of(func, s)));
    }
}

#[test]
fn fallback_needs_four_random_bytes() {
    println!("<====================== fallback_needs_four_random_bytes ======================>");
    let owned: Vec<Vec<u8>> = (0..1001)
        .map(|i| format!("f{}", i).into_bytes())
        .collect();
    let names: Vec<&[u8]> = owned.iter().map(|v| v.as_slice()).collect();
    assert_eq!(create_hash(&names, &[0x12, 0x34, 0x56]), 0);
}

#[test]
fn random_string_sets_stay_injective() {
    println!("<====================== random_string_sets_stay_injective ======================>");
    let mut rng = StdRng::seed_from_u64(42);
    for round in 0..50 {
        let count = rng.gen_range(2..40);
        let mut set = HashSet::new();
        while set.len() < count {
            let len = rng.gen_range(1..12);
            let s: Vec<u8> = (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect();
            set.insert(s);
        }
        let owned: Vec<Vec<u8>> = set.into_iter().collect();
        let names: Vec<&[u8]> = owned.iter().map(|v| v.as_slice()).collect();

        let pool: Vec<u8> = (0..64).map(|_| rng.gen()).collect();
        let func = create_hash(&names, &pool);
        if func != 0 {
            assert_injective(func, &names);
        } else {
            // a build failure is allowed by contract, but with 64 random bytes it means the
            // pool had no usable window, which the seeds above do not produce
            panic!("round {}: build failed on {} strings", round, names.len());
        }
    }
}

#[test]
fn descriptor_length_mask() {
    println!("<========================= descriptor_length_mask =========================>");
    // pure position sampling families do not need the length
    assert!(!descriptor_needs_length(0x0100_0000));
    assert!(!descriptor_needs_length(0x0302_0100));
    assert!(!descriptor_needs_length(0x0901_0000));
    assert!(!descriptor_needs_length(0x0b02_0100));
    // anything folding in the length does
    assert!(descriptor_needs_length(0x0400_0000));
    assert!(descriptor_needs_length(0x0501_0000));
    assert!(descriptor_needs_length(0x0c00_0000));
    assert!(descriptor_needs_length(0x0f02_0100));
    // every FNV1a descriptor does
    assert!(descriptor_needs_length(0x1000_0001));
    assert!(descriptor_needs_length(0xdead_beef));
}

#[test]
fn fnv1a_reference_vectors() {
    println!("<========================= fnv1a_reference_vectors =========================>");
    // offset basis is the hash of the empty string
    assert_eq!(eval_fnv1a(0x811c_9dc5, b""), 0x811c_9dc5);
    // published FNV1a-32 test vectors
    assert_eq!(eval_fnv1a(0x811c_9dc5, b"a"), 0xe40c_292c);
    assert_eq!(eval_fnv1a(0x811c_9dc5, b"foobar"), 0xbf9c_f968);
}

#[test]
fn key_equality_helper() {
    println!("<========================== key_equality_helper ==========================>");
    assert!(key_eq(b"name", b"name"));
    assert!(!key_eq(b"name", b"names"));
    assert!(!key_eq(b"name", b"nams"));
    // empty keys never match, not even another empty string
    assert!(!key_eq(b"", b""));
    assert!(!key_eq(b"", b"x"));
}

#[test]
fn search_scans_to_the_fallback_slot() {
    println!("<====================== search_scans_to_the_fallback_slot ======================>");
    let tab: &[u32] = &[5, 7, 9, 0];
    assert_eq!(search(tab, 5), 0);
    assert_eq!(search(tab, 9), 2);
    // a missing key lands on the last element, the table's miss fallback
    assert_eq!(search(tab, 42), 3);

    let bytes: &[u8] = &[3, 1, 4, 1, 5];
    assert_eq!(search(bytes, 1), 1);
    assert_eq!(search(bytes, 99), 4);
}
