//! # Rule Number Codec
//!
//! Converts between a rule number and its rule table. The rule number is
//! `Σ ruleset[i] * k^i`, so the table is simply the base-`k` digits of the
//! number, least significant first.
//!
//! ## Cost
//!
//! When `k` is a power of two every digit is a fixed bit field of the
//! number, and both directions are a single linear pass over its words.
//!
//! Otherwise digits are moved in chunks of `c` digits, where `k^c` is the
//! largest power of `k` that fits a `u64`:
//!
//! - encode: chunks are packed into `u64`s and combined pairwise, high half
//!   times `k^(c * 2^j)` plus low half. The multiplications are subquadratic.
//! - decode: one `div_rem` by `k^c` per chunk, each a single-word division
//!   over what is left of the number. This is quadratic in the number of
//!   words (about `(table_size / c)^2 / 2` word operations): around a second
//!   at a million entries, minutes near the default capacity ceiling.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::Zero;

use crate::error::{TaecaError, TaecaResult};
use crate::rule_info::RuleInfo;
use crate::ruleset::Ruleset;

/// Digits per chunk for base `k`, and `k^digits`
///
/// The largest `c` with `k^c <= u64::MAX`: 63 for k=2, 40 for k=3,
/// 24 for k=6.
pub fn chunk_digits(k: u32) -> (usize, u64) {
    let k = k as u64;
    let mut digits = 0;
    let mut base = 1u64;
    while let Some(next) = base.checked_mul(k) {
        base = next;
        digits += 1;
    }
    (digits, base)
}

/// Bits per digit when `k` is a power of two
fn digit_bits(k: u32) -> Option<usize> {
    k.is_power_of_two().then(|| k.trailing_zeros() as usize)
}

/// Rule number to rule table
///
/// Fails with `OutOfRange` if `rule_number >= k^table_size`.
pub fn decode(rule_number: &BigUint, info: RuleInfo) -> TaecaResult<Ruleset> {
    match digit_bits(info.k()) {
        Some(bits) => decode_bits(rule_number, info, bits),
        None => decode_chunked(rule_number, info),
    }
}

fn out_of_range(info: RuleInfo) -> TaecaError {
    TaecaError::OutOfRange {
        table_size: info.table_size(),
        k: info.k(),
    }
}

fn decode_bits(rule_number: &BigUint, info: RuleInfo, bits: usize) -> TaecaResult<Ruleset> {
    let table_size = info.table_size();
    if rule_number.bits() > (table_size * bits) as u64 {
        return Err(out_of_range(info));
    }

    let words: Vec<u64> = rule_number.iter_u64_digits().collect();
    let mask = (1u64 << bits) - 1;
    let mut symbols = vec![0u32; table_size];
    for (i, slot) in symbols.iter_mut().enumerate() {
        let pos = i * bits;
        let (word, shift) = (pos / 64, pos % 64);
        let Some(&low) = words.get(word) else {
            break;
        };
        let mut value = low >> shift;
        if shift + bits > 64 {
            if let Some(&high) = words.get(word + 1) {
                value |= high << (64 - shift);
            }
        }
        *slot = (value & mask) as u32;
    }
    Ok(Ruleset::from_raw(info, symbols))
}

fn decode_chunked(rule_number: &BigUint, info: RuleInfo) -> TaecaResult<Ruleset> {
    let k = info.k() as u64;
    let table_size = info.table_size();
    let (chunk, chunk_base) = chunk_digits(info.k());
    let full_divisor = BigUint::from(chunk_base);

    let mut symbols = vec![0u32; table_size];
    let mut remaining = rule_number.clone();
    let mut start = 0;

    // Once the remainder is zero every higher digit is zero too
    while start < table_size && !remaining.is_zero() {
        let len = chunk.min(table_size - start);
        let partial_divisor;
        let divisor = if len == chunk {
            &full_divisor
        } else {
            partial_divisor = BigUint::from(k.pow(len as u32));
            &partial_divisor
        };

        let (quotient, low) = remaining.div_rem(divisor);
        remaining = quotient;

        // low < k^len <= u64::MAX, so it is a single word
        let mut value = low.iter_u64_digits().next().unwrap_or(0);
        for slot in &mut symbols[start..start + len] {
            *slot = (value % k) as u32;
            value /= k;
        }
        start += len;
    }

    if !remaining.is_zero() {
        return Err(out_of_range(info));
    }

    Ok(Ruleset::from_raw(info, symbols))
}

/// Rule table to rule number
pub fn encode(ruleset: &Ruleset) -> BigUint {
    let k = ruleset.info().k();
    match digit_bits(k) {
        Some(bits) => encode_bits(ruleset.symbols(), bits),
        None => encode_chunked(ruleset.symbols(), k),
    }
}

fn encode_bits(symbols: &[u32], bits: usize) -> BigUint {
    let mut words = vec![0u64; (symbols.len() * bits + 63) / 64];
    for (i, &s) in symbols.iter().enumerate() {
        let pos = i * bits;
        let (word, shift) = (pos / 64, pos % 64);
        words[word] |= (s as u64) << shift;
        if shift + bits > 64 {
            words[word + 1] |= (s as u64) >> (64 - shift);
        }
    }
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    BigUint::from_bytes_le(&bytes)
}

fn encode_chunked(symbols: &[u32], k: u32) -> BigUint {
    let (chunk, chunk_base) = chunk_digits(k);
    let k = k as u64;

    // Level 0: one u64 per chunk, least significant first
    let mut level: Vec<BigUint> = symbols
        .chunks(chunk)
        .map(|digits| {
            BigUint::from(digits.iter().rev().fold(0u64, |acc, &d| acc * k + d as u64))
        })
        .collect();

    // Combine neighbours: the low one always spans a full 2^j chunks, so
    // its weight is k^(c * 2^j)
    let mut scale = BigUint::from(chunk_base);
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        let mut pairs = level.into_iter();
        while let Some(low) = pairs.next() {
            match pairs.next() {
                Some(high) => next.push(high * &scale + low),
                None => next.push(low),
            }
        }
        level = next;
        if level.len() > 1 {
            scale = &scale * &scale;
        }
    }
    level.pop().unwrap_or_default()
}

/// Check `rule_number < k^table_size` without decoding
pub fn check_range(rule_number: &BigUint, info: RuleInfo) -> TaecaResult<()> {
    let table_size = info.table_size();
    let limit_bits = table_size as f64 * (info.k() as f64).log2();
    let bits = rule_number.bits() as f64;

    // n < 2^bits, comfortably below k^table_size
    if bits + 1.0 < limit_bits {
        return Ok(());
    }
    let out_of_range = TaecaError::OutOfRange {
        table_size,
        k: info.k(),
    };
    // n >= 2^(bits-1), comfortably above
    if bits - 1.0 > limit_bits + 1.0 {
        return Err(out_of_range);
    }

    let limit = BigUint::from(info.k()).pow(table_size as u32);
    if *rule_number < limit {
        Ok(())
    } else {
        Err(out_of_range)
    }
}

/// Parse decimal text into a rule number
///
/// Surrounding whitespace is ignored. Signs, separators and other bases
/// are rejected.
pub fn parse_rule_number(text: &str) -> TaecaResult<BigUint> {
    let digits = text.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TaecaError::InvalidDigitLiteral(text.to_string()));
    }
    BigUint::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| TaecaError::InvalidDigitLiteral(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn info(r: u32, k: u32) -> RuleInfo {
        RuleInfo::new(r, k, u64::MAX).unwrap()
    }

    /// One big-integer step per digit, the slow way
    fn naive_value(digits: &[u32], k: u32) -> BigUint {
        digits
            .iter()
            .rev()
            .fold(BigUint::zero(), |acc, &d| acc * k + d)
    }

    #[test]
    fn test_chunk_digits() {
        assert_eq!(chunk_digits(2), (63, 1 << 63));
        assert_eq!(chunk_digits(3).0, 40);
        assert_eq!(chunk_digits(6).0, 24);
        assert_eq!(chunk_digits(16), (15, 1 << 60));
    }

    #[test]
    fn test_decode_small_rule() {
        // 6 = 0b0110, least significant digit first
        let rs = decode(&BigUint::from(6u32), info(1, 2)).unwrap();
        assert_eq!(rs.symbols(), &[0, 1, 1, 0]);
        assert_eq!(encode(&rs), BigUint::from(6u32));
    }

    #[test]
    fn test_decode_zero() {
        let rs = decode(&BigUint::zero(), info(2, 3)).unwrap();
        assert!(rs.symbols().iter().all(|&s| s == 0));
        assert!(encode(&rs).is_zero());
    }

    #[test]
    fn test_boundary_rejection() {
        let rule = info(1, 2);
        assert!(matches!(
            decode(&BigUint::from(16u32), rule),
            Err(TaecaError::OutOfRange { table_size: 4, k: 2 })
        ));
        let max = decode(&BigUint::from(15u32), rule).unwrap();
        assert_eq!(max.symbols(), &[1, 1, 1, 1]);
    }

    #[test]
    fn test_boundary_spanning_chunks() {
        // 81 digits of base 3: two full chunks of 40 plus one short chunk
        let rule = info(2, 3);
        let limit = BigUint::from(3u32).pow(81);

        assert!(decode(&limit, rule).is_err());
        assert!(check_range(&limit, rule).is_err());

        let max = limit.clone() - 1u32;
        let rs = decode(&max, rule).unwrap();
        assert!(rs.symbols().iter().all(|&s| s == 2));
        assert!(check_range(&max, rule).is_ok());
        assert_eq!(encode(&rs), max);
    }

    #[test]
    fn test_check_range_far_outside() {
        let rule = info(1, 2);
        let huge = BigUint::from(1u32) << 200usize;
        assert!(check_range(&huge, rule).is_err());
        assert!(check_range(&BigUint::from(3u32), rule).is_ok());
    }

    fn scrambled_digits(rule: RuleInfo) -> Vec<u32> {
        (0..rule.table_size() as u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 7) % rule.k())
            .collect()
    }

    fn assert_matches_naive(rule: RuleInfo) {
        let digits = scrambled_digits(rule);
        let expected = naive_value(&digits, rule.k());

        let rs = Ruleset::from_symbols(rule, digits.clone()).unwrap();
        assert_eq!(encode(&rs), expected, "encode r={} k={}", rule.r(), rule.k());
        assert_eq!(
            decode(&expected, rule).unwrap().symbols(),
            &digits[..],
            "decode r={} k={}",
            rule.r(),
            rule.k()
        );
    }

    #[test]
    fn test_large_table_matches_naive() {
        // 4096 two-bit fields, 32 per word
        assert_matches_naive(info(3, 4));
    }

    #[test]
    fn test_bit_fields_straddle_words() {
        // 3 bits per digit, so every 64-bit word boundary splits a digit
        assert_matches_naive(info(2, 8));
    }

    #[test]
    fn test_chunk_tree_with_odd_levels() {
        // 729 digits -> 19 chunks of up to 40 digits, paired over 5 levels
        assert_matches_naive(info(3, 3));
        // 15625 digits -> 652 chunks of 24
        assert_matches_naive(info(3, 5));
    }

    #[test]
    fn test_power_of_two_boundary() {
        // 16 base-4 digits = 32 bits
        let rule = info(2, 4);
        let limit = BigUint::from(1u64 << 32);
        assert!(matches!(
            decode(&limit, rule),
            Err(TaecaError::OutOfRange { table_size: 16, k: 4 })
        ));
        let max = decode(&(limit - 1u32), rule).unwrap();
        assert!(max.symbols().iter().all(|&s| s == 3));
    }

    #[test]
    fn test_parse_rule_number() {
        assert_eq!(parse_rule_number(" 30 ").unwrap(), BigUint::from(30u32));
        let long = "123456789012345678901234567890123456789";
        assert_eq!(parse_rule_number(long).unwrap().to_string(), long);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "   ", "-5", "+5", "12a", "1_000", "0x10", "3.5"] {
            assert!(
                matches!(parse_rule_number(bad), Err(TaecaError::InvalidDigitLiteral(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    fn rule_and_digits() -> impl Strategy<Value = (RuleInfo, Vec<u32>)> {
        (1u32..=2, 2u32..=5).prop_flat_map(|(r, k)| {
            let rule = info(r, k);
            (Just(rule), prop::collection::vec(0..k, rule.table_size()))
        })
    }

    proptest! {
        #[test]
        fn test_roundtrip_law((rule, digits) in rule_and_digits()) {
            let n = naive_value(&digits, rule.k());
            let rs = decode(&n, rule).unwrap();
            prop_assert_eq!(rs.symbols(), &digits[..]);
            prop_assert_eq!(encode(&rs), n.clone());
            prop_assert!(check_range(&n, rule).is_ok());
        }
    }
}
