use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::Path;

/// First track seed when none are given.
pub const DEFAULT_SEED_START: u32 = 0x90D5_0001;

/// Decimal or `0x`-prefixed hex.
pub fn parse_seed(raw: &str) -> Result<u32> {
    let s = raw.trim();
    if s.is_empty() {
        bail!("empty seed");
    }
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed: {s}")),
        None => s
            .parse::<u32>()
            .with_context(|| format!("invalid decimal seed: {s}")),
    }
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

pub fn parse_seed_csv(input: &str) -> Result<Vec<u32>> {
    let seeds = input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(parse_seed)
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        bail!("no seeds parsed from --seeds");
    }
    Ok(seeds)
}

/// One seed per line; blank lines and `#` comments are skipped.
pub fn parse_seed_file(path: &Path) -> Result<Vec<u32>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading seed file {}", path.display()))?;
    let seeds = data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(parse_seed)
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        return Err(anyhow!("seed file {} had no seeds", path.display()));
    }
    Ok(seeds)
}

/// `count` seeds walking an LCG from `start`.
pub fn seed_sequence(start: u32, count: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(count as usize);
    let mut cur = start;
    for _ in 0..count {
        out.push(cur);
        cur = cur.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
    }
    out
}

/// Seed file wins over a CSV list, which wins over a generated sequence.
pub fn resolve_seeds(
    seeds: Option<&str>,
    seed_file: Option<&Path>,
    seed_start: Option<&str>,
    seed_count: u32,
) -> Result<Vec<u32>> {
    if let Some(path) = seed_file {
        return parse_seed_file(path);
    }
    if let Some(csv) = seeds {
        return parse_seed_csv(csv);
    }
    let start = match seed_start {
        Some(start) => parse_seed(start)?,
        None => DEFAULT_SEED_START,
    };
    if seed_count == 0 {
        bail!("--seed-count must be >= 1");
    }
    Ok(seed_sequence(start, seed_count))
}

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut c = i as u32;
        let mut j = 0;
        while j < 8 {
            c = if (c & 1) != 0 {
                0xEDB8_8320u32 ^ (c >> 1)
            } else {
                c >> 1
            };
            j += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// IEEE CRC-32, used for config fingerprints.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for byte in data {
        let idx = ((crc ^ (*byte as u32)) & 0xFF) as usize;
        crc = CRC_TABLE[idx] ^ (crc >> 8);
    }
    crc ^ 0xFFFF_FFFFu32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_parse_in_both_bases() {
        assert_eq!(parse_seed("42").expect("decimal"), 42);
        assert_eq!(parse_seed(" 0xdeadBEEF ").expect("hex"), 0xDEAD_BEEF);
        assert!(parse_seed("").is_err());
        assert!(parse_seed("0xZZ").is_err());
        assert_eq!(parse_seed_csv("1, 0x2,,3").expect("csv"), vec![1, 2, 3]);
        assert!(parse_seed_csv(" , ").is_err());
    }

    #[test]
    fn seed_sequence_is_deterministic() {
        let a = resolve_seeds(None, None, Some("7"), 4).expect("seeds");
        assert_eq!(a.len(), 4);
        assert_eq!(a[0], 7);
        assert_eq!(a, seed_sequence(7, 4));
        assert!(resolve_seeds(None, None, None, 0).is_err());
    }

    #[test]
    fn crc32_matches_reference_vector() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }
}
