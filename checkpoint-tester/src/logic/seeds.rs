use anyhow::{Context, Result, bail};
use checkpoint_engine::derive_stream_seed;
use std::collections::HashSet;

const DEFAULT_SEED: u64 = 1337;
const PHRASE_DOMAIN: &[u8] = b"checkpoint.tester.seed";

/// A shift seed plus the CLI token it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub label: String,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            label: seed.to_string(),
        }
    }

    #[must_use]
    pub fn from_phrase(phrase: &str) -> Self {
        Self {
            seed: derive_stream_seed(phrase.as_bytes(), PHRASE_DOMAIN),
            label: phrase.to_string(),
        }
    }
}

/// Resolve CLI seed tokens into shift seeds.
///
/// Accepts decimal integers (negative values use their magnitude), `0x` hex
/// literals, and `@phrase` tokens which hash to a stable seed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut resolved = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let info = parse_seed_token(token)?;
        if seen.insert(info.seed) {
            resolved.push(info);
        }
    }

    if resolved.is_empty() {
        resolved.push(SeedInfo::from_numeric(DEFAULT_SEED));
    }
    Ok(resolved)
}

fn parse_seed_token(token: &str) -> Result<SeedInfo> {
    if let Some(phrase) = token.strip_prefix('@') {
        if phrase.is_empty() {
            bail!("Seed phrase after '@' is empty");
        }
        return Ok(SeedInfo::from_phrase(phrase));
    }
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        let seed = u64::from_str_radix(&hex.replace('_', ""), 16)
            .with_context(|| format!("Invalid hex seed: {token}"))?;
        return Ok(SeedInfo {
            seed,
            label: token.to_string(),
        });
    }
    if let Ok(value) = token.parse::<i64>() {
        return Ok(SeedInfo::from_numeric(value.unsigned_abs()));
    }
    if let Ok(value) = token.parse::<u64>() {
        return Ok(SeedInfo::from_numeric(value));
    }
    bail!("Unrecognized seed token: {token}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_numeric_hex_and_phrase() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xFF", "@night-shift"])).unwrap();
        assert_eq!(seeds[0].seed, 42);
        assert_eq!(seeds[1].seed, 7);
        assert_eq!(seeds[2].seed, 255);
        assert_eq!(seeds[3], SeedInfo::from_phrase("night-shift"));
        assert_eq!(seeds[3].label, "night-shift");
    }

    #[test]
    fn duplicates_collapse_and_empty_defaults() {
        let seeds = resolve_seed_inputs(&tokens(&["5", "0x5", "5"])).unwrap();
        assert_eq!(seeds.len(), 1);
        let fallback = resolve_seed_inputs(&[]).unwrap();
        assert_eq!(fallback, vec![SeedInfo::from_numeric(DEFAULT_SEED)]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(resolve_seed_inputs(&tokens(&["banana"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["@"])).is_err());
        assert!(resolve_seed_inputs(&tokens(&["0xZZ"])).is_err());
    }
}
