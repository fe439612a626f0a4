//! # Country Keys
//!
//! Turns free-text country names into canonical join keys.
//!
//! - Normalization: NFD decomposition, combining marks dropped, everything
//!   except ASCII letters/digits dropped, lower-cased.
//! - Aliases: exact-match overrides for names that the tabular dataset and
//!   the world atlas spell differently (e.g. "Korea, Rep." vs "South Korea").
//! - `key(name) = alias(normalize(name))` is the only join key in the crate;
//!   every join (ratio index, ranking, render plan) goes through it.
//!
//! The alias table is fixed once built. Extending it means editing the
//! built-in seed or the alias file read at startup.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Canonical join key. Only lower-case ASCII letters and digits; may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CountryKey(String);

impl CountryKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CountryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a raw name: strip accents, punctuation and whitespace, lower-case.
///
/// "Côte d'Ivoire" and "Cote dIvoire" both become `cotedivoire`.
pub fn normalize(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Static override map: normalized key → canonical key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

static BUILTIN: Lazy<AliasTable> = Lazy::new(AliasTable::default_seed);

/// Canonical key using the built-in alias seed only.
///
/// A configured alias file does not reach this function. Joins inside the
/// service go through `DataBundle::key`, which uses the bundle's own table;
/// use that (or [`AliasTable::key`]) whenever custom aliases may be loaded.
pub fn key(name: &str) -> CountryKey {
    BUILTIN.key(name)
}

impl AliasTable {
    /// Build from `(name, canonical)` pairs. Both sides are normalized, so
    /// display spellings ("United States") can be used directly.
    pub fn from_pairs<I, A, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        let mut aliases = HashMap::new();
        for (a, c) in pairs {
            let from = normalize(a.as_ref());
            let to = normalize(c.as_ref());
            if from.is_empty() || from == to {
                continue;
            }
            aliases.insert(from, to);
        }
        Self { aliases }
    }

    /// Built-in aliases covering the World Bank ↔ Natural Earth mismatches
    /// seen in the labour-force dataset.
    pub fn default_seed() -> Self {
        Self::from_pairs([
            ("unitedstates", "unitedstatesofamerica"),
            ("ivorycoast", "cotedivoire"),
            ("czechia", "czechrepublic"),
            ("russianfederation", "russia"),
            ("egyptarabrep", "egypt"),
            ("iranislamicrep", "iran"),
            ("korearep", "southkorea"),
            ("koreadempeoplesrep", "northkorea"),
            ("venezuelarb", "venezuela"),
            ("yemenrep", "yemen"),
            ("syrianarabrepublic", "syria"),
            ("laopdr", "laos"),
            ("kyrgyzrepublic", "kyrgyzstan"),
            ("slovakrepublic", "slovakia"),
            ("congodemrep", "demrepcongo"),
            ("congorep", "congo"),
            ("gambiathe", "gambia"),
            ("bahamasthe", "bahamas"),
            ("turkiye", "turkey"),
            ("bruneidarussalam", "brunei"),
            ("westbankandgaza", "palestine"),
            ("northmacedonia", "macedonia"),
            ("centralafricanrep", "centralafricanrepublic"),
            ("bosniaandherz", "bosniaandherzegovina"),
            ("dominicanrep", "dominicanrepublic"),
            ("eqguinea", "equatorialguinea"),
            ("ssudan", "southsudan"),
            ("solomonis", "solomonislands"),
        ])
    }

    /// Load an alias file. Supports a JSON object (`{"name": "canonical"}`)
    /// or TOML with an `[aliases]` table.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading aliases from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::parse(&content, &ext)
    }

    fn parse(s: &str, hint_ext: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct TomlAliases {
            aliases: HashMap<String, String>,
        }

        if hint_ext == "toml" {
            let v: TomlAliases = toml::from_str(s).context("parsing alias toml")?;
            return Ok(Self::from_pairs(v.aliases));
        }
        if let Ok(v) = serde_json::from_str::<HashMap<String, String>>(s) {
            return Ok(Self::from_pairs(v));
        }
        if let Ok(v) = toml::from_str::<TomlAliases>(s) {
            return Ok(Self::from_pairs(v.aliases));
        }
        Err(anyhow!("unsupported alias file format"))
    }

    /// Exact-match lookup; unknown keys pass through unchanged.
    pub fn resolve(&self, normalized: String) -> String {
        match self.aliases.get(&normalized) {
            Some(canon) => canon.clone(),
            None => normalized,
        }
    }

    pub fn key(&self, name: &str) -> CountryKey {
        CountryKey(self.resolve(normalize(name)))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
