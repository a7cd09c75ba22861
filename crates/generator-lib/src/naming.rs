//! Name, identifier and label generation
//!
//! Names are hyphen-joined dictionary words with an optional static prefix
//! and suffix. Uniqueness is enforced through a `NameRegistry` pool.

use crate::registry::{NamePool, NameRegistry};
use rand::seq::SliceRandom;
use rand::Rng;

/// Dictionary used for every generated name and free-form label
pub const WORDS: &[&str] = &[
    "amber", "anchor", "apex", "arbor", "atlas", "aurora", "basil", "beacon", "birch", "blaze",
    "bramble", "breeze", "brook", "canyon", "cedar", "cinder", "citrus", "clover", "cobalt",
    "comet", "coral", "crane", "crest", "cypress", "dawn", "delta", "dune", "ember", "falcon",
    "fern", "fjord", "flint", "forge", "frost", "garnet", "glade", "granite", "grove", "harbor",
    "hazel", "heron", "hollow", "indigo", "iris", "ivory", "jasper", "juniper", "kestrel",
    "lagoon", "larch", "lichen", "linden", "lotus", "lumen", "magnet", "maple", "marble", "meadow",
    "mesa", "mist", "nectar", "nimbus", "north", "oasis", "onyx", "orbit", "osprey", "pebble",
    "pepper", "pine", "pixel", "plume", "prairie", "quartz", "quill", "raven", "reef", "ridge",
    "river", "saffron", "sage", "sequoia", "shale", "sierra", "slate", "sonnet", "sparrow",
    "spruce", "summit", "tango", "thistle", "tide", "timber", "topaz", "tundra", "umber",
    "valley", "vapor", "velvet", "willow", "zephyr", "zinc",
];

/// Label keys that always draw their value from a small fixed vocabulary
const SEEDED_LABELS: &[(&str, &[&str])] = &[
    ("environment", &["dev", "ci", "qa", "stage", "prod"]),
    ("app", &["web", "db", "cache", "queue", "api"]),
    ("organization", &["engineering", "sales", "finance", "marketing"]),
    ("market", &["emea", "apac", "na", "latam"]),
    ("version", &["alpha", "beta", "ga", "lts"]),
];

/// Number of freshly generated label keys mixed with the seeded ones
const RANDOM_LABEL_KEYS: usize = 3;

/// Collisions tolerated at one word count before the name grows a word
const ATTEMPTS_PER_LENGTH: u32 = 32;

/// Shape of a generated name
#[derive(Debug, Clone, Copy)]
pub struct NameTemplate<'a> {
    pub prefix: Option<&'a str>,
    pub suffix: Option<&'a str>,
    pub words: usize,
}

impl<'a> NameTemplate<'a> {
    pub const fn words(words: usize) -> Self {
        Self {
            prefix: None,
            suffix: None,
            words,
        }
    }

    pub const fn with_prefix(mut self, prefix: &'a str) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub const fn with_suffix(mut self, suffix: &'a str) -> Self {
        self.suffix = Some(suffix);
        self
    }
}

pub fn random_word<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    WORDS.choose(rng).copied().unwrap_or("word")
}

/// Join `words` dictionary words with the template's prefix and suffix
pub fn generate_name<R: Rng + ?Sized>(rng: &mut R, template: NameTemplate<'_>, words: usize) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(words + 2);
    parts.extend(template.prefix);
    parts.extend((0..words).map(|_| random_word(rng)));
    parts.extend(template.suffix);
    parts.join("-")
}

/// Generate a name not yet present in `pool`. Each run of collisions at one
/// length lengthens the name by a word so the search always terminates.
pub fn unique_name<R: Rng + ?Sized>(
    rng: &mut R,
    registry: &mut NameRegistry,
    pool: NamePool,
    template: NameTemplate<'_>,
) -> String {
    let base = template.words.max(1);
    registry.claim_unique(pool, |attempt| {
        let words = base + (attempt / ATTEMPTS_PER_LENGTH) as usize;
        generate_name(rng, template, words)
    })
}

/// Generate a 12-digit cloud account id unique within the account pool
pub fn unique_account_id<R: Rng + ?Sized>(rng: &mut R, registry: &mut NameRegistry) -> String {
    registry.claim_unique(NamePool::Accounts, |_| {
        format!("{:012}", rng.gen_range(100_000_000_000u64..=999_999_999_999))
    })
}

/// Build a pipe-delimited `label_<key>:<value>` string with between one and
/// `max_labels` distinct keys. Returns an empty string when `max_labels` is 0.
pub fn generate_labels<R: Rng + ?Sized>(rng: &mut R, max_labels: u32) -> String {
    if max_labels == 0 {
        return String::new();
    }

    let mut keys: Vec<&str> = SEEDED_LABELS.iter().map(|(key, _)| *key).collect();
    while keys.len() < SEEDED_LABELS.len() + RANDOM_LABEL_KEYS {
        let word = random_word(rng);
        if !keys.contains(&word) {
            keys.push(word);
        }
    }
    keys.shuffle(rng);

    let count = rng.gen_range(1..=max_labels as usize).min(keys.len());
    keys[..count]
        .iter()
        .map(|key| {
            let value = SEEDED_LABELS
                .iter()
                .find(|(seeded, _)| seeded == key)
                .and_then(|(_, values)| values.choose(rng).copied())
                .unwrap_or_else(|| random_word(rng));
            format!("label_{key}:{value}")
        })
        .collect::<Vec<_>>()
        .join("|")
}
