use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use unicode_normalization::UnicodeNormalization;

use crate::assets::glyph::{GlyphData, GlyphRecord};
use crate::config::GlyphSourceConfig;
use crate::foundation::error::{StudioError, StudioResult};

/// Default cap on characters accepted from free-text input.
pub const MAX_INPUT_CHARACTERS: usize = 32;

/// One lookup location for glyph records.
///
/// Tiers are tried in order; an `Err` means "not here" and the next tier is consulted.
pub trait GlyphTier: Send {
    fn name(&self) -> &str;

    fn fetch(&mut self, character: &str) -> anyhow::Result<GlyphRecord>;
}

/// In-memory map of records, usually loaded from a `{ "<char>": record }` JSON file.
#[derive(Default)]
pub struct BundledTier {
    records: HashMap<String, GlyphRecord>,
}

impl BundledTier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(s: &str) -> StudioResult<Self> {
        let raw: HashMap<String, GlyphRecord> = serde_json::from_str(s)
            .map_err(|e| StudioError::serde(format!("glyph bundle parse failed: {e}")))?;
        let records = raw.into_iter().map(|(k, v)| (nfc(&k), v)).collect();
        Ok(Self { records })
    }

    pub fn from_json_path(path: &Path) -> StudioResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read glyph bundle {}", path.display()))?;
        Self::from_json_str(&s)
    }

    pub fn insert(&mut self, character: &str, record: GlyphRecord) {
        self.records.insert(nfc(character), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl GlyphTier for BundledTier {
    fn name(&self) -> &str {
        "bundle"
    }

    fn fetch(&mut self, character: &str) -> anyhow::Result<GlyphRecord> {
        self.records
            .get(character)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("not in bundle"))
    }
}

/// `<dir>/<char>.json` files.
pub struct StaticDirTier {
    dir: PathBuf,
}

impl StaticDirTier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl GlyphTier for StaticDirTier {
    fn name(&self) -> &str {
        "static-dir"
    }

    fn fetch(&mut self, character: &str) -> anyhow::Result<GlyphRecord> {
        if character.contains(['/', '\\']) {
            anyhow::bail!("path separator in {character:?}");
        }
        let path = self.dir.join(format!("{character}.json"));
        let bytes = std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))
    }
}

/// HTTP lookup of `<base_url>/<percent-encoded char>.json`.
#[cfg(feature = "remote")]
pub struct RemoteTier {
    base_url: String,
    agent: ureq::Agent,
}

#[cfg(feature = "remote")]
impl RemoteTier {
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { base_url, agent }
    }

    pub fn url_for(&self, character: &str) -> String {
        let encoded =
            percent_encoding::utf8_percent_encode(character, percent_encoding::NON_ALPHANUMERIC);
        format!("{}/{}.json", self.base_url, encoded)
    }
}

#[cfg(feature = "remote")]
impl GlyphTier for RemoteTier {
    fn name(&self) -> &str {
        "remote"
    }

    fn fetch(&mut self, character: &str) -> anyhow::Result<GlyphRecord> {
        let url = self.url_for(character);
        let resp = self
            .agent
            .get(&url)
            .call()
            .with_context(|| format!("GET {url}"))?;
        let record = serde_json::from_reader(resp.into_reader())
            .with_context(|| format!("parse glyph json from {url}"))?;
        Ok(record)
    }
}

/// Tiered, cached glyph lookup.
///
/// The cache is keyed by the NFC form of the character and is never evicted; repeated fetches
/// return the same `Arc`.
#[derive(Default)]
pub struct GlyphDataSource {
    cache: HashMap<String, Arc<GlyphData>>,
    tiers: Vec<Box<dyn GlyphTier>>,
}

impl GlyphDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds bundle, static-dir and remote tiers (in that order) from configuration.
    pub fn from_config(cfg: &GlyphSourceConfig) -> StudioResult<Self> {
        let mut source = Self::new();
        if let Some(path) = &cfg.bundle_path {
            source.push_tier(BundledTier::from_json_path(path)?);
        }
        if let Some(dir) = &cfg.static_dir {
            source.push_tier(StaticDirTier::new(dir));
        }
        #[cfg(feature = "remote")]
        if let Some(url) = &cfg.remote_base_url {
            source.push_tier(RemoteTier::new(
                url.clone(),
                std::time::Duration::from_millis(cfg.remote_timeout_ms),
            ));
        }
        #[cfg(not(feature = "remote"))]
        if cfg.remote_base_url.is_some() {
            tracing::warn!("remote glyph lookup configured but the `remote` feature is disabled");
        }
        Ok(source)
    }

    pub fn with_tier(mut self, tier: impl GlyphTier + 'static) -> Self {
        self.push_tier(tier);
        self
    }

    pub fn push_tier(&mut self, tier: impl GlyphTier + 'static) {
        self.tiers.push(Box::new(tier));
    }

    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn fetch_glyph(&mut self, character: &str) -> StudioResult<Arc<GlyphData>> {
        let key = normalize_character(character)?;
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Arc::clone(hit));
        }

        let mut last_reason = String::from("no glyph sources configured");
        for tier in &mut self.tiers {
            match tier.fetch(&key) {
                Ok(record) => match GlyphData::from_record(key.clone(), &record) {
                    Ok(glyph) => {
                        tracing::debug!(tier = tier.name(), character = %key, "glyph resolved");
                        let glyph = Arc::new(glyph);
                        self.cache.insert(key, Arc::clone(&glyph));
                        return Ok(glyph);
                    }
                    Err(e) => {
                        tracing::debug!(tier = tier.name(), character = %key, error = %e, "glyph record rejected");
                        last_reason = format!("{}: {e}", tier.name());
                    }
                },
                Err(e) => {
                    tracing::debug!(tier = tier.name(), character = %key, error = %e, "glyph tier miss");
                    last_reason = format!("{}: {e:#}", tier.name());
                }
            }
        }

        Err(StudioError::glyph_not_found(key, last_reason))
    }

    /// Seeds the cache directly, bypassing tiers.
    pub fn insert(&mut self, glyph: GlyphData) -> Arc<GlyphData> {
        let key = nfc(&glyph.character);
        let glyph = Arc::new(glyph);
        self.cache.insert(key, Arc::clone(&glyph));
        glyph
    }

    pub fn contains(&self, character: &str) -> bool {
        self.cache.contains_key(&nfc(character.trim()))
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn nfc(s: &str) -> String {
    s.nfc().collect()
}

/// Trims and NFC-normalizes `input`, requiring exactly one codepoint.
pub fn normalize_character(input: &str) -> StudioResult<String> {
    let key = nfc(input.trim());
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(_), None) => Ok(key),
        (None, _) => Err(StudioError::glyph_not_found(input, "empty input")),
        _ => Err(StudioError::glyph_not_found(
            input,
            "expected exactly one character",
        )),
    }
}

/// Unique non-whitespace characters of `text` in first-seen order, at most `limit`.
pub fn parse_character_input(text: &str, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for ch in nfc(text).chars() {
        if out.len() >= limit {
            break;
        }
        if ch.is_whitespace() || ch.is_control() {
            continue;
        }
        let s = ch.to_string();
        if !out.contains(&s) {
            out.push(s);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
