use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

const ONE_STROKE: &str = r#"{"strokes": ["M 100 400 L 900 400 L 900 500 L 100 500 Z"], "medians": [[[100, 450], [900, 450]]]}"#;

struct Counting {
    calls: Arc<AtomicUsize>,
}

impl GlyphTier for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn fetch(&mut self, _character: &str) -> anyhow::Result<GlyphRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(serde_json::from_str(ONE_STROKE)?)
    }
}

struct AlwaysMiss;

impl GlyphTier for AlwaysMiss {
    fn name(&self) -> &str {
        "miss"
    }

    fn fetch(&mut self, character: &str) -> anyhow::Result<GlyphRecord> {
        anyhow::bail!("no record for {character}")
    }
}

#[test]
fn cache_returns_same_arc_and_skips_tiers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut source = GlyphDataSource::new().with_tier(Counting {
        calls: Arc::clone(&calls),
    });

    let a = source.fetch_glyph("一").unwrap();
    let b = source.fetch_glyph(" 一 ").unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(source.contains("一"));
    assert_eq!(source.len(), 1);
}

#[test]
fn falls_through_tiers_in_order() {
    let mut bundle = BundledTier::new();
    bundle.insert("二", serde_json::from_str(ONE_STROKE).unwrap());
    let calls = Arc::new(AtomicUsize::new(0));
    let mut source = GlyphDataSource::new()
        .with_tier(AlwaysMiss)
        .with_tier(bundle)
        .with_tier(Counting {
            calls: Arc::clone(&calls),
        });

    source.fetch_glyph("二").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    source.fetch_glyph("三").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn last_tier_reason_is_reported() {
    let mut source = GlyphDataSource::new().with_tier(AlwaysMiss);
    match source.fetch_glyph("龘") {
        Err(StudioError::GlyphNotFound { character, reason }) => {
            assert_eq!(character, "龘");
            assert!(reason.contains("miss"), "{reason}");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(source.is_empty());
}

#[test]
fn normalizes_to_nfc_and_rejects_multi_char_input() {
    // U+212B ANGSTROM SIGN normalizes to U+00C5
    assert_eq!(normalize_character("\u{212B}").unwrap(), "\u{00C5}");
    assert_eq!(normalize_character("𠀋").unwrap(), "𠀋");
    assert!(normalize_character("").is_err());
    assert!(normalize_character("中文").is_err());
}

#[test]
fn static_dir_tier_reads_char_json() {
    let dir = std::env::temp_dir().join(format!("hanzi-studio-static-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("四.json"), ONE_STROKE).unwrap();

    let mut source = GlyphDataSource::new().with_tier(StaticDirTier::new(&dir));
    assert_eq!(source.fetch_glyph("四").unwrap().stroke_count(), 1);
    assert!(source.fetch_glyph("五").is_err());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn static_dir_tier_rejects_path_separators() {
    let dir = std::env::temp_dir().join(format!("hanzi-studio-sep-{}", std::process::id()));
    let mut source = GlyphDataSource::new().with_tier(StaticDirTier::new(&dir));
    for ch in ["/", "\\"] {
        match source.fetch_glyph(ch) {
            Err(StudioError::GlyphNotFound { reason, .. }) => {
                assert!(reason.contains("path separator"), "{reason}");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}

#[test]
fn bundle_json_keys_are_normalized() {
    let json = format!("{{\"\u{212B}\": {ONE_STROKE}}}");
    let bundle = BundledTier::from_json_str(&json).unwrap();
    assert_eq!(bundle.len(), 1);
    let mut source = GlyphDataSource::new().with_tier(bundle);
    assert!(source.fetch_glyph("\u{00C5}").is_ok());
}

#[cfg(feature = "remote")]
#[test]
fn remote_url_is_percent_encoded() {
    let tier = RemoteTier::new("https://example.invalid/data/", std::time::Duration::from_secs(1));
    assert_eq!(
        tier.url_for("佛"),
        "https://example.invalid/data/%E4%BD%9B.json"
    );
}

#[test]
fn parse_character_input_dedups_and_caps() {
    assert_eq!(
        parse_character_input("你 好,你\n好吗", MAX_INPUT_CHARACTERS),
        vec!["你", "好", ",", "吗"]
    );
    let many: String = (0..50).map(|i| char::from_u32(0x4E00 + i).unwrap()).collect();
    assert_eq!(parse_character_input(&many, MAX_INPUT_CHARACTERS).len(), 32);
}
