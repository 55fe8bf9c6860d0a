//! Asset records from rendered library cards.
//!
//! A card snapshot is the visible text of one asset tile, its image source
//! and any data-id attributes found inside it.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::capture::asset::AssetRecord;

static DIMENSIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{3,4})\s*x\s*(\d{3,4})").expect("dimension pattern"));

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12})").expect("uuid pattern")
});

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSnapshot {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub image_src: Option<String>,
    /// Values of `data-media-id`, `data-asset-id` or `data-id`, in document order.
    #[serde(default)]
    pub data_ids: Vec<String>,
}

/// Filename and dimensions from the card text.
fn label(text: &str) -> (String, u64, u64) {
    let Some(caps) = DIMENSIONS.captures(text) else {
        return (String::new(), 0, 0);
    };
    let width = caps[1].parse().unwrap_or(0);
    let height = caps[2].parse().unwrap_or(0);

    let start = caps.get(0).map_or(0, |m| m.start());
    let filename = text[..start]
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or_default();
    let filename = filename.strip_suffix("...").unwrap_or(filename);

    (filename.to_string(), width, height)
}

fn asset_id(card: &CardSnapshot) -> String {
    card.image_src
        .as_deref()
        .and_then(|src| UUID.captures(src))
        .map(|caps| caps[1].to_string())
        .or_else(|| card.data_ids.iter().rev().find(|id| !id.is_empty()).cloned())
        .unwrap_or_default()
}

/// Record for one card, `None` when it yields neither id nor filename.
pub fn scrape_card(card: &CardSnapshot) -> Option<AssetRecord> {
    let (filename, width, height) = label(&card.text);
    let asset_id = asset_id(card);
    if asset_id.is_empty() && filename.is_empty() {
        return None;
    }
    Some(AssetRecord {
        asset_id,
        filename,
        tags: Vec::new(),
        width,
        height,
    })
}

/// Records for every usable card, first occurrence kept per id (or per
/// filename when the card has no id).
pub fn scrape_cards(cards: &[CardSnapshot]) -> Vec<AssetRecord> {
    let mut seen = HashSet::new();
    cards
        .iter()
        .filter_map(scrape_card)
        .filter(|record| {
            let key = if record.asset_id.is_empty() {
                record.filename.clone()
            } else {
                record.asset_id.clone()
            };
            seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(text: &str, src: Option<&str>, ids: &[&str]) -> CardSnapshot {
        CardSnapshot {
            text: text.to_string(),
            image_src: src.map(str::to_string),
            data_ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_label_from_text() {
        let (name, w, h) = label("Select\n  kitchen-hero-banner...\n1464 x 600\nJPG");
        assert_eq!(name, "kitchen-hero-banner");
        assert_eq!((w, h), (1464, 600));

        assert_eq!(label("no size here"), (String::new(), 0, 0));
    }

    #[test]
    fn test_id_prefers_image_uuid() {
        let c = card(
            "logo.png\n300x300",
            Some("https://m.media-amazon.com/images/S/3F2504E0-4F89-11D3-9A0C-0305E82C3301.png"),
            &["data-1"],
        );
        assert_eq!(scrape_card(&c).unwrap().asset_id, "3F2504E0-4F89-11D3-9A0C-0305E82C3301");

        let c = card("logo.png\n300x300", Some("https://m.media-amazon.com/x.png"), &["first", "last"]);
        assert_eq!(scrape_card(&c).unwrap().asset_id, "last");
    }

    #[test]
    fn test_empty_card_skipped() {
        assert!(scrape_card(&card("Loading", None, &[])).is_none());
    }

    #[test]
    fn test_dedupe_by_id_then_filename() {
        let cards = vec![
            card("a.jpg\n970 x 300", None, &["id-1"]),
            card("a-copy.jpg\n970 x 300", None, &["id-1"]),
            card("b.jpg\n970 x 300", None, &[]),
            card("b.jpg\n1000 x 1000", None, &[]),
        ];
        let records = scrape_cards(&cards);
        let names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
        assert_eq!(records[1].width, 970);
    }
}
