// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Collection catalogue and per-collection field rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::fields::{
    keep_optional_text, set_bilingual, set_bilingual_title, set_images, set_key,
    set_positive_int, set_text,
};
use super::{CollectionCodec, MergeDiscipline};

/// Every independently stored collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    News,
    Impact,
    Team,
    Magazines,
    Samples,
    Requests,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 6] = [
        CollectionKind::News,
        CollectionKind::Impact,
        CollectionKind::Team,
        CollectionKind::Magazines,
        CollectionKind::Samples,
        CollectionKind::Requests,
    ];

    /// Path segment and configuration name.
    pub fn name(self) -> &'static str {
        match self {
            CollectionKind::News => "news",
            CollectionKind::Impact => "impact",
            CollectionKind::Team => "team",
            CollectionKind::Magazines => "magazines",
            CollectionKind::Samples => "samples",
            CollectionKind::Requests => "requests",
        }
    }

    /// Prefix for synthesized identifiers (`{prefix}-{index}`).
    pub fn id_prefix(self) -> &'static str {
        match self {
            CollectionKind::News => "news",
            CollectionKind::Impact => "impact",
            CollectionKind::Team => "member",
            CollectionKind::Magazines => "magazine",
            CollectionKind::Samples => "sample",
            CollectionKind::Requests => "request",
        }
    }

    /// Field written by the encoder and expected in PUT bodies.
    pub fn canonical_field(self) -> &'static str {
        match self {
            CollectionKind::Team => "members",
            _ => "items",
        }
    }

    /// Named wrapper fields accepted on read, after `items`.
    pub fn wrapper_fields(self) -> &'static [&'static str] {
        match self {
            CollectionKind::News => &["news"],
            CollectionKind::Impact => &["stories"],
            CollectionKind::Team => &["members"],
            _ => &[],
        }
    }

    pub fn discipline(self) -> MergeDiscipline {
        match self {
            CollectionKind::Magazines | CollectionKind::Samples => MergeDiscipline::MergeByKey("code"),
            CollectionKind::Requests => MergeDiscipline::Append,
            _ => MergeDiscipline::ReplaceAll,
        }
    }

    /// Whether the public website may list this collection.
    pub fn is_public(self) -> bool {
        self != CollectionKind::Requests
    }

    /// Codec for this collection.
    pub fn codec(self) -> &'static dyn CollectionCodec {
        match self {
            CollectionKind::News => &NewsCodec,
            CollectionKind::Impact => &ImpactCodec,
            CollectionKind::Team => &TeamCodec,
            CollectionKind::Magazines => &MagazineCodec,
            CollectionKind::Samples => &SampleCodec,
            CollectionKind::Requests => &RequestCodec,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CollectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollectionKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown collection: {s}"))
    }
}

// =============================================================================
// Codecs
// =============================================================================

pub struct NewsCodec;

impl CollectionCodec for NewsCodec {
    fn kind(&self) -> CollectionKind {
        CollectionKind::News
    }

    fn normalize_fields(&self, raw: &Map<String, Value>, out: &mut Map<String, Value>) {
        set_bilingual_title(raw, out, "title");
        set_bilingual(raw, out, "summary", "");
        set_bilingual(raw, out, "body", "");
        keep_optional_text(raw, out, "date");
        set_images(raw, out, "image", "images");
    }
}

pub struct ImpactCodec;

impl CollectionCodec for ImpactCodec {
    fn kind(&self) -> CollectionKind {
        CollectionKind::Impact
    }

    fn normalize_fields(&self, raw: &Map<String, Value>, out: &mut Map<String, Value>) {
        set_bilingual_title(raw, out, "title");
        set_bilingual(raw, out, "summary", "");
        set_bilingual(raw, out, "body", "");
        set_text(raw, out, "status", "published");
        set_images(raw, out, "image", "images");
    }
}

pub struct TeamCodec;

impl CollectionCodec for TeamCodec {
    fn kind(&self) -> CollectionKind {
        CollectionKind::Team
    }

    fn normalize_fields(&self, raw: &Map<String, Value>, out: &mut Map<String, Value>) {
        set_text(raw, out, "name", "");
        set_bilingual(raw, out, "role", "");
        set_bilingual(raw, out, "bio", "");
        set_images(raw, out, "image", "images");
    }
}

pub struct MagazineCodec;

impl CollectionCodec for MagazineCodec {
    fn kind(&self) -> CollectionKind {
        CollectionKind::Magazines
    }

    fn normalize_fields(&self, raw: &Map<String, Value>, out: &mut Map<String, Value>) {
        set_key(raw, out, "code");
        set_bilingual_title(raw, out, "title");
        set_bilingual(raw, out, "description", "");
        keep_optional_text(raw, out, "pdfUrl");
        set_images(raw, out, "image", "images");
    }

    fn derived_id(&self, fields: &Map<String, Value>) -> Option<String> {
        code_id(fields)
    }
}

/// Sample pages for one magazine, keyed by the magazine code.
pub struct SampleCodec;

impl CollectionCodec for SampleCodec {
    fn kind(&self) -> CollectionKind {
        CollectionKind::Samples
    }

    fn normalize_fields(&self, raw: &Map<String, Value>, out: &mut Map<String, Value>) {
        set_key(raw, out, "code");
        set_bilingual(raw, out, "caption", "");
        set_images(raw, out, "image", "pages");
    }

    fn derived_id(&self, fields: &Map<String, Value>) -> Option<String> {
        code_id(fields)
    }
}

pub struct RequestCodec;

impl CollectionCodec for RequestCodec {
    fn kind(&self) -> CollectionKind {
        CollectionKind::Requests
    }

    fn normalize_fields(&self, raw: &Map<String, Value>, out: &mut Map<String, Value>) {
        set_text(raw, out, "fullName", "");
        set_text(raw, out, "email", "");
        set_text(raw, out, "status", "new");
        set_positive_int(raw, out, "quantity", 1);
    }
}

fn code_id(fields: &Map<String, Value>) -> Option<String> {
    fields
        .get("code")
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in CollectionKind::ALL {
            assert_eq!(kind.name().parse::<CollectionKind>().unwrap(), kind);
        }
        assert!("gallery".parse::<CollectionKind>().is_err());
    }

    #[test]
    fn synthesized_ids_are_deterministic_per_index() {
        let raw = json!([{}, {}, { "id": "" }]);
        let impact = CollectionKind::Impact.codec().decode(&raw);
        let news = CollectionKind::News.codec().decode(&raw);
        let team = CollectionKind::Team.codec().decode(&raw);

        let ids = |records: &[crate::codec::Record]| -> Vec<String> {
            records.iter().map(|r| r.id.clone()).collect()
        };
        assert_eq!(ids(&impact), vec!["impact-0", "impact-1", "impact-2"]);
        assert_eq!(ids(&news), vec!["news-0", "news-1", "news-2"]);
        assert_eq!(ids(&team), vec!["member-0", "member-1", "member-2"]);
    }

    #[test]
    fn news_normalizes_known_fields_and_keeps_unknown() {
        let raw = json!([{ "titleTet": "Notísia", "images": ["x.jpg"], "source": "radio" }]);
        let record = &CollectionKind::News.codec().decode(&raw)[0];

        assert_eq!(record.id, "news-0");
        assert_eq!(record.order, 1);
        assert!(record.visible);
        assert_eq!(record.fields["titleEn"], json!("Untitled"));
        assert_eq!(record.fields["titleTet"], json!("Notísia"));
        assert_eq!(record.fields["bodyEn"], json!(""));
        assert!(record.fields.get("bodyTet").is_none());
        assert_eq!(record.fields["image"], json!("x.jpg"));
        assert_eq!(record.fields["source"], json!("radio"));
    }

    #[test]
    fn normalized_fields_take_precedence_over_raw_values() {
        let raw = json!([{ "id": " keep ", "order": 4, "visible": false, "titleEn": "" }]);
        let record = &CollectionKind::Impact.codec().decode(&raw)[0];
        assert_eq!(record.id, "keep");
        assert_eq!(record.order, 4);
        assert!(!record.visible);
        assert_eq!(record.fields["titleEn"], json!("Untitled"));
        assert_eq!(record.fields["status"], json!("published"));
        assert!(record.fields.get("id").is_none());
    }

    #[test]
    fn magazine_id_falls_back_to_code() {
        let raw = json!([{ "code": "  LAFAEK-12 " }, {}]);
        let records = CollectionKind::Magazines.codec().decode(&raw);
        assert_eq!(records[0].id, "LAFAEK-12");
        assert_eq!(records[0].fields["code"], json!("LAFAEK-12"));
        assert_eq!(records[1].id, "magazine-1");
        assert_eq!(records[1].fields["code"], json!(""));
    }

    #[test]
    fn samples_use_pages_as_image_list() {
        let raw = json!([{ "code": "M1", "pages": ["p1.jpg", "", "p2.jpg"] }]);
        let record = &CollectionKind::Samples.codec().decode(&raw)[0];
        assert_eq!(record.fields["pages"], json!(["p1.jpg", "p2.jpg"]));
        assert_eq!(record.fields["image"], json!("p1.jpg"));
    }

    #[test]
    fn disciplines_match_collections() {
        assert_eq!(CollectionKind::News.discipline(), MergeDiscipline::ReplaceAll);
        assert_eq!(CollectionKind::Team.discipline(), MergeDiscipline::ReplaceAll);
        assert_eq!(
            CollectionKind::Magazines.discipline(),
            MergeDiscipline::MergeByKey("code")
        );
        assert_eq!(
            CollectionKind::Samples.discipline(),
            MergeDiscipline::MergeByKey("code")
        );
        assert_eq!(CollectionKind::Requests.discipline(), MergeDiscipline::Append);
        assert!(!CollectionKind::Requests.is_public());
    }
}
