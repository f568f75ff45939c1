//! Format tags and the sets derived from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Upper-case file format identifier derived from a file extension (e.g. `PNG`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FormatTag(String);

impl FormatTag {
    /// Normalise an arbitrary string into a tag by upper-casing it.
    pub fn parse(value: &str) -> Self {
        Self(value.trim().to_uppercase())
    }

    /// Derive the tag from a file name: the text after the last `.`, normalised
    /// like [`parse`](Self::parse).
    ///
    /// A name without any `.` yields the whole name upper-cased. That tag is
    /// passed through to the remote service unchanged, which rejects it.
    pub fn from_file_name(name: &str) -> Self {
        let extension = name.rsplit('.').next().unwrap_or(name);
        Self::parse(extension)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FormatTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<String> for FormatTag {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for FormatTag {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<FormatTag> for String {
    fn from(tag: FormatTag) -> Self {
        tag.0
    }
}

/// Formats reachable from every file of the current selection.
///
/// Never empty: an empty intersection is represented by the absence of a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommonTargetSet(Vec<FormatTag>);

impl CommonTargetSet {
    /// Intersect per-file convertibility sets, keeping first-seen order.
    ///
    /// Returns `None` when there are no sets or nothing is common to all of them.
    pub fn intersect(sets: &[Vec<FormatTag>]) -> Option<Self> {
        let mut common: Vec<FormatTag> = Vec::new();
        for set in sets {
            for format in set {
                if common.contains(format) {
                    continue;
                }
                if sets.iter().all(|other| other.contains(format)) {
                    common.push(format.clone());
                }
            }
        }

        if common.is_empty() {
            None
        } else {
            Some(Self(common))
        }
    }

    pub fn contains(&self, format: &FormatTag) -> bool {
        self.0.contains(format)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormatTag> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[FormatTag] {
        &self.0
    }
}

/// Outcome of a successful negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negotiation {
    /// No files selected; the UI shows its neutral placeholder.
    Empty,
    /// Every selected file can be converted to each of these formats.
    Targets(CommonTargetSet),
}

impl Negotiation {
    pub fn targets(&self) -> Option<&CommonTargetSet> {
        match self {
            Negotiation::Empty => None,
            Negotiation::Targets(set) => Some(set),
        }
    }
}

/// Media family (image, video, audio) to its supported format tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupportedFormats(BTreeMap<String, Vec<FormatTag>>);

impl SupportedFormats {
    pub fn new(families: BTreeMap<String, Vec<FormatTag>>) -> Self {
        Self(families)
    }

    pub fn families(&self) -> impl Iterator<Item = (&str, &[FormatTag])> {
        self.0.iter().map(|(name, tags)| (name.as_str(), tags.as_slice()))
    }

    /// Lay the families out as columns: one row per index up to the longest
    /// family, `None` where a family has run out of formats.
    pub fn rows(&self) -> Vec<Vec<Option<&FormatTag>>> {
        let height = self.0.values().map(Vec::len).max().unwrap_or(0);
        (0..height)
            .map(|row| self.0.values().map(|tags| tags.get(row)).collect())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<FormatTag> {
        values.iter().map(|v| FormatTag::parse(v)).collect()
    }

    #[test]
    fn test_from_file_name_uses_last_extension() {
        assert_eq!(FormatTag::from_file_name("photo.png").as_str(), "PNG");
        assert_eq!(FormatTag::from_file_name("archive.tar.Gz").as_str(), "GZ");
        assert_eq!(FormatTag::from_file_name("song.mp3").as_str(), "MP3");
    }

    #[test]
    fn test_from_file_name_matches_parse_normalisation() {
        assert_eq!(FormatTag::from_file_name("a.png "), FormatTag::parse("PNG"));
        let decoded: FormatTag = serde_json::from_str(r#"" png ""#).unwrap();
        assert_eq!(FormatTag::from_file_name("a. png "), decoded);
    }

    #[test]
    fn test_from_file_name_without_extension_is_degenerate() {
        assert_eq!(FormatTag::from_file_name("README").as_str(), "README");
        assert_eq!(FormatTag::from_file_name("trailing.").as_str(), "");
    }

    #[test]
    fn test_intersection_of_three_sets() {
        let sets = vec![
            tags(&["A", "B", "C"]),
            tags(&["B", "C", "D"]),
            tags(&["C", "D", "E"]),
        ];
        let common = CommonTargetSet::intersect(&sets).unwrap();
        assert_eq!(common.as_slice(), tags(&["C"]).as_slice());
    }

    #[test]
    fn test_intersection_keeps_first_seen_order_without_duplicates() {
        let sets = vec![tags(&["JPG", "GIF", "JPG", "PNG"]), tags(&["PNG", "GIF", "JPG"])];
        let common = CommonTargetSet::intersect(&sets).unwrap();
        assert_eq!(common.as_slice(), tags(&["JPG", "GIF", "PNG"]).as_slice());
    }

    #[test]
    fn test_intersection_empty_is_none() {
        let sets = vec![tags(&["JPG", "GIF"]), tags(&["MP3", "WAV"])];
        assert!(CommonTargetSet::intersect(&sets).is_none());
        assert!(CommonTargetSet::intersect(&[]).is_none());
    }

    #[test]
    fn test_deserialize_upper_cases() {
        let parsed: Vec<FormatTag> = serde_json::from_str(r#"["jpg", "Gif"]"#).unwrap();
        assert_eq!(parsed, tags(&["JPG", "GIF"]));
    }

    #[test]
    fn test_supported_formats_rows_pad_short_columns() {
        let formats: SupportedFormats =
            serde_json::from_str(r#"{"image": ["BMP", "GIF", "JPG"], "audio": ["MP3"]}"#).unwrap();
        let rows = formats.rows();
        assert_eq!(rows.len(), 3);
        // BTreeMap order: audio, image
        assert_eq!(rows[0][0].map(FormatTag::as_str), Some("MP3"));
        assert_eq!(rows[0][1].map(FormatTag::as_str), Some("BMP"));
        assert_eq!(rows[2][0], None);
        assert_eq!(rows[2][1].map(FormatTag::as_str), Some("JPG"));
    }
}
