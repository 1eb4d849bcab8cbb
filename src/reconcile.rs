/// Stat reconciliation
///
/// Merges one strip's OCR text into the per-player record map. The map is
/// passed in and handed back by value so the strip loop can fold over it.
///
/// Keys are the first whitespace token of the recognized name. Two names that
/// share a first token ("Alice Smith", "Alice Jones") land on the same record
/// and the later strip wins field by field.
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Value stored for a stat that has never been recognized
pub const UNRECOGNIZED: &str = "-1";

/// The five numeric columns of a scoreboard row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatField {
    Score,
    Goals,
    Assists,
    Saves,
    Shots,
}

impl StatField {
    pub const ALL: [StatField; 5] = [
        StatField::Score,
        StatField::Goals,
        StatField::Assists,
        StatField::Saves,
        StatField::Shots,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatField::Score => "Score",
            StatField::Goals => "Goals",
            StatField::Assists => "Assists",
            StatField::Saves => "Saves",
            StatField::Shots => "Shots",
        }
    }
}

/// One player's stats as recognized text, serialized as
/// `[score, goals, assists, saves, shots]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[String; 5]", into = "[String; 5]")]
pub struct StatLine {
    pub score: String,
    pub goals: String,
    pub assists: String,
    pub saves: String,
    pub shots: String,
}

impl Default for StatLine {
    fn default() -> Self {
        Self {
            score: UNRECOGNIZED.to_string(),
            goals: UNRECOGNIZED.to_string(),
            assists: UNRECOGNIZED.to_string(),
            saves: UNRECOGNIZED.to_string(),
            shots: UNRECOGNIZED.to_string(),
        }
    }
}

impl StatLine {
    pub fn get(&self, field: StatField) -> &str {
        match field {
            StatField::Score => &self.score,
            StatField::Goals => &self.goals,
            StatField::Assists => &self.assists,
            StatField::Saves => &self.saves,
            StatField::Shots => &self.shots,
        }
    }

    fn slot_mut(&mut self, field: StatField) -> &mut String {
        match field {
            StatField::Score => &mut self.score,
            StatField::Goals => &mut self.goals,
            StatField::Assists => &mut self.assists,
            StatField::Saves => &mut self.saves,
            StatField::Shots => &mut self.shots,
        }
    }

    /// Overwrite `field` only if `value` has text after trimming.
    /// "0" is text like any other digit.
    fn merge(&mut self, field: StatField, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            *self.slot_mut(field) = value.to_string();
        }
    }

    pub fn is_complete(&self) -> bool {
        StatField::ALL
            .iter()
            .all(|field| self.get(*field) != UNRECOGNIZED)
    }
}

impl From<[String; 5]> for StatLine {
    fn from([score, goals, assists, saves, shots]: [String; 5]) -> Self {
        Self {
            score,
            goals,
            assists,
            saves,
            shots,
        }
    }
}

impl From<StatLine> for [String; 5] {
    fn from(line: StatLine) -> Self {
        [line.score, line.goals, line.assists, line.saves, line.shots]
    }
}

/// Raw OCR text for one strip, before reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTexts {
    pub name: String,
    pub score: String,
    pub goals: String,
    pub assists: String,
    pub saves: String,
    pub shots: String,
}

impl FieldTexts {
    pub fn stat(&self, field: StatField) -> &str {
        match field {
            StatField::Score => &self.score,
            StatField::Goals => &self.goals,
            StatField::Assists => &self.assists,
            StatField::Saves => &self.saves,
            StatField::Shots => &self.shots,
        }
    }

    pub fn stat_mut(&mut self, field: StatField) -> &mut String {
        match field {
            StatField::Score => &mut self.score,
            StatField::Goals => &mut self.goals,
            StatField::Assists => &mut self.assists,
            StatField::Saves => &mut self.saves,
            StatField::Shots => &mut self.shots,
        }
    }
}

/// Identity used for a strip whose name came back empty (1-based)
pub fn placeholder_identity(strip_index: usize) -> String {
    format!("Unknown Player {}", strip_index + 1)
}

/// Name shown for a strip: the recognized name, or its placeholder
pub fn display_identity(name: &str, strip_index: usize) -> String {
    let name = name.trim();
    if name.is_empty() {
        placeholder_identity(strip_index)
    } else {
        name.to_string()
    }
}

/// Record key for a strip: first whitespace token of the name, or the placeholder
pub fn record_key(name: &str, strip_index: usize) -> String {
    match name.split_whitespace().next() {
        Some(token) => token.to_string(),
        None => placeholder_identity(strip_index),
    }
}

/// Player records in first-seen order.
///
/// Serializes as a flat JSON object `{ identity: [score, goals, assists, saves, shots] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerRecords {
    entries: Vec<(String, StatLine)>,
}

impl PlayerRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&StatLine> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, line)| line)
    }

    /// Insert or replace, keeping the original position of an existing key
    pub fn insert(&mut self, key: String, line: StatLine) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = line,
            None => self.entries.push((key, line)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatLine)> {
        self.entries.iter().map(|(k, line)| (k.as_str(), line))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// Merge one strip's readings into `records` and return the updated map.
///
/// Each stat is replaced only when its new text is non-empty; otherwise the
/// value already stored under the key (or "-1") is kept. Every strip leaves a
/// record behind, even if nothing was recognized.
pub fn reconcile(mut records: PlayerRecords, texts: &FieldTexts, strip_index: usize) -> PlayerRecords {
    let key = record_key(&texts.name, strip_index);
    let mut line = records.get(&key).cloned().unwrap_or_default();

    for field in StatField::ALL {
        line.merge(field, texts.stat(field));
    }

    tracing::debug!(strip = strip_index, key = %key, ?line, "reconciled strip");
    records.insert(key, line);
    records
}

impl Serialize for PlayerRecords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, line) in self.iter() {
            map.serialize_entry(key, line)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PlayerRecords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordsVisitor;

        impl<'de> Visitor<'de> for RecordsVisitor {
            type Value = PlayerRecords;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of player names to five stat strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut records = PlayerRecords::new();
                while let Some((key, line)) = access.next_entry::<String, StatLine>()? {
                    records.insert(key, line);
                }
                Ok(records)
            }
        }

        deserializer.deserialize_map(RecordsVisitor)
    }
}
