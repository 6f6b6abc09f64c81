use std::{collections::HashMap, fmt, str::FromStr};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::constants::{COLORS, DELETED_CATEGORY_LABEL};

#[derive(Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        CategoryId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        EntryId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "#4CAF50")]
    Green,
    #[serde(rename = "#2196F3")]
    Blue,
    #[serde(rename = "#FF9800")]
    Orange,
    #[serde(rename = "#E91E63")]
    Pink,
    #[serde(rename = "#9C27B0")]
    Purple,
    #[serde(rename = "#00BCD4")]
    Cyan,
    #[serde(rename = "#FF5722")]
    DeepOrange,
    #[serde(rename = "#607D8B")]
    BlueGrey,
    #[serde(rename = "#795548")]
    Brown,
    #[serde(rename = "#3F51B5")]
    Indigo,
}

impl Color {
    pub fn hex(self) -> &'static str {
        match self {
            Color::Green => "#4CAF50",
            Color::Blue => "#2196F3",
            Color::Orange => "#FF9800",
            Color::Pink => "#E91E63",
            Color::Purple => "#9C27B0",
            Color::Cyan => "#00BCD4",
            Color::DeepOrange => "#FF5722",
            Color::BlueGrey => "#607D8B",
            Color::Brown => "#795548",
            Color::Indigo => "#3F51B5",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Orange => "orange",
            Color::Pink => "pink",
            Color::Purple => "purple",
            Color::Cyan => "cyan",
            Color::DeepOrange => "deep-orange",
            Color::BlueGrey => "blue-grey",
            Color::Brown => "brown",
            Color::Indigo => "indigo",
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        COLORS[0]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hex())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        COLORS
            .iter()
            .copied()
            .find(|c| c.hex().eq_ignore_ascii_case(wanted) || c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "Unknown color '{}'. Use one of: {}",
                    wanted,
                    COLORS.iter().map(|c| c.name()).collect::<Vec<_>>().join(", ")
                )
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub color: Color,
    pub order: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub category_id: CategoryId,
    pub timestamp: i64,
}

pub type CategoryMap = HashMap<CategoryId, Category>;

pub fn category_map(categories: &[Category]) -> CategoryMap {
    categories.iter().map(|c| (c.id.clone(), c.clone())).collect()
}

pub fn resolve_category_name<'a>(categories: &'a CategoryMap, id: &CategoryId) -> &'a str {
    categories
        .get(id)
        .map(|c| c.name.as_str())
        .unwrap_or(DELETED_CATEGORY_LABEL)
}

/// Ids are never reused, even after the record holding one is deleted, so
/// every id carries a 64-bit random suffix.
pub fn generate_id(prefix: &str, now_ms: i64, is_taken: impl Fn(&str) -> bool) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let candidate = format!("{}_{}_{:016x}", prefix, now_ms, rng.next_u64());
        if !is_taken(&candidate) {
            return candidate;
        }
    }
}
