//! Data models for the billing pipeline.
//!
//! Rows flow through three shapes: [`IncidentRecord`] as loaded,
//! [`EnrichedRecord`] after the coordinator join and [`CategorizedRecord`]
//! once a category label has been attached.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Incident category assigned by the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Contract,
    Pricing,
    Interface,
    Incomplete,
    Inventory,
    #[serde(rename = "STPO")]
    Stpo,
    /// Fallback when no trigger matches.
    Other,
}

impl Category {
    /// Every category in report column order.
    pub const ALL: [Category; 7] = [
        Category::Contract,
        Category::Pricing,
        Category::Interface,
        Category::Incomplete,
        Category::Inventory,
        Category::Stpo,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Contract => "Contract",
            Category::Pricing => "Pricing",
            Category::Interface => "Interface",
            Category::Incomplete => "Incomplete",
            Category::Inventory => "Inventory",
            Category::Stpo => "STPO",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// A single incident row as read from the incident table.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRecord {
    /// 1-based data row number in the source file (header excluded).
    pub row: usize,
    /// Description text the categorizer matches against.
    pub description: String,
    /// Normalized plant code.
    pub plant: String,
    pub agent: String,
    pub work_item_text: String,
    pub ticket_id: String,
    pub delivery_quantity: f64,
    pub base_unit: String,
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    /// Every raw cell, in source column order.
    pub cells: Vec<String>,
}

impl IncidentRecord {
    /// Whole days between start and end timestamps.
    ///
    /// Missing dates and negative spans both count as zero.
    pub fn days_spent(&self) -> f64 {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => (end - start).num_days().max(0) as f64,
            _ => 0.0,
        }
    }
}

/// The loaded incident table: headers plus typed rows.
#[derive(Debug, Clone, Default)]
pub struct IncidentTable {
    pub headers: Vec<String>,
    pub records: Vec<IncidentRecord>,
}

impl IncidentTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Coordinator attributes attached to every plant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorInfo {
    pub coordinator: String,
    pub region: String,
    pub market: String,
    /// Empty when the mapping has no stronghold column.
    pub stronghold: String,
}

/// Plant code → coordinator lookup.
///
/// The first row seen for a plant wins; later rows for the same plant are
/// remembered in `duplicate_plants` so the caller can report them.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorMap {
    by_plant: HashMap<String, CoordinatorInfo>,
    duplicate_plants: Vec<String>,
    rows: usize,
}

impl CoordinatorMap {
    /// Build the lookup from `(plant, info)` rows in file order.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, CoordinatorInfo)>,
    {
        let mut map = Self::default();
        for (plant, info) in rows {
            map.rows += 1;
            if map.by_plant.contains_key(&plant) {
                if !map.duplicate_plants.contains(&plant) {
                    map.duplicate_plants.push(plant);
                }
                continue;
            }
            map.by_plant.insert(plant, info);
        }
        map
    }

    pub fn get(&self, plant: &str) -> Option<&CoordinatorInfo> {
        self.by_plant.get(plant)
    }

    /// Plants that appeared on more than one mapping row.
    pub fn duplicate_plants(&self) -> &[String] {
        &self.duplicate_plants
    }

    /// Number of mapping rows read, duplicates included.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn plant_count(&self) -> usize {
        self.by_plant.len()
    }
}

/// An incident that survived the inner join.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub incident: IncidentRecord,
    pub coordinator: CoordinatorInfo,
}

/// An enriched incident with its category label.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedRecord {
    pub incident: IncidentRecord,
    pub coordinator: CoordinatorInfo,
    pub category: Category,
}

impl CategorizedRecord {
    pub fn agent(&self) -> &str {
        &self.incident.agent
    }

    pub fn plant(&self) -> &str {
        &self.incident.plant
    }

    pub fn description(&self) -> &str {
        &self.incident.description
    }

    /// Case-insensitive keyword test on the description.
    pub fn mentions(&self, keyword: &str) -> bool {
        self.incident
            .description
            .to_lowercase()
            .contains(&keyword.to_lowercase())
    }
}
