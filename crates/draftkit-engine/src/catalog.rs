//! Unit reference data.
//!
//! Units (characters and their attachments) are owned by an external
//! source. The engine only reads them: rarity and the limited flag drive
//! the fallback cost formulas, and the kind lets the engine reject an
//! attachment submitted as a primary pick.
//!
//! External documents are loosely shaped, so [`UnitCatalog::from_json`]
//! accepts a few spellings for each field and skips entries it cannot make
//! sense of instead of failing the whole load.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use draftkit_protocol::UnitId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::CatalogError;

/// Unit rarity. Only two tiers affect costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Rare,
}

/// Whether a unit is drafted directly or equipped on a drafted unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    #[default]
    Primary,
    Attachment,
}

impl UnitKind {
    /// Lowest valid level (primaries) or phase (attachments).
    pub fn min_level(self) -> u8 {
        match self {
            Self::Primary => 0,
            Self::Attachment => 1,
        }
    }

    /// Highest valid level (primaries) or phase (attachments).
    pub fn max_level(self) -> u8 {
        match self {
            Self::Primary => 6,
            Self::Attachment => 5,
        }
    }

    /// Number of entries a full cost table holds for this kind.
    pub fn table_len(self) -> usize {
        usize::from(self.max_level() - self.min_level()) + 1
    }

    pub fn accepts(self, level: u8) -> bool {
        (self.min_level()..=self.max_level()).contains(&level)
    }

    /// Position of `level` in a cost table, clamped into range.
    pub fn level_index(self, level: u8) -> usize {
        usize::from(level.clamp(self.min_level(), self.max_level()) - self.min_level())
    }
}

/// One draftable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    pub rarity: Rarity,
    #[serde(default)]
    pub limited: bool,
    pub kind: UnitKind,
}

impl Unit {
    /// Stand-in for a unit the catalog does not know.
    ///
    /// Costs it as common, the cheapest tier, rather than refusing the
    /// draft: the catalog is allowed to lag behind new releases.
    pub fn unknown(id: UnitId, kind: UnitKind) -> Self {
        Self {
            name: id.as_str().to_owned(),
            id,
            rarity: Rarity::Common,
            limited: false,
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// All known units, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    units: HashMap<UnitId, Unit>,
    skipped: usize,
}

impl UnitCatalog {
    pub fn new(units: impl IntoIterator<Item = Unit>) -> Self {
        Self {
            units: units.into_iter().map(|u| (u.id.clone(), u)).collect(),
            skipped: 0,
        }
    }

    /// Parses a catalog document: a JSON array of unit objects.
    ///
    /// Recognized fields per entry:
    ///
    /// | field               | accepted values                                   |
    /// |---------------------|---------------------------------------------------|
    /// | `id`                | string or number (required)                       |
    /// | `name`              | string (defaults to the id)                       |
    /// | `rarity`            | `4`/`5`, `"4"`/`"5"`, `"common"`/`"rare"`         |
    /// | `limited`           | bool, `"true"`/`"false"`, `0`/`1`                 |
    /// | `kind` or `type`    | `primary`, `character`, `attachment`, `lightcone` |
    ///
    /// Malformed entries are logged and skipped.
    pub fn from_json(doc: &Value) -> Result<Self, CatalogError> {
        let entries = doc
            .as_array()
            .ok_or_else(|| CatalogError::NotAnArray(json_type_name(doc)))?;

        let mut catalog = Self::default();
        for (index, entry) in entries.iter().enumerate() {
            match parse_unit(index, entry) {
                Ok(unit) => {
                    catalog.units.insert(unit.id.clone(), unit);
                }
                Err(e) => {
                    warn!(error = %e, "skipping catalog entry");
                    catalog.skipped += 1;
                }
            }
        }

        info!(
            units = catalog.units.len(),
            skipped = catalog.skipped,
            "unit catalog loaded"
        );
        Ok(catalog)
    }

    /// Parses a catalog from raw JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let doc: Value = serde_json::from_str(text)?;
        Self::from_json(&doc)
    }

    pub fn get(&self, id: &UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// The unit for `id`, or a common stand-in of the given kind.
    pub fn resolve(&self, id: &UnitId, kind: UnitKind) -> Unit {
        self.get(id)
            .cloned()
            .unwrap_or_else(|| Unit::unknown(id.clone(), kind))
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Entries dropped by the last [`from_json`](Self::from_json).
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

fn parse_unit(index: usize, entry: &Value) -> Result<Unit, CatalogError> {
    let malformed = |reason: &str| CatalogError::MalformedEntry {
        index,
        reason: reason.to_owned(),
    };

    let obj = entry.as_object().ok_or_else(|| malformed("not an object"))?;

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(malformed("missing id")),
    };
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map_or_else(|| id.clone(), str::to_owned);

    let rarity = parse_rarity(obj).ok_or_else(|| malformed("unrecognized rarity"))?;
    let kind = parse_kind(obj).ok_or_else(|| malformed("unrecognized kind"))?;
    let limited = match obj.get("limited") {
        None | Some(Value::Null) => false,
        Some(v) => parse_flag(v).ok_or_else(|| malformed("unrecognized limited flag"))?,
    };

    Ok(Unit {
        id: UnitId(id),
        name,
        rarity,
        limited,
        kind,
    })
}

fn parse_rarity(obj: &Map<String, Value>) -> Option<Rarity> {
    match obj.get("rarity")? {
        Value::Number(n) => match n.as_u64()? {
            4 => Some(Rarity::Common),
            5 => Some(Rarity::Rare),
            _ => None,
        },
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "4" | "common" => Some(Rarity::Common),
            "5" | "rare" => Some(Rarity::Rare),
            _ => None,
        },
        _ => None,
    }
}

fn parse_kind(obj: &Map<String, Value>) -> Option<UnitKind> {
    let raw = obj.get("kind").or_else(|| obj.get("type"))?.as_str()?;
    match raw.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
        "primary" | "character" | "agent" => Some(UnitKind::Primary),
        "attachment" | "lightcone" | "wengine" | "weapon" => Some(UnitKind::Attachment),
        _ => None,
    }
}

fn parse_flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64()? {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        },
        Value::String(s) => s.to_ascii_lowercase().parse().ok(),
        _ => None,
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Process-wide catalog holder.
///
/// Readers take a cheap [`Arc`] snapshot, so a refresh never blocks a
/// cost calculation that is already running. The cache only changes on an
/// explicit [`refresh`](Self::refresh) or [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct CatalogCache {
    current: RwLock<Arc<UnitCatalog>>,
}

impl CatalogCache {
    pub fn new(catalog: UnitCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// The catalog as of now.
    pub fn snapshot(&self) -> Arc<UnitCatalog> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swaps in a freshly loaded catalog.
    pub fn refresh(&self, catalog: UnitCatalog) {
        let units = catalog.len();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
        info!(units, "unit catalog refreshed");
    }

    /// Drops every unit. Costs fall back to the common tier until the next
    /// refresh.
    pub fn clear(&self) {
        self.refresh(UnitCatalog::default());
    }
}
