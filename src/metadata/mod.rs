pub mod exif;
pub mod indicators;
pub mod tags;

use std::{collections::BTreeMap, fmt};

/// A rational tag value. Signed so that both EXIF RATIONAL and SRATIONAL fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub num: i64,
    pub denom: i64,
}

impl Ratio {
    pub fn new(num: i64, denom: i64) -> Self {
        Self { num, denom }
    }

    pub fn to_f64(self) -> Option<f64> {
        (self.denom != 0).then(|| self.num as f64 / self.denom as f64)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_f64() {
            Some(value) => write!(f, "{}", value),
            None => write!(f, "{}/{}", self.num, self.denom),
        }
    }
}

/// Raw value of a single tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(String),
    Bytes(Vec<u8>),
    Number(Vec<i64>),
    Float(Vec<f64>),
    Rational(Vec<Ratio>),
    Table(TagTable),
}

impl TagValue {
    pub fn text(value: impl Into<String>) -> Self {
        TagValue::Text(value.into())
    }

    /// Lossy, never-failing conversion used for every report-facing value.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Text(text) => f.write_str(text),
            TagValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => f.write_str(text.trim_end_matches('\0')),
                Err(_) => write!(f, "b\"{}\"", bytes.escape_ascii()),
            },
            TagValue::Number(values) => write_list(f, values),
            TagValue::Float(values) => write_list(f, values),
            TagValue::Rational(values) => write_list(f, values),
            TagValue::Table(table) => {
                f.write_str("{")?;
                for (i, (id, value)) in table.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", id, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Tag identifier to raw value, ordered by identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagTable {
    entries: BTreeMap<u16, TagValue>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value unless the identifier is already present.
    /// Returns whether the value was stored.
    pub fn insert(&mut self, id: u16, value: TagValue) -> bool {
        match self.entries.entry(id) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, id: u16) -> Option<&TagValue> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &TagValue)> {
        self.entries.iter().map(|(&id, value)| (id, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(u16, TagValue)> for TagTable {
    fn from_iter<I: IntoIterator<Item = (u16, TagValue)>>(iter: I) -> Self {
        let mut table = TagTable::new();
        for (id, value) in iter {
            table.insert(id, value);
        }
        table
    }
}
