//! Header-to-field resolution for imported CSV files

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::domain::Provider;

/// Semantic column a header cell can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnField {
    Date,
    Driver,
    Vehicle,
    Earnings(Provider),
    Notes,
}

impl ColumnField {
    pub const REQUIRED: [ColumnField; 3] =
        [ColumnField::Date, ColumnField::Driver, ColumnField::Vehicle];

    /// Field name used in configuration keys and error messages
    pub fn key(&self) -> &'static str {
        match self {
            ColumnField::Date => "date",
            ColumnField::Driver => "driver",
            ColumnField::Vehicle => "vehicle",
            ColumnField::Earnings(Provider::Uber) => "uber",
            ColumnField::Earnings(Provider::Careem) => "careem",
            ColumnField::Earnings(Provider::Yango) => "yango",
            ColumnField::Earnings(Provider::Private) => "private",
            ColumnField::Notes => "notes",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let field = match key.trim().to_lowercase().as_str() {
            "date" => ColumnField::Date,
            "driver" => ColumnField::Driver,
            "vehicle" => ColumnField::Vehicle,
            "uber" => ColumnField::Earnings(Provider::Uber),
            "careem" => ColumnField::Earnings(Provider::Careem),
            "yango" => ColumnField::Earnings(Provider::Yango),
            "private" => ColumnField::Earnings(Provider::Private),
            "notes" => ColumnField::Notes,
            _ => return None,
        };
        Some(field)
    }
}

impl fmt::Display for ColumnField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

const BUILTIN_SYNONYMS: &[(ColumnField, &[&str])] = &[
    (
        ColumnField::Date,
        &["date", "day", "entry date", "fecha", "datum", "تاريخ", "التاريخ"],
    ),
    (
        ColumnField::Driver,
        &[
            "driver",
            "driver name",
            "conductor",
            "chauffeur",
            "fahrer",
            "سائق",
            "السائق",
            "اسم السائق",
        ],
    ),
    (
        ColumnField::Vehicle,
        &[
            "vehicle",
            "vehicle name",
            "car",
            "vehículo",
            "vehiculo",
            "véhicule",
            "voiture",
            "fahrzeug",
            "سيارة",
            "السيارة",
            "مركبة",
            "المركبة",
        ],
    ),
    (
        ColumnField::Earnings(Provider::Uber),
        &["uber", "uber earnings", "أوبر", "اوبر"],
    ),
    (
        ColumnField::Earnings(Provider::Careem),
        &["careem", "careem earnings", "كريم"],
    ),
    (
        ColumnField::Earnings(Provider::Yango),
        &["yango", "yango earnings", "يانغو", "يانجو"],
    ),
    (
        ColumnField::Earnings(Provider::Private),
        &[
            "private",
            "private jobs",
            "private job",
            "private earnings",
            "privado",
            "خاص",
            "رحلات خاصة",
        ],
    ),
    (
        ColumnField::Notes,
        &["notes", "note", "comments", "remarks", "notas", "ملاحظات"],
    ),
];

/// Immutable synonym table: normalized header text → field
#[derive(Debug, Clone)]
pub struct ColumnVocabulary {
    synonyms: HashMap<String, ColumnField>,
}

impl ColumnVocabulary {
    /// An empty vocabulary, for tests and fully custom tables
    pub fn empty() -> Self {
        Self {
            synonyms: HashMap::new(),
        }
    }

    /// Add synonyms for a field; an existing synonym keeps its original field
    pub fn with_synonyms<I, S>(mut self, field: ColumnField, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for synonym in synonyms {
            self.synonyms
                .entry(normalize_header(synonym.as_ref()))
                .or_insert(field);
        }
        self
    }

    /// Built-in table extended with configured synonyms keyed by field name
    ///
    /// Unknown field names are skipped with a warning.
    pub fn with_extra(mut self, extra: &HashMap<String, Vec<String>>) -> Self {
        for (key, synonyms) in extra {
            match ColumnField::from_key(key) {
                Some(field) => self = self.with_synonyms(field, synonyms),
                None => tracing::warn!(field = %key, "ignoring synonyms for unknown import field"),
            }
        }
        self
    }

    pub fn field_for(&self, header: &str) -> Option<ColumnField> {
        self.synonyms.get(&normalize_header(header)).copied()
    }
}

impl Default for ColumnVocabulary {
    fn default() -> Self {
        BUILTIN_SYNONYMS
            .iter()
            .fold(Self::empty(), |vocab, (field, synonyms)| {
                vocab.with_synonyms(*field, synonyms.iter())
            })
    }
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Field → zero-based column index for one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    indices: HashMap<ColumnField, usize>,
}

impl ColumnMapping {
    pub fn get(&self, field: ColumnField) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    pub fn contains(&self, field: ColumnField) -> bool {
        self.indices.contains_key(&field)
    }

    /// Providers that have a column in this file
    pub fn providers(&self) -> impl Iterator<Item = (Provider, usize)> + '_ {
        Provider::ALL
            .into_iter()
            .filter_map(|p| self.get(ColumnField::Earnings(p)).map(|idx| (p, idx)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Missing required column(s): {}", join_fields(.missing))]
pub struct ColumnMappingError {
    pub missing: Vec<ColumnField>,
}

fn join_fields(fields: &[ColumnField]) -> String {
    fields.iter().map(|f| f.key()).collect::<Vec<_>>().join(", ")
}

/// Resolves a header row against a vocabulary
#[derive(Debug, Clone, Default)]
pub struct ColumnMapper {
    vocabulary: ColumnVocabulary,
}

impl ColumnMapper {
    pub fn new(vocabulary: ColumnVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Map header cells to fields; the first occurrence of a field wins
    pub fn map_columns<S: AsRef<str>>(
        &self,
        header: &[S],
    ) -> Result<ColumnMapping, ColumnMappingError> {
        let mut indices = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            if let Some(field) = self.vocabulary.field_for(cell.as_ref()) {
                indices.entry(field).or_insert(idx);
            }
        }

        let missing: Vec<ColumnField> = ColumnField::REQUIRED
            .into_iter()
            .filter(|field| !indices.contains_key(field))
            .collect();

        if missing.is_empty() {
            Ok(ColumnMapping { indices })
        } else {
            Err(ColumnMappingError { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_mixed_language_headers() {
        let mapper = ColumnMapper::default();
        let mapping = mapper
            .map_columns(&["  FECHA ", "السائق", "Car", "Uber", "Careem"])
            .unwrap();

        assert_eq!(mapping.get(ColumnField::Date), Some(0));
        assert_eq!(mapping.get(ColumnField::Driver), Some(1));
        assert_eq!(mapping.get(ColumnField::Vehicle), Some(2));
        assert_eq!(mapping.get(ColumnField::Earnings(Provider::Uber)), Some(3));
        assert_eq!(mapping.get(ColumnField::Earnings(Provider::Yango)), None);
        assert_eq!(mapping.providers().count(), 2);
    }

    #[test]
    fn test_each_missing_required_field_is_named() {
        let mapper = ColumnMapper::default();
        let full = ["date", "driver", "vehicle"];

        for removed in 0..full.len() {
            let header: Vec<&str> = full
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != removed)
                .map(|(_, h)| *h)
                .collect();
            let err = mapper.map_columns(&header).unwrap_err();
            assert_eq!(err.missing, vec![ColumnField::REQUIRED[removed]]);
            assert!(err.to_string().contains(full[removed]));
        }
    }

    #[test]
    fn test_first_duplicate_header_wins() {
        let mapper = ColumnMapper::default();
        let mapping = mapper
            .map_columns(&["Date", "Driver", "Vehicle", "Uber", "uber"])
            .unwrap();
        assert_eq!(mapping.get(ColumnField::Earnings(Provider::Uber)), Some(3));
    }

    #[test]
    fn test_bom_on_first_header_is_ignored() {
        let mapper = ColumnMapper::default();
        assert!(mapper.map_columns(&["\u{feff}Date", "Driver", "Vehicle"]).is_ok());
    }

    #[test]
    fn test_custom_vocabulary() {
        let vocabulary = ColumnVocabulary::empty()
            .with_synonyms(ColumnField::Date, ["dia"])
            .with_synonyms(ColumnField::Driver, ["chofer"])
            .with_synonyms(ColumnField::Vehicle, ["auto"]);
        let mapper = ColumnMapper::new(vocabulary);

        assert!(mapper.map_columns(&["Dia", "Chofer", "Auto"]).is_ok());
        assert!(mapper.map_columns(&["Date", "Driver", "Vehicle"]).is_err());
    }

    #[test]
    fn test_extra_synonyms_from_config() {
        let mut extra = HashMap::new();
        extra.insert("driver".to_string(), vec!["Chofer".to_string()]);
        extra.insert("bogus".to_string(), vec!["x".to_string()]);
        let mapper = ColumnMapper::new(ColumnVocabulary::default().with_extra(&extra));

        let mapping = mapper.map_columns(&["date", "chofer", "vehicle"]).unwrap();
        assert_eq!(mapping.get(ColumnField::Driver), Some(1));
    }
}
