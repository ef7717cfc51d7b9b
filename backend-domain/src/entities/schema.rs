//! Versioned feature schema carried next to a persisted model.
//!
//! The schema is the single source of truth for column order. Inference
//! encodes its input against the stored schema instead of rebuilding the
//! column list, and a schema whose fingerprint no longer matches its columns
//! is refused at load time.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{DomainError, DomainResult};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric,
    /// One-hot indicator: 1.0 when `field` equals `category`.
    Indicator { field: String, category: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    #[serde(flatten)]
    pub kind: FeatureKind,
}

impl FeatureColumn {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FeatureKind::Numeric,
        }
    }

    pub fn indicator(field: &str, category: &str) -> Self {
        Self {
            name: format!("{field}_{category}"),
            kind: FeatureKind::Indicator {
                field: field.to_string(),
                category: category.to_string(),
            },
        }
    }

    fn signature(&self) -> String {
        match &self.kind {
            FeatureKind::Numeric => format!("{}:numeric", self.name),
            FeatureKind::Indicator { field, category } => {
                format!("{}:indicator:{}={}", self.name, field, category)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub columns: Vec<FeatureColumn>,
    pub fingerprint: String,
}

impl FeatureSchema {
    pub fn new(columns: Vec<FeatureColumn>) -> DomainResult<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DomainError::SchemaMismatch(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
        }
        let fingerprint = fingerprint(SCHEMA_VERSION, &columns);
        Ok(Self {
            version: SCHEMA_VERSION,
            columns,
            fingerprint,
        })
    }

    /// Numeric columns first, then drop-first one-hot indicators per field.
    ///
    /// Categories are sorted and the first one becomes the reference level,
    /// so it has no column of its own.
    pub fn one_hot(numeric: &[&str], categorical: &[(&str, Vec<String>)]) -> DomainResult<Self> {
        let mut columns: Vec<FeatureColumn> =
            numeric.iter().map(|name| FeatureColumn::numeric(*name)).collect();
        for (field, categories) in categorical {
            let sorted: BTreeSet<&str> = categories.iter().map(String::as_str).collect();
            for category in sorted.into_iter().skip(1) {
                columns.push(FeatureColumn::indicator(field, category));
            }
        }
        Self::new(columns)
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.version != SCHEMA_VERSION {
            return Err(DomainError::SchemaMismatch(format!(
                "unsupported schema version {}, expected {}",
                self.version, SCHEMA_VERSION
            )));
        }
        let rebuilt = Self::new(self.columns.clone())?;
        if rebuilt.fingerprint != self.fingerprint {
            return Err(DomainError::SchemaMismatch(
                "fingerprint does not match columns".to_string(),
            ));
        }
        Ok(())
    }

    /// Encodes named values in schema order.
    ///
    /// Every numeric column must be supplied and no unknown numeric name is
    /// accepted. Categories the schema has never seen encode as all zeros.
    pub fn encode(&self, numeric: &[(&str, f64)], categorical: &[(&str, &str)]) -> DomainResult<Vec<f64>> {
        for (name, _) in numeric {
            let known = self
                .columns
                .iter()
                .any(|column| column.kind == FeatureKind::Numeric && column.name == *name);
            if !known {
                return Err(DomainError::SchemaMismatch(format!(
                    "unexpected numeric feature '{name}'"
                )));
            }
        }
        self.columns
            .iter()
            .map(|column| match &column.kind {
                FeatureKind::Numeric => numeric
                    .iter()
                    .find(|(name, _)| *name == column.name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| {
                        DomainError::SchemaMismatch(format!("missing numeric feature '{}'", column.name))
                    }),
                FeatureKind::Indicator { field, category } => {
                    let matched = categorical
                        .iter()
                        .any(|(name, value)| name == field && value == category);
                    Ok(if matched { 1.0 } else { 0.0 })
                }
            })
            .collect()
    }
}

fn fingerprint(version: u32, columns: &[FeatureColumn]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("v{version}\n"));
    for column in columns {
        hasher.update(column.signature());
        hasher.update("\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        FeatureSchema::one_hot(
            &["Area_SqFt", "Land_Quality_Rating"],
            &[(
                "Location",
                vec!["Urban".to_string(), "Rural".to_string(), "Suburban".to_string(), "Rural".to_string()],
            )],
        )
        .unwrap()
    }

    #[test]
    fn drops_first_sorted_category() {
        let schema = schema();
        assert_eq!(
            schema.names(),
            vec!["Area_SqFt", "Land_Quality_Rating", "Location_Suburban", "Location_Urban"]
        );
    }

    #[test]
    fn encodes_known_and_reference_categories() {
        let schema = schema();
        let urban = schema
            .encode(&[("Land_Quality_Rating", 7.0), ("Area_SqFt", 1200.0)], &[("Location", "Urban")])
            .unwrap();
        assert_eq!(urban, vec![1200.0, 7.0, 0.0, 1.0]);

        let rural = schema
            .encode(&[("Area_SqFt", 1200.0), ("Land_Quality_Rating", 7.0)], &[("Location", "Rural")])
            .unwrap();
        assert_eq!(rural, vec![1200.0, 7.0, 0.0, 0.0]);
    }

    #[test]
    fn unseen_category_encodes_as_zeros() {
        let row = schema()
            .encode(&[("Area_SqFt", 1.0), ("Land_Quality_Rating", 2.0)], &[("Location", "Coastal")])
            .unwrap();
        assert_eq!(row, vec![1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_or_extra_numeric_is_mismatch() {
        let schema = schema();
        assert!(matches!(
            schema.encode(&[("Area_SqFt", 1.0)], &[]),
            Err(DomainError::SchemaMismatch(_))
        ));
        assert!(matches!(
            schema.encode(
                &[("Area_SqFt", 1.0), ("Land_Quality_Rating", 2.0), ("Bedrooms", 3.0)],
                &[]
            ),
            Err(DomainError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn tampered_columns_fail_validation() {
        let mut schema = schema();
        assert!(schema.validate().is_ok());
        schema.columns.swap(2, 3);
        assert!(matches!(schema.validate(), Err(DomainError::SchemaMismatch(_))));
    }

    #[test]
    fn duplicate_column_names_rejected() {
        let err = FeatureSchema::new(vec![FeatureColumn::numeric("a"), FeatureColumn::numeric("a")]);
        assert!(err.is_err());
    }
}
