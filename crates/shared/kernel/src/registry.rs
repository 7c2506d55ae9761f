//! Feature to module lookup.
//!
//! The table is fixed at startup. Features that are absent need no module: callers route
//! straight to their default destination.

use fxhash::FxHashMap;
use mstone_domain::config::RegistryConfig;
use mstone_domain::constants::{OCR, PDF, WORD};
use mstone_domain::{FeatureId, ModuleId};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

#[mstone_derive::mstone_error]
pub enum RegistryError {
    #[error("Registry validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Immutable feature to module table. Clones share the table.
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    table: Arc<FxHashMap<FeatureId, ModuleId>>,
}

impl FeatureRegistry {
    /// The built-in table: OCR, PDF and WORD all live in `Module01`.
    #[must_use]
    pub fn standard() -> Self {
        let table = [OCR, PDF, WORD]
            .into_iter()
            .map(|feature| (FeatureId::new(feature), ModuleId::tools()))
            .collect();
        Self { table: Arc::new(table) }
    }

    /// Starts from the built-in table.
    #[must_use]
    pub fn builder() -> FeatureRegistryBuilder {
        FeatureRegistryBuilder { base: Self::standard(), pending: Vec::new() }
    }

    /// Starts from an empty table.
    #[must_use]
    pub fn empty_builder() -> FeatureRegistryBuilder {
        FeatureRegistryBuilder { base: Self::default(), pending: Vec::new() }
    }

    /// The built-in table plus the extra entries from configuration.
    ///
    /// # Errors
    /// Returns [`RegistryError::Validation`] if a configured name is blank.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        Self::builder().entries(config.features.iter()).build()
    }

    #[must_use]
    pub fn resolve(&self, feature: &FeatureId) -> Option<&ModuleId> {
        self.table.get(feature)
    }

    /// Features served by `module`, sorted.
    #[must_use]
    pub fn features_for(&self, module: &ModuleId) -> Vec<FeatureId> {
        let mut features: Vec<_> = self
            .table
            .iter()
            .filter(|(_, owner)| *owner == module)
            .map(|(feature, _)| feature.clone())
            .collect();
        features.sort();
        features
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FeatureId, &ModuleId)> {
        self.table.iter()
    }
}

#[derive(Debug)]
#[must_use = "The builder does nothing until `build` is called."]
pub struct FeatureRegistryBuilder {
    base: FeatureRegistry,
    pending: Vec<(String, String)>,
}

impl FeatureRegistryBuilder {
    /// Adds or overrides one mapping.
    pub fn entry(mut self, feature: impl Into<String>, module: impl Into<String>) -> Self {
        self.pending.push((feature.into(), module.into()));
        self
    }

    pub fn entries<I, F, M>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (F, M)>,
        F: AsRef<str>,
        M: AsRef<str>,
    {
        self.pending.extend(
            entries.into_iter().map(|(f, m)| (f.as_ref().to_owned(), m.as_ref().to_owned())),
        );
        self
    }

    /// # Errors
    /// Returns [`RegistryError::Validation`] if a feature or module name is blank.
    pub fn build(self) -> Result<FeatureRegistry, RegistryError> {
        let mut table = (*self.base.table).clone();

        for (feature, module) in self.pending {
            let (feature, module) = (feature.trim(), module.trim());
            if feature.is_empty() || module.is_empty() {
                return Err(RegistryError::Validation {
                    message: format!("Blank mapping '{feature}' -> '{module}'").into(),
                    context: Some("Feature registry".into()),
                });
            }
            if let Some(previous) = table.insert(FeatureId::new(feature), ModuleId::new(module)) {
                debug!(feature, %previous, module, "Feature mapping overridden");
            }
        }

        Ok(FeatureRegistry { table: Arc::new(table) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        let registry = FeatureRegistry::standard();
        assert_eq!(registry.len(), 3);
        for feature in [FeatureId::ocr(), FeatureId::pdf(), FeatureId::word()] {
            assert_eq!(registry.resolve(&feature), Some(&ModuleId::tools()));
        }
        assert!(registry.resolve(&FeatureId::from("UNKNOWN_FEATURE")).is_none());
    }

    #[test]
    fn test_builder_extends_and_overrides() {
        let registry = FeatureRegistry::builder()
            .entry("SCAN", "Module02")
            .entry("PDF", "Module03")
            .build()
            .unwrap();

        assert_eq!(registry.resolve(&FeatureId::from("SCAN")), Some(&ModuleId::numbered(2)));
        assert_eq!(registry.resolve(&FeatureId::pdf()), Some(&ModuleId::numbered(3)));
        assert_eq!(registry.features_for(&ModuleId::tools()), [FeatureId::ocr(), FeatureId::word()]);
    }

    #[test]
    fn test_blank_entries_are_rejected() {
        let err = FeatureRegistry::builder().entry(" ", "Module02").build().unwrap_err();
        assert!(matches!(err, RegistryError::Validation { .. }));
        assert!(FeatureRegistry::empty_builder().entry("OCR", "").build().is_err());
    }
}
