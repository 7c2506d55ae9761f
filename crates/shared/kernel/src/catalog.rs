//! The closed set of modules the lifecycle engine may load.

use crate::processor::ModuleProcessor;
use fxhash::FxHashMap;
use mstone_domain::ModuleId;
use mstone_domain::constants::MAX_MODULE_NUMBER;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::debug;

/// How a known module is brought up and down.
#[derive(Debug, Clone)]
pub enum CatalogEntry {
    /// Backed by a real processor.
    Processor(Arc<dyn ModuleProcessor>),
    /// Reserved slot that accepts every load and unload without doing work.
    Placeholder,
}

impl CatalogEntry {
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

/// Known modules, immutable once built. Clones share the table.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    entries: Arc<FxHashMap<ModuleId, CatalogEntry>>,
}

impl ModuleCatalog {
    #[must_use]
    pub fn builder() -> ModuleCatalogBuilder {
        ModuleCatalogBuilder::default()
    }

    /// `Module01` bound to `tools`, `Module02` through `Module13` as placeholders.
    #[must_use]
    pub fn standard(tools: Arc<dyn ModuleProcessor>) -> Self {
        Self::builder()
            .placeholders(2..=MAX_MODULE_NUMBER)
            .bind(ModuleId::tools(), tools)
            .build()
    }

    #[must_use]
    pub fn lookup(&self, module: &ModuleId) -> Option<&CatalogEntry> {
        self.entries.get(module)
    }

    #[must_use]
    pub fn contains(&self, module: &ModuleId) -> bool {
        self.entries.contains_key(module)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Known module ids in sorted order.
    #[must_use]
    pub fn modules(&self) -> Vec<ModuleId> {
        let mut modules: Vec<_> = self.entries.keys().cloned().collect();
        modules.sort();
        modules
    }
}

#[derive(Debug, Default)]
#[must_use = "The builder does nothing until `build` is called."]
pub struct ModuleCatalogBuilder {
    entries: FxHashMap<ModuleId, CatalogEntry>,
}

impl ModuleCatalogBuilder {
    /// Binds a module to a processor, replacing any previous entry.
    pub fn bind(mut self, module: ModuleId, processor: Arc<dyn ModuleProcessor>) -> Self {
        debug!(%module, processor = processor.name(), "Binding module processor");
        self.entries.insert(module, CatalogEntry::Processor(processor));
        self
    }

    pub fn placeholder(mut self, module: ModuleId) -> Self {
        self.entries.insert(module, CatalogEntry::Placeholder);
        self
    }

    /// Registers `ModuleNN` placeholders for every number in `numbers`.
    pub fn placeholders(mut self, numbers: RangeInclusive<u8>) -> Self {
        for number in numbers {
            self.entries.insert(ModuleId::numbered(number), CatalogEntry::Placeholder);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> ModuleCatalog {
        ModuleCatalog { entries: Arc::new(self.entries) }
    }
}
