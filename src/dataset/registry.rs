use std::collections::BTreeMap;

use crate::dataset::handle::DatasetHandle;
use crate::foundation::error::{RasterError, RasterResult};

/// Name to dataset lookup used when resolving source descriptions.
///
/// Holding a handle here keeps the dataset alive like any other reference.
#[derive(Debug, Default, Clone)]
pub struct DatasetRegistry {
    datasets: BTreeMap<String, DatasetHandle>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the handle's own name. Names must be unique.
    pub fn register(&mut self, handle: DatasetHandle) -> RasterResult<()> {
        if self.datasets.contains_key(handle.name()) {
            return Err(RasterError::config(format!(
                "dataset '{}' is already registered",
                handle.name()
            )));
        }
        self.datasets.insert(handle.name().to_owned(), handle);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DatasetHandle> {
        self.datasets.get(name)
    }

    pub fn resolve(&self, name: &str) -> RasterResult<DatasetHandle> {
        self.datasets
            .get(name)
            .cloned()
            .ok_or_else(|| RasterError::config(format!("unknown dataset '{name}'")))
    }

    pub fn remove(&mut self, name: &str) -> Option<DatasetHandle> {
        self.datasets.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/registry.rs"]
mod tests;
