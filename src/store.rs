//! Access to the field definitions of the form being configured.
//!
//! The host application owns form persistence. The handler only needs the
//! five operations of [`FormStore`]; the adapters in this module cover tests
//! and the command-line tool.

use crate::model::{flatten_keys, remove_element, FormElement};
use crate::{HandlerError, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Capability set over the form whose fields get reconciled.
pub trait FormStore {
    /// Keys of every element on the form, nested ones included.
    fn flattened_field_keys(&self) -> Result<BTreeSet<String>>;

    /// The full, ordered element tree.
    fn field_definitions(&self) -> Result<Vec<FormElement>>;

    /// Replaces the element tree. Takes effect on [`FormStore::save`].
    fn set_field_definitions(&mut self, elements: Vec<FormElement>) -> Result<()>;

    /// Persists the form.
    fn save(&mut self) -> Result<()>;

    /// Deletes one element immediately.
    fn delete_field(&mut self, key: &str) -> Result<()>;
}

/// Form held in memory. `save` only counts how often it was called.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFormStore {
    elements: Vec<FormElement>,
    saves: usize,
}

impl InMemoryFormStore {
    pub fn new(elements: Vec<FormElement>) -> Self {
        Self { elements, saves: 0 }
    }

    pub fn elements(&self) -> &[FormElement] {
        &self.elements
    }

    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Looks an element up anywhere in the tree.
    pub fn element(&self, key: &str) -> Option<&FormElement> {
        fn find<'a>(elements: &'a [FormElement], key: &str) -> Option<&'a FormElement> {
            elements.iter().find_map(|element| {
                if element.key == key {
                    Some(element)
                } else {
                    find(element.children(), key)
                }
            })
        }
        find(&self.elements, key)
    }
}

impl FormStore for InMemoryFormStore {
    fn flattened_field_keys(&self) -> Result<BTreeSet<String>> {
        Ok(flatten_keys(&self.elements))
    }

    fn field_definitions(&self) -> Result<Vec<FormElement>> {
        Ok(self.elements.clone())
    }

    fn set_field_definitions(&mut self, elements: Vec<FormElement>) -> Result<()> {
        self.elements = elements;
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }

    fn delete_field(&mut self, key: &str) -> Result<()> {
        if !remove_element(&mut self.elements, key) {
            debug!("No element with key '{}' to delete", key);
        }
        Ok(())
    }
}

/// Form stored as a JSON array of elements on disk.
///
/// Deletions are written through immediately; definition updates are written
/// on [`FormStore::save`].
#[derive(Debug)]
pub struct JsonFileFormStore {
    path: PathBuf,
    form: InMemoryFormStore,
}

impl JsonFileFormStore {
    /// Opens the form at `path`. A missing file is an empty form.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let elements = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            debug!("Form file {} does not exist, starting empty", path.display());
            Vec::new()
        };
        Ok(Self {
            path,
            form: InMemoryFormStore::new(elements),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn elements(&self) -> &[FormElement] {
        self.form.elements()
    }

    fn write(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(self.form.elements())?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl FormStore for JsonFileFormStore {
    fn flattened_field_keys(&self) -> Result<BTreeSet<String>> {
        self.form.flattened_field_keys()
    }

    fn field_definitions(&self) -> Result<Vec<FormElement>> {
        self.form.field_definitions()
    }

    fn set_field_definitions(&mut self, elements: Vec<FormElement>) -> Result<()> {
        self.form.set_field_definitions(elements)
    }

    fn save(&mut self) -> Result<()> {
        self.form.save()?;
        self.write()
    }

    fn delete_field(&mut self, key: &str) -> Result<()> {
        self.form.delete_field(key)?;
        self.write()
    }
}
