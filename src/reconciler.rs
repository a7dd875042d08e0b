use crate::model::{FieldMetadata, FieldSelection, FormElement};
use crate::store::FormStore;
use crate::Result;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Synchronizes a form's fields with a field selection.
///
/// Selected fields missing from the form are added, deselected fields
/// present on the form are removed. Fields the selection does not mention
/// are never touched, and an existing field is never converted to another
/// kind even when the metadata now implies a different one.
///
/// Store failures propagate as-is. Nothing is rolled back, so a failure
/// halfway leaves the form in whatever state the store reached.
pub struct FieldReconciler<'a, S: FormStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: FormStore + ?Sized> FieldReconciler<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Adds every selected field that the form does not define yet.
    ///
    /// The updated definitions are persisted with one
    /// `set_field_definitions` followed by `save`. Returns the added keys.
    pub fn add_fields(
        &mut self,
        selection: &FieldSelection,
        metadata: &FieldMetadata,
    ) -> Result<Vec<String>> {
        let existing = self.store.flattened_field_keys()?;
        self.add_missing(selection, metadata, &existing)
    }

    /// Deletes every deselected field the form currently defines, one call
    /// per field. Returns the removed keys.
    pub fn delete_fields(&mut self, selection: &FieldSelection) -> Result<Vec<String>> {
        let existing = self.store.flattened_field_keys()?;
        self.delete_present(selection, &existing)
    }

    /// Adds then deletes, checking both against the fields that existed
    /// before the pass started.
    pub fn reconcile(
        &mut self,
        selection: &FieldSelection,
        metadata: &FieldMetadata,
    ) -> Result<Reconciliation> {
        let existing = self.store.flattened_field_keys()?;
        let added = self.add_missing(selection, metadata, &existing)?;
        let removed = self.delete_present(selection, &existing)?;

        info!(
            "Reconciled form fields: {} added, {} removed",
            added.len(),
            removed.len()
        );

        Ok(Reconciliation { added, removed })
    }

    fn add_missing(
        &mut self,
        selection: &FieldSelection,
        metadata: &FieldMetadata,
        existing: &BTreeSet<String>,
    ) -> Result<Vec<String>> {
        let mut elements = self.store.field_definitions()?;
        let mut added = Vec::new();

        for key in selection.enabled() {
            if existing.contains(key) {
                continue;
            }
            let element = FormElement::for_field(key, metadata.get(key));
            debug!(
                "Adding {} field '{}'",
                if element.is_text() { "text" } else { "select" },
                key
            );
            elements.push(element);
            added.push(key.to_string());
        }

        self.store.set_field_definitions(elements)?;
        self.store.save()?;

        Ok(added)
    }

    fn delete_present(
        &mut self,
        selection: &FieldSelection,
        existing: &BTreeSet<String>,
    ) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        for key in selection.disabled() {
            if !existing.contains(key) {
                continue;
            }
            // Removing a container removes its children with it.
            if !self.store.flattened_field_keys()?.contains(key) {
                debug!("Field '{}' already gone", key);
                continue;
            }
            debug!("Removing field '{}'", key);
            self.store.delete_field(key)?;
            removed.push(key.to_string());
        }
        Ok(removed)
    }
}

/// Keys touched by one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
