use crate::models::Document;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-memory registry of ingested documents. Lives for the process lifetime;
/// persistence across restarts is an external concern. Last write for a given
/// id wins, since ids are generated server-side.
#[derive(Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&self, document: Document) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(document.document_id.clone(), document);
    }

    pub fn get_by_id(&self, document_id: &str) -> Option<Document> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(document_id)
            .cloned()
    }

    pub fn get_all(&self) -> Vec<Document> {
        let mut all: Vec<Document> = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        all.sort_by(|left, right| right.uploaded_at.cmp(&left.uploaded_at));
        all
    }

    pub fn delete(&self, document_id: &str) -> bool {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(document_id)
            .is_some()
    }

    pub fn clear(&self) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
