use crate::location::ReferenceStore;

/// Shared, read-only after startup; no lock needed.
pub struct AppState {
    pub store: ReferenceStore,
}
