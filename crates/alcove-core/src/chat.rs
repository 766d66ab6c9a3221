//! The [`Chat`] handle shared by every operation in this crate.

use std::sync::Arc;

use alcove_store::DocumentStore;

/// Handle to the chat backend.
///
/// Cheap to clone; every clone talks to the same store. The individual
/// capabilities (presence, typing, receipts, messages, groups, admin) are
/// implemented in their own modules as `impl Chat` blocks.
#[derive(Clone)]
pub struct Chat {
    store: Arc<dyn DocumentStore>,
}

impl Chat {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}
