//! Boundary with the external field store
//!
//! The engine only ever reads the current field type and hands finished
//! selections to a sink; both sides are injected so the controller can be
//! driven with fakes.

use tokio::sync::watch;

use crate::error::{EngineError, Result};
use crate::types::{FieldType, SelectionEvent};

/// Read accessor for the externally selected field type
///
/// Called on every pointer event, never cached.
pub trait FieldTypeSource {
    fn current_field_type(&self) -> FieldType;
}

impl<F> FieldTypeSource for F
where
    F: Fn() -> FieldType,
{
    fn current_field_type(&self) -> FieldType {
        self()
    }
}

/// Receives `selectElement(selector, content)` dispatches
pub trait SelectionSink {
    fn select_element(&mut self, event: SelectionEvent);
}

impl<F> SelectionSink for F
where
    F: FnMut(SelectionEvent),
{
    fn select_element(&mut self, event: SelectionEvent) {
        self(event)
    }
}

/// Snapshot of the store state the engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreState {
    pub hydrated: bool,
    pub current_field_type: FieldType,
}

/// Create a connected writer/reader pair
pub fn field_store() -> (StoreHandle, FieldStore) {
    let (tx, rx) = watch::channel(StoreState::default());
    (StoreHandle { tx }, FieldStore { rx })
}

/// Writer side, owned by whatever mirrors the external store
#[derive(Debug)]
pub struct StoreHandle {
    tx: watch::Sender<StoreState>,
}

impl StoreHandle {
    /// Change the selected field type
    pub fn set_field_type(&self, field_type: FieldType) {
        self.tx
            .send_modify(|state| state.current_field_type = field_type);
    }

    /// Mark the store as hydrated with its initial field type
    pub fn hydrate(&self, field_type: FieldType) {
        self.tx.send_modify(|state| {
            state.current_field_type = field_type;
            state.hydrated = true;
        });
    }
}

/// Reactive read side of the store
#[derive(Debug, Clone)]
pub struct FieldStore {
    rx: watch::Receiver<StoreState>,
}

impl FieldStore {
    pub fn state(&self) -> StoreState {
        *self.rx.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.rx.borrow().hydrated
    }

    /// Resolve once the store reports hydration
    pub async fn ready(&self) -> Result<()> {
        let mut rx = self.rx.clone();
        let hydrated = rx.wait_for(|state| state.hydrated).await.map(|_| ());
        hydrated.map_err(|_| EngineError::StoreClosed)
    }
}

impl FieldTypeSource for FieldStore {
    fn current_field_type(&self) -> FieldType {
        self.rx.borrow().current_field_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_reads_latest_value() {
        let (handle, store) = field_store();
        assert_eq!(store.current_field_type(), FieldType::Unknown);
        assert!(!store.is_ready());

        handle.set_field_type(FieldType::Text);
        assert_eq!(store.current_field_type(), FieldType::Text);
        handle.set_field_type(FieldType::Image);
        assert_eq!(store.current_field_type(), FieldType::Image);
        assert!(!store.is_ready());
    }

    #[test]
    fn test_closure_source() {
        let source = || FieldType::Image;
        assert_eq!(source.current_field_type(), FieldType::Image);
    }

    #[tokio::test]
    async fn test_ready_waits_for_hydration() {
        let (handle, store) = field_store();
        let waiter = store.clone();
        let task = tokio::spawn(async move { waiter.ready().await.is_ok() });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!task.is_finished());

        handle.hydrate(FieldType::Text);
        assert!(task.await.unwrap());
        assert!(store.is_ready());
        assert_eq!(store.state().current_field_type, FieldType::Text);
    }

    #[tokio::test]
    async fn test_ready_fails_when_store_dropped() {
        let (handle, store) = field_store();
        drop(handle);
        assert!(matches!(store.ready().await, Err(EngineError::StoreClosed)));
    }

    #[tokio::test]
    async fn test_ready_immediately_when_hydrated() {
        let (handle, store) = field_store();
        handle.hydrate(FieldType::Image);
        store.ready().await.unwrap();
        drop(handle);
        // Already hydrated state survives the writer going away
        store.ready().await.unwrap();
    }
}
