//! Shared engine handle
//!
//! The engine itself does no locking. An adapter that receives calls from
//! several threads shares it through this handle, which admits one
//! operation at a time.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::command::{Command, Output};
use crate::engine::{Attributes, Engine};
use crate::error::Result;
use crate::record::InodeKind;
use crate::table::InodeId;

/// Cloneable, serialized access to one engine
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine
    pub fn with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        let mut engine = self.inner.lock();
        f(&mut engine)
    }

    pub fn execute(&self, command: Command) -> Result<Output> {
        self.with(|engine| engine.execute(command))
    }

    pub fn get_attributes(&self, path: &str) -> Result<Attributes> {
        self.with(|engine| engine.get_attributes(path))
    }

    pub fn list_children(&self, path: &str) -> Result<Vec<String>> {
        self.with(|engine| engine.list_children(path))
    }

    pub fn create_entry(&self, path: &str, kind: InodeKind) -> Result<InodeId> {
        self.with(|engine| engine.create_entry(path, kind))
    }

    pub fn remove_entry(&self, path: &str) -> Result<()> {
        self.with(|engine| engine.remove_entry(path))
    }

    pub fn rename_entry(&self, from: &str, to: &str) -> Result<()> {
        self.with(|engine| engine.rename_entry(from, to))
    }

    pub fn resize(&self, path: &str, new_size: u64) -> Result<()> {
        self.with(|engine| engine.resize(path, new_size))
    }

    pub fn read_bytes(&self, path: &str, buf: &mut [u8]) -> Result<usize> {
        self.with(|engine| engine.read_bytes(path, buf))
    }

    pub fn write_bytes(&self, path: &str, data: &[u8]) -> Result<usize> {
        self.with(|engine| engine.write_bytes(path, data))
    }

    pub fn update_times(&self, path: &str, accessed: Option<i64>) -> Result<()> {
        self.with(|engine| engine.update_times(path, accessed))
    }

    /// Take the engine back once every other handle is dropped
    pub fn into_inner(self) -> Option<Engine> {
        Arc::try_unwrap(self.inner).ok().map(Mutex::into_inner)
    }
}
