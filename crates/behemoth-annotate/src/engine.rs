//! Exclusive access to long-lived annotation engines.
//!
//! Engines are built once and reused for every document a stage sees. They
//! are not safe to call concurrently, so each one lives behind a guard that
//! admits exactly one document at a time.

use std::ops::{Deref, DerefMut};

use tokio::sync::{Mutex, MutexGuard};

pub struct EngineGuard<E> {
    name: String,
    engine: Mutex<E>,
}

/// Exclusive hold on an engine for the duration of one document.
pub struct EngineLease<'a, E> {
    inner: MutexGuard<'a, E>,
}

impl<E> Deref for EngineLease<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.inner
    }
}

impl<E> DerefMut for EngineLease<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.inner
    }
}

impl<E: Send> EngineGuard<E> {
    pub fn new(name: impl Into<String>, engine: E) -> Self {
        let name = name.into();
        tracing::debug!("Engine {} initialized", name);
        Self {
            name,
            engine: Mutex::new(engine),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the engine to be free and hold it until the lease is dropped.
    pub async fn acquire(&self) -> EngineLease<'_, E> {
        EngineLease {
            inner: self.engine.lock().await,
        }
    }

    /// Run `f` with exclusive access to the engine.
    pub async fn with<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        let mut lease = self.acquire().await;
        f(&mut lease)
    }

    pub fn into_inner(self) -> E {
        self.engine.into_inner()
    }
}
