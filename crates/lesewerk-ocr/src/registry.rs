// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine registry — lazy, construct-once access to recognition engines.
//
// Engine construction is expensive (model loading), so constructed engines
// are cached for the lifetime of the registry. The registry is owned by the
// service and passed by reference into each pipeline run; it is never a
// process global.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use lesewerk_core::error::{LesewerkError, Result};
use tracing::{debug, info};

use crate::engine::TextRecognizer;

/// Builds one engine instance on first use.
type EngineFactory = Box<dyn Fn() -> Result<Arc<dyn TextRecognizer>> + Send + Sync>;

/// Registry of available recognition engines.
///
/// Distinguishes three situations the error taxonomy keeps apart:
/// an identifier nobody registered (`UnsupportedEngine`, a configuration
/// error), a registered engine whose factory cannot produce an instance
/// (`EngineUnavailable`, e.g. missing model files), and a constructed engine
/// failing a call (`EngineFailed`, surfaced by the engine itself).
pub struct EngineRegistry {
    factories: HashMap<String, EngineFactory>,
    /// Constructed engines, keyed by identifier. The mutex is held across
    /// construction so that concurrent first uses build exactly one instance.
    cache: Mutex<HashMap<String, Arc<dyn TextRecognizer>>>,
}

impl EngineRegistry {
    /// Create a registry with the built-in engines registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_builtin_engines();
        registry
    }

    /// Create a registry with no engines (callers register their own).
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn register_builtin_engines(&mut self) {
        #[cfg(feature = "ocrs")]
        self.register("ocrs", || {
            let engine = crate::ocrs::OcrsRecognizer::new(crate::ocrs::OcrsConfig::default())?;
            Ok(Arc::new(engine) as Arc<dyn TextRecognizer>)
        });

        // Without the feature the identifier stays known, so a request for
        // it reports installed-but-unavailable rather than unsupported.
        #[cfg(not(feature = "ocrs"))]
        self.register("ocrs", || {
            Err(LesewerkError::EngineUnavailable {
                engine: "ocrs".into(),
                reason: "built without the `ocrs` feature".into(),
            })
        });
    }

    /// Register an engine factory under an identifier.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Arc<dyn TextRecognizer>> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
    }

    /// Register an already-constructed engine (used for injected
    /// capabilities and in tests).
    pub fn register_instance(&mut self, recognizer: Arc<dyn TextRecognizer>) {
        let id = recognizer.id().to_string();
        self.cache
            .lock()
            .expect("engine cache lock poisoned")
            .insert(id.clone(), Arc::clone(&recognizer));
        self.factories
            .insert(id, Box::new(move || Ok(Arc::clone(&recognizer))));
    }

    /// Identifiers this registry knows about, sorted.
    pub fn supported(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Fail fast on unknown identifiers, before any page work starts.
    pub fn ensure_supported(&self, ids: &[String]) -> Result<()> {
        for id in ids {
            if !self.factories.contains_key(id) {
                return Err(LesewerkError::UnsupportedEngine(id.clone()));
            }
        }
        Ok(())
    }

    /// Get the engine for an identifier, constructing it on first use.
    pub fn recognizer(&self, id: &str) -> Result<Arc<dyn TextRecognizer>> {
        let mut cache = self.cache.lock().expect("engine cache lock poisoned");
        if let Some(engine) = cache.get(id) {
            debug!(engine = id, "engine cache hit");
            return Ok(Arc::clone(engine));
        }

        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| LesewerkError::UnsupportedEngine(id.to_string()))?;

        info!(engine = id, "constructing OCR engine");
        let engine = factory()?;
        cache.insert(id.to_string(), Arc::clone(&engine));
        Ok(engine)
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}
