//! Process-wide state for sdfr.
//!
//! The context interns material property names into [`PropertyId`]s so
//! renderer-facing consumers resolve each name once per process. It is
//! created by [`init_context`] and cleared by [`shutdown_context`].

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use crate::error::{Result, SdfrError};

/// Name of the shader a preview consumer uses to ray march baked fields.
pub const PREVIEW_SHADER_NAME: &str = "XRA/SDFr";

/// Global context singleton.
static CONTEXT: OnceLock<RwLock<Context>> = OnceLock::new();

/// Handle for an interned material property name.
///
/// Ids are stable for the lifetime of one context session. Each
/// [`init_context`] starts a new generation, and ids from an earlier one
/// never resolve again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId {
    generation: u32,
    index: u32,
}

impl PropertyId {
    /// Raw numeric value within its generation.
    #[must_use]
    pub fn raw(self) -> u32 {
        self.index
    }

    /// Context generation the id was interned in.
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// The global context containing all sdfr process state.
pub struct Context {
    /// Whether sdfr has been initialized.
    pub initialized: bool,

    /// Shader used by preview consumers.
    pub preview_shader: String,

    generation: u32,
    property_ids: HashMap<String, PropertyId>,
    property_names: Vec<String>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            initialized: false,
            preview_shader: PREVIEW_SHADER_NAME.to_string(),
            generation: 0,
            property_ids: HashMap::new(),
            property_names: Vec::new(),
        }
    }
}

impl Context {
    /// Returns the id for `name`, interning it on first use.
    pub fn intern_property(&mut self, name: &str) -> PropertyId {
        if let Some(id) = self.property_ids.get(name) {
            return *id;
        }
        let id = PropertyId {
            generation: self.generation,
            index: self.property_names.len() as u32,
        };
        self.property_names.push(name.to_string());
        self.property_ids.insert(name.to_string(), id);
        id
    }

    /// Returns the id for `name` if it has been interned.
    pub fn lookup_property(&self, name: &str) -> Option<PropertyId> {
        self.property_ids.get(name).copied()
    }

    /// Returns the name behind an interned id of the current generation.
    pub fn property_name(&self, id: PropertyId) -> Option<&str> {
        if id.generation != self.generation {
            return None;
        }
        self.property_names.get(id.index as usize).map(String::as_str)
    }

    /// Current generation, advanced by every initialization.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    fn start(&mut self) {
        self.initialized = true;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Number of interned property names.
    pub fn property_count(&self) -> usize {
        self.property_names.len()
    }

    fn clear(&mut self) {
        self.initialized = false;
        self.preview_shader = PREVIEW_SHADER_NAME.to_string();
        self.property_ids.clear();
        self.property_names.clear();
    }
}

/// Initializes the global context.
///
/// Fails with [`SdfrError::AlreadyInitialized`] if the context is live.
/// A context torn down by [`shutdown_context`] may be initialized again.
pub fn init_context() -> Result<()> {
    let lock = CONTEXT.get_or_init(|| RwLock::new(Context::default()));
    let mut ctx = lock.write().map_err(|_| SdfrError::NotInitialized)?;
    if ctx.initialized {
        return Err(SdfrError::AlreadyInitialized);
    }
    ctx.start();
    Ok(())
}

/// Returns whether the context has been initialized.
pub fn is_initialized() -> bool {
    CONTEXT
        .get()
        .and_then(|lock| lock.read().ok())
        .map_or(false, |ctx| ctx.initialized)
}

/// Access the global context for reading.
///
/// # Panics
///
/// Panics if sdfr has not been initialized.
pub fn with_context<F, R>(f: F) -> R
where
    F: FnOnce(&Context) -> R,
{
    try_with_context(f).expect("sdfr not initialized")
}

/// Access the global context for writing.
///
/// # Panics
///
/// Panics if sdfr has not been initialized.
pub fn with_context_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Context) -> R,
{
    try_with_context_mut(f).expect("sdfr not initialized")
}

/// Try to access the global context for reading.
///
/// Returns `None` if sdfr has not been initialized.
pub fn try_with_context<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&Context) -> R,
{
    let lock = CONTEXT.get()?;
    let guard = lock.read().ok()?;
    if !guard.initialized {
        return None;
    }
    Some(f(&guard))
}

/// Try to access the global context for writing.
///
/// Returns `None` if sdfr has not been initialized.
pub fn try_with_context_mut<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut Context) -> R,
{
    let lock = CONTEXT.get()?;
    let mut guard = lock.write().ok()?;
    if !guard.initialized {
        return None;
    }
    Some(f(&mut guard))
}

/// Resolves a material property name to its process-wide id.
pub fn property_id(name: &str) -> Result<PropertyId> {
    try_with_context_mut(|ctx| ctx.intern_property(name)).ok_or(SdfrError::NotInitialized)
}

/// Shuts down the global context, dropping every interned name.
///
/// Ids handed out before the shutdown stay invalid after a later
/// [`init_context`].
pub fn shutdown_context() {
    if let Some(lock) = CONTEXT.get() {
        if let Ok(mut ctx) = lock.write() {
            ctx.clear();
        }
    }
}
