//! The log dispatcher: a registry of destinations that turns log calls into
//! items and fans them out.
//!
//! A [`Log`] never formats or performs I/O on the calling thread. Each
//! accepting destination receives the item through its own
//! [`write`](LogDestination::write), which only enqueues work.
//!
//! Calls tagged with a module are filtered twice. The module must be
//! registered with [`Log::register_module`] and the level must meet the
//! module's floor; then each destination applies its own floor. Calls
//! without a module skip the module check.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::destination::{FailureHandler, LogDestination, Metadata};
use crate::error::DestinationError;
use crate::item::{LogItem, Location};
use crate::level::Level;

/// Observes delivery failures from every destination of a [`Log`].
pub type ErrorHandler = Arc<dyn Fn(&DestinationError) + Send + Sync>;

/// Dispatches log calls to registered destinations.
pub struct Log {
    destinations: RwLock<Vec<Arc<dyn LogDestination>>>,
    /// Registered modules and their minimum levels.
    modules: RwLock<HashMap<String, Level>>,
    error_handler: Arc<RwLock<Option<ErrorHandler>>>,
    on_failure: FailureHandler,
}

impl Log {
    /// An empty dispatcher with no destinations, no modules and no error
    /// handler.
    pub fn new() -> Self {
        let error_handler: Arc<RwLock<Option<ErrorHandler>>> = Arc::new(RwLock::new(None));

        let handler = Arc::clone(&error_handler);
        let on_failure: FailureHandler = Arc::new(move |error: DestinationError| {
            tracing::warn!(
                destination = error.destination().unwrap_or("unknown"),
                error = %error,
                "Log delivery failed"
            );
            let handler = handler.read().clone();
            if let Some(handler) = handler {
                handler(&error);
            }
        });

        Self {
            destinations: RwLock::new(Vec::new()),
            modules: RwLock::new(HashMap::new()),
            error_handler,
            on_failure,
        }
    }

    /// The process-wide dispatcher used by the logging macros.
    pub fn global() -> &'static Log {
        static GLOBAL: OnceLock<Log> = OnceLock::new();
        GLOBAL.get_or_init(Log::new)
    }

    /// Add a destination. Returns `false` and leaves the registry unchanged
    /// when a destination with the same id is already registered.
    pub fn register(&self, destination: Arc<dyn LogDestination>) -> bool {
        let id = destination.id();
        let mut destinations = self.destinations.write();
        if destinations.iter().any(|d| d.id() == id) {
            tracing::debug!(destination = %id, "Destination already registered");
            return false;
        }
        destinations.push(destination);
        true
    }

    /// Remove every destination sharing `destination`'s id.
    pub fn unregister(&self, destination: &dyn LogDestination) -> bool {
        self.unregister_id(&destination.id())
    }

    /// Remove every destination with this id. Returns whether any was removed.
    pub fn unregister_id(&self, id: &str) -> bool {
        let mut destinations = self.destinations.write();
        let before = destinations.len();
        destinations.retain(|d| d.id() != id);
        destinations.len() != before
    }

    /// Remove every destination. Pending deliveries still complete.
    pub fn remove_all_destinations(&self) {
        self.destinations.write().clear();
    }

    /// Snapshot of the registered destinations, in registration order.
    pub fn destinations(&self) -> Vec<Arc<dyn LogDestination>> {
        self.destinations.read().clone()
    }

    /// Number of registered destinations.
    pub fn len(&self) -> usize {
        self.destinations.read().len()
    }

    /// Whether no destination is registered.
    pub fn is_empty(&self) -> bool {
        self.destinations.read().is_empty()
    }

    /// Accept calls tagged with `module` at or above `min_level`.
    ///
    /// Registering a module again replaces its floor; the previous floor is
    /// returned.
    pub fn register_module(&self, module: impl Into<String>, min_level: Level) -> Option<Level> {
        self.modules.write().insert(module.into(), min_level)
    }

    /// Stop accepting calls tagged with `module`. Returns whether it was
    /// registered.
    pub fn unregister_module(&self, module: &str) -> bool {
        self.modules.write().remove(module).is_some()
    }

    /// The floor of a registered module.
    pub fn module_level(&self, module: &str) -> Option<Level> {
        self.modules.read().get(module).copied()
    }

    /// Whether a call tagged with `module` at `level` passes the module
    /// filter. Unregistered modules never do.
    pub fn module_accepts(&self, module: &str, level: Level) -> bool {
        self.module_level(module)
            .is_some_and(|min_level| level.passes(min_level))
    }

    /// Install a handler that sees every delivery failure. Failures are
    /// also reported through `tracing` at warn level.
    pub fn set_error_handler(&self, handler: impl Fn(&DestinationError) + Send + Sync + 'static) {
        *self.error_handler.write() = Some(Arc::new(handler));
    }

    /// Remove the handler installed by [`set_error_handler`](Self::set_error_handler).
    pub fn clear_error_handler(&self) {
        *self.error_handler.write() = None;
    }

    /// Whether any registered destination accepts `level`.
    pub fn is_enabled(&self, level: Level) -> bool {
        self.destinations.read().iter().any(|d| d.accepts(level))
    }

    /// Build one item and hand it to every destination that accepts its
    /// level.
    ///
    /// `message` runs at most once, and not at all when no destination
    /// accepts `level`.
    pub fn log<M, F>(&self, level: Level, message: F, location: Location)
    where
        M: Into<String>,
        F: FnOnce() -> M,
    {
        self.dispatch(level, None, message, location);
    }

    /// Like [`log`](Self::log), tagging the item with a module name.
    ///
    /// Dropped, without evaluating `message`, unless the module is
    /// registered and `level` meets its floor.
    pub fn log_module<M, F>(&self, module: impl Into<String>, level: Level, message: F, location: Location)
    where
        M: Into<String>,
        F: FnOnce() -> M,
    {
        let module = module.into();
        if !self.module_accepts(&module, level) {
            return;
        }
        self.dispatch(level, Some(module), message, location);
    }

    /// Tag the item with `module` without consulting the module registry.
    ///
    /// Used by the `tracing` bridge, whose events are already filtered by
    /// the subscriber.
    pub(crate) fn log_tagged<M, F>(&self, module: String, level: Level, message: F, location: Location)
    where
        M: Into<String>,
        F: FnOnce() -> M,
    {
        self.dispatch(level, Some(module), message, location);
    }

    fn dispatch<M, F>(&self, level: Level, module: Option<String>, message: F, location: Location)
    where
        M: Into<String>,
        F: FnOnce() -> M,
    {
        let targets: Vec<_> = self
            .destinations
            .read()
            .iter()
            .filter(|d| d.accepts(level))
            .cloned()
            .collect();
        if targets.is_empty() {
            return;
        }

        let mut item = LogItem::new(level, message(), location);
        if let Some(module) = module {
            item = item.with_module(module);
        }

        let (last, rest) = match targets.split_last() {
            Some(split) => split,
            None => return,
        };
        for destination in rest {
            destination.write(item.clone(), Arc::clone(&self.on_failure));
        }
        last.write(item, Arc::clone(&self.on_failure));
    }

    /// Log a `verbose` message at the caller's location.
    #[track_caller]
    pub fn verbose<M: Into<String>>(&self, message: impl FnOnce() -> M) {
        self.log(Level::Verbose, message, Location::caller());
    }

    /// Log a `debug` message at the caller's location.
    #[track_caller]
    pub fn debug<M: Into<String>>(&self, message: impl FnOnce() -> M) {
        self.log(Level::Debug, message, Location::caller());
    }

    /// Log an `info` message at the caller's location.
    #[track_caller]
    pub fn info<M: Into<String>>(&self, message: impl FnOnce() -> M) {
        self.log(Level::Info, message, Location::caller());
    }

    /// Log a `warning` message at the caller's location.
    #[track_caller]
    pub fn warning<M: Into<String>>(&self, message: impl FnOnce() -> M) {
        self.log(Level::Warning, message, Location::caller());
    }

    /// Log an `error` message at the caller's location.
    #[track_caller]
    pub fn error<M: Into<String>>(&self, message: impl FnOnce() -> M) {
        self.log(Level::Error, message, Location::caller());
    }

    /// A handle that tags everything it logs with `module`.
    ///
    /// The handle goes through the module filter like
    /// [`log_module`](Self::log_module).
    pub fn module(&self, module: impl Into<String>) -> ModuleLog<'_> {
        ModuleLog {
            log: self,
            module: module.into(),
        }
    }

    /// Attach metadata to every destination that supports it.
    pub fn set_metadata(&self, metadata: &Metadata) {
        for destination in self.destinations() {
            destination.set_metadata(metadata, Arc::clone(&self.on_failure));
        }
    }

    /// Remove metadata keys from every destination that supports it.
    ///
    /// The built-in destinations only render metadata when it is set, so
    /// for them this does nothing.
    pub fn remove_metadata(&self, keys: &[String]) {
        for destination in self.destinations() {
            destination.remove_metadata(keys, Arc::clone(&self.on_failure));
        }
    }

    /// Block until every destination delivered what was logged so far.
    pub fn flush(&self) {
        for destination in self.destinations() {
            destination.flush();
        }
    }
}

impl Default for Log {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Log {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<String> = self.destinations.read().iter().map(|d| d.id()).collect();
        f.debug_struct("Log")
            .field("destinations", &ids)
            .field("modules", &*self.modules.read())
            .finish()
    }
}

/// Logs through a [`Log`] with a fixed module name.
#[derive(Debug)]
pub struct ModuleLog<'a> {
    log: &'a Log,
    module: String,
}

impl ModuleLog<'_> {
    /// The module every item is tagged with.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Log through the parent [`Log::log_module`].
    pub fn log<M: Into<String>>(&self, level: Level, message: impl FnOnce() -> M, location: Location) {
        self.log.log_module(self.module.as_str(), level, message, location);
    }

    /// Log a `verbose` message from this module at the caller's location.
    #[track_caller]
    pub fn verbose<M: Into<String>>(&self, message: impl FnOnce() -> M) {
        self.log(Level::Verbose, message, Location::caller());
    }

    /// Log a `debug` message from this module at the caller's location.
    #[track_caller]
    pub fn debug<M: Into<String>>(&self, message: impl FnOnce() -> M) {
        self.log(Level::Debug, message, Location::caller());
    }

    /// Log an `info` message from this module at the caller's location.
    #[track_caller]
    pub fn info<M: Into<String>>(&self, message: impl FnOnce() -> M) {
        self.log(Level::Info, message, Location::caller());
    }

    /// Log a `warning` message from this module at the caller's location.
    #[track_caller]
    pub fn warning<M: Into<String>>(&self, message: impl FnOnce() -> M) {
        self.log(Level::Warning, message, Location::caller());
    }

    /// Log an `error` message from this module at the caller's location.
    #[track_caller]
    pub fn error<M: Into<String>>(&self, message: impl FnOnce() -> M) {
        self.log(Level::Error, message, Location::caller());
    }
}

/// Log a formatted message at `level`, capturing file, function and line.
///
/// ```ignore
/// logline_core::log!(Level::Info, "connected to {}", peer);
/// logline_core::log!(logger: my_log, Level::Error, "lost {}", peer);
/// ```
///
/// The arguments are only formatted when some destination accepts `level`.
#[macro_export]
macro_rules! log {
    (logger: $logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, || ::std::format!($($arg)+), $crate::location!())
    };
    ($level:expr, $($arg:tt)+) => {
        $crate::log!(logger: $crate::Log::global(), $level, $($arg)+)
    };
}

/// [`log!`] at [`Level::Verbose`](crate::Level::Verbose).
#[macro_export]
macro_rules! verbose {
    (logger: $logger:expr, $($arg:tt)+) => { $crate::log!(logger: $logger, $crate::Level::Verbose, $($arg)+) };
    ($($arg:tt)+) => { $crate::log!($crate::Level::Verbose, $($arg)+) };
}

/// [`log!`] at [`Level::Debug`](crate::Level::Debug).
#[macro_export]
macro_rules! debug {
    (logger: $logger:expr, $($arg:tt)+) => { $crate::log!(logger: $logger, $crate::Level::Debug, $($arg)+) };
    ($($arg:tt)+) => { $crate::log!($crate::Level::Debug, $($arg)+) };
}

/// [`log!`] at [`Level::Info`](crate::Level::Info).
#[macro_export]
macro_rules! info {
    (logger: $logger:expr, $($arg:tt)+) => { $crate::log!(logger: $logger, $crate::Level::Info, $($arg)+) };
    ($($arg:tt)+) => { $crate::log!($crate::Level::Info, $($arg)+) };
}

/// [`log!`] at [`Level::Warning`](crate::Level::Warning).
#[macro_export]
macro_rules! warning {
    (logger: $logger:expr, $($arg:tt)+) => { $crate::log!(logger: $logger, $crate::Level::Warning, $($arg)+) };
    ($($arg:tt)+) => { $crate::log!($crate::Level::Warning, $($arg)+) };
}

/// [`log!`] at [`Level::Error`](crate::Level::Error).
#[macro_export]
macro_rules! error {
    (logger: $logger:expr, $($arg:tt)+) => { $crate::log!(logger: $logger, $crate::Level::Error, $($arg)+) };
    ($($arg:tt)+) => { $crate::log!($crate::Level::Error, $($arg)+) };
}
