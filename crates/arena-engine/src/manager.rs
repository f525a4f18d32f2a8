//! `GameManager`: component registry and event dispatch entry point.

use std::collections::HashMap;
use std::sync::Arc;

use arena_core::logging::init_subscriber;
use arena_core::{
    ClientConnection, ConnectionDirectory, DispatchError, Event, EventDefinition,
};
use arena_server::Server;
use arena_server::metrics::{EVENTS_FIRED_TOTAL, EVENTS_UNKNOWN_TOTAL};
use arena_settings::ArenaSettings;
use dashmap::DashMap;
use metrics::counter;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, debug_span, error, instrument};

use crate::component::{Component, ManagerHandle};
use crate::dispatch::{Dispatch, deliver_external, deliver_internal};
use crate::registry::{EventDefinitions, EventHandler, Subscribers};

/// Owns the component, definition, and subscriber registries plus the
/// connection directory, and routes fired events between them.
///
/// Constructed once at startup and shared as `Arc<GameManager>`; components
/// hold a weak [`ManagerHandle`] back to it.
pub struct GameManager {
    components: DashMap<String, Arc<dyn Component>>,
    definitions: EventDefinitions,
    subscribers: Subscribers,
    directory: Arc<dyn ConnectionDirectory>,
    /// Slots in each new client's outbound queue.
    outbound_capacity: usize,
}

impl GameManager {
    /// Create a manager with default settings and an in-process [`Server`] directory.
    pub fn new() -> Arc<Self> {
        Self::with_settings(&ArenaSettings::default())
    }

    /// Create a manager configured from `settings`.
    pub fn with_settings(settings: &ArenaSettings) -> Arc<Self> {
        let directory = Arc::new(Server::with_max_dropped_messages(
            settings.server.max_dropped_messages,
        ));
        Self::with_directory(directory, settings.server.outbound_capacity)
    }

    /// Install the global log subscriber at `settings.logging.level`, then
    /// build a manager from `settings`.
    ///
    /// The usual entry point for a server binary.
    pub fn bootstrap(settings: &ArenaSettings) -> Arc<Self> {
        init_subscriber(&settings.logging.level);
        debug!(level = %settings.logging.level, "logging initialized");
        Self::with_settings(settings)
    }

    /// Create a manager around an existing connection directory.
    pub fn with_directory(
        directory: Arc<dyn ConnectionDirectory>,
        outbound_capacity: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            components: DashMap::new(),
            definitions: EventDefinitions::new(),
            subscribers: Subscribers::new(),
            directory,
            outbound_capacity: outbound_capacity.max(1),
        })
    }

    /// The connection directory.
    pub fn directory(&self) -> &Arc<dyn ConnectionDirectory> {
        &self.directory
    }

    // ─────────────────────────────────────────────────────────────────────
    // Components
    // ─────────────────────────────────────────────────────────────────────

    /// Store components by name, injecting the manager back-reference first.
    ///
    /// A name that is already present is replaced.
    pub fn add_components(self: &Arc<Self>, components: HashMap<String, Box<dyn Component>>) {
        for (name, mut component) in components {
            debug!(component = %name, "loading component");
            component.set_manager(ManagerHandle::new(self));
            let _ = self.components.insert(name, Arc::from(component));
        }
    }

    /// Store a single component by name.
    pub fn add_component<C>(self: &Arc<Self>, name: impl Into<String>, component: C)
    where
        C: Component + 'static,
    {
        let mut components: HashMap<String, Box<dyn Component>> = HashMap::new();
        let _ = components.insert(name.into(), Box::new(component));
        self.add_components(components);
    }

    /// Call `register` on every stored component.
    ///
    /// Order across components is unspecified. A failing component is logged
    /// and skipped; earlier registrations stay in place. Returns how many
    /// components registered successfully.
    #[instrument(skip(self))]
    pub fn register_components(&self) -> usize {
        // Snapshot so component setup can touch the manager without holding shard locks
        let components: Vec<(String, Arc<dyn Component>)> = self
            .components
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut registered = 0;
        for (name, component) in components {
            match component.register() {
                Ok(()) => {
                    registered += 1;
                    debug!(component = %name, "registered component");
                }
                Err(e) => error!(component = %name, error = %e, "component registration failed"),
            }
        }
        registered
    }

    /// Register every component and mark the game as started.
    pub fn run(&self) -> usize {
        let registered = self.register_components();
        debug!(components = self.components.len(), registered, "game has started");
        registered
    }

    /// Number of stored components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Whether a component is stored under `name`.
    pub fn has_component(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Events and handlers
    // ─────────────────────────────────────────────────────────────────────

    /// Register (or replace) the delivery policy for an event name.
    ///
    /// Every event must be defined before it is fired.
    pub fn define_event(&self, definition: EventDefinition) {
        debug!(event = %definition.name, internal = definition.internal, websocket = definition.websocket, broadcast = definition.broadcast, "event defined");
        self.definitions.define(definition);
    }

    /// The definition registered for `name`.
    pub fn definition(&self, name: &str) -> Option<EventDefinition> {
        self.definitions.get(name)
    }

    /// Append a subscriber for `name`. Handlers run in registration order.
    pub fn register_handler<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe(name, Arc::new(handler));
    }

    /// Append an already shared handler for `name`.
    pub fn subscribe(&self, name: impl Into<String>, handler: EventHandler) {
        self.subscribers.register(name, handler);
    }

    /// Number of subscribers for `name`.
    pub fn handler_count(&self, name: &str) -> usize {
        self.subscribers.count(name)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Clients
    // ─────────────────────────────────────────────────────────────────────

    /// Admit a client under `client_id` with a fresh outbound queue.
    ///
    /// Returns the receiver the transport's writer loop drains. A client
    /// already connected under the same id is replaced.
    pub async fn connect(&self, client_id: impl Into<String>) -> mpsc::Receiver<Arc<Event>> {
        let (client, rx) = ClientConnection::with_capacity(client_id, self.outbound_capacity);
        self.directory.register(Arc::new(client)).await;
        rx
    }

    /// Remove a client. Its writer loop ends once the queue drains.
    pub async fn disconnect(&self, client_id: &str) {
        self.directory.unregister(client_id).await;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────────────────────────────────

    /// Route `event` according to its definition.
    ///
    /// Returns as soon as the delivery paths are scheduled. The internal path
    /// runs every subscriber in order; the external path broadcasts or sends
    /// to `event.client_id`. The two paths run concurrently with no ordering
    /// between them. Path failures are logged inside the paths and reported
    /// through [`Dispatch::join`], never here.
    ///
    /// Errors only when nothing was scheduled: the name has no definition, or
    /// there is no Tokio runtime to spawn on.
    pub fn fire_event(&self, event: Event) -> Result<Dispatch, DispatchError> {
        let Some(definition) = self.definitions.get(&event.name) else {
            counter!(EVENTS_UNKNOWN_TOTAL).increment(1);
            error!(event = %event.name, "unable to locate a triggered event");
            return Err(DispatchError::UnknownEvent(event.name));
        };

        let Ok(runtime) = Handle::try_current() else {
            error!(event = %event.name, "fire_event called outside an async runtime");
            return Err(DispatchError::NoRuntime);
        };

        counter!(EVENTS_FIRED_TOTAL).increment(1);

        let internal = definition.internal.then(|| {
            let handlers = self.subscribers.snapshot(&event.name);
            let event = event.clone();
            let span = debug_span!("internal_dispatch", event = %event.name);
            runtime.spawn(async move { deliver_internal(&event, handlers) }.instrument(span))
        });

        let external = definition.websocket.then(|| {
            let directory = Arc::clone(&self.directory);
            let span = debug_span!("external_dispatch", event = %event.name, broadcast = definition.broadcast);
            runtime.spawn(
                deliver_external(directory, event.clone(), definition.broadcast).instrument(span),
            )
        });

        Ok(Dispatch::new(internal, external))
    }
}
