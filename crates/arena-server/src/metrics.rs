//! Metric name constants.
//!
//! Recorded through the `metrics` facade. The embedding binary installs
//! whichever recorder it wants; without one these are no-ops.

/// Events accepted by `fire_event` (counter).
pub const EVENTS_FIRED_TOTAL: &str = "arena_events_fired_total";
/// Events fired with no definition (counter).
pub const EVENTS_UNKNOWN_TOTAL: &str = "arena_events_unknown_total";
/// Delivery attempts dropped by routing (counter, labels: reason).
pub const ROUTING_DROPS_TOTAL: &str = "arena_routing_drops_total";
/// Broadcast enqueues dropped on full or closed queues (counter).
pub const WS_BROADCAST_DROPS_TOTAL: &str = "arena_ws_broadcast_drops_total";
/// Live client connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "arena_ws_connections_active";
/// Clients evicted for exceeding the drop threshold (counter).
pub const WS_SLOW_CLIENT_EVICTIONS_TOTAL: &str = "arena_ws_slow_client_evictions_total";
