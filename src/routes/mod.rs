/// Router Module Index
///
/// Organizes the gateway's routing into the two surfaces the Route Guard
/// distinguishes. Access control is not re-implemented per route: the guard
/// middleware layered over the whole router makes the redirect-or-continue
/// decision before any handler here runs.

/// Routes reachable without a session: auth entry points, session
/// introspection, and the health probe.
pub mod public;

/// The private application surface under `/app`. Unauthenticated requests
/// never reach these handlers; the guard has already redirected them.
pub mod app;
