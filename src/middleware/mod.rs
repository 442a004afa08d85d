pub mod auth;

use axum::{middleware::from_fn_with_state, routing::MethodRouter};

use crate::app::AppState;

pub use auth::{require_admin, require_authenticated, AdminUser, AuthUser};

/// Authorization predicate attached to a route. Guards run in the order they
/// are listed and the first failure ends the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Authenticated,
    Admin,
}

pub const AUTHENTICATED: &[Guard] = &[Guard::Authenticated];
pub const ADMIN: &[Guard] = &[Guard::Authenticated, Guard::Admin];

pub fn guarded(state: &AppState, guards: &[Guard], route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    // Each layer wraps the previous one, so the last applied runs first
    guards.iter().rev().fold(route, |route, guard| match guard {
        Guard::Authenticated => route.route_layer(from_fn_with_state(state.clone(), require_authenticated)),
        Guard::Admin => route.route_layer(from_fn_with_state(state.clone(), require_admin)),
    })
}
