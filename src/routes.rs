use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{auth, note, retreat, servantee, shared::AppState, user};

/// Builds the full application router.
///
/// Three tiers: public auth endpoints, bearer-protected resource endpoints,
/// and the admin-only user-management subtree. `jwt_auth` runs on everything
/// protected; `require_admin` additionally gates the user subtree, so a
/// missing token is always 401 before any role check.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh));

    let admin = Router::new()
        .route("/users", post(user::create_user).get(user::list_users))
        .route(
            "/users/:id",
            get(user::get_user)
                .patch(user::update_user)
                .delete(user::delete_user),
        )
        .route_layer(middleware::from_fn(auth::require_admin));

    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/profile", get(auth::profile))
        .route(
            "/servantees",
            post(servantee::create_servantee).get(servantee::list_servantees),
        )
        .route(
            "/servantees/:id",
            get(servantee::get_servantee)
                .patch(servantee::update_servantee)
                .delete(servantee::delete_servantee),
        )
        .route(
            "/retreats",
            post(retreat::create_retreat).get(retreat::list_retreats),
        )
        .route(
            "/retreats/:id",
            get(retreat::get_retreat)
                .patch(retreat::update_retreat)
                .delete(retreat::delete_retreat),
        )
        .route(
            "/retreats/servantee/:id",
            get(retreat::get_retreats_for_servantee),
        )
        .route("/notes", post(note::create_note))
        .route(
            "/notes/:id",
            get(note::get_note)
                .patch(note::update_note)
                .delete(note::delete_note),
        )
        .route("/notes/servantee/:id", get(note::get_notes_for_servantee))
        .route("/notes/retreat/:id", get(note::get_notes_for_retreat))
        .merge(admin)
        .layer(middleware::from_fn_with_state(state.clone(), auth::jwt_auth));

    Router::new().merge(public).merge(protected).with_state(state)
}
