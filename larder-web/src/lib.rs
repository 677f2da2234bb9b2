//! larder-web library - household inventory web controller
//!
//! Session-authenticated HTML pages over the pantry files: dashboard,
//! adding and taking stock, shopping list, recipe suggestions and notes.

use std::sync::Arc;

use axum::Router;
use larder_common::db::UserStore;
use larder_common::Pantry;

pub mod api;
pub mod error;
pub mod pages;
pub mod services;
pub mod session;

pub use error::{ApiError, ApiResult};

use services::{AddDelegate, RecipeAdvisor};
use session::SessionStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Inventory and standard-item files
    pub pantry: Arc<Pantry>,
    /// Account credentials
    pub users: Arc<dyn UserStore>,
    /// Login sessions and flash messages
    pub sessions: SessionStore,
    /// Recipe suggestion source
    pub advisor: Arc<dyn RecipeAdvisor>,
    /// Where the add form sends new records
    pub add_delegate: Arc<dyn AddDelegate>,
}

impl AppState {
    pub fn new(
        pantry: Arc<Pantry>,
        users: Arc<dyn UserStore>,
        advisor: Arc<dyn RecipeAdvisor>,
        add_delegate: Arc<dyn AddDelegate>,
    ) -> Self {
        Self {
            pantry,
            users,
            sessions: SessionStore::new(),
            advisor,
            add_delegate,
        }
    }
}

/// Build application router
///
/// Page routes run inside the session layer; everything except login, signup
/// and logout additionally requires a logged-in session. Health and static
/// assets bypass sessions entirely.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;
    use tower_http::trace::TraceLayer;

    // Protected routes (require login)
    let protected = Router::new()
        .route("/home", get(api::home))
        .route("/add", get(api::add_page).post(api::add_ingredient))
        .route("/taking", get(api::taking_page).post(api::take_ingredient))
        .route("/recipe", get(api::recipe_page))
        .route(
            "/shoppinglist",
            get(api::shopping_page).post(api::update_standard_items),
        )
        .route("/remove_singredient/:name", get(api::remove_standard_item))
        .route("/notes", get(api::notes_page))
        .route("/change", get(api::change_page).post(api::change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_login,
        ));

    // Public pages
    let public = Router::new()
        .route("/", get(api::login_page).post(api::login))
        .route("/signup", get(api::signup_page).post(api::signup))
        .route("/logout", get(api::logout));

    let pages = Router::new()
        .merge(protected)
        .merge(public)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ));

    Router::new()
        .merge(pages)
        .merge(api::health_routes())
        .merge(api::static_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
