//! Application state and router assembly.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post, MethodRouter},
    Router,
};

use crate::auth::{protect, restrict_to, PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::handlers;
use crate::middleware::{error_name_middleware, request_time_middleware};
use crate::models::{self, EntitySchema};
use crate::resource::ResourceHandler;
use crate::services::Mailer;
use crate::store::Store;
use crate::types::Role;

const ADMIN: &[Role] = &[Role::Admin];
const MANAGERS: &[Role] = &[Role::Admin, Role::LeadGuide];
const STAFF: &[Role] = &[Role::Admin, Role::LeadGuide, Role::Guide];
const CUSTOMERS: &[Role] = &[Role::User];
const REVIEW_EDITORS: &[Role] = &[Role::User, Role::Admin];

/// One resource handler per entity
pub struct Resources {
    pub tours: ResourceHandler,
    pub users: ResourceHandler,
    pub reviews: ResourceHandler,
    pub bookings: ResourceHandler,
}

impl Resources {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        let handler = |schema: &'static EntitySchema| {
            ResourceHandler::new(
                schema,
                store.clone(),
                models::pipeline_for(schema, config),
                config.query.clone(),
            )
        };

        Self {
            tours: handler(models::tours()).with_get_expansion(models::tour_reviews()),
            users: handler(models::users()),
            reviews: handler(models::reviews()),
            bookings: handler(models::bookings()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub passwords: PasswordHasher,
    pub mailer: Arc<dyn Mailer>,
    pub resources: Arc<Resources>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        let resources = Arc::new(Resources::new(store.clone(), &config));
        Self {
            tokens: TokenService::from_config(&config.security),
            passwords: PasswordHasher::new(config.security.bcrypt_cost),
            config: Arc::new(config),
            store,
            mailer,
            resources,
        }
    }
}

fn protected(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.layer(middleware::from_fn_with_state(state.clone(), protect))
}

fn restricted(state: &AppState, roles: &'static [Role], route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    protected(state, route.layer(middleware::from_fn_with_state(roles, restrict_to)))
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(tour_routes(&state))
        .merge(review_routes(&state))
        .merge(booking_routes(&state))
        .merge(user_routes(&state));

    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(request_time_middleware));

    if state.config.environment.is_development() {
        router = router.layer(middleware::from_fn(error_name_middleware));
    }

    crate::middleware::http::apply(router.with_state(state.clone()), &state.config)
}

fn tour_routes(state: &AppState) -> Router<AppState> {
    use handlers::{reviews, tours};

    Router::new()
        .route("/tours/top-5-cheap", get(tours::top_five_cheap))
        .route("/tours/stats", get(tours::stats))
        .route("/tours/monthly-plan/:year", restricted(state, STAFF, get(tours::monthly_plan)))
        .route("/tours/tours-within/:distance/center/:latlng/unit/:unit", get(tours::within))
        .route("/tours/distances/:latlng/unit/:unit", get(tours::distances))
        .route(
            "/tours",
            get(tours::list).merge(restricted(state, MANAGERS, post(tours::create))),
        )
        .route(
            "/tours/:id",
            get(tours::get).merge(restricted(
                state,
                MANAGERS,
                patch(tours::update).delete(tours::delete),
            )),
        )
        .route(
            "/tours/:id/reviews",
            protected(state, get(reviews::list_for_tour))
                .merge(restricted(state, CUSTOMERS, post(reviews::create_for_tour))),
        )
}

fn review_routes(state: &AppState) -> Router<AppState> {
    use handlers::reviews;

    Router::new()
        .route(
            "/reviews",
            protected(state, get(reviews::list)).merge(restricted(state, CUSTOMERS, post(reviews::create))),
        )
        .route(
            "/reviews/:id",
            protected(state, get(reviews::get)).merge(restricted(
                state,
                REVIEW_EDITORS,
                patch(reviews::update).delete(reviews::delete),
            )),
        )
}

fn booking_routes(state: &AppState) -> Router<AppState> {
    use handlers::bookings;

    Router::new()
        .route("/bookings/mine", protected(state, get(bookings::mine)))
        .route(
            "/bookings",
            restricted(state, MANAGERS, get(bookings::list).post(bookings::create)),
        )
        .route(
            "/bookings/:id",
            restricted(
                state,
                MANAGERS,
                get(bookings::get).patch(bookings::update).delete(bookings::delete),
            ),
        )
}

fn user_routes(state: &AppState) -> Router<AppState> {
    use handlers::{auth, users};

    Router::new()
        // Public account routes
        .route("/users/signup", post(auth::signup))
        .route("/users/login", post(auth::login))
        .route("/users/logout", get(auth::logout))
        .route("/users/forgot-password", post(auth::forgot_password))
        .route("/users/reset-password/:token", patch(auth::reset_password))
        // Signed-in account routes
        .route("/users/update-my-password", protected(state, patch(auth::update_my_password)))
        .route("/users/me", protected(state, get(users::me)))
        .route("/users/update-my-data", protected(state, patch(users::update_my_data)))
        .route("/users/deactivate-account", protected(state, delete(users::deactivate_account)))
        // Administration
        .route("/users", restricted(state, ADMIN, get(users::list)))
        .route(
            "/users/:id",
            restricted(state, ADMIN, get(users::get).patch(users::update).delete(users::delete)),
        )
}
