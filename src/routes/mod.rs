//! Declarative route table and the router generated from it.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    middleware,
    routing::{get, on, post, MethodFilter, MethodRouter},
    Extension, Json, Router,
};
use serde_json::Value;

use crate::database::Collection;
use crate::handlers::{self, shapes, BodyContract, UniqueBy};
use crate::middleware::{jwt_auth_middleware, AuthClaims};
use crate::state::AppState;
use crate::types::{ClassStatus, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Patch,
}

impl Verb {
    fn filter(self) -> MethodFilter {
        match self {
            Verb::Get => MethodFilter::GET,
            Verb::Post => MethodFilter::POST,
            Verb::Patch => MethodFilter::PATCH,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Patch => "PATCH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Requires a valid bearer token when auth is enforced
    Protected,
}

/// Which generic handler shape serves a route, and with what parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create {
        collection: Collection,
        contract: BodyContract,
        unique_by: Option<UniqueBy>,
    },
    ListAll {
        collection: Collection,
    },
    RoleCheck {
        collection: Collection,
        key: &'static str,
        role: Role,
    },
    SetField {
        collection: Collection,
        field: &'static str,
        value: &'static str,
        upsert: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub verb: Verb,
    pub path: &'static str,
    pub action: Action,
    pub access: Access,
}

const SIGNUP: BodyContract = BodyContract {
    required: &["email"],
    forbidden: &["role"],
};

const CLASS_SUBMISSION: BodyContract = BodyContract {
    required: &[],
    forbidden: &["status"],
};

const USER_EMAIL: UniqueBy = UniqueBy {
    field: "email",
    message: "user already exists",
};

// Paths sharing a prefix must use the same parameter name, so the user
// routes take `:user` whether it carries an email (GET) or an id (PATCH).
pub const ROUTES: &[RouteSpec] = &[
    // Users
    RouteSpec {
        verb: Verb::Get,
        path: "/users/admin/:user",
        action: Action::RoleCheck { collection: Collection::Users, key: "admin", role: Role::Admin },
        access: Access::Public,
    },
    RouteSpec {
        verb: Verb::Get,
        path: "/users/instructor/:user",
        action: Action::RoleCheck { collection: Collection::Users, key: "instructor", role: Role::Instructor },
        access: Access::Public,
    },
    RouteSpec {
        verb: Verb::Post,
        path: "/users",
        action: Action::Create { collection: Collection::Users, contract: SIGNUP, unique_by: Some(USER_EMAIL) },
        access: Access::Public,
    },
    RouteSpec {
        verb: Verb::Get,
        path: "/users",
        action: Action::ListAll { collection: Collection::Users },
        access: Access::Public,
    },
    RouteSpec {
        verb: Verb::Patch,
        path: "/users/admin/:user",
        action: Action::SetField {
            collection: Collection::Users,
            field: "role",
            value: Role::Admin.as_str(),
            upsert: false,
        },
        access: Access::Protected,
    },
    RouteSpec {
        verb: Verb::Patch,
        path: "/users/instructor/:user",
        action: Action::SetField {
            collection: Collection::Users,
            field: "role",
            value: Role::Instructor.as_str(),
            upsert: false,
        },
        access: Access::Protected,
    },
    // Catalog
    RouteSpec {
        verb: Verb::Get,
        path: "/instructors",
        action: Action::ListAll { collection: Collection::Instructors },
        access: Access::Public,
    },
    RouteSpec {
        verb: Verb::Get,
        path: "/classes",
        action: Action::ListAll { collection: Collection::Classes },
        access: Access::Public,
    },
    // Selections
    RouteSpec {
        verb: Verb::Post,
        path: "/my-selected",
        action: Action::Create { collection: Collection::Selected, contract: BodyContract::ANY, unique_by: None },
        access: Access::Public,
    },
    RouteSpec {
        verb: Verb::Get,
        path: "/my-selected",
        action: Action::ListAll { collection: Collection::Selected },
        access: Access::Public,
    },
    // Instructor submissions
    RouteSpec {
        verb: Verb::Post,
        path: "/add-class",
        action: Action::Create { collection: Collection::AddedClasses, contract: CLASS_SUBMISSION, unique_by: None },
        access: Access::Public,
    },
    RouteSpec {
        verb: Verb::Get,
        path: "/add-class",
        action: Action::ListAll { collection: Collection::AddedClasses },
        access: Access::Public,
    },
    RouteSpec {
        verb: Verb::Get,
        path: "/manage-classes",
        action: Action::ListAll { collection: Collection::AddedClasses },
        access: Access::Public,
    },
    RouteSpec {
        verb: Verb::Patch,
        path: "/approved-classes/:id",
        action: Action::SetField {
            collection: Collection::AddedClasses,
            field: "status",
            value: ClassStatus::Approved.as_str(),
            upsert: true,
        },
        access: Access::Protected,
    },
    RouteSpec {
        verb: Verb::Patch,
        path: "/denied-classes/:id",
        action: Action::SetField {
            collection: Collection::AddedClasses,
            field: "status",
            value: ClassStatus::Denied.as_str(),
            upsert: true,
        },
        access: Access::Protected,
    },
];

impl RouteSpec {
    /// Bind this route's shape to a method router, with the token check
    /// layered on when the route is protected and enforcement is on
    fn method_router(&self, state: &AppState) -> MethodRouter<AppState> {
        let filter = self.verb.filter();

        let endpoint = match self.action {
            Action::Create { collection, contract, unique_by } => on(
                filter,
                move |State(state): State<AppState>, body: Result<Json<Value>, JsonRejection>| async move {
                    let Json(body) = body?;
                    shapes::create(&state, collection, contract, unique_by, body).await
                },
            ),
            Action::ListAll { collection } => on(filter, move |State(state): State<AppState>| async move {
                shapes::list_all(&state, collection).await
            }),
            Action::RoleCheck { collection, key, role } => on(
                filter,
                move |State(state): State<AppState>, Path(email): Path<String>| async move {
                    shapes::role_check(&state, collection, key, role, email).await
                },
            ),
            Action::SetField { collection, field, value, upsert } => on(
                filter,
                move |State(state): State<AppState>,
                      Path(id): Path<String>,
                      claims: Option<Extension<AuthClaims>>| async move {
                    let actor = claims.map(|Extension(claims)| claims);
                    shapes::set_field(&state, collection, field, value, upsert, id, actor).await
                },
            ),
        };

        if self.access == Access::Protected && state.enforce_auth {
            endpoint.route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware))
        } else {
            endpoint
        }
    }
}

/// Build the full application router over the given state
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/jwt", post(handlers::issue_token));

    for spec in ROUTES {
        tracing::debug!("Registering {} {} ({:?})", spec.verb.as_str(), spec.path, spec.access);
        router = router.route(spec.path, spec.method_router(&state));
    }

    router.with_state(state)
}
