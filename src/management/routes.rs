//! # 路由配置
//!
//! 定义所有 API 路由。每个业务路由组通过 `route_layer` 挂载所需权限的中间件。

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use crate::auth::PermissionKey;
use crate::management::handlers::{
    attendance, audit_logs, auth, franchises, roles, users,
};
use crate::management::middleware::{PermissionGuard, require_permission};
use crate::management::server::AppState;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 认证路由不经过权限中间件
        .nest("/auth", auth_routes())
        .nest(
            "/hr/users",
            gated(user_routes(), &state, PermissionKey::ManageUsers),
        )
        .nest(
            "/hr/franchises",
            gated(franchise_routes(), &state, PermissionKey::ManageFranchises),
        )
        .nest(
            "/hr/attendance",
            gated(attendance_routes(), &state, PermissionKey::ManageUsers),
        )
        .nest(
            "/roles",
            gated(
                Router::new().route("/", get(roles::get_roles)),
                &state,
                PermissionKey::ManageUsers,
            ),
        )
        .nest(
            "/franchises",
            gated(
                Router::new().route("/", get(franchises::franchise_options)),
                &state,
                PermissionKey::ManageUsers,
            ),
        )
        .nest(
            "/audit-logs",
            gated(
                Router::new().route("/", get(audit_logs::get_audit_logs)),
                &state,
                PermissionKey::ViewAuditLogs,
            ),
        )
        .with_state(state)
}

fn gated(
    routes: Router<AppState>,
    state: &AppState,
    key: PermissionKey,
) -> Router<AppState> {
    routes.route_layer(from_fn_with_state(
        PermissionGuard::new(state.clone(), key),
        require_permission,
    ))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route(
            "/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::deactivate_user),
        )
        .route("/{id}/reset-password", post(users::reset_password))
}

fn franchise_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(franchises::list_franchises).post(franchises::create_franchise),
        )
        .route(
            "/{id}",
            get(franchises::get_franchise)
                .put(franchises::update_franchise)
                .delete(franchises::suspend_franchise),
        )
}

fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(attendance::list_attendance))
        .route("/{user_id}", get(attendance::user_attendance))
}
