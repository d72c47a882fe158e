use axum::{
    Router,
    routing::{get, post},
};

use super::{
    annotations::AnnotationsApi, api_token::ApiTokenLayer, auth::AuthApi, dataset::DatasetApi,
    documents::DocumentsApi, labels::LabelsApi, projects::ProjectsApi, stats::StatsApi,
    users::UsersApi,
};
use crate::state::AppState;

pub async fn routes(app_state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/logout", post(AuthApi::logout))
        .route("/users", get(UsersApi::list).post(UsersApi::create))
        // Projects
        .route("/projects", get(ProjectsApi::list).post(ProjectsApi::create))
        .route(
            "/projects/{id}",
            get(ProjectsApi::get)
                .put(ProjectsApi::update)
                .patch(ProjectsApi::update)
                .delete(ProjectsApi::remove),
        )
        .route("/projects/{id}/progress", get(ProjectsApi::progress))
        .route("/projects/{id}/stats", get(StatsApi::get))
        // Labels
        .route(
            "/projects/{id}/labels",
            get(LabelsApi::list).post(LabelsApi::create),
        )
        .route(
            "/projects/{id}/labels/{label_id}",
            get(LabelsApi::get)
                .put(LabelsApi::update)
                .patch(LabelsApi::update)
                .delete(LabelsApi::remove),
        )
        // Documents
        .route(
            "/projects/{id}/docs",
            get(DocumentsApi::list).post(DocumentsApi::create),
        )
        .route("/projects/{id}/docs/upload", post(DatasetApi::upload))
        .route("/projects/{id}/docs/download", get(DatasetApi::download))
        // Annotations
        .route(
            "/projects/{id}/docs/{doc_id}/annotations",
            get(AnnotationsApi::list).post(AnnotationsApi::create),
        )
        .route(
            "/projects/{id}/docs/{doc_id}/annotations/{annotation_id}",
            get(AnnotationsApi::get)
                .put(AnnotationsApi::update)
                .patch(AnnotationsApi::update)
                .delete(AnnotationsApi::remove),
        )
        .route_layer(ApiTokenLayer::new(app_state.clone()));

    Router::new()
        .route("/auth/login", post(AuthApi::login))
        .route("/live", get(super::health::live))
        .route("/ready", get(super::health::ready))
        .merge(protected)
}
