use std::sync::Arc;

use axum::{
    Router,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
};
use murmur_common::views::ApiErrorResponse;
use murmur_db::storage::Storage;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info_span, warn};
use utoipa::{
    ToSchema,
    openapi::{Contact, Info, License, OpenApi, RefOr, path::Operation},
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{auth::SessionSigner, config::MurmurApiConfig, context::ApiContext, handlers};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the API router over `db`, along with its OpenAPI document.
///
/// # Errors
///
/// Fails when the configured session secret or public URL is unusable.
pub fn make(cfg: MurmurApiConfig, db: Arc<dyn Storage>) -> anyhow::Result<(Router, OpenApi)> {
    let signer = match cfg.session_secret_bytes()? {
        Some(secret) => SessionSigner::new(secret),
        None => {
            warn!("No session secret configured; sessions will not survive a restart");
            SessionSigner::random()
        }
    };
    let allowed_origin = cfg.public_url.parse::<HeaderValue>()?;

    let context = ApiContext::new(cfg, db, signer);

    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                // Log the request ID as generated
                let request_id = req.headers().get(REQUEST_ID_HEADER);
                let span = info_span!(
                    "http_request",
                    method = req.method().to_string(),
                    request_id = Option::<&str>::None,
                    path = Option::<&str>::None,
                );

                if let Some(request_id) = request_id.and_then(|id| id.to_str().ok()) {
                    span.record("request_id", request_id);
                };

                if let Some(path) = req.extensions().get::<MatchedPath>() {
                    span.record("path", path.as_str())
                } else {
                    span.record("path", req.uri().path())
                };

                span
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_credentials(true)
                .allow_origin(allowed_origin),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id));

    let openapi = OpenApi::builder()
        .info(
            Info::builder()
                .title("Murmur API Reference")
                .version(env!("CARGO_PKG_VERSION"))
                .license(Some(
                    License::builder()
                        .name("Apache 2.0 License")
                        .identifier(Some(env!("CARGO_PKG_LICENSE")))
                        .build(),
                ))
                .contact(Some(Contact::builder().name(Some("Murmur developers")).build())),
        )
        .build();

    let (r, mut a) = OpenApiRouter::with_openapi(openapi)
        .routes(routes!(handlers::health_check))
        .routes(routes!(handlers::auth::auth_login))
        .routes(routes!(handlers::auth::auth_logout))
        .routes(routes!(handlers::auth::auth_whoami))
        .routes(routes!(handlers::profile::update_profile))
        .routes(routes!(handlers::users::get_profile))
        .routes(routes!(handlers::users::list_user_posts))
        .routes(routes!(handlers::users::follow_user))
        .routes(routes!(handlers::users::unfollow_user))
        .routes(routes!(handlers::timeline::get_timeline))
        .routes(routes!(handlers::posts::create_post))
        .layer(middleware)
        .with_state(context)
        .split_for_parts();

    a.paths.paths.iter_mut().for_each(|(_path, item)| {
        apply_default_errors(&mut item.get);
        apply_default_errors(&mut item.post);
        apply_default_errors(&mut item.patch);
        apply_default_errors(&mut item.put);
        apply_default_errors(&mut item.delete);
        apply_default_errors(&mut item.trace);
        apply_default_errors(&mut item.head);
        apply_default_errors(&mut item.options);
    });

    Ok((r, a))
}

fn error_ref(summary: &str) -> RefOr<utoipa::openapi::Response> {
    RefOr::Ref(
        utoipa::openapi::Ref::builder()
            .summary(summary)
            .ref_location_from_schema_name(ApiErrorResponse::name())
            .build(),
    )
}

fn apply_default_errors(item: &mut Option<Operation>) {
    if let Some(item) = item {
        let responses = &mut item.responses.responses;
        responses.insert("401".into(), error_ref("Unauthorized"));
        responses.insert("500".into(), error_ref("Internal server error"));
        responses.insert("503".into(), error_ref("Store unavailable"));
    }
}
