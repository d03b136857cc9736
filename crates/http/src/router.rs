//! Router builder for the Book Manager HTTP server

use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    routing::get,
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use uuid::{NoContext, Timestamp, Uuid};

use bookman_kernel::ModuleRegistry;

use crate::error::AppError;

/// Builder for constructing the main HTTP router
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
        }
    }

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Mount a module's router under `/{module_name}`
    pub fn mount_module(mut self, module_name: &str, module_router: Router) -> Self {
        let path = format!("/{}", module_name);
        self.router = self.router.nest(&path, module_router);
        self
    }

    /// Answer unmatched paths with the JSON error body instead of an empty 404
    pub fn with_fallback(mut self) -> Self {
        self.router = self
            .router
            .fallback(|| async { AppError::not_found("Resource not found") });
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Add CORS middleware
    pub fn with_cors(mut self) -> Self {
        self.router = self.router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
        self
    }

    /// Tag each request with an `x-request-id` and echo it on the response
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));
        self
    }

    /// Answer requests that outlive `timeout_ms` with 408
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self.router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_millis(timeout_ms),
        ));
        self
    }

    /// Serve the merged OpenAPI document of all modules at `/docs/openapi.json`
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> Self {
        let openapi_spec = merged_openapi(registry);

        // Round-trip through utoipa so the served document is a well-formed OpenAPI 3.1 object.
        let document = match serde_json::from_value::<utoipa::openapi::OpenApi>(openapi_spec.clone())
        {
            Ok(openapi) => serde_json::to_value(openapi).unwrap_or(openapi_spec),
            Err(e) => {
                tracing::warn!(error = %e, "merged OpenAPI document does not parse; serving raw");
                openapi_spec
            }
        };

        self.router = self.router.route(
            "/docs/openapi.json",
            get(move || async move { axum::Json(document) }),
        );

        self
    }

    /// Build the final router
    pub fn build(self) -> Router {
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge every module's OpenAPI fragment into one document.
///
/// Module paths are prefixed with `/{module_name}`; a module path of `/` maps to the bare prefix.
pub fn merged_openapi(registry: &ModuleRegistry) -> serde_json::Value {
    let mut openapi_spec = serde_json::json!({
        "openapi": "3.1.0",
        "info": {
            "title": "Book Manager API",
            "version": crate::API_VERSION,
            "description": "A simple CRUD API for managing books"
        },
        "paths": {},
        "components": {
            "schemas": {}
        }
    });

    openapi_spec["components"]["schemas"]["ErrorResponse"] = serde_json::json!({
        "type": "object",
        "properties": {
            "error": {
                "type": "string"
            }
        },
        "required": ["error"]
    });

    openapi_spec["paths"]["/"] = serde_json::json!({
        "get": {
            "summary": "Service information",
            "responses": {
                "200": {
                    "description": "Service name and version",
                    "content": {
                        "application/json": {
                            "schema": {
                                "type": "object",
                                "properties": {
                                    "message": { "type": "string" },
                                    "version": { "type": "string" }
                                },
                                "required": ["message", "version"]
                            }
                        }
                    }
                }
            }
        }
    });

    openapi_spec["paths"]["/healthz"] = serde_json::json!({
        "get": {
            "summary": "Health check",
            "responses": {
                "200": {
                    "description": "OK",
                    "content": {
                        "text/plain": {
                            "schema": {
                                "type": "string"
                            }
                        }
                    }
                }
            }
        }
    });

    for module in registry.modules() {
        let Some(module_spec) = module.openapi() else {
            continue;
        };

        if let Some(paths) = module_spec.get("paths").and_then(|p| p.as_object()) {
            for (path, path_item) in paths {
                let prefixed_path = if path == "/" {
                    format!("/{}", module.name())
                } else {
                    format!("/{}{}", module.name(), path)
                };
                openapi_spec["paths"][prefixed_path] = path_item.clone();
            }
        }

        if let Some(schemas) = module_spec
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.as_object())
        {
            for (schema_name, schema_def) in schemas {
                openapi_spec["components"]["schemas"][schema_name] = schema_def.clone();
            }
        }
    }

    openapi_spec
}

/// UUID v7 request ids, sortable by creation time
#[derive(Clone, Copy)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let request_id = Uuid::new_v7(Timestamp::now(NoContext))
            .to_string()
            .parse::<HeaderValue>()
            .ok()?;
        Some(RequestId::new(request_id))
    }
}
