//! Gateway controller.
//!
//! # Responsibilities
//! - Resolve options and derive the route table once, at construction
//! - Mount one forwarding handler per `(route, method)` on a router
//! - Expose the API descriptor and read-only configuration snapshots
//!
//! # Design Decisions
//! - Construction fails on the first configuration error; a controller that
//!   exists is always mountable
//! - Everything derived here is immutable; only the hook set can change, and
//!   only through [`HookDispatcher`]
//! - Collaborators (transport, downstream) are swappable before mounting

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::schema::{GatewayConfig, GatewayOptions, GatewayOptionsOverrides, ListenerConfig};
use crate::config::source::ConfigSource;
use crate::error::{ConfigurationError, Downstream, RenderError};
use crate::gateway::descriptor::{describe, substitute_placeholders, ApiDescriptor, DescribeOptions};
use crate::gateway::endpoint::{flatten, FlatEndpoints};
use crate::gateway::hooks::{EndpointHooks, HookDispatcher};
use crate::gateway::pipeline::{ForwardingPipeline, PipelineShared};
use crate::gateway::routes::{build_routes, trim_slashes, Route};
use crate::http::headers::HeaderPolicy;
use crate::http::transport::{HttpTransport, HyperTransport};
use crate::routing::matcher::MountMatcher;
use crate::routing::registrar::{EndpointHandler, Middleware, RouteRegistrar};

/// Arguments of [`GatewayController::api_config`].
#[derive(Debug, Clone, Default)]
pub struct ApiConfigRequest {
    /// Wrapper key; defaults to the configured `api_config_setting`.
    pub setting: Option<String>,
    /// Values for `:name` segments of the mount route.
    pub placeholders: HashMap<String, String>,
}

/// Forwards a mount route's traffic to one upstream API.
pub struct GatewayController {
    mount_route: String,
    gateway: Arc<GatewayConfig>,
    options: GatewayOptions,
    endpoints: FlatEndpoints,
    routes: Vec<Route>,
    shared: PipelineShared,
}

impl GatewayController {
    pub fn new(
        mount_route: impl Into<String>,
        gateway: GatewayConfig,
        overrides: &GatewayOptionsOverrides,
    ) -> Result<Self, ConfigurationError> {
        let mount_route = mount_route.into();
        let gateway = Arc::new(gateway.normalized());
        let options = GatewayOptions::merge(&GatewayOptions::default(), overrides);

        let endpoints = flatten(&gateway.gateway);
        let routes = build_routes(&endpoints, &options.root)?;
        let headers = HeaderPolicy::from_options(&options.headers)?;

        tracing::info!(
            mount = %mount_route,
            upstream = %gateway.url,
            root = %options.root,
            endpoints = endpoints.len(),
            routes = routes.len(),
            "Gateway controller built"
        );

        let shared = PipelineShared {
            gateway: gateway.clone(),
            matcher: Arc::new(MountMatcher::new(&mount_route, &options.root)),
            headers: Arc::new(headers),
            hooks: HookDispatcher::default(),
            transport: Arc::new(HyperTransport::new()),
            downstream: Arc::new(RenderError),
            body_limit: ListenerConfig::default().max_body_bytes,
        };

        Ok(Self {
            mount_route,
            gateway,
            options,
            endpoints,
            routes,
            shared,
        })
    }

    /// Build from the gateway declaration stored under `setting`.
    pub fn from_source(
        source: &dyn ConfigSource,
        setting: &str,
        mount_route: impl Into<String>,
        overrides: &GatewayOptionsOverrides,
    ) -> Result<Self, ConfigurationError> {
        let gateway = source.gateway_config(setting)?;
        Self::new(mount_route, gateway, overrides)
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.shared.transport = transport;
        self
    }

    pub fn with_downstream(mut self, downstream: Arc<dyn Downstream>) -> Self {
        self.shared.downstream = downstream;
        self
    }

    pub fn with_hooks(self, hooks: EndpointHooks) -> Self {
        self.shared.hooks.install(hooks);
        self
    }

    /// Largest inbound body read before forwarding.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.shared.body_limit = limit;
        self
    }

    /// Handle to the hook set shared by every mounted handler.
    pub fn hooks(&self) -> &HookDispatcher {
        &self.shared.hooks
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn mount_route(&self) -> &str {
        &self.mount_route
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    pub fn gateway_config(&self) -> &GatewayConfig {
        &self.gateway
    }

    /// Client-facing descriptor of the mounted endpoints.
    pub fn api_config(&self, request: ApiConfigRequest) -> ApiDescriptor {
        let setting = request
            .setting
            .as_deref()
            .unwrap_or(&self.options.api_config_setting);

        let mut descriptor = describe(
            &self.endpoints,
            &self.mount_route,
            DescribeOptions {
                root: &self.options.root,
                api_config_setting: setting,
            },
        );
        descriptor.url = substitute_placeholders(&descriptor.url, &request.placeholders);
        descriptor
    }

    /// Mount every route on `router`.
    pub fn add_routes<R: RouteRegistrar>(&self, router: R) -> Result<R, ConfigurationError> {
        self.add_routes_with(router, Vec::new())
    }

    /// Mount every route, running `middlewares` ahead of each forwarding handler.
    pub fn add_routes_with<R: RouteRegistrar>(
        &self,
        mut router: R,
        middlewares: Vec<Middleware>,
    ) -> Result<R, ConfigurationError> {
        let middlewares: Arc<[Middleware]> = middlewares.into();

        for route in &self.routes {
            for registered in &route.methods {
                let pipeline =
                    ForwardingPipeline::new(registered.endpoint.clone(), self.shared.clone());
                let handler = EndpointHandler::new(middlewares.clone(), Arc::new(pipeline));

                tracing::debug!(
                    mount = %trim_slashes(&self.mount_route),
                    route = %route.route,
                    method = %registered.method,
                    endpoint = %registered.endpoint.name,
                    "Mounting endpoint"
                );
                router = router.register(registered.method, &route.route, handler)?;
            }
        }

        Ok(router)
    }
}

impl std::fmt::Debug for GatewayController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayController")
            .field("mount_route", &self.mount_route)
            .field("gateway", &self.gateway)
            .field("options", &self.options)
            .field("routes", &self.routes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::endpoint::{EndpointDefinition, EndpointEntry, EndpointNode, EndpointTree};
    use crate::gateway::method::HttpMethod;
    use serde_json::json;

    /// Records registrations instead of serving them.
    #[derive(Default)]
    struct RecordingRouter {
        registered: Vec<(HttpMethod, String, String)>,
    }

    impl RouteRegistrar for RecordingRouter {
        fn register(
            mut self,
            method: HttpMethod,
            path: &str,
            handler: EndpointHandler,
        ) -> Result<Self, ConfigurationError> {
            self.registered
                .push((method, path.to_string(), handler.endpoint_name().to_string()));
            Ok(self)
        }
    }

    fn build(mount: &str, gateway: GatewayConfig) -> GatewayController {
        GatewayController::new(mount, gateway, &GatewayOptionsOverrides::default()).unwrap()
    }

    fn scenario() -> GatewayConfig {
        let tree: EndpointTree = [
            ("endpointOne", EndpointNode::Path("/my-path/one".into())),
            (
                "endpointTwo",
                EndpointNode::Definition(EndpointDefinition::new("/my-path/two", Some("post"))),
            ),
        ]
        .into_iter()
        .collect();
        GatewayConfig::new("http://api.internal", tree)
    }

    #[test]
    fn test_registers_scenario_routes() {
        let controller = build("/my-gateway", scenario());
        let router = controller.add_routes(RecordingRouter::default()).unwrap();

        assert_eq!(
            router.registered,
            vec![
                (HttpMethod::All, "/my-path/one".to_string(), "endpointOne".to_string()),
                (HttpMethod::Post, "/my-path/two".to_string(), "endpointTwo".to_string()),
            ]
        );
    }

    #[test]
    fn test_scenario_api_config() {
        let controller = build("/my-gateway", scenario());
        let descriptor = controller.api_config(ApiConfigRequest::default());

        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({
                "url": "/my-gateway",
                "endpoints": {
                    "api": {
                        "endpointOne": "/my-path/one",
                        "endpointTwo": {"path": "/my-path/two", "method": "post"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_api_config_setting_and_placeholders() {
        let controller = build("/tenants/:tenant/gw", scenario());
        let descriptor = controller.api_config(ApiConfigRequest {
            setting: Some("billing".into()),
            placeholders: HashMap::from([("tenant".to_string(), "acme".to_string())]),
        });

        assert_eq!(descriptor.url, "/tenants/acme/gw");
        assert!(descriptor.endpoints.get("billing").is_some());
        assert!(descriptor.endpoints.get("api").is_none());
    }

    #[test]
    fn test_root_prefixes_routes() {
        let overrides = GatewayOptionsOverrides {
            root: Some("my-root".into()),
            ..Default::default()
        };
        let controller = GatewayController::new("/my-gateway", scenario(), &overrides).unwrap();
        let router = controller.add_routes(RecordingRouter::default()).unwrap();

        assert_eq!(router.registered[0].1, "/my-root/my-path/one");
        assert_eq!(router.registered[0].0, HttpMethod::All);
        assert_eq!(controller.options().root, "my-root");
    }

    #[test]
    fn test_duplicate_endpoint_aborts_construction() {
        let mut tree = EndpointTree::new();
        tree.insert("users", EndpointNode::Path("/users".into()));
        tree.insert(
            "people",
            EndpointNode::Definition(EndpointDefinition::new("users/", Some("bogus"))),
        );

        let err = GatewayController::new(
            "/gw",
            GatewayConfig::new("http://up", tree),
            &GatewayOptionsOverrides::default(),
        )
        .unwrap_err();
        match err {
            ConfigurationError::DuplicateEndpoint { existing, duplicate, .. } => {
                assert_eq!(existing, "users");
                assert_eq!(duplicate, "people");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parameter_names_register_one_path() {
        let tree: EndpointTree = serde_json::from_value(json!({
            "getUser": { "path": "/users/:id", "method": "get" },
            "updateUser": { "path": "/users/:userId", "method": "put" }
        }))
        .unwrap();
        let controller = build("/gw", GatewayConfig::new("http://up", tree));
        let router = controller.add_routes(RecordingRouter::default()).unwrap();

        assert_eq!(
            router.registered,
            vec![
                (HttpMethod::Get, "/users/:id".to_string(), "getUser".to_string()),
                (HttpMethod::Put, "/users/:id".to_string(), "updateUser".to_string()),
            ]
        );
    }

    #[test]
    fn test_mounts_merged_routes_on_axum_router() {
        let tree: EndpointTree = serde_json::from_value(json!({
            "getUser": { "path": "/users/:id", "method": "get" },
            "updateUser": { "path": "/users/:userId", "method": "put" },
            "anyUser": "/users/:user"
        }))
        .unwrap();
        let controller = build("/gw", GatewayConfig::new("http://up", tree));
        assert_eq!(controller.routes().len(), 1);
        assert!(controller.add_routes(axum::Router::<()>::new()).is_ok());
    }

    #[test]
    fn test_from_source() {
        let source = HashMap::from([("billing".to_string(), scenario())]);
        let overrides = GatewayOptionsOverrides::default();
        let controller =
            GatewayController::from_source(&source, "billing", "/gw", &overrides).unwrap();
        assert_eq!(controller.gateway_config().url, "http://api.internal");
        assert_eq!(controller.routes().len(), 2);

        let err =
            GatewayController::from_source(&source, "missing", "/gw", &overrides).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingSetting("missing".into()));
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let overrides = GatewayOptionsOverrides {
            headers: crate::config::schema::HeaderOverrides {
                remove: Some(vec!["bad header".into()]),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = GatewayController::new("/gw", scenario(), &overrides).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidHeaderName(_)));
    }

    #[test]
    fn test_middlewares_shared_across_handlers() {
        let controller = build("/gw", scenario());
        let middleware =
            crate::routing::registrar::middleware_fn(|request| async move { Ok(request) });
        let router = controller
            .add_routes_with(RecordingRouter::default(), vec![middleware])
            .unwrap();
        assert_eq!(router.registered.len(), 2);
        assert!(matches!(
            controller.routes()[0].methods[0].endpoint.definition,
            EndpointEntry::Path(_)
        ));
    }
}
