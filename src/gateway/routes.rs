//! Route table construction.
//!
//! # Responsibilities
//! - Group flattened endpoints by route shape
//! - Detect `(shape, method)` collisions between distinct endpoints
//! - Reject paths a router cannot mount
//! - Produce the ordered list of mountable routes
//!
//! # Design Decisions
//! - Runs once, at controller construction; a collision aborts construction
//! - The shape of a path ignores parameter names: `/users/:id` and
//!   `/users/:userId` are one route, mounted under the first declared path
//! - Route order follows the first declaration of each shape
//! - Methods within a route keep insertion order

use crate::error::ConfigurationError;
use crate::gateway::endpoint::{EndpointEntry, FlatEndpoints};
use crate::gateway::method::HttpMethod;
use crate::routing::registrar::check_route_path;

/// Identity of one endpoint: its flattened name and declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub name: String,
    pub definition: EndpointEntry,
}

/// One method registered on a route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMethod {
    pub method: HttpMethod,
    pub endpoint: Endpoint,
}

/// One mountable path with every method declared against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Normalized endpoint path, without leading or trailing slashes.
    pub path: String,
    /// `path` with parameter names erased.
    pub shape: String,
    /// Mount path: optional root prefix plus `path`.
    pub route: String,
    pub methods: Vec<RouteMethod>,
}

/// Strip every leading and trailing `/`.
pub fn trim_slashes(value: &str) -> &str {
    value.trim_matches('/')
}

/// `path` with every `:name` segment as `:` and every `*name` segment as `*`.
pub fn route_shape(path: &str) -> String {
    trim_slashes(path)
        .split('/')
        .map(|segment| {
            if segment.starts_with(':') {
                ":"
            } else if segment.starts_with('*') {
                "*"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the route table. Fails fast on the first collision.
pub fn build_routes(flat: &FlatEndpoints, root: &str) -> Result<Vec<Route>, ConfigurationError> {
    let root = trim_slashes(root);
    let prefix = if root.is_empty() {
        "/".to_string()
    } else {
        format!("/{root}/")
    };

    let mut routes: Vec<Route> = Vec::new();

    for (name, entry) in flat.iter() {
        let method = HttpMethod::normalize(entry.method());
        let path = trim_slashes(entry.path());
        check_route_path(path).map_err(|reason| ConfigurationError::InvalidRoutePath {
            endpoint: name.to_string(),
            path: entry.path().to_string(),
            reason,
        })?;
        let shape = route_shape(path);
        let endpoint = Endpoint {
            name: name.to_string(),
            definition: entry.clone(),
        };

        match routes.iter_mut().find(|route| route.shape == shape) {
            Some(route) => {
                if let Some(existing) = route.methods.iter().find(|m| m.method == method) {
                    return Err(ConfigurationError::DuplicateEndpoint {
                        path: route.path.clone(),
                        method: method.to_string(),
                        existing: existing.endpoint.name.clone(),
                        duplicate: endpoint.name,
                    });
                }
                if route.path != path {
                    tracing::debug!(
                        route = %route.route,
                        declared = %path,
                        endpoint = %endpoint.name,
                        "Parameter names differ; endpoint merged into existing route"
                    );
                }
                route.methods.push(RouteMethod { method, endpoint });
            }
            None => routes.push(Route {
                path: path.to_string(),
                shape,
                route: format!("{prefix}{path}"),
                methods: vec![RouteMethod { method, endpoint }],
            }),
        }
    }

    for route in &routes {
        let methods: Vec<&str> = route.methods.iter().map(|m| m.method.as_str()).collect();
        tracing::debug!(route = %route.route, methods = ?methods, "Gateway route built");
    }

    Ok(routes)
}
