//! Client-facing API descriptor.
//!
//! Describes how an API client reaches the gateway: the mount URL and the
//! endpoint tree wrapped under a configurable setting name.

use std::collections::HashMap;

use serde::Serialize;

use crate::gateway::endpoint::{unflatten, EndpointNode, EndpointTree, FlatEndpoints};
use crate::gateway::routes::trim_slashes;

/// Output of [`describe`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiDescriptor {
    pub url: String,
    pub endpoints: EndpointTree,
}

/// Inputs that shape the descriptor.
#[derive(Debug, Clone, Copy)]
pub struct DescribeOptions<'a> {
    pub root: &'a str,
    pub api_config_setting: &'a str,
}

/// Derive the descriptor for endpoints mounted at `mount_route`.
///
/// With a root, every endpoint path becomes `root/path`; the rest of the
/// declared path is kept as written.
pub fn describe(
    flat: &FlatEndpoints,
    mount_route: &str,
    options: DescribeOptions<'_>,
) -> ApiDescriptor {
    let root = trim_slashes(options.root);
    let endpoints = if root.is_empty() {
        flat.clone()
    } else {
        let mut rooted = FlatEndpoints::new();
        for (name, entry) in flat.iter() {
            let path = format!("{root}/{}", entry.path().trim_start_matches('/'));
            rooted.insert(name, entry.with_path(path));
        }
        rooted
    };

    let mut wrapped = EndpointTree::new();
    wrapped.insert(options.api_config_setting, EndpointNode::Tree(unflatten(&endpoints)));

    ApiDescriptor {
        url: format!("/{}", trim_slashes(mount_route)),
        endpoints: wrapped,
    }
}

/// Replace `:name` tokens in `url` with the matching placeholder value.
///
/// A token is a `:` followed by ASCII letters, digits or `_`. Tokens without a
/// matching placeholder are kept as-is.
pub fn substitute_placeholders(url: &str, placeholders: &HashMap<String, String>) -> String {
    if placeholders.is_empty() {
        return url.to_string();
    }

    let mut out = String::with_capacity(url.len());
    let mut rest = url;
    while let Some(start) = rest.find(':') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..len];
        match placeholders.get(name) {
            Some(value) if !name.is_empty() => out.push_str(value),
            _ => {
                out.push(':');
                out.push_str(name);
            }
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}
