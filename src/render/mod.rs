//! Response body rendering.
//!
//! Two modes, picked per route:
//!
//! - **Literal**: [`render_literal`] substitutes `{name}` placeholders in
//!   the route body with the values bound from the request path.
//! - **Scripted**: [`ScriptEngine`] evaluates a Handlebars template
//!   against the request's [`RenderContext`] and re-serializes the result
//!   as canonical JSON.
//!
//! The script registry is compiled once per route table and never
//! mutated afterwards. Every render call evaluates against its own fresh
//! context, so concurrent requests share no evaluation state.

mod helpers;

use std::collections::HashMap;

use bytes::Bytes;
use handlebars::Handlebars;

use crate::routes::wildcard::placeholder;

/// Per-request bindings of wildcard names to path values.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct RenderContext(HashMap<String, String>);

impl RenderContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind each of `wildcards` to its captured path value, skipping names
    /// the request did not bind.
    #[must_use]
    pub fn from_params(wildcards: &[String], params: &HashMap<String, String>) -> Self {
        let bindings = wildcards
            .iter()
            .filter_map(|name| params.get(name).map(|v| (name.clone(), v.clone())))
            .collect();
        Self(bindings)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("script evaluation failed: {0}")]
    Script(#[source] Box<handlebars::RenderError>),

    #[error("script output is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

impl From<handlebars::RenderError> for RenderError {
    fn from(e: handlebars::RenderError) -> Self {
        Self::Script(Box::new(e))
    }
}

/// Replace every `{name}` for each name in `wildcards` with its bound
/// value. Unbound or empty values leave the placeholder in place.
#[must_use]
pub fn render_literal(body: &str, wildcards: &[String], ctx: &RenderContext) -> String {
    let mut rendered = body.to_string();
    for name in wildcards {
        let Some(value) = ctx.get(name).filter(|v| !v.is_empty()) else {
            continue;
        };
        rendered = rendered.replace(&placeholder(name), value);
    }
    rendered
}

/// Compiled route scripts plus the host helpers they may call.
pub struct ScriptEngine {
    registry: Handlebars<'static>,
}

impl std::fmt::Debug for ScriptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut scripts: Vec<&String> = self.registry.get_templates().keys().collect();
        scripts.sort();
        f.debug_struct("ScriptEngine")
            .field("scripts", &scripts)
            .finish()
    }
}

impl ScriptEngine {
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        helpers::register(&mut registry);
        Self { registry }
    }

    /// Compile `source` under `name`.
    pub fn register(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<(), Box<handlebars::TemplateError>> {
        self.registry
            .register_template_string(name, source)
            .map_err(Box::new)
    }

    #[cfg(test)]
    fn has_script(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }

    /// Evaluate the script `name` against `ctx` and return the canonical
    /// JSON encoding of its output.
    pub fn render(&self, name: &str, ctx: &RenderContext) -> Result<Bytes, RenderError> {
        let text = self.registry.render(name, ctx)?;
        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(RenderError::InvalidJson)?;
        serde_json::to_vec(&value)
            .map(Bytes::from)
            .map_err(RenderError::InvalidJson)
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}
