//! Route table and request dispatch.
//!
//! # Responsibilities
//! - Store compiled route entries in declaration order
//! - Produce the ordered step sequence for a request (method + path)
//!
//! # Design Decisions
//! - Immutable after construction (shared behind `Arc` without locks)
//! - Every pattern is compiled when the table is built; a malformed entry
//!   fails startup instead of the first matching request
//! - The step sequence is a lazy iterator: a step is only matched when the
//!   chain asks for it
//! - Middleware is collected in reverse declaration order by prefix match,
//!   then the terminal handlers of the first exact match run

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::routing::compiler::{PatternCache, PatternOptions};
use crate::routing::error::PatternError;
use crate::routing::matcher::{Matcher, Params};

/// One declared route: where it applies and what runs for it.
#[derive(Clone)]
pub struct RouteEntry<H> {
    pub route_path: String,
    pub mount_path: String,
    /// `None` matches every method.
    pub method: Option<Method>,
    pub middlewares: Vec<H>,
    pub modules: Vec<H>,
}

impl<H> RouteEntry<H> {
    pub fn new(route_path: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            route_path: route_path.into(),
            mount_path: mount_path.into(),
            method: None,
            middlewares: Vec::new(),
            modules: Vec::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn middleware(mut self, handler: H) -> Self {
        self.middlewares.push(handler);
        self
    }

    pub fn module(mut self, handler: H) -> Self {
        self.modules.push(handler);
        self
    }

    fn accepts(&self, method: &Method) -> bool {
        self.method.as_ref().map_or(true, |m| m == method)
    }
}

/// One handler invocation produced by dispatch.
#[derive(Debug, Clone)]
pub struct Step<H> {
    pub handler: H,
    pub params: Params,
    /// Portion of the request path matched by the entry's mount path (or by
    /// the route path for terminal handlers).
    pub path: String,
}

struct CompiledRoute<H> {
    entry: RouteEntry<H>,
    route_prefix: Arc<Matcher>,
    route_exact: Arc<Matcher>,
    mount: Arc<Matcher>,
}

/// Immutable, compiled route table.
pub struct RouteTable<H> {
    routes: Vec<CompiledRoute<H>>,
}

impl<H> fmt::Debug for RouteTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| &r.entry.route_path))
            .finish()
    }
}

/// Escape regex metacharacters in a declared route so they match literally.
/// `:` and `*` keep their pattern meaning.
pub fn escape_route_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if matches!(
            c,
            '.' | '+' | '?' | '^' | '$' | '{' | '}' | '(' | ')' | '|' | '[' | ']' | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl<H: Clone> RouteTable<H> {
    /// Compile a table with default matching options.
    pub fn new(entries: Vec<RouteEntry<H>>) -> Result<Self, PatternError> {
        Self::compile(entries, &PatternOptions::default(), &PatternCache::new())
    }

    /// Compile a table. `base` supplies case sensitivity and strictness; the
    /// `end` flag is set per matcher.
    pub fn compile(
        entries: Vec<RouteEntry<H>>,
        base: &PatternOptions,
        cache: &PatternCache,
    ) -> Result<Self, PatternError> {
        let prefix = PatternOptions {
            end: false,
            ..base.clone()
        };
        let exact = PatternOptions {
            end: true,
            ..base.clone()
        };

        let mut routes = Vec::with_capacity(entries.len());
        for entry in entries {
            let route_path = escape_route_path(&entry.route_path);
            let mount_path = escape_route_path(&entry.mount_path);

            let compiled = CompiledRoute {
                route_prefix: cache.compile(&route_path, &prefix)?,
                route_exact: cache.compile(&route_path, &exact)?,
                mount: cache.compile(&mount_path, &prefix)?,
                entry,
            };
            tracing::debug!(
                route = %compiled.entry.route_path,
                mount = %compiled.entry.mount_path,
                method = ?compiled.entry.method,
                middlewares = compiled.entry.middlewares.len(),
                modules = compiled.entry.modules.len(),
                "Compiled route"
            );
            routes.push(compiled);
        }

        Ok(Self { routes })
    }

    /// Start dispatching a request. Nothing is matched until the returned
    /// cursor is advanced.
    pub fn dispatch(self: &Arc<Self>, method: &Method, path: &str) -> Dispatch<H> {
        Dispatch {
            table: Arc::clone(self),
            method: method.clone(),
            path: path.to_string(),
            pending: VecDeque::new(),
            phase: Phase::Middleware {
                remaining: self.routes.len(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

enum Phase {
    Middleware { remaining: usize },
    Terminal { next: usize },
    Done,
}

/// Lazy cursor over the steps for one request.
pub struct Dispatch<H> {
    table: Arc<RouteTable<H>>,
    method: Method,
    path: String,
    pending: VecDeque<Step<H>>,
    phase: Phase,
}

impl<H: Clone> Iterator for Dispatch<H> {
    type Item = Step<H>;

    fn next(&mut self) -> Option<Step<H>> {
        loop {
            if let Some(step) = self.pending.pop_front() {
                return Some(step);
            }

            match self.phase {
                Phase::Middleware { remaining } => {
                    if remaining == 0 {
                        self.phase = Phase::Terminal { next: 0 };
                        continue;
                    }
                    let index = remaining - 1;
                    self.phase = Phase::Middleware { remaining: index };

                    let route = &self.table.routes[index];
                    if route.entry.middlewares.is_empty() || !route.entry.accepts(&self.method) {
                        continue;
                    }
                    let Some(route_match) = route.route_prefix.matches(&self.path) else {
                        continue;
                    };
                    let Some(mount_match) = route.mount.matches(&self.path) else {
                        continue;
                    };

                    for handler in &route.entry.middlewares {
                        self.pending.push_back(Step {
                            handler: handler.clone(),
                            params: route_match.params.clone(),
                            path: mount_match.path.clone(),
                        });
                    }
                }
                Phase::Terminal { next } => {
                    if next >= self.table.routes.len() {
                        self.phase = Phase::Done;
                        continue;
                    }
                    self.phase = Phase::Terminal { next: next + 1 };

                    let route = &self.table.routes[next];
                    if route.entry.modules.is_empty() || !route.entry.accepts(&self.method) {
                        continue;
                    }
                    let Some(exact) = route.route_exact.matches(&self.path) else {
                        continue;
                    };
                    if route.mount.matches(&self.path).is_none() {
                        continue;
                    }

                    for handler in &route.entry.modules {
                        self.pending.push_back(Step {
                            handler: handler.clone(),
                            params: exact.params.clone(),
                            path: exact.path.clone(),
                        });
                    }
                    self.phase = Phase::Done;
                }
                Phase::Done => return None,
            }
        }
    }
}
