//! mockroute is a configuration-driven HTTP mock server.
//!
//! A single config file declares routes such as `GET /items/{id}`, each
//! with a canned body (literal `{name}` substitution or a Handlebars
//! script), status, headers, optional simulated latency, and optional
//! request recording. The file is polled while the server runs; a changed
//! file is rebuilt into a fresh route table and swapped in atomically,
//! without dropping in-flight requests.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate).
//! - [`config`] -- Config model, file parsing, defaulting, and validation.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`handler`] -- The Axum fallback that serves every mock request.
//! - [`latency`] -- Cancellable simulated delay with jitter.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`recorder`] -- Per-route, per-day append-only request logs.
//! - [`reload`] -- Rebuilds and swaps the route table when the config changes.
//! - [`render`] -- Literal and scripted response body rendering.
//! - [`routes`] -- Wildcard extraction, route table compilation, and the
//!   atomically swappable dispatch table.
//! - [`server`] -- Shared application state, router, and graceful shutdown.
//! - [`watch`] -- Polling file watcher with SHA-256 change detection.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file formats |
//! | `full` | All features |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod handler;
pub mod latency;
pub mod logging;
pub mod recorder;
pub mod reload;
pub mod render;
pub mod routes;
pub mod server;
pub mod watch;
