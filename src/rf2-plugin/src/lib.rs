//! Write rFactor 2 internals plugins without implementing the host's
//! versioned plugin class by hand.
//!
//! This crate provides:
//! - The host-visible object and vtable ([`PluginObject`]) forwarding every
//!   callback of interface version 7 to a safe [`PluginAdapter`]
//! - Capability traits ([`hooks`]) a plugin implements for just the
//!   callbacks it needs
//! - Once-per-event `track_loaded`/`session_started` notifications derived
//!   from scoring updates
//! - A message queue feeding the host's chat display
//! - Typed access to the plugin's `.ini` files through [`PluginContext`]
//! - [`declare_plugin!`] for the exported factory functions
//!
//! # Files
//!
//! Relative to the game root:
//! - `Plugins/<name>/<name>.ini`: plugin settings (see [`rf2_core::PluginSettings`])
//! - `Plugins/<name>/adapter.toml`: adapter settings (server mode, logging)
//! - `Plugins/<name>/logs/`: daily rolling log files
//!
//! # Usage
//!
//! ```rust,ignore
//! use rf2_plugin::{declare_plugin, PluginAdapter, PluginContext, ScoringHooks, SessionHooks};
//!
//! #[derive(Default)]
//! struct Example {
//!     foo: i32,
//! }
//!
//! impl SessionHooks for Example {
//!     fn startup(&mut self, ctx: &PluginContext, _version: i32) {
//!         self.foo = ctx.settings().read("section1", "foo", 100);
//!     }
//!
//!     fn session_started(&mut self, ctx: &PluginContext, session: &rf2_plugin::SessionInfo) {
//!         rf2_plugin::display_message!(ctx, "{:?} started, foo={}", session.kind, self.foo);
//!     }
//! }
//!
//! struct Scoring;
//! impl ScoringHooks for Scoring {}
//!
//! declare_plugin!("ExamplePlugin", {
//!     PluginAdapter::builder("Example")
//!         .session(Example::default())
//!         .scoring(Scoring)
//!         .build()
//! });
//! ```

pub mod abi;
mod adapter;
mod context;
mod exports;
pub mod hooks;
pub mod messages;
pub mod notify;
pub mod object;
pub mod server;

pub use adapter::{PluginAdapter, PluginBuilder};
pub use context::{Environment, PluginContext};
pub use hooks::{
    CustomVariableHooks, GraphicsHooks, HardwareHooks, MessageHooks, RulesHooks, ScoringHooks,
    ScreenHooks, SessionHooks, SessionInfo, TelemetryHooks, TelemetryRequest, ThreadKind,
    WeatherHooks,
};
pub use messages::{MessageQueue, MessageSender};
pub use object::PluginObject;
pub use rf2_core::SessionType;
