//! # relnotes-serve
//!
//! Local HTTP preview for a changelog file.
//!
//! The server re-reads the changelog on every request, so edits show up on
//! reload. Besides the rendered HTML page it exposes the changelog as JSON,
//! single releases, and the lint report.
//!
//! ```rust,no_run
//! use relnotes_core::RelnotesConfig;
//!
//! # async fn run() -> relnotes_serve::Result<()> {
//! let config = RelnotesConfig::default();
//! relnotes_serve::serve(&config, "CHANGELOG.md", async {
//!     let _ = tokio::signal::ctrl_c().await;
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod port;
pub mod server;

pub use error::{Error, Result};
pub use port::{bind_address, get_available_port, port_is_available, setup_port, setup_server_url};
pub use server::{bind, router, serve, serve_listener, AppState};
