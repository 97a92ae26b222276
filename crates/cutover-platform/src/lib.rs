//! cutover-platform — the narrow boundary to the orchestration platform.
//!
//! Everything the deployment workflows need from the cluster goes through
//! the [`PlatformClient`] trait: apply a manifest, read deployment status,
//! fetch pod logs, patch a service selector, annotate a deployment. There
//! is one real implementation ([`KubectlClient`]) that shells out to
//! `kubectl`, and one in-memory implementation ([`FakePlatform`]) so the
//! workflow and monitor crates are testable without a live cluster.
//!
//! # Architecture
//!
//! ```text
//! PlatformClient (trait)
//!   ├── KubectlClient — tokio::process::Command + `-o json` parsing
//!   └── FakePlatform  — scriptable in-memory cluster state
//! ```

pub mod client;
pub mod error;
pub mod fake;
pub mod kubectl;
pub mod types;

pub use client::PlatformClient;
pub use error::{PlatformError, PlatformResult};
pub use fake::FakePlatform;
pub use kubectl::KubectlClient;
pub use types::*;
