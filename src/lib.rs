//! Multi-scene JWT configuration.
//!
//! A host declares global JWT settings plus named scenes ("admin", "api", ...)
//! that override them. [`SceneConfigResolver`](resolver::SceneConfigResolver)
//! merges each scene once at startup; callers pick their scene through a
//! [`SceneSelector`](selector::SceneSelector) and issue or verify tokens with
//! the resolved settings.

pub mod application;
pub mod domain;
pub mod infra;

// Re-exports for shorter use statements.
pub use application::*;
pub use domain::*;
