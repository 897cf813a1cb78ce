//! The allow-list policy and the callbacks that enforce it.
//!
//! [`Sanitizer`] is both the policy store and the event handler set: the
//! pipeline in [`crate::html`] registers its `sanitize_*` methods with the
//! markup rewriter for the structural and attribute passes.

pub use self::config::{Preset, RemoveContents, SanitizerConfig};
pub use self::events::RemovalDecision;
pub use self::policy::{ElementPolicy, Protocol, Sanitizer, SanitizerFlags, ALL_ELEMENTS, ANY_ATTRIBUTE};

mod config;
mod events;
mod policy;

#[cfg(test)]
mod tests;
