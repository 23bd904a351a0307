//! Container builder and frozen resolver
//!
//! The builder is a write-only accumulation of registrations, confined to
//! the bootstrap call stack. Building it produces the process-wide
//! [`Resolver`], immutable and safe for concurrent readers.

pub mod builder;
pub mod fallback;
pub mod resolver;
pub mod scope;

pub use builder::{ContainerBuilder, ServiceId};
pub use fallback::{Constructible, ConstructorFn};
pub use resolver::{Resolver, Scope};
pub use scope::{ScopeId, ServiceScope};
