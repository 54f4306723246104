// src/glob/mod.rs

//! Live globs and the factories that feed them.

pub mod factory;
pub mod live_glob;
pub mod matcher;
pub mod registry;

pub use factory::LiveGlobFactory;
pub use live_glob::{GlobSnapshot, LiveGlob};
pub use matcher::GlobMatcher;
pub use registry::{FactoryRegistry, glob, resolve_cwd};
