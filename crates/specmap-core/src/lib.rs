#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]

pub mod alias;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod node;
pub mod options;
pub mod paths;
pub mod resolver;
pub mod roots;
pub mod version;

pub use config::RawConfig;
pub use dedupe::DedupeCache;
pub use error::Error;
pub use node::node_resolve;
pub use options::{
    build_context, AliasValue, CwdSource, Options, ResolutionContext, DEFAULT_EXTENSIONS,
};
pub use resolver::Resolver;
pub use version::VERSION;
