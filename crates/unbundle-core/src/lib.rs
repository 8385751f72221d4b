#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod dev;
pub mod error;
pub mod sfc;
pub mod version;

pub use config::{ConfigOverrides, DevConfig};
pub use dev::{ArtifactKind, ModuleRequest, ModuleResponse, ModuleServer, RouteTable};
pub use error::{ConfigError, DevError};
pub use version::VERSION;
