//! Unbundled development serving.
//!
//! Serves individual ES modules on demand instead of a single bundle. Each
//! request is classified by the route table, its source is read from disk
//! (or from an installed package), and the matching format transformer turns
//! it into a browser-loadable module with every bare import rewritten to the
//! package-import route.

pub mod cache;
pub mod package;
pub mod rewrite;
pub mod router;
pub mod scan;
pub mod transform;

pub use cache::{DescriptorCache, FileStamp};
pub use package::{PackageManifest, PackageResolver, ResolvedPackage};
pub use rewrite::{
    is_bare_specifier, package_route, rewrite_imports, scan_import_specifiers, ImportKind,
    ImportSpecifier, MODULES_PREFIX,
};
pub use router::{ArtifactKind, ModuleRequest, ModuleResponse, ModuleServer, Route, RouteTable};
pub use transform::{create_css_module, inject_env_shim, ENV_SHIM};
