use std::path::PathBuf;
use thiserror::Error;

/// Stable error codes for dev server failures.
pub mod codes {
    pub const FILE_NOT_FOUND: &str = "FILE_NOT_FOUND";
    pub const IO_ERROR: &str = "IO_ERROR";
    pub const PACKAGE_NOT_FOUND: &str = "PACKAGE_NOT_FOUND";
    pub const PACKAGE_MANIFEST_MISSING: &str = "PACKAGE_MANIFEST_MISSING";
    pub const PACKAGE_MANIFEST_INVALID: &str = "PACKAGE_MANIFEST_INVALID";
    pub const PACKAGE_NO_MODULE_ENTRY: &str = "PACKAGE_NO_MODULE_ENTRY";
    pub const PACKAGE_ENTRY_MISSING: &str = "PACKAGE_ENTRY_MISSING";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const COMPILE_ERROR: &str = "COMPILE_ERROR";
    pub const UNROUTED_REQUEST: &str = "UNROUTED_REQUEST";
}

/// Error raised while serving a single module request.
#[derive(Error, Debug)]
pub enum DevError {
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Package not found: {name}")]
    PackageNotFound { name: String },

    #[error("package.json not found: {}", path.display())]
    ManifestMissing { path: PathBuf },

    #[error("Invalid package.json at {}: {source}", path.display())]
    ManifestInvalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Package {name} declares no ES module entry")]
    NoModuleEntry { name: String },

    #[error("Package entry file not found: {}", path.display())]
    EntryFileMissing { path: PathBuf },

    #[error("Failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Failed to compile {file}: {message}")]
    Compile { file: String, message: String },

    #[error("No route for {path}")]
    Unrouted { path: String },
}

impl DevError {
    /// Map an I/O failure on `path` to the matching variant.
    ///
    /// A missing file becomes `FileNotFound`; anything else keeps its source.
    #[must_use]
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::Io { path, source }
        }
    }

    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn compile(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Compile {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Get the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => codes::FILE_NOT_FOUND,
            Self::Io { .. } => codes::IO_ERROR,
            Self::PackageNotFound { .. } => codes::PACKAGE_NOT_FOUND,
            Self::ManifestMissing { .. } => codes::PACKAGE_MANIFEST_MISSING,
            Self::ManifestInvalid { .. } => codes::PACKAGE_MANIFEST_INVALID,
            Self::NoModuleEntry { .. } => codes::PACKAGE_NO_MODULE_ENTRY,
            Self::EntryFileMissing { .. } => codes::PACKAGE_ENTRY_MISSING,
            Self::Parse { .. } => codes::PARSE_ERROR,
            Self::Compile { .. } => codes::COMPILE_ERROR,
            Self::Unrouted { .. } => codes::UNROUTED_REQUEST,
        }
    }

    /// Whether this error came out of package entry resolution.
    #[must_use]
    pub fn is_package_resolution(&self) -> bool {
        matches!(
            self,
            Self::PackageNotFound { .. }
                | Self::ManifestMissing { .. }
                | Self::ManifestInvalid { .. }
                | Self::NoModuleEntry { .. }
                | Self::EntryFileMissing { .. }
        )
    }

    /// HTTP status code the server answers with.
    ///
    /// Only an unrouted request is a client miss; every transform fault
    /// terminates the request as a server error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unrouted { .. } => 404,
            _ => 500,
        }
    }
}

/// Error loading the dev server configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
