use thiserror::Error;

/// Fatal at startup: malformed config, missing required key, unknown
/// datasource. The process logs and exits nonzero.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required key '{0}' in [{1}]")]
    MissingKey(&'static str, String),
    #[error("index '{0}' is declared in [system] indexes but has no [{0}] section")]
    UndeclaredSection(String),
    #[error("unsupported driver '{driver}' for index '{index}' (only 'csv' has a concrete driver)")]
    UnsupportedDriver { index: String, driver: String },
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Fatal at startup: row count mismatch, coordinate parse failure,
/// unreachable data source.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: header is missing declared field '{field}'")]
    MissingField { path: String, field: String },
    #[error("{path}:{line}: expected {expected} fields, found {found}")]
    FieldCountMismatch {
        path: String,
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("{path}:{line}: could not parse '{value}' as a coordinate for field '{field}'")]
    BadCoordinate {
        path: String,
        line: usize,
        field: String,
        value: String,
    },
    #[error(transparent)]
    IndexState(#[from] sfc_index::IndexStateError),
    #[error(transparent)]
    Registry(#[from] sfc_index::RegistryError),
}

/// Surfaced to the client as `404 NOT FOUND`; logged, connection closed.
/// Never propagates past the connection task.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("malformed request line")]
    MalformedRequestLine,
    #[error("malformed header line")]
    MalformedHeader,
    #[error("missing required query parameter '{0}'")]
    MissingParam(&'static str),
    #[error("invalid value for query parameter '{0}'")]
    InvalidParam(&'static str),
    #[error("unknown index '{0}'")]
    UnknownIndex(String),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("percent-decoding failed")]
    BadEncoding,
    #[error("index state invariant violated: {0}")]
    BadIndexState(#[from] sfc_index::IndexStateError),
}

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("the '{0}' response format is not implemented")]
    Unsupported(&'static str),
    #[error("unknown response format '{0}'")]
    Unknown(String),
}
