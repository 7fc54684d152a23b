//! Default configuration values for dwarf-query

use crate::memory::GuestArchitecture;
use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub metadata: MetadataDefaults,
    pub loader: LoaderDefaults,
    pub reader: ReaderDefaults,
    pub logging: LoggingDefaults,
}

/// Default metadata source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataDefaults {
    pub path: String,
}

/// Default loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderDefaults {
    pub max_threads: usize,
    pub parallel_threshold: usize,
    pub verbose: bool,
}

/// Default reader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderDefaults {
    pub architecture: GuestArchitecture,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
    /// Log file; `None` logs to stderr
    pub file: Option<String>,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        metadata: MetadataDefaults {
            path: "types.json".to_string(),
        },
        loader: LoaderDefaults {
            max_threads: num_cpus::get().min(8),
            parallel_threshold: 256,
            verbose: false,
        },
        reader: ReaderDefaults {
            architecture: GuestArchitecture::X64,
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
            file: None,
        },
    }
}
