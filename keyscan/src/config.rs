use config::{Config as ConfigBuilder, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::{ScanError, ScanResult};

pub const DEFAULT_THREADS: usize = 10;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MiB
pub const DEFAULT_OUTPUT_FILE: &str = "search_results.txt";
pub const LOCAL_SETTINGS_FILE: &str = ".keyscan.yaml";

/// How undecodable byte sequences in file contents are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Drop invalid sequences; columns count only the surviving characters
    #[default]
    Ignore,
    /// Replace each invalid sequence with U+FFFD
    Replace,
}

impl FromStr for EncodingMode {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "replace" | "lossy" => Ok(Self::Replace),
            other => Err(ScanError::config_error(format!(
                "unknown encoding mode '{}' (expected ignore|replace)",
                other
            ))),
        }
    }
}

/// Upper bound on the size of files considered for matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeLimit {
    Unbounded,
    Bytes(u64),
}

impl SizeLimit {
    /// Whether a file of `size` bytes is within the limit
    pub fn permits(&self, size: u64) -> bool {
        match self {
            SizeLimit::Unbounded => true,
            SizeLimit::Bytes(max) => size <= *max,
        }
    }
}

impl Default for SizeLimit {
    fn default() -> Self {
        SizeLimit::Bytes(DEFAULT_MAX_FILE_SIZE)
    }
}

impl FromStr for SizeLimit {
    type Err = ScanError;

    /// Accepts a byte count, or `-1` / `inf` for no limit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "-1" || s.eq_ignore_ascii_case("inf") {
            return Ok(SizeLimit::Unbounded);
        }
        s.parse::<u64>().map(SizeLimit::Bytes).map_err(|_| {
            ScanError::config_error(format!(
                "invalid max size '{}': expected a byte count, -1 or inf",
                s
            ))
        })
    }
}

impl fmt::Display for SizeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeLimit::Unbounded => write!(f, "inf"),
            SizeLimit::Bytes(n) => write!(f, "{}", n),
        }
    }
}

/// Normalizes extensions such as `txt, .log` into dot-prefixed suffixes.
/// Blank entries are dropped.
pub fn normalize_extensions<I, S>(extensions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .filter_map(|ext| {
            let ext = ext.as_ref().trim();
            let ext = ext.strip_prefix('.').unwrap_or(ext);
            (!ext.is_empty()).then(|| format!(".{}", ext))
        })
        .collect()
}

/// Splits a comma separated `--file-types` value.
pub fn parse_file_types(value: &str) -> Vec<String> {
    normalize_extensions(value.split(','))
}

/// Immutable configuration for one scan.
///
/// Built once at startup, either directly or by resolving [`ScanSettings`], and
/// only read afterwards.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root of the recursive scan
    pub root_path: PathBuf,

    /// Literal keyword, matched case-insensitively
    pub keyword: String,

    /// Size of the worker pool
    pub threads: NonZeroUsize,

    /// Files above this size produce no records at all
    pub max_file_size: SizeLimit,

    /// Whether file contents are scanned in addition to names
    pub read_content: bool,

    /// Allowed path suffixes including the leading dot (e.g. ".log").
    /// Empty means no restriction.
    pub allowed_extensions: Vec<String>,

    /// Destination of the persisted report
    pub output_file: PathBuf,

    pub encoding_mode: EncodingMode,
}

impl ScanConfig {
    /// Creates a configuration with the default options
    pub fn new(root_path: impl Into<PathBuf>, keyword: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            keyword: keyword.into(),
            threads: default_threads(),
            max_file_size: SizeLimit::default(),
            read_content: false,
            allowed_extensions: Vec::new(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            encoding_mode: EncodingMode::default(),
        }
    }

    /// Checks everything that must hold before any scanning begins
    pub fn validate(&self) -> ScanResult<()> {
        if self.keyword.is_empty() {
            return Err(ScanError::config_error("keyword must not be empty"));
        }
        match self.root_path.metadata() {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::not_a_directory(&self.root_path)),
            Err(_) => Err(ScanError::directory_not_found(&self.root_path)),
        }
    }
}

fn default_threads() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_THREADS).unwrap_or(NonZeroUsize::MIN)
}

/// Optional scan defaults, read from YAML settings files and from the command line.
///
/// # Settings Locations
///
/// In increasing order of precedence:
/// 1. Global `$CONFIG_DIR/keyscan/config.yaml`
/// 2. Local `.keyscan.yaml` in the current directory
/// 3. A file passed with `--config`
///
/// Command-line values override all of them.
///
/// ```yaml
/// threads: 16
/// max_size: inf
/// read_content: true
/// file_types: ["txt", "log"]
/// output_file: "results.txt"
/// encoding: replace
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    #[serde(default)]
    pub threads: Option<NonZeroUsize>,

    /// Byte count, `-1` or `inf`
    #[serde(default)]
    pub max_size: Option<String>,

    #[serde(default)]
    pub read_content: Option<bool>,

    /// Extensions with or without the leading dot
    #[serde(default)]
    pub file_types: Option<Vec<String>>,

    #[serde(default)]
    pub output_file: Option<PathBuf>,

    #[serde(default)]
    pub encoding: Option<EncodingMode>,
}

impl ScanSettings {
    /// Loads settings from the default locations plus an explicit file.
    /// The explicit file must exist; the default ones are optional.
    pub fn load_from(settings_path: Option<&Path>) -> ScanResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let default_files = [
            dirs::config_dir().map(|p| p.join("keyscan").join("config.yaml")),
            Some(PathBuf::from(LOCAL_SETTINGS_FILE)),
        ];
        for path in default_files.iter().flatten() {
            if path.is_file() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        if let Some(path) = settings_path {
            let name = path.to_string_lossy();
            builder = builder.add_source(File::new(&name, FileFormat::Yaml).required(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Overlays `overrides` on top of these settings; set fields win
    pub fn merge(self, overrides: ScanSettings) -> Self {
        Self {
            threads: overrides.threads.or(self.threads),
            max_size: overrides.max_size.or(self.max_size),
            read_content: overrides.read_content.or(self.read_content),
            file_types: overrides.file_types.or(self.file_types),
            output_file: overrides.output_file.or(self.output_file),
            encoding: overrides.encoding.or(self.encoding),
        }
    }

    /// Produces the immutable configuration for a run, filling unset fields
    /// with the built-in defaults
    pub fn resolve(
        self,
        root_path: impl Into<PathBuf>,
        keyword: impl Into<String>,
    ) -> ScanResult<ScanConfig> {
        let mut config = ScanConfig::new(root_path, keyword);
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(max_size) = self.max_size {
            config.max_file_size = max_size.parse()?;
        }
        if let Some(read_content) = self.read_content {
            config.read_content = read_content;
        }
        if let Some(file_types) = self.file_types {
            config.allowed_extensions = normalize_extensions(file_types);
        }
        if let Some(output_file) = self.output_file {
            config.output_file = output_file;
        }
        if let Some(encoding) = self.encoding {
            config.encoding_mode = encoding;
        }
        config.validate()?;
        Ok(config)
    }
}
