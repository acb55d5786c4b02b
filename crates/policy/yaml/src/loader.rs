use std::path::{Path, PathBuf};

use serde::Deserialize;
use shelve_policy::{ConfigError, ConfigFrontend, Namespace};
use tracing::{debug, info, instrument};

use crate::frontend::YamlFrontend;

/// Where configurations are looked up.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory searched for bare configuration names.
    pub config_dir: PathBuf,
    /// Accepted file extensions, without the leading dot.
    pub extensions: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("/etc/shelve.d"),
            extensions: vec!["yaml".to_owned(), "yml".to_owned()],
        }
    }
}

/// What a configuration name resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A single `<name>.<ext>` file.
    File(PathBuf),
    /// A `<name>/` directory; its files are read in name order.
    Directory {
        path: PathBuf,
        files: Vec<PathBuf>,
    },
}

impl ConfigSource {
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Self::File(path) => std::slice::from_ref(path),
            Self::Directory { files, .. } => files,
        }
    }
}

/// Resolves configuration names and reads them into a [`Namespace`].
///
/// A bare name such as `fs1` is looked up in the configuration directory;
/// an absolute path such as `/tmp/fs1` is looked up next to itself. Either
/// way the configuration is `<name>.<ext>` for one accepted extension, or a
/// `<name>/` directory of such files, and exactly one of them must exist.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: LoaderConfig,
}

impl ConfigLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Find the files backing configuration `name`.
    pub fn resolve(&self, name: &str) -> Result<ConfigSource, ConfigError> {
        let path = Path::new(name);
        let base = if path.is_absolute() {
            path.to_path_buf()
        } else if name.contains('/') {
            return Err(ConfigError::RelativePath(name.to_owned()));
        } else if name.is_empty() {
            return Err(ConfigError::NotFound(name.to_owned()));
        } else {
            self.config.config_dir.join(name)
        };

        let mut candidates: Vec<ConfigSource> = self
            .config
            .extensions
            .iter()
            .map(|ext| with_extension(&base, ext))
            .filter(|p| p.is_file())
            .map(ConfigSource::File)
            .collect();

        if base.is_dir() {
            let files = self.directory_files(&base)?;
            if !files.is_empty() {
                candidates.push(ConfigSource::Directory {
                    path: base.clone(),
                    files,
                });
            }
        }

        match candidates.len() {
            0 => Err(ConfigError::NotFound(base.display().to_string())),
            1 => Ok(candidates.remove(0)),
            _ => Err(ConfigError::Ambiguous {
                name: name.to_owned(),
                candidates: candidates
                    .iter()
                    .map(|c| match c {
                        ConfigSource::File(path) | ConfigSource::Directory { path, .. } => {
                            path.display().to_string()
                        }
                    })
                    .collect(),
            }),
        }
    }

    /// Resolve `name` and declare everything it contains.
    #[instrument(skip(self))]
    pub fn load(&self, name: &str) -> Result<Namespace, ConfigError> {
        let source = self.resolve(name)?;
        let mut namespace = Namespace::new();
        for file in source.files() {
            debug!(file = %file.display(), "reading configuration file");
            YamlFrontend.parse_file_into(file, &mut namespace)?;
        }

        if namespace.is_empty() {
            return Err(ConfigError::Empty(name.to_owned()));
        }

        info!(
            fileclasses = namespace.fileclasses().count(),
            policies = namespace.policies().count(),
            "loaded configuration"
        );
        Ok(namespace)
    }

    fn directory_files(&self, dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            ConfigError::Io(format!("cannot read directory {}: {e}", dir.display()))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ConfigError::Io(format!("directory entry error: {e}")))?;
            let path = entry.path();
            let accepted = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| self.config.extensions.iter().any(|e| e == ext));
            if path.is_file() && accepted {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn with_extension(base: &Path, ext: &str) -> PathBuf {
    let mut path = base.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}
