//! `include` support for configurations split across several files.
//!
//! The entry file may name other files in a top-level `include` key (a string
//! or an array of strings, relative to the entry file's directory). Their
//! sections are merged into the entry file's table. Every top-level section
//! may be defined in exactly one file, and included files cannot include
//! further files.
//!
//! `${VAR}` references are expanded once per file, as it is read. The merged
//! table is deserialized directly, so values that came out of an environment
//! variable are never expanded a second time.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

const INCLUDE_KEY: &str = "include";

/// Reads an entry file together with the files it includes.
pub(crate) struct IncludeLoader {
	base_dir: PathBuf,
	/// Canonical paths read so far
	seen: HashSet<PathBuf>,
	/// File that defined each top-level section
	origins: HashMap<String, PathBuf>,
}

impl IncludeLoader {
	pub(crate) fn new(base_dir: impl AsRef<Path>) -> Self {
		Self {
			base_dir: base_dir.as_ref().to_path_buf(),
			seen: HashSet::new(),
			origins: HashMap::new(),
		}
	}

	/// Loads `entry`, merges its includes and validates the result.
	pub(crate) async fn load(mut self, entry: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let entry = self.locate(entry.as_ref())?;
		let mut root = self.read_table(&entry).await?;

		let includes = take_includes(&mut root)?;
		for section in root.keys() {
			self.origins.insert(section.clone(), entry.clone());
		}

		for include in includes {
			let path = self.locate(&include)?;
			let table = self.read_table(&path).await?;
			if table.contains_key(INCLUDE_KEY) {
				return Err(ConfigError::Validation(format!(
					"{} is included and cannot include other files",
					path.display()
				)));
			}

			for (section, value) in table {
				if let Some(origin) = self.origins.get(&section) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' found in {} and {}",
						section,
						origin.display(),
						path.display()
					)));
				}
				self.origins.insert(section.clone(), path.clone());
				root.insert(section, value);
			}
		}

		Config::from_table(root)
	}

	/// Reads `path` once, expanding environment variables.
	async fn read_table(&mut self, path: &Path) -> Result<toml::Table, ConfigError> {
		let canonical = path.canonicalize()?;
		if !self.seen.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		Ok(toml::from_str(&resolve_env_vars(&content)?)?)
	}

	fn locate(&self, path: &Path) -> Result<PathBuf, ConfigError> {
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_dir.join(path)
		};

		if !resolved.is_file() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}
		Ok(resolved)
	}
}

/// Removes the `include` key from `root`, returning the listed paths.
fn take_includes(root: &mut toml::Table) -> Result<Vec<PathBuf>, ConfigError> {
	match root.remove(INCLUDE_KEY) {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				_ => Err(ConfigError::Validation(
					"Include array must contain only strings".into(),
				)),
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}
