use crate::error::Error;
use crate::scanner::exclusion::{ExclusionRule, ExclusionSet};
use config::{Config, File as ConfigFile};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_PROFILES_PATH: &str = "user_inputs/folder_paths";
pub const DEFAULT_EXTRACT_FOLDER: &str = "PDFextracts";

pub const STORE_FILE_NAME: &str = "library.sqlite";
pub const SNAPSHOT_FILE_NAME: &str = "latest-catalog.csv";
pub const DUPLICATES_FILE_NAME: &str = "latest-duplicates.csv";

/// One library profile as written in the profiles file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileConfig {
    pub root_folder_path: PathBuf,
    pub catalog_folder: PathBuf,
    #[serde(default = "default_extract_path")]
    pub extract_path: String,
    #[serde(default)]
    pub excluded_files: Vec<String>,
    #[serde(default)]
    pub excluded_folders: Vec<String>,
    #[serde(default)]
    pub duplicate_exclusions: Vec<String>,
}

fn default_extract_path() -> String {
    DEFAULT_EXTRACT_FOLDER.to_string()
}

/// A resolved profile: paths made concrete, exclusion strings turned into rules.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub root: PathBuf,
    pub catalog_dir: PathBuf,
    pub extraction_folder: String,
    pub exclusions: ExclusionSet,
    pub duplicate_exclusions: Vec<String>,
}

impl Profile {
    pub fn from_config(name: &str, config: ProfileConfig) -> Self {
        let root = config.root_folder_path;
        // Relative catalog folders live under the root; absolute ones replace it.
        let catalog_dir = root.join(&config.catalog_folder);

        let mut exclusions = ExclusionSet::from_strings(&config.excluded_files);
        for folder in &config.excluded_folders {
            let folder = folder.trim().trim_end_matches(['/', '\\']);
            if !folder.is_empty() {
                exclusions.push(ExclusionRule::Subtree(folder.to_string()));
            }
        }

        Profile {
            name: name.to_string(),
            root,
            catalog_dir,
            extraction_folder: config.extract_path.trim().to_string(),
            exclusions,
            duplicate_exclusions: config.duplicate_exclusions,
        }
    }

    /// Fatal checks that must pass before any scanning begins.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.root.exists() {
            return Err(Error::Profile(format!(
                "root folder '{}' of profile '{}' does not exist",
                self.root.display(),
                self.name
            )));
        }
        if !self.root.is_dir() {
            return Err(Error::Profile(format!(
                "root folder '{}' of profile '{}' is not a directory",
                self.root.display(),
                self.name
            )));
        }
        if self.extraction_folder.is_empty()
            || self.extraction_folder.contains(['/', '\\'])
        {
            return Err(Error::Profile(format!(
                "extract_path '{}' of profile '{}' must be a single folder name",
                self.extraction_folder, self.name
            )));
        }
        Ok(())
    }

    pub fn store_path(&self) -> PathBuf {
        self.catalog_dir.join(STORE_FILE_NAME)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.catalog_dir.join(SNAPSHOT_FILE_NAME)
    }

    pub fn duplicates_path(&self) -> PathBuf {
        self.catalog_dir.join(DUPLICATES_FILE_NAME)
    }
}

/// The profiles file, overridable with `LIBRARIAN_PROFILES`. Any format the
/// config crate understands (json, toml, yaml) is accepted.
fn profiles_path() -> PathBuf {
    env::var("LIBRARIAN_PROFILES")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_PROFILES_PATH))
}

pub fn load_profiles_from(path: &Path) -> Result<BTreeMap<String, ProfileConfig>, Error> {
    debug!("Loading profiles from {}", path.display());
    let builder = Config::builder()
        .add_source(ConfigFile::from(path).required(true))
        .build()?;
    Ok(builder.try_deserialize::<BTreeMap<String, ProfileConfig>>()?)
}

/// Profile precedence: explicit request, then the environment default, then
/// the alphabetically first profile. Names match case-insensitively, since
/// the config crate lowercases keys; the returned name is the map key.
pub fn select_profile_name(
    requested: Option<&str>,
    env_default: Option<&str>,
    available: &BTreeMap<String, ProfileConfig>,
) -> Result<String, Error> {
    let wanted = requested
        .or(env_default)
        .map(str::to_string)
        .or_else(|| available.keys().next().cloned());

    match wanted {
        Some(name) if available.contains_key(&name) => Ok(name),
        Some(name) => match available.keys().find(|key| key.eq_ignore_ascii_case(&name)) {
            Some(key) => Ok(key.clone()),
            None => {
                let names: Vec<&str> = available.keys().map(String::as_str).collect();
                Err(Error::Profile(format!(
                    "profile '{}' not found; available profiles: {}",
                    name,
                    names.join(", ")
                )))
            }
        },
        None => Err(Error::Profile(
            "no profiles defined; add at least one profile to the profiles file".to_string(),
        )),
    }
}

/// Load and validate the requested profile.
pub fn load_profile(requested: Option<&str>) -> Result<Profile, Error> {
    let env_default = env::var("DEFAULT_LIBRARY_PROFILE").ok();
    load_profile_from(&profiles_path(), requested, env_default.as_deref())
}

/// Like [`load_profile`] with the profiles file and environment default
/// given explicitly. The profile keeps the caller's spelling of its name.
pub fn load_profile_from(
    path: &Path,
    requested: Option<&str>,
    env_default: Option<&str>,
) -> Result<Profile, Error> {
    let mut profiles = load_profiles_from(path)?;
    let key = select_profile_name(requested, env_default, &profiles)?;
    let config = profiles
        .remove(&key)
        .ok_or_else(|| Error::Profile(format!("profile '{}' disappeared during load", key)))?;
    let display = requested
        .or(env_default)
        .filter(|wanted| wanted.eq_ignore_ascii_case(&key))
        .unwrap_or(&key);
    let profile = Profile::from_config(display, config);
    profile.validate()?;
    Ok(profile)
}
