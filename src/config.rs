// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Name of the config file, both for the root and for episode folders
pub const CONFIG_FILENAME: &str = "config.json";

/// Process-wide settings, loaded once per run
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Prefix for every feed, episode and image URL
    pub base_url: String,
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    /// Remaining keys act as feed defaults for every folder
    #[serde(flatten)]
    pub defaults: FeedOverrides,
    /// File this config was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Feed attributes that a config file may set or replace.
///
/// Known attributes are typed; every other key lands in `extra`, as does a
/// known key whose value has the wrong type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, serde_json::Value>")]
pub struct FeedOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Config {
    /// Create a config in code, without a backing file
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            base_url: base_url.into(),
            root_folder: None,
            defaults: FeedOverrides::default(),
            source: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read the root config from a JSON file.
    ///
    /// A relative `root_folder` is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = read_config_file(path)?;
        let mut config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::JsonParseFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        config.validate()?;

        if let Some(root) = &config.root_folder
            && root.is_relative()
            && let Some(parent) = path.parent()
        {
            config.root_folder = Some(parent.join(root));
        }
        config.source = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load the config for a root directory, which must contain `config.json`.
    ///
    /// The directory itself becomes the root folder.
    pub fn load_for_root(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(&root.join(CONFIG_FILENAME))?;
        config.root_folder = Some(root.to_path_buf());
        Ok(config)
    }

    /// The root folder to scan, or an error if the config never named one
    pub fn root(&self) -> Result<&Path, ConfigError> {
        self.root_folder.as_deref().ok_or_else(|| {
            ConfigError::MissingRootFolder(self.source.clone().unwrap_or_default())
        })
    }

    /// `base_url` without trailing slashes, ready to have segments appended
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            base_url: self.base_url.clone(),
            source: e,
        })?;
        Ok(())
    }
}

impl FeedOverrides {
    /// Read a folder's `config.json`, if it has one
    pub fn load_for_folder(folder: &Path) -> Result<Option<Self>, ConfigError> {
        let path = folder.join(CONFIG_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }

        let content = read_config_file(&path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| ConfigError::JsonParseFailed { path, source: e })
    }

    /// Apply `other` on top of `self`; values set in `other` win
    pub fn overlay(&mut self, other: &FeedOverrides) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        take(&mut self.title, &other.title);
        take(&mut self.description, &other.description);
        take(&mut self.website, &other.website);
        take(&mut self.image, &other.image);
        take(&mut self.explicit, &other.explicit);
        take(&mut self.author, &other.author);
        take(&mut self.language, &other.language);
        take(&mut self.copyright, &other.copyright);
        take(&mut self.category, &other.category);
        take(&mut self.subcategory, &other.subcategory);
        take(&mut self.owner_name, &other.owner_name);
        take(&mut self.owner_email, &other.owner_email);
        take(&mut self.subtitle, &other.subtitle);
        take(&mut self.summary, &other.summary);
        take(&mut self.complete, &other.complete);

        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

impl From<BTreeMap<String, serde_json::Value>> for FeedOverrides {
    fn from(mut map: BTreeMap<String, serde_json::Value>) -> Self {
        if let Some(name) = map.remove("name") {
            map.entry("title".to_string()).or_insert(name);
        }

        Self {
            title: take_typed(&mut map, "title"),
            description: take_typed(&mut map, "description"),
            website: take_typed(&mut map, "website"),
            image: take_typed(&mut map, "image"),
            explicit: take_typed(&mut map, "explicit"),
            author: take_typed(&mut map, "author"),
            language: take_typed(&mut map, "language"),
            copyright: take_typed(&mut map, "copyright"),
            category: take_typed(&mut map, "category"),
            subcategory: take_typed(&mut map, "subcategory"),
            owner_name: take_typed(&mut map, "owner_name"),
            owner_email: take_typed(&mut map, "owner_email"),
            subtitle: take_typed(&mut map, "subtitle"),
            summary: take_typed(&mut map, "summary"),
            complete: take_typed(&mut map, "complete"),
            extra: map,
        }
    }
}

/// Move `key` out of `map` if its value has type `T`.
///
/// A value of another type stays in `map` and is logged.
fn take_typed<T: DeserializeOwned>(
    map: &mut BTreeMap<String, serde_json::Value>,
    key: &str,
) -> Option<T> {
    let value = map.remove(key)?;
    if value.is_null() {
        return None;
    }

    match serde_json::from_value(value.clone()) {
        Ok(typed) => Some(typed),
        Err(e) => {
            tracing::warn!(%key, error = %e, "Ignoring feed attribute of the wrong type");
            map.insert(key.to_string(), value);
            None
        }
    }
}

fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
