use crate::data::{
    Error, CODE_COLUMN, DATA_DIR, DELIMITER, FLAG_COLUMN, KEY_COLUMN, MEMBERSHIP_FILE, TARGET_FILE,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// What to do when the target file has no flag column at all.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingFlagColumn {
    /// Add the column at the end of the header and of every row.
    #[default]
    Append,
    /// Stop with a missing column error.
    Fail,
}

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub target: PathBuf,
    pub membership: PathBuf,
    pub key_column: String,
    pub code_column: String,
    pub flag_column: String,
    pub delimiter: u8,
    pub missing_flag_column: MissingFlagColumn,
}

/// Layout of the YAML configuration file; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigFile {
    pub target: Option<PathBuf>,
    pub membership: Option<PathBuf>,
    pub key_column: Option<String>,
    pub code_column: Option<String>,
    pub flag_column: Option<String>,
    pub delimiter: Option<char>,
    pub missing_flag_column: Option<MissingFlagColumn>,
}

pub(crate) fn delimiter_byte(delimiter: char) -> Result<u8, Error> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or(Error::InvalidDelimiter(delimiter))
}

impl Config {
    /// The historical layout: both files under `prod-data/` next to `base`.
    pub fn with_base_dir(base: &Path) -> Self {
        let data = base.join(DATA_DIR);
        Self {
            target: data.join(TARGET_FILE),
            membership: data.join(MEMBERSHIP_FILE),
            key_column: KEY_COLUMN.to_owned(),
            code_column: CODE_COLUMN.to_owned(),
            flag_column: FLAG_COLUMN.to_owned(),
            delimiter: DELIMITER,
            missing_flag_column: MissingFlagColumn::default(),
        }
    }

    /// Overlays `file` on top of `self`. Relative paths in the file are taken
    /// relative to `file_dir`.
    pub fn merge(mut self, file: ConfigFile, file_dir: &Path) -> Result<Self, Error> {
        if let Some(target) = file.target {
            self.target = file_dir.join(target);
        }
        if let Some(membership) = file.membership {
            self.membership = file_dir.join(membership);
        }
        if let Some(column) = file.key_column {
            self.key_column = column;
        }
        if let Some(column) = file.code_column {
            self.code_column = column;
        }
        if let Some(column) = file.flag_column {
            self.flag_column = column;
        }
        if let Some(delimiter) = file.delimiter {
            self.delimiter = delimiter_byte(delimiter)?;
        }
        if let Some(missing) = file.missing_flag_column {
            self.missing_flag_column = missing;
        }
        Ok(self)
    }

    pub fn overlay_yaml(self, text: &str, file_dir: &Path) -> Result<Self, Error> {
        // an empty document has no mapping to deserialize
        if text.trim().is_empty() {
            return Ok(self);
        }
        let file: ConfigFile = serde_yaml::from_str(text)?;
        self.merge(file, file_dir)
    }
}
