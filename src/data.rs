use std::{collections::HashSet, path::PathBuf};
use thiserror::Error;

pub const DATA_DIR: &str = "prod-data";
pub const TARGET_FILE: &str = "Comptes_PCG_CNCJ.csv";
pub const MEMBERSHIP_FILE: &str = "Comptes_CNCJ.csv";

pub const KEY_COLUMN: &str = "N° de compte";
pub const CODE_COLUMN: &str = "code";
pub const FLAG_COLUMN: &str = "isCNCJ";
pub const DELIMITER: u8 = b';';
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

/// How many keys are shown when reporting what was loaded.
pub const SAMPLE_SIZE: usize = 10;

/// Set of account numbers read from the membership file. Keys are stored
/// trimmed and are never empty; see `read::read_membership`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct MembershipSet {
    pub keys: HashSet<String>,
}

impl MembershipSet {
    pub fn contains(&self, code: &str) -> bool {
        self.keys.contains(code)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// The `n` smallest keys in byte order.
    pub fn sample(&self, n: usize) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        keys.sort_unstable();
        keys.truncate(n);
        keys
    }
}

/// One row of the target file. Fields line up with `TargetTable::headers`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct AccountRecord {
    pub fields: Vec<String>,
}

impl AccountRecord {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// The whole target file held in memory, header included.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct TargetTable {
    /// The file started with a UTF-8 byte order mark, written back as is.
    pub bom: bool,
    pub headers: Vec<String>,
    pub rows: Vec<AccountRecord>,
}

impl TargetTable {
    /// Every position of `name` in the header, in order.
    pub fn columns(&self, name: &str) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| *h == name)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Value written in the flag column. Only these two literals ever get written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flag {
    True,
    False,
}

impl Flag {
    pub fn from_membership(member: bool) -> Self {
        if member {
            Flag::True
        } else {
            Flag::False
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Flag::True => "true",
            Flag::False => "false",
        }
    }
}

/// Everything that can go wrong while syncing. Each variant maps to a process
/// exit code through `Error::exit_code`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("File {} does not exist", .0.display())]
    FileNotFound(PathBuf),
    #[error("Column `{0}` is missing from the header")]
    MissingColumn(String),
    #[error("Column `{0}` appears more than once in the header")]
    DuplicateColumn(String),
    #[error("Line {line} has {found} fields but the header has {expected}")]
    ExtraFields {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("Delimiter {0:?} is not a single ASCII character")]
    InvalidDelimiter(char),
    #[error("Cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("Write failed: {0}")]
    WriteFailure(#[source] std::io::Error),
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::FileNotFound(_) => 2,
            Error::MissingColumn(_) | Error::DuplicateColumn(_) => 3,
            Error::WriteFailure(_) => 4,
            _ => 1,
        }
    }
}
