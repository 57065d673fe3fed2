use crate::{
    compute::{apply_membership, UpdateStats},
    config::Config,
    data::{Error, MembershipSet, SAMPLE_SIZE},
    read::{read_membership, read_target},
    write::replace_target,
};
use anyhow::Context;
use std::{fs::File, path::Path};
use tracing::info;

/// Outcome of one run, mostly for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Summary {
    pub keys: usize,
    pub rows: usize,
    pub stats: UpdateStats,
}

fn open(path: &Path) -> Result<File, Error> {
    File::open(path).map_err(|source| Error::Open {
        path: path.to_owned(),
        source,
    })
}

fn ensure_exists(path: &Path) -> Result<(), Error> {
    match path.try_exists() {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::FileNotFound(path.to_owned())),
        Err(source) => Err(Error::Open {
            path: path.to_owned(),
            source,
        }),
    }
}

/// Loads the membership keys, flags every row of the target file and, unless
/// `dry_run` is set, writes the target back in place.
pub(crate) fn run(config: &Config, dry_run: bool) -> anyhow::Result<Summary> {
    info!("PCG file: {}", config.target.display());
    info!("CNCJ file: {}", config.membership.display());
    // both are checked before anything is read
    ensure_exists(&config.target)?;
    ensure_exists(&config.membership)?;

    let mut keys = MembershipSet::default();
    read_membership(
        open(&config.membership)?,
        &config.key_column,
        config.delimiter,
        &mut keys,
    )
    .with_context(|| format!("reading {}", config.membership.display()))?;
    info!("found {} CNCJ accounts", keys.len());
    info!(
        "CNCJ accounts: {:?}{}",
        keys.sample(SAMPLE_SIZE),
        if keys.len() > SAMPLE_SIZE { " ..." } else { "" }
    );

    let mut table = read_target(open(&config.target)?, config.delimiter)
        .with_context(|| format!("reading {}", config.target.display()))?;
    let stats = apply_membership(
        &mut table,
        &keys,
        &config.code_column,
        &config.flag_column,
        config.missing_flag_column,
    )
    .with_context(|| format!("updating {}", config.target.display()))?;
    let summary = Summary {
        keys: keys.len(),
        rows: table.rows.len(),
        stats,
    };
    info!(
        "flagged {} of {} accounts with {}=true ({} changed)",
        summary.stats.flagged, summary.rows, config.flag_column, summary.stats.changed
    );
    if dry_run {
        info!("dry run, {} left untouched", config.target.display());
        return Ok(summary);
    }
    replace_target(&config.target, &table, config.delimiter)
        .with_context(|| format!("writing {}", config.target.display()))?;
    info!("{} updated", config.target.display());
    Ok(summary)
}
