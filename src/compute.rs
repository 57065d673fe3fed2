use crate::{
    config::MissingFlagColumn,
    data::{Error, Flag, MembershipSet, TargetTable},
    read::KeyCollector,
};
use tracing::{debug, warn};

impl KeyCollector for MembershipSet {
    fn collect_key(&mut self, key: &str) {
        if !self.keys.contains(key) {
            self.keys.insert(key.to_owned());
        }
    }
}

/// What `apply_membership` did to the table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct UpdateStats {
    /// Rows now flagged `true`.
    pub flagged: usize,
    /// Rows whose flag value differs from what the file held before.
    pub changed: usize,
}

/// Recomputes the flag column of every row from the membership set. Rows are
/// evaluated independently, so duplicate codes each get their own lookup.
/// A flag column repeated in the header gets the same value in each copy; a
/// repeated code column is refused since the lookup would be ambiguous.
pub(crate) fn apply_membership(
    table: &mut TargetTable,
    keys: &MembershipSet,
    code_column: &str,
    flag_column: &str,
    missing: MissingFlagColumn,
) -> Result<UpdateStats, Error> {
    let code = match table.columns(code_column)[..] {
        [index] => index,
        [] => return Err(Error::MissingColumn(code_column.to_owned())),
        _ => return Err(Error::DuplicateColumn(code_column.to_owned())),
    };
    let mut flags = table.columns(flag_column);
    if flags.is_empty() {
        if missing == MissingFlagColumn::Fail {
            return Err(Error::MissingColumn(flag_column.to_owned()));
        }
        warn!("column `{flag_column}` not found, appending it");
        table.headers.push(flag_column.to_owned());
        for row in &mut table.rows {
            row.fields.push(String::new());
        }
        flags.push(table.headers.len() - 1);
    } else if flags.len() > 1 {
        warn!("column `{flag_column}` appears {} times, updating each", flags.len());
    }
    let mut stats = UpdateStats::default();
    for row in &mut table.rows {
        let value = Flag::from_membership(keys.contains(row.fields[code].trim()));
        if value == Flag::True {
            stats.flagged += 1;
        }
        let mut changed = false;
        for &flag in &flags {
            if row.fields[flag] != value.as_str() {
                row.fields[flag] = value.as_str().to_owned();
                changed = true;
            }
        }
        if changed {
            debug!("{} -> {}", row.fields[code], value.as_str());
            stats.changed += 1;
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use crate::{
        config::MissingFlagColumn::*,
        data::{AccountRecord, Error, MembershipSet, TargetTable},
        read::KeyCollector,
    };

    use super::{apply_membership, UpdateStats};

    fn keys(keys: &[&str]) -> MembershipSet {
        let mut set = MembershipSet::default();
        for key in keys {
            set.collect_key(key);
        }
        set
    }

    fn table(headers: &[&str], rows: &[&[&str]]) -> TargetTable {
        TargetTable {
            bom: false,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(|r| AccountRecord::new(r.iter().copied())).collect(),
        }
    }

    #[test]
    fn test_collect_deduplicates() {
        let set = keys(&["401000", "401100", "401000"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("401000"));
        assert!(set.contains("401100"));
    }

    #[test]
    fn test_flag_rows() {
        let mut target = table(
            &["code", "libelle", "isCNCJ"],
            &[&["401000", "Fournisseurs", ""], &["512000", "Banque", "true"]],
        );
        let stats =
            apply_membership(&mut target, &keys(&["401000"]), "code", "isCNCJ", Append).unwrap();
        assert_eq!(
            target,
            table(
                &["code", "libelle", "isCNCJ"],
                &[
                    &["401000", "Fournisseurs", "true"],
                    &["512000", "Banque", "false"]
                ],
            )
        );
        assert_eq!(
            stats,
            UpdateStats {
                flagged: 1,
                changed: 2,
            }
        );
    }

    #[test]
    fn test_code_is_trimmed_but_kept() {
        let mut target = table(&["isCNCJ", "code"], &[&["", "  401000 "]]);
        apply_membership(&mut target, &keys(&["401000"]), "code", "isCNCJ", Append).unwrap();
        assert_eq!(target.rows[0].fields, ["true", "  401000 "]);
    }

    #[test]
    fn test_codes_are_opaque() {
        let mut target = table(&["code", "isCNCJ"], &[&["0401", ""], &["401", ""]]);
        let stats =
            apply_membership(&mut target, &keys(&["401"]), "code", "isCNCJ", Append).unwrap();
        assert_eq!(target.rows[0].fields[1], "false");
        assert_eq!(target.rows[1].fields[1], "true");
        assert_eq!(stats.flagged, 1);
    }

    #[test]
    fn test_duplicate_codes() {
        let mut target = table(
            &["code", "isCNCJ"],
            &[&["401000", "false"], &["401000", "false"]],
        );
        let stats =
            apply_membership(&mut target, &keys(&["401000"]), "code", "isCNCJ", Append).unwrap();
        assert_eq!(stats.flagged, 2);
        assert!(target.rows.iter().all(|r| r.fields[1] == "true"));
    }

    #[test]
    fn test_second_pass_changes_nothing() {
        let mut target = table(
            &["code", "isCNCJ"],
            &[&["401000", ""], &["512000", "maybe"]],
        );
        let set = keys(&["401000"]);
        apply_membership(&mut target, &set, "code", "isCNCJ", Append).unwrap();
        let first = target.clone();
        let stats = apply_membership(&mut target, &set, "code", "isCNCJ", Append).unwrap();
        assert_eq!(target, first);
        assert_eq!(stats.changed, 0);
        assert_eq!(stats.flagged, 1);
    }

    #[test]
    fn test_append_missing_flag() {
        let mut target = table(&["code", "libelle"], &[&["401000", "Fournisseurs"]]);
        let stats =
            apply_membership(&mut target, &keys(&["401000"]), "code", "isCNCJ", Append).unwrap();
        assert_eq!(
            target,
            table(
                &["code", "libelle", "isCNCJ"],
                &[&["401000", "Fournisseurs", "true"]]
            )
        );
        assert_eq!(stats.changed, 1);
    }

    #[test]
    fn test_fail_on_missing_flag() {
        let mut target = table(&["code"], &[&["401000"]]);
        let before = target.clone();
        let err = apply_membership(&mut target, &keys(&["401000"]), "code", "isCNCJ", Fail)
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn(c) if c == "isCNCJ"));
        assert_eq!(target, before);
    }

    #[test]
    fn test_repeated_flag_column() {
        let mut target = table(
            &["code", "isCNCJ", "isCNCJ"],
            &[&["401000", "x", "y"], &["512000", "false", "true"]],
        );
        let stats =
            apply_membership(&mut target, &keys(&["401000"]), "code", "isCNCJ", Append).unwrap();
        assert_eq!(
            target,
            table(
                &["code", "isCNCJ", "isCNCJ"],
                &[&["401000", "true", "true"], &["512000", "false", "false"]],
            )
        );
        assert_eq!(
            stats,
            UpdateStats {
                flagged: 1,
                changed: 2,
            }
        );
    }

    #[test]
    fn test_repeated_code_column() {
        let mut target = table(&["code", "code", "isCNCJ"], &[&["401000", "512000", ""]]);
        let before = target.clone();
        let err = apply_membership(&mut target, &keys(&["401000"]), "code", "isCNCJ", Append)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateColumn(c) if c == "code"));
        assert_eq!(target, before);
    }

    #[test]
    fn test_missing_code() {
        let mut target = table(&["numero", "isCNCJ"], &[&["401000", ""]]);
        let err = apply_membership(&mut target, &keys(&["401000"]), "code", "isCNCJ", Append)
            .unwrap_err();
        assert!(matches!(err, Error::MissingColumn(c) if c == "code"));
    }
}
