//! Grouped policy
//!
//! Localization strings have no folder of their own. They are gathered by
//! group code into `<GROUP>/Card.xml`, and a partial export merges into the
//! strings already on disk instead of replacing them.

use std::collections::{BTreeMap, BTreeSet};

use devtree_fs::{NormalizedPath, io};
use devtree_model::xml::header::{read_group_header, write_group_header};
use devtree_model::{Codepage, Component, Row};
use tracing::debug;

use super::HEADER_FILE;
use super::export::component_folder;
use crate::routing::{Code, ExportCtx, ImportCtx, RoutingConfig};
use crate::source::RecordKey;
use crate::sync::{WriteSet, prune};
use crate::{Error, Result};

const GROUP_CODE: Code = Code::same("ISBGroupCode");
const LANGUAGE: Code = Code::same("ISBLanguage");

/// Group code of a string: the first value row's group field.
fn group_code(component: &Component, codepage: Codepage) -> Result<Option<String>> {
    match component.section(1).and_then(|s| s.rows.first()) {
        Some(row) => Ok(row.text(GROUP_CODE.pick(codepage), codepage)?),
        None => Ok(None),
    }
}

/// Order the value rows by language, descending and ignoring case.
fn sort_languages(component: &mut Component, codepage: Codepage) -> Result<()> {
    let Some(section) = component.section_mut(1) else {
        return Ok(());
    };
    let mut keyed: Vec<(String, Row)> = Vec::with_capacity(section.rows.len());
    for row in section.rows.drain(..) {
        let language = row
            .text(LANGUAGE.pick(codepage), codepage)?
            .unwrap_or_default()
            .to_lowercase();
        keyed.push((language, row));
    }
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    section.rows = keyed.into_iter().map(|(_, row)| row).collect();
    Ok(())
}

pub(super) fn export(
    config: &RoutingConfig,
    components: &[Component],
    kind_folder: &NormalizedPath,
    codepage: Codepage,
) -> Result<usize> {
    let mut groups: BTreeMap<String, Vec<Component>> = BTreeMap::new();
    for component in components {
        let mut component = component.clone();
        let group = group_code(&component, codepage)?.ok_or_else(|| Error::MissingField {
            kind: config.kind,
            component: component.key.clone(),
            field: GROUP_CODE.pick(codepage).to_string(),
        })?;
        sort_languages(&mut component, codepage)?;
        groups.entry(group.to_uppercase()).or_default().push(component);
    }

    for (group, fresh) in groups {
        let folder = component_folder(config.kind, kind_folder, &group)?;
        io::ensure_dir(&folder)?;
        let prior = match io::read_optional(&folder.join(HEADER_FILE))? {
            Some(bytes) => read_group_header(&bytes, codepage)?,
            None => Vec::new(),
        };

        let mut writes = WriteSet::new();
        writes.record_folder(folder.clone());
        let mut ctx = ExportCtx::new(config.kind, group.clone(), folder.clone(), codepage, &mut writes);

        let mut merged = Vec::with_capacity(fresh.len() + prior.len());
        for mut component in fresh {
            config.apply_export(&mut component, &mut ctx)?;
            merged.push(component);
        }
        // Prior strings are matched on the exact key.
        let fresh_keys: BTreeSet<String> = merged.iter().map(|c| c.key.clone()).collect();
        merged.extend(prior.into_iter().filter(|c| !fresh_keys.contains(&c.key)));
        merged.sort_by(|a, b| a.key.cmp(&b.key));

        ctx.write_bytes(HEADER_FILE, &write_group_header(&merged, codepage)?)?;
        prune(&folder, &writes)?;
        debug!(kind = %config.kind, group = %group, strings = merged.len(), "exported group");
    }
    Ok(components.len())
}

pub(super) fn import(
    config: &RoutingConfig,
    folders: &[NormalizedPath],
    codepage: Codepage,
) -> Result<Vec<Component>> {
    let mut components = Vec::new();
    for folder in folders {
        let bytes = io::read_bytes(&folder.join(HEADER_FILE))?;
        for mut component in read_group_header(&bytes, codepage)? {
            let ctx = ImportCtx::new(config.kind, component.key.clone(), folder.clone(), codepage);
            config.apply_import(&mut component, &ctx)?;
            components.push(component);
        }
        debug!(kind = %config.kind, folder = %folder, "imported group");
    }
    Ok(components)
}

/// Drop strings whose `(group, code)` pair is gone from `keys`.
///
/// Group files left without strings are removed with their folder.
pub(super) fn delete(
    config: &RoutingConfig,
    keys: &BTreeSet<RecordKey>,
    kind_folder: &NormalizedPath,
    codepage: Codepage,
) -> Result<usize> {
    let live: BTreeSet<(String, String)> = keys
        .iter()
        .map(|key| {
            let part = |i: usize| key.0.get(i).map(|v| v.to_lowercase()).unwrap_or_default();
            (part(0), part(1))
        })
        .collect();

    let mut deleted = 0;
    for folder in io::list_subdirs(kind_folder)? {
        let header = folder.join(HEADER_FILE);
        let Some(bytes) = io::read_optional(&header)? else {
            continue;
        };
        let fallback = folder.file_name().unwrap_or_default().to_string();

        let strings = read_group_header(&bytes, codepage)?;
        let before = strings.len();
        let mut kept = Vec::with_capacity(before);
        for component in strings {
            let group = group_code(&component, codepage)?.unwrap_or_else(|| fallback.clone());
            if live.contains(&(group.to_lowercase(), component.key.to_lowercase())) {
                kept.push(component);
            }
        }

        let removed = before - kept.len();
        if removed == 0 {
            continue;
        }
        if kept.is_empty() {
            io::remove_dir_all(&folder)?;
        } else {
            io::write_if_changed(&header, &write_group_header(&kept, codepage)?)?;
        }
        debug!(kind = %config.kind, folder = %folder, removed, "deleted strings");
        deleted += removed;
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use devtree_model::Field;
    use devtree_test_utils::fixtures;

    #[test]
    fn languages_sort_descending_ignoring_case() {
        let cp = Codepage::English;
        let row = |language: &str| Row::from_fields([Field::scalar("ISBLanguage", language)]);
        let mut component =
            fixtures::with_rows(Component::new("S"), 1, vec![row("en"), row("RU"), row("de")]);

        sort_languages(&mut component, cp).unwrap();

        let order: Vec<_> = component
            .section(1)
            .unwrap()
            .rows
            .iter()
            .map(|r| r.text("ISBLanguage", cp).unwrap().unwrap())
            .collect();
        assert_eq!(order, ["RU", "en", "de"]);
    }

    #[test]
    fn group_code_comes_from_first_value_row() {
        let cp = Codepage::Russian;
        let component = fixtures::localization_string("Greeting", "Common", cp);
        assert_eq!(group_code(&component, cp).unwrap().as_deref(), Some("Common"));
        assert_eq!(group_code(&Component::new("S"), cp).unwrap(), None);
    }
}
