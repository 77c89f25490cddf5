//! Export and import of the declarative routes

use std::collections::BTreeMap;

use devtree_codec::{EventKind, event};
use devtree_fs::escape;
use devtree_model::{Field, Row};

use super::{Code, ExportCtx, ImportCtx, Route};
use crate::Result;

const SCRIPT_EXTENSION: &str = "isbl";
const REQUISITES_FOLDER: &str = "Requisites";
const CHANGE_FILE: &str = "Requisite.Change.isbl";

impl Route {
    pub(crate) fn export(&self, ctx: &mut ExportCtx<'_>, row: &Row) -> Result<()> {
        let cp = ctx.codepage;
        match *self {
            Self::File { field, file } => {
                if let Some(found) = row.get(field.pick(cp)) {
                    let text = found.text_or_value(cp)?.unwrap_or_default();
                    ctx.write_text(file, &text)?;
                }
            }
            Self::Events { field, folder } => {
                if let Some(text) = row.text(field.pick(cp), cp)? {
                    for (kind, script) in event::parse(&text) {
                        ctx.write_text(&format!("{folder}/{}", kind.file_name()), &script)?;
                    }
                }
            }
            Self::RequisiteEvents {
                code,
                change,
                select,
            } => {
                let change = row.text(change.pick(cp), cp)?;
                let select = row.text(select.pick(cp), cp)?;
                if change.is_none() && select.is_none() {
                    return Ok(());
                }
                let folder = requisite_folder(&code_value_for_export(ctx, row, code)?);
                if let Some(change) = change {
                    ctx.write_text(&format!("{folder}/{CHANGE_FILE}"), &change)?;
                }
                if let Some(select) = select {
                    for (kind, script) in event::parse(&select) {
                        // Script text without a marker belongs to the select event.
                        let kind = if kind == EventKind::Unknown {
                            EventKind::Select
                        } else {
                            kind
                        };
                        ctx.write_text(&format!("{folder}/{}", kind.file_name()), &script)?;
                    }
                }
            }
            Self::Named { code, text, folder } => {
                if let Some(text) = row.text(text.pick(cp), cp)? {
                    let name = escape(&code_value_for_export(ctx, row, code)?);
                    ctx.write_text(&format!("{folder}/{name}.{SCRIPT_EXTENSION}"), &text)?;
                }
            }
            Self::Subfolder {
                folder,
                code,
                files,
            } => {
                let mut texts = Vec::with_capacity(files.len());
                for (field, file) in files {
                    texts.push((*file, row.text(field.pick(cp), cp)?));
                }
                if texts.iter().all(|(_, text)| text.is_none()) {
                    return Ok(());
                }
                let name = escape(&code_value_for_export(ctx, row, code)?);
                for (file, text) in texts {
                    if let Some(text) = text {
                        ctx.write_text(&format!("{folder}/{name}/{file}"), &text)?;
                    }
                }
            }
            Self::EmptyOnImport { .. } => {}
            Self::Custom { export, .. } => export(ctx, row)?,
        }
        Ok(())
    }

    pub(crate) fn import(&self, ctx: &ImportCtx, row: &mut Row) -> Result<()> {
        let cp = ctx.codepage;
        match *self {
            Self::File { field, file } => {
                row.upsert(Field::from_file(field.pick(cp), cp, &ctx.path(file))?);
            }
            Self::Events { field, folder } => {
                let text = load_events(ctx, folder)?;
                row.upsert(Field::text(field.pick(cp), cp, Some(&text)));
            }
            Self::RequisiteEvents {
                code,
                change,
                select,
            } => {
                let folder = requisite_folder(&code_value_for_import(ctx, row, code)?);
                let change_path = ctx.path(&format!("{folder}/{CHANGE_FILE}"));
                row.upsert(Field::from_file(change.pick(cp), cp, &change_path)?);
                let text = load_events(ctx, &folder)?;
                row.upsert(Field::text(select.pick(cp), cp, Some(&text)));
            }
            Self::Named { code, text, folder } => {
                let name = escape(&code_value_for_import(ctx, row, code)?);
                let path = ctx.path(&format!("{folder}/{name}.{SCRIPT_EXTENSION}"));
                row.upsert(Field::from_file(text.pick(cp), cp, &path)?);
            }
            Self::Subfolder {
                folder,
                code,
                files,
            } => {
                let name = escape(&code_value_for_import(ctx, row, code)?);
                for (field, file) in files {
                    let path = ctx.path(&format!("{folder}/{name}/{file}"));
                    row.upsert(Field::from_file(field.pick(cp), cp, &path)?);
                }
            }
            Self::EmptyOnImport { field } => row.upsert(Field::empty(field.pick(cp))),
            Self::Custom { import, .. } => import(ctx, row)?,
        }
        Ok(())
    }
}

fn requisite_folder(code: &str) -> String {
    format!("{REQUISITES_FOLDER}/{}", escape(code))
}

fn code_value_for_export(ctx: &ExportCtx<'_>, row: &Row, code: Code) -> Result<String> {
    let name = code.pick(ctx.codepage);
    row.text(name, ctx.codepage)?
        .ok_or_else(|| ctx.missing(name))
}

fn code_value_for_import(ctx: &ImportCtx, row: &Row, code: Code) -> Result<String> {
    let name = code.pick(ctx.codepage);
    row.text(name, ctx.codepage)?
        .ok_or_else(|| ctx.missing(name))
}

/// Join every event script found in `folder` back into one payload.
fn load_events(ctx: &ImportCtx, folder: &str) -> Result<String> {
    let mut events = BTreeMap::new();
    for &kind in EventKind::all() {
        if let Some(text) = ctx.read_text(&format!("{folder}/{}", kind.file_name()))? {
            events.insert(kind, text);
        }
    }
    Ok(event::join(&events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Kind;
    use crate::sync::WriteSet;
    use devtree_fs::NormalizedPath;
    use devtree_model::Codepage;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const CP: Codepage = Codepage::English;

    fn roundtrip(route: Route, row: Row) -> (Row, Vec<String>) {
        let dir = TempDir::new().unwrap();
        let folder = NormalizedPath::new(dir.path());
        let mut writes = WriteSet::new();
        let mut ctx = ExportCtx::new(Kind::Dialogs, "D1", folder.clone(), CP, &mut writes);
        route.export(&mut ctx, &row).unwrap();

        let written = writes
            .files()
            .filter_map(|path| path.relative_to(&folder))
            .collect();

        let mut reduced = row.clone();
        let codes: Vec<_> = route.consumed().iter().map(|c| c.pick(CP)).collect();
        reduced.remove_codes(&codes);
        let ctx = ImportCtx::new(Kind::Dialogs, "D1", folder, CP);
        route.import(&ctx, &mut reduced).unwrap();
        (reduced, written)
    }

    #[test]
    fn lone_select_script_goes_to_select_file() {
        let row = Row::from_fields([
            Field::scalar("Code", "Amount"),
            Field::text("OnSelect", CP, Some("Pick()")),
        ]);
        let route = Route::RequisiteEvents {
            code: Code::same("Code"),
            change: Code::same("OnChange"),
            select: Code::same("OnSelect"),
        };

        let (restored, written) = roundtrip(route, row);

        assert_eq!(written, vec!["Requisites/Amount/Requisite.Select.isbl"]);
        assert_eq!(
            restored.text("OnSelect", CP).unwrap().as_deref(),
            Some("Pick()")
        );
        assert_eq!(restored.text("OnChange", CP).unwrap(), None);
    }

    #[test]
    fn named_file_uses_escaped_code() {
        let row = Row::from_fields([
            Field::scalar("Name", "a/b"),
            Field::text("Calculation", CP, Some("X = 1")),
        ]);
        let route = Route::Named {
            code: Code::same("Name"),
            text: Code::same("Calculation"),
            folder: "Methods",
        };

        let (restored, written) = roundtrip(route, row.clone());

        assert_eq!(written, vec!["Methods/a_b.isbl"]);
        assert_eq!(restored, row);
    }

    #[test]
    fn missing_code_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut writes = WriteSet::new();
        let mut ctx = ExportCtx::new(
            Kind::Dialogs,
            "D1",
            NormalizedPath::new(dir.path()),
            CP,
            &mut writes,
        );
        let row = Row::from_fields([Field::text("Calculation", CP, Some("X = 1"))]);
        let route = Route::Named {
            code: Code::same("Name"),
            text: Code::same("Calculation"),
            folder: "Methods",
        };

        let err = route.export(&mut ctx, &row).unwrap_err();
        assert!(matches!(err, crate::Error::MissingField { ref field, .. } if field == "Name"));
    }
}
