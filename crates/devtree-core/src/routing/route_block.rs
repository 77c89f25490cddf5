//! Route block properties
//!
//! A route block keeps its settings as embedded markup in the `Properties`
//! field. Scripts inside it are pulled out into their own files:
//!
//! - event properties: `Events/<name>.isbl`
//! - actions: `Actions/<code>.isbl`
//! - the ribbon: `Ribbon.dfm`
//!
//! What remains is stored indented as `Properties.xml`. Route templates
//! reuse the property, action and ribbon steps below for their own markup.

use devtree_model::xml::Element;
use devtree_model::xml::fragment::Fragment;
use devtree_model::{Codepage, Field, Row};

use super::{Code, ExportCtx, ImportCtx, SideReader, SideWriter};
use crate::{Error, Result};

pub(crate) const PROPERTIES: Code = Code::same("Properties");

pub(crate) const MIME_MARKER: &str = "{5314B05F-CF9F-4F66-99EC-24992A5FB114}";
pub(crate) const PROPERTIES_FILE: &str = "Properties.xml";
pub(crate) const RIBBON_FILE: &str = "Ribbon.dfm";

const PROPERTY_PATH: &str = "Blocks/Block/Properties/Property";
const ACTION_PATH: &str = "Blocks/Block/Actions/Action";
const RIBBON_PATH: &str = "Blocks/Block/Ribbon";

/// Event properties and the files holding their scripts.
const EVENT_FILES: [(&str, &str); 14] = [
    ("BeforeStart", "BeforeStart.isbl"),
    ("AfterFinish", "AfterFinish.isbl"),
    ("OnCreateJobs", "OnCreateJobs.isbl"),
    ("SubTaskCreate", "SubTaskCreate.isbl"),
    ("SubtaskInit", "SubtaskInit.isbl"),
    ("SubtaskStart", "SubtaskStart.isbl"),
    ("BeforeQueryParams", "BeforeQueryParams.isbl"),
    ("AfterQueryParams", "AfterQueryParams.isbl"),
    ("OnCreateNotices", "OnCreateNotices.isbl"),
    ("OnFormShow", "OnFormShow.isbl"),
    ("OnFormHide", "OnFormHide.isbl"),
    ("SearchScript", "Monitoring.isbl"),
    ("Script", "Calculation.isbl"),
    ("ISBL", "Condition.isbl"),
];

fn event_file(property: &str) -> Option<&'static str> {
    EVENT_FILES
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, file)| *file)
}

/// `name` below `folder`; an empty folder is the component folder itself.
pub(crate) fn under(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

pub(crate) fn mime_decode(value: &str, codepage: Codepage) -> Result<Option<String>> {
    let Some(encoded) = value.strip_prefix(MIME_MARKER) else {
        return Ok(None);
    };
    codepage
        .decode_opaque(Some(encoded))
        .map_err(|e| Error::malformed("route property", e))
}

pub(crate) fn mime_encode(text: &str, codepage: Codepage) -> String {
    format!("{MIME_MARKER}{}", codepage.encode_opaque(Some(text)))
}

/// Every `Value/Value` element of a property.
fn values_mut(property: &mut Element) -> Vec<&mut Element> {
    property.select_mut("Value/Value")
}

/// Move event property scripts to `<folder>/Events/` and decode the other
/// MIME-coded values in place.
pub(crate) fn export_properties<W: SideWriter + ?Sized>(
    out: &mut W,
    folder: &str,
    properties: Vec<&mut Element>,
    cp: Codepage,
) -> Result<()> {
    for property in properties {
        let name = property.attr("Name").unwrap_or_default().to_string();
        match event_file(&name) {
            Some(file) => {
                if let Some(value) = values_mut(property).into_iter().next() {
                    let script = match value.text() {
                        Some(text) => mime_decode(text, cp)?,
                        None => None,
                    };
                    if let Some(script) = script {
                        out.write_side(&under(folder, &format!("Events/{file}")), &script)?;
                        value.set_text("");
                    }
                }
            }
            None => {
                for value in values_mut(property) {
                    let decoded = match value.text() {
                        Some(text) => mime_decode(text, cp)?,
                        None => None,
                    };
                    if let Some(decoded) = decoded {
                        value.set_text(decoded);
                    }
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn import_properties<R: SideReader + ?Sized>(
    source: &R,
    folder: &str,
    properties: Vec<&mut Element>,
    cp: Codepage,
) -> Result<()> {
    for property in properties {
        let name = property.attr("Name").unwrap_or_default().to_string();
        match event_file(&name) {
            Some(file) => {
                let Some(script) = source.read_side(&under(folder, &format!("Events/{file}")))? else {
                    continue;
                };
                if let Some(value) = values_mut(property).into_iter().next() {
                    value.set_text(mime_encode(&script, cp));
                }
            }
            None => {
                for value in values_mut(property) {
                    if let Some(text) = value.text().filter(|t| !t.is_empty()).map(|t| mime_encode(t, cp)) {
                        value.set_text(text);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Move action scripts (`ISBLText`) to `<folder>/Actions/<code>.isbl`.
pub(crate) fn export_actions<W: SideWriter + ?Sized>(
    out: &mut W,
    folder: &str,
    actions: Vec<&mut Element>,
    cp: Codepage,
) -> Result<()> {
    for action in actions {
        let code = action.attr("Code").unwrap_or_default().to_string();
        if let Some(body) = action.select_mut("ISBLText").into_iter().next() {
            let script = cp
                .decode_opaque(body.text())
                .map_err(|e| Error::malformed("route action", e))?;
            if let Some(script) = script {
                out.write_side(&under(folder, &format!("Actions/{code}.isbl")), &script)?;
                body.set_text("");
            }
        }
    }
    Ok(())
}

pub(crate) fn import_actions<R: SideReader + ?Sized>(
    source: &R,
    folder: &str,
    actions: Vec<&mut Element>,
    cp: Codepage,
) -> Result<()> {
    for action in actions {
        let code = action.attr("Code").unwrap_or_default().to_string();
        let Some(script) = source.read_side(&under(folder, &format!("Actions/{code}.isbl")))? else {
            continue;
        };
        if let Some(body) = action.select_mut("ISBLText").into_iter().next() {
            body.set_text(cp.encode_opaque(Some(&script)));
        }
    }
    Ok(())
}

/// Move a ribbon's text to `<folder>/Ribbon.dfm`.
pub(crate) fn export_ribbon<W: SideWriter + ?Sized>(out: &mut W, folder: &str, ribbon: &mut Element) -> Result<()> {
    if let Some(text) = ribbon.text().filter(|t| !t.is_empty()).map(str::to_string) {
        out.write_side(&under(folder, RIBBON_FILE), &text)?;
        ribbon.set_text("");
    }
    Ok(())
}

pub(crate) fn import_ribbon<R: SideReader + ?Sized>(source: &R, folder: &str, ribbon: &mut Element) -> Result<()> {
    if let Some(text) = source.read_side(&under(folder, RIBBON_FILE))? {
        ribbon.set_text(text);
    }
    Ok(())
}

pub(crate) fn export(ctx: &mut ExportCtx<'_>, row: &Row) -> Result<()> {
    let cp = ctx.codepage;
    let Some(text) = row.text(PROPERTIES.pick(cp), cp)? else {
        return Ok(());
    };
    let mut fragment = Fragment::parse(&text, PROPERTIES_FILE)?;

    export_properties(ctx, "", fragment.root.select_mut(PROPERTY_PATH), cp)?;
    export_actions(ctx, "", fragment.root.select_mut(ACTION_PATH), cp)?;
    if let Some(ribbon) = fragment.root.select_mut(RIBBON_PATH).into_iter().next() {
        export_ribbon(ctx, "", ribbon)?;
    }

    ctx.write_text(PROPERTIES_FILE, &fragment.to_indented_string()?)
}

pub(crate) fn import(ctx: &ImportCtx, row: &mut Row) -> Result<()> {
    let cp = ctx.codepage;
    let Some(text) = ctx.read_text(PROPERTIES_FILE)? else {
        row.upsert(Field::text(PROPERTIES.pick(cp), cp, None));
        return Ok(());
    };
    let mut fragment = Fragment::parse(&text, PROPERTIES_FILE)?;

    import_properties(ctx, "", fragment.root.select_mut(PROPERTY_PATH), cp)?;
    import_actions(ctx, "", fragment.root.select_mut(ACTION_PATH), cp)?;
    if let Some(ribbon) = fragment.root.select_mut(RIBBON_PATH).into_iter().next() {
        import_ribbon(ctx, "", ribbon)?;
    }

    let stored = to_stored_form(&fragment)?;
    row.upsert(Field::text(PROPERTIES.pick(cp), cp, Some(&stored)));
    Ok(())
}

/// Compact form as the platform stores it: a line break after the
/// declaration, a line break and tab after `<Settings>`, and a final line break.
fn to_stored_form(fragment: &Fragment) -> Result<String> {
    let compact = fragment.to_compact_string()?;
    let mut stored = match compact.find("<Settings>") {
        Some(at) => {
            let end = at + "<Settings>".len();
            format!("{}\r\n\t{}", &compact[..end], &compact[end..])
        }
        None => compact,
    };
    stored.push_str("\r\n");
    Ok(stored)
}
