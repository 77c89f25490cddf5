//! Route templates
//!
//! A route template keeps its markup in a payload file named by its
//! `ISBSearchCondition` (or `ISBEvent`) requisite. Export stores the markup
//! indented as `Properties.xml` after pulling scripts out:
//!
//! - properties and actions: as for route blocks
//! - task events (`Event/*`): `Events/<event file>`
//! - the route ribbon: `Ribbon.dfm`
//! - each block: `Blocks/<name or id>/` with its own properties, task events
//!   and ribbon
//!
//! Import reverses this and writes the markup back as
//! `TipMarsh_ТМТ_<folder>_ISBSearchCondition.IMG`.

use devtree_fs::escape;
use devtree_model::xml::fragment::Fragment;
use devtree_model::xml::{Element, Node};
use devtree_model::{Codepage, RecordRef, Requisite, TEXT_KIND};
use tracing::debug;

use super::{RecordExportCtx, RecordImportCtx};
use crate::Result;
use crate::routing::route_block::{
    PROPERTIES_FILE, RIBBON_FILE, export_actions, export_properties, export_ribbon, import_actions,
    import_properties, import_ribbon, mime_decode, mime_encode, under,
};
use crate::routing::{SideReader, SideWriter};

pub(super) const SEARCH_CONDITION: &str = "ISBSearchCondition";
const EVENT: &str = "ISBEvent";

const PROPERTY_PATH: &str = "Properties/Property";
const ACTION_PATH: &str = "RouteActions/Action";
const EVENT_PATH: &str = "Event";
const ROUTE_RIBBON_PATH: &str = "RouteRibbon";
const BLOCK_PATH: &str = "Blocks/Block";
const BLOCK_RIBBON_PATH: &str = "Ribbon";

/// Task events and the files holding their scripts.
const TASK_EVENT_FILES: [(&str, &str); 3] = [
    ("InitScript", "TaskBeforeSelection.isbl"),
    ("Script", "TaskAfterSelection.isbl"),
    ("TaskStart", "TaskStartPossibility.isbl"),
];

fn task_event_file(event: &str) -> String {
    TASK_EVENT_FILES
        .iter()
        .find(|(name, _)| *name == event)
        .map(|(_, file)| format!("Events/{file}"))
        .unwrap_or_else(|| format!("Events/{event}.isbl"))
}

pub(super) fn export(ctx: &mut RecordExportCtx<'_>, record: &mut RecordRef) -> Result<()> {
    for requisite in &mut record.requisites {
        if requisite.name != SEARCH_CONDITION && requisite.name != EVENT {
            continue;
        }
        let Some(payload) = requisite
            .value
            .clone()
            .filter(|v| !v.trim().is_empty())
        else {
            continue;
        };
        let text = ctx.read_payload(&payload)?.unwrap_or_default();
        requisite.value = Some(String::new());

        let properties = match Fragment::parse(&text, PROPERTIES_FILE) {
            Ok(mut fragment) => {
                export_markup(ctx, &mut fragment.root)?;
                fragment.to_indented_string()?
            }
            Err(e) => {
                debug!(payload = %payload, "route markup kept verbatim: {e}");
                text
            }
        };
        ctx.write_text(PROPERTIES_FILE, &properties)?;
    }
    Ok(())
}

/// The markup is appended as `ISBSearchCondition` when `Properties.xml` exists.
pub(super) fn import(ctx: &RecordImportCtx<'_>, record: &mut RecordRef) -> Result<()> {
    let Some(text) = ctx.read_text(PROPERTIES_FILE)?.filter(|t| !t.trim().is_empty()) else {
        return Ok(());
    };
    let stored = match Fragment::parse(&text, PROPERTIES_FILE) {
        Ok(mut fragment) => {
            import_markup(ctx, &mut fragment.root, ctx.codepage)?;
            fragment.to_indented_string()?
        }
        Err(_) => text,
    };

    let payload = format!("TipMarsh_ТМТ_{}_{SEARCH_CONDITION}.IMG", ctx.folder_name());
    ctx.write_payload(&payload, &ctx.codepage.encode_opaque(Some(&stored)))?;
    record.requisites.push(Requisite {
        name: SEARCH_CONDITION.into(),
        value: Some(payload),
        kind: Some(TEXT_KIND.into()),
        ..Requisite::default()
    });
    Ok(())
}

fn block_folder(block: &Element) -> String {
    let name = block
        .attr("Name")
        .filter(|n| !n.trim().is_empty())
        .or_else(|| block.attr("ID"))
        .unwrap_or_default();
    format!("Blocks/{}", escape(name))
}

fn export_markup(ctx: &mut RecordExportCtx<'_>, root: &mut Element) -> Result<()> {
    let cp = ctx.codepage;
    export_properties(ctx, "", root.select_mut(PROPERTY_PATH), cp)?;
    export_actions(ctx, "", root.select_mut(ACTION_PATH), cp)?;
    export_task_events(ctx, "", root.select_mut(EVENT_PATH), cp)?;
    if let Some(ribbon) = root.select_mut(ROUTE_RIBBON_PATH).into_iter().next() {
        let text = inner_text(ribbon);
        if !text.is_empty() {
            ctx.write_side(RIBBON_FILE, &text)?;
            ribbon.children.clear();
        }
    }

    for block in root.select_mut(BLOCK_PATH) {
        let folder = block_folder(block);
        export_properties(ctx, &folder, block.select_mut(PROPERTY_PATH), cp)?;
        export_task_events(ctx, &folder, block.select_mut(EVENT_PATH), cp)?;
        if let Some(ribbon) = block.select_mut(BLOCK_RIBBON_PATH).into_iter().next() {
            export_ribbon(ctx, &folder, ribbon)?;
        }
    }
    Ok(())
}

fn import_markup<R: SideReader + ?Sized>(source: &R, root: &mut Element, cp: Codepage) -> Result<()> {
    import_properties(source, "", root.select_mut(PROPERTY_PATH), cp)?;
    import_actions(source, "", root.select_mut(ACTION_PATH), cp)?;
    import_task_events(source, "", root.select_mut(EVENT_PATH), cp)?;
    if let Some(ribbon) = root.select_mut(ROUTE_RIBBON_PATH).into_iter().next() {
        if let Some(text) = source.read_side(RIBBON_FILE)? {
            let mut value = Element::new("Value");
            value.children.push(Node::CData(text));
            ribbon.push(value);
        }
    }

    for block in root.select_mut(BLOCK_PATH) {
        let folder = block_folder(block);
        import_properties(source, &folder, block.select_mut(PROPERTY_PATH), cp)?;
        import_task_events(source, &folder, block.select_mut(EVENT_PATH), cp)?;
        if let Some(ribbon) = block.select_mut(BLOCK_RIBBON_PATH).into_iter().next() {
            import_ribbon(source, &folder, ribbon)?;
        }
    }
    Ok(())
}

/// Move MIME-coded task event scripts to `<folder>/Events/` and clear them.
fn export_task_events<W: SideWriter + ?Sized>(
    out: &mut W,
    folder: &str,
    events: Vec<&mut Element>,
    cp: Codepage,
) -> Result<()> {
    for event in events {
        for task in event.elements_mut() {
            let script = match task.text() {
                Some(text) => mime_decode(text, cp)?,
                None => None,
            };
            let Some(script) = script else {
                continue;
            };
            out.write_side(&under(folder, &task_event_file(&task.name)), &script)?;
            task.children.retain(|n| matches!(n, Node::Element(_)));
        }
    }
    Ok(())
}

fn import_task_events<R: SideReader + ?Sized>(
    source: &R,
    folder: &str,
    events: Vec<&mut Element>,
    cp: Codepage,
) -> Result<()> {
    for event in events {
        for task in event.elements_mut() {
            let Some(script) = source.read_side(&under(folder, &task_event_file(&task.name)))? else {
                continue;
            };
            task.children.retain(|n| matches!(n, Node::Element(_)));
            task.children.push(Node::CData(mime_encode(&script, cp)));
        }
    }
    Ok(())
}

/// Concatenated text of an element and its descendants.
fn inner_text(element: &Element) -> String {
    element
        .children
        .iter()
        .map(|node| match node {
            Node::Text(t) | Node::CData(t) => t.clone(),
            Node::Element(child) => inner_text(child),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_events_map_to_selection_files() {
        assert_eq!(task_event_file("InitScript"), "Events/TaskBeforeSelection.isbl");
        assert_eq!(task_event_file("OnAbort"), "Events/OnAbort.isbl");
    }

    #[test]
    fn blocks_fall_back_to_id() {
        let named = Element::new("Block").with_attr("ID", Some("3")).with_attr("Name", Some("Approve"));
        let unnamed = Element::new("Block").with_attr("ID", Some("3"));
        assert_eq!(block_folder(&named), "Blocks/Approve");
        assert_eq!(block_folder(&unnamed), "Blocks/3");
    }

    #[test]
    fn inner_text_spans_children() {
        let ribbon = Element::new("RouteRibbon").with_child({
            let mut value = Element::new("Value");
            value.children.push(Node::CData("object Ribbon".into()));
            value
        });
        assert_eq!(inner_text(&ribbon), "object Ribbon");
    }
}
