//! Wizards
//!
//! A wizard's form structure sits in `ISBSearchCondition` in the compact
//! legacy form; it is stored editable as `Structure.dfm`.

use devtree_codec::legacy;
use devtree_model::{RecordRef, Requisite};

use super::{RecordExportCtx, RecordImportCtx};
use crate::Result;

/// Reference code of wizard groups; every other record of the file is a wizard.
pub(super) const GROUPS_REFERENCE: &str = "WIZARD_GROUPS";

pub(super) const STRUCTURE: &str = "ISBSearchCondition";
const STRUCTURE_FILE: &str = "Structure.dfm";

pub(super) fn export(ctx: &mut RecordExportCtx<'_>, record: &RecordRef) -> Result<()> {
    let Some(requisite) = record.requisite(STRUCTURE) else {
        return Ok(());
    };
    if let Some(compact) = requisite.decoded(ctx.codepage)?.filter(|t| !t.trim().is_empty()) {
        ctx.write_text(STRUCTURE_FILE, &legacy::to_editable(&compact))?;
    }
    Ok(())
}

/// The structure is always appended, empty when the file is missing.
pub(super) fn import(ctx: &RecordImportCtx<'_>, record: &mut RecordRef) -> Result<()> {
    let compact = ctx
        .read_text(STRUCTURE_FILE)?
        .map(|text| legacy::to_compact(&text));
    record
        .requisites
        .push(Requisite::text(STRUCTURE, ctx.codepage, compact.as_deref()));
    Ok(())
}
