//! Route roles
//!
//! A role's calculation lives in a payload file named by its `ISBEvent`
//! requisite. Export decodes it to `Calculation.isbl`; import writes it back
//! as `RoleTM_РОЛ_<folder>_ISBEvent.IMG`.

use devtree_model::{RecordRef, Requisite};

use super::{RecordExportCtx, RecordImportCtx};
use crate::Result;

pub(super) const EVENT: &str = "ISBEvent";
const CALCULATION_FILE: &str = "Calculation.isbl";

pub(super) fn export(ctx: &mut RecordExportCtx<'_>, record: &RecordRef) -> Result<()> {
    let Some(payload) = record
        .requisite(EVENT)
        .and_then(|r| r.value.as_deref())
        .filter(|v| !v.trim().is_empty())
    else {
        return Ok(());
    };
    if let Some(script) = ctx.read_payload(payload)? {
        ctx.write_text(CALCULATION_FILE, &script)?;
    }
    Ok(())
}

pub(super) fn import(ctx: &RecordImportCtx<'_>, record: &mut RecordRef) -> Result<()> {
    let mut event = Requisite::from_file(EVENT, ctx.codepage, &ctx.folder.join(CALCULATION_FILE))?;
    let Some(encoded) = event.opaque.take() else {
        return Ok(());
    };
    let payload = format!("RoleTM_РОЛ_{}_{EVENT}.IMG", ctx.folder_name());
    ctx.write_payload(&payload, &encoded)?;
    event.value = Some(payload);
    record.requisites.push(event);
    Ok(())
}
