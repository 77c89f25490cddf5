//! Export pass of one kind

use devtree_fs::{NormalizedPath, escape, io};
use devtree_model::xml::header::write_header;
use devtree_model::{Codepage, Component, ComponentSet};
use tracing::debug;

use super::{HEADER_FILE, Projector, grouped};
use crate::routing::{ExportCtx, Policy, RoutingConfig, routing};
use crate::sync::{WriteSet, prune};
use crate::{Error, Kind, Result};

/// Export the kind's components of `set`. Returns the exported count.
pub(super) fn export_kind(projector: &Projector, set: &ComponentSet, kind: Kind) -> Result<usize> {
    let config = routing(kind);
    let components = set.group(kind.group());
    let kind_folder = config.folder(projector.root());

    if config.policy == Policy::Grouped {
        return grouped::export(&config, components, &kind_folder, projector.codepage());
    }

    let mut count = 0;
    for component in components {
        if !config.selector.accepts(component, projector.codepage())? {
            continue;
        }
        export_component(&config, component.clone(), &kind_folder, projector.codepage())?;
        count += 1;
    }
    Ok(count)
}

/// Folder of a component below its kind folder.
pub(crate) fn component_folder(
    kind: impl std::fmt::Display,
    kind_folder: &NormalizedPath,
    key: &str,
) -> Result<NormalizedPath> {
    let name = escape(key);
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::malformed(
            format!("{kind} component"),
            format!("key '{key}' names no folder"),
        ));
    }
    Ok(kind_folder.join(name))
}

fn export_component(
    config: &RoutingConfig,
    mut component: Component,
    kind_folder: &NormalizedPath,
    codepage: Codepage,
) -> Result<()> {
    let element = config.element_name()?;
    let folder = component_folder(config.kind, kind_folder, &component.key)?;
    io::ensure_dir(&folder)?;

    let mut writes = WriteSet::new();
    writes.record_folder(folder.clone());
    let mut ctx = ExportCtx::new(
        config.kind,
        component.key.clone(),
        folder.clone(),
        codepage,
        &mut writes,
    );
    config.apply_export(&mut component, &mut ctx)?;
    ctx.write_bytes(HEADER_FILE, &write_header(element, &component, codepage)?)?;

    let pruned = prune(&folder, &writes)?;
    debug!(kind = %config.kind, component = %component.key, pruned, "exported component");
    Ok(())
}
