//! Import pass of one kind

use devtree_fs::io;
use devtree_model::Component;
use devtree_model::xml::header::read_header;
use tracing::debug;

use super::{HEADER_FILE, Projector, grouped};
use crate::filter::ImportFilter;
use crate::routing::{ImportCtx, Policy, routing};
use crate::{Kind, Result};

/// Rebuild the kind's components from every folder `filter` accepts.
pub(super) fn import_kind(
    projector: &Projector,
    filter: &ImportFilter,
    kind: Kind,
) -> Result<Vec<Component>> {
    let config = routing(kind);
    let root = projector.root();
    let codepage = projector.codepage();
    let folders: Vec<_> = io::list_subdirs(&config.folder(root))?
        .into_iter()
        .filter(|folder| filter.need_import(folder, root))
        .collect();

    if config.policy == Policy::Grouped {
        return grouped::import(&config, &folders, codepage);
    }

    let mut components = Vec::with_capacity(folders.len());
    for folder in folders {
        let bytes = io::read_bytes(&folder.join(HEADER_FILE))?;
        let mut component = read_header(&bytes, codepage)?;
        let ctx = ImportCtx::new(kind, component.key.clone(), folder, codepage);
        config.apply_import(&mut component, &ctx)?;
        debug!(kind = %kind, component = %component.key, "imported component");
        components.push(component);
    }
    Ok(components)
}
