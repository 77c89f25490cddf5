//! Package artifact and package metadata documents

use tracing::debug;

use super::component::{component_from_element, component_to_element};
use super::{declared_codepage, parse_document, write_document};
use crate::xml::fragment::Element;
use crate::{Codepage, ComponentSet, Error, PackageInfo, Result};

const COMPONENTS: &str = "Components";
const PACKAGE_INFO: &str = "PackageInfo";

fn flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn flag_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Read a package, detecting its codepage from the declaration.
///
/// Unknown group elements are ignored.
pub fn read_package(bytes: &[u8], default: Codepage) -> Result<(ComponentSet, Codepage)> {
    let codepage = declared_codepage(bytes).unwrap_or(default);
    let document = parse_document(bytes, codepage, COMPONENTS)?;
    let root = document.root;
    if root.name != COMPONENTS {
        return Err(Error::malformed(
            COMPONENTS,
            format!("unexpected root element '{}'", root.name),
        ));
    }

    let mut set = ComponentSet::new();
    set.info = PackageInfo {
        platform_version: root.attr("PlatformVesion").map(str::to_string),
        system_mask: root.attr("SystemMask").map(str::to_string),
        for_main_server: flag(root.attr("ForMainServer")),
        imitation_mode: flag(root.attr("ImitationMode")),
    };

    for group in root.elements() {
        if !ComponentSet::GROUPS.contains(&group.name.as_str()) {
            debug!(group = %group.name, "skipping unknown package group");
            continue;
        }
        for item in group.elements() {
            set.push(&group.name, component_from_element(item)?);
        }
    }
    Ok((set, codepage))
}

/// Write a package in `codepage`, groups in document order.
pub fn write_package(set: &ComponentSet, codepage: Codepage) -> Result<Vec<u8>> {
    let info = &set.info;
    let mut root = Element::new(COMPONENTS)
        .with_attr("PlatformVesion", info.platform_version.as_deref())
        .with_attr("SystemMask", info.system_mask.as_deref());
    root.set_attr("ForMainServer", flag_text(info.for_main_server));
    root.set_attr("ImitationMode", flag_text(info.imitation_mode));

    for name in ComponentSet::GROUPS {
        let components = set.group(name);
        if components.is_empty() {
            continue;
        }
        let mut group = Element::new(name);
        for component in components {
            group.push(component_to_element(name, component));
        }
        root.push(group);
    }
    write_document(root, codepage)
}

/// Write `PackageInfo.xml` content.
pub fn write_package_info(info: &PackageInfo, codepage: Codepage) -> Result<Vec<u8>> {
    let mut root = Element::new(PACKAGE_INFO);
    root.set_attr("ImitationMode", flag_text(info.imitation_mode));
    root.set_attr("ForMainServer", flag_text(info.for_main_server));
    let root = root
        .with_attr("SystemMask", info.system_mask.as_deref())
        .with_attr("PlatformVersion", info.platform_version.as_deref());
    write_document(root, codepage)
}

/// Read `PackageInfo.xml` content.
pub fn read_package_info(bytes: &[u8], default: Codepage) -> Result<PackageInfo> {
    let codepage = declared_codepage(bytes).unwrap_or(default);
    let root = parse_document(bytes, codepage, PACKAGE_INFO)?.root;
    if root.name != PACKAGE_INFO {
        return Err(Error::malformed(
            PACKAGE_INFO,
            format!("unexpected root element '{}'", root.name),
        ));
    }
    Ok(PackageInfo {
        platform_version: root.attr("PlatformVersion").map(str::to_string),
        system_mask: root.attr("SystemMask").map(str::to_string),
        for_main_server: flag(root.attr("ForMainServer")),
        imitation_mode: flag(root.attr("ImitationMode")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, Field, Row};

    #[test]
    fn empty_groups_are_omitted() {
        let mut set = ComponentSet::new();
        set.group_mut("Dialogs");
        set.push(
            "Scripts",
            Component::new("S1").with_card(Row::from_fields([Field::scalar("NameRpt", "S1")])),
        );
        let bytes = write_package(&set, Codepage::English).unwrap();
        let text = Codepage::English.decode_bytes(&bytes);

        assert!(text.contains("<Scripts>"));
        assert!(!text.contains("<Dialogs"));
        assert!(text.contains(r#"ForMainServer="false""#));
    }

    #[test]
    fn package_info_roundtrips() {
        let info = PackageInfo {
            platform_version: Some("7.52".into()),
            system_mask: Some("SYS".into()),
            for_main_server: true,
            imitation_mode: false,
        };
        let bytes = write_package_info(&info, Codepage::Russian).unwrap();
        assert_eq!(read_package_info(&bytes, Codepage::English).unwrap(), info);
    }

    #[test]
    fn wrong_root_is_rejected() {
        let bytes = b"<?xml version=\"1.0\"?><Other/>";
        assert!(read_package(bytes, Codepage::Russian).is_err());
    }
}
