//! Components, sections and packages

use std::collections::BTreeMap;

use crate::{Codepage, Error, Result, Row};

/// Number of detail sections a component can carry.
pub const SECTION_COUNT: usize = 8;

/// An ordered sequence of rows at a fixed index in `1..=8`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub rows: Vec<Row>,
}

impl Section {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }
}

/// A keyed entity with a header row ("card") and up to eight sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Component {
    pub key: String,
    pub display: Option<String>,
    pub reference_name: Option<String>,
    pub card: Row,
    sections: [Option<Section>; SECTION_COUNT],
}

impl Component {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_card(mut self, card: Row) -> Self {
        self.card = card;
        self
    }

    pub fn with_section(mut self, index: usize, section: Section) -> Result<Self> {
        self.set_section(index, section)?;
        Ok(self)
    }

    fn slot(index: usize) -> Result<usize> {
        if (1..=SECTION_COUNT).contains(&index) {
            Ok(index - 1)
        } else {
            Err(Error::SectionOutOfRange { index })
        }
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        let slot = Self::slot(index).ok()?;
        self.sections[slot].as_ref()
    }

    pub fn section_mut(&mut self, index: usize) -> Option<&mut Section> {
        let slot = Self::slot(index).ok()?;
        self.sections[slot].as_mut()
    }

    pub fn has_section(&self, index: usize) -> bool {
        self.section(index).is_some()
    }

    pub fn set_section(&mut self, index: usize, section: Section) -> Result<()> {
        let slot = Self::slot(index)?;
        self.sections[slot] = Some(section);
        Ok(())
    }

    pub fn take_section(&mut self, index: usize) -> Option<Section> {
        let slot = Self::slot(index).ok()?;
        self.sections[slot].take()
    }

    /// Populated sections with their indices, in index order.
    pub fn sections(&self) -> impl Iterator<Item = (usize, &Section)> {
        self.sections
            .iter()
            .enumerate()
            .filter_map(|(slot, s)| s.as_ref().map(|s| (slot + 1, s)))
    }

    pub fn has_sections(&self) -> bool {
        self.sections.iter().any(Option::is_some)
    }

    /// Rows of section `index`, where index 0 addresses the card.
    pub fn rows_mut(&mut self, index: usize) -> Vec<&mut Row> {
        if index == 0 {
            return vec![&mut self.card];
        }
        match self.section_mut(index) {
            Some(section) => section.rows.iter_mut().collect(),
            None => Vec::new(),
        }
    }

    /// Move every decoded payload into plain values.
    pub fn prepare_for_export(&mut self, codepage: Codepage) -> Result<()> {
        self.card.prepare_for_export(codepage)?;
        for section in self.sections.iter_mut().flatten() {
            for row in &mut section.rows {
                row.prepare_for_export(codepage)?;
            }
        }
        Ok(())
    }

    /// Re-encode plain values of text fields into payloads.
    pub fn prepare_for_import(&mut self, codepage: Codepage) {
        self.card.prepare_for_import(codepage);
        for section in self.sections.iter_mut().flatten() {
            for row in &mut section.rows {
                row.prepare_for_import(codepage);
            }
        }
    }
}

/// Package-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub platform_version: Option<String>,
    pub system_mask: Option<String>,
    pub for_main_server: bool,
    pub imitation_mode: bool,
}

/// A package: components grouped by entity kind plus metadata.
///
/// Groups are addressed by their package element name (`Dialogs`,
/// `RefTypes`, ...). Several entity kinds may share one group.
#[derive(Debug, Clone, Default, Eq)]
pub struct ComponentSet {
    pub info: PackageInfo,
    groups: BTreeMap<String, Vec<Component>>,
}

impl ComponentSet {
    /// Package group names in document order.
    pub const GROUPS: [&'static str; 17] = [
        "Constants",
        "DialogRequisites",
        "Dialogs",
        "EDocRequisites",
        "EDCardTypes",
        "GrFunctions",
        "Functions",
        "LocalizedStrings",
        "Modules",
        "RefTypes",
        "RefRequisites",
        "Reports",
        "WorkflowBlockGroups",
        "WorkflowBlocks",
        "Scripts",
        "ServerEvents",
        "Viewers",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self, name: &str) -> &[Component] {
        self.groups.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn group_mut(&mut self, name: &str) -> &mut Vec<Component> {
        self.groups.entry(name.to_string()).or_default()
    }

    pub fn push(&mut self, group: &str, component: Component) {
        self.group_mut(group).push(component);
    }

    /// Non-empty groups with their names.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[Component])> {
        self.groups
            .iter()
            .filter(|(_, c)| !c.is_empty())
            .map(|(name, c)| (name.as_str(), c.as_slice()))
    }

    /// Append every component of `other`, keeping this set's metadata.
    pub fn append(&mut self, other: ComponentSet) {
        for (name, components) in other.groups {
            self.group_mut(&name).extend(components);
        }
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for ComponentSet {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info && self.groups().eq(other.groups())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    #[test]
    fn section_index_is_bounded() {
        let mut component = Component::new("K1");
        assert!(component.set_section(0, Section::default()).is_err());
        assert!(component.set_section(9, Section::default()).is_err());
        component.set_section(8, Section::default()).unwrap();
        assert!(component.has_section(8));
        assert_eq!(component.sections().map(|(i, _)| i).collect::<Vec<_>>(), vec![8]);
    }

    #[test]
    fn rows_mut_zero_is_card() {
        let mut component =
            Component::new("K1").with_card(Row::from_fields([Field::scalar("Code", "K1")]));
        assert_eq!(component.rows_mut(0).len(), 1);
        assert!(component.rows_mut(3).is_empty());
    }

    #[test]
    fn empty_groups_are_hidden() {
        let mut set = ComponentSet::new();
        set.group_mut("Dialogs");
        set.push("Scripts", Component::new("S1"));
        let names: Vec<_> = set.groups().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Scripts"]);
        assert_eq!(set.len(), 1);
    }
}
