//! Field router
//!
//! Every entity kind is described by one [`RoutingConfig`] value instead of
//! its own handler type. A config names the header element, the key field,
//! which components of the package belong to the kind, and per section a
//! list of [`Route`]s moving fields out of the header into side files.
//!
//! ```text
//! Component ──apply_export──> side files + reduced header
//!     ^                                   |
//!     └────────────apply_import───────────┘
//! ```
//!
//! Routes run on the rows of their section before the header is reduced.
//! Every field a route consumes is removed from the header afterwards,
//! together with the record ids every section drops.

mod hooks;
pub(crate) mod route_block;
pub mod table;

use devtree_fs::{NormalizedPath, io};
use devtree_model::{Codepage, Component, Row};

use crate::sync::WriteSet;
use crate::{Error, Kind, Result};

pub use table::routing;

/// A field code in both vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub ru: &'static str,
    pub en: &'static str,
}

impl Code {
    pub const fn new(ru: &'static str, en: &'static str) -> Self {
        Self { ru, en }
    }

    /// A code spelled the same in both vocabularies.
    pub const fn same(code: &'static str) -> Self {
        Self { ru: code, en: code }
    }

    pub fn pick(self, codepage: Codepage) -> &'static str {
        codepage.pick(self.ru, self.en)
    }
}

/// Condition on the whole component deciding whether a rule applies.
///
/// Evaluated before any row is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Always,
    SectionAbsent(usize),
}

impl Guard {
    pub fn holds(self, component: &Component) -> bool {
        match self {
            Self::Always => true,
            Self::SectionAbsent(index) => !component.has_section(index),
        }
    }
}

pub type ExportHook = fn(&mut ExportCtx<'_>, &Row) -> Result<()>;
pub type ImportHook = fn(&ImportCtx, &mut Row) -> Result<()>;

/// How one or more fields of a row map onto side files.
#[derive(Debug, Clone, Copy)]
pub enum Route {
    /// Payload written verbatim to `file`.
    File { field: Code, file: &'static str },
    /// Payload split by the event codec into `<folder>/<event file>`.
    Events { field: Code, folder: &'static str },
    /// Change script and split select events under `Requisites/<code>/`.
    RequisiteEvents {
        code: Code,
        change: Code,
        select: Code,
    },
    /// Payload written to `<folder>/<code value>.isbl`.
    Named {
        code: Code,
        text: Code,
        folder: &'static str,
    },
    /// Several payloads written into `<folder>/<code value>/`.
    Subfolder {
        folder: &'static str,
        code: Code,
        files: &'static [(Code, &'static str)],
    },
    /// Dropped on export and recreated without a value on import.
    EmptyOnImport { field: Code },
    /// Hand-written hook pair for fields with embedded markup.
    Custom {
        export: ExportHook,
        import: ImportHook,
        fields: &'static [Code],
    },
}

impl Route {
    /// Fields this route moves out of the header.
    pub fn consumed(&self) -> Vec<Code> {
        match *self {
            Self::File { field, .. }
            | Self::Events { field, .. }
            | Self::EmptyOnImport { field } => vec![field],
            Self::RequisiteEvents { change, select, .. } => vec![change, select],
            Self::Named { text, .. } => vec![text],
            Self::Subfolder { files, .. } => files.iter().map(|(code, _)| *code).collect(),
            Self::Custom { fields, .. } => fields.to_vec(),
        }
    }
}

/// Routes applied to every row of one section (0 is the card).
#[derive(Debug, Clone)]
pub struct SectionRule {
    pub section: usize,
    pub guard: Guard,
    pub routes: Vec<Route>,
    /// Extra fields dropped from the header without a side file.
    pub remove: Vec<Code>,
}

impl SectionRule {
    pub fn new(section: usize, routes: Vec<Route>) -> Self {
        Self {
            section,
            guard: Guard::Always,
            routes,
            remove: Vec::new(),
        }
    }

    pub fn when(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    pub fn removing(mut self, codes: Vec<Code>) -> Self {
        self.remove = codes;
        self
    }
}

/// Which components of the kind's package group the kind exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    All,
    /// Card field whose text or value must equal `value`.
    CardValue {
        field: &'static str,
        value: &'static str,
    },
}

impl Selector {
    pub fn accepts(self, component: &Component, codepage: Codepage) -> Result<bool> {
        Ok(match self {
            Self::All => true,
            Self::CardValue { field, value } => {
                component.card.text(field, codepage)?.as_deref() == Some(value)
            }
        })
    }
}

/// Folder layout of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// One folder per component.
    PerComponent,
    /// One folder per group discriminator holding a merged header.
    Grouped,
}

/// Backing table of a kind at the record source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceTable {
    pub table: &'static str,
    pub key_columns: &'static [&'static str],
    /// Column and value a row must carry to belong to the kind.
    pub filter: Option<(&'static str, &'static str)>,
    /// Ask the source whether the table exists before querying it.
    pub check_exists: bool,
}

/// Declarative description of one entity kind.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub kind: Kind,
    pub element: Option<&'static str>,
    pub key_field: Option<&'static str>,
    pub source: SourceTable,
    pub selector: Selector,
    pub policy: Policy,
    pub rules: Vec<SectionRule>,
}

pub(crate) const RECORD_ID: Code = Code::new("ИД", "ISBID");
pub(crate) const LAST_UPDATE: Code = Code::same("LastUpdate");
pub(crate) const MAIN_RECORD_ID: Code = Code::new("ИДЗапГлавРазд", "MainSectionRecordID");

/// Fields every kind drops from section `index`.
pub fn default_removal(index: usize) -> [Code; 2] {
    if index == 0 {
        [RECORD_ID, LAST_UPDATE]
    } else {
        [RECORD_ID, MAIN_RECORD_ID]
    }
}

impl RoutingConfig {
    /// Root element name of the kind's `Card.xml`.
    pub fn element_name(&self) -> Result<&'static str> {
        self.element
            .ok_or_else(|| Error::unsupported(self.kind, "element name"))
    }

    /// Key column naming the kind's components at the source.
    pub fn key_field(&self) -> Result<&'static str> {
        self.key_field
            .ok_or_else(|| Error::unsupported(self.kind, "key field"))
    }

    /// The kind's folder below the development root.
    pub fn folder(&self, root: &NormalizedPath) -> NormalizedPath {
        root.join(self.kind.folder())
    }

    fn active_rules(&self, component: &Component) -> Vec<&SectionRule> {
        self.rules
            .iter()
            .filter(|rule| rule.guard.holds(component))
            .collect()
    }

    /// Field codes dropped from section `index` given the active rules.
    fn removal(&self, index: usize, active: &[&SectionRule], codepage: Codepage) -> Vec<&'static str> {
        let mut codes: Vec<&'static str> = default_removal(index)
            .iter()
            .map(|code| code.pick(codepage))
            .collect();
        for rule in active.iter().filter(|rule| rule.section == index) {
            let consumed = rule.routes.iter().flat_map(Route::consumed);
            codes.extend(consumed.chain(rule.remove.iter().copied()).map(|c| c.pick(codepage)));
        }
        codes
    }

    /// Write side files, reduce the header and decode remaining payloads.
    pub fn apply_export(&self, component: &mut Component, ctx: &mut ExportCtx<'_>) -> Result<()> {
        let active = self.active_rules(component);
        for rule in &active {
            for row in component.rows_mut(rule.section) {
                if row.is_empty() {
                    continue;
                }
                for route in &rule.routes {
                    route.export(ctx, row)?;
                }
            }
        }

        let indices: Vec<usize> = std::iter::once(0)
            .chain(component.sections().map(|(index, _)| index))
            .collect();
        for index in indices {
            let codes = self.removal(index, &active, ctx.codepage);
            for row in component.rows_mut(index) {
                row.remove_codes(&codes);
            }
        }

        component.prepare_for_export(ctx.codepage)?;
        Ok(())
    }

    /// Re-encode header payloads and restore routed fields from side files.
    pub fn apply_import(&self, component: &mut Component, ctx: &ImportCtx) -> Result<()> {
        component.prepare_for_import(ctx.codepage);
        let active = self.active_rules(component);
        for rule in &active {
            for row in component.rows_mut(rule.section) {
                if row.is_empty() {
                    continue;
                }
                for route in &rule.routes {
                    route.import(ctx, row)?;
                }
            }
        }
        Ok(())
    }
}

/// Target of side files written while exporting one component.
pub(crate) trait SideWriter {
    fn write_side(&mut self, relative: &str, text: &str) -> Result<()>;
}

/// Origin of side files read while importing one component.
pub(crate) trait SideReader {
    fn read_side(&self, relative: &str) -> Result<Option<String>>;
}

/// State of one component's export: its folder and the files written so far.
pub struct ExportCtx<'a> {
    pub kind: Kind,
    pub key: String,
    pub folder: NormalizedPath,
    pub codepage: Codepage,
    writes: &'a mut WriteSet,
}

impl<'a> ExportCtx<'a> {
    pub fn new(
        kind: Kind,
        key: impl Into<String>,
        folder: NormalizedPath,
        codepage: Codepage,
        writes: &'a mut WriteSet,
    ) -> Self {
        Self {
            kind,
            key: key.into(),
            folder,
            codepage,
            writes,
        }
    }

    /// Write `text` in the run codepage to `relative` and record it.
    pub fn write_text(&mut self, relative: &str, text: &str) -> Result<()> {
        let bytes = self.codepage.encode_str(text);
        self.write_bytes(relative, &bytes)
    }

    pub fn write_bytes(&mut self, relative: &str, bytes: &[u8]) -> Result<()> {
        let path = self.folder.join(relative);
        io::write_if_changed(&path, bytes)?;
        self.writes.record_file(path);
        Ok(())
    }

    pub fn missing(&self, field: &str) -> Error {
        Error::MissingField {
            kind: self.kind,
            component: self.key.clone(),
            field: field.to_string(),
        }
    }
}

impl SideWriter for ExportCtx<'_> {
    fn write_side(&mut self, relative: &str, text: &str) -> Result<()> {
        self.write_text(relative, text)
    }
}

/// State of one component's import.
pub struct ImportCtx {
    pub kind: Kind,
    pub key: String,
    pub folder: NormalizedPath,
    pub codepage: Codepage,
}

impl ImportCtx {
    pub fn new(kind: Kind, key: impl Into<String>, folder: NormalizedPath, codepage: Codepage) -> Self {
        Self {
            kind,
            key: key.into(),
            folder,
            codepage,
        }
    }

    pub fn path(&self, relative: &str) -> NormalizedPath {
        self.folder.join(relative)
    }

    /// Decoded content of a side file, `None` when it does not exist.
    pub fn read_text(&self, relative: &str) -> Result<Option<String>> {
        let bytes = io::read_optional(&self.path(relative))?;
        Ok(bytes.map(|b| self.codepage.decode_bytes(&b)))
    }

    pub fn missing(&self, field: &str) -> Error {
        Error::MissingField {
            kind: self.kind,
            component: self.key.clone(),
            field: field.to_string(),
        }
    }
}

impl SideReader for ImportCtx {
    fn read_side(&self, relative: &str) -> Result<Option<String>> {
        self.read_text(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devtree_model::{Field, Section};

    #[test]
    fn guard_checks_section_presence() {
        let component = Component::new("D1")
            .with_section(7, Section::default())
            .unwrap();
        assert!(!Guard::SectionAbsent(7).holds(&component));
        assert!(Guard::SectionAbsent(2).holds(&component));
        assert!(Guard::Always.holds(&component));
    }

    #[test]
    fn card_value_selector_reads_text_or_value() {
        let cp = Codepage::Russian;
        let report = Component::new("R1").with_card(Row::from_fields([Field::text(
            "Тип",
            cp,
            Some("MBAnAccRpt"),
        )]));
        let selector = Selector::CardValue {
            field: "Тип",
            value: "MBAnAccRpt",
        };
        assert!(selector.accepts(&report, cp).unwrap());
        assert!(!selector.accepts(&Component::new("R2"), cp).unwrap());
    }

    #[test]
    fn default_removal_depends_on_section() {
        let cp = Codepage::English;
        let card: Vec<_> = default_removal(0).iter().map(|c| c.pick(cp)).collect();
        let detail: Vec<_> = default_removal(3).iter().map(|c| c.pick(cp)).collect();
        assert_eq!(card, ["ISBID", "LastUpdate"]);
        assert_eq!(detail, ["ISBID", "MainSectionRecordID"]);
    }
}
