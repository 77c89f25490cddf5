//! Reference-record projection
//!
//! Wizards, route templates and their groups and roles are not package
//! components: they travel as reference records in record files (`ROOT` of
//! `RecordRef`s). Each record kind gets its own folder under the development
//! root, one subfolder per record:
//!
//! ```text
//! Wizards.xml  ──export──> <root>/WizardGroups/<code>/Card.xml
//!                          <root>/Wizards/<code>/Card.xml + Structure.dfm
//! TipMarsh.xml ──export──> <root>/Routes/<code>/Card.xml + Properties.xml + ...
//! GroupTM.dat  ──export──> <root>/RouteGroups/<code>/Card.xml
//! RoleTM.dat   ──export──> <root>/Roles/<name>/Card.xml + Calculation.isbl
//! ```
//!
//! Large requisites of route records and roles are held in payload files
//! (`*.IMG`, base64) next to the record files.

mod role;
mod route;
mod wizard;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use devtree_fs::{NormalizedPath, io};
use devtree_model::xml::records::{read_record_card, read_records, write_record_card, write_records};
use devtree_model::{Codepage, RecordRef, RecordSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::filter::ImportFilter;
use crate::projector::delete::remove_unlisted;
use crate::projector::export::component_folder;
use crate::projector::pool::{self, WorkUnit};
use crate::projector::{HEADER_FILE, Stage, TransferReport, default_workers};
use crate::routing::{SideReader, SideWriter, SourceTable, default_removal};
use crate::source::RecordSource;
use crate::sync::{WriteSet, prune};
use crate::{Error, Result};

/// Record kinds, each projected into its own folder.
///
/// The variant name is also the folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    WizardGroups,
    Wizards,
    RouteGroups,
    Routes,
    Roles,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::WizardGroups,
        RecordKind::Wizards,
        RecordKind::RouteGroups,
        RecordKind::Routes,
        RecordKind::Roles,
    ];

    pub fn folder(self) -> &'static str {
        match self {
            Self::WizardGroups => "WizardGroups",
            Self::Wizards => "Wizards",
            Self::RouteGroups => "RouteGroups",
            Self::Routes => "Routes",
            Self::Roles => "Roles",
        }
    }

    /// Root element of the kind's `Card.xml`.
    pub fn element(self) -> &'static str {
        match self {
            Self::WizardGroups => "WizardGroup",
            Self::Wizards => "Wizard",
            Self::RouteGroups => "RouteGroup",
            Self::Routes => "RouteRecord",
            Self::Roles => "Role",
        }
    }

    /// Reference code of the kind's records at the source.
    pub fn code(self) -> &'static str {
        match self {
            Self::WizardGroups => wizard::GROUPS_REFERENCE,
            Self::Wizards => "WIZARDS",
            Self::RouteGroups => "ГТМ",
            Self::Routes => "ТМТ",
            Self::Roles => "РОЛ",
        }
    }

    pub fn family(self) -> RecordFamily {
        match self {
            Self::WizardGroups | Self::Wizards => RecordFamily::Wizards,
            Self::RouteGroups | Self::Routes | Self::Roles => RecordFamily::Routes,
        }
    }

    /// Source rows of the kind, keyed like its folders.
    pub fn source(self) -> SourceTable {
        SourceTable {
            table: "MBAnalit",
            key_columns: match self {
                Self::Roles => &["NameAn"],
                _ => &["Kod"],
            },
            filter: Some(("Vid", self.code())),
            check_exists: false,
        }
    }

    /// Record file holding the kind's records.
    ///
    /// Wizard kinds share the package file itself; route kinds each have a
    /// file next to it.
    pub fn record_file(self, package: &NormalizedPath) -> NormalizedPath {
        let sibling = |name: &str| package_dir(package).join(name);
        match self {
            Self::WizardGroups | Self::Wizards => package.clone(),
            Self::RouteGroups => sibling("GroupTM.dat"),
            Self::Routes => sibling("TipMarsh.xml"),
            Self::Roles => sibling("RoleTM.dat"),
        }
    }

    /// Whether a record of the kind's file belongs to the kind.
    pub fn selects(self, record: &RecordRef) -> bool {
        match self {
            Self::WizardGroups => record.reference == wizard::GROUPS_REFERENCE,
            Self::Wizards => record.reference != wizard::GROUPS_REFERENCE,
            Self::RouteGroups | Self::Routes | Self::Roles => true,
        }
    }

    /// Key naming the record's folder: roles go by name, the rest by code.
    pub fn folder_key(self, record: &RecordRef) -> &str {
        match self {
            Self::Roles => record.name.as_deref().unwrap_or_default(),
            _ => &record.code,
        }
    }

    /// Requisites kept out of `Card.xml` besides the record id and update stamp.
    fn moved_out(self) -> &'static [&'static str] {
        match self {
            Self::Wizards => &[wizard::STRUCTURE],
            Self::Routes => &[route::SEARCH_CONDITION],
            Self::Roles => &[role::EVENT],
            Self::WizardGroups | Self::RouteGroups => &[],
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

impl FromStr for RecordKind {
    type Err = Error;

    /// Case-insensitive folder name.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.folder().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownKind {
                name: s.to_string(),
            })
    }
}

impl WorkUnit for RecordKind {
    fn failed(self, source: Error) -> Error {
        Error::RecordFailed {
            kind: self,
            source: Box::new(source),
        }
    }
}

/// Record kinds transferred together from one package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFamily {
    Wizards,
    Routes,
}

impl RecordFamily {
    pub fn kinds(self) -> &'static [RecordKind] {
        match self {
            Self::Wizards => &[RecordKind::WizardGroups, RecordKind::Wizards],
            Self::Routes => &[RecordKind::RouteGroups, RecordKind::Routes, RecordKind::Roles],
        }
    }
}

impl fmt::Display for RecordFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Wizards => "wizards",
            Self::Routes => "routes",
        })
    }
}

impl FromStr for RecordFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "wizards" => Ok(Self::Wizards),
            "routes" => Ok(Self::Routes),
            _ => Err(Error::UnknownFamily {
                name: s.to_string(),
            }),
        }
    }
}

/// Directory holding a package file, its sibling record files and payloads.
pub fn package_dir(package: &NormalizedPath) -> NormalizedPath {
    package.parent().unwrap_or_else(|| NormalizedPath::new("."))
}

/// State of one record's export.
pub(crate) struct RecordExportCtx<'a> {
    pub kind: RecordKind,
    pub folder: NormalizedPath,
    pub package_dir: &'a NormalizedPath,
    pub codepage: Codepage,
    writes: &'a mut WriteSet,
}

impl RecordExportCtx<'_> {
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

    /// Decoded content of a payload file next to the record file.
    pub fn read_payload(&self, name: &str) -> Result<Option<String>> {
        let path = self.package_dir.join(name);
        let Some(bytes) = io::read_optional(&path)? else {
            warn!(kind = %self.kind, payload = %path, "payload file not found");
            return Ok(None);
        };
        let encoded = String::from_utf8_lossy(&bytes);
        self.codepage
            .decode_opaque(Some(encoded.trim()))
            .map_err(|e| Error::malformed(format!("payload {name}"), e))
    }
}

impl SideWriter for RecordExportCtx<'_> {
    fn write_side(&mut self, relative: &str, text: &str) -> Result<()> {
        self.write_text(relative, text)
    }
}

/// State of one record's import.
pub(crate) struct RecordImportCtx<'a> {
    pub folder: NormalizedPath,
    pub package_dir: &'a NormalizedPath,
    pub codepage: Codepage,
}

impl RecordImportCtx<'_> {
    pub fn read_text(&self, relative: &str) -> Result<Option<String>> {
        let bytes = io::read_optional(&self.folder.join(relative))?;
        Ok(bytes.map(|b| self.codepage.decode_bytes(&b)))
    }

    pub fn folder_name(&self) -> &str {
        self.folder.file_name().unwrap_or_default()
    }

    /// Store an encoded payload next to the record file.
    pub fn write_payload(&self, name: &str, encoded: &str) -> Result<()> {
        io::write_if_changed(&self.package_dir.join(name), encoded.as_bytes())?;
        Ok(())
    }
}

impl SideReader for RecordImportCtx<'_> {
    fn read_side(&self, relative: &str) -> Result<Option<String>> {
        self.read_text(relative)
    }
}

/// Projects record files onto a development root and back.
#[derive(Debug, Clone)]
pub struct RecordProjector {
    root: NormalizedPath,
    codepage: Codepage,
    workers: usize,
}

impl RecordProjector {
    pub fn new(root: NormalizedPath, codepage: Codepage) -> Self {
        Self {
            root,
            codepage,
            workers: default_workers(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Write every record of the family's files below the root.
    ///
    /// `package` is the wizards package, or any file of the route family's
    /// directory.
    pub fn export(&self, family: RecordFamily, package: &NormalizedPath) -> Result<TransferReport<RecordKind>> {
        io::ensure_dir(&self.root)?;
        let mut files: BTreeMap<NormalizedPath, RecordSet> = BTreeMap::new();
        for kind in family.kinds() {
            let path = kind.record_file(package);
            if files.contains_key(&path) {
                continue;
            }
            match io::read_optional(&path)? {
                Some(bytes) => {
                    let (set, _) = read_records(&bytes, self.codepage)?;
                    files.insert(path, set);
                }
                None => warn!(kind = %kind, file = %path, "record file not found"),
            }
        }

        let dir = package_dir(package);
        let (report, _) = pool::run(Stage::Export, family.kinds(), self.workers, |kind| {
            let Some(set) = files.get(&kind.record_file(package)) else {
                return Ok((0, ()));
            };
            Ok((self.export_kind(kind, set, &dir)?, ()))
        })?;
        Ok(report)
    }

    fn export_kind(&self, kind: RecordKind, set: &RecordSet, package_dir: &NormalizedPath) -> Result<usize> {
        let kind_folder = self.root.join(kind.folder());
        let mut count = 0;
        for record in set.records.iter().filter(|r| kind.selects(r)) {
            self.export_record(kind, record.clone(), &kind_folder, package_dir)?;
            count += 1;
        }
        Ok(count)
    }

    fn export_record(
        &self,
        kind: RecordKind,
        mut record: RecordRef,
        kind_folder: &NormalizedPath,
        package_dir: &NormalizedPath,
    ) -> Result<()> {
        let cp = self.codepage;
        let folder = component_folder(kind, kind_folder, kind.folder_key(&record))?;
        io::ensure_dir(&folder)?;

        let mut writes = WriteSet::new();
        writes.record_folder(folder.clone());
        let mut ctx = RecordExportCtx {
            kind,
            folder: folder.clone(),
            package_dir,
            codepage: cp,
            writes: &mut writes,
        };
        match kind {
            RecordKind::Wizards => wizard::export(&mut ctx, &record)?,
            RecordKind::Routes => route::export(&mut ctx, &mut record)?,
            RecordKind::Roles => role::export(&mut ctx, &record)?,
            RecordKind::WizardGroups | RecordKind::RouteGroups => {}
        }

        let mut removed: Vec<&str> = default_removal(0).iter().map(|code| code.pick(cp)).collect();
        removed.extend_from_slice(kind.moved_out());
        record.remove_names(&removed);
        record.prepare_for_export(cp)?;
        ctx.write_bytes(HEADER_FILE, &write_record_card(kind.element(), &record, cp)?)?;

        let pruned = prune(&folder, &writes)?;
        debug!(kind = %kind, record = %record.code, pruned, "exported record");
        Ok(())
    }

    /// Rebuild the family's record files from every folder `filter` accepts.
    ///
    /// Files are rewritten whole, records in kind order.
    pub fn import(
        &self,
        family: RecordFamily,
        filter: &ImportFilter,
        package: &NormalizedPath,
    ) -> Result<TransferReport<RecordKind>> {
        let dir = package_dir(package);
        let (report, imported) = pool::run(Stage::Import, family.kinds(), self.workers, |kind| {
            let records = self.import_kind(kind, filter, &dir)?;
            Ok((records.len(), records))
        })?;

        let mut files: BTreeMap<NormalizedPath, RecordSet> = family
            .kinds()
            .iter()
            .map(|kind| (kind.record_file(package), RecordSet::new()))
            .collect();
        for (kind, records) in imported {
            if let Some(set) = files.get_mut(&kind.record_file(package)) {
                set.records.extend(records);
            }
        }
        for (path, set) in &files {
            io::write_atomic(path, &write_records(set, self.codepage)?)?;
            info!(file = %path, records = set.len(), "wrote record file");
        }
        Ok(report)
    }

    fn import_kind(
        &self,
        kind: RecordKind,
        filter: &ImportFilter,
        package_dir: &NormalizedPath,
    ) -> Result<Vec<RecordRef>> {
        let folders: Vec<_> = io::list_subdirs(&self.root.join(kind.folder()))?
            .into_iter()
            .filter(|folder| filter.need_import(folder, &self.root))
            .collect();

        let mut records = Vec::with_capacity(folders.len());
        for folder in folders {
            let bytes = io::read_bytes(&folder.join(HEADER_FILE))?;
            let mut record = read_record_card(&bytes, self.codepage)?;
            if !record.requisites.is_empty() {
                record.prepare_for_import(self.codepage);
                let ctx = RecordImportCtx {
                    folder,
                    package_dir,
                    codepage: self.codepage,
                };
                match kind {
                    RecordKind::Wizards => wizard::import(&ctx, &mut record)?,
                    RecordKind::Routes => route::import(&ctx, &mut record)?,
                    RecordKind::Roles => role::import(&ctx, &mut record)?,
                    RecordKind::WizardGroups | RecordKind::RouteGroups => {}
                }
            }
            debug!(kind = %kind, record = %record.code, "imported record");
            records.push(record);
        }
        Ok(records)
    }

    /// Remove record folders whose key `source` no longer lists.
    pub fn delete(&self, family: RecordFamily, source: &dyn RecordSource) -> Result<TransferReport<RecordKind>> {
        let (report, _) = pool::run(Stage::Delete, family.kinds(), self.workers, |kind| {
            let keys = source.keys(&kind.source())?;
            Ok((remove_unlisted(&self.root.join(kind.folder()), &keys)?, ()))
        })?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn families_partition_kinds() {
        let mut kinds: Vec<_> = [RecordFamily::Wizards, RecordFamily::Routes]
            .iter()
            .flat_map(|family| family.kinds().iter().copied())
            .collect();
        kinds.sort();
        assert_eq!(kinds, RecordKind::ALL.to_vec());
        for kind in RecordKind::ALL {
            assert!(kind.family().kinds().contains(&kind));
        }
    }

    #[rstest]
    #[case(RecordKind::WizardGroups, "dev/Wizards.xml")]
    #[case(RecordKind::Wizards, "dev/Wizards.xml")]
    #[case(RecordKind::Routes, "dev/TipMarsh.xml")]
    #[case(RecordKind::Roles, "dev/RoleTM.dat")]
    fn record_files_sit_beside_package(#[case] kind: RecordKind, #[case] expected: &str) {
        let package = NormalizedPath::new("dev/Wizards.xml");
        assert_eq!(kind.record_file(&package).as_str(), expected);
    }

    #[test]
    fn wizard_kinds_split_on_reference() {
        let group = RecordRef::new("WIZARD_GROUPS", "G1");
        let wizard = RecordRef::new("WIZARDS", "W1");
        assert!(RecordKind::WizardGroups.selects(&group));
        assert!(!RecordKind::Wizards.selects(&group));
        assert!(RecordKind::Wizards.selects(&wizard));
    }

    #[test]
    fn roles_are_keyed_by_name() {
        let role = RecordRef::new("РОЛ", "17").with_name("Approver");
        assert_eq!(RecordKind::Roles.folder_key(&role), "Approver");
        assert_eq!(RecordKind::Roles.source().key_columns, &["NameAn"]);
        assert_eq!(RecordKind::Routes.folder_key(&role), "17");
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("routes".parse::<RecordFamily>().unwrap(), RecordFamily::Routes);
        assert_eq!("wizardgroups".parse::<RecordKind>().unwrap(), RecordKind::WizardGroups);
        assert!(matches!(
            "reports".parse::<RecordFamily>(),
            Err(Error::UnknownFamily { .. })
        ));
    }
}
