//! Entity kinds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// An entity kind projected into its own folder under the development root.
///
/// The variant name is also the folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kind {
    Constants,
    Dialogs,
    DialogRequisites,
    DocumentCardTypes,
    DocumentRequisites,
    FunctionGroups,
    Functions,
    IntegratedReports,
    Reports,
    LocalizationStrings,
    Modules,
    ReferenceRequisites,
    ReferenceTypes,
    RouteBlockGroups,
    RouteBlocks,
    Scripts,
    ServerEvents,
    Viewers,
}

impl Kind {
    pub const ALL: [Kind; 18] = [
        Kind::Constants,
        Kind::Dialogs,
        Kind::DialogRequisites,
        Kind::DocumentCardTypes,
        Kind::DocumentRequisites,
        Kind::FunctionGroups,
        Kind::Functions,
        Kind::IntegratedReports,
        Kind::Reports,
        Kind::LocalizationStrings,
        Kind::Modules,
        Kind::ReferenceRequisites,
        Kind::ReferenceTypes,
        Kind::RouteBlockGroups,
        Kind::RouteBlocks,
        Kind::Scripts,
        Kind::ServerEvents,
        Kind::Viewers,
    ];

    /// Folder under the development root.
    pub fn folder(self) -> &'static str {
        match self {
            Self::Constants => "Constants",
            Self::Dialogs => "Dialogs",
            Self::DialogRequisites => "DialogRequisites",
            Self::DocumentCardTypes => "DocumentCardTypes",
            Self::DocumentRequisites => "DocumentRequisites",
            Self::FunctionGroups => "FunctionGroups",
            Self::Functions => "Functions",
            Self::IntegratedReports => "IntegratedReports",
            Self::Reports => "Reports",
            Self::LocalizationStrings => "LocalizationStrings",
            Self::Modules => "Modules",
            Self::ReferenceRequisites => "ReferenceRequisites",
            Self::ReferenceTypes => "ReferenceTypes",
            Self::RouteBlockGroups => "RouteBlockGroups",
            Self::RouteBlocks => "RouteBlocks",
            Self::Scripts => "Scripts",
            Self::ServerEvents => "ServerEvents",
            Self::Viewers => "Viewers",
        }
    }

    /// Package group holding this kind's components.
    ///
    /// Reports and integrated reports share one group.
    pub fn group(self) -> &'static str {
        match self {
            Self::Constants => "Constants",
            Self::Dialogs => "Dialogs",
            Self::DialogRequisites => "DialogRequisites",
            Self::DocumentCardTypes => "EDCardTypes",
            Self::DocumentRequisites => "EDocRequisites",
            Self::FunctionGroups => "GrFunctions",
            Self::Functions => "Functions",
            Self::IntegratedReports | Self::Reports => "Reports",
            Self::LocalizationStrings => "LocalizedStrings",
            Self::Modules => "Modules",
            Self::ReferenceRequisites => "RefRequisites",
            Self::ReferenceTypes => "RefTypes",
            Self::RouteBlockGroups => "WorkflowBlockGroups",
            Self::RouteBlocks => "WorkflowBlocks",
            Self::Scripts => "Scripts",
            Self::ServerEvents => "ServerEvents",
            Self::Viewers => "Viewers",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

impl FromStr for Kind {
    type Err = Error;

    /// Case-insensitive folder name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.folder().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownKind {
                name: s.to_string(),
            })
    }
}
