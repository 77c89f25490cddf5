//! Event-text codec
//!
//! A single payload can carry scripts for several events. Each script is
//! introduced by a marker line such as `CARD.OPEN`:
//!
//! ```text
//! CARD.OPEN
//! Open()
//! CARD.CLOSE
//! Close()
//! ```
//!
//! Three marker vocabularies are recognized on input (GUID-qualified, plain
//! and the old localized one). Output always uses the plain markers.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

use crate::{Error, Result};

/// Highest numbered table with its own events.
pub const TABLE_COUNT: u8 = 24;

const LINE_BREAK: &str = "\r\n";
const FILE_EXTENSION: &str = "isbl";

/// Row operations that raise table events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableAction {
    BeforeInsert,
    AfterInsert,
    BeforeDelete,
    AfterDelete,
}

impl TableAction {
    pub const ALL: [Self; 4] = [
        Self::BeforeInsert,
        Self::AfterInsert,
        Self::BeforeDelete,
        Self::AfterDelete,
    ];

    fn postfix(self) -> Postfix {
        match self {
            Self::BeforeInsert => BEFORE_INSERT,
            Self::AfterInsert => AFTER_INSERT,
            Self::BeforeDelete => BEFORE_DELETE,
            Self::AfterDelete => AFTER_DELETE,
        }
    }
}

/// Event kinds in canonical order.
///
/// The derived ordering is the order used when joining scripts back into a
/// payload. `Table { table: 1, .. }` is the main table, whose markers carry
/// no number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    /// Text before the first marker.
    Unknown,
    OnDataSetOpen,
    OnDataSetClose,
    OnOpenRecord,
    OnCloseRecord,
    OnUpdateRatifiedRecord,
    BeforeInsert,
    AfterInsert,
    OnValidUpdate,
    BeforeUpdate,
    AfterUpdate,
    OnValidDelete,
    BeforeDelete,
    AfterDelete,
    BeforeCancel,
    AfterCancel,
    FormShow,
    FormHide,
    ListFormShow,
    ListFormHide,
    Create,
    OnValidCloseWithResult,
    CloseWithResult,
    DialogShow,
    DialogHide,
    Table { table: u8, action: TableAction },
    Select,
    BeforeSelect,
    AfterSelect,
}

#[derive(Clone, Copy)]
struct Scope {
    guid: &'static str,
    plain: &'static str,
    old: Option<&'static str>,
    file: &'static str,
}

const DATASET: Scope = Scope {
    guid: "DATASET{9AFC8FC7-30C4-4076-9076-6E09A49B791C}",
    plain: "DATASET",
    old: Some("НАБОР ДАННЫХ"),
    file: "DataSet",
};
const CARD: Scope = Scope {
    guid: "CARD{2147B5A6-496E-4EFF-88D9-78970D889F1F}",
    plain: "CARD",
    old: Some("КАРТОЧКА"),
    file: "Card",
};
const OPERATION: Scope = Scope {
    guid: "OPERATION{C6CE6EDC-3645-4BBC-B00F-587BD2A54B4C}",
    plain: "OPERATION",
    old: Some("ОПЕРАЦИЯ"),
    file: "Operation",
};
const FORM: Scope = Scope {
    guid: "FORM{B28D55C1-651A-46C9-AD4E-50E73EF213A8}",
    plain: "FORM",
    old: Some("ФОРМА"),
    file: "Form",
};
const LIST_FORM: Scope = Scope {
    guid: "LISTFORM{EF850CF0-3135-4D1F-8726-74F95C4D08C7}",
    plain: "LISTFORM",
    old: None,
    file: "ListForm",
};
const TABLE: Scope = Scope {
    guid: "TABLE{D402E843-74B2-4DC1-BFFD-DE677B48452C}",
    plain: "TABLE",
    old: Some("ТАБЛИЦА"),
    file: "Table",
};
const DIALOG: Scope = Scope {
    guid: "DIALOG{3AA220D8-D906-4914-8586-F534A4C3767E}",
    plain: "DIALOG",
    old: None,
    file: "Dialog",
};
const REQUISITE: Scope = Scope {
    guid: "REQUISITE{CA900538-FC82-47D2-B574-001875901D2D}",
    plain: "REQUISITE",
    old: None,
    file: "Requisite",
};

#[derive(Clone, Copy)]
struct Postfix {
    marker: &'static str,
    old: Option<&'static str>,
    file: &'static str,
}

const fn postfix(marker: &'static str, old: Option<&'static str>, file: &'static str) -> Postfix {
    Postfix { marker, old, file }
}

const OPEN: Postfix = postfix("OPEN", Some("ОТКРЫТИЕ"), "Open");
const CLOSE: Postfix = postfix("CLOSE", Some("ЗАКРЫТИЕ"), "Close");
const EXECUTION: Postfix = postfix("EXECUTION", Some("ВЫПОЛНЕНИЕ"), "Execution");
const BEFORE_INSERT: Postfix = postfix("BEFORE_INSERT", Some("ДОБАВЛЕНИЕ ДО"), "BeforeInsert");
const AFTER_INSERT: Postfix = postfix("AFTER_INSERT", Some("ДОБАВЛЕНИЕ ПОСЛЕ"), "AfterInsert");
const VALID_UPDATE: Postfix = postfix("VALID_UPDATE", Some("СОХРАНЕНИЕ ВОЗМОЖНОСТЬ"), "ValidUpdate");
const BEFORE_UPDATE: Postfix = postfix("BEFORE_UPDATE", Some("СОХРАНЕНИЕ ДО"), "BeforeUpdate");
const AFTER_UPDATE: Postfix = postfix("AFTER_UPDATE", Some("СОХРАНЕНИЕ ПОСЛЕ"), "AfterUpdate");
const VALID_DELETE: Postfix = postfix("VALID_DELETE", Some("УДАЛЕНИЕ ВОЗМОЖНОСТЬ"), "ValidDelete");
const BEFORE_DELETE: Postfix = postfix("BEFORE_DELETE", Some("УДАЛЕНИЕ ДО"), "BeforeDelete");
const AFTER_DELETE: Postfix = postfix("AFTER_DELETE", Some("УДАЛЕНИЕ ПОСЛЕ"), "AfterDelete");
const BEFORE_CANCEL: Postfix = postfix("BEFORE_CANCEL", Some("ОТМЕНА ДО"), "BeforeCancel");
const AFTER_CANCEL: Postfix = postfix("AFTER_CANCEL", Some("ОТМЕНА ПОСЛЕ"), "AfterCancel");
const SHOW: Postfix = postfix("SHOW", Some("ПОКАЗ"), "Show");
const HIDE: Postfix = postfix("HIDE", Some("СКРЫТИЕ"), "Hide");
const CREATE: Postfix = postfix("CREATE", None, "Create");
const VALID_CLOSE_WITH_RESULT: Postfix =
    postfix("VALID_CLOSE_WITH_RESULT", None, "ValidCloseWithResult");
const CLOSE_WITH_RESULT: Postfix = postfix("CLOSE_WITH_RESULT", None, "CloseWithResult");
const DIALOG_SHOW: Postfix = postfix("DIALOG_SHOW", None, "DialogShow");
const DIALOG_HIDE: Postfix = postfix("DIALOG_HIDE", None, "DialogHide");
const SELECT: Postfix = postfix("SELECT", None, "Select");
const BEFORE_SELECT: Postfix = postfix("BEFORE_SELECT", None, "BeforeSelect");
const AFTER_SELECT: Postfix = postfix("AFTER_SELECT", None, "AfterSelect");

static ALL: LazyLock<Vec<EventKind>> = LazyLock::new(|| {
    use EventKind::*;
    let mut kinds = vec![
        Unknown,
        OnDataSetOpen,
        OnDataSetClose,
        OnOpenRecord,
        OnCloseRecord,
        OnUpdateRatifiedRecord,
        BeforeInsert,
        AfterInsert,
        OnValidUpdate,
        BeforeUpdate,
        AfterUpdate,
        OnValidDelete,
        BeforeDelete,
        AfterDelete,
        BeforeCancel,
        AfterCancel,
        FormShow,
        FormHide,
        ListFormShow,
        ListFormHide,
        Create,
        OnValidCloseWithResult,
        CloseWithResult,
        DialogShow,
        DialogHide,
    ];
    for table in 1..=TABLE_COUNT {
        kinds.extend(TableAction::ALL.map(|action| Table { table, action }));
    }
    kinds.extend([Select, BeforeSelect, AfterSelect]);
    kinds
});

/// Every marker of every vocabulary.
static MARKERS: LazyLock<HashMap<String, EventKind>> = LazyLock::new(|| {
    let mut markers = HashMap::new();
    for &kind in ALL.iter() {
        let Some((scope, number, post)) = kind.parts() else {
            continue;
        };
        markers.insert(format!("{}{number}.{}", scope.guid, post.marker), kind);
        markers.insert(format!("{}{number}.{}", scope.plain, post.marker), kind);
        if let (Some(scope_old), Some(post_old)) = (scope.old, post.old) {
            markers.insert(format!("{scope_old}{number}.{post_old}"), kind);
        }
    }
    markers
});

static FILE_NAMES: LazyLock<HashMap<String, EventKind>> = LazyLock::new(|| {
    ALL.iter().map(|&kind| (kind.file_name(), kind)).collect()
});

impl EventKind {
    /// All kinds in canonical order.
    pub fn all() -> &'static [EventKind] {
        &ALL
    }

    /// Event of a numbered table, `1` being the main table.
    pub fn table(table: u8, action: TableAction) -> Result<Self> {
        if (1..=TABLE_COUNT).contains(&table) {
            Ok(Self::Table { table, action })
        } else {
            Err(Error::TableOutOfRange { table })
        }
    }

    /// Scope, table number suffix and postfix of the kind's markers.
    fn parts(self) -> Option<(Scope, String, Postfix)> {
        use EventKind::*;
        let plain = |scope, post| Some((scope, String::new(), post));
        match self {
            Unknown => None,
            OnDataSetOpen => plain(DATASET, OPEN),
            OnDataSetClose => plain(DATASET, CLOSE),
            OnOpenRecord => plain(CARD, OPEN),
            OnCloseRecord => plain(CARD, CLOSE),
            OnUpdateRatifiedRecord => plain(OPERATION, EXECUTION),
            BeforeInsert => plain(CARD, BEFORE_INSERT),
            AfterInsert => plain(CARD, AFTER_INSERT),
            OnValidUpdate => plain(CARD, VALID_UPDATE),
            BeforeUpdate => plain(CARD, BEFORE_UPDATE),
            AfterUpdate => plain(CARD, AFTER_UPDATE),
            OnValidDelete => plain(CARD, VALID_DELETE),
            BeforeDelete => plain(CARD, BEFORE_DELETE),
            AfterDelete => plain(CARD, AFTER_DELETE),
            BeforeCancel => plain(CARD, BEFORE_CANCEL),
            AfterCancel => plain(CARD, AFTER_CANCEL),
            FormShow => plain(FORM, SHOW),
            FormHide => plain(FORM, HIDE),
            ListFormShow => plain(LIST_FORM, SHOW),
            ListFormHide => plain(LIST_FORM, HIDE),
            Create => plain(DIALOG, CREATE),
            OnValidCloseWithResult => plain(DIALOG, VALID_CLOSE_WITH_RESULT),
            CloseWithResult => plain(DIALOG, CLOSE_WITH_RESULT),
            DialogShow => plain(FORM, DIALOG_SHOW),
            DialogHide => plain(FORM, DIALOG_HIDE),
            Table { table, action } => {
                let number = if table > 1 { table.to_string() } else { String::new() };
                Some((TABLE, number, action.postfix()))
            }
            Select => plain(REQUISITE, SELECT),
            BeforeSelect => plain(REQUISITE, BEFORE_SELECT),
            AfterSelect => plain(REQUISITE, AFTER_SELECT),
        }
    }

    /// Plain marker line, `None` for [`EventKind::Unknown`].
    pub fn marker(self) -> Option<String> {
        let (scope, number, post) = self.parts()?;
        Some(format!("{}{number}.{}", scope.plain, post.marker))
    }

    /// Kind named by a marker line of any vocabulary.
    pub fn from_marker(line: &str) -> Option<Self> {
        MARKERS.get(line).copied()
    }

    /// Name of the side file holding this event's script.
    pub fn file_name(self) -> String {
        match self.parts() {
            Some((scope, number, post)) => {
                format!("{}{number}.{}.{FILE_EXTENSION}", scope.file, post.file)
            }
            None => format!("Unknown.{FILE_EXTENSION}"),
        }
    }

    /// Kind stored under a side file name.
    pub fn from_file_name(name: &str) -> Result<Self> {
        FILE_NAMES
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownEventFile {
                name: name.to_string(),
            })
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table { table: 1, action } => write!(f, "Table{action:?}"),
            Self::Table { table, action } => write!(f, "Table{table}{action:?}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Split a payload into per-event scripts.
///
/// Scripts keep their trailing line breaks. The empty remainder after a
/// final line break is dropped once a marker has been seen. A repeated
/// marker replaces the earlier script of the same kind.
pub fn parse(payload: &str) -> BTreeMap<EventKind, String> {
    let mut events = BTreeMap::new();
    if payload.is_empty() {
        return events;
    }

    let lines: Vec<&str> = payload.split(LINE_BREAK).collect();
    let last = lines.len() - 1;
    let mut kind = EventKind::Unknown;
    let mut text = String::new();

    for (index, line) in lines.iter().enumerate() {
        if let Some(next) = EventKind::from_marker(line) {
            if index > 0 {
                events.insert(kind, std::mem::take(&mut text));
            }
            kind = next;
            text.clear();
        } else if index != last || !line.is_empty() || kind == EventKind::Unknown {
            text.push_str(line);
            text.push_str(LINE_BREAK);
        }
    }
    events.insert(kind, text);
    events
}

/// Join per-event scripts into one payload, in canonical order.
///
/// A lone [`EventKind::Select`] script is stored bare, without its marker
/// and final line break. Text of [`EventKind::Unknown`] is written first,
/// without a marker.
pub fn join(events: &BTreeMap<EventKind, String>) -> String {
    if events.len() == 1 {
        if let Some(text) = events.get(&EventKind::Select) {
            return text.strip_suffix(LINE_BREAK).unwrap_or(text).to_string();
        }
    }

    let mut payload = String::new();
    for (kind, text) in events {
        if let Some(marker) = kind.marker() {
            payload.push_str(&marker);
            payload.push_str(LINE_BREAK);
        }
        payload.push_str(text);
    }
    payload
}
