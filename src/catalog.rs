//! Static operation catalog.
//!
//! Each [`Operation`] is plain data: the XML command it maps to, the shape of
//! its request, and the arguments it accepts. [`crate::dispatch::build_request`]
//! is the single code path that turns any of them into a request document.
//!
//! Falsy arguments are dropped from the request (see [`crate::definition`]).
//! Fields where `0` is meaningful, such as `VISIBILITY` (0 = private), must be
//! passed as text (`"0"`) to reach the wire.

use crate::definition::Entry;
use crate::definition::Template::{Nested, Placeholder};
use crate::value::Value;
use ArgDefault::{Bool, Text, Unset};

/// How an operation's request body is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// Substitute the arguments into this definition, then serialize.
    Definition(&'static [Entry]),
    /// Encode `table_id` and `rows` with attribute-named columns.
    Relational { column_tag: &'static str },
}

/// Default applied to an optional argument the caller did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgDefault {
    Unset,
    Bool(bool),
    Text(&'static str),
}

impl ArgDefault {
    pub fn to_value(self) -> Option<Value> {
        match self {
            ArgDefault::Unset => None,
            ArgDefault::Bool(b) => Some(Value::Bool(b)),
            ArgDefault::Text(s) => Some(Value::from(s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// Catalog name, e.g. `add_recipient`.
    pub name: &'static str,
    /// XML command element, e.g. `AddRecipient`.
    pub command: &'static str,
    pub shape: RequestShape,
    pub required: &'static [&'static str],
    pub optional: &'static [(&'static str, ArgDefault)],
}

impl Operation {
    /// Whether `label` is a declared argument of this operation.
    pub fn accepts(&self, label: &str) -> bool {
        self.arguments().any(|arg| arg == label)
    }

    /// Declared arguments, required first.
    pub fn arguments(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.required
            .iter()
            .copied()
            .chain(self.optional.iter().map(|(label, _)| *label))
    }
}

pub const ADD_RECIPIENT: Operation = Operation {
    name: "add_recipient",
    command: "AddRecipient",
    shape: RequestShape::Definition(&[
        ("LIST_ID", Placeholder("list_id")),
        ("CREATED_FROM", Placeholder("created_from")),
        ("SEND_AUTOREPLY", Placeholder("send_autoreply")),
        ("UPDATE_IF_FOUND", Placeholder("update_if_found")),
        ("ALLOW_HTML", Placeholder("allow_html")),
        ("VISITOR_KEY", Placeholder("visitor_key")),
        ("CONTACT_LISTS", Nested(&[("CONTACT_LIST_ID", Placeholder("contact_lists"))])),
        ("SYNC_FIELDS", Nested(&[("SYNC_FIELD", Placeholder("sync_fields"))])),
        ("COLUMN", Placeholder("columns")),
    ]),
    required: &["list_id", "created_from"],
    optional: &[
        ("send_autoreply", Bool(false)),
        ("update_if_found", Bool(false)),
        ("allow_html", Bool(false)),
        ("visitor_key", Unset),
        ("contact_lists", Unset),
        ("sync_fields", Unset),
        ("columns", Unset),
    ],
};

pub const UPDATE_RECIPIENT: Operation = Operation {
    name: "update_recipient",
    command: "UpdateRecipient",
    shape: RequestShape::Definition(&[
        ("LIST_ID", Placeholder("list_id")),
        ("OLD_EMAIL", Placeholder("old_email")),
        ("RECIPIENT_ID", Placeholder("recipient_id")),
        ("ENCODED_RECIPIENT_ID", Placeholder("encoded_recipient_id")),
        ("SEND_AUTOREPLY", Placeholder("send_autoreply")),
        ("ALLOW_HTML", Placeholder("allow_html")),
        ("VISITOR_KEY", Placeholder("visitor_key")),
        ("SYNC_FIELDS", Nested(&[("SYNC_FIELD", Placeholder("sync_fields"))])),
        (
            "SNOOZE_SETTINGS",
            Nested(&[
                ("SNOOZED", Placeholder("snoozed")),
                ("RESUME_SEND_DATE", Placeholder("resume_send_date")),
                ("DAYS_TO_SNOOZE", Placeholder("days_to_snooze")),
            ]),
        ),
        ("COLUMN", Placeholder("columns")),
    ]),
    required: &["list_id"],
    optional: &[
        ("old_email", Unset),
        ("recipient_id", Unset),
        ("encoded_recipient_id", Unset),
        ("send_autoreply", Bool(false)),
        ("allow_html", Bool(false)),
        ("visitor_key", Unset),
        ("sync_fields", Unset),
        ("snoozed", Unset),
        ("resume_send_date", Unset),
        ("days_to_snooze", Unset),
        ("columns", Unset),
    ],
};

pub const OPT_OUT_RECIPIENT: Operation = Operation {
    name: "opt_out_recipient",
    command: "OptOutRecipient",
    shape: RequestShape::Definition(&[
        ("LIST_ID", Placeholder("list_id")),
        ("EMAIL", Placeholder("email")),
        ("RECIPIENT_ID", Placeholder("recipient_id")),
        ("MAILING_ID", Placeholder("mailing_id")),
        ("JOB_ID", Placeholder("job_id")),
        ("COLUMN", Placeholder("columns")),
    ]),
    required: &["list_id"],
    optional: &[
        ("email", Unset),
        ("recipient_id", Unset),
        ("mailing_id", Unset),
        ("job_id", Unset),
        ("columns", Unset),
    ],
};

pub const REMOVE_RECIPIENT: Operation = Operation {
    name: "remove_recipient",
    command: "RemoveRecipient",
    shape: RequestShape::Definition(&[
        ("LIST_ID", Placeholder("list_id")),
        ("EMAIL", Placeholder("email")),
        ("COLUMN", Placeholder("columns")),
    ]),
    required: &["list_id", "email"],
    optional: &[("columns", Unset)],
};

pub const SELECT_RECIPIENT_DATA: Operation = Operation {
    name: "select_recipient_data",
    command: "SelectRecipientData",
    shape: RequestShape::Definition(&[
        ("LIST_ID", Placeholder("list_id")),
        ("EMAIL", Placeholder("email")),
        ("RECIPIENT_ID", Placeholder("recipient_id")),
        ("ENCODED_RECIPIENT_ID", Placeholder("encoded_recipient_id")),
        ("VISITOR_KEY", Placeholder("visitor_key")),
        ("RETURN_CONTACT_LISTS", Placeholder("return_contact_lists")),
        ("COLUMN", Placeholder("columns")),
    ]),
    required: &["list_id"],
    optional: &[
        ("email", Unset),
        ("recipient_id", Unset),
        ("encoded_recipient_id", Unset),
        ("visitor_key", Unset),
        ("return_contact_lists", Bool(false)),
        ("columns", Unset),
    ],
};

pub const ADD_CONTACT_TO_CONTACT_LIST: Operation = Operation {
    name: "add_contact_to_contact_list",
    command: "AddContactToContactList",
    shape: RequestShape::Definition(&[
        ("CONTACT_LIST_ID", Placeholder("contact_list_id")),
        ("CONTACT_ID", Placeholder("contact_id")),
        ("COLUMN", Placeholder("columns")),
    ]),
    required: &["contact_list_id"],
    optional: &[("contact_id", Unset), ("columns", Unset)],
};

pub const CREATE_CONTACT_LIST: Operation = Operation {
    name: "create_contact_list",
    command: "CreateContactList",
    shape: RequestShape::Definition(&[
        ("DATABASE_ID", Placeholder("database_id")),
        ("CONTACT_LIST_NAME", Placeholder("contact_list_name")),
        ("VISIBILITY", Placeholder("visibility")),
        ("PARENT_FOLDER_ID", Placeholder("parent_folder_id")),
        ("PARENT_FOLDER_PATH", Placeholder("parent_folder_path")),
    ]),
    required: &["database_id", "contact_list_name"],
    optional: &[
        ("visibility", Text("0")),
        ("parent_folder_id", Unset),
        ("parent_folder_path", Unset),
    ],
};

pub const GET_LISTS: Operation = Operation {
    name: "get_lists",
    command: "GetLists",
    shape: RequestShape::Definition(&[
        ("VISIBILITY", Placeholder("visibility")),
        ("LIST_TYPE", Placeholder("list_type")),
        ("FOLDER_ID", Placeholder("folder_id")),
        ("INCLUDE_ALL_LISTS", Placeholder("include_all_lists")),
        ("INCLUDE_TAGS", Placeholder("include_tags")),
    ]),
    required: &[],
    optional: &[
        ("visibility", Text("1")),
        ("list_type", Text("2")),
        ("folder_id", Unset),
        ("include_all_lists", Unset),
        ("include_tags", Unset),
    ],
};

pub const GET_LIST_META_DATA: Operation = Operation {
    name: "get_list_meta_data",
    command: "GetListMetaData",
    shape: RequestShape::Definition(&[("LIST_ID", Placeholder("list_id"))]),
    required: &["list_id"],
    optional: &[],
};

pub const EXPORT_LIST: Operation = Operation {
    name: "export_list",
    command: "ExportList",
    shape: RequestShape::Definition(&[
        ("LIST_ID", Placeholder("list_id")),
        ("EMAIL", Placeholder("email")),
        ("EXPORT_TYPE", Placeholder("export_type")),
        ("EXPORT_FORMAT", Placeholder("export_format")),
        ("FILE_ENCODING", Placeholder("file_encoding")),
        ("ADD_TO_STORED_FILES", Placeholder("add_to_stored_files")),
        ("DATE_START", Placeholder("date_start")),
        ("DATE_END", Placeholder("date_end")),
        ("USE_CREATED_DATE", Placeholder("use_created_date")),
        ("INCLUDE_LEAD_SOURCE", Placeholder("include_lead_source")),
        ("LIST_DATE_FORMAT", Placeholder("list_date_format")),
    ]),
    required: &["list_id"],
    optional: &[
        ("email", Unset),
        ("export_type", Text("ALL")),
        ("export_format", Text("CSV")),
        ("file_encoding", Unset),
        ("add_to_stored_files", Unset),
        ("date_start", Unset),
        ("date_end", Unset),
        ("use_created_date", Unset),
        ("include_lead_source", Unset),
        ("list_date_format", Unset),
    ],
};

pub const GET_JOB_STATUS: Operation = Operation {
    name: "get_job_status",
    command: "GetJobStatus",
    shape: RequestShape::Definition(&[("JOB_ID", Placeholder("job_id"))]),
    required: &["job_id"],
    optional: &[],
};

pub const SEND_MAILING: Operation = Operation {
    name: "send_mailing",
    command: "SendMailing",
    shape: RequestShape::Definition(&[
        ("MailingId", Placeholder("mailingId")),
        ("RecipientEmail", Placeholder("recipientEmail")),
    ]),
    required: &["mailingId", "recipientEmail"],
    optional: &[],
};

pub const SCHEDULE_MAILING: Operation = Operation {
    name: "schedule_mailing",
    command: "ScheduleMailing",
    shape: RequestShape::Definition(&[
        ("TEMPLATE_ID", Placeholder("template_id")),
        ("LIST_ID", Placeholder("list_id")),
        ("MAILING_NAME", Placeholder("mailing_name")),
        ("SEND_HTML", Placeholder("send_html")),
        ("SEND_TEXT", Placeholder("send_text")),
        ("SUBJECT", Placeholder("subject")),
        ("FROM_NAME", Placeholder("from_name")),
        ("FROM_ADDRESS", Placeholder("from_address")),
        ("REPLY_TO", Placeholder("reply_to")),
        ("VISIBILITY", Placeholder("shared")),
        ("SCHEDULED", Placeholder("scheduled")),
        ("INBOX_MONITOR", Placeholder("inbox_monitor")),
        ("SEND_TIME_OPTIMIZATION", Placeholder("send_time_optimization")),
        ("WA_MAILINGLEVEL_CODE", Placeholder("wa_mailinglevel_code")),
        (
            "SUPPRESSION_LISTS",
            Nested(&[("SUPPRESSION_LIST_ID", Placeholder("suppression_lists"))]),
        ),
        ("PARENT_FOLDER_PATH", Placeholder("parent_folder_path")),
        ("CREATE_PARENT_FOLDER", Placeholder("create_parent_folder")),
        ("CUSTOM_OPT_OUT", Placeholder("custom_opt_out")),
        ("SUBSTITUTIONS", Nested(&[("SUBSTITUTION", Placeholder("substitutions"))])),
    ]),
    required: &["template_id", "list_id", "mailing_name"],
    optional: &[
        ("send_html", Bool(false)),
        ("send_text", Bool(false)),
        ("subject", Unset),
        ("from_name", Unset),
        ("from_address", Unset),
        ("reply_to", Unset),
        ("shared", Bool(true)),
        ("scheduled", Unset),
        ("inbox_monitor", Unset),
        ("send_time_optimization", Unset),
        ("wa_mailinglevel_code", Unset),
        ("suppression_lists", Unset),
        ("parent_folder_path", Unset),
        ("create_parent_folder", Unset),
        ("custom_opt_out", Unset),
        ("substitutions", Unset),
    ],
};

/// `columns` is a list of [`TableColumn`] trees. Each `COLUMN` lands in its own
/// `COLUMNS` wrapper, like every other `COLUMN` element.
pub const CREATE_TABLE: Operation = Operation {
    name: "create_table",
    command: "CreateTable",
    shape: RequestShape::Definition(&[(
        "TABLE",
        Nested(&[
            ("NAME", Placeholder("table_name")),
            ("COLUMN", Placeholder("columns")),
        ]),
    )]),
    required: &["table_name", "columns"],
    optional: &[],
};

pub const INSERT_UPDATE_RELATIONAL_TABLE: Operation = Operation {
    name: "insert_update_relational_table",
    command: "InsertUpdateRelationalTable",
    shape: RequestShape::Relational {
        column_tag: "COLUMN",
    },
    required: &["table_id", "rows"],
    optional: &[],
};

pub const DELETE_RELATIONAL_TABLE_DATA: Operation = Operation {
    name: "delete_relational_table_data",
    command: "DeleteRelationalTableData",
    shape: RequestShape::Relational {
        column_tag: "KEY_COLUMN",
    },
    required: &["table_id", "rows"],
    optional: &[],
};

pub static OPERATIONS: &[Operation] = &[
    ADD_RECIPIENT,
    UPDATE_RECIPIENT,
    OPT_OUT_RECIPIENT,
    REMOVE_RECIPIENT,
    SELECT_RECIPIENT_DATA,
    ADD_CONTACT_TO_CONTACT_LIST,
    CREATE_CONTACT_LIST,
    GET_LISTS,
    GET_LIST_META_DATA,
    EXPORT_LIST,
    GET_JOB_STATUS,
    SEND_MAILING,
    SCHEDULE_MAILING,
    CREATE_TABLE,
    INSERT_UPDATE_RELATIONAL_TABLE,
    DELETE_RELATIONAL_TABLE_DATA,
];

/// Finds an operation by catalog name (`add_recipient`) or command (`AddRecipient`).
pub fn lookup(name: &str) -> Option<&'static Operation> {
    OPERATIONS
        .iter()
        .find(|op| op.name == name || op.command == name)
}

/// Relational table column types accepted by `CreateTable`.
///
/// Phone number columns can only be created through the web UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    YesNo,
    Numeric,
    Date,
    Time,
    Country,
    Selection,
    Email,
    SyncId,
    Timestamp,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::YesNo => "YESNO",
            ColumnType::Numeric => "NUMERIC",
            ColumnType::Date => "DATE",
            ColumnType::Time => "TIME",
            ColumnType::Country => "COUNTRY",
            ColumnType::Selection => "SELECTION",
            ColumnType::Email => "EMAIL",
            ColumnType::SyncId => "SYNC_ID",
            ColumnType::Timestamp => "DATE_TIME",
        }
    }
}

/// One column of a relational table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub required: bool,
    pub key_column: bool,
}

impl TableColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            required: false,
            key_column: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn key(mut self) -> Self {
        self.key_column = true;
        self
    }
}

impl From<&TableColumn> for Value {
    fn from(column: &TableColumn) -> Self {
        let mut entries = vec![
            ("NAME".to_string(), Value::from(column.name.as_str())),
            ("TYPE".to_string(), Value::from(column.column_type.as_str())),
            (
                "IS_REQUIRED".to_string(),
                Value::from(if column.required { "true" } else { "false" }),
            ),
        ];
        if column.key_column {
            entries.push(("KEY_COLUMN".to_string(), Value::from("true")));
        }
        Value::Tree(entries)
    }
}

impl From<TableColumn> for Value {
    fn from(column: TableColumn) -> Self {
        Value::from(&column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::placeholders;
    use std::collections::HashSet;

    #[test]
    fn test_every_placeholder_is_declared() {
        for op in OPERATIONS {
            if let RequestShape::Definition(definition) = op.shape {
                for label in placeholders(definition) {
                    assert!(op.accepts(label), "{}: undeclared placeholder {}", op.name, label);
                }
            }
        }
    }

    #[test]
    fn test_every_declared_argument_is_used() {
        for op in OPERATIONS {
            match op.shape {
                RequestShape::Definition(definition) => {
                    let used: HashSet<_> = placeholders(definition).into_iter().collect();
                    for arg in op.arguments() {
                        assert!(used.contains(arg), "{}: unused argument {}", op.name, arg);
                    }
                }
                RequestShape::Relational { .. } => {
                    assert_eq!(op.arguments().collect::<Vec<_>>(), vec!["table_id", "rows"]);
                }
            }
        }
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = OPERATIONS.iter().map(|op| op.name).collect();
        let commands: HashSet<_> = OPERATIONS.iter().map(|op| op.command).collect();
        assert_eq!(names.len(), OPERATIONS.len());
        assert_eq!(commands.len(), OPERATIONS.len());
    }

    #[test]
    fn test_lookup_by_name_or_command() {
        assert_eq!(lookup("add_recipient"), Some(&ADD_RECIPIENT));
        assert_eq!(lookup("ScheduleMailing"), Some(&SCHEDULE_MAILING));
        assert_eq!(lookup("nope"), None);
    }

    #[test]
    fn test_table_column_tree() {
        let value = Value::from(TableColumn::new("donor_email", ColumnType::Email).required().key());
        assert_eq!(
            value,
            Value::tree([
                ("NAME", "donor_email"),
                ("TYPE", "EMAIL"),
                ("IS_REQUIRED", "true"),
                ("KEY_COLUMN", "true"),
            ])
        );

        let plain = Value::from(TableColumn::new("note", ColumnType::Text));
        assert_eq!(
            plain,
            Value::tree([("NAME", "note"), ("TYPE", "TEXT"), ("IS_REQUIRED", "false")])
        );
    }
}
