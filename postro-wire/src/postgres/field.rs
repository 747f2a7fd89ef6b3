//! Message field descriptors.
use super::{Oid, PgFormat, PgType};

/// One column of a query result, as carried in `RowDescription`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field<'a> {
    /// The field name.
    pub name: &'a str,
    /// If the field can be identified as a column of a specific table,
    /// the object ID of the table; otherwise zero.
    pub table_oid: Oid,
    /// If the field can be identified as a column of a specific table,
    /// the attribute number of the column; otherwise zero.
    pub column_idx: u16,
    /// The data type of the field.
    pub pg_type: PgType,
    /// The type modifier (see pg_attribute.atttypmod). The meaning of the modifier is type-specific.
    pub type_modifier: i32,
    /// The format code being used for the field.
    pub format: PgFormat,
}

impl<'a> Field<'a> {
    /// Field that is not attributable to a table column.
    pub fn new(name: &'a str, pg_type: PgType) -> Field<'a> {
        Self {
            name,
            table_oid: 0,
            column_idx: 0,
            pg_type,
            type_modifier: -1,
            format: PgFormat::Text,
        }
    }

    pub fn with_format(mut self, format: PgFormat) -> Self {
        self.format = format;
        self
    }
}

/// One value bound for `Bind` or `FunctionCall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterBound<'a> {
    pub format: PgFormat,
    /// `None` is SQL `NULL`, which is distinct from an empty value.
    pub value: Option<&'a [u8]>,
}

impl<'a> ParameterBound<'a> {
    pub const fn text(value: &'a [u8]) -> Self {
        Self { format: PgFormat::Text, value: Some(value) }
    }

    pub const fn binary(value: &'a [u8]) -> Self {
        Self { format: PgFormat::Binary, value: Some(value) }
    }

    pub const fn null(format: PgFormat) -> Self {
        Self { format, value: None }
    }
}

/// One identified field of `ErrorResponse` or `NoticeResponse`.
///
/// <https://www.postgresql.org/docs/current/protocol-error-fields.html>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorField<'a> {
    /// A code identifying the field type, never zero.
    pub code: u8,
    pub value: &'a str,
}

impl<'a> ErrorField<'a> {
    pub const fn new(code: u8, value: &'a str) -> Self {
        Self { code, value }
    }

    pub const SEVERITY: u8 = b'S';
    /// Severity that is never localized.
    pub const SEVERITY_NONLOCALIZED: u8 = b'V';
    /// The SQLSTATE code for the error.
    pub const CODE: u8 = b'C';
    /// The primary human-readable error message.
    pub const MESSAGE: u8 = b'M';
    pub const DETAIL: u8 = b'D';
    pub const HINT: u8 = b'H';
    /// Error cursor position as an index into the original query string.
    pub const POSITION: u8 = b'P';
    pub const INTERNAL_POSITION: u8 = b'p';
    pub const INTERNAL_QUERY: u8 = b'q';
    pub const WHERE: u8 = b'W';
    pub const SCHEMA: u8 = b's';
    pub const TABLE: u8 = b't';
    pub const COLUMN: u8 = b'c';
    pub const DATA_TYPE: u8 = b'd';
    pub const CONSTRAINT: u8 = b'n';
    pub const FILE: u8 = b'F';
    pub const LINE: u8 = b'L';
    pub const ROUTINE: u8 = b'R';
}

/// Find field value by code.
pub fn error_field<'a>(fields: &[ErrorField<'a>], code: u8) -> Option<&'a str> {
    fields.iter().find(|f| f.code == code).map(|f| f.value)
}
