//! Postgres data type metadata.
use std::{borrow::Cow, collections::HashMap, sync::LazyLock};

/// Postgres object identifier.
///
/// The oid type is implemented as an unsigned four-byte integer.
///
/// <https://www.postgresql.org/docs/current/datatype-oid.html>
pub type Oid = u32;

/// Postgres data type metadata, mirror of the relevant `pg_type` catalog columns.
///
/// <https://www.postgresql.org/docs/current/catalog-pg-type.html>
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PgType {
    /// `oid`, uniquely identify type in one [`TypeLibrary`].
    pub oid: Oid,
    /// `typname`
    pub name: Cow<'static, str>,
    /// `typarray`, the array type which have this type as element, or zero.
    pub array_oid: Oid,
    /// `typelem`, the element type if this type is an array, or zero.
    pub element_oid: Oid,
    /// `typlen`, the data type size.
    ///
    /// Note that negative values denote variable-width types.
    pub byte_len: i16,
    /// `typtype`
    pub kind: TypeKind,
    /// `typcategory`
    pub category: TypeCategory,
}

/// `typtype`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeKind {
    Base,
    Composite,
    Domain,
    Enum,
    Pseudo,
    Range,
    Multirange,
}

/// `typcategory`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeCategory {
    Array,
    Boolean,
    Composite,
    DateTime,
    Enum,
    Geometric,
    NetworkAddress,
    Numeric,
    Pseudo,
    Range,
    String,
    Timespan,
    UserDefined,
    BitString,
    Unknown,
}

impl TypeKind {
    /// Catalog character code.
    pub const fn code(&self) -> u8 {
        match self {
            Self::Base => b'b',
            Self::Composite => b'c',
            Self::Domain => b'd',
            Self::Enum => b'e',
            Self::Pseudo => b'p',
            Self::Range => b'r',
            Self::Multirange => b'm',
        }
    }
}

impl TypeCategory {
    /// Catalog character code.
    pub const fn code(&self) -> u8 {
        match self {
            Self::Array => b'A',
            Self::Boolean => b'B',
            Self::Composite => b'C',
            Self::DateTime => b'D',
            Self::Enum => b'E',
            Self::Geometric => b'G',
            Self::NetworkAddress => b'I',
            Self::Numeric => b'N',
            Self::Pseudo => b'P',
            Self::Range => b'R',
            Self::String => b'S',
            Self::Timespan => b'T',
            Self::UserDefined => b'U',
            Self::BitString => b'V',
            Self::Unknown => b'X',
        }
    }
}

impl PgType {
    /// Metadata for an oid that is missing from the lookup table.
    ///
    /// Only the oid and the size reported on the wire are known.
    pub const fn unresolved(oid: Oid, byte_len: i16) -> PgType {
        PgType {
            oid,
            name: Cow::Borrowed(""),
            array_oid: 0,
            element_oid: 0,
            byte_len,
            kind: TypeKind::Base,
            category: TypeCategory::Unknown,
        }
    }

    /// Returns `true` if value of this type have variable width.
    pub const fn is_variable_width(&self) -> bool {
        self.byte_len < 0
    }
}

macro_rules! pg_type {
    ($(
        $(#[$doc:meta])*
        $id:ident = ($oid:literal, $name:literal, $array:literal, $elem:literal, $len:literal, $kind:ident, $cat:ident);
    )*) => {
        impl PgType {
            $(
                $(#[$doc])*
                pub const $id: PgType = PgType {
                    oid: $oid,
                    name: Cow::Borrowed($name),
                    array_oid: $array,
                    element_oid: $elem,
                    byte_len: $len,
                    kind: TypeKind::$kind,
                    category: TypeCategory::$cat,
                };
            )*

            /// All builtin type known by this library.
            pub const STANDARD: &[PgType] = &[$(PgType::$id),*];
        }
    };
}

pg_type! {
    /// boolean, 'true'/'false'
    BOOL = (16, "bool", 1000, 0, 1, Base, Boolean);
    /// variable-length string, binary values escaped
    BYTEA = (17, "bytea", 1001, 0, -1, Base, UserDefined);
    /// single character
    CHAR = (18, "char", 1002, 0, 1, Base, String);
    /// 63-byte type for storing system identifiers
    NAME = (19, "name", 1003, 18, 64, Base, String);
    /// ~18 digit integer, 8-byte storage
    INT8 = (20, "int8", 1016, 0, 8, Base, Numeric);
    /// -32 thousand to 32 thousand, 2-byte storage
    INT2 = (21, "int2", 1005, 0, 2, Base, Numeric);
    /// array of int2, used in system tables
    INT2_VECTOR = (22, "int2vector", 1006, 21, -1, Base, Array);
    /// -2 billion to 2 billion integer, 4-byte storage
    INT4 = (23, "int4", 1007, 0, 4, Base, Numeric);
    /// registered procedure
    REG_PROC = (24, "regproc", 1008, 0, 4, Base, Numeric);
    /// variable-length string, no limit specified
    TEXT = (25, "text", 1009, 0, -1, Base, String);
    /// object identifier(oid), maximum 4 billion
    OID = (26, "oid", 1028, 0, 4, Base, Numeric);
    /// JSON stored as text
    JSON = (114, "json", 199, 0, -1, Base, UserDefined);
    /// XML content
    XML = (142, "xml", 143, 0, -1, Base, UserDefined);
    /// char(length), blank-padded string, fixed storage length
    BPCHAR = (1042, "bpchar", 1014, 0, -1, Base, String);
    /// varchar(length), non-blank-padded string, variable storage length
    VARCHAR = (1043, "varchar", 1015, 0, -1, Base, String);
    /// date
    DATE = (1082, "date", 1182, 0, 4, Base, DateTime);
    /// time of day
    TIME = (1083, "time", 1183, 0, 8, Base, DateTime);
    /// date and time
    TIMESTAMP = (1114, "timestamp", 1115, 0, 8, Base, DateTime);
    /// date and time with time zone
    TIMESTAMPTZ = (1184, "timestamptz", 1185, 0, 8, Base, DateTime);
    /// time interval
    INTERVAL = (1186, "interval", 1187, 0, 16, Base, Timespan);
    /// numeric(precision, decimal), arbitrary precision number
    NUMERIC = (1700, "numeric", 1231, 0, -1, Base, Numeric);
}

/// A type that can resolve [`Oid`] into [`PgType`].
pub trait TypeLookup {
    /// Returns type metadata, or `None` when oid is unknown.
    fn lookup(&self, oid: Oid) -> Option<PgType>;
}

impl<F> TypeLookup for F
where
    F: Fn(Oid) -> Option<PgType>,
{
    fn lookup(&self, oid: Oid) -> Option<PgType> {
        self(oid)
    }
}

/// Immutable oid to [`PgType`] table.
///
/// Built once and never mutated afterwards, it is safe to share across
/// connections without synchronization.
#[derive(Debug, Clone, Default)]
pub struct TypeLibrary {
    types: HashMap<Oid, PgType>,
}

static STANDARD: LazyLock<TypeLibrary> = LazyLock::new(|| TypeLibrary::new(PgType::STANDARD.iter().cloned()));

impl TypeLibrary {
    /// Build table from types, later entry replace former entry with the same oid.
    pub fn new(types: impl IntoIterator<Item = PgType>) -> TypeLibrary {
        Self { types: types.into_iter().map(|ty| (ty.oid, ty)).collect() }
    }

    /// Shared table of [`PgType::STANDARD`] types.
    pub fn standard() -> &'static TypeLibrary {
        &STANDARD
    }

    /// Get type by oid.
    pub fn get(&self, oid: Oid) -> Option<&PgType> {
        self.types.get(&oid)
    }

    /// Returns the number of known types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if library contains no type.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeLookup for TypeLibrary {
    fn lookup(&self, oid: Oid) -> Option<PgType> {
        self.get(oid).cloned()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn standard_library() {
        let lib = TypeLibrary::standard();
        assert_eq!(lib.len(), PgType::STANDARD.len());
        assert_eq!(lib.get(23), Some(&PgType::INT4));
        assert_eq!(lib.get(1043).map(|t| &*t.name), Some("varchar"));
        assert!(lib.get(0).is_none());
        assert!(PgType::TEXT.is_variable_width());
    }

    #[test]
    fn closure_lookup() {
        let lookup = |oid: Oid| (oid == 7).then(|| PgType::unresolved(7, 4));
        assert_eq!(lookup.lookup(7).map(|t| t.byte_len), Some(4));
        assert_eq!(lookup.lookup(8), None);
    }

    #[test]
    fn kind_codes() {
        assert_eq!(PgType::INT2_VECTOR.category.code(), b'A');
        assert_eq!(TypeKind::Multirange.code(), b'm');
    }
}
