//! MySQL data type definitions.

use core::fmt;

/// Base name of a MySQL column type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    // Integer types
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    BigInt,
    Bit,
    Bool,

    // Fixed and floating point
    Decimal,
    Float,
    Double,

    // String types
    Char,
    Varchar,
    Binary,
    VarBinary,
    TinyText,
    Text,
    MediumText,
    LongText,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    Enum,
    Set,
    Json,

    // Date/time types
    Date,
    Time,
    DateTime,
    Timestamp,
    Year,

    /// Any other type, and cast targets such as `SIGNED`, lowercased.
    Other(String),
}

impl TypeName {
    /// Resolves a type word (case-insensitive), folding MySQL synonyms.
    #[must_use]
    pub fn from_word(word: &str) -> Self {
        match word.to_ascii_lowercase().as_str() {
            "tinyint" => Self::TinyInt,
            "smallint" => Self::SmallInt,
            "mediumint" => Self::MediumInt,
            "int" | "integer" => Self::Int,
            "bigint" => Self::BigInt,
            "bit" => Self::Bit,
            "bool" | "boolean" => Self::Bool,
            "decimal" | "numeric" | "dec" | "fixed" => Self::Decimal,
            "float" => Self::Float,
            "double" | "real" => Self::Double,
            "char" => Self::Char,
            "varchar" => Self::Varchar,
            "binary" => Self::Binary,
            "varbinary" => Self::VarBinary,
            "tinytext" => Self::TinyText,
            "text" => Self::Text,
            "mediumtext" => Self::MediumText,
            "longtext" => Self::LongText,
            "tinyblob" => Self::TinyBlob,
            "blob" => Self::Blob,
            "mediumblob" => Self::MediumBlob,
            "longblob" => Self::LongBlob,
            "enum" => Self::Enum,
            "set" => Self::Set,
            "json" => Self::Json,
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime" => Self::DateTime,
            "timestamp" => Self::Timestamp,
            "year" => Self::Year,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the lowercase type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::TinyInt => "tinyint",
            Self::SmallInt => "smallint",
            Self::MediumInt => "mediumint",
            Self::Int => "int",
            Self::BigInt => "bigint",
            Self::Bit => "bit",
            Self::Bool => "tinyint(1)",
            Self::Decimal => "decimal",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
            Self::Varchar => "varchar",
            Self::Binary => "binary",
            Self::VarBinary => "varbinary",
            Self::TinyText => "tinytext",
            Self::Text => "text",
            Self::MediumText => "mediumtext",
            Self::LongText => "longtext",
            Self::TinyBlob => "tinyblob",
            Self::Blob => "blob",
            Self::MediumBlob => "mediumblob",
            Self::LongBlob => "longblob",
            Self::Enum => "enum",
            Self::Set => "set",
            Self::Json => "json",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Year => "year",
            Self::Other(name) => name,
        }
    }
}

/// A MySQL column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType {
    /// Base type.
    pub name: TypeName,
    /// Display width, length or precision.
    pub length: Option<u32>,
    /// Scale for `decimal(p,s)`, `double(p,s)`.
    pub scale: Option<u32>,
    /// Members of `enum(...)` / `set(...)`.
    pub values: Vec<String>,
    /// UNSIGNED attribute.
    pub unsigned: bool,
    /// ZEROFILL attribute.
    pub zerofill: bool,
}

impl DataType {
    /// Creates a type with no length or attributes.
    #[must_use]
    pub const fn new(name: TypeName) -> Self {
        Self {
            name,
            length: None,
            scale: None,
            values: Vec::new(),
            unsigned: false,
            zerofill: false,
        }
    }

    /// Sets the length.
    #[must_use]
    pub const fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Marks the type UNSIGNED.
    #[must_use]
    pub const fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    /// Integer family, including BIT and BOOL.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self.name,
            TypeName::TinyInt
                | TypeName::SmallInt
                | TypeName::MediumInt
                | TypeName::Int
                | TypeName::BigInt
                | TypeName::Bit
                | TypeName::Bool
        )
    }

    /// Any numeric type.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(
                self.name,
                TypeName::Decimal | TypeName::Float | TypeName::Double
            )
    }

    /// TEXT and BLOB families, plus JSON.
    #[must_use]
    pub const fn is_blob_or_text(&self) -> bool {
        matches!(
            self.name,
            TypeName::TinyText
                | TypeName::Text
                | TypeName::MediumText
                | TypeName::LongText
                | TypeName::TinyBlob
                | TypeName::Blob
                | TypeName::MediumBlob
                | TypeName::LongBlob
                | TypeName::Json
        )
    }

    /// Types whose values are written as quoted strings.
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(
            self.name,
            TypeName::Char
                | TypeName::Varchar
                | TypeName::Binary
                | TypeName::VarBinary
                | TypeName::Enum
                | TypeName::Set
        ) || self.is_blob_or_text()
    }

    /// DATE, TIME, DATETIME, TIMESTAMP and YEAR.
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self.name,
            TypeName::Date
                | TypeName::Time
                | TypeName::DateTime
                | TypeName::Timestamp
                | TypeName::Year
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())?;
        if matches!(self.name, TypeName::Enum | TypeName::Set) {
            f.write_str("(")?;
            for (i, value) in self.values.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                super::display::write_string(f, value)?;
            }
            f.write_str(")")?;
        } else if !matches!(self.name, TypeName::Bool) {
            match (self.length, self.scale) {
                (Some(p), Some(s)) => write!(f, "({p},{s})")?,
                (Some(p), None) => write!(f, "({p})")?,
                _ => {}
            }
        }
        if self.unsigned {
            f.write_str(" unsigned")?;
        }
        if self.zerofill {
            f.write_str(" zerofill")?;
        }
        Ok(())
    }
}
