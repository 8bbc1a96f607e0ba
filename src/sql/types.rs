//! Data type classification for MariaDB/MySQL column types.

/// Broad family a column data type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Decimal,
    Float,
    Character,
    Enumeration,
    Binary,
    Temporal,
    Json,
    Spatial,
    Other,
}

/// Classify a data type name. Size qualifiers are ignored.
pub fn categorize(data_type: &str) -> TypeCategory {
    let lower = data_type.to_lowercase();
    let base = lower.split('(').next().unwrap_or(&lower).trim();

    match base {
        "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" | "bit" | "bool"
        | "boolean" | "serial" => TypeCategory::Integer,
        "decimal" | "numeric" | "dec" | "fixed" => TypeCategory::Decimal,
        "float" | "double" | "real" => TypeCategory::Float,

        "char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "nchar"
        | "nvarchar" => TypeCategory::Character,
        "enum" | "set" => TypeCategory::Enumeration,

        "binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" => {
            TypeCategory::Binary
        }

        "date" | "time" | "datetime" | "timestamp" | "year" => TypeCategory::Temporal,
        "json" => TypeCategory::Json,

        "geometry" | "point" | "linestring" | "polygon" | "multipoint" | "multilinestring"
        | "multipolygon" | "geometrycollection" => TypeCategory::Spatial,

        _ => TypeCategory::Other,
    }
}

/// Whether a column of this type carries a character set and collation.
pub fn supports_charset(data_type: &str) -> bool {
    matches!(
        categorize(data_type),
        TypeCategory::Character | TypeCategory::Enumeration
    )
}
