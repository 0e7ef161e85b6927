use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

///
/// ProtoType
///
/// Wire/storage type of a contract field. Names outside the known set are kept
/// as `Custom` so older manifests still load; they are rejected later by
/// anything that needs a concrete mapping.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(from = "String", into = "String")]
#[remain::sorted]
pub enum ProtoType {
    Any,
    Bool,
    Bytes,
    Custom(String),
    Date,
    Double,
    Enum,
    Float,
    Int32,
    Int64,
    Json,
    #[default]
    String,
    Timestamp,
    Uint32,
    Uint64,
}

impl ProtoType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Any => "any",
            Self::Bool => "bool",
            Self::Bytes => "bytes",
            Self::Custom(name) => name,
            Self::Date => "date",
            Self::Double => "double",
            Self::Enum => "enum",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Json => "json",
            Self::String => "string",
            Self::Timestamp => "timestamp",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
        }
    }

    #[must_use]
    pub const fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Double | Self::Float | Self::Int32 | Self::Int64 | Self::Uint32 | Self::Uint64
        )
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Enum | Self::String)
    }

    /// Rust type used for this proto type in generated code.
    /// Returns `None` for custom names, which have no mapping.
    #[must_use]
    pub fn rust_type(&self) -> Option<TokenStream> {
        let ty = match self {
            Self::Any | Self::Json => quote!(::pactum::__reexports::serde_json::Value),
            Self::Bool => quote!(bool),
            Self::Bytes => quote!(::std::vec::Vec<u8>),
            Self::Custom(_) => return None,
            Self::Date => quote!(::pactum::runtime::Date),
            Self::Double => quote!(f64),
            Self::Enum | Self::String => quote!(::std::string::String),
            Self::Float => quote!(f32),
            Self::Int32 => quote!(i32),
            Self::Int64 => quote!(i64),
            Self::Timestamp => quote!(::pactum::runtime::Timestamp),
            Self::Uint32 => quote!(u32),
            Self::Uint64 => quote!(u64),
        };

        Some(ty)
    }
}

impl Display for ProtoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ProtoType {
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "any" => Self::Any,
            "bool" | "boolean" => Self::Bool,
            "bytes" => Self::Bytes,
            "date" => Self::Date,
            "double" => Self::Double,
            "enum" => Self::Enum,
            "float" => Self::Float,
            "int" | "int32" => Self::Int32,
            "int64" | "bigint" => Self::Int64,
            "json" | "object" => Self::Json,
            "string" | "text" => Self::String,
            "timestamp" => Self::Timestamp,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            _ => Self::Custom(s.to_string()),
        }
    }
}

impl From<String> for ProtoType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ProtoType> for String {
    fn from(ty: ProtoType) -> Self {
        ty.as_str().to_string()
    }
}

///
/// Method
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Reads are the only idempotent, side-effect free method.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Get)
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(format!("unknown http method '{s}'")),
        }
    }
}

impl ToTokens for Method {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let variant = match self {
            Self::Get => quote!(Get),
            Self::Post => quote!(Post),
            Self::Put => quote!(Put),
            Self::Patch => quote!(Patch),
            Self::Delete => quote!(Delete),
        };

        tokens.extend(quote!(::pactum::schema::types::Method::#variant));
    }
}

///
/// OperationKind
///
/// GraphQL root type an operation is exposed under. Reads (GET) are queries,
/// everything else is a mutation.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    #[must_use]
    pub const fn from_method(method: Method) -> Self {
        if method.is_read() {
            Self::Query
        } else {
            Self::Mutation
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
        }
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToTokens for OperationKind {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let variant = match self {
            Self::Query => quote!(Query),
            Self::Mutation => quote!(Mutation),
        };

        tokens.extend(quote!(::pactum::schema::types::OperationKind::#variant));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_become_custom() {
        assert_eq!(ProtoType::from("Boolean"), ProtoType::Bool);
        assert_eq!(
            ProtoType::from("geopoint"),
            ProtoType::Custom("geopoint".to_string())
        );
        assert!(ProtoType::from("geopoint").rust_type().is_none());
    }

    #[test]
    fn proto_type_serializes_as_plain_name() {
        let json = serde_json::to_string(&ProtoType::Int64).unwrap();
        assert_eq!(json, "\"int64\"");

        let back: ProtoType = serde_json::from_str("\"vector\"").unwrap();
        assert_eq!(back, ProtoType::Custom("vector".to_string()));
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("get".parse::<Method>(), Ok(Method::Get));
        assert!("TRACE".parse::<Method>().is_err());
        assert!(Method::Get.is_read());
        assert!(!Method::Post.is_read());
    }

    #[test]
    fn only_reads_are_queries() {
        assert_eq!(OperationKind::from_method(Method::Get), OperationKind::Query);
        for method in [Method::Post, Method::Put, Method::Patch, Method::Delete] {
            assert_eq!(OperationKind::from_method(method), OperationKind::Mutation);
        }
    }
}
