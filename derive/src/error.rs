use std::fmt::{self, Display};

pub type Result<T> = std::result::Result<T, DeriveError>;

#[derive(Debug, Clone, PartialEq)]
pub enum DeriveError {
    NotAStruct,
    UnnamedFields,
    MultipleNodeNames,
    Other(String),
}

impl Display for DeriveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DeriveError::NotAStruct => write!(f, "Node can only be derived for structs"),
            DeriveError::UnnamedFields => {
                write!(f, "Node can only be derived for structs with named fields")
            }
            DeriveError::MultipleNodeNames => {
                write!(f, "At most one node_name attribute can be provided")
            }
            DeriveError::Other(ref s) => write!(f, "Derive error: {}", s),
        }
    }
}

impl From<syn::Error> for DeriveError {
    fn from(e: syn::Error) -> DeriveError {
        DeriveError::Other(format!("syn error: {}", e))
    }
}
