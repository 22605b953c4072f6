use indexmap::IndexMap;

use crate::serializer;

/// Header mapping keyed by lower-cased field name, in encounter order.
pub type Fields = IndexMap<String, String>;

/// Header block read from the top of a post, plus whatever follows it.
#[derive(serde::Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    pub fields: Fields,
    pub body: String,
    /// `false` when the file was missing, which is not the same as "no headers".
    pub exists: bool,
}

impl HeaderBlock {
    pub fn has_metadata(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn formatted_headers(&self) -> String {
        serializer::format(&self.fields)
    }
}
