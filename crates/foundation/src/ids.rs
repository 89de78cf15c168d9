use serde::{Deserialize, Serialize};

/// Stable identity of a dancer record, as given by the dataset.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DancerId(String);

impl DancerId {
    pub fn new(id: impl Into<String>) -> Self {
        DancerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DancerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DancerId {
    fn from(s: &str) -> Self {
        DancerId::new(s)
    }
}

impl std::borrow::Borrow<str> for DancerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
