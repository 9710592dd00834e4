use serde::{Deserialize, Serialize};

/// A mobile network operator and the 3-digit national prefixes assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    /// Stable lowercase identifier, e.g. `viettel`.
    pub code: String,
    /// Name shown to users, e.g. `Viettel`.
    pub display_name: String,
    pub prefixes: Vec<String>,
}

impl Carrier {
    pub fn new(
        code: &str,
        display_name: &str,
        prefixes: &[&str],
    ) -> Self {
        Self {
            code: code.to_string(),
            display_name: display_name.to_string(),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn owns_prefix(
        &self,
        prefix: &str,
    ) -> bool {
        self.prefixes.iter().any(|p| p == prefix)
    }
}
