//! Classification labels and the state -> command table

use serde::{Deserialize, Serialize};

/// Discrete machine state produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassLabel(pub u8);

impl ClassLabel {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outbound command and operator label for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    /// Fixed 4-character ASCII command sent to the device
    pub code: String,
    /// Human readable label shown to the operator
    pub label: String,
}

impl StateEntry {
    pub fn new(code: &str, label: &str) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
        }
    }
}

/// Lookup from `ClassLabel` to its command entry. Index = label value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateTable(Vec<StateEntry>);

impl StateTable {
    pub fn new(entries: Vec<StateEntry>) -> Self {
        Self(entries)
    }

    pub fn get(&self, label: ClassLabel) -> Option<&StateEntry> {
        self.0.get(label.index())
    }

    pub fn contains(&self, label: ClassLabel) -> bool {
        label.index() < self.0.len()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[StateEntry] {
        &self.0
    }
}

impl Default for StateTable {
    /// Labels 0 and 1 are both NORMAL; the model was trained with a
    /// duplicate normal class.
    fn default() -> Self {
        Self(vec![
            StateEntry::new("ATPP", "NORMAL"),
            StateEntry::new("ATPP", "NORMAL"),
            StateEntry::new("ATFA", "FAULT 1"),
            StateEntry::new("ATFB", "FAULT 2"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_lookup() {
        let table = StateTable::default();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(ClassLabel(0)).map(|e| e.code.as_str()), Some("ATPP"));
        assert_eq!(table.get(ClassLabel(3)).map(|e| e.label.as_str()), Some("FAULT 2"));
        assert!(table.get(ClassLabel(4)).is_none());
        assert!(!table.contains(ClassLabel(9)));
    }
}
