//! Value label tables.

/// One named value label set (`label define`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueLabelTable {
    pub name: String,
    /// `(code, label)` pairs in file order.
    pub entries: Vec<(i32, String)>,
}

impl ValueLabelTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_entry(mut self, code: i32, label: impl Into<String>) -> Self {
        self.entries.push((code, label.into()));
        self
    }
}

/// The value label dictionary of a dataset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DtaValueLabels {
    /// Label sets in file order.
    pub tables: Vec<ValueLabelTable>,
    /// `(variable, label set)` assignments in variable order.
    pub assignments: Vec<(String, String)>,
}

impl DtaValueLabels {
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&ValueLabelTable> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// Label pairs keyed by label set name, in file order.
    ///
    /// Every defined set appears once, whether zero, one or several
    /// variables use it.
    #[must_use]
    pub fn by_label_set(&self) -> Vec<(&str, &[(i32, String)])> {
        self.tables
            .iter()
            .map(|table| (table.name.as_str(), table.entries.as_slice()))
            .collect()
    }

    /// Label pairs keyed by variable, in variable order.
    ///
    /// Variables whose assigned set is not defined in the file are skipped.
    #[must_use]
    pub fn by_variable(&self) -> Vec<(&str, &[(i32, String)])> {
        self.assignments
            .iter()
            .filter_map(|(variable, set)| {
                self.table(set)
                    .map(|table| (variable.as_str(), table.entries.as_slice()))
            })
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_set_listed_per_variable() {
        let labels = DtaValueLabels {
            tables: vec![
                ValueLabelTable::new("yesno")
                    .with_entry(0, "No")
                    .with_entry(1, "Yes"),
            ],
            assignments: vec![
                ("smoker".to_string(), "yesno".to_string()),
                ("region".to_string(), "regions".to_string()),
                ("drinker".to_string(), "yesno".to_string()),
            ],
        };
        let by_variable = labels.by_variable();
        let names: Vec<&str> = by_variable.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["smoker", "drinker"]);
        assert_eq!(by_variable[1].1[1], (1, "Yes".to_string()));

        let by_set = labels.by_label_set();
        assert_eq!(by_set.len(), 1);
        assert_eq!(by_set[0].0, "yesno");
    }
}
