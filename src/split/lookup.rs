use std::collections::HashMap;

use crate::profile::Parameter;

/// Normalize a match key: trimmed and lowercased
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Case-insensitive lookup from cell value to parameter.
///
/// Built in list order; a later parameter with the same normalized value
/// replaces the earlier one. Replaced keys are kept in `shadowed`.
#[derive(Debug, Clone, Default)]
pub struct ParameterLookup<'a> {
    entries: HashMap<String, &'a Parameter>,
    shadowed: Vec<String>,
}

impl<'a> ParameterLookup<'a> {
    pub fn build(parameters: &'a [Parameter]) -> Self {
        let mut lookup = ParameterLookup {
            entries: HashMap::with_capacity(parameters.len()),
            shadowed: Vec::new(),
        };

        for parameter in parameters {
            let key = normalize_key(&parameter.value);
            if lookup.entries.insert(key.clone(), parameter).is_some()
                && !lookup.shadowed.contains(&key)
            {
                lookup.shadowed.push(key);
            }
        }

        lookup
    }

    /// Look up an already-normalized key
    pub fn get(&self, key: &str) -> Option<&'a Parameter> {
        self.entries.get(key).copied()
    }

    /// Normalized keys that appear more than once in the parameter list
    pub fn shadowed(&self) -> &[String] {
        &self.shadowed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
