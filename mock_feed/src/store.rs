use crate::MockFeedError;
use panel_protocol::{ParameterEntry, ParameterUpdate};
use serde::Deserialize;

#[derive(Deserialize)]
struct DumpFile {
    parameters: Vec<ParameterEntry>,
}

/// Flat list of parameters in publication order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterStore {
    entries: Vec<ParameterEntry>,
}

impl ParameterStore {
    pub fn new(entries: Vec<ParameterEntry>) -> Self {
        Self { entries }
    }

    /// Loads a `{ "parameters": [..] }` document.
    pub fn from_json(raw: &str) -> Result<Self, MockFeedError> {
        let dump: DumpFile = serde_json::from_str(raw)?;
        Ok(Self::new(dump.parameters))
    }

    pub fn entries(&self) -> &[ParameterEntry] {
        &self.entries
    }

    /// Every entry when `names` is empty, otherwise the named ones in store
    /// order.
    pub fn get(&self, names: &[String]) -> Vec<ParameterEntry> {
        if names.is_empty() {
            return self.entries.clone();
        }
        self.entries
            .iter()
            .filter(|e| names.iter().any(|n| same_name(&e.name, n)))
            .cloned()
            .collect()
    }

    /// Applies one update; unknown names are appended.
    pub fn set(&mut self, update: &ParameterUpdate) {
        let value = serde_json::Value::from(update.value);
        match self.entries.iter_mut().find(|e| same_name(&e.name, &update.name)) {
            Some(entry) => entry.value = value,
            None => self.entries.push(ParameterEntry {
                name: canonical(&update.name),
                value,
            }),
        }
    }
}

fn canonical(name: &str) -> String {
    if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{name}")
    }
}

// Update requests name parameters as `<node>.<leaf>` while the dump uses
// `/<node>.<leaf>`.
fn same_name(stored: &str, requested: &str) -> bool {
    stored.trim_start_matches('/') == requested.trim_start_matches('/')
}

/// Two camera nodes with bounds, plus a few entries the panel must hide.
pub fn sample_entries() -> Vec<ParameterEntry> {
    vec![
        ParameterEntry::number("/camA.exposure", 10.0),
        ParameterEntry::number("/camA.gain", 2.0),
        ParameterEntry::number("/camA.exposure_min", 0.0),
        ParameterEntry::number("/camA.gain_min", 0.0),
        ParameterEntry::number("/camA.exposure_max", 100.0),
        ParameterEntry::number("/camA.gain_max", 16.0),
        ParameterEntry::number("/camA.exposure_step", 1.0),
        ParameterEntry::number("/camA.gain_step", 0.5),
        ParameterEntry::number("/camA.offset_location", 3.0),
        ParameterEntry {
            name: "/camA.use_sim_time".to_string(),
            value: serde_json::Value::Bool(false),
        },
        ParameterEntry::number("/camB.gain", 5.0),
        ParameterEntry::number("/camB.gain_min", 1.0),
        ParameterEntry::number("/camB.gain_max", 9.0),
        ParameterEntry::number("/camB.gain_step", 1.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_protocol::ParameterType;

    fn update(name: &str, value: f64) -> ParameterUpdate {
        ParameterUpdate {
            name: name.to_string(),
            value,
            kind: ParameterType::Float64,
        }
    }

    #[test]
    fn set_matches_names_without_leading_slash() {
        let mut store = ParameterStore::new(sample_entries());
        store.set(&update("camA.exposure", 55.0));
        let got = store.get(&["/camA.exposure".to_string()]);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].value.as_f64(), Some(55.0));
    }

    #[test]
    fn unknown_names_are_appended_with_slash() {
        let mut store = ParameterStore::default();
        store.set(&update("camC.zoom", 1.5));
        assert_eq!(store.entries()[0].name, "/camC.zoom");
    }

    #[test]
    fn empty_filter_returns_everything() {
        let store = ParameterStore::new(sample_entries());
        assert_eq!(store.get(&[]).len(), sample_entries().len());
    }

    #[test]
    fn loads_dump_document() {
        let store =
            ParameterStore::from_json(r#"{"parameters":[{"name":"/n.a","value":1}]}"#).unwrap();
        assert_eq!(store.entries().len(), 1);
        assert!(ParameterStore::from_json(r#"{"foo":1}"#).is_err());
    }
}
