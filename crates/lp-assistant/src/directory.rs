//! Read-only technician snapshot and name resolution.
//!
//! Resolution is case-insensitive substring containment: every technician
//! whose lower-cased name contains the lower-cased fragment is a match. No
//! edit-distance or phonetic matching is done, so names sharing a substring
//! ("André" / "Andréa") resolve as ambiguous.

use lp_protocol::Technician;

/// Outcome of resolving a free-text technician reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No name contains the fragment; carries every available name.
    NotFound { available: Vec<String> },
    /// Exactly one match.
    Resolved { id: String },
    /// Two or more matches; carries the matching names.
    Ambiguous { matches: Vec<String> },
}

/// Immutable technician list handed to one reconciliation call.
#[derive(Debug, Clone, Default)]
pub struct TechnicianDirectory {
    technicians: Vec<Technician>,
}

impl TechnicianDirectory {
    pub fn new(technicians: Vec<Technician>) -> Self {
        Self { technicians }
    }

    pub fn technicians(&self) -> &[Technician] {
        &self.technicians
    }

    /// Display names in directory order (the model's context list).
    pub fn names(&self) -> Vec<String> {
        self.technicians.iter().map(|t| t.name.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Technician> {
        self.technicians.iter().find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.technicians.is_empty()
    }

    pub fn len(&self) -> usize {
        self.technicians.len()
    }

    /// Resolve a name fragment against the directory.
    pub fn resolve(&self, fragment: &str) -> Resolution {
        let needle = fragment.trim().to_lowercase();
        let matches: Vec<&Technician> = self
            .technicians
            .iter()
            .filter(|t| t.name.to_lowercase().contains(&needle))
            .collect();

        match matches.as_slice() {
            [] => Resolution::NotFound {
                available: self.names(),
            },
            [only] => Resolution::Resolved {
                id: only.id.clone(),
            },
            many => Resolution::Ambiguous {
                matches: many.iter().map(|t| t.name.clone()).collect(),
            },
        }
    }
}

/// Stand-in shown when an order references a technician that no longer exists.
pub fn fallback_technician() -> Technician {
    Technician {
        id: "deleted".into(),
        name: "Técnico Removido".into(),
        specialty: "-".into(),
        commission_rate: 0.0,
        active: false,
    }
}
