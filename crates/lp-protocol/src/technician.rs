use serde::{Deserialize, Serialize};

/// A technician record as stored in the `tecnicos` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technician {
    /// Opaque backend identifier (the true identity).
    pub id: String,
    /// Display name, used as the human-facing resolution key.
    #[serde(rename = "nome")]
    pub name: String,
    /// Free-text specialty.
    #[serde(rename = "especialidade", default)]
    pub specialty: String,
    /// Commission percentage applied to order profit (>= 0).
    #[serde(rename = "comissao_percentual", default)]
    pub commission_rate: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Fields for a technician that has not been persisted yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTechnician {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "especialidade", default)]
    pub specialty: String,
    #[serde(rename = "comissao_percentual", default)]
    pub commission_rate: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Partial update applied to an existing technician.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicianPatch {
    #[serde(rename = "nome", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "especialidade", skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(rename = "comissao_percentual", skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Technician {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            specialty: String::new(),
            commission_rate: 0.0,
            active: true,
        }
    }

    /// Builder-style setter for the commission percentage.
    pub fn with_commission(mut self, rate: f64) -> Self {
        self.commission_rate = rate;
        self
    }

    /// Apply a patch in place, leaving unset fields untouched.
    pub fn apply(&mut self, patch: &TechnicianPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(specialty) = &patch.specialty {
            self.specialty.clone_from(specialty);
        }
        if let Some(rate) = patch.commission_rate {
            self.commission_rate = rate;
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
    }
}
