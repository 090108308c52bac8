use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User-supplied service order number (never auto-generated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl OrderId {
    /// Accepts only strictly positive numbers.
    pub fn new(id: i64) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order lifecycle status. Transitions are plain field overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "novo")]
    New,
    #[serde(rename = "pronto")]
    Ready,
    #[serde(rename = "pago")]
    Paid,
    #[serde(rename = "garantia")]
    Warranty,
}

impl OrderStatus {
    /// Backend enum label (`os_status`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "novo",
            Self::Ready => "pronto",
            Self::Paid => "pago",
            Self::Warranty => "garantia",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "novo" => Some(Self::New),
            "pronto" => Some(Self::Ready),
            "pago" => Some(Self::Paid),
            "garantia" => Some(Self::Warranty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    #[serde(rename = "baixa")]
    Low,
    #[default]
    #[serde(rename = "media")]
    Medium,
    #[serde(rename = "alta")]
    High,
    #[serde(rename = "critica")]
    Critical,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "baixa",
            Self::Medium => "media",
            Self::High => "alta",
            Self::Critical => "critica",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "baixa" => Some(Self::Low),
            "media" => Some(Self::Medium),
            "alta" => Some(Self::High),
            "critica" => Some(Self::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ServiceType {
    #[default]
    #[serde(rename = "hardware")]
    Hardware,
    #[serde(rename = "software")]
    Software,
    #[serde(rename = "limpeza")]
    Cleaning,
    #[serde(rename = "outro")]
    Other,
}

impl ServiceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hardware => "hardware",
            Self::Software => "software",
            Self::Cleaning => "limpeza",
            Self::Other => "outro",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "hardware" => Some(Self::Hardware),
            "software" => Some(Self::Software),
            "limpeza" => Some(Self::Cleaning),
            "outro" => Some(Self::Other),
            _ => None,
        }
    }
}

/// One line of the intake checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    pub checked: bool,
}

impl ChecklistItem {
    pub fn unchecked(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            checked: false,
        }
    }
}

/// Intake checklist applied when an order arrives without one.
pub fn default_checklist() -> Vec<ChecklistItem> {
    [
        "Aparelho Liga",
        "Touch Screen OK",
        "Carregamento OK",
        "Câmeras OK",
        "Sinal Wi-Fi/Geral",
        "Botões Físicos",
    ]
    .into_iter()
    .map(ChecklistItem::unchecked)
    .collect()
}

/// A part consumed by a repair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartUsed {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    #[serde(rename = "preco")]
    pub price: f64,
}

/// A service order (`ordens_servico` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceOrder {
    pub id: OrderId,
    /// Absent only for warranty follow-ups that inherit attribution from the parent.
    #[serde(rename = "tecnico_id")]
    pub technician_id: Option<String>,
    #[serde(rename = "modelo")]
    pub model: String,
    #[serde(rename = "defeito_reclamado")]
    pub defect: String,
    #[serde(rename = "laudo_tecnico", default)]
    pub technical_report: String,
    #[serde(rename = "pecas_usadas", default)]
    pub parts_used: Vec<PartUsed>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    #[serde(rename = "valor_cobrado")]
    pub charged: f64,
    #[serde(rename = "custo_pecas")]
    pub parts_cost: f64,
    #[serde(rename = "custo_outros")]
    pub other_costs: f64,
    pub status: OrderStatus,
    #[serde(rename = "prioridade")]
    pub priority: Priority,
    #[serde(rename = "tipo_servico")]
    pub service_type: ServiceType,
    #[serde(rename = "parent_os_id", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceOrder {
    /// Revenue minus parts and other costs. May be negative.
    pub fn profit(&self) -> f64 {
        self.charged - (self.parts_cost + self.other_costs)
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: &OrderPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(service_type) = patch.service_type {
            self.service_type = service_type;
        }
        if let Some(technician_id) = &patch.technician_id {
            self.technician_id = Some(technician_id.clone());
        }
        if let Some(model) = &patch.model {
            self.model.clone_from(model);
        }
        if let Some(defect) = &patch.defect {
            self.defect.clone_from(defect);
        }
        if let Some(report) = &patch.technical_report {
            self.technical_report.clone_from(report);
        }
        if let Some(parts) = &patch.parts_used {
            self.parts_used.clone_from(parts);
        }
        if let Some(checklist) = &patch.checklist {
            self.checklist.clone_from(checklist);
        }
        if let Some(charged) = patch.charged {
            self.charged = charged;
        }
        if let Some(parts_cost) = patch.parts_cost {
            self.parts_cost = parts_cost;
        }
        if let Some(other_costs) = patch.other_costs {
            self.other_costs = other_costs;
        }
    }
}

/// Field-level update for an existing order. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(rename = "prioridade", skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(rename = "tipo_servico", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    #[serde(rename = "tecnico_id", skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<String>,
    #[serde(rename = "modelo", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "defeito_reclamado", skip_serializing_if = "Option::is_none")]
    pub defect: Option<String>,
    #[serde(rename = "laudo_tecnico", skip_serializing_if = "Option::is_none")]
    pub technical_report: Option<String>,
    #[serde(rename = "pecas_usadas", skip_serializing_if = "Option::is_none")]
    pub parts_used: Option<Vec<PartUsed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checklist: Option<Vec<ChecklistItem>>,
    #[serde(rename = "valor_cobrado", skip_serializing_if = "Option::is_none")]
    pub charged: Option<f64>,
    #[serde(rename = "custo_pecas", skip_serializing_if = "Option::is_none")]
    pub parts_cost: Option<f64>,
    #[serde(rename = "custo_outros", skip_serializing_if = "Option::is_none")]
    pub other_costs: Option<f64>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn checklist(checklist: Vec<ChecklistItem>) -> Self {
        Self {
            checklist: Some(checklist),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
