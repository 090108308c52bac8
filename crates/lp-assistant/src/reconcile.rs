//! Order reconciliation: turn a create request into a committable order or a rejection.
//!
//! Attribution failures abort the whole creation (nothing is persisted);
//! malformed money fields are normalized to zero instead.

use chrono::{DateTime, Utc};
use lp_protocol::{
    ChecklistItem, CreateOrderPayload, MoneyInput, OrderId, OrderStatus, PartUsed, Priority,
    ServiceOrder, ServiceType, default_checklist,
};
use thiserror::Error;

use crate::currency::parse_optional;
use crate::directory::{Resolution, TechnicianDirectory};

/// Placeholder for absent free-text fields.
const NOT_AVAILABLE: &str = "N/A";

/// Everything needed to build an order; unset fields get defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderDraft {
    pub id: Option<OrderId>,
    /// Used as-is when present; skips name resolution.
    pub technician_id: Option<String>,
    /// Free-text fragment resolved against the directory.
    pub technician_name: Option<String>,
    pub model: Option<String>,
    pub defect: Option<String>,
    pub charged: Option<MoneyInput>,
    pub parts_cost: Option<MoneyInput>,
    pub other_costs: Option<MoneyInput>,
    pub status: Option<OrderStatus>,
    pub priority: Option<Priority>,
    pub service_type: Option<ServiceType>,
    pub checklist: Option<Vec<ChecklistItem>>,
    pub parts_used: Option<Vec<PartUsed>>,
    pub technical_report: Option<String>,
    pub parent_id: Option<OrderId>,
}

impl OrderDraft {
    pub fn new(id: OrderId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}

impl From<CreateOrderPayload> for OrderDraft {
    fn from(payload: CreateOrderPayload) -> Self {
        Self {
            id: Some(payload.id),
            technician_id: payload.technician_id,
            technician_name: payload.technician_name,
            model: payload.model,
            defect: payload.defect,
            charged: payload.charged,
            parts_cost: payload.parts_cost,
            ..Self::default()
        }
    }
}

/// Why reconciliation refused to build an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("O número da OS é obrigatório.")]
    MissingOrderId,

    #[error("Técnico \"{name}\" não encontrado. Disponíveis: {}.", available.join(", "))]
    TechnicianNotFound { name: String, available: Vec<String> },

    #[error("Múltiplos técnicos para \"{name}\": {}.", matches.join(", "))]
    AmbiguousTechnician { name: String, matches: Vec<String> },

    #[error("Um técnico precisa ser atribuído à OS.")]
    MissingTechnician,
}

impl Rejection {
    /// Message appended to the chat history.
    pub fn user_message(&self) -> String {
        match self {
            Self::TechnicianNotFound { .. } | Self::AmbiguousTechnician { .. } => {
                format!("{self} Use um nome exato ou crie a OS manualmente.")
            }
            _ => self.to_string(),
        }
    }
}

/// Validate and normalize a draft into a complete order stamped at `now`.
pub fn reconcile(
    draft: &OrderDraft,
    directory: &TechnicianDirectory,
    now: DateTime<Utc>,
) -> Result<ServiceOrder, Rejection> {
    let id = draft.id.ok_or(Rejection::MissingOrderId)?;
    let technician_id = attribute(draft, directory)?;

    if technician_id.is_none() && draft.parent_id.is_none() {
        return Err(Rejection::MissingTechnician);
    }

    let status = match draft.status {
        Some(OrderStatus::Warranty) => OrderStatus::Warranty,
        _ => OrderStatus::Paid,
    };

    Ok(ServiceOrder {
        id,
        technician_id,
        model: text_or_placeholder(draft.model.as_deref()),
        defect: text_or_placeholder(draft.defect.as_deref()),
        technical_report: draft.technical_report.clone().unwrap_or_default(),
        parts_used: draft.parts_used.clone().unwrap_or_default(),
        checklist: draft.checklist.clone().unwrap_or_else(default_checklist),
        charged: parse_optional(draft.charged.as_ref()),
        parts_cost: parse_optional(draft.parts_cost.as_ref()),
        other_costs: parse_optional(draft.other_costs.as_ref()),
        status,
        priority: draft.priority.unwrap_or_default(),
        service_type: draft.service_type.unwrap_or_default(),
        parent_id: draft.parent_id,
        created_at: now,
        updated_at: now,
    })
}

/// Pick the technician id: explicit id first, then name resolution.
fn attribute(
    draft: &OrderDraft,
    directory: &TechnicianDirectory,
) -> Result<Option<String>, Rejection> {
    if let Some(id) = draft.technician_id.as_deref().filter(|id| !id.is_empty()) {
        return Ok(Some(id.to_string()));
    }

    let Some(name) = draft
        .technician_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    else {
        return Ok(None);
    };

    match directory.resolve(name) {
        Resolution::Resolved { id } => Ok(Some(id)),
        Resolution::NotFound { available } => Err(Rejection::TechnicianNotFound {
            name: name.to_string(),
            available,
        }),
        Resolution::Ambiguous { matches } => Err(Rejection::AmbiguousTechnician {
            name: name.to_string(),
            matches,
        }),
    }
}

fn text_or_placeholder(text: Option<&str>) -> String {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Draft for a warranty follow-up of `parent` under a new order number.
///
/// Keeps attribution, device and checklist; zeroes every amount.
pub fn warranty_draft(parent: &ServiceOrder, new_id: OrderId) -> OrderDraft {
    OrderDraft {
        id: Some(new_id),
        technician_id: parent.technician_id.clone(),
        technician_name: None,
        model: Some(parent.model.clone()),
        defect: Some(format!("GARANTIA DA OS#{}", parent.id)),
        charged: Some(MoneyInput::Number(0.0)),
        parts_cost: Some(MoneyInput::Number(0.0)),
        other_costs: Some(MoneyInput::Number(0.0)),
        status: Some(OrderStatus::Warranty),
        priority: Some(parent.priority),
        service_type: Some(parent.service_type),
        checklist: Some(parent.checklist.clone()),
        parts_used: Some(parent.parts_used.clone()),
        technical_report: Some(parent.technical_report.clone()),
        parent_id: Some(parent.id),
    }
}

/// Suggested number for a warranty follow-up: the parent number with a trailing 1.
pub fn suggested_warranty_id(parent: OrderId) -> Option<OrderId> {
    parent.0.checked_mul(10)?.checked_add(1).and_then(OrderId::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_protocol::Technician;

    fn dir(names: &[(&str, &str)]) -> TechnicianDirectory {
        TechnicianDirectory::new(
            names
                .iter()
                .map(|(id, name)| Technician::new(*id, *name))
                .collect(),
        )
    }

    fn named_draft(id: i64, name: &str) -> OrderDraft {
        OrderDraft {
            technician_name: Some(name.into()),
            ..OrderDraft::new(OrderId(id))
        }
    }

    #[test]
    fn resolved_name_builds_order_with_defaults() {
        let draft = OrderDraft {
            model: Some("iphone 14".into()),
            defect: Some("tela quebrada".into()),
            charged: Some(MoneyInput::Number(800.0)),
            ..named_draft(1290, "andré")
        };
        let now = Utc::now();
        let order = reconcile(&draft, &dir(&[("t1", "André")]), now).unwrap();

        assert_eq!(order.id, OrderId(1290));
        assert_eq!(order.technician_id.as_deref(), Some("t1"));
        assert_eq!(order.charged, 800.0);
        assert_eq!(order.parts_cost, 0.0);
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.priority, Priority::Medium);
        assert_eq!(order.service_type, ServiceType::Hardware);
        assert_eq!(order.checklist, default_checklist());
        assert!(order.parts_used.is_empty());
        assert!(order.technical_report.is_empty());
        assert_eq!(order.created_at, now);
        assert_eq!(order.updated_at, now);
    }

    #[test]
    fn explicit_technician_id_skips_resolution() {
        let draft = OrderDraft {
            technician_id: Some("t9".into()),
            technician_name: Some("nobody".into()),
            ..OrderDraft::new(OrderId(5))
        };
        let order = reconcile(&draft, &TechnicianDirectory::default(), Utc::now()).unwrap();
        assert_eq!(order.technician_id.as_deref(), Some("t9"));
    }

    #[test]
    fn unknown_name_is_rejected_with_available_list() {
        let err = reconcile(
            &named_draft(1, "xyz"),
            &dir(&[("t1", "André"), ("t2", "Carlos")]),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            Rejection::TechnicianNotFound {
                name: "xyz".into(),
                available: vec!["André".into(), "Carlos".into()],
            }
        );
        let message = err.user_message();
        assert!(message.contains("André, Carlos"));
        assert!(message.contains("crie a OS manualmente"));
    }

    #[test]
    fn ambiguous_name_is_rejected_with_matches() {
        let err = reconcile(
            &named_draft(1, "andré"),
            &dir(&[("t1", "André"), ("t2", "André Silva")]),
            Utc::now(),
        )
        .unwrap_err();
        let Rejection::AmbiguousTechnician { matches, .. } = &err else {
            panic!("expected ambiguity, got {err:?}");
        };
        assert_eq!(matches, &vec!["André".to_string(), "André Silva".to_string()]);
        assert!(err.user_message().contains("André, André Silva"));
    }

    #[test]
    fn missing_attribution_is_rejected() {
        let err = reconcile(
            &OrderDraft::new(OrderId(3)),
            &dir(&[("t1", "André")]),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, Rejection::MissingTechnician);
    }

    #[test]
    fn missing_order_id_is_rejected() {
        let draft = OrderDraft {
            technician_id: Some("t1".into()),
            ..OrderDraft::default()
        };
        assert_eq!(
            reconcile(&draft, &TechnicianDirectory::default(), Utc::now()),
            Err(Rejection::MissingOrderId)
        );
    }

    #[test]
    fn child_order_without_technician_is_allowed() {
        let draft = OrderDraft {
            parent_id: Some(OrderId(10)),
            ..OrderDraft::new(OrderId(101))
        };
        let order = reconcile(&draft, &TechnicianDirectory::default(), Utc::now()).unwrap();
        assert!(order.technician_id.is_none());
        assert_eq!(order.parent_id, Some(OrderId(10)));
    }

    #[test]
    fn every_built_order_is_attributable() {
        let directory = dir(&[("t1", "André"), ("t2", "Ana"), ("t3", "Ananda")]);
        let drafts = [
            OrderDraft::new(OrderId(1)),
            named_draft(2, "andré"),
            named_draft(3, "ana"),
            named_draft(4, ""),
            OrderDraft {
                parent_id: Some(OrderId(1)),
                ..OrderDraft::new(OrderId(5))
            },
            OrderDraft {
                technician_id: Some(String::new()),
                ..OrderDraft::new(OrderId(6))
            },
        ];
        for draft in &drafts {
            if let Ok(order) = reconcile(draft, &directory, Utc::now()) {
                assert!(order.technician_id.is_some() || order.parent_id.is_some());
            }
        }
    }

    #[test]
    fn money_fields_soft_fail_to_zero() {
        let draft = OrderDraft {
            technician_id: Some("t1".into()),
            charged: Some(MoneyInput::Text("R$ 1.234,50".into())),
            parts_cost: Some(MoneyInput::Text("abc".into())),
            other_costs: Some(MoneyInput::Number(15.0)),
            ..OrderDraft::new(OrderId(8))
        };
        let order = reconcile(&draft, &TechnicianDirectory::default(), Utc::now()).unwrap();
        assert!((order.charged - 1234.5).abs() < 1e-9);
        assert_eq!(order.parts_cost, 0.0);
        assert_eq!(order.other_costs, 15.0);
    }

    #[test]
    fn only_warranty_overrides_paid_status() {
        for (requested, expected) in [
            (None, OrderStatus::Paid),
            (Some(OrderStatus::New), OrderStatus::Paid),
            (Some(OrderStatus::Ready), OrderStatus::Paid),
            (Some(OrderStatus::Warranty), OrderStatus::Warranty),
        ] {
            let draft = OrderDraft {
                technician_id: Some("t1".into()),
                status: requested,
                ..OrderDraft::new(OrderId(2))
            };
            let order = reconcile(&draft, &TechnicianDirectory::default(), Utc::now()).unwrap();
            assert_eq!(order.status, expected);
        }
    }

    #[test]
    fn blank_text_fields_become_placeholder() {
        let draft = OrderDraft {
            technician_id: Some("t1".into()),
            model: Some("   ".into()),
            ..OrderDraft::new(OrderId(4))
        };
        let order = reconcile(&draft, &TechnicianDirectory::default(), Utc::now()).unwrap();
        assert_eq!(order.model, "N/A");
        assert_eq!(order.defect, "N/A");
    }

    #[test]
    fn warranty_draft_inherits_and_zeroes() {
        let parent = reconcile(
            &OrderDraft {
                technician_id: Some("t1".into()),
                model: Some("Galaxy S21".into()),
                charged: Some(MoneyInput::Number(450.0)),
                priority: Some(Priority::High),
                ..OrderDraft::new(OrderId(120))
            },
            &TechnicianDirectory::default(),
            Utc::now(),
        )
        .unwrap();

        let child_id = suggested_warranty_id(parent.id).unwrap();
        assert_eq!(child_id, OrderId(1201));

        let child = reconcile(
            &warranty_draft(&parent, child_id),
            &TechnicianDirectory::default(),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(child.status, OrderStatus::Warranty);
        assert_eq!(child.parent_id, Some(OrderId(120)));
        assert_eq!(child.technician_id.as_deref(), Some("t1"));
        assert_eq!(child.model, "Galaxy S21");
        assert_eq!(child.defect, "GARANTIA DA OS#120");
        assert_eq!(child.priority, Priority::High);
        assert_eq!(child.charged, 0.0);
        assert_eq!(child.parts_cost, 0.0);
        assert_eq!(child.other_costs, 0.0);
    }

    #[test]
    fn payload_converts_to_draft() {
        let payload = CreateOrderPayload {
            id: OrderId(42),
            model: Some("Moto G".into()),
            defect: None,
            charged: Some(MoneyInput::Text("R$ 90,00".into())),
            parts_cost: None,
            technician_id: None,
            technician_name: Some("car".into()),
        };
        let draft = OrderDraft::from(payload);
        assert_eq!(draft.id, Some(OrderId(42)));
        assert_eq!(draft.technician_name.as_deref(), Some("car"));
        assert!(draft.parent_id.is_none());
        assert!(draft.status.is_none());
    }
}
