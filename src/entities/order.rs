use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{EnumRepr, WireEnum};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub supplier_name: String,
    #[sea_orm(nullable)]
    pub supplier_contact: Option<String>,
    #[sea_orm(nullable)]
    pub supplier_email: Option<String>,
    #[sea_orm(nullable)]
    pub supplier_phone: Option<String>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    #[sea_orm(nullable)]
    pub expected_delivery_date: Option<DateTime<Utc>>,
    #[sea_orm(nullable)]
    pub received_date: Option<DateTime<Utc>>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    #[sea_orm(nullable)]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_line_item::Entity")]
    OrderLineItems,
}

impl Related<super::order_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLineItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Purchase order lifecycle states, stored by ordinal
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::IntoStaticStr,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(into = "i32", try_from = "EnumRepr")]
pub enum OrderStatus {
    #[default]
    #[sea_orm(num_value = 0)]
    Draft,
    #[sea_orm(num_value = 1)]
    Pending,
    #[sea_orm(num_value = 2)]
    Approved,
    #[sea_orm(num_value = 3)]
    Ordered,
    #[sea_orm(num_value = 4)]
    Received,
    #[sea_orm(num_value = 5)]
    PartiallyReceived,
    #[sea_orm(num_value = 6)]
    Cancelled,
    #[sea_orm(num_value = 7)]
    OnHold,
}

impl OrderStatus {
    /// No transition leaves a terminal status
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Received | OrderStatus::Cancelled)
    }

    /// Statuses that stamp `received_date` when entered
    pub fn marks_receipt(self) -> bool {
        matches!(
            self,
            OrderStatus::Received | OrderStatus::PartiallyReceived
        )
    }
}

impl WireEnum for OrderStatus {
    fn variant_name(self) -> &'static str {
        self.into()
    }

    fn display_name(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending Approval",
            OrderStatus::PartiallyReceived => "Partially Received",
            OrderStatus::OnHold => "On Hold",
            other => other.variant_name(),
        }
    }
}

impl From<OrderStatus> for i32 {
    fn from(status: OrderStatus) -> Self {
        status.ordinal()
    }
}

impl TryFrom<EnumRepr> for OrderStatus {
    type Error = String;

    fn try_from(repr: EnumRepr) -> Result<Self, Self::Error> {
        repr.resolve("order status")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_as_ordinal() {
        assert_eq!(serde_json::to_string(&OrderStatus::Ordered).unwrap(), "3");
        assert_eq!(serde_json::to_string(&OrderStatus::OnHold).unwrap(), "7");
    }

    #[test]
    fn status_deserializes_from_ordinal_or_name() {
        let from_int: OrderStatus = serde_json::from_str("1").unwrap();
        let from_name: OrderStatus = serde_json::from_str("\"onhold\"").unwrap();
        let from_display: OrderStatus = serde_json::from_str("\"Pending Approval\"").unwrap();
        assert_eq!(from_int, OrderStatus::Pending);
        assert_eq!(from_name, OrderStatus::OnHold);
        assert_eq!(from_display, OrderStatus::Pending);

        assert!(serde_json::from_str::<OrderStatus>("42").is_err());
        assert!(serde_json::from_str::<OrderStatus>("\"Shipped\"").is_err());
    }

    #[test]
    fn display_uses_variant_name() {
        assert_eq!(OrderStatus::PartiallyReceived.to_string(), "PartiallyReceived");
        assert_eq!(
            OrderStatus::PartiallyReceived.display_name(),
            "Partially Received"
        );
        assert_eq!(OrderStatus::default(), OrderStatus::Draft);
    }
}
