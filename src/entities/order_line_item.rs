use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{EnumRepr, WireEnum};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_line_items")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_id: i32,
    pub product_name: String,
    #[sea_orm(nullable)]
    pub product_code: Option<String>,
    #[sea_orm(nullable)]
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit: UnitType,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Unit of measure for a line quantity, stored by ordinal
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
pub enum UnitType {
    #[default]
    #[sea_orm(num_value = 0)]
    Piece,
    #[sea_orm(num_value = 1)]
    Kilogram,
    #[sea_orm(num_value = 2)]
    Gram,
    #[sea_orm(num_value = 3)]
    Liter,
    #[sea_orm(num_value = 4)]
    Milliliter,
    #[sea_orm(num_value = 5)]
    Meter,
    #[sea_orm(num_value = 6)]
    Centimeter,
    #[sea_orm(num_value = 7)]
    Box,
    #[sea_orm(num_value = 8)]
    Pack,
    #[sea_orm(num_value = 9)]
    Pair,
    #[sea_orm(num_value = 10)]
    Dozen,
    #[sea_orm(num_value = 11)]
    Roll,
    #[sea_orm(num_value = 12)]
    Bottle,
    #[sea_orm(num_value = 13)]
    Can,
    #[sea_orm(num_value = 14)]
    Bag,
    #[sea_orm(num_value = 15)]
    Case,
}

impl WireEnum for UnitType {
    fn variant_name(self) -> &'static str {
        self.into()
    }
}

impl From<UnitType> for i32 {
    fn from(unit: UnitType) -> Self {
        unit.ordinal()
    }
}

impl TryFrom<EnumRepr> for UnitType {
    type Error = String;

    fn try_from(repr: EnumRepr) -> Result<Self, Self::Error> {
        repr.resolve("unit")
    }
}
