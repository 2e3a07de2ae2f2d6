//! Persistence models for purchase orders and their line items.
//!
//! Both status and unit enums are stored as integer ordinals and travel over
//! the wire the same way; [`WireEnum`] carries the shared name lookup.

pub mod order;
pub mod order_line_item;

pub use order::OrderStatus;
pub use order_line_item::UnitType;

use sea_orm::{ActiveEnum, Iterable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Integer-backed enum exposed by ordinal, name and display name.
pub trait WireEnum: ActiveEnum<Value = i32> + Iterable + Copy + 'static {
    /// Variant identifier, e.g. `PartiallyReceived`
    fn variant_name(self) -> &'static str;

    /// Human-facing label, e.g. `Partially Received`
    fn display_name(self) -> &'static str {
        self.variant_name()
    }

    fn ordinal(self) -> i32 {
        self.to_value()
    }

    fn from_ordinal(value: i64) -> Option<Self> {
        <Self as Iterable>::iter().find(|v| i64::from(v.ordinal()) == value)
    }

    /// Case-insensitive match against the name or display name; spaces,
    /// underscores and dashes are ignored.
    fn from_name(value: &str) -> Option<Self> {
        let wanted = normalize(value);
        if wanted.is_empty() {
            return None;
        }
        <Self as Iterable>::iter()
            .find(|v| normalize(v.variant_name()) == wanted || normalize(v.display_name()) == wanted)
    }

    /// Accepts an ordinal written as text as well as a name.
    fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        match trimmed.parse::<i64>() {
            Ok(ordinal) => Self::from_ordinal(ordinal),
            Err(_) => Self::from_name(trimmed),
        }
    }

    fn descriptor(self) -> EnumDescriptor {
        EnumDescriptor {
            id: self.ordinal(),
            name: self.variant_name().to_string(),
            display_name: self.display_name().to_string(),
        }
    }

    /// Every variant in declaration order
    fn descriptors() -> Vec<EnumDescriptor> {
        <Self as Iterable>::iter().map(WireEnum::descriptor).collect()
    }
}

fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Raw JSON form of an enum value before it is resolved against the variants
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnumRepr {
    Ordinal(i64),
    Name(String),
}

impl EnumRepr {
    pub fn resolve<E: WireEnum>(&self, kind: &str) -> Result<E, String> {
        match self {
            EnumRepr::Ordinal(value) => E::from_ordinal(*value)
                .ok_or_else(|| format!("{} is not a valid {}", value, kind)),
            EnumRepr::Name(value) => {
                E::parse(value).ok_or_else(|| format!("'{}' is not a valid {}", value, kind))
            }
        }
    }
}

/// `{id, name, displayName}` entry served by the lookup endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnumDescriptor {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Pending")]
    pub name: String,
    #[schema(example = "Pending Approval")]
    pub display_name: String,
}
