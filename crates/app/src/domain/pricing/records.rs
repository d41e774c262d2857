//! Price Adjustment Records

use std::{fmt, str::FromStr};

use bazaar_pricing::{
    percent::Percent,
    state::{AdminLayer, Availability, LayerSource, PriceBase, PriceState},
};
use rust_decimal::Decimal;
use sqlx::{FromRow, Row, postgres::PgRow};
use thiserror::Error;
use uuid::Uuid;

/// Kind of entity that can carry a price layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Product,
    Bundle,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Bundle => "bundle",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown entity kind: {0}")]
pub struct UnknownEntityKind(String);

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "product" => Ok(Self::Product),
            "bundle" => Ok(Self::Bundle),
            other => Err(UnknownEntityKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown layer source: {0}")]
pub struct UnknownLayerSource(String);

/// A product or bundle identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub uuid: Uuid,
}

impl EntityRef {
    #[must_use]
    pub const fn product(uuid: Uuid) -> Self {
        Self {
            kind: EntityKind::Product,
            uuid,
        }
    }

    #[must_use]
    pub const fn bundle(uuid: Uuid) -> Self {
        Self {
            kind: EntityKind::Bundle,
            uuid,
        }
    }
}

/// The outcome of a pricing change on one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepricedEntity {
    pub entity: EntityRef,
    pub selling_price: Decimal,
    pub layer: Option<AdminLayer>,
}

/// Read view over the admin layer a record carries.
pub trait Layered {
    fn adjustment(&self) -> Option<AdminLayer>;

    /// Percentage of the admin layer currently applied, if any.
    fn admin_discount(&self) -> Option<Percent> {
        self.adjustment().map(|layer| layer.percent)
    }

    /// Admin discount that layered this record, if the layer came from one.
    fn discount_uuid(&self) -> Option<Uuid> {
        match self.adjustment()?.source {
            LayerSource::Discount(uuid) => Some(uuid),
            LayerSource::Sale(_) => None,
        }
    }

    /// Sale that layered this record, if any.
    fn sale_uuid(&self) -> Option<Uuid> {
        match self.adjustment()?.source {
            LayerSource::Sale(uuid) => Some(uuid),
            LayerSource::Discount(_) => None,
        }
    }
}

/// Locked pricing state of a single entity.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PriceStateRow(pub PriceState);

impl<'r> FromRow<'r, PgRow> for PriceStateRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(PriceState {
            mrp: row.try_get("mrp")?,
            selling_price: row.try_get("selling_price")?,
            base_discount: decode_percent(row, "discount")?,
            layer: decode_layer(row)?,
            availability: Availability {
                is_active: row.try_get("is_active")?,
                is_blocked: row.try_get("is_blocked")?,
                is_deleted: row.try_get("is_deleted")?,
            },
        }))
    }
}

/// A bundle member's locked pricing state and how many units the bundle holds.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MemberPrice {
    pub state: PriceState,
    pub quantity: u32,
}

impl<'r> FromRow<'r, PgRow> for MemberPrice {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let PriceStateRow(state) = PriceStateRow::from_row(row)?;
        let quantity: i32 = row.try_get("quantity")?;

        Ok(Self {
            state,
            quantity: u32::try_from(quantity).map_err(|error| decode_error("quantity", error))?,
        })
    }
}

fn decode_error(
    column: &str,
    error: impl std::error::Error + Send + Sync + 'static,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(error),
    }
}

/// Decode a `NUMERIC` percentage column.
pub(crate) fn decode_percent(row: &PgRow, column: &str) -> sqlx::Result<Percent> {
    let value: Decimal = row.try_get(column)?;

    Percent::new(value).map_err(|error| decode_error(column, error))
}

/// Decode the `adjustment_*` columns of a `LEFT JOIN price_adjustments`.
pub(crate) fn decode_layer(row: &PgRow) -> sqlx::Result<Option<AdminLayer>> {
    let Some(source) = row.try_get::<Option<String>, _>("adjustment_source")? else {
        return Ok(None);
    };

    let value: Decimal = row.try_get("adjustment_percentage")?;
    let percent =
        Percent::new(value).map_err(|error| decode_error("adjustment_percentage", error))?;

    let layer = match source.as_str() {
        "discount" => {
            let base: String = row.try_get("adjustment_base")?;
            let base = base
                .parse::<PriceBase>()
                .map_err(|error| decode_error("adjustment_base", error))?;

            AdminLayer::discount(row.try_get("adjustment_discount_uuid")?, percent, base)
        }
        "sale" => {
            let base: String = row.try_get("adjustment_base")?;
            let sale = row.try_get("adjustment_sale_uuid")?;

            match PriceBase::from_storage(&base)
                .map_err(|error| decode_error("adjustment_base", error))?
            {
                PriceBase::Members => AdminLayer::bundle_sale(sale, percent),
                PriceBase::Mrp | PriceBase::SellingPrice => AdminLayer::sale(sale, percent),
            }
        }
        other => {
            return Err(decode_error(
                "adjustment_source",
                UnknownLayerSource(other.to_string()),
            ));
        }
    };

    Ok(Some(layer))
}

/// Storage columns for a layer source: `(source, discount_uuid, sale_uuid)`.
pub(crate) fn source_columns(source: LayerSource) -> (&'static str, Option<Uuid>, Option<Uuid>) {
    match source {
        LayerSource::Discount(uuid) => (source.kind_str(), Some(uuid), None),
        LayerSource::Sale(uuid) => (source.kind_str(), None, Some(uuid)),
    }
}

impl<'r> FromRow<'r, PgRow> for EntityRef {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind: String = row.try_get("entity_kind")?;

        Ok(Self {
            kind: kind
                .parse()
                .map_err(|error| decode_error("entity_kind", error))?,
            uuid: row.try_get("entity_uuid")?,
        })
    }
}
