use serde::{Deserialize, Serialize};

use fuelops_core::{Entity, GradeId, Money};

/// A fuel product sold at the station (regular gasoline, ethanol, diesel...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelGrade {
    pub id: GradeId,
    /// Short unique product code, e.g. "GC" or "ET".
    pub code: String,
    pub name: String,
    /// Catalog sale price per liter.
    pub sale_price: Money,
}

impl Entity for FuelGrade {
    type Id = GradeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
