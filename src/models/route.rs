//! Route model and the read-only tariff view over it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{TariffKind, TariffRecord};

/// A billable origin-destination pair for a client.
///
/// The route owns its tariff history. Records are supplied by the storage
/// layer as an immutable snapshot for the duration of a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Persistence identity of the route.
    pub id: String,
    /// Origin site reference.
    pub origin: String,
    /// Destination site reference.
    pub destination: String,
    /// The client billed for this route.
    pub client_id: String,
    /// Road distance in kilometres, when it has been computed.
    #[serde(default)]
    pub distance_km: Option<Decimal>,
    /// Tariff history for this route.
    #[serde(default)]
    pub tariff_records: Vec<TariffRecord>,
}

/// Read-only access to a route's ordered tariff history.
pub trait TariffStore {
    /// The identity of the route the records belong to.
    fn route_id(&self) -> &str;

    /// All tariff records of the route, in storage order.
    fn tariff_records(&self) -> &[TariffRecord];

    /// Finds a record by its identity.
    fn find_tariff(&self, tariff_id: &str) -> Option<&TariffRecord> {
        self.tariff_records().iter().find(|t| t.id == tariff_id)
    }

    /// Iterates over the records of one kind.
    fn tariffs_of_kind(&self, kind: TariffKind) -> impl Iterator<Item = &TariffRecord> {
        self.tariff_records().iter().filter(move |t| t.kind == kind)
    }
}

impl TariffStore for Route {
    fn route_id(&self) -> &str {
        &self.id
    }

    fn tariff_records(&self) -> &[TariffRecord] {
        &self.tariff_records
    }
}
