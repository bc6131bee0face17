//! Type-safe identifiers.
//!
//! Every actor key is a string newtype so an `OrderId` can never be passed where a
//! `PaymentId` is expected. Generated ids carry a short prefix (`ord_…`, `pay_…`).

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generates a fresh random id.
            pub fn generate() -> Self {
                Self::from_uuid(Uuid::new_v4())
            }

            /// Derives an id from an existing uuid, e.g. one journaled by an invocation.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(format!("{}_{}", $prefix, id.simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Key of an [`Order`](crate::model::Order) workflow instance.
    OrderId,
    "ord"
);
string_id!(
    /// Key of a [`Payment`](crate::model::Payment).
    PaymentId,
    "pay"
);
string_id!(
    /// Key of a [`Shipment`](crate::model::Shipment).
    ShipmentId,
    "shp"
);
string_id!(
    /// Key of a merchant's [`MerchantInventory`](crate::model::MerchantInventory).
    MerchantId,
    "m"
);
string_id!(
    /// Key of a customer's [`Cart`](crate::model::Cart).
    CustomerId,
    "cust"
);
string_id!(ItemId, "item");
