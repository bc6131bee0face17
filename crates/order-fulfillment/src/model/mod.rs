//! Domain types. Each actor's state type lives here; its behaviour lives in the matching
//! `*_actor` / `order_workflow` module.

pub mod cart;
pub mod ids;
pub mod merchant;
pub mod order;
pub mod payment;
pub mod shipment;

pub use cart::*;
pub use ids::*;
pub use merchant::*;
pub use order::*;
pub use payment::*;
pub use shipment::*;
