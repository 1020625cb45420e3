pub mod attack;
pub mod snapshot;

pub use attack::{AttackEvent, CredentialAttack, HttpAttack};
pub use snapshot::{FormValues, RequestSnapshot, RequestTarget};
