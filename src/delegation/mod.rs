mod delegation_point;
mod finder;

pub use self::delegation_point::{DelegationPoint, NameserverEntry};
pub(crate) use self::finder::{fill_missing, find_delegation, find_delegation_with_referral};
