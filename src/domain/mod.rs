mod account;
mod money;
mod transaction;
mod transfer;
mod user;

pub use account::*;
pub use money::*;
pub use transaction::*;
pub use transfer::*;
pub use user::*;
