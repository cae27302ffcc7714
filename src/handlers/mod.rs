// handlers/mod.rs - request handlers
//
// system: fixed routes (/, /health, /jwt)
// shapes: the generic collection handlers the route table is built from
// contract: request body checks for create routes
pub mod contract;
pub mod shapes;
pub mod system;

pub use contract::BodyContract;
pub use shapes::{CreateOutcome, UniqueBy};
pub use system::{health, issue_token, root};
