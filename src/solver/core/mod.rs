// package together the engine independent parts of a
// session and re-export in a flattened structure :
// : status codes and the solve info record
// : user settings and problem data
// : the engine trait
// : the session and its result type

pub mod traits;

mod errors;
mod info;
mod problemdata;
mod result;
mod session;
mod settings;
mod status;

pub use errors::*;
pub use info::*;
pub use problemdata::*;
pub use result::*;
pub use session::*;
pub use settings::*;
pub use status::*;
