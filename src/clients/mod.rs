//! The collaborator interfaces a client resolves from its scope, and the
//! defaults shipped for them.

pub mod codec;
pub mod interceptor;
pub mod options;
pub mod template;

pub use codec::*;
pub use interceptor::*;
pub use options::*;
pub use template::*;
