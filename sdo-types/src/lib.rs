pub mod body;
pub mod error;
pub mod header;
pub mod layout;
pub mod packet;

pub use body::*;
pub use error::*;
pub use header::*;
pub use layout::*;
pub use packet::*;
