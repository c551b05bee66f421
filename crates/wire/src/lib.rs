//! supervisor-wire: JSON frame types exchanged between gateway clients and
//! the supervisor. `Request` is what a client sends; `Frame` is everything
//! the gateway sends back, whether a direct response or a bus broadcast.

pub mod request;
pub mod response;

pub use request::{LogKindFilter, Request, SortBy, SortOrder};
pub use response::{ErrorCode, Frame};
