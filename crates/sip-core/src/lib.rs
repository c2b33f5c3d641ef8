//! SIP/2.0 message parsing and serialization: start lines, the
//! case-insensitive multi-valued header bag, multipart body assembly, and
//! the side-field extraction (tags, branch, CSeq) the transaction and
//! dialog engines key off of. No transport, no state machines - those
//! live in `ue-transaction-core` and `ue-dialog-core`.

pub mod body;
pub mod error;
pub mod header;
pub mod message;
pub mod method;
pub mod parser;
pub mod response;
pub mod uri;
pub mod writer;

pub use body::{Body, BodyType, ContentPart};
pub use error::{Result, SipError};
pub use header::{HeaderName, Headers};
pub use message::{Message, SideFields, StartLine, MAGIC_COOKIE, SIP_VERSION};
pub use method::Method;
pub use response::{add_contact, build_response};
pub use uri::Uri;
