//! Access to the Trac environment and the Gitea instance.
//!
//! The converter only ever talks to these two traits. The concrete
//! implementations here back the command line tool: a Trac directory plus
//! a TOML file of lookup tables describing what has already been imported.

mod destination;
mod lookup;
mod source;

pub use destination::{CommentStamp, DestinationAccessor, GiteaTarget};
pub use lookup::LookupTables;
pub use source::{SourceAccessor, TracEnvironment};
