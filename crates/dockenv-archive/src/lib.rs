//! Tar re-rooting for archives copied out of containers
//!
//! A container runtime returns the archive of `/data/logs` with entries named
//! `logs/`, `logs/a.log`, ... This crate rewrites such a stream so that its
//! top level is the *contents* of the requested directory (`a.log`, ...).
//!
//! ## Example
//!
//! ```rust
//! use dockenv_archive::{rebase, summarize, RebaseContext, StripMode};
//! use tar::{Builder, Header};
//!
//! let mut input = Builder::new(Vec::new());
//! let mut header = Header::new_gnu();
//! header.set_size(10);
//! input.append_data(&mut header, "logs/a.log", &[0u8; 10][..]).unwrap();
//! let input = input.into_inner().unwrap();
//!
//! let ctx = RebaseContext::new("/data/logs", StripMode::CharClass);
//! let output = rebase(input.as_slice(), &ctx).unwrap();
//!
//! let listing = summarize(output.as_slice()).unwrap();
//! assert_eq!(listing[0].name, "a.log");
//! assert_eq!(listing[0].size, 10);
//! ```

pub mod error;
pub mod name;
pub mod rebase;
pub mod summary;

pub use error::{RebaseError, Result};
pub use name::{basename, strip_char_class, strip_prefix, RebaseContext, StripMode};
pub use rebase::{rebase, rebase_into, BLOCK_SIZE};
pub use summary::{summarize, EntryKind, EntrySummary};
