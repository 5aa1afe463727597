//! Resolving questions.
//!
//! This module contains everything needed to answer questions: the
//! resolver configuration in [`conf`], the static [`hosts`] table, the
//! [`hints`] table naming the servers to start with, and the resolver
//! itself in [`stub`].
//!
//! The configuration, hosts table, and hints table are shared read-only
//! by any number of resolvers through `Arc`s. Changing them while they
//! are shared is up to the caller.

pub use self::conf::{Lookup, ResolvConf, ResolvOptions, TcpMode};
pub use self::hints::{Hints, HintsIter};
pub use self::hosts::Hosts;
pub use self::search::SearchIter;
pub use self::stub::Resolver;

pub mod addr;
pub mod conf;
pub mod hints;
pub mod hosts;
pub mod search;
pub mod stub;
