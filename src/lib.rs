//! A DNS resolution engine.
//!
//! This crate provides the building blocks of a stub and recursive DNS
//! resolver that is driven by the caller's event loop rather than a
//! runtime of its own.
//!
//! # Modules
//!
//! * [base] contains the fundamental types: domain names, the message
//!   header, questions, resource records, and [`Packet`][base::Packet],
//!   a fixed-capacity DNS message with name compression,
//! * [rdata] contains the typed record data for the supported record
//!   types, and
//! * [resolv] contains the resolver configuration, the hosts and hints
//!   tables, and the poll-driven [`Resolver`][resolv::Resolver].
//!
//! # Reference of Feature Flags
//!
//! * `serde`: derives `Serialize` and `Deserialize` for the resolver
//!   options and statistics.
//! * `tokio`: enables driving the resolver from a
//!   [Tokio](https://tokio.rs/) task via `resolv::stub::aio`.

#![allow(renamed_and_removed_lints)]
#![allow(clippy::unknown_clippy_lints)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod base;
pub mod rdata;
pub mod resolv;
