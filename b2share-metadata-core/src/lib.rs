#![doc = "b2share-metadata-core: core logic library for b2share-metadata."]

//! This crate holds the schema-driven mapper that turns flat
//! `(key, subkey, value)` metadata records into a nested document shaped after
//! a B2SHARE community schema, plus the collaborator traits and the
//! file-backed implementations used around it.
//!
//! Network access to a B2SHARE instance lives in the CLI crate.
//!
//! # Usage
//! Build a [`pipeline::MappingRequest`] and call [`pipeline::map_metadata`]
//! with a [`contract::SchemaProvider`] and a [`contract::RecordSource`].

pub mod contract;
pub mod document;
pub mod error;
pub mod mapper;
pub mod pipeline;
pub mod records;
pub mod schema;
