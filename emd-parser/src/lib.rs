//! # emd-parser
//!
//! Declarative object parser and writer for emd scene files.
//!
//! Scene, UI and command descriptions are all written in one small grammar:
//! typed, optionally named objects holding named fields. Object types register
//! themselves in a [`Registry`](emd::registry::Registry); the
//! [`Parser`](emd::parsing::Parser) instantiates them by name and fills their
//! fields, and the [`Writer`](emd::formats::writer::Writer) turns an object
//! graph back into text, using `USE` for shared named objects.
//!
//! Layout:
//! src/emd
//!   ├── scanning     Tokens and the input stack
//!   ├── parsing      Grammar driver
//!   ├── formats      Writer, value text, JSON snapshots
//!   └── <common>     Values, fields, objects, registry
//!
//! Fixture object types used across the test suite live in the
//! [testing module](emd::testing).

pub mod emd;
