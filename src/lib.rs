//! Tracebook – a keyed store for measurement traces with a plain text archive format.
//!
//! Tracebook centers on the *record* concept: the labelled columns of one
//! measurement run, addressed by a short generated key.
//! * A [`store::Key`] is a record's identifier (a plain `String`, usually a
//!   7 character hash prefix from the [`keygen::KeyGenerator`]).
//! * A Subkey names one column inside a record; column order is insertion
//!   order and is kept through every mutation.
//! * A [`store::Record`] maps Subkeys to their `f64` value sequences.
//! * Metadata is a separate tag/value space per key. The root key, minted
//!   when a store is created, carries session wide metadata such as the
//!   note, and the `"__self__"` alias always resolves to it (see
//!   [`store::MetaKey`]).
//!
//! The [`store::Store`] pairs the data and metadata sides up: keys are
//! created and removed in both at once, so neither side leaks entries.
//!
//! ## Modules
//! * [`store`] – Records, the paired data/metadata stores and the `Store` surface.
//! * [`keygen`] – Salted, clock driven key generation with an injectable clock.
//! * [`persist`] – The line oriented archive format, serializer and deserializer.
//! * [`config`] – Settings for the command line tool.
//! * [`error`] – The crate wide error type and `Result` alias.
//!
//! ## Archive format
//! Archives are line oriented text. `*!` lines carry the format header, the
//! session note and the root identity, one `#!` line opens the block of a
//! key, `>!` lines restate its metadata, then a tab separated column header
//! and the rows follow. Reading tokenizes on whitespace, so hand edited
//! spacing is fine. A store that already holds keys refuses to load an
//! archive unless overwrite is passed, and a parse failure leaves it
//! untouched.
//!
//! ## Quick Start
//! ```
//! use tracebook::{persist, store::Store};
//! let mut store = Store::new();
//! let run = store.add_hash_key("sweep");
//! store.set_subkeys(&run, &["v", "i"]).unwrap();
//! store.append_subkey_data(&run, "v", 1.0).unwrap();
//! store.append_subkey_data(&run, "i", 0.1).unwrap();
//! store.set_metadata(&run, "__type__", "iv-sweep").unwrap();
//! store.set_note("first cooldown").unwrap();
//!
//! let mut archive = Vec::new();
//! persist::write(&store, &mut archive).unwrap();
//! let restored = persist::read(archive.as_slice(), "memory").unwrap();
//! assert_eq!(restored.get_subkey_data(&run, "v").unwrap(), &[1.0]);
//! assert_eq!(restored.note(), Some("first cooldown"));
//! ```

pub mod config;
pub mod error;
pub mod keygen;
pub mod persist;
pub mod store;
