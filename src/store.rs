// ordered maps keep subkeys and keys in insertion order, which the
// archive format depends on
use indexmap::IndexMap;

// a fast hashing algo for the ordered maps, keys are short strings
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

use std::fs;
use std::io;
use std::path::Path;

use tracing::{info, warn};

// our own stuff that we need
use crate::error::{Result, TracebookError};
use crate::keygen::KeyGenerator;
use crate::persist;

// ------------- Key -------------
pub type Key = String;

pub type KeyHasher = BuildHasherDefault<SeaHasher>;

// salt fed to the generator for the root key minted at construction
pub const ROOT_SALT: &str = "_root";
// alias accepted by the metadata accessors in place of the root key
pub const SELF_ALIAS: &str = "__self__";
// tags with format level meaning
pub const TYPE_TAG: &str = "__type__";
pub const NOTE_TAG: &str = "__note__";

// ------------- MetaKey -------------
// The "__self__" alias is resolved exactly once, at the boundary where a
// MetaKey is formed. Everything deeper works with resolved keys only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaKey<'a> {
    Root,
    Named(&'a str),
}

impl<'a> From<&'a str> for MetaKey<'a> {
    fn from(key: &'a str) -> Self {
        if key == SELF_ALIAS {
            MetaKey::Root
        } else {
            MetaKey::Named(key)
        }
    }
}

impl<'a> From<&'a String> for MetaKey<'a> {
    fn from(key: &'a String) -> Self {
        MetaKey::from(key.as_str())
    }
}

// ------------- Record -------------
// The columns of a single measurement run. Column order is insertion
// order and survives overwrites and deletions of other columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: IndexMap<String, Vec<f64>, KeyHasher>,
}

impl Record {
    pub fn new() -> Self {
        Self {
            columns: IndexMap::default(),
        }
    }
    pub fn subkeys(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns.iter().map(|(s, c)| (s.as_str(), c.as_slice()))
    }
    pub fn column(&self, subkey: &str) -> Option<&[f64]> {
        self.columns.get(subkey).map(Vec::as_slice)
    }
    pub fn contains_subkey(&self, subkey: &str) -> bool {
        self.columns.contains_key(subkey)
    }
    pub fn len(&self) -> usize {
        self.columns.len()
    }
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
    // Row count as the format defines it: the length of the first column.
    pub fn rows(&self) -> usize {
        self.columns.values().next().map_or(0, Vec::len)
    }
}

// ------------- DataStore -------------
#[derive(Debug, Default)]
pub struct DataStore {
    records: IndexMap<Key, Record, KeyHasher>,
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            records: IndexMap::default(),
        }
    }
    // Puts an empty record under the key. An existing record is displaced
    // but keeps its slot in the key order, which is what the reference
    // container semantics give as well.
    pub fn add(&mut self, key: &str) -> bool {
        self.records.insert(key.to_owned(), Record::new()).is_some()
    }
    pub fn remove(&mut self, key: &str) -> Result<Record> {
        self.records
            .shift_remove(key)
            .ok_or_else(|| TracebookError::KeyNotFound(key.to_owned()))
    }
    pub fn record(&self, key: &str) -> Result<&Record> {
        self.records
            .get(key)
            .ok_or_else(|| TracebookError::KeyNotFound(key.to_owned()))
    }
    fn record_mut(&mut self, key: &str) -> Result<&mut Record> {
        self.records
            .get_mut(key)
            .ok_or_else(|| TracebookError::KeyNotFound(key.to_owned()))
    }
    // Idempotent column creation. Returns whether the column was already
    // there, in which case its data is left alone.
    pub fn add_subkey(&mut self, key: &str, subkey: &str) -> Result<bool> {
        let record = self.record_mut(key)?;
        if record.columns.contains_key(subkey) {
            return Ok(true);
        }
        record.columns.insert(subkey.to_owned(), Vec::new());
        Ok(false)
    }
    // Replaces the whole record with empty columns in the given order,
    // discarding whatever data was present.
    pub fn set_subkeys<S: AsRef<str>>(&mut self, key: &str, subkeys: &[S]) -> Result<()> {
        let record = self.record_mut(key)?;
        record.columns.clear();
        for subkey in subkeys {
            record.columns.insert(subkey.as_ref().to_owned(), Vec::new());
        }
        Ok(())
    }
    pub fn del_subkey(&mut self, key: &str, subkey: &str) -> Result<()> {
        let record = self.record_mut(key)?;
        match record.columns.shift_remove(subkey) {
            Some(_) => Ok(()),
            None => Err(TracebookError::SubkeyNotFound {
                key: key.to_owned(),
                subkey: subkey.to_owned(),
            }),
        }
    }
    pub fn column(&self, key: &str, subkey: &str) -> Result<&[f64]> {
        let record = self.record(key)?;
        record
            .column(subkey)
            .ok_or_else(|| TracebookError::SubkeyNotFound {
                key: key.to_owned(),
                subkey: subkey.to_owned(),
            })
    }
    // Overwrites one column wholesale. A subkey not seen before is created
    // at the end of the column order.
    pub fn set_column(&mut self, key: &str, subkey: &str, values: Vec<f64>) -> Result<()> {
        let record = self.record_mut(key)?;
        record.columns.insert(subkey.to_owned(), values);
        Ok(())
    }
    pub fn append(&mut self, key: &str, subkey: &str, value: f64) -> Result<()> {
        let record = self.record_mut(key)?;
        match record.columns.get_mut(subkey) {
            Some(column) => {
                column.push(value);
                Ok(())
            }
            None => Err(TracebookError::SubkeyNotFound {
                key: key.to_owned(),
                subkey: subkey.to_owned(),
            }),
        }
    }
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.records.iter().map(|(k, r)| (k.as_str(), r))
    }
    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    pub fn all_empty(&self) -> bool {
        self.records.values().all(Record::is_empty)
    }
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

// ------------- MetadataStore -------------
// Shares the key space with the data store but is kept separately, since
// the root key carries metadata without ever owning a record.
#[derive(Debug)]
pub struct MetadataStore {
    entries: IndexMap<Key, IndexMap<String, String, KeyHasher>, KeyHasher>,
    root: Key,
}

impl MetadataStore {
    pub fn new(root: Key) -> Self {
        let mut entries = IndexMap::default();
        entries.insert(root.clone(), IndexMap::default());
        Self { entries, root }
    }
    pub fn root(&self) -> &str {
        &self.root
    }
    // Renames the root key, carrying its tags over. Used when a parsed
    // archive states which root identity it was written under.
    pub fn adopt_root(&mut self, key: &str) {
        if key == self.root {
            return;
        }
        let tags = self.entries.shift_remove(&self.root).unwrap_or_default();
        self.entries.insert(key.to_owned(), tags);
        self.root = key.to_owned();
    }
    // Puts a fresh empty entry under the key, displacing any previous one.
    pub fn reset_entry(&mut self, key: &str) {
        self.entries.insert(key.to_owned(), IndexMap::default());
    }
    pub fn remove_entry(&mut self, key: &str) -> bool {
        self.entries.shift_remove(key).is_some()
    }
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn set(&mut self, key: MetaKey<'_>, tag: &str, value: &str) -> Result<()> {
        let resolved = match key {
            MetaKey::Root => self.root.as_str(),
            MetaKey::Named(name) => name,
        };
        match self.entries.get_mut(resolved) {
            Some(tags) => {
                tags.insert(tag.to_owned(), value.to_owned());
                Ok(())
            }
            None => Err(TracebookError::KeyNotFound(resolved.to_owned())),
        }
    }
    // An unknown key is loud, an absent tag on a known key is not.
    pub fn get(&self, key: MetaKey<'_>, tag: &str) -> Result<Option<&str>> {
        let resolved = match key {
            MetaKey::Root => self.root.as_str(),
            MetaKey::Named(name) => name,
        };
        match self.entries.get(resolved) {
            Some(tags) => Ok(tags.get(tag).map(String::as_str)),
            None => Err(TracebookError::KeyNotFound(resolved.to_owned())),
        }
    }
    pub fn pairs(&self, key: MetaKey<'_>) -> Result<impl Iterator<Item = (&str, &str)>> {
        let resolved = match key {
            MetaKey::Root => self.root.as_str(),
            MetaKey::Named(name) => name,
        };
        match self.entries.get(resolved) {
            Some(tags) => Ok(tags.iter().map(|(t, v)| (t.as_str(), v.as_str()))),
            None => Err(TracebookError::KeyNotFound(resolved.to_owned())),
        }
    }
}

// ------------- Store -------------
// This pairs the two stores up behind one surface. Records and metadata
// entries are created and removed together, the root key exists from
// construction on and only ever carries metadata.
#[derive(Debug)]
pub struct Store {
    data: DataStore,
    meta: MetadataStore,
    generator: KeyGenerator,
}

impl Store {
    pub fn new() -> Self {
        Self::with_generator(KeyGenerator::new())
    }
    pub fn with_generator(generator: KeyGenerator) -> Self {
        let root = generator.generate(ROOT_SALT);
        Self {
            data: DataStore::new(),
            meta: MetadataStore::new(root),
            generator,
        }
    }
    // functions to access the owned stores
    pub fn data(&self) -> &DataStore {
        &self.data
    }
    pub fn meta(&self) -> &MetadataStore {
        &self.meta
    }
    pub fn root_key(&self) -> &str {
        self.meta.root()
    }
    pub fn adopt_root_key(&mut self, key: &str) {
        self.meta.adopt_root(key);
    }
    // Creates the empty record and empty metadata entry as a pair. Returns
    // whether a previous record was displaced.
    pub fn add_key(&mut self, key: &str) -> bool {
        if self.data.record(key).is_ok_and(|r| !r.is_empty()) {
            warn!(key, "displacing a non-empty record");
        }
        self.meta.reset_entry(key);
        self.data.add(key)
    }
    pub fn add_hash_key(&mut self, salt: &str) -> Key {
        let key = self.generator.generate(salt);
        self.add_key(&key);
        key
    }
    pub fn add_subkey(&mut self, key: &str, subkey: &str) -> Result<bool> {
        self.data.add_subkey(key, subkey)
    }
    pub fn set_subkeys<S: AsRef<str>>(&mut self, key: &str, subkeys: &[S]) -> Result<()> {
        self.data.set_subkeys(key, subkeys)
    }
    pub fn get_subkey_data(&self, key: &str, subkey: &str) -> Result<&[f64]> {
        self.data.column(key, subkey)
    }
    pub fn set_subkey_data(&mut self, key: &str, subkey: &str, values: Vec<f64>) -> Result<()> {
        self.data.set_column(key, subkey, values)
    }
    pub fn append_subkey_data(&mut self, key: &str, subkey: &str, value: f64) -> Result<()> {
        self.data.append(key, subkey, value)
    }
    // Removes the record and the metadata entry together.
    pub fn del_key(&mut self, key: &str) -> Result<()> {
        self.data.remove(key)?;
        self.meta.remove_entry(key);
        Ok(())
    }
    pub fn del_subkey(&mut self, key: &str, subkey: &str) -> Result<()> {
        self.data.del_subkey(key, subkey)
    }
    pub fn record(&self, key: &str) -> Result<&Record> {
        self.data.record(key)
    }
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys()
    }
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains(key)
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    // True when no record holds any column yet.
    pub fn keys_empty(&self) -> bool {
        self.data.all_empty()
    }
    // Drops every record with its paired metadata entry. The root key and
    // its metadata stay.
    pub fn reset(&mut self) {
        for key in self.data.keys() {
            self.meta.remove_entry(key);
        }
        self.data.clear();
    }
    pub fn set_metadata<'k>(
        &mut self,
        key: impl Into<MetaKey<'k>>,
        tag: &str,
        value: &str,
    ) -> Result<()> {
        self.meta.set(key.into(), tag, value)
    }
    pub fn get_metadata<'k>(
        &self,
        key: impl Into<MetaKey<'k>>,
        tag: &str,
    ) -> Result<Option<&str>> {
        self.meta.get(key.into(), tag)
    }
    // The session note lives on the root key.
    pub fn set_note(&mut self, text: &str) -> Result<()> {
        self.meta.set(MetaKey::Root, NOTE_TAG, text)
    }
    pub fn note(&self) -> Option<&str> {
        self.meta.get(MetaKey::Root, NOTE_TAG).ok().flatten()
    }
    // Swaps in the parsed halves of a staged store, keeping the generator.
    pub(crate) fn commit(&mut self, staged: Store) {
        self.data = staged.data;
        self.meta = staged.meta;
    }
    // Total row count across all records, as the archive format counts rows.
    fn rows(&self) -> usize {
        self.data.iter().map(|(_, record)| record.rows()).sum()
    }
    // Renders the whole archive in memory first, so a store that cannot
    // be represented never leaves a truncated file behind.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut rendered = Vec::new();
        persist::write(self, &mut rendered)?;
        fs::write(path, &rendered)?;
        info!(
            path = %path.display(),
            keys = self.data.len(),
            rows = self.rows(),
            "archive written"
        );
        Ok(())
    }
    // The file handle is scoped to this call and released on every exit
    // path, overwrite rejection and parse failure included.
    pub fn read<P: AsRef<Path>>(&mut self, path: P, overwrite: bool) -> Result<()> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let file = fs::File::open(path)?;
        persist::read_into(self, io::BufReader::new(file), &origin, overwrite)?;
        info!(
            path = %path.display(),
            keys = self.data.len(),
            rows = self.rows(),
            "archive read"
        );
        Ok(())
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
