// used for reading and writing archives in the line oriented text form
use std::io::{BufRead, Write};

use tracing::warn;

use crate::error::{Result, TracebookError};
use crate::store::{MetaKey, NOTE_TAG, SELF_ALIAS, Store, TYPE_TAG};

// ------------- Format -------------
// A tag sits first on a line and decides what the rest of it means.
// Fields are tab or space separated on write and split on any run of
// whitespace on read, so hand edited archives stay readable.
pub const HEADER_TAG: &str = "*!";
pub const BLOCK_TAG: &str = "#!";
pub const META_TAG: &str = ">!";

pub const FORMAT_NAME: &str = "tracebook";
pub const FORMAT_VERSION: &str = "v1.1";

// keywords on header tagged lines
const NOTE_KEYWORD: &str = "note";
const ROOT_KEYWORD: &str = "hash";

// label carried in the block line when a key has no __type__ metadata
const UNTYPED_LABEL: &str = "data";

// Free text values live on a single line: internal runs of whitespace,
// tabs and newlines included, collapse to single spaces.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_error(origin: &str, line: usize, message: String) -> TracebookError {
    TracebookError::Parse {
        origin: origin.to_owned(),
        line,
        message,
    }
}

// Keys, subkeys and metadata tags become single tokens on a line, so
// they must be non empty, free of whitespace and distinct from the tags.
fn ensure_token(key: &str, what: &str, token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(TracebookError::Unrepresentable {
            key: key.to_owned(),
            detail: format!("{what} is empty"),
        });
    }
    if token.chars().any(char::is_whitespace) {
        return Err(TracebookError::Unrepresentable {
            key: key.to_owned(),
            detail: format!("{what} '{token}' contains whitespace"),
        });
    }
    if token == HEADER_TAG || token == BLOCK_TAG || token == META_TAG {
        return Err(TracebookError::Unrepresentable {
            key: key.to_owned(),
            detail: format!("{what} '{token}' collides with a format tag"),
        });
    }
    Ok(())
}

// ------------- Serializer -------------

// Everything the format cannot carry is rejected here, before a single
// byte goes out. Ragged records are the one data shaped refusal: row
// lines are cut by the first column's length, so every column has to
// hold exactly that many values.
fn check_writable(store: &Store) -> Result<()> {
    for (key, record) in store.data().iter() {
        ensure_token(key, "key", key)?;
        let mut first: Option<(&str, usize)> = None;
        for (subkey, column) in record.columns() {
            ensure_token(key, "subkey", subkey)?;
            match first {
                None => first = Some((subkey, column.len())),
                Some((_, rows)) if column.len() != rows => {
                    return Err(TracebookError::ColumnLengthMismatch {
                        key: key.to_owned(),
                        subkey: subkey.to_owned(),
                        expected: rows,
                        actual: column.len(),
                    });
                }
                Some(_) => (),
            }
        }
        for (tag, value) in store.meta().pairs(MetaKey::Named(key))? {
            ensure_token(key, "metadata tag", tag)?;
            if tag == TYPE_TAG {
                ensure_token(key, "type label", value)?;
            }
        }
    }
    Ok(())
}

// Serializes the store in one deterministic pass: header lines, then one
// block per key that holds columns, in store order. Values are written
// in their shortest form that parses back to the same number.
pub fn write<W: Write>(store: &Store, mut sink: W) -> Result<()> {
    check_writable(store)?;
    writeln!(sink, "{HEADER_TAG} {FORMAT_NAME} {FORMAT_VERSION}")?;
    if let Some(note) = store.note() {
        writeln!(sink, "{HEADER_TAG} {NOTE_KEYWORD} {}", single_line(note))?;
    }
    writeln!(sink, "{HEADER_TAG} {ROOT_KEYWORD} {}", store.root_key())?;
    writeln!(sink)?;
    for (key, record) in store.data().iter() {
        if record.is_empty() {
            warn!(key, "record has no columns and is left out of the archive");
            continue;
        }
        let label = store
            .meta()
            .get(MetaKey::Named(key), TYPE_TAG)?
            .unwrap_or(UNTYPED_LABEL);
        writeln!(sink, "{BLOCK_TAG} {label} {key}")?;
        for (tag, value) in store.meta().pairs(MetaKey::Named(key))? {
            writeln!(sink, "{META_TAG} {tag} {}", single_line(value))?;
        }
        let subkeys: Vec<&str> = record.subkeys().collect();
        writeln!(sink, "{}", subkeys.join("\t"))?;
        let columns: Vec<&[f64]> = record.columns().map(|(_, c)| c).collect();
        for row in 0..record.rows() {
            for (position, column) in columns.iter().enumerate() {
                if position > 0 {
                    write!(sink, "\t")?;
                }
                write!(sink, "{:?}", column[row])?;
            }
            writeln!(sink)?;
        }
        writeln!(sink)?;
        writeln!(sink)?;
    }
    Ok(())
}

// ------------- Deserializer -------------

// Parses one archive into a freshly staged store. The origin only shows
// up in error messages. Blank lines separate blocks and are ignored at
// the top level, unknown header keywords are skipped so older and newer
// archives both load.
pub fn read<R: BufRead>(source: R, origin: &str) -> Result<Store> {
    let mut staged = Store::new();
    // the block being filled, with its column names once the header is in
    let mut block: Option<(String, Option<Vec<String>>)> = None;
    let mut number = 0;
    for line in source.lines() {
        number += 1;
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            match &block {
                Some((key, None)) => {
                    return Err(parse_error(
                        origin,
                        number,
                        format!("block '{key}' is missing its column header"),
                    ));
                }
                Some((_, Some(_))) => block = None,
                None => (),
            }
            continue;
        }
        match tokens[0] {
            HEADER_TAG => match &block {
                Some((key, None)) => {
                    return Err(parse_error(
                        origin,
                        number,
                        format!("block '{key}' is missing its column header"),
                    ));
                }
                Some((key, Some(_))) => {
                    return Err(parse_error(
                        origin,
                        number,
                        format!("unexpected header line inside block '{key}'"),
                    ));
                }
                None => match tokens.get(1).copied() {
                    Some(NOTE_KEYWORD) => {
                        let note = tokens[2..].join(" ");
                        staged.set_metadata(SELF_ALIAS, NOTE_TAG, &note)?;
                    }
                    Some(ROOT_KEYWORD) => {
                        if tokens.len() != 3 {
                            return Err(parse_error(
                                origin,
                                number,
                                "root line does not hold exactly one key".to_owned(),
                            ));
                        }
                        staged.adopt_root_key(tokens[2]);
                    }
                    // among the unknown keywords sits the format line itself
                    _ => (),
                },
            },
            BLOCK_TAG => {
                if let Some((key, None)) = &block {
                    return Err(parse_error(
                        origin,
                        number,
                        format!("block '{key}' is missing its column header"),
                    ));
                }
                if tokens.len() != 3 {
                    return Err(parse_error(
                        origin,
                        number,
                        "block line does not hold a label and a key".to_owned(),
                    ));
                }
                let key = tokens[2].to_owned();
                staged.add_key(&key);
                // the label doubles as the type for archives written before
                // metadata lines existed, explicit metadata overwrites it
                if tokens[1] != UNTYPED_LABEL {
                    staged.set_metadata(MetaKey::Named(key.as_str()), TYPE_TAG, tokens[1])?;
                }
                block = Some((key, None));
            }
            META_TAG => match &block {
                Some((key, None)) => {
                    if tokens.len() < 2 {
                        return Err(parse_error(
                            origin,
                            number,
                            format!("metadata line under block '{key}' is missing its tag"),
                        ));
                    }
                    let value = tokens[2..].join(" ");
                    staged.set_metadata(MetaKey::Named(key.as_str()), tokens[1], &value)?;
                }
                Some((key, Some(_))) => {
                    return Err(parse_error(
                        origin,
                        number,
                        format!("unexpected metadata line inside the rows of block '{key}'"),
                    ));
                }
                None => {
                    return Err(parse_error(
                        origin,
                        number,
                        "metadata line outside of any data block".to_owned(),
                    ));
                }
            },
            _ => match &mut block {
                Some((key, subkeys @ None)) => {
                    staged.set_subkeys(key, &tokens)?;
                    *subkeys = Some(tokens.iter().map(|t| t.to_string()).collect());
                }
                Some((key, Some(subkeys))) => {
                    if tokens.len() != subkeys.len() {
                        return Err(parse_error(
                            origin,
                            number,
                            format!(
                                "row holds {} values where block '{key}' declared {} columns",
                                tokens.len(),
                                subkeys.len()
                            ),
                        ));
                    }
                    for (subkey, token) in subkeys.iter().zip(&tokens) {
                        let value: f64 = token.parse().map_err(|_| {
                            parse_error(
                                origin,
                                number,
                                format!(
                                    "malformed value '{token}' for subkey '{subkey}' of key '{key}'"
                                ),
                            )
                        })?;
                        staged.append_subkey_data(key, subkey, value)?;
                    }
                }
                None => {
                    return Err(parse_error(
                        origin,
                        number,
                        "content outside of any data block".to_owned(),
                    ));
                }
            },
        }
    }
    if let Some((key, None)) = &block {
        return Err(parse_error(
            origin,
            number,
            format!("block '{key}' is truncated before its column header"),
        ));
    }
    Ok(staged)
}

// Overwrite protection plus staging: an occupied destination refuses the
// source outright unless overwrite is passed, and nothing of a partially
// parsed source ever lands in it.
pub fn read_into<R: BufRead>(
    store: &mut Store,
    source: R,
    origin: &str,
    overwrite: bool,
) -> Result<()> {
    if !store.is_empty() && !overwrite {
        return Err(TracebookError::OverwriteProtected);
    }
    let staged = read(source, origin)?;
    store.commit(staged);
    Ok(())
}
