//! Archive re-rooting
//!
//! Reads a tar stream entry by entry and re-emits every entry with its name
//! rewritten by a [`RebaseContext`]. Headers and payloads are copied as they
//! are; only the name changes. Extended records (GNU long names/links and
//! PAX local headers) are regenerated so names of any length survive.

use crate::error::{RebaseError, Result};
use crate::name::RebaseContext;
use std::borrow::Cow;
use std::io::{self, Read, Write};
use tar::{Archive, Builder, Entry, EntryType, Header};
use tracing::{debug, trace};

/// Size of a tar block.
pub const BLOCK_SIZE: u64 = 512;

/// Capacity of the classic `name` and `linkname` header fields.
const NAME_FIELD_LEN: usize = 100;

/// Path GNU tar uses for long name and long link records.
const GNU_LONG_LINK: &[u8] = b"././@LongLink";

/// Re-root `reader` and return the complete output archive.
///
/// The output is buffered in memory. On error nothing is returned.
pub fn rebase<R: Read>(reader: R, ctx: &RebaseContext) -> Result<Vec<u8>> {
    rebase_into(reader, Vec::new(), ctx)
}

/// Re-root `reader` into `writer`, finishing the archive with its trailer.
pub fn rebase_into<R: Read, W: Write>(reader: R, writer: W, ctx: &RebaseContext) -> Result<W> {
    let mut archive = Archive::new(reader);
    let mut builder = Builder::new(writer);

    let mut count = 0u64;
    for entry in archive.entries().map_err(RebaseError::ReadHeader)? {
        let mut entry = entry.map_err(RebaseError::ReadHeader)?;
        rewrite_entry(&mut builder, &mut entry, ctx)?;
        count += 1;
    }

    let writer = builder.into_inner().map_err(RebaseError::Finalize)?;
    debug!(
        entries = count,
        path = ctx.requested_path(),
        basename = ctx.basename(),
        mode = %ctx.mode(),
        "archive rebased"
    );
    Ok(writer)
}

fn rewrite_entry<R: Read, W: Write>(
    builder: &mut Builder<W>,
    entry: &mut Entry<'_, R>,
    ctx: &RebaseContext,
) -> Result<()> {
    let original = entry.path_bytes().into_owned();
    let shown = String::from_utf8_lossy(&original).into_owned();
    let mut header = entry.header().clone();

    if header.entry_type().is_gnu_sparse() {
        return Err(RebaseError::Unsupported {
            name: shown,
            reason: "GNU sparse entries are not supported",
        });
    }

    let name = ctx.rewrite(&original).to_vec();
    let link = entry.link_name_bytes().map(Cow::into_owned);
    let declared = entry.size();
    let pax = pax_records(entry).map_err(RebaseError::ReadHeader)?;

    trace!(
        from = %shown,
        to = %String::from_utf8_lossy(&name),
        size = declared,
        "rewriting entry"
    );

    let write_header = |source| RebaseError::WriteHeader {
        name: shown.clone(),
        source,
    };

    let mut pax_path = false;
    let mut pax_link = false;
    if let Some(mut records) = pax {
        for (key, value) in records.iter_mut() {
            match key.as_str() {
                "path" => {
                    *value = name.clone();
                    pax_path = true;
                }
                "linkpath" => pax_link = true,
                _ => {}
            }
        }
        builder
            .append_pax_extensions(records.iter().map(|(k, v)| (k.as_str(), v.as_slice())))
            .map_err(write_header)?;
    }

    if name.len() > NAME_FIELD_LEN && !pax_path {
        append_gnu_long(builder, EntryType::GNULongName, &name).map_err(write_header)?;
    }
    if let Some(link) = link.filter(|l| l.len() > NAME_FIELD_LEN) {
        if !pax_link {
            append_gnu_long(builder, EntryType::GNULongLink, &link).map_err(write_header)?;
        }
    }

    set_name_field(&mut header, &name);
    builder
        .get_mut()
        .write_all(header.as_bytes())
        .map_err(write_header)?;

    let copy_payload = |source| RebaseError::CopyPayload {
        name: shown.clone(),
        source,
    };
    let copied = io::copy(entry, builder.get_mut()).map_err(copy_payload)?;
    if copied != declared {
        return Err(RebaseError::PayloadLength {
            name: shown.clone(),
            declared,
            copied,
        });
    }
    pad_block(builder.get_mut(), copied).map_err(copy_payload)?;

    Ok(())
}

/// PAX records attached to this entry, as owned key/value pairs.
///
/// Global headers are yielded as ordinary entries and keep their records in
/// the payload, so they are left alone.
fn pax_records<R: Read>(entry: &mut Entry<'_, R>) -> io::Result<Option<Vec<(String, Vec<u8>)>>> {
    if entry.header().entry_type().is_pax_global_extensions() {
        return Ok(None);
    }
    let Some(extensions) = entry.pax_extensions()? else {
        return Ok(None);
    };

    let mut records = Vec::new();
    for extension in extensions {
        let extension = extension?;
        let key = extension
            .key()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        records.push((key.to_string(), extension.value_bytes().to_vec()));
    }
    Ok(Some(records))
}

/// Emit a GNU `L`/`K` record carrying a name too long for the header.
fn append_gnu_long<W: Write>(builder: &mut Builder<W>, kind: EntryType, value: &[u8]) -> io::Result<()> {
    let mut header = Header::new_gnu();
    set_name_field(&mut header, GNU_LONG_LINK);
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_entry_type(kind);

    let mut data = Vec::with_capacity(value.len() + 1);
    data.extend_from_slice(value);
    data.push(0);
    header.set_size(data.len() as u64);
    header.set_cksum();

    builder.append(&header, data.as_slice())
}

/// Write `name` into the raw `name` field, truncating to the field width.
///
/// The ustar `prefix` field is cleared so readers do not prepend the old
/// directory. Longer names are carried by a preceding extended record.
fn set_name_field(header: &mut Header, name: &[u8]) {
    let field = &mut header.as_old_mut().name;
    field.fill(0);
    let len = name.len().min(NAME_FIELD_LEN);
    field[..len].copy_from_slice(&name[..len]);

    if let Some(ustar) = header.as_ustar_mut() {
        ustar.prefix.fill(0);
    }
    header.set_cksum();
}

fn pad_block<W: Write>(writer: &mut W, written: u64) -> io::Result<()> {
    let rem = written % BLOCK_SIZE;
    if rem != 0 {
        let zeros = [0u8; BLOCK_SIZE as usize];
        writer.write_all(&zeros[..(BLOCK_SIZE - rem) as usize])?;
    }
    Ok(())
}
