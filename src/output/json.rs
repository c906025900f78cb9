use std::io::Write;

use serde::Serialize;

pub fn write_json(out: &mut impl Write, value: &impl Serialize) -> serde_json::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out).map_err(serde_json::Error::io)
}

pub fn write_json_pretty(out: &mut impl Write, value: &impl Serialize) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out).map_err(serde_json::Error::io)
}
