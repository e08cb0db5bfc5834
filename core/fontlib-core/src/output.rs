//! Streaming output helpers (made by fontlib)

use std::io::{self, Write};

use crate::model::FontRecord;

/// Write fonts as a prettified JSON array.
pub fn write_json_pretty(fonts: &[FontRecord], mut w: impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(fonts)?;
    w.write_all(json.as_bytes())?;
    Ok(())
}

/// Write fonts as newline-delimited JSON (NDJSON).
pub fn write_ndjson(fonts: &[FontRecord], mut w: impl Write) -> io::Result<()> {
    for font in fonts {
        let line = serde_json::to_string(font)?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
    }
    Ok(())
}
