//! The playback transcript file format.
//!
//! External recorder and playback tools exchange input sessions in a plain
//! text format: a four-line header identifying the cartridge and
//! television specification, followed by one comma-separated row per input
//! event, stamped with the frame, scanline and horizontal position it
//! occurred at and a frame hash for drift detection.
//!
//! ```text
//! vcs_playback
//! <cartridge filename>
//! <cartridge sha1>
//! <tv spec id>
//! <port>, <event>, <frame>, <scanline>, <horiz>, <hash>
//! ```

/// First line of every transcript.
pub const MAGIC: &str = "vcs_playback";

const NUM_HEADER_LINES: usize = 4;
const NUM_FIELDS: usize = 6;
const FIELD_SEP: &str = ", ";

/// Transcript header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub cart_filename: String,
    pub cart_hash: String,
    pub tv_spec: String,
}

/// One recorded input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Port the event belongs to (0/1 for the hand controllers, 2 for the
    /// panel).
    pub port: u8,
    /// Event description, as serialised by the recorder.
    pub event: String,
    pub frame: u64,
    pub scanline: u32,
    pub horiz: u32,
    /// Frame hash at the time of the event.
    pub hash: String,
}

/// Does the text look like a playback transcript?
#[must_use]
pub fn is_transcript(text: &str) -> bool {
    text.starts_with(MAGIC)
}

/// Parse a transcript into its header and entries.
pub fn parse(text: &str) -> Result<(Header, Vec<Entry>), String> {
    let mut lines = text.lines();

    if lines.next() != Some(MAGIC) {
        return Err(format!("not a valid playback transcript (missing {MAGIC})"));
    }

    let mut header_lines = Vec::with_capacity(NUM_HEADER_LINES - 1);
    for _ in 1..NUM_HEADER_LINES {
        header_lines.push(
            lines
                .next()
                .ok_or_else(|| "truncated playback header".to_string())?,
        );
    }

    let header = Header {
        cart_filename: header_lines[0].to_string(),
        cart_hash: header_lines[1].to_string(),
        tv_spec: header_lines[2].to_string(),
    };

    let mut entries = Vec::new();
    for (n, line) in lines.enumerate() {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(FIELD_SEP).collect();
        if fields.len() != NUM_FIELDS {
            return Err(format!(
                "wrong number of fields in playback entry {} ({} of {})",
                n + 1,
                fields.len(),
                NUM_FIELDS
            ));
        }
        let parse_num = |field: &str, what: &str| {
            field
                .parse()
                .map_err(|_| format!("bad {what} in playback entry {}", n + 1))
        };
        entries.push(Entry {
            port: parse_num(fields[0], "port")? as u8,
            event: fields[1].to_string(),
            frame: parse_num(fields[2], "frame")?,
            scanline: parse_num(fields[3], "scanline")? as u32,
            horiz: parse_num(fields[4], "horizontal position")? as u32,
            hash: fields[5].to_string(),
        });
    }

    Ok((header, entries))
}

/// Serialise a transcript.
#[must_use]
pub fn write(header: &Header, entries: &[Entry]) -> String {
    let mut out = String::new();
    out.push_str(MAGIC);
    out.push('\n');
    out.push_str(&header.cart_filename);
    out.push('\n');
    out.push_str(&header.cart_hash);
    out.push('\n');
    out.push_str(&header.tv_spec);
    out.push('\n');

    for entry in entries {
        out.push_str(&format!(
            "{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}\n",
            entry.port,
            entry.event,
            entry.frame,
            entry.scanline,
            entry.horiz,
            entry.hash,
            sep = FIELD_SEP
        ));
    }

    out
}
