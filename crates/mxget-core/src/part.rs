//! Parts handed to the per-part callback, and the callback's continue/stop signal.

/// Returned by the per-part callback (and by transfer sinks) to keep going or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl Flow {
    pub fn is_stop(self) -> bool {
        self == Flow::Stop
    }
}

impl From<bool> for Flow {
    /// `true` means continue.
    fn from(keep_going: bool) -> Self {
        if keep_going {
            Flow::Continue
        } else {
            Flow::Stop
        }
    }
}

/// One payload and its header block.
///
/// Borrows the client's internal buffer: valid only inside the callback.
/// Use [`Part::to_owned_part`] to keep it.
#[derive(Debug, Clone, Copy)]
pub struct Part<'a> {
    /// 0-based, increases by one per delivered part within a call.
    pub index: u64,
    /// Header lines (`Name: value`) in arrival order.
    pub headers: &'a [String],
    pub payload: &'a [u8],
}

impl<'a> Part<'a> {
    /// Case-insensitive lookup of a header value. Returns the first match, trimmed.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        find_header(self.headers, name)
    }

    pub fn content_type(&self) -> Option<&'a str> {
        self.header("content-type")
    }

    pub fn to_owned_part(&self) -> OwnedPart {
        OwnedPart {
            index: self.index,
            headers: self.headers.to_vec(),
            payload: self.payload.to_vec(),
        }
    }
}

/// A part copied out of the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedPart {
    pub index: u64,
    pub headers: Vec<String>,
    pub payload: Vec<u8>,
}

impl OwnedPart {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn as_part(&self) -> Part<'_> {
        Part {
            index: self.index,
            headers: &self.headers,
            payload: &self.payload,
        }
    }
}

pub(crate) fn find_header<'a>(lines: &'a [String], name: &str) -> Option<&'a str> {
    lines.iter().find_map(|line| {
        let (n, v) = line.split_once(':')?;
        if n.trim().eq_ignore_ascii_case(name) {
            Some(v.trim())
        } else {
            None
        }
    })
}
