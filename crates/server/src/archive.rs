//! Archive bundling for bulk downloads.

use crate::error::ApiResult;
use bytes::Bytes;
use std::collections::HashMap;

/// Bundle named payloads into a flat tar archive.
///
/// Entry names are used verbatim; callers disambiguate duplicates first
/// (see [`NameDeduper`]).
pub fn bundle(entries: &[(String, Bytes)]) -> ApiResult<Bytes> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data.as_ref())?;
    }
    let buf = builder.into_inner()?;
    Ok(Bytes::from(buf))
}

/// First-occurrence counter for duplicate entry names: the first `a.txt`
/// keeps its name, later ones become `a.txt (1)`, `a.txt (2)`, …
#[derive(Default)]
pub struct NameDeduper {
    seen: HashMap<String, u32>,
}

impl NameDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disambiguate(&mut self, name: &str) -> String {
        let count = self.seen.entry(name.to_string()).or_insert(0);
        let unique = if *count == 0 {
            name.to_string()
        } else {
            format!("{name} ({count})")
        };
        *count += 1;
        unique
    }
}
