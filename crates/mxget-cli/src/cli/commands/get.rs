//! `mxget get` – fetch a URL once and write every part to disk.

use anyhow::{bail, Context, Result};
use mxget_core::config::MxConfig;
use mxget_core::{Flow, Request, StreamEnd, StreamingClient};
use std::fs;
use std::path::{Path, PathBuf};

pub fn run_get(cfg: &MxConfig, request: &Request, file: &Path, max_parts: u64) -> Result<()> {
    let max_parts = max_parts.max(1);
    let mut client = StreamingClient::with_config(cfg.transport.clone());
    let mut write_error = None;

    let resp = client.get(request, |part| {
        let path = part_path(file, part.index);
        eprintln!(
            "part {} ({} bytes) -> {}",
            part.index,
            part.payload.len(),
            path.display()
        );
        for line in part.headers {
            eprintln!("  {}", line);
        }
        if let Err(e) =
            fs::write(&path, part.payload).with_context(|| format!("writing {}", path.display()))
        {
            write_error = Some(e);
            return Flow::Stop;
        }
        Flow::from(part.index + 1 < max_parts)
    })?;

    if let Some(e) = write_error {
        return Err(e);
    }

    tracing::info!(
        uri = %request.uri,
        status = resp.status_code,
        parts = resp.parts_delivered,
        malformed = resp.malformed_parts,
        "get finished"
    );

    match (&resp.end, resp.status_code) {
        (StreamEnd::Failed(msg), 0) => bail!("could not reach {}: {}", request.uri, msg),
        (_, 200) => {}
        (_, status) => bail!("{} returned HTTP status {}", request.uri, status),
    }
    if let StreamEnd::Failed(msg) = &resp.end {
        eprintln!("transfer ended early: {}", msg);
    }
    if resp.malformed_parts > 0 {
        eprintln!("skipped {} malformed part(s)", resp.malformed_parts);
    }
    eprintln!("{} part(s) written", resp.parts_delivered);
    Ok(())
}

/// `cam.jpg` for part 0, `cam_3.jpg` for part 3.
fn part_path(file: &Path, index: u64) -> PathBuf {
    if index == 0 {
        return file.to_path_buf();
    }
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match file.extension() {
        Some(ext) => format!("{}_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{}", stem, index),
    };
    file.with_file_name(name)
}
