//! STL (stereolithography) reading and writing.
//!
//! Reading auto-detects the variant: files whose first line contains
//! `solid` are parsed as ASCII, everything else as binary (80-byte
//! header, u32 triangle count, then 50 bytes per triangle). Writing
//! takes the surface-mesh index and vertex arrays and emits either
//! variant; sloppy output paths are fixed up (default file name after
//! a trailing separator, `.stl` extension, missing directory created).

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use glam::Vec3;
use tracing::debug;

use crate::io::IoError;
use crate::surface::SurfaceVertex;
use crate::volume::Facet;

/// File name used when the output path ends in a separator.
const DEFAULT_FILE_NAME: &str = "cutsim.stl";

/// Read an STL file into a facet list, auto-detecting ASCII/binary.
pub fn read_stl(path: impl AsRef<Path>) -> Result<Vec<Facet>, IoError> {
    let data = fs::read(path.as_ref())?;
    let first_line = data
        .split(|&b| b == b'\n')
        .next()
        .map(|l| String::from_utf8_lossy(l).into_owned())
        .unwrap_or_default();
    let facets = if first_line.contains("solid") {
        read_ascii(&data)
    } else {
        read_binary(&data)
    }?;
    debug!(path = %path.as_ref().display(), facets = facets.len(), "stl import complete");
    Ok(facets)
}

fn read_ascii(data: &[u8]) -> Result<Vec<Facet>, IoError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| IoError::InvalidFormat(format!("invalid UTF-8 in ASCII STL: {}", e)))?;

    let mut facets = Vec::new();
    let mut normal = Vec3::ZERO;
    let mut vertices: Vec<Vec3> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("facet normal") {
            normal = parse_triplet(rest)?;
        } else if let Some(rest) = line.strip_prefix("vertex") {
            vertices.push(parse_triplet(rest)?);
        } else if line.starts_with("endfacet") {
            if vertices.len() != 3 {
                return Err(IoError::InvalidFormat(format!(
                    "facet with {} vertices",
                    vertices.len()
                )));
            }
            facets.push(Facet::new(normal, vertices[0], vertices[1], vertices[2]));
            vertices.clear();
        } else if line.starts_with("endsolid") {
            return Ok(facets);
        }
    }
    // reached the end of the file without endsolid
    Err(IoError::InvalidFormat("ASCII STL without endsolid".into()))
}

fn parse_triplet(s: &str) -> Result<Vec3, IoError> {
    let mut it = s.split_whitespace().map(|t| {
        t.parse::<f32>()
            .map_err(|e| IoError::InvalidFormat(format!("bad number {:?}: {}", t, e)))
    });
    let mut next = || {
        it.next()
            .unwrap_or_else(|| Err(IoError::InvalidFormat("expected three numbers".into())))
    };
    Ok(Vec3::new(next()?, next()?, next()?))
}

fn read_binary(data: &[u8]) -> Result<Vec<Facet>, IoError> {
    if data.len() < 84 {
        return Err(IoError::InvalidFormat("binary STL too small".into()));
    }
    let count = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    let expected = 84 + count * 50;
    if data.len() < expected {
        return Err(IoError::InvalidFormat(format!(
            "binary STL truncated: expected {} bytes, got {}",
            expected,
            data.len()
        )));
    }
    let read_vec3 = |offset: usize| {
        let f = |o: usize| f32::from_le_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]]);
        Vec3::new(f(offset), f(offset + 4), f(offset + 8))
    };
    let mut facets = Vec::with_capacity(count);
    for t in 0..count {
        let base = 84 + t * 50;
        facets.push(Facet::new(
            read_vec3(base),
            read_vec3(base + 12),
            read_vec3(base + 24),
            read_vec3(base + 36),
        ));
    }
    Ok(facets)
}

/// Write the surface mesh as an STL file; returns the path written.
///
/// `indices` is a flat triangle index array into `vertices`. The facet
/// normal is taken from the first vertex of each triangle (the
/// extractor gives all three the same normal).
pub fn write_stl(
    indices: &[u32],
    vertices: &[SurfaceVertex],
    path: impl AsRef<Path>,
    binary: bool,
) -> Result<PathBuf, IoError> {
    let path = fix_up_path(path.as_ref());
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir(dir)?;
        }
    }
    let file = fs::File::create(&path)?;
    let mut w = BufWriter::new(file);

    let tri_count = indices.len() / 3;
    if binary {
        let mut header = [0u8; 80];
        header[..6].copy_from_slice(b"cutsim");
        w.write_all(&header)?;
        w.write_all(&(tri_count as u32).to_le_bytes())?;
        for tri in indices.chunks_exact(3) {
            let p1 = &vertices[tri[0] as usize];
            let p2 = &vertices[tri[1] as usize];
            let p3 = &vertices[tri[2] as usize];
            for v in [p1.normal, p1.position, p2.position, p3.position] {
                for c in [v.x, v.y, v.z] {
                    w.write_all(&c.to_le_bytes())?;
                }
            }
            w.write_all(&0u16.to_le_bytes())?;
        }
    } else {
        writeln!(w, "solid cutsim")?;
        for tri in indices.chunks_exact(3) {
            let p1 = &vertices[tri[0] as usize];
            let p2 = &vertices[tri[1] as usize];
            let p3 = &vertices[tri[2] as usize];
            let n = p1.normal;
            writeln!(w, "facet normal {} {} {}", n.x, n.y, n.z)?;
            writeln!(w, "  outer loop")?;
            for p in [p1, p2, p3] {
                writeln!(w, "      vertex {} {} {}", p.position.x, p.position.y, p.position.z)?;
            }
            writeln!(w, "  endloop")?;
            writeln!(w, "endfacet")?;
        }
        writeln!(w, "endsolid cutsim")?;
    }
    w.flush()?;
    debug!(path = %path.display(), triangles = tri_count, binary, "stl written");
    Ok(path)
}

/// Trailing separator gets the default file name; anything not ending
/// in `.stl` (case-insensitive) gets the extension appended.
fn fix_up_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let mut fixed = if raw.ends_with('/') || raw.ends_with('\\') {
        let mut p = PathBuf::from(path);
        p.push(DEFAULT_FILE_NAME);
        p
    } else {
        PathBuf::from(path)
    };
    let lower = fixed.to_string_lossy().to_lowercase();
    if !lower.ends_with(".stl") {
        let mut s = fixed.into_os_string();
        s.push(".stl");
        fixed = PathBuf::from(s);
    }
    fixed
}
