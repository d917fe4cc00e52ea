//! Binary encode/decode for universe images.
//!
//! All integers are little-endian. Strings are length-prefixed with a
//! `u32` length. States are written in the fewest whole bytes that hold
//! the image's state width.

use std::io::{Read, Write};

use cellua_core::{CellState, Coord, Generation, StateCodec};
use cellua_space::BoundaryPolicy;

use crate::error::PersistError;
use crate::image::{RuleRef, UniverseImage};
use crate::{FORMAT_VERSION, MAGIC};

/// Largest dimension count accepted when decoding.
pub const MAX_DIMENSIONS: usize = 64;

/// Largest string length accepted by both directions.
const MAX_STR_LEN: usize = 1 << 20;

const TAG_INFINITE: u8 = 0;
const TAG_FINITE: u8 = 1;
const TAG_LOOP: u8 = 2;

// ── Primitive writers ───────────────────────────────────────────

fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), PersistError> {
    w.write_all(&[v])?;
    Ok(())
}

fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_i64_le(w: &mut dyn Write, v: i64) -> Result<(), PersistError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn check_str_len(what: &str, s: &str) -> Result<(), PersistError> {
    if s.len() > MAX_STR_LEN {
        return Err(PersistError::Malformed {
            detail: format!("{what} is {} bytes, limit is {MAX_STR_LEN}", s.len()),
        });
    }
    Ok(())
}

fn write_str(w: &mut dyn Write, s: &str) -> Result<(), PersistError> {
    check_str_len("string", s)?;
    write_u32_le(w, s.len() as u32)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

// ── Primitive readers ───────────────────────────────────────────

fn read_u8(r: &mut dyn Read) -> Result<u8, PersistError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32_le(r: &mut dyn Read) -> Result<u32, PersistError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64_le(r: &mut dyn Read) -> Result<u64, PersistError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_i64_le(r: &mut dyn Read) -> Result<i64, PersistError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

fn read_str(r: &mut dyn Read) -> Result<String, PersistError> {
    let len = read_u32_le(r)? as usize;
    if len > MAX_STR_LEN {
        return Err(PersistError::Malformed {
            detail: format!("string length {len} exceeds {MAX_STR_LEN}"),
        });
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| PersistError::Malformed {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

fn read_flag(r: &mut dyn Read, what: &str) -> Result<bool, PersistError> {
    match read_u8(r)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(PersistError::Malformed {
            detail: format!("{what} flag must be 0 or 1, got {other}"),
        }),
    }
}

// ── Boundary policies ───────────────────────────────────────────

fn encode_policy(w: &mut dyn Write, policy: &BoundaryPolicy) -> Result<(), PersistError> {
    match *policy {
        BoundaryPolicy::Infinite => write_u8(w, TAG_INFINITE),
        BoundaryPolicy::Finite { lo, hi } => {
            write_u8(w, TAG_FINITE)?;
            write_i64_le(w, lo)?;
            write_i64_le(w, hi)
        }
        BoundaryPolicy::Loop { lo, hi, reflect } => {
            write_u8(w, TAG_LOOP)?;
            write_i64_le(w, lo)?;
            write_i64_le(w, hi)?;
            match reflect {
                Some(axis) => {
                    write_u8(w, 1)?;
                    write_u32_le(w, axis as u32)
                }
                None => write_u8(w, 0),
            }
        }
    }
}

fn decode_policy(r: &mut dyn Read) -> Result<BoundaryPolicy, PersistError> {
    match read_u8(r)? {
        TAG_INFINITE => Ok(BoundaryPolicy::Infinite),
        TAG_FINITE => Ok(BoundaryPolicy::Finite {
            lo: read_i64_le(r)?,
            hi: read_i64_le(r)?,
        }),
        TAG_LOOP => {
            let lo = read_i64_le(r)?;
            let hi = read_i64_le(r)?;
            let reflect = if read_flag(r, "reflect")? {
                Some(read_u32_le(r)? as usize)
            } else {
                None
            };
            Ok(BoundaryPolicy::Loop { lo, hi, reflect })
        }
        tag => Err(PersistError::Malformed {
            detail: format!("unknown boundary tag {tag}"),
        }),
    }
}

// ── Image encode/decode ─────────────────────────────────────────

/// Encode `image` in the current format.
///
/// Cells are sorted before writing, so the output depends only on the
/// image's contents.
pub fn encode_image(w: &mut dyn Write, image: &UniverseImage) -> Result<(), PersistError> {
    let codec = StateCodec::new(image.state_bits).ok_or_else(|| PersistError::Malformed {
        detail: format!("state width {} outside 1..=64", image.state_bits),
    })?;
    if image.boundaries.len() != image.dimensions {
        return Err(PersistError::Malformed {
            detail: format!(
                "{} boundary policies for {} dimensions",
                image.boundaries.len(),
                image.dimensions
            ),
        });
    }
    if image.dimensions == 0 || image.dimensions > MAX_DIMENSIONS {
        return Err(PersistError::Malformed {
            detail: format!(
                "dimension count {} outside 1..={MAX_DIMENSIONS}",
                image.dimensions
            ),
        });
    }
    if let Some(rule) = &image.rule {
        check_str_len("rule name", &rule.name)?;
        if let Some(source) = &rule.source {
            check_str_len("rule source", source)?;
        }
    }

    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;

    write_u32_le(w, image.dimensions as u32)?;
    for policy in &image.boundaries {
        encode_policy(w, policy)?;
    }

    match &image.rule {
        Some(rule) => {
            write_u8(w, 1)?;
            write_str(w, &rule.name)?;
            match &rule.source {
                Some(source) => {
                    write_u8(w, 1)?;
                    write_str(w, source)?;
                }
                None => write_u8(w, 0)?,
            }
        }
        None => write_u8(w, 0)?,
    }

    write_u8(w, image.state_bits)?;
    write_u64_le(w, image.generation.0)?;

    let mut cells: Vec<&(Coord, CellState)> = image.cells.iter().collect();
    cells.sort_unstable_by(|a, b| a.0.cmp(&b.0));
    write_u64_le(w, cells.len() as u64)?;
    let mut buf = Vec::with_capacity(codec.byte_width());
    for (coord, state) in cells {
        if coord.len() != image.dimensions {
            return Err(PersistError::Malformed {
                detail: format!("cell {coord:?} has the wrong arity"),
            });
        }
        if *state == 0 || !codec.contains(*state) {
            return Err(PersistError::Malformed {
                detail: format!("state {state} at {coord:?} cannot be stored"),
            });
        }
        for &v in coord.iter() {
            write_i64_le(w, v)?;
        }
        buf.clear();
        codec.encode(*state, &mut buf);
        w.write_all(&buf)?;
    }
    log::debug!(
        "encoded image: {} dimensions, generation {}, {} cells",
        image.dimensions,
        image.generation,
        image.cells.len()
    );
    Ok(())
}

/// Decode and validate an image.
///
/// Structural checks only; topology and rule validation happen in
/// [`UniverseImage::restore`].
pub fn decode_image(r: &mut dyn Read) -> Result<UniverseImage, PersistError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(PersistError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion { found: version });
    }

    let dimensions = read_u32_le(r)? as usize;
    if dimensions == 0 || dimensions > MAX_DIMENSIONS {
        return Err(PersistError::Malformed {
            detail: format!("dimension count {dimensions} outside 1..={MAX_DIMENSIONS}"),
        });
    }
    let boundaries = (0..dimensions)
        .map(|_| decode_policy(r))
        .collect::<Result<Vec<_>, _>>()?;

    let rule = if read_flag(r, "rule")? {
        let name = read_str(r)?;
        let source = if read_flag(r, "source")? {
            Some(read_str(r)?)
        } else {
            None
        };
        Some(RuleRef { name, source })
    } else {
        None
    };

    let state_bits = read_u8(r)?;
    let codec = StateCodec::new(state_bits).ok_or_else(|| PersistError::Malformed {
        detail: format!("state width {state_bits} outside 1..=64"),
    })?;
    let generation = Generation(read_u64_le(r)?);

    let count = read_u64_le(r)?;
    let mut cells = Vec::with_capacity(count.min(1 << 16) as usize);
    let mut buf = vec![0u8; codec.byte_width()];
    for _ in 0..count {
        let mut coord = Coord::with_capacity(dimensions);
        for _ in 0..dimensions {
            coord.push(read_i64_le(r)?);
        }
        r.read_exact(&mut buf)?;
        let state = codec.decode(&buf).ok_or_else(|| PersistError::Malformed {
            detail: format!("state at {coord:?} exceeds {state_bits} bits"),
        })?;
        if state == 0 {
            return Err(PersistError::Malformed {
                detail: format!("quiescent cell stored at {coord:?}"),
            });
        }
        cells.push((coord, state));
    }

    Ok(UniverseImage {
        dimensions,
        boundaries,
        rule,
        state_bits,
        generation,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> UniverseImage {
        UniverseImage {
            dimensions: 2,
            boundaries: vec![
                BoundaryPolicy::looped_reflecting(0, 9, 1),
                BoundaryPolicy::Finite { lo: -3, hi: 3 },
            ],
            rule: Some(RuleRef {
                name: "B3/S23".into(),
                source: None,
            }),
            state_bits: 1,
            generation: Generation(17),
            cells: vec![
                (Coord::from_slice(&[4, 1]), 1),
                (Coord::from_slice(&[0, -3]), 1),
            ],
        }
    }

    fn encode(image: &UniverseImage) -> Vec<u8> {
        let mut out = Vec::new();
        encode_image(&mut out, image).unwrap();
        out
    }

    #[test]
    fn header_layout() {
        let bytes = encode(&image());
        assert_eq!(&bytes[..4], b"CELL");
        assert_eq!(bytes[4], FORMAT_VERSION);
        assert_eq!(&bytes[5..9], &2u32.to_le_bytes());
    }

    #[test]
    fn decode_sorts_cells_and_keeps_everything_else() {
        let original = image();
        let decoded = decode_image(&mut encode(&original).as_slice()).unwrap();
        let mut expected = original.clone();
        expected.cells.sort();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn bad_magic_and_version() {
        let mut bytes = encode(&image());
        bytes[0] = b'X';
        assert!(matches!(
            decode_image(&mut bytes.as_slice()),
            Err(PersistError::InvalidMagic)
        ));

        let mut bytes = encode(&image());
        bytes[4] = 99;
        assert!(matches!(
            decode_image(&mut bytes.as_slice()),
            Err(PersistError::UnsupportedVersion { found: 99 })
        ));
    }

    #[test]
    fn truncation_is_an_io_error() {
        let bytes = encode(&image());
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(
            decode_image(&mut &cut[..]),
            Err(PersistError::Io(_))
        ));
    }

    #[test]
    fn wide_states_use_whole_bytes() {
        let mut img = image();
        img.state_bits = 12;
        img.cells = vec![(Coord::from_slice(&[1, 1]), 4000)];
        let bytes = encode(&img);
        let decoded = decode_image(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded.cells[0].1, 4000);
    }

    #[test]
    fn out_of_domain_states_are_not_written() {
        let mut img = image();
        img.cells.push((Coord::from_slice(&[2, 2]), 2));
        assert!(matches!(
            encode_image(&mut Vec::<u8>::new(), &img),
            Err(PersistError::Malformed { .. })
        ));
    }

    #[test]
    fn oversized_rule_source_is_refused_before_writing() {
        let mut img = image();
        img.rule = Some(RuleRef {
            name: "huge".into(),
            source: Some(format!("transition: {}", "0".repeat(MAX_STR_LEN))),
        });
        let mut out = Vec::new();
        assert!(matches!(
            encode_image(&mut out, &img),
            Err(PersistError::Malformed { .. })
        ));
        assert!(out.is_empty());

        let source = "x".repeat(MAX_STR_LEN);
        img.rule = Some(RuleRef {
            name: "limit".into(),
            source: Some(source.clone()),
        });
        let decoded = decode_image(&mut encode(&img).as_slice()).unwrap();
        assert_eq!(decoded.rule.and_then(|r| r.source), Some(source));
    }

    #[test]
    fn undecodable_dimension_counts_are_refused() {
        let mut img = image();
        img.dimensions = MAX_DIMENSIONS + 1;
        img.boundaries = vec![BoundaryPolicy::Infinite; MAX_DIMENSIONS + 1];
        img.cells.clear();
        let mut out = Vec::new();
        assert!(matches!(
            encode_image(&mut out, &img),
            Err(PersistError::Malformed { .. })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_boundary_tag_is_malformed() {
        let mut bytes = encode(&image());
        bytes[9] = 7;
        assert!(matches!(
            decode_image(&mut bytes.as_slice()),
            Err(PersistError::Malformed { .. })
        ));
    }
}
