use glam::Vec3;
use std::path::Path;

use crate::{AssetLoadError, TriangleMesh};

/// Meaningful lines with their 1-based line numbers; comments and blanks dropped.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().enumerate().filter_map(|(i, raw)| {
        let line = match raw.find('#') {
            Some(at) => &raw[..at],
            None => raw,
        }
        .trim();
        (!line.is_empty()).then_some((i + 1, line))
    })
}

fn parse_error(path: &Path, line: usize, message: impl Into<String>) -> AssetLoadError {
    AssetLoadError::Parse {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

fn parse_number<T: std::str::FromStr>(
    token: Option<&str>,
    path: &Path,
    line: usize,
    what: &str,
) -> Result<T, AssetLoadError> {
    let token = token.ok_or_else(|| parse_error(path, line, format!("missing {what}")))?;
    token
        .parse()
        .map_err(|_| parse_error(path, line, format!("invalid {what} '{token}'")))
}

fn parse_vertex<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    path: &Path,
    line: usize,
) -> Result<Vec3, AssetLoadError> {
    let x = parse_number(tokens.next(), path, line, "x coordinate")?;
    let y = parse_number(tokens.next(), path, line, "y coordinate")?;
    let z = parse_number(tokens.next(), path, line, "z coordinate")?;
    Ok(Vec3::new(x, y, z))
}

/// Fan-triangulate a polygon into `faces`.
fn push_fan(faces: &mut Vec<[u32; 3]>, polygon: &[u32]) {
    for i in 1..polygon.len().saturating_sub(1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

/// Parse an Object File Format mesh.
pub fn parse_off(text: &str, path: &Path) -> Result<TriangleMesh, AssetLoadError> {
    let mut lines = content_lines(text);

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| parse_error(path, 1, "empty file"))?;
    let mut header_tokens = header.split_whitespace();
    if header_tokens.next() != Some("OFF") {
        return Err(parse_error(path, header_line, "expected OFF header"));
    }

    // Counts may share the header line.
    let rest: Vec<&str> = header_tokens.collect();
    let (counts_line, counts) = if rest.is_empty() {
        let (n, l) = lines
            .next()
            .ok_or_else(|| parse_error(path, header_line, "missing element counts"))?;
        (n, l.split_whitespace().collect::<Vec<_>>())
    } else {
        (header_line, rest)
    };
    let mut counts = counts.into_iter();
    let vertex_count: usize = parse_number(counts.next(), path, counts_line, "vertex count")?;
    let face_count: usize = parse_number(counts.next(), path, counts_line, "face count")?;

    // Header counts are untrusted; each record needs at least one line of text.
    let line_budget = text.lines().count();
    let mut vertices = Vec::with_capacity(vertex_count.min(line_budget));
    for _ in 0..vertex_count {
        let (n, l) = lines
            .next()
            .ok_or_else(|| parse_error(path, counts_line, "unexpected end of vertices"))?;
        vertices.push(parse_vertex(l.split_whitespace(), path, n)?);
    }

    let mut faces = Vec::with_capacity(face_count.min(line_budget));
    let mut polygon = Vec::new();
    for _ in 0..face_count {
        let (n, l) = lines
            .next()
            .ok_or_else(|| parse_error(path, counts_line, "unexpected end of faces"))?;
        let mut tokens = l.split_whitespace();
        let sides: usize = parse_number(tokens.next(), path, n, "face size")?;
        if sides < 3 {
            return Err(parse_error(path, n, format!("face with {sides} vertices")));
        }
        polygon.clear();
        for _ in 0..sides {
            polygon.push(parse_number(tokens.next(), path, n, "face index")?);
        }
        push_fan(&mut faces, &polygon);
    }

    Ok(TriangleMesh::new(vertices, faces))
}

/// Resolve one OBJ face token (`7`, `7/1`, `7//3`, `-1`) into a 0-based index.
fn obj_index(
    token: &str,
    vertex_count: usize,
    path: &Path,
    line: usize,
) -> Result<u32, AssetLoadError> {
    let head = token.split('/').next().unwrap_or(token);
    let raw: i64 = parse_number(Some(head), path, line, "face index")?;
    let resolved = match raw {
        0 => return Err(parse_error(path, line, "face index 0 is invalid in OBJ")),
        r if r > 0 => r - 1,
        r => vertex_count as i64 + r,
    };
    u32::try_from(resolved)
        .map_err(|_| parse_error(path, line, format!("face index {raw} out of range")))
}

/// Parse the geometry records of a Wavefront OBJ file. Normals, texture
/// coordinates, groups and materials are ignored.
pub fn parse_obj(text: &str, path: &Path) -> Result<TriangleMesh, AssetLoadError> {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();
    let mut polygon = Vec::new();

    for (n, line) in content_lines(text) {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => vertices.push(parse_vertex(tokens, path, n)?),
            Some("f") => {
                polygon.clear();
                for token in tokens {
                    polygon.push(obj_index(token, vertices.len(), path, n)?);
                }
                if polygon.len() < 3 {
                    return Err(parse_error(
                        path,
                        n,
                        format!("face with {} vertices", polygon.len()),
                    ));
                }
                push_fan(&mut faces, &polygon);
            }
            _ => {}
        }
    }

    Ok(TriangleMesh::new(vertices, faces))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p() -> &'static Path {
        Path::new("test")
    }

    #[test]
    fn off_with_counts_on_header_and_comments() {
        let text = "# a quad\nOFF 4 1 0\n0 0 0\n1 0 0 # corner\n1 1 0\n0 1 0\n\n4 0 1 2 3\n";
        let mesh = parse_off(text, p()).unwrap();
        assert_eq!(mesh.vertices[1], Vec3::X);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn off_ignores_trailing_face_colors() {
        let text = "OFF\n3 1 0\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2 255 0 0\n";
        let mesh = parse_off(text, p()).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn off_requires_header() {
        let err = parse_off("3 1 0\n", p()).unwrap_err();
        assert!(matches!(err, AssetLoadError::Parse { line: 1, .. }));
    }

    #[test]
    fn off_truncated_vertices() {
        let err = parse_off("OFF\n3 1 0\n0 0 0\n", p()).unwrap_err();
        assert!(matches!(err, AssetLoadError::Parse { .. }));
    }

    #[test]
    fn off_huge_header_counts_fail_cleanly() {
        let err = parse_off("OFF\n1000000000000000000 0 0\n0 0 0\n", p()).unwrap_err();
        match err {
            AssetLoadError::Parse { message, .. } => {
                assert!(message.contains("end of vertices"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
        let err = parse_off("OFF\n3 4000000000 0\n0 0 0\n1 0 0\n0 1 0\n", p()).unwrap_err();
        assert!(matches!(err, AssetLoadError::Parse { .. }));
    }

    #[test]
    fn off_bad_number_reports_line() {
        let err = parse_off("OFF\n1 0 0\n0 zero 0\n", p()).unwrap_err();
        match err {
            AssetLoadError::Parse { line, message, .. } => {
                assert_eq!(line, 3);
                assert!(message.contains("zero"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn obj_slash_forms_and_negative_indices() {
        let text = "o tri\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1/1/1 2//1 -1\n";
        let mesh = parse_obj(text, p()).unwrap();
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn obj_quad_is_fanned() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = parse_obj(text, p()).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn obj_zero_index_rejected() {
        let err = parse_obj("v 0 0 0\nf 0 1 1\n", p()).unwrap_err();
        assert!(matches!(err, AssetLoadError::Parse { line: 2, .. }));
    }

    #[test]
    fn obj_degenerate_face_rejected() {
        assert!(parse_obj("v 0 0 0\nv 1 0 0\nf 1 2\n", p()).is_err());
    }
}
