// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wavefront OBJ export and import
//!
//! The model is Z-up; OBJ is written Y-up:
//!   OBJ X =  model X
//!   OBJ Y =  model Z
//!   OBJ Z = -model Y

use crate::error::{Error, Result};
use crate::solid::SolidModel;
use gbxml_lite_geometry::{Mesh, Point3};

/// Fixed-precision coordinate without a negative zero
fn coord(v: f64) -> String {
    let s = format!("{:.6}", v);
    if s == "-0.000000" {
        "0.000000".to_string()
    } else {
        s
    }
}

/// Serialize the model mesh as OBJ text, one group per shell.
pub fn write_obj(model: &SolidModel) -> String {
    let mesh = &model.mesh;
    let mut out = String::with_capacity(mesh.vertex_count() * 32 + mesh.triangle_count() * 24);

    out.push_str("# gbxml-lite building model\n");
    out.push_str(&format!("# Vertices: {}\n", mesh.vertex_count()));
    out.push_str(&format!("# Triangles: {}\n", mesh.triangle_count()));
    out.push_str("# Coordinate system: Y-up (OBJ convention), meters\n");
    out.push_str("o building\n");

    for p in &mesh.vertices {
        out.push_str(&format!("v {} {} {}\n", coord(p.x), coord(p.z), coord(-p.y)));
    }

    for shell in &model.shells {
        if shell.triangles.is_empty() {
            continue;
        }
        out.push_str(&format!("g {}\n", shell.name()));
        for t in shell.triangles.clone() {
            let [a, b, c] = mesh.triangle(t);
            out.push_str(&format!("f {} {} {}\n", a + 1, b + 1, c + 1));
        }
    }

    out
}

/// Parse OBJ text back into a Z-up mesh.
///
/// Only `v` and `f` records are read. Polygons are fan-triangulated, the
/// `v/vt/vn` forms and negative (relative) indices are accepted.
pub fn parse_obj(text: &str) -> Result<Mesh> {
    let mut mesh = Mesh::new();

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let malformed = |reason: String| Error::ObjParse {
            line: line_no,
            reason,
        };
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let coords: Vec<f64> = tokens
                    .take(3)
                    .map(|t| t.parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| malformed(format!("bad vertex coordinate: {}", e)))?;
                if coords.len() != 3 {
                    return Err(malformed("vertex needs three coordinates".to_string()));
                }
                mesh.add_vertex(Point3::new(coords[0], -coords[2], coords[1]));
            }
            Some("f") => {
                let count = mesh.vertex_count() as i64;
                let corners: Vec<u32> = tokens
                    .map(|t| {
                        let index: i64 = t
                            .split('/')
                            .next()
                            .unwrap_or("")
                            .parse()
                            .map_err(|e| malformed(format!("bad face index '{}': {}", t, e)))?;
                        let resolved = if index < 0 { count + index } else { index - 1 };
                        if index == 0 || resolved < 0 || resolved >= count {
                            return Err(malformed(format!("face index {} out of range", index)));
                        }
                        Ok(resolved as u32)
                    })
                    .collect::<Result<_>>()?;
                if corners.len() < 3 {
                    return Err(malformed("face needs at least three vertices".to_string()));
                }
                for k in 1..corners.len() - 1 {
                    mesh.add_triangle(corners[0], corners[k], corners[k + 1]);
                }
            }
            _ => {}
        }
    }

    Ok(mesh)
}
