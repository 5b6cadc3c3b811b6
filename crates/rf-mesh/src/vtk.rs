//! VTK XML interchange: `.vtu` grids in and out, `.vtp` geometry out.
//!
//! Reading goes through `vtkio`, so ASCII, raw and base64 (optionally
//! compressed) files written by ParaView or OpenFOAM's `foamToVTK` load the
//! same way. Writing is plain ASCII XML.

use std::io::Write;

use vtkio::model::{Attribute, DataSet, IOBuffer, Piece, VertexNumbers, Vtk};

use crate::cell::{Cell, CellKind};
use crate::error::{MeshError, MeshResult};
use crate::field::FieldArray;
use crate::grid::GridDocument;
use crate::polydata::PolyData;

const VTK_VOXEL: u8 = 11;
/// Voxel corners in hexahedron order.
const VOXEL_TO_HEXAHEDRON: [usize; 8] = [0, 1, 3, 2, 4, 5, 7, 6];

fn floats(buf: &IOBuffer) -> Option<Vec<f64>> {
    Some(match buf {
        IOBuffer::F64(v) => v.clone(),
        IOBuffer::F32(v) => v.iter().map(|&x| f64::from(x)).collect(),
        IOBuffer::I8(v) => v.iter().map(|&x| f64::from(x)).collect(),
        IOBuffer::U8(v) => v.iter().map(|&x| f64::from(x)).collect(),
        IOBuffer::I16(v) => v.iter().map(|&x| f64::from(x)).collect(),
        IOBuffer::U16(v) => v.iter().map(|&x| f64::from(x)).collect(),
        IOBuffer::I32(v) => v.iter().map(|&x| f64::from(x)).collect(),
        IOBuffer::U32(v) => v.iter().map(|&x| f64::from(x)).collect(),
        IOBuffer::I64(v) => v.iter().map(|&x| x as f64).collect(),
        IOBuffer::U64(v) => v.iter().map(|&x| x as f64).collect(),
        _ => return None,
    })
}

/// Legacy `[n, v0, .., vn-1, n, ..]` lists to connectivity and end offsets.
fn legacy_to_offsets(vertices: &[u32]) -> (Vec<u64>, Vec<u64>) {
    let mut connectivity = Vec::with_capacity(vertices.len());
    let mut offsets = Vec::new();
    let mut i = 0;
    while i < vertices.len() {
        let n = vertices[i] as usize;
        let end = (i + 1 + n).min(vertices.len());
        connectivity.extend(vertices[i + 1..end].iter().map(|&v| u64::from(v)));
        offsets.push(connectivity.len() as u64);
        i = end;
    }
    (connectivity, offsets)
}

fn data_arrays(attributes: Vec<Attribute>, n_tuples: usize) -> MeshResult<Vec<FieldArray>> {
    let mut out = Vec::new();
    for attribute in attributes {
        let Attribute::DataArray(array) = attribute else {
            continue;
        };
        let values = floats(&array.data).ok_or_else(|| MeshError::FieldShape {
            name: array.name.clone(),
            what: "data is not numeric".to_string(),
        })?;
        if values.is_empty() || values.len() % n_tuples != 0 {
            return Err(MeshError::FieldLength {
                name: array.name,
                expected: n_tuples,
                actual: values.len(),
            });
        }
        let components = values.len() / n_tuples;
        out.push(FieldArray::new(array.name, components, values)?);
    }
    Ok(out)
}

/// Parse a `.vtu` file into a grid document with its cell and point data.
pub fn read_vtu(bytes: &[u8]) -> MeshResult<GridDocument> {
    let vtk = Vtk::parse_xml(bytes).map_err(|err| MeshError::Vtk(err.to_string()))?;
    let mut pieces = match vtk.data {
        DataSet::UnstructuredGrid { pieces, .. } => pieces,
        _ => return Err(MeshError::Vtk("file does not hold an UnstructuredGrid".to_string())),
    };
    if pieces.len() != 1 {
        return Err(MeshError::Vtk(format!("expected one piece, found {}", pieces.len())));
    }
    let piece = match pieces.remove(0) {
        Piece::Inline(piece) => *piece,
        _ => return Err(MeshError::Vtk("piece data must be inline".to_string())),
    };

    let coords = floats(&piece.points).ok_or_else(|| MeshError::Vtk("point coordinates are not numeric".to_string()))?;
    if coords.len() % 3 != 0 {
        return Err(MeshError::Vtk(format!("{} point coordinates do not form triples", coords.len())));
    }
    let points: Vec<[f64; 3]> = coords.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

    let (connectivity, offsets) = match piece.cells.cell_verts {
        VertexNumbers::XML { connectivity, offsets } => (connectivity, offsets),
        VertexNumbers::Legacy { vertices, .. } => legacy_to_offsets(&vertices),
    };
    if offsets.len() != piece.cells.types.len() {
        return Err(MeshError::Vtk(format!(
            "{} cell offsets for {} cell types",
            offsets.len(),
            piece.cells.types.len()
        )));
    }

    let mut cells = Vec::with_capacity(offsets.len());
    let mut start = 0;
    for (i, (&cell_type, &end)) in piece.cells.types.iter().zip(&offsets).enumerate() {
        let end = end as usize;
        if end < start || end > connectivity.len() {
            return Err(MeshError::InvalidCell {
                cell: i,
                what: format!("offset {end} outside the connectivity list"),
            });
        }
        let nodes: Vec<usize> = connectivity[start..end].iter().map(|&n| n as usize).collect();
        start = end;

        let code = cell_type as u8;
        let cell = match CellKind::from_vtk_type(code) {
            Some(kind) => Cell::new(kind, nodes),
            None if code == VTK_VOXEL && nodes.len() == 8 => {
                Cell::new(CellKind::Hexahedron, VOXEL_TO_HEXAHEDRON.iter().map(|&l| nodes[l]).collect())
            }
            None => {
                return Err(MeshError::InvalidCell {
                    cell: i,
                    what: format!("unsupported VTK cell type {cell_type:?}"),
                });
            }
        };
        cells.push(cell);
    }
    if points.is_empty() || cells.is_empty() {
        return Err(MeshError::EmptyGrid);
    }

    let point_data = data_arrays(piece.data.point, points.len())?;
    let cell_data = data_arrays(piece.data.cell, cells.len())?;
    Ok(GridDocument {
        points,
        cells,
        cell_data,
        point_data,
    })
}

fn escape(name: &str) -> String {
    name.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn write_values<W: Write>(w: &mut W, values: &[f64], per_line: usize) -> MeshResult<()> {
    for row in values.chunks(per_line.max(1)) {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(w, "          {}", line.join(" "))?;
    }
    Ok(())
}

fn write_fields<W: Write>(w: &mut W, section: &str, fields: &[FieldArray]) -> MeshResult<()> {
    if fields.is_empty() {
        return Ok(());
    }
    writeln!(w, "      <{section}>")?;
    for field in fields {
        writeln!(
            w,
            r#"        <DataArray type="Float64" Name="{}" NumberOfComponents="{}" format="ascii">"#,
            escape(&field.name),
            field.components
        )?;
        write_values(w, &field.values, field.components)?;
        writeln!(w, r#"        </DataArray>"#)?;
    }
    writeln!(w, "      </{section}>")?;
    Ok(())
}

fn write_points<W: Write>(w: &mut W, points: &[[f64; 3]]) -> MeshResult<()> {
    writeln!(w, r#"      <Points>"#)?;
    writeln!(
        w,
        r#"        <DataArray type="Float64" Name="Points" NumberOfComponents="3" format="ascii">"#
    )?;
    write_values(w, points.as_flattened(), 3)?;
    writeln!(w, r#"        </DataArray>"#)?;
    writeln!(w, r#"      </Points>"#)?;
    Ok(())
}

/// Connectivity and offsets arrays of one topology section.
fn write_connectivity<'a, W: Write>(
    w: &mut W,
    section: &str,
    cells: impl Iterator<Item = &'a [usize]> + Clone,
) -> MeshResult<()> {
    writeln!(w, "      <{section}>")?;
    writeln!(w, r#"        <DataArray type="Int64" Name="connectivity" format="ascii">"#)?;
    for nodes in cells.clone() {
        let line: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
        writeln!(w, "          {}", line.join(" "))?;
    }
    writeln!(w, r#"        </DataArray>"#)?;

    writeln!(w, r#"        <DataArray type="Int64" Name="offsets" format="ascii">"#)?;
    let mut offset = 0;
    for nodes in cells {
        offset += nodes.len();
        writeln!(w, "          {offset}")?;
    }
    writeln!(w, r#"        </DataArray>"#)?;
    Ok(())
}

/// Write a grid document as an ASCII `.vtu` file.
pub fn write_vtu<W: Write>(w: &mut W, doc: &GridDocument) -> MeshResult<()> {
    writeln!(w, r#"<?xml version="1.0"?>"#)?;
    writeln!(
        w,
        r#"<VTKFile type="UnstructuredGrid" version="0.1" byte_order="LittleEndian">"#
    )?;
    writeln!(w, r#"  <UnstructuredGrid>"#)?;
    writeln!(
        w,
        r#"    <Piece NumberOfPoints="{}" NumberOfCells="{}">"#,
        doc.points.len(),
        doc.cells.len()
    )?;
    write_fields(w, "PointData", &doc.point_data)?;
    write_fields(w, "CellData", &doc.cell_data)?;
    write_points(w, &doc.points)?;

    write_connectivity(w, "Cells", doc.cells.iter().map(|c| c.nodes.as_slice()))?;
    writeln!(w, r#"        <DataArray type="UInt8" Name="types" format="ascii">"#)?;
    for cell in &doc.cells {
        writeln!(w, "          {}", cell.kind.vtk_type())?;
    }
    writeln!(w, r#"        </DataArray>"#)?;
    writeln!(w, r#"      </Cells>"#)?;

    writeln!(w, r#"    </Piece>"#)?;
    writeln!(w, r#"  </UnstructuredGrid>"#)?;
    writeln!(w, r#"</VTKFile>"#)?;
    Ok(())
}

/// Write extracted geometry as an ASCII `.vtp` file.
pub fn write_vtp<W: Write>(w: &mut W, poly: &PolyData) -> MeshResult<()> {
    writeln!(w, r#"<?xml version="1.0"?>"#)?;
    writeln!(w, r#"<VTKFile type="PolyData" version="0.1" byte_order="LittleEndian">"#)?;
    writeln!(w, r#"  <PolyData>"#)?;
    writeln!(
        w,
        r#"    <Piece NumberOfPoints="{}" NumberOfVerts="0" NumberOfLines="{}" NumberOfStrips="0" NumberOfPolys="{}">"#,
        poly.n_points(),
        poly.lines.len(),
        poly.polys.len()
    )?;
    write_fields(w, "PointData", &poly.point_data)?;
    write_points(w, &poly.points)?;
    if !poly.lines.is_empty() {
        write_connectivity(w, "Lines", poly.lines.iter().map(Vec::as_slice))?;
        writeln!(w, r#"      </Lines>"#)?;
    }
    if !poly.polys.is_empty() {
        write_connectivity(w, "Polys", poly.polys.iter().map(Vec::as_slice))?;
        writeln!(w, r#"      </Polys>"#)?;
    }
    writeln!(w, r#"    </Piece>"#)?;
    writeln!(w, r#"  </PolyData>"#)?;
    writeln!(w, r#"</VTKFile>"#)?;
    Ok(())
}
