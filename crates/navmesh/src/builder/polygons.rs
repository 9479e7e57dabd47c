// polygons.rs - merge walkable cells into axis-aligned convex polygons

use super::compact::CompactHeightfield;

/// Rectangle of core cells sharing one floor height; `x1`/`y1` are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CellRect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
    pub z: u32,
}

impl CellRect {
    /// Corners in world space, counter-clockwise seen from +Z
    pub fn world_corners(&self, chf: &CompactHeightfield) -> Vec<[f32; 3]> {
        let wx = |x: usize| chf.bmin[0] + x as f32 * chf.cs;
        let wy = |y: usize| chf.bmin[1] + y as f32 * chf.cs;
        let wz = chf.bmin[2] + self.z as f32 * chf.ch;
        vec![
            [wx(self.x0), wy(self.y0), wz],
            [wx(self.x1), wy(self.y0), wz],
            [wx(self.x1), wy(self.y1), wz],
            [wx(self.x0), wy(self.y1), wz],
        ]
    }
}

/// Greedily grow rectangles over the walkable spans inside the tile core.
///
/// Border cells only exist to give the filters and erosion context from
/// neighbouring tiles, so they never produce polygons.
pub(crate) fn merge_walkable_cells(chf: &CompactHeightfield) -> Vec<CellRect> {
    let border = chf.border_size;
    if chf.width <= border * 2 || chf.height <= border * 2 {
        return Vec::new();
    }
    let (xmin, xmax) = (border, chf.width - border);
    let (ymin, ymax) = (border, chf.height - border);

    let mut used = vec![false; chf.spans.len()];
    let mut rects = Vec::new();

    for y in ymin..ymax {
        for x in xmin..xmax {
            for start in chf.cell(x, y) {
                if used[start] || !chf.spans[start].walkable {
                    continue;
                }
                let z = chf.spans[start].z;
                let open = |i: usize, used: &[bool]| !used[i] && chf.spans[i].walkable && chf.spans[i].z == z;

                // Run along +x
                let mut row = vec![start];
                let mut cx = x;
                let mut cur = start;
                while cx + 1 < xmax {
                    match chf.walkable_neighbor(cur, 2) {
                        Some(next) if open(next, &used) => {
                            row.push(next);
                            cur = next;
                            cx += 1;
                        }
                        _ => break,
                    }
                }
                let x1 = cx + 1;

                // Stack identical rows along +y
                let mut cy = y;
                let mut prev_row = row.clone();
                let mut cells = row;
                while cy + 1 < ymax {
                    let mut next_row = Vec::with_capacity(prev_row.len());
                    for (k, &below) in prev_row.iter().enumerate() {
                        let Some(up) = chf.walkable_neighbor(below, 1) else { break };
                        if !open(up, &used) {
                            break;
                        }
                        // Cells must also be connected within the new row
                        if k > 0 && chf.walkable_neighbor(next_row[k - 1], 2) != Some(up) {
                            break;
                        }
                        next_row.push(up);
                    }
                    if next_row.len() != prev_row.len() {
                        break;
                    }
                    cells.extend_from_slice(&next_row);
                    prev_row = next_row;
                    cy += 1;
                }

                for i in cells {
                    used[i] = true;
                }
                rects.push(CellRect { x0: x, y0: y, x1, y1: cy + 1, z });
            }
        }
    }

    rects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::heightfield::Heightfield;

    fn compact(size: usize, border: u32, raise: &[(usize, usize)]) -> CompactHeightfield {
        let mut hf = Heightfield::new(size, size, [0.0; 3], [size as f32, size as f32, 8.0], 1.0, 1.0);
        for y in 0..size {
            for x in 0..size {
                let top = if raise.contains(&(x, y)) { 5 } else { 1 };
                hf.add_span(x, y, 0, top, true, 1);
            }
        }
        CompactHeightfield::build(&hf, 1, 1, border)
    }

    #[test]
    fn test_flat_field_is_one_rect() {
        let chf = compact(6, 1, &[]);
        let rects = merge_walkable_cells(&chf);
        assert_eq!(rects, vec![CellRect { x0: 1, y0: 1, x1: 5, y1: 5, z: 1 }]);
        let corners = rects[0].world_corners(&chf);
        assert_eq!(corners[0], [1.0, 1.0, 1.0]);
        assert_eq!(corners[2], [5.0, 5.0, 1.0]);
    }

    #[test]
    fn test_step_splits_rects() {
        let chf = compact(4, 0, &[(2, 0), (3, 0), (2, 1), (3, 1)]);
        let rects = merge_walkable_cells(&chf);
        let cells: usize = rects.iter().map(|r| (r.x1 - r.x0) * (r.y1 - r.y0)).sum();
        assert_eq!(cells, 16);
        assert!(rects.contains(&CellRect { x0: 2, y0: 0, x1: 4, y1: 2, z: 5 }));
        assert!(rects.iter().all(|r| r.z == 1 || r.z == 5));
    }

    #[test]
    fn test_border_only_field_is_empty() {
        let chf = compact(4, 2, &[]);
        assert!(merge_walkable_cells(&chf).is_empty());
    }
}
