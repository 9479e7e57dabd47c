// compact.rs - open-space (compact) heightfield and walkable-area erosion

use std::ops::Range;

use super::heightfield::{DIR_OFFSET_X, DIR_OFFSET_Y, Heightfield, MAX_HEIGHT};

/// Floor of an open span: `z` is the floor height, `h` the clearance above it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CompactSpan {
    pub z: u32,
    pub h: u32,
    /// Index of the connected span in each direction (-x, +y, +x, -y)
    pub con: [Option<usize>; 4],
    pub walkable: bool,
}

pub(crate) struct CompactHeightfield {
    pub width: usize,
    pub height: usize,
    pub border_size: usize,
    pub bmin: [f32; 3],
    pub cs: f32,
    pub ch: f32,
    cells: Vec<Range<usize>>,
    pub spans: Vec<CompactSpan>,
}

impl CompactHeightfield {
    /// Collect the walkable floors of `hf` and link each one to the
    /// neighbouring floors an agent can step onto.
    pub fn build(hf: &Heightfield, walkable_height: u32, walkable_climb: u32, border_size: u32) -> Self {
        let mut cells = Vec::with_capacity(hf.width * hf.height);
        let mut spans = Vec::new();

        for y in 0..hf.height {
            for x in 0..hf.width {
                let column = hf.column(x, y);
                let start = spans.len();
                for (si, span) in column.iter().enumerate() {
                    if !span.walkable {
                        continue;
                    }
                    let bot = span.smax as i32;
                    let top = column.get(si + 1).map_or(MAX_HEIGHT, |n| n.smin as i32);
                    spans.push(CompactSpan {
                        z: span.smax,
                        h: (top - bot).max(0) as u32,
                        con: [None; 4],
                        walkable: true,
                    });
                }
                cells.push(start..spans.len());
            }
        }

        let mut chf = Self {
            width: hf.width,
            height: hf.height,
            border_size: border_size as usize,
            bmin: hf.bmin,
            cs: hf.cs,
            ch: hf.ch,
            cells,
            spans,
        };
        chf.connect(walkable_height, walkable_climb);
        chf
    }

    fn connect(&mut self, walkable_height: u32, walkable_climb: u32) {
        let w = self.width as i32;
        let h = self.height as i32;

        for y in 0..h {
            for x in 0..w {
                for i in self.cells[(x + y * w) as usize].clone() {
                    let span = self.spans[i];
                    for dir in 0..4 {
                        let nx = x + DIR_OFFSET_X[dir];
                        let ny = y + DIR_OFFSET_Y[dir];
                        if nx < 0 || ny < 0 || nx >= w || ny >= h {
                            continue;
                        }
                        for k in self.cells[(nx + ny * w) as usize].clone() {
                            let neighbor = self.spans[k];
                            let bot = span.z.max(neighbor.z);
                            let top = (span.z + span.h).min(neighbor.z + neighbor.h);
                            if top >= bot
                                && top - bot >= walkable_height
                                && span.z.abs_diff(neighbor.z) <= walkable_climb
                            {
                                self.spans[i].con[dir] = Some(k);
                                break;
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn cell(&self, x: usize, y: usize) -> Range<usize> {
        self.cells[x + y * self.width].clone()
    }

    pub fn walkable_count(&self) -> usize {
        self.spans.iter().filter(|s| s.walkable).count()
    }

    /// Walkable neighbour of span `i` in `dir`
    pub fn walkable_neighbor(&self, i: usize, dir: usize) -> Option<usize> {
        self.spans[i].con[dir].filter(|&n| self.spans[n].walkable)
    }

    /// Shrink the walkable area by `radius` cells using a two-pass chamfer
    /// distance to the nearest boundary span.
    pub fn erode_walkable_area(&mut self, radius: u32) {
        let count = self.spans.len();
        let mut dist = vec![u8::MAX; count];

        // Boundary: unwalkable or missing any of the four walkable neighbours
        for (i, d) in dist.iter_mut().enumerate() {
            if !self.spans[i].walkable {
                *d = 0;
                continue;
            }
            let connected = (0..4).filter(|&dir| self.walkable_neighbor(i, dir).is_some()).count();
            if connected != 4 {
                *d = 0;
            }
        }

        let relax = |dist: &mut [u8], i: usize, from: usize, cost: u8| {
            let nd = dist[from].saturating_add(cost);
            if nd < dist[i] {
                dist[i] = nd;
            }
        };

        // Pass 1: (-x, -y) sweep
        for y in 0..self.height {
            for x in 0..self.width {
                for i in self.cell(x, y) {
                    if let Some(a) = self.spans[i].con[0] {
                        relax(&mut dist, i, a, 2);
                        if let Some(aa) = self.spans[a].con[3] {
                            relax(&mut dist, i, aa, 3);
                        }
                    }
                    if let Some(a) = self.spans[i].con[3] {
                        relax(&mut dist, i, a, 2);
                        if let Some(aa) = self.spans[a].con[2] {
                            relax(&mut dist, i, aa, 3);
                        }
                    }
                }
            }
        }

        // Pass 2: (+x, +y) sweep
        for y in (0..self.height).rev() {
            for x in (0..self.width).rev() {
                for i in self.cell(x, y) {
                    if let Some(a) = self.spans[i].con[2] {
                        relax(&mut dist, i, a, 2);
                        if let Some(aa) = self.spans[a].con[1] {
                            relax(&mut dist, i, aa, 3);
                        }
                    }
                    if let Some(a) = self.spans[i].con[1] {
                        relax(&mut dist, i, a, 2);
                        if let Some(aa) = self.spans[a].con[0] {
                            relax(&mut dist, i, aa, 3);
                        }
                    }
                }
            }
        }

        let threshold = (radius * 2).min(u8::MAX as u32) as u8;
        for (span, d) in self.spans.iter_mut().zip(dist) {
            if d < threshold {
                span.walkable = false;
            }
        }
    }
}
