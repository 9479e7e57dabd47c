// heightfield.rs - solid span heightfield, triangle rasterization and span filters
//
// Z is up. Columns are laid out on the XY plane (x fastest), span heights are
// measured in cell-height units above bmin[2].

/// Largest representable span height
pub(crate) const SPAN_MAX_HEIGHT: u32 = (1 << 13) - 1;

/// Open ceiling used by the filters
pub(crate) const MAX_HEIGHT: i32 = 0xffff;

/// Neighbour offsets: -x, +y, +x, -y
pub(crate) const DIR_OFFSET_X: [i32; 4] = [-1, 0, 1, 0];
pub(crate) const DIR_OFFSET_Y: [i32; 4] = [0, 1, 0, -1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub smin: u32,
    pub smax: u32,
    pub walkable: bool,
}

pub(crate) struct Heightfield {
    pub width: usize,
    pub height: usize,
    pub bmin: [f32; 3],
    pub bmax: [f32; 3],
    pub cs: f32,
    pub ch: f32,
    /// Per column, sorted bottom-up and never overlapping
    columns: Vec<Vec<Span>>,
}

impl Heightfield {
    pub fn new(width: usize, height: usize, bmin: [f32; 3], bmax: [f32; 3], cs: f32, ch: f32) -> Self {
        Self {
            width,
            height,
            bmin,
            bmax,
            cs,
            ch,
            columns: vec![Vec::new(); width * height],
        }
    }

    pub fn column(&self, x: usize, y: usize) -> &[Span] {
        &self.columns[x + y * self.width]
    }

    pub fn span_count(&self) -> usize {
        self.columns.iter().map(Vec::len).sum()
    }

    /// Insert a span, merging it with every span it overlaps. When the merged
    /// top lies within `merge_threshold` of an absorbed span's top, the
    /// walkable flag survives the merge.
    pub fn add_span(&mut self, x: usize, y: usize, smin: u32, smax: u32, walkable: bool, merge_threshold: u32) {
        let column = &mut self.columns[x + y * self.width];
        let mut new_span = Span { smin, smax, walkable };

        let mut i = 0;
        while i < column.len() {
            let cur = column[i];
            if cur.smin > new_span.smax {
                break;
            }
            if cur.smax < new_span.smin {
                i += 1;
                continue;
            }

            new_span.smin = new_span.smin.min(cur.smin);
            new_span.smax = new_span.smax.max(cur.smax);
            if new_span.smax.abs_diff(cur.smax) <= merge_threshold {
                new_span.walkable |= cur.walkable;
            }
            column.remove(i);
        }

        column.insert(i, new_span);
    }

    /// Rasterize one world-space triangle into every column it touches
    pub fn rasterize_triangle(&mut self, tri: &[[f32; 3]; 3], walkable: bool, merge_threshold: u32) {
        let mut tmin = tri[0];
        let mut tmax = tri[0];
        for v in &tri[1..] {
            for axis in 0..3 {
                tmin[axis] = tmin[axis].min(v[axis]);
                tmax[axis] = tmax[axis].max(v[axis]);
            }
        }

        if !overlap_bounds(&tmin, &tmax, &self.bmin, &self.bmax) {
            return;
        }

        let w = self.width as i32;
        let h = self.height as i32;
        let by = self.bmax[2] - self.bmin[2];
        let ics = 1.0 / self.cs;
        let ich = 1.0 / self.ch;

        let y0 = (((tmin[1] - self.bmin[1]) * ics).floor() as i32).clamp(-1, h - 1);
        let y1 = (((tmax[1] - self.bmin[1]) * ics).floor() as i32).clamp(0, h - 1);

        let mut rest: Vec<[f32; 3]> = tri.to_vec();
        for y in y0..=y1 {
            let cy = self.bmin[1] + y as f32 * self.cs;
            let (row, remaining) = divide_poly(&rest, cy + self.cs, 1);
            rest = remaining;
            if row.len() < 3 || y < 0 {
                continue;
            }

            let mut min_x = row[0][0];
            let mut max_x = row[0][0];
            for v in &row[1..] {
                min_x = min_x.min(v[0]);
                max_x = max_x.max(v[0]);
            }
            let x0 = ((min_x - self.bmin[0]) * ics).floor() as i32;
            let x1 = ((max_x - self.bmin[0]) * ics).floor() as i32;
            if x1 < 0 || x0 >= w {
                continue;
            }
            let x0 = x0.clamp(-1, w - 1);
            let x1 = x1.clamp(0, w - 1);

            let mut row_rest = row;
            for x in x0..=x1 {
                let cx = self.bmin[0] + x as f32 * self.cs;
                let (cell, remaining) = divide_poly(&row_rest, cx + self.cs, 0);
                row_rest = remaining;
                if cell.len() < 3 || x < 0 {
                    continue;
                }

                let mut smin = cell[0][2];
                let mut smax = cell[0][2];
                for v in &cell[1..] {
                    smin = smin.min(v[2]);
                    smax = smax.max(v[2]);
                }
                smin -= self.bmin[2];
                smax -= self.bmin[2];

                // Skip the span if it is completely outside the heightfield
                if smax < 0.0 || smin > by {
                    continue;
                }
                let smin = smin.max(0.0);
                let smax = smax.min(by);

                let ismin = ((smin * ich).floor() as u32).min(SPAN_MAX_HEIGHT - 1);
                let ismax = ((smax * ich).ceil() as u32).clamp(ismin + 1, SPAN_MAX_HEIGHT);

                self.add_span(x as usize, y as usize, ismin, ismax, walkable, merge_threshold);
            }
        }
    }

    /// Unwalkable spans whose top is within `walkable_climb` of a walkable
    /// span directly below become walkable (kerbs, stair nosings).
    pub fn filter_low_hanging_walkable_obstacles(&mut self, walkable_climb: u32) {
        for column in self.columns.iter_mut() {
            let mut previous: Option<(u32, bool)> = None;
            for span in column.iter_mut() {
                let walkable = span.walkable;
                if !walkable
                    && let Some((prev_smax, true)) = previous
                    && span.smax.abs_diff(prev_smax) <= walkable_climb
                {
                    span.walkable = true;
                }
                previous = Some((span.smax, walkable));
            }
        }
    }

    /// Mark spans next to a drop deeper than `walkable_climb` (or spanning a
    /// too steep range of reachable neighbours) as unwalkable.
    pub fn filter_ledge_spans(&mut self, walkable_height: u32, walkable_climb: u32) {
        let w = self.width as i32;
        let h = self.height as i32;
        let walkable_height = walkable_height as i32;
        let walkable_climb = walkable_climb as i32;

        let mut ledges = Vec::new();

        for y in 0..h {
            for x in 0..w {
                let column = &self.columns[(x + y * w) as usize];
                for (si, span) in column.iter().enumerate() {
                    if !span.walkable {
                        continue;
                    }

                    let bot = span.smax as i32;
                    let top = column.get(si + 1).map_or(MAX_HEIGHT, |n| n.smin as i32);

                    let mut min_neighbor_height = MAX_HEIGHT;
                    let mut accessible_min = bot;
                    let mut accessible_max = bot;

                    for dir in 0..4 {
                        let dx = x + DIR_OFFSET_X[dir];
                        let dy = y + DIR_OFFSET_Y[dir];
                        if dx < 0 || dy < 0 || dx >= w || dy >= h {
                            min_neighbor_height = min_neighbor_height.min(-walkable_climb - bot);
                            continue;
                        }

                        let neighbors = &self.columns[(dx + dy * w) as usize];

                        // The open space below the lowest neighbour span
                        let nbot = -walkable_climb;
                        let ntop = neighbors.first().map_or(MAX_HEIGHT, |n| n.smin as i32);
                        if top.min(ntop) - bot.max(nbot) > walkable_height {
                            min_neighbor_height = min_neighbor_height.min(nbot - bot);
                        }

                        for (ni, neighbor) in neighbors.iter().enumerate() {
                            let nbot = neighbor.smax as i32;
                            let ntop = neighbors.get(ni + 1).map_or(MAX_HEIGHT, |n| n.smin as i32);
                            if top.min(ntop) - bot.max(nbot) > walkable_height {
                                min_neighbor_height = min_neighbor_height.min(nbot - bot);
                                if (nbot - bot).abs() <= walkable_climb {
                                    accessible_min = accessible_min.min(nbot);
                                    accessible_max = accessible_max.max(nbot);
                                }
                            }
                        }
                    }

                    if min_neighbor_height < -walkable_climb
                        || accessible_max - accessible_min > walkable_climb
                    {
                        ledges.push(((x + y * w) as usize, si));
                    }
                }
            }
        }

        for (col, si) in ledges {
            self.columns[col][si].walkable = false;
        }
    }

    /// Spans without `walkable_height` of clearance above them are unwalkable
    pub fn filter_walkable_low_height_spans(&mut self, walkable_height: u32) {
        for column in self.columns.iter_mut() {
            for si in 0..column.len() {
                let bot = column[si].smax as i32;
                let top = column.get(si + 1).map_or(MAX_HEIGHT, |n| n.smin as i32);
                if top - bot < walkable_height as i32 {
                    column[si].walkable = false;
                }
            }
        }
    }
}

fn overlap_bounds(amin: &[f32; 3], amax: &[f32; 3], bmin: &[f32; 3], bmax: &[f32; 3]) -> bool {
    (0..3).all(|axis| amin[axis] <= bmax[axis] && amax[axis] >= bmin[axis])
}

/// Split a convex polygon by the plane `v[axis] == line`. The first polygon
/// keeps the part at or below the line, the second the rest.
pub(crate) fn divide_poly(poly: &[[f32; 3]], line: f32, axis: usize) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let mut below = Vec::with_capacity(poly.len() + 2);
    let mut above = Vec::with_capacity(poly.len() + 2);
    let n = poly.len();

    for i in 0..n {
        let j = if i == 0 { n - 1 } else { i - 1 };
        let a = poly[j];
        let b = poly[i];
        let da = line - a[axis];
        let db = line - b[axis];

        if (da >= 0.0) != (db >= 0.0) {
            let s = da / (da - db);
            let p = [
                a[0] + (b[0] - a[0]) * s,
                a[1] + (b[1] - a[1]) * s,
                a[2] + (b[2] - a[2]) * s,
            ];
            below.push(p);
            above.push(p);
            if db > 0.0 {
                below.push(b);
            } else if db < 0.0 {
                above.push(b);
            }
            continue;
        }

        if db >= 0.0 {
            below.push(b);
            if db != 0.0 {
                continue;
            }
        }
        above.push(b);
    }

    (below, above)
}
