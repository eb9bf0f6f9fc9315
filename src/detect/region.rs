//! Iterative 4-connected region growing over a flat label arena.
//!
//! Each grown region receives a fresh label; label `0` means unvisited. Labels
//! double as the visited set, so a pixel is grown into at most one region per
//! detector pass.

/// Axis-aligned bounds and members of a grown region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub label: u32,
    pub pixels: Vec<usize>,
    pub min_x: usize,
    pub max_x: usize,
    pub min_y: usize,
    pub max_y: usize,
}

impl Region {
    pub fn area(&self) -> usize {
        self.pixels.len()
    }

    pub fn bbox_width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    pub fn bbox_height(&self) -> usize {
        self.max_y - self.min_y + 1
    }

    /// Longer bounding-box side over shorter side (always >= 1).
    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = (self.bbox_width() as f32, self.bbox_height() as f32);
        w.max(h) / w.min(h)
    }
}

pub struct RegionGrower {
    width: usize,
    height: usize,
    labels: Vec<u32>,
    next_label: u32,
    stack: Vec<usize>,
}

impl RegionGrower {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            labels: vec![0; width * height],
            next_label: 1,
            stack: Vec::new(),
        }
    }

    #[inline]
    pub fn is_visited(&self, idx: usize) -> bool {
        self.labels[idx] != 0
    }

    #[inline]
    pub fn label(&self, idx: usize) -> u32 {
        self.labels[idx]
    }

    /// Grow a region from `seed`. The seed always joins; a neighbor joins when
    /// it is unvisited and `accept(idx)` holds. Neighbors are pushed in the
    /// order (x+1, y), (x-1, y), (x, y+1), (x, y-1).
    ///
    /// Growth is not capped at 10,000 pixels: the region always holds every
    /// connected accepted pixel, and callers apply their own area bounds to the
    /// finished region. A cap would make the nebula (50,000) and galaxy
    /// (20,000) upper bounds unreachable.
    pub fn grow<F>(&mut self, seed: usize, accept: F) -> Region
    where
        F: Fn(usize) -> bool,
    {
        let label = self.next_label;
        self.next_label += 1;

        let (sx, sy) = (seed % self.width, seed / self.width);
        let mut region = Region {
            label,
            pixels: Vec::new(),
            min_x: sx,
            max_x: sx,
            min_y: sy,
            max_y: sy,
        };

        self.labels[seed] = label;
        self.stack.clear();
        self.stack.push(seed);

        while let Some(idx) = self.stack.pop() {
            let (x, y) = (idx % self.width, idx / self.width);
            region.pixels.push(idx);
            region.min_x = region.min_x.min(x);
            region.max_x = region.max_x.max(x);
            region.min_y = region.min_y.min(y);
            region.max_y = region.max_y.max(y);

            let neighbors = [
                (x + 1 < self.width).then(|| idx + 1),
                (x > 0).then(|| idx - 1),
                (y + 1 < self.height).then(|| idx + self.width),
                (y > 0).then(|| idx - self.width),
            ];
            for n in neighbors.into_iter().flatten() {
                if self.labels[n] == 0 && accept(n) {
                    self.labels[n] = label;
                    self.stack.push(n);
                }
            }
        }

        region
    }

    /// Count region pixels with fewer than eight same-region 8-neighbors.
    pub fn boundary_pixels(&self, region: &Region) -> usize {
        let (w, h) = (self.width as isize, self.height as isize);
        region
            .pixels
            .iter()
            .filter(|&&idx| {
                let (x, y) = ((idx % self.width) as isize, (idx / self.width) as isize);
                let mut same = 0;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let (nx, ny) = (x + dx, y + dy);
                        if nx >= 0
                            && ny >= 0
                            && nx < w
                            && ny < h
                            && self.labels[(ny * w + nx) as usize] == region.label
                        {
                            same += 1;
                        }
                    }
                }
                same < 8
            })
            .count()
    }
}
