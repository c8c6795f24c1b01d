use crate::types::{LayoutMode, PlacedPiece};

/// Tolerance for comparing accumulated float coordinates.
pub const EPSILON: f64 = 1e-9;

/// A full-width horizontal strip of a sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Shelf {
    pub y: f64,
    /// Height of the tallest piece placed on this shelf so far
    pub height: f64,
    /// X coordinate where the next piece on this shelf starts
    pub cursor: f64,
}

/// A run of the skyline: everything in `[x, x + width)` is occupied above `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Segment {
    pub x: f64,
    pub width: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum FreeSpace {
    Shelves(Vec<Shelf>),
    Skyline(Vec<Segment>),
}

/// Where a piece would go, together with the bookkeeping needed to commit it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Spot {
    ExistingShelf { index: usize, x: f64, y: f64 },
    NewShelf { y: f64 },
    Skyline { x: f64, y: f64 },
}

impl Spot {
    pub fn origin(&self) -> (f64, f64) {
        match *self {
            Spot::ExistingShelf { x, y, .. } => (x, y),
            Spot::NewShelf { y } => (0.0, y),
            Spot::Skyline { x, y } => (x, y),
        }
    }
}

/// Working state of one sheet while the packing pass runs.
#[derive(Debug, Clone)]
pub(super) struct OpenSheet {
    pub stock_index: usize,
    pub sheet_number: u32,
    pub width: f64,
    pub length: f64,
    kerf: f64,
    space: FreeSpace,
    pub placements: Vec<PlacedPiece>,
}

impl OpenSheet {
    pub fn new(
        stock_index: usize,
        sheet_number: u32,
        width: f64,
        length: f64,
        kerf: f64,
        mode: LayoutMode,
    ) -> Self {
        let space = match mode {
            LayoutMode::Guillotine => FreeSpace::Shelves(Vec::new()),
            LayoutMode::Nested => FreeSpace::Skyline(vec![Segment {
                x: 0.0,
                width,
                y: 0.0,
            }]),
        };
        Self {
            stock_index,
            sheet_number,
            width,
            length,
            kerf,
            space,
            placements: Vec::new(),
        }
    }

    /// Finds the first spot that holds a `width` x `length` piece as given.
    pub fn find_spot(&self, width: f64, length: f64) -> Option<Spot> {
        match &self.space {
            FreeSpace::Shelves(shelves) => self.find_on_shelves(shelves, width, length),
            FreeSpace::Skyline(segments) => self.find_on_skyline(segments, width, length),
        }
    }

    /// Records a piece at a spot previously returned by `find_spot`.
    /// Returns false, leaving the sheet untouched, when the spot belongs to the other layout.
    pub fn commit(&mut self, spot: Spot, mut piece: PlacedPiece) -> bool {
        let (x, y) = spot.origin();
        piece.x = x;
        piece.y = y;
        let kerf = self.kerf;
        let sheet_width = self.width;

        match (&mut self.space, spot) {
            (FreeSpace::Shelves(shelves), Spot::ExistingShelf { index, .. }) => {
                let shelf = &mut shelves[index];
                shelf.cursor = x + piece.width + kerf;
                shelf.height = shelf.height.max(piece.length);
            }
            (FreeSpace::Shelves(shelves), Spot::NewShelf { y }) => {
                shelves.push(Shelf {
                    y,
                    height: piece.length,
                    cursor: piece.width + kerf,
                });
            }
            (FreeSpace::Skyline(segments), Spot::Skyline { x, y }) => {
                let span_end = (x + piece.width + kerf).min(sheet_width);
                raise_skyline(segments, x, span_end, y + piece.length + kerf);
            }
            (space, spot) => {
                tracing::error!(?space, ?spot, "spot does not belong to this layout");
                return false;
            }
        }

        self.placements.push(piece);
        true
    }

    /// First shelf, top to bottom, with room left of the sheet edge. Only the
    /// bottom shelf may grow taller; otherwise a new shelf opens below it.
    fn find_on_shelves(&self, shelves: &[Shelf], width: f64, length: f64) -> Option<Spot> {
        let last = shelves.len().checked_sub(1);

        for (index, shelf) in shelves.iter().enumerate() {
            if shelf.cursor + width > self.width + EPSILON {
                continue;
            }
            let fits_height = length <= shelf.height + EPSILON
                || (Some(index) == last && shelf.y + length <= self.length + EPSILON);
            if fits_height {
                return Some(Spot::ExistingShelf {
                    index,
                    x: shelf.cursor,
                    y: shelf.y,
                });
            }
        }

        let y = shelves
            .last()
            .map_or(0.0, |s| s.y + s.height + self.kerf);
        if width <= self.width + EPSILON && y + length <= self.length + EPSILON {
            Some(Spot::NewShelf { y })
        } else {
            None
        }
    }

    /// Bottom-left rule over the skyline: lowest resting height wins, then leftmost.
    fn find_on_skyline(&self, segments: &[Segment], width: f64, length: f64) -> Option<Spot> {
        let mut best: Option<(f64, f64)> = None;

        for (start, segment) in segments.iter().enumerate() {
            let x = segment.x;
            if x + width > self.width + EPSILON {
                break;
            }

            // The kerf strip to the right has to rest on the skyline too.
            let span_end = (x + width + self.kerf).min(self.width);
            let y = segments[start..]
                .iter()
                .take_while(|s| s.x < span_end - EPSILON)
                .map(|s| s.y)
                .fold(0.0, f64::max);

            if y + length > self.length + EPSILON {
                continue;
            }
            match best {
                Some((_, best_y)) if y >= best_y - EPSILON => {}
                _ => best = Some((x, y)),
            }
        }

        best.map(|(x, y)| Spot::Skyline { x, y })
    }
}

/// Lifts `[from, to)` of the skyline to `y`, splitting and merging runs as needed.
fn raise_skyline(segments: &mut Vec<Segment>, from: f64, to: f64, y: f64) {
    let mut next = Vec::with_capacity(segments.len() + 2);

    for segment in segments.iter() {
        let end = segment.x + segment.width;
        if end <= from + EPSILON || segment.x >= to - EPSILON {
            next.push(*segment);
            continue;
        }
        if segment.x < from - EPSILON {
            next.push(Segment {
                x: segment.x,
                width: from - segment.x,
                y: segment.y,
            });
        }
        if end > to + EPSILON {
            next.push(Segment {
                x: to,
                width: end - to,
                y: segment.y,
            });
        }
    }

    let position = next
        .iter()
        .position(|s| s.x > from)
        .unwrap_or(next.len());
    next.insert(
        position,
        Segment {
            x: from,
            width: to - from,
            y,
        },
    );

    next.dedup_by(|right, left| {
        if (left.y - right.y).abs() <= EPSILON {
            left.width += right.width;
            true
        } else {
            false
        }
    });

    *segments = next;
}
