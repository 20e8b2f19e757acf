use std::fmt;
use std::io::{Error, Result};

use enumset::EnumSet;

use crate::Direction;

/// 2D grid map represented as a bit array.
///
/// We use `false` to represent non-traversable cells and `true` to represent traversable cells.
///
/// The grid map is padded with an additional row above and below, as well as an additional column
/// to the left and right. Attempts to write to these cells will panic, but reads will succeed and
/// return non-traversable.
#[derive(Clone, PartialEq, Eq)]
pub struct BitGrid {
    width: i32,
    height: i32,
    padded_width_bytes: usize,
    bits: Box<[u8]>,
}

impl BitGrid {
    /// Creates a grid with every cell non-traversable.
    #[track_caller]
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width >= 0, "width must be non-negative");
        assert!(height >= 0, "height must be non-negative");
        assert!(width < 2_000_000_000, "width must be < 2000000000");
        assert!(height < 2_000_000_000, "height must be < 2000000000");
        // Every row is rounded up to whole bytes and keeps at least one padding column, which is
        // shared between the right edge of a row and the left edge of the next one.
        let padded_width_bytes = (width / 8 + 1) as usize;
        let bytes = padded_width_bytes
            // height + 2 for a padding row above and a padding row below
            .checked_mul((height + 2) as usize)
            // +1 for the bottom-right padding corner
            .and_then(|b| b.checked_add(1))
            .expect("number of bytes in grid exceeds usize::MAX");
        BitGrid {
            width,
            height,
            padded_width_bytes,
            bits: vec![0; bytes].into_boxed_slice(),
        }
    }

    /// Parses a map drawn with one character per cell, one row per line.
    ///
    /// `.`, `G` and `S` are traversable; any other character is an obstacle. Leading and
    /// trailing blank lines are ignored and every row must have the same length.
    pub fn from_ascii(text: &str) -> Result<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .skip_while(|row| row.is_empty())
            .collect();
        let rows = match rows.iter().rposition(|row| !row.is_empty()) {
            Some(last) => &rows[..=last],
            None => &[][..],
        };
        let width = rows.first().map_or(0, |row| row.chars().count());
        if let Some(y) = rows.iter().position(|row| row.chars().count() != width) {
            return Err(Error::other(format!(
                "row {y} has length {}, expected {width}",
                rows[y].chars().count()
            )));
        }
        let mut map = BitGrid::new(
            width.try_into().map_err(Error::other)?,
            rows.len().try_into().map_err(Error::other)?,
        );
        for (y, row) in rows.iter().enumerate() {
            for (x, cell) in row.chars().enumerate() {
                map.set(x as i32, y as i32, is_traversable_char(cell));
            }
        }
        Ok(map)
    }

    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Whether `(x, y)` lies inside the unpadded grid.
    #[inline(always)]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    #[track_caller]
    #[inline(always)]
    pub fn get(&self, x: i32, y: i32) -> bool {
        self.padded_bounds_check(x, y);
        unsafe { self.get_unchecked(x, y) }
    }

    /// Traversability of a cell; cells outside the grid are non-traversable.
    #[inline(always)]
    pub fn is_traversable(&self, (x, y): (i32, i32)) -> bool {
        self.in_bounds(x, y) && unsafe { self.get_unchecked(x, y) }
    }

    #[track_caller]
    #[inline(always)]
    pub fn set(&mut self, x: i32, y: i32, traversable: bool) {
        self.unpadded_bounds_check(x, y);
        unsafe {
            self.set_unchecked(x, y, traversable);
        }
    }

    /// Every traversable cell, row by row.
    pub fn traversable_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| unsafe { self.get_unchecked(x, y) })
    }

    /// Directions in which the adjacent cell is traversable.
    #[track_caller]
    #[inline(always)]
    pub fn get_neighborhood(&self, x: i32, y: i32) -> EnumSet<Direction> {
        self.unpadded_bounds_check(x, y);
        let mut nbhood = EnumSet::empty();
        for dir in EnumSet::<Direction>::all() {
            let (nx, ny) = dir.step((x, y));
            // SAFETY: We checked that the coordinates are unpadded in-bounds, so coordinates
            //         within 1 cell in each direction are padded in-bounds, as required.
            if unsafe { self.get_unchecked(nx, ny) } {
                nbhood |= dir;
            }
        }
        nbhood
    }

    /// Gets the traversability of a cell without bounds checking.
    ///
    /// # Safety
    /// The coordinates must be in-bounds of the padded grid. Specifically:
    /// - `x` is in `-1..=self.width()`
    /// - `y` is in `-1..=self.height()`
    #[inline(always)]
    #[cfg_attr(debug_assertions, track_caller)]
    pub unsafe fn get_unchecked(&self, x: i32, y: i32) -> bool {
        #[cfg(debug_assertions)]
        self.padded_bounds_check(x, y);
        let (byte, bit) = self.index(x, y);
        unsafe {
            // SAFETY: The caller is responsible for ensuring that the coordinates are in-bounds.
            *self.bits.get_unchecked(byte) & 1 << bit != 0
        }
    }

    /// Sets the traversability of a cell without bounds checking.
    ///
    /// # Safety
    /// The coordinates must be in-bounds of the grid. Specifically:
    /// - `x` is in `0..self.width()`
    /// - `y` is in `0..self.height()`
    #[inline(always)]
    #[cfg_attr(debug_assertions, track_caller)]
    pub unsafe fn set_unchecked(&mut self, x: i32, y: i32, traversable: bool) {
        #[cfg(debug_assertions)]
        self.unpadded_bounds_check(x, y);
        let (byte, bit) = self.index(x, y);
        unsafe {
            // SAFETY: The caller is responsible for ensuring that the coordinates are in-bounds.
            *self.bits.get_unchecked_mut(byte) &= !(1 << bit);
            *self.bits.get_unchecked_mut(byte) |= (traversable as u8) << bit;
        }
    }

    #[track_caller]
    #[inline(always)]
    fn padded_bounds_check(&self, x: i32, y: i32) {
        assert!(x >= -1, "x out of bounds");
        assert!(y >= -1, "y out of bounds");
        assert!(x <= self.width, "x out of bounds");
        assert!(y <= self.height, "y out of bounds");
    }

    #[track_caller]
    #[inline(always)]
    fn unpadded_bounds_check(&self, x: i32, y: i32) {
        assert!(x >= 0, "x out of bounds");
        assert!(y >= 0, "y out of bounds");
        assert!(x < self.width, "x out of bounds");
        assert!(y < self.height, "y out of bounds");
    }

    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> (usize, usize) {
        let padded_y = (y + 1) as usize;
        let padded_x = (x + 1) as usize;
        let bit = padded_x % 8;
        let byte = padded_x / 8 + padded_y * self.padded_width_bytes;
        (byte, bit)
    }
}

pub(crate) fn is_traversable_char(cell: char) -> bool {
    matches!(cell, '.' | 'G' | 'S')
}

impl fmt::Debug for BitGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                f.write_str(if self.get(x, y) { "." } else { "@" })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}
