/// Dense row-major storage with one value per grid cell.
pub struct Grid<T> {
    width: i32,
    height: i32,
    cells: Box<[T]>,
}

impl<T> Grid<T> {
    /// Creates a grid whose cell `(x, y)` is initialized to `f(x, y)`.
    #[track_caller]
    pub fn new(width: i32, height: i32, mut f: impl FnMut(i32, i32) -> T) -> Self {
        assert!(width >= 0, "width must be non-negative");
        assert!(height >= 0, "height must be non-negative");
        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Grid {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline(always)]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        // SAFETY: Checked just above.
        self.in_bounds(x, y)
            .then(|| unsafe { self.get_unchecked(x, y) })
    }

    pub fn storage_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Returns a reference to a cell of the grid, without bounds checking.
    ///
    /// # Safety
    /// The coordinates must be in-bounds of the grid. Specifically:
    /// - `x` is in `0..self.width()`
    /// - `y` is in `0..self.height()`
    #[inline(always)]
    #[cfg_attr(debug_assertions, track_caller)]
    pub unsafe fn get_unchecked(&self, x: i32, y: i32) -> &T {
        #[cfg(debug_assertions)]
        self.bounds_check(x, y);
        unsafe { self.cells.get_unchecked(self.index(x, y)) }
    }

    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> usize {
        self.width as usize * y as usize + x as usize
    }

    #[track_caller]
    #[inline(always)]
    fn bounds_check(&self, x: i32, y: i32) {
        assert!(x >= 0, "x out of bounds");
        assert!(y >= 0, "y out of bounds");
        assert!(x < self.width, "x out of bounds");
        assert!(y < self.height, "y out of bounds");
    }
}

impl<T> std::ops::Index<(i32, i32)> for Grid<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, (x, y): (i32, i32)) -> &T {
        self.bounds_check(x, y);
        unsafe { self.get_unchecked(x, y) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_are_row_major() {
        let grid = Grid::new(3, 2, |x, y| x + 10 * y);
        assert_eq!(grid[(2, 0)], 2);
        assert_eq!(grid[(0, 1)], 10);
        assert_eq!(grid.get(2, 1), Some(&12));
        assert_eq!(grid.get(3, 1), None);
        assert_eq!(grid.get(0, -1), None);
    }
}
