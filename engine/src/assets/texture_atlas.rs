use glam::Vec2;
use serde::{Deserialize, Serialize};

// Keeps samples away from the neighboring tiles
const TILE_INSET: f32 = 0.0001;

/// Tile layout of the block texture atlas. Tiles are numbered row-major from the top left.
/// Only the UV mapping lives here, the image itself belongs to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureAtlasLayout {
    pub rows: u16,
    pub columns: u16,
}

impl Default for TextureAtlasLayout {
    fn default() -> Self {
        TextureAtlasLayout {
            rows: 4,
            columns: 4,
        }
    }
}

impl TextureAtlasLayout {
    pub fn new(rows: u16, columns: u16) -> Self {
        assert!(
            rows > 0 && columns > 0,
            "Texture atlas must have at least one tile"
        );
        TextureAtlasLayout { rows, columns }
    }

    pub fn capacity(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    pub fn contains(&self, index: u16) -> bool {
        (index as usize) < self.capacity()
    }

    /// UVs of a tile for the four corners of a face, in the order
    /// (left, bottom), (right, bottom), (right, top), (left, top).
    pub fn tile_uvs(&self, index: u16) -> [Vec2; 4] {
        assert!(
            self.contains(index),
            "Texture index {} is outside of the {}x{} atlas",
            index,
            self.columns,
            self.rows
        );

        let columns = self.columns as f32;
        let rows = self.rows as f32;

        let left = (index % self.columns) as f32 / columns + TILE_INSET;
        let top = (index / self.columns) as f32 / rows + TILE_INSET;
        let right = left + 1.0 / columns - TILE_INSET * 2.0;
        let bottom = top + 1.0 / rows - TILE_INSET * 2.0;

        [
            Vec2::new(left, bottom),
            Vec2::new(right, bottom),
            Vec2::new(right, top),
            Vec2::new(left, top),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Vec2, expected: Vec2) {
        assert!(
            actual.abs_diff_eq(expected, 1e-6),
            "Expected {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_tile_uvs_are_inset() {
        let atlas = TextureAtlasLayout::new(2, 2);

        let [left_bottom, right_bottom, right_top, left_top] = atlas.tile_uvs(0);
        assert_close(left_top, Vec2::new(0.0001, 0.0001));
        assert_close(right_bottom, Vec2::new(0.4999, 0.4999));
        assert_close(left_bottom, Vec2::new(0.0001, 0.4999));
        assert_close(right_top, Vec2::new(0.4999, 0.0001));
    }

    #[test]
    fn test_tiles_are_row_major() {
        let atlas = TextureAtlasLayout::new(2, 4);

        // Second tile of the second row
        let [_, _, _, left_top] = atlas.tile_uvs(5);
        assert_close(left_top, Vec2::new(0.2501, 0.5001));
    }

    #[test]
    #[should_panic]
    fn test_index_outside_atlas_panics() {
        TextureAtlasLayout::new(2, 2).tile_uvs(4);
    }
}
