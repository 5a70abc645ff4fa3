use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::{
  allocator::Allocator,
  block::MemoryBlock,
  error::AllocError,
};

/// An 8-bit RGBA pixel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl Color {
  pub const RED: Color = Color::rgb(255, 0, 0);
  pub const GREEN: Color = Color::rgb(0, 255, 0);
  pub const GREEN_BLUE: Color = Color::rgb(78, 201, 176);
  pub const BLUE: Color = Color::rgb(0, 0, 255);
  pub const WHITE: Color = Color::rgb(255, 255, 255);
  pub const BLACK: Color = Color::rgb(0, 0, 0);
  pub const DARK_GREY: Color = Color::rgb(30, 30, 30);

  pub const fn new(
    r: u8,
    g: u8,
    b: u8,
    a: u8,
  ) -> Self {
    Self { r, g, b, a }
  }

  /// An opaque colour.
  pub const fn rgb(
    r: u8,
    g: u8,
    b: u8,
  ) -> Self {
    Self::new(r, g, b, 255)
  }
}

/// A rectangle in pixel coordinates. The origin may lie outside the bitmap it
/// is applied to; operations clip it first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
  pub x: i32,
  pub y: i32,
  pub width: u32,
  pub height: u32,
}

impl Rect {
  pub const fn new(
    x: i32,
    y: i32,
    width: u32,
    height: u32,
  ) -> Self {
    Self { x, y, width, height }
  }

  /// Intersects `self` with a `width` x `height` surface at the origin.
  /// Returns `(x0, y0, x1, y1)` as half-open bounds, or `None` if nothing
  /// remains.
  fn clip(
    &self,
    width: usize,
    height: usize,
  ) -> Option<(usize, usize, usize, usize)> {
    let x0 = i64::from(self.x).max(0);
    let y0 = i64::from(self.y).max(0);
    let x1 = (i64::from(self.x) + i64::from(self.width)).min(width as i64);
    let y1 = (i64::from(self.y) + i64::from(self.height)).min(height as i64);

    if x0 >= x1 || y0 >= y1 {
      return None;
    }
    Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
  }
}

fn pixel_bytes(
  width: usize,
  height: usize,
  pixel: usize,
) -> Result<usize, AllocError> {
  width
    .checked_mul(height)
    .and_then(|n| n.checked_mul(pixel))
    .ok_or(AllocError::CapacityOverflow)
}

/// A one-byte-per-pixel mask, typically a rasterised glyph. Zero means
/// transparent.
pub struct Bitmap<'a> {
  allocator: &'a dyn Allocator,
  block: MemoryBlock,
  width: usize,
  height: usize,
}

impl<'a> Bitmap<'a> {
  /// Allocates a cleared `width` x `height` mask from `allocator`.
  pub fn new_in(
    width: usize,
    height: usize,
    allocator: &'a dyn Allocator,
  ) -> Result<Self, AllocError> {
    let block = allocator.allocate(pixel_bytes(width, height, 1)?)?;
    Ok(Self {
      allocator,
      block,
      width,
      height,
    })
  }

  /// Allocates a mask and copies `pixels`, given row by row.
  ///
  /// # Panics
  ///
  /// Panics if `pixels.len() != width * height`.
  #[track_caller]
  pub fn from_pixels_in(
    width: usize,
    height: usize,
    pixels: &[u8],
    allocator: &'a dyn Allocator,
  ) -> Result<Self, AllocError> {
    let mut bitmap = Self::new_in(width, height, allocator)?;
    bitmap.pixels_mut().copy_from_slice(pixels);
    Ok(bitmap)
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn pixels(&self) -> &[u8] {
    unsafe { self.block.as_slice() }
  }

  pub fn pixels_mut(&mut self) -> &mut [u8] {
    unsafe { self.block.as_mut_slice() }
  }

  pub fn get(
    &self,
    x: usize,
    y: usize,
  ) -> Option<u8> {
    (x < self.width && y < self.height).then(|| self.pixels()[y * self.width + x])
  }

  pub fn fill_rect(
    &mut self,
    rect: Rect,
    value: u8,
  ) {
    let Some((x0, y0, x1, y1)) = rect.clip(self.width, self.height) else {
      return;
    };
    let width = self.width;
    let pixels = self.pixels_mut();
    for y in y0..y1 {
      pixels[y * width + x0..y * width + x1].fill(value);
    }
  }
}

impl Drop for Bitmap<'_> {
  fn drop(&mut self) {
    self.allocator.free(&mut self.block);
  }
}

impl fmt::Debug for Bitmap<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Bitmap")
      .field("width", &self.width)
      .field("height", &self.height)
      .finish_non_exhaustive()
  }
}

/// An RGBA surface.
pub struct ColorBitmap<'a> {
  allocator: &'a dyn Allocator,
  block: MemoryBlock,
  width: usize,
  height: usize,
}

impl<'a> ColorBitmap<'a> {
  /// Allocates a `width` x `height` surface from `allocator`, every pixel
  /// transparent black.
  pub fn new_in(
    width: usize,
    height: usize,
    allocator: &'a dyn Allocator,
  ) -> Result<Self, AllocError> {
    let block = allocator.allocate(pixel_bytes(width, height, size_of::<Color>())?)?;
    log::trace!("color bitmap {width}x{height} at {:p}", block.data());
    Ok(Self {
      allocator,
      block,
      width,
      height,
    })
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn pixels(&self) -> &[Color] {
    bytemuck::cast_slice(unsafe { self.block.as_slice() })
  }

  pub fn pixels_mut(&mut self) -> &mut [Color] {
    bytemuck::cast_slice_mut(unsafe { self.block.as_mut_slice() })
  }

  pub fn get(
    &self,
    x: usize,
    y: usize,
  ) -> Option<Color> {
    (x < self.width && y < self.height).then(|| self.pixels()[y * self.width + x])
  }

  pub fn clear(
    &mut self,
    color: Color,
  ) {
    self.pixels_mut().fill(color);
  }

  pub fn fill_rect(
    &mut self,
    rect: Rect,
    color: Color,
  ) {
    let Some((x0, y0, x1, y1)) = rect.clip(self.width, self.height) else {
      return;
    };
    let width = self.width;
    let pixels = self.pixels_mut();
    for y in y0..y1 {
      pixels[y * width + x0..y * width + x1].fill(color);
    }
  }

  /// Copies `src` so its top-left corner lands at `(rect.x, rect.y)`. At most
  /// `rect.width` x `rect.height` pixels are copied, fewer if `src` is smaller
  /// or the destination clips them.
  pub fn blit(
    &mut self,
    rect: Rect,
    src: &ColorBitmap<'_>,
  ) {
    let rect = Rect {
      width: rect.width.min(u32::try_from(src.width).unwrap_or(u32::MAX)),
      height: rect.height.min(u32::try_from(src.height).unwrap_or(u32::MAX)),
      ..rect
    };
    let Some((x0, y0, x1, y1)) = rect.clip(self.width, self.height) else {
      return;
    };

    let sx0 = (x0 as i64 - i64::from(rect.x)) as usize;
    let sy0 = (y0 as i64 - i64::from(rect.y)) as usize;
    let (width, src_width) = (self.width, src.width);
    let source = src.pixels();
    let pixels = self.pixels_mut();

    for (row, y) in (y0..y1).enumerate() {
      let from = (sy0 + row) * src_width + sx0;
      pixels[y * width + x0..y * width + x1].copy_from_slice(&source[from..from + (x1 - x0)]);
    }
  }

  /// Paints `color` wherever `mask` is non-zero, with the mask's top-left
  /// corner placed at `(rect.x, rect.y)`.
  pub fn fill_masked(
    &mut self,
    rect: Rect,
    mask: &Bitmap<'_>,
    color: Color,
  ) {
    let Some((x0, y0, x1, y1)) = rect.clip(self.width, self.height) else {
      return;
    };

    let width = self.width;
    let pixels = self.pixels_mut();
    for y in y0..y1 {
      let my = (y as i64 - i64::from(rect.y)) as usize;
      for x in x0..x1 {
        let mx = (x as i64 - i64::from(rect.x)) as usize;
        if mask.get(mx, my).is_some_and(|m| m != 0) {
          pixels[y * width + x] = color;
        }
      }
    }
  }
}

impl Drop for ColorBitmap<'_> {
  fn drop(&mut self) {
    self.allocator.free(&mut self.block);
  }
}

impl fmt::Debug for ColorBitmap<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("ColorBitmap")
      .field("width", &self.width)
      .field("height", &self.height)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ArenaAllocator, HeapAllocator};

  fn count(
    bitmap: &ColorBitmap<'_>,
    color: Color,
  ) -> usize {
    bitmap.pixels().iter().filter(|&&p| p == color).count()
  }

  #[test]
  fn named_colors() {
    assert_eq!(Color::RED, Color::new(255, 0, 0, 255));
    assert_eq!(Color::GREEN, Color::new(0, 255, 0, 255));
    assert_eq!(Color::GREEN_BLUE, Color::new(78, 201, 176, 255));
    assert_eq!(Color::BLUE, Color::new(0, 0, 255, 255));
    assert_eq!(Color::WHITE, Color::new(255, 255, 255, 255));
    assert_eq!(Color::BLACK, Color::new(0, 0, 0, 255));
    assert_eq!(Color::DARK_GREY, Color::new(30, 30, 30, 255));
  }

  #[test]
  fn new_bitmap_is_transparent() {
    let heap = HeapAllocator::new();
    let bitmap = ColorBitmap::new_in(4, 3, &heap).unwrap();

    assert_eq!(bitmap.pixels().len(), 12);
    assert_eq!(bitmap.block.size(), 48);
    assert_eq!(count(&bitmap, Color::default()), 12);
  }

  #[test]
  fn drop_returns_the_block() {
    let heap = HeapAllocator::new();
    {
      let _mask = Bitmap::new_in(8, 8, &heap).unwrap();
      let _surface = ColorBitmap::new_in(8, 8, &heap).unwrap();
      assert_eq!(heap.live_blocks(), 2);
    }
    assert_eq!(heap.live_blocks(), 0);
  }

  #[test]
  fn fill_rect_inside() {
    let heap = HeapAllocator::new();
    let mut bitmap = ColorBitmap::new_in(4, 4, &heap).unwrap();

    bitmap.fill_rect(Rect::new(1, 1, 2, 2), Color::RED);

    assert_eq!(count(&bitmap, Color::RED), 4);
    assert_eq!(bitmap.get(1, 1), Some(Color::RED));
    assert_eq!(bitmap.get(2, 2), Some(Color::RED));
    assert_eq!(bitmap.get(3, 3), Some(Color::default()));
  }

  #[test]
  fn fill_rect_is_clipped() {
    let heap = HeapAllocator::new();
    let mut bitmap = ColorBitmap::new_in(4, 4, &heap).unwrap();

    bitmap.fill_rect(Rect::new(-2, 2, 100, 100), Color::BLUE);
    assert_eq!(count(&bitmap, Color::BLUE), 8);

    bitmap.fill_rect(Rect::new(10, 10, 5, 5), Color::WHITE);
    bitmap.fill_rect(Rect::new(-10, -10, 5, 5), Color::WHITE);
    assert_eq!(count(&bitmap, Color::WHITE), 0);
  }

  #[test]
  fn blit_copies_and_clips() {
    let heap = HeapAllocator::new();
    let mut src = ColorBitmap::new_in(2, 2, &heap).unwrap();
    src.clear(Color::GREEN);
    src.fill_rect(Rect::new(1, 1, 1, 1), Color::RED);

    let mut dst = ColorBitmap::new_in(3, 3, &heap).unwrap();
    dst.blit(Rect::new(2, 2, 10, 10), &src);

    // Only the source's top-left pixel fits.
    assert_eq!(count(&dst, Color::GREEN), 1);
    assert_eq!(dst.get(2, 2), Some(Color::GREEN));

    dst.blit(Rect::new(-1, -1, 2, 2), &src);
    assert_eq!(dst.get(0, 0), Some(Color::RED));
  }

  #[test]
  fn fill_masked_paints_only_set_pixels() {
    let heap = HeapAllocator::new();
    #[rustfmt::skip]
    let mask = Bitmap::from_pixels_in(3, 2, &[
      1, 0, 1,
      0, 9, 0,
    ], &heap).unwrap();

    let mut dst = ColorBitmap::new_in(5, 5, &heap).unwrap();
    dst.clear(Color::DARK_GREY);
    dst.fill_masked(Rect::new(1, 1, 3, 2), &mask, Color::GREEN_BLUE);

    assert_eq!(count(&dst, Color::GREEN_BLUE), 3);
    assert_eq!(dst.get(1, 1), Some(Color::GREEN_BLUE));
    assert_eq!(dst.get(2, 1), Some(Color::DARK_GREY));
    assert_eq!(dst.get(3, 1), Some(Color::GREEN_BLUE));
    assert_eq!(dst.get(2, 2), Some(Color::GREEN_BLUE));
  }

  #[test]
  fn mask_fill_rect() {
    let heap = HeapAllocator::new();
    let mut mask = Bitmap::new_in(3, 3, &heap).unwrap();

    mask.fill_rect(Rect::new(0, 1, 3, 1), 0xff);

    assert_eq!(mask.pixels(), &[0, 0, 0, 0xff, 0xff, 0xff, 0, 0, 0]);
    assert_eq!(mask.get(3, 0), None);
  }

  #[test]
  fn arena_backed_surfaces() {
    let arena = ArenaAllocator::new(64).unwrap();

    let first = ColorBitmap::new_in(2, 2, &arena).unwrap();
    let second = ColorBitmap::new_in(4, 4, &arena);

    assert_eq!(first.pixels().len(), 4);
    assert!(matches!(second, Err(AllocError::ArenaExhausted { .. })));
  }

  #[test]
  fn oversized_dimensions_overflow() {
    let heap = HeapAllocator::new();

    let err = ColorBitmap::new_in(usize::MAX, 2, &heap).unwrap_err();

    assert_eq!(err, AllocError::CapacityOverflow);
  }
}
