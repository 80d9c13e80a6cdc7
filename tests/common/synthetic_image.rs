use stack_counter::image::ImageRgb8;

/// Uniform-color scene.
pub fn uniform_scene(width: usize, height: usize, color: [u8; 3]) -> ImageRgb8 {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    let mut img = ImageRgb8::new(width, height);
    for y in 0..height {
        for x in 0..width {
            img.set(x, y, color);
        }
    }
    img
}

/// Dark solid disks on a light background, one per `(cx, cy, radius)`.
pub fn disk_scene(width: usize, height: usize, disks: &[(usize, usize, usize)]) -> ImageRgb8 {
    let mut img = uniform_scene(width, height, [235, 235, 235]);
    for &(cx, cy, r) in disks {
        paint_disk(&mut img, cx, cy, r, [40, 40, 40]);
    }
    img
}

/// A saturated rectangle "stack" on a neutral background, with dark disks
/// painted inside it. Returns the scene and the stack rectangle
/// `(x, y, w, h)`.
pub fn stack_scene(
    width: usize,
    height: usize,
    stack: (usize, usize, usize, usize),
    disks: &[(usize, usize, usize)],
) -> (ImageRgb8, (usize, usize, usize, usize)) {
    let mut img = uniform_scene(width, height, [128, 128, 128]);
    let (sx, sy, sw, sh) = stack;
    for y in sy..sy + sh {
        for x in sx..sx + sw {
            img.set(x, y, [60, 90, 200]);
        }
    }
    for &(cx, cy, r) in disks {
        paint_disk(&mut img, cx, cy, r, [15, 15, 15]);
    }
    (img, stack)
}

fn paint_disk(img: &mut ImageRgb8, cx: usize, cy: usize, r: usize, color: [u8; 3]) {
    let r2 = (r * r) as i64;
    for y in cy.saturating_sub(r)..(cy + r + 1).min(img.h) {
        for x in cx.saturating_sub(r)..(cx + r + 1).min(img.w) {
            let dx = x as i64 - cx as i64;
            let dy = y as i64 - cy as i64;
            if dx * dx + dy * dy <= r2 {
                img.set(x, y, color);
            }
        }
    }
}
