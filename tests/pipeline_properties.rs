//! End-to-end properties of the processing pipeline
//!
//! All inputs are synthetic images built in code.

use visubee::{
    decode, detect_edges_image, encode, process, process_async, remove_background, resize,
    Image, InputScaling, Matrix, Pipeline, ProcessingConfig, ProcessingResult, Region, SizeSpec,
};

const GREEN: [u8; 4] = [0, 255, 0, 255];
const RED: [u8; 4] = [255, 0, 0, 255];

fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> Image {
    let bytes: Vec<u8> = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .flat_map(|(x, y)| f(x, y))
        .collect();
    Image::from_rgba_bytes(width, height, &bytes).expect("valid test image")
}

fn green_with_red_square(size: u32, square: u32) -> Image {
    let start = (size - square) / 2;
    let inside = start..start + square;
    from_fn(size, size, |x, y| {
        if inside.contains(&x) && inside.contains(&y) {
            RED
        } else {
            GREEN
        }
    })
}

fn edge_pixels(edges: &Image) -> Vec<(u32, u32)> {
    let mut pixels = Vec::new();
    for y in 0..edges.height() {
        for x in 0..edges.width() {
            if edges.rgba_at(x, y).unwrap()[0] == 255 {
                pixels.push((x, y));
            }
        }
    }
    pixels
}

#[test]
fn test_codec_roundtrip_is_exact() {
    let image = from_fn(17, 9, |x, y| {
        [
            (x * 15) as u8,
            (y * 28) as u8,
            ((x * y) % 256) as u8,
            ((x + y) * 13 % 256) as u8,
        ]
    });
    let matrix = decode(&image);
    assert_eq!(matrix.channels(), 4);
    assert_eq!(encode(&matrix).unwrap(), image);
}

#[test]
fn test_resize_preserves_aspect_ratio() {
    for (width, height) in [(640, 480), (480, 640), (1000, 3), (3, 1000), (333, 777), (50, 50)] {
        let image = Image::filled(width, height, [90, 40, 200, 255]);
        let aspect = f64::from(width) / f64::from(height);
        for size in SizeSpec::ALL {
            let resized = resize(&image, size).unwrap();
            let (w, h) = resized.dimensions();
            if aspect > 1.0 {
                assert_eq!(w, size.width());
                let expected = f64::from(size.width()) / aspect;
                assert!((f64::from(h) - expected).abs() <= 1.0, "{width}x{height} {size}");
            } else {
                assert_eq!(h, size.height());
                let expected = f64::from(size.height()) * aspect;
                assert!((f64::from(w) - expected).abs() <= 1.0, "{width}x{height} {size}");
            }
        }
    }
}

#[test]
fn test_resize_to_own_size_is_identity() {
    let image = from_fn(150, 150, |x, y| [(x % 256) as u8, (y % 256) as u8, 7, 255]);
    assert_eq!(resize(&image, SizeSpec::S).unwrap(), image);
}

#[test]
fn test_flat_image_has_no_edges() {
    let image = Image::filled(32, 24, [120, 60, 30, 255]);
    for (t1, t2) in [(0.0, 0.0), (1.0, 2.0), (50.0, 150.0), (300.0, 10.0)] {
        let edges = detect_edges_image(&image, t1, t2).unwrap();
        assert!(edge_pixels(&edges).is_empty(), "thresholds {t1}/{t2}");
    }
}

#[test]
fn test_sharp_boundary_gives_single_pixel_line() {
    let image = from_fn(20, 10, |x, _| {
        if x < 10 {
            [0, 0, 0, 255]
        } else {
            [255, 255, 255, 255]
        }
    });
    let edges = detect_edges_image(&image, 50.0, 150.0).unwrap();
    let expected: Vec<(u32, u32)> = (0..10).map(|y| (9, y)).collect();
    assert_eq!(edge_pixels(&edges), expected);
}

#[test]
fn test_zero_tolerance_keys_out_matching_background() {
    let input = green_with_red_square(30, 10);
    let reference = Image::filled(5, 5, GREEN);
    let output = remove_background(&input, Some(&reference), 0).unwrap();

    for y in 0..30 {
        for x in 0..30 {
            let inside = (10..20).contains(&x) && (10..20).contains(&y);
            let expected = if inside { 255 } else { 0 };
            assert_eq!(output.rgba_at(x, y).unwrap()[3], expected, "({x}, {y})");
        }
    }
}

#[test]
fn test_absent_input_yields_nothing() {
    let result = process(None, &ProcessingConfig::default()).unwrap();
    assert_eq!(result.into_pair(), (None, None));
}

#[test]
fn test_solid_color_fits_every_size() {
    for (width, height) in [(200, 100), (100, 200), (64, 64), (7, 300)] {
        let image = Image::filled(width, height, [10, 220, 10, 255]);
        let keyed = remove_background(&image, None, 30).unwrap();
        for size in SizeSpec::ALL {
            let (w, h) = resize(&keyed, size).unwrap().dimensions();
            let (bound_w, bound_h) = size.dimensions();
            assert!(
                (w == bound_w && h <= bound_h) || (h == bound_h && w <= bound_w),
                "{width}x{height} into {size} gave {w}x{h}"
            );
        }
    }
}

#[test]
fn test_every_scaling_mode_produces_sized_transparent_image() {
    let image = green_with_red_square(240, 60);
    for scaling in [
        InputScaling::Adaptive { max_factor: 10 },
        InputScaling::Exact,
        InputScaling::Original,
    ] {
        let config = ProcessingConfig::builder()
            .selected_size(SizeSpec::XS)
            .input_scaling(scaling)
            .build()
            .unwrap();
        let (edges, transparent) = process(Some(&image), &config).unwrap().into_pair();
        let edges = edges.unwrap();
        let transparent = transparent.unwrap();

        assert_eq!(transparent.dimensions(), (75, 75), "{scaling}");
        assert!(edges.width() >= 75 && edges.width() <= 240, "{scaling}");
        // Background corner keyed out, center of the red square kept
        assert_eq!(transparent.rgba_at(0, 0).unwrap()[3], 0, "{scaling}");
        assert_eq!(transparent.rgba_at(37, 37).unwrap()[3], 255, "{scaling}");
    }
}

#[test]
fn test_region_reference_selects_background() {
    // Red left half, green right half; a region on the green half keys out green
    let image = from_fn(60, 30, |x, _| if x < 30 { RED } else { GREEN });
    let config = ProcessingConfig::builder()
        .tolerance(0)
        .reference_region(Region::new(40, 5, 10, 10))
        .input_scaling(InputScaling::Original)
        .build()
        .unwrap();
    let transparent = Pipeline::new(config)
        .unwrap()
        .process(Some(&image))
        .unwrap()
        .transparent_image
        .unwrap();

    assert_eq!(transparent.dimensions(), (300, 150));
    assert_eq!(transparent.rgba_at(10, 75).unwrap()[3], 255);
    assert_eq!(transparent.rgba_at(290, 75).unwrap()[3], 0);
}

#[test]
fn test_pipeline_is_reusable() {
    let pipeline = Pipeline::new(ProcessingConfig::default()).unwrap();
    let image = green_with_red_square(40, 10);
    let first = pipeline.process(Some(&image)).unwrap();
    let second = pipeline.process(Some(&image)).unwrap();
    assert_eq!(first.edge_image, second.edge_image);
    assert_eq!(first.transparent_image, second.transparent_image);
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_shared_types_are_send_and_sync() {
    assert_send_sync::<Image>();
    assert_send_sync::<Matrix>();
    assert_send_sync::<ProcessingConfig>();
    assert_send_sync::<Pipeline>();
}

#[test]
fn test_pipeline_shared_across_threads_matches_sequential() {
    let config = ProcessingConfig::builder()
        .selected_size(SizeSpec::XS)
        .build()
        .unwrap();
    let pipeline = Pipeline::new(config).unwrap();
    let inputs: Vec<Image> = [(40, 10), (64, 30), (90, 20), (120, 60)]
        .into_iter()
        .map(|(size, square)| green_with_red_square(size, square))
        .collect();

    let sequential: Vec<ProcessingResult> = inputs
        .iter()
        .map(|image| pipeline.process(Some(image)).unwrap())
        .collect();

    let concurrent: Vec<ProcessingResult> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|image| {
                let pipeline = &pipeline;
                scope.spawn(move || pipeline.process(Some(image)).unwrap())
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for (index, (alone, shared)) in sequential.iter().zip(&concurrent).enumerate() {
        assert_eq!(alone.edge_image, shared.edge_image, "input {index}");
        assert_eq!(alone.transparent_image, shared.transparent_image, "input {index}");
    }
}

#[tokio::test]
async fn test_process_async_runs_pipeline() {
    let image = green_with_red_square(40, 10);
    let result = process_async(Some(image), ProcessingConfig::default())
        .await
        .unwrap();
    assert_eq!(result.edge_image.unwrap().dimensions(), (40, 40));
    assert_eq!(result.transparent_image.unwrap().dimensions(), (300, 300));

    let empty = process_async(None, ProcessingConfig::default()).await.unwrap();
    assert!(empty.is_empty());
}
