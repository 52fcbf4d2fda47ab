//! Error conditions and boundary cases across the public API

use visubee::{
    adaptive_resize, codec::Matrix, detect_edges, error::Result, load_image, load_image_from_bytes,
    process, remove_background, resize, BackgroundReference, CannyDetector, Image, InputScaling,
    PipelineError, ProcessingConfig, Region, SizeSpec,
};
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_validation_edge_cases() -> Result<()> {
    // Zero thresholds and tolerance are valid
    let config = ProcessingConfig::builder()
        .thresholds(0.0, 0.0)
        .tolerance(0)
        .build()?;
    assert_eq!(config.threshold1, 0.0);
    assert!(config.validate().is_ok());

    // Thresholds in either order
    assert!(ProcessingConfig::builder()
        .thresholds(200.0, 10.0)
        .build()
        .is_ok());

    let error = ProcessingConfig::builder()
        .threshold1(-1.0)
        .build()
        .unwrap_err();
    assert!(matches!(error, PipelineError::InvalidConfig(_)));
    assert!(error.to_string().contains("threshold1"));
    assert!(error.to_string().contains(">= 0"));

    let error = ProcessingConfig::builder()
        .threshold2(f32::NAN)
        .build()
        .unwrap_err();
    assert!(error.to_string().contains("threshold2"));

    assert!(matches!(
        ProcessingConfig::builder().tolerance(-1).build(),
        Err(PipelineError::InvalidBackgroundReference(_))
    ));

    assert!(matches!(
        ProcessingConfig::builder().max_factor(0).build(),
        Err(PipelineError::InvalidConfig(_))
    ));

    // max_factor only matters for adaptive scaling
    let config = ProcessingConfig {
        input_scaling: InputScaling::Exact,
        ..ProcessingConfig::default()
    };
    assert!(config.validate().is_ok());

    Ok(())
}

#[test]
fn test_reference_edge_cases() {
    assert!(matches!(
        ProcessingConfig::builder()
            .reference_image(Image::filled(0, 0, [0; 4]))
            .build(),
        Err(PipelineError::InvalidBackgroundReference(_))
    ));
    assert!(matches!(
        ProcessingConfig::builder()
            .reference_region(Region::new(0, 0, 0, 5))
            .build(),
        Err(PipelineError::InvalidBackgroundReference(_))
    ));

    let input = Image::filled(10, 10, [0, 255, 0, 255]);
    assert!(matches!(
        remove_background(&input, Some(&Image::filled(3, 0, [0; 4])), 10),
        Err(PipelineError::InvalidBackgroundReference(_))
    ));
    assert!(matches!(
        remove_background(&input, None, -5),
        Err(PipelineError::InvalidBackgroundReference(_))
    ));

    // A region partly outside the input is clamped, not rejected
    let config = ProcessingConfig::builder()
        .reference_region(Region::new(8, 8, 50, 50))
        .build()
        .unwrap();
    assert!(process(Some(&input), &config).is_ok());

    // Entirely outside fails at processing time
    let config = ProcessingConfig::builder()
        .background_reference(BackgroundReference::Region(Region::new(10, 0, 5, 5)))
        .build()
        .unwrap();
    assert!(matches!(
        process(Some(&input), &config),
        Err(PipelineError::InvalidBackgroundReference(_))
    ));
}

#[test]
fn test_image_edge_cases() {
    let empty = Image::filled(0, 0, [0; 4]);
    assert!(empty.is_empty());

    assert!(matches!(
        resize(&empty, SizeSpec::M),
        Err(PipelineError::InvalidImageDimensions(_))
    ));
    assert!(matches!(
        adaptive_resize(&empty, SizeSpec::M, 10),
        Err(PipelineError::InvalidImageDimensions(_))
    ));
    assert!(matches!(
        remove_background(&empty, None, 10),
        Err(PipelineError::InvalidImageDimensions(_))
    ));
    assert!(matches!(
        process(Some(&empty), &ProcessingConfig::default()),
        Err(PipelineError::InvalidImageDimensions(_))
    ));

    // Byte count must match the dimensions
    assert!(Image::from_rgba_bytes(2, 2, &[0; 15]).is_err());
    assert!(Image::from_argb(3, 1, vec![0; 2]).is_err());

    // Single pixel passes through every stage
    let pixel = Image::filled(1, 1, [200, 10, 10, 255]);
    let result = process(Some(&pixel), &ProcessingConfig::default()).unwrap();
    assert_eq!(result.edge_image.unwrap().dimensions(), (1, 1));
    assert_eq!(result.transparent_image.unwrap().dimensions(), (300, 300));
}

#[test]
fn test_extreme_aspect_ratios() {
    let wide = Image::filled(10_000, 1, [0, 0, 255, 255]);
    assert_eq!(resize(&wide, SizeSpec::XS).unwrap().dimensions(), (75, 1));

    let tall = Image::filled(1, 10_000, [0, 0, 255, 255]);
    assert_eq!(resize(&tall, SizeSpec::XS).unwrap().dimensions(), (1, 75));
}

#[test]
fn test_matrix_edge_cases() {
    assert!(Matrix::from_vec(2, 2, 3, vec![0; 11]).is_err());

    let two_channel = Matrix::zeros(4, 4, 2);
    assert!(matches!(
        detect_edges(&two_channel, 50.0, 150.0),
        Err(PipelineError::UnsupportedChannelCount { channels: 2 })
    ));

    let five_channel = Matrix::zeros(2, 2, 5);
    assert!(matches!(
        visubee::encode(&five_channel),
        Err(PipelineError::UnsupportedChannelCount { channels: 5 })
    ));

    // Empty matrices produce empty edge maps
    let edges = detect_edges(&Matrix::zeros(0, 0, 1), 50.0, 150.0).unwrap();
    assert_eq!((edges.width(), edges.height()), (0, 0));
}

#[test]
fn test_detector_threshold_edge_cases() {
    let detector = CannyDetector::new(150.0, 50.0).unwrap();
    assert_eq!(detector.low_threshold(), 50.0);
    assert_eq!(detector.high_threshold(), 150.0);

    assert!(CannyDetector::new(-0.5, 10.0).is_err());
    assert!(CannyDetector::new(10.0, f32::INFINITY).is_err());
}

#[test]
fn test_size_and_region_parsing() {
    assert_eq!("xl".parse::<SizeSpec>().unwrap(), SizeSpec::XL);
    assert_eq!(" M ".parse::<SizeSpec>().unwrap(), SizeSpec::M);
    assert!(matches!(
        "XXL".parse::<SizeSpec>(),
        Err(PipelineError::InvalidConfig(_))
    ));

    assert_eq!(
        "1, 2, 3, 4".parse::<Region>().unwrap(),
        Region::new(1, 2, 3, 4)
    );
    assert!("1,2,3".parse::<Region>().is_err());
    assert!("1,2,3,-4".parse::<Region>().is_err());
    assert!("a,b,c,d".parse::<Region>().is_err());
}

#[test]
fn test_drag_selection_edge_cases() {
    // No extent on one axis
    assert_eq!(
        Region::from_drag((5.0, 5.0), (5.0, 20.0), (100.0, 100.0), (200, 200)),
        None
    );
    // View coordinates scale to image coordinates
    assert_eq!(
        Region::from_drag((10.0, 20.0), (30.0, 60.0), (100.0, 100.0), (200, 200)),
        Some(Region::new(20, 40, 40, 80))
    );
    // Extent is clamped into the image
    assert_eq!(
        Region::from_drag((90.0, 90.0), (150.0, 150.0), (100.0, 100.0), (100, 100)),
        Some(Region::new(90, 90, 10, 10))
    );
}

#[test]
fn test_decode_failures() {
    assert!(matches!(
        load_image_from_bytes(&[]),
        Err(PipelineError::DecodeFailure(_))
    ));
    assert!(matches!(
        load_image_from_bytes(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
        Err(PipelineError::DecodeFailure(_))
    ));

    let temp_dir = TempDir::new().unwrap();
    let truncated = temp_dir.path().join("broken.png");
    std::fs::write(&truncated, b"\x89PNG\r\n").unwrap();
    assert!(load_image(&truncated).is_err());
    assert!(load_image(Path::new("/nonexistent/input.png")).is_err());
}

#[test]
fn test_error_messages_carry_context() {
    let error = PipelineError::empty_image("resize", 0, 12);
    assert!(error.to_string().contains("0x12"));

    let error = PipelineError::config_value_error("max_factor", 0, ">= 1", Some(10));
    let message = error.to_string();
    assert!(message.contains("max_factor"));
    assert!(message.contains("Recommended: 10"));

    let error = PipelineError::processing_stage_error("edge_detection", "boom", None);
    assert!(matches!(error, PipelineError::Internal(_)));
    assert!(!error.to_string().contains("input:"));
}
