// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

// The currently supported common image formats
pub const IMAGE_DYNAMIC_FORMATS: [&str; 12] = [
    "bmp", "ico", "jpeg", "jpg", "png", "pbm", "pgm", "ppm", "qoi", "tga", "tif", "tiff",
];

// Formats that can hold the alpha channel of segmented images and cutouts
pub const IMAGE_ALPHA_FORMATS: [&str; 6] = ["png", "qoi", "tga", "tif", "tiff", "ico"];

// The valid json keys indicating annotation records
pub const ANNOTATION_JSON_VALID_KEYS: [&str; 4] = ["points", "annotations", "prompts", "records"];

// Number of values in a single flat annotation record
pub const ANNOTATION_ARITY: usize = 6;

// Annotation kind codes (third value of a record)
pub const KIND_NEGATIVE_POINT: f32 = 0.0;
pub const KIND_POSITIVE_POINT: f32 = 1.0;
pub const KIND_BOX: f32 = 2.0;

// Annotation stroke codes (sixth value of a record)
pub const STROKE_BOX_DRAG: f32 = 3.0;
pub const STROKE_POINT_CLICK: f32 = 4.0;

// Blend weights (original, color canvas) for overlay composites
pub const AUTOMATIC_BLEND: (f32, f32) = (0.5, 0.5);
pub const PROMPTED_BLEND: (f32, f32) = (0.3, 0.7);

// Alpha value marking a segmented pixel
pub const ALPHA_OPAQUE: u8 = 255;
