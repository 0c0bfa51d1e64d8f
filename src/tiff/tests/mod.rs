//! Decoder tests against hand-assembled TIFF files
