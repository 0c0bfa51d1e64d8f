//! Normalized detection annotations and their conversions
//!
//! - [`NormalizedAnnotation`]: one YOLO-style record
//! - [`AnnotationCodec`]: geo <-> pixel <-> normalized conversion for one raster
//! - label file I/O and [`BoxPainter`] for visual checks

pub mod codec;
pub mod draw;
pub mod label_file;
pub mod record;

pub use self::codec::{AnnotationCodec, ClassifiedBox, CLASS_ID_PROPERTY};
pub use self::draw::BoxPainter;
pub use self::label_file::{parse_labels, read_label_file, write_label_file};
pub use self::record::NormalizedAnnotation;
