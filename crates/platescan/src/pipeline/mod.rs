//! High-level read pipeline.
//!
//! This module is the glue layer that wires the stages together:
//! proposal -> refinement -> classification -> segmentation -> recognition
//! -> syntax correction.
//!
//! Algorithmic stages live in `crate::region`, `crate::segment`,
//! `crate::ocr` and `crate::syntax`. The pipeline layer owns call order,
//! collaborator failure handling and the per-image counters.

mod annotate;
mod result;
mod run;

pub use annotate::annotate;
pub use result::{ReadResult, RecognizedPlate};

pub(crate) use run::{find_candidates, read_image, recognize_plate, Backends};
