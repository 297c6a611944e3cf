//! Multi-scan X-ray absorption spectroscopy data: accumulation, monochromator
//! calibration, normalization and the text codecs used at the beamline.

pub mod background;
pub mod calibration;
pub mod common;
pub mod domain;
pub mod export;
pub mod header;
pub mod io;
pub mod normalization;
pub mod numerics;
pub mod spectrum;

pub use domain::{
    Aggregate, ChannelMismatchPolicy, ChannelRole, MeasurementKind, ScanId, XasError,
    XasErrorCategory, XasResult,
};
pub use header::Header;
pub use spectrum::{DataQuery, DataSelection, Xas};
