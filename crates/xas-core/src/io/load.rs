use super::ssrl::SsrlCodec;
use super::traits::{RawSpectrum, SpectrumFileReader};
use super::yaml::YamlCodec;
use crate::domain::{ChannelMismatchPolicy, XasError, XasResult};
use crate::spectrum::Xas;
use std::path::Path;
use tracing::debug;

/// Readable on-disk layouts, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Yaml,
    Ssrl,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> XasResult<Self> {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some("yaml") => Ok(Self::Yaml),
            Some("dat") => Ok(Self::Ssrl),
            other => Err(XasError::input_validation(
                "INPUT.FILE_EXTENSION",
                format!(
                    "'{}' has unsupported extension {:?}; expected .yaml or .dat",
                    path.display(),
                    other.unwrap_or("")
                ),
            )),
        }
    }
}

pub fn read_raw(path: impl AsRef<Path>) -> XasResult<RawSpectrum> {
    let path = path.as_ref();
    match InputFormat::from_path(path)? {
        InputFormat::Yaml => YamlCodec.read_path(path),
        InputFormat::Ssrl => SsrlCodec::default().read_path(path),
    }
}

pub fn load_one(path: impl AsRef<Path>) -> XasResult<Xas> {
    let path = path.as_ref();
    let xas = read_raw(path)?.into_xas()?;
    debug!(
        path = %path.display(),
        points = xas.n_points(),
        channels = xas.n_channels(),
        "loaded spectrum"
    );
    Ok(xas)
}

pub fn load_many<P: AsRef<Path>>(paths: &[P]) -> XasResult<Vec<Xas>> {
    paths.iter().map(load_one).collect()
}

/// Loads every file and accumulates them in the given order.
pub fn load_combined<P: AsRef<Path>>(
    paths: &[P],
    policy: ChannelMismatchPolicy,
) -> XasResult<Xas> {
    if paths.is_empty() {
        return Err(XasError::input_validation(
            "INPUT.NO_FILES",
            "no input files were given",
        ));
    }
    let spectra = load_many(paths)?;
    let parts: Vec<&Xas> = spectra.iter().collect();
    Xas::combine(&parts, policy)
}

/// One path loads as is; several are combined with strict accumulation.
pub fn load<P: AsRef<Path>>(paths: &[P]) -> XasResult<Xas> {
    match paths {
        [single] => load_one(single),
        _ => load_combined(paths, ChannelMismatchPolicy::Reject),
    }
}
