use crate::domain::{XasError, XasResult};
use crate::header::Header;
use crate::spectrum::Xas;
use ndarray::Array2;
use std::fs;
use std::path::Path;

/// One file's worth of data: a (points, channels) array and its flat header.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSpectrum {
    pub data: Array2<f64>,
    pub header: Header,
}

impl RawSpectrum {
    pub fn new(data: Array2<f64>, header: Header) -> XasResult<Self> {
        let cols = header.channelinfo.cols.len();
        if cols != data.ncols() {
            return Err(XasError::input_validation(
                "INPUT.CHANNEL_COUNT",
                format!(
                    "header lists {} channels but data has {} columns",
                    cols,
                    data.ncols()
                ),
            ));
        }
        Ok(Self { data, header })
    }

    pub fn into_xas(self) -> XasResult<Xas> {
        Xas::from_data_header(self.data, self.header)
    }
}

pub trait SpectrumReader {
    fn parse(&self, source: &str) -> XasResult<RawSpectrum>;
}

pub trait SpectrumWriter {
    fn render(&self, raw: &RawSpectrum) -> XasResult<String>;
}

pub trait SpectrumFileReader {
    fn read_path(&self, path: &Path) -> XasResult<RawSpectrum>;
}

pub trait SpectrumFileWriter {
    fn write_path(&self, raw: &RawSpectrum, path: &Path) -> XasResult<()>;
}

impl<T> SpectrumFileReader for T
where
    T: SpectrumReader,
{
    fn read_path(&self, path: &Path) -> XasResult<RawSpectrum> {
        if !path.is_file() {
            return Err(XasError::io_system(
                "IO.MISSING_FILE",
                format!("input file '{}' does not exist", path.display()),
            ));
        }
        let source = fs::read_to_string(path).map_err(|source| {
            XasError::io_system(
                "IO.READ_FAILED",
                format!("failed to read '{}': {}", path.display(), source),
            )
        })?;
        self.parse(&source)
    }
}

impl<T> SpectrumFileWriter for T
where
    T: SpectrumWriter,
{
    fn write_path(&self, raw: &RawSpectrum, path: &Path) -> XasResult<()> {
        let rendered = self.render(raw)?;
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| {
                XasError::io_system(
                    "IO.OUTPUT_DIRECTORY",
                    format!(
                        "failed to create output directory '{}': {}",
                        parent.display(),
                        source
                    ),
                )
            })?;
        }
        fs::write(path, rendered).map_err(|source| {
            XasError::io_system(
                "IO.WRITE_FAILED",
                format!("failed to write '{}': {}", path.display(), source),
            )
        })
    }
}
