//! Projects a container onto one `(array, header)` pair and writes it through a codec.

use crate::common::config::ExportConfig;
use crate::common::constants::{DEFAULT_SSRL_NAME_FORMAT, DEFAULT_YAML_NAME_FORMAT, MONO_CHANNEL};
use crate::domain::{ScanId, XasError, XasResult};
use crate::io::{
    AthenaWriter, RawSpectrum, SpectrumFileWriter, SsrlCodec, YamlCodec, next_available_path,
    render_name,
};
use crate::spectrum::{DataQuery, Xas};
use ndarray::{Array2, Axis, s};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

const MONO_CORRECTED_COMMENT: &str = "Mono corrected";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Yaml,
    Ssrl,
    Athena,
}

impl ExportFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Ssrl => "ssrl",
            Self::Athena => "athena",
        }
    }

    pub const fn default_name_format(self) -> &'static str {
        match self {
            Self::Yaml => DEFAULT_YAML_NAME_FORMAT,
            Self::Ssrl | Self::Athena => DEFAULT_SSRL_NAME_FORMAT,
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = XasError;

    fn from_str(text: &str) -> XasResult<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "yaml" => Ok(Self::Yaml),
            "ssrl" => Ok(Self::Ssrl),
            "athena" => Ok(Self::Athena),
            other => Err(XasError::input_validation(
                "INPUT.EXPORT_FORMAT",
                format!("unknown export format '{other}'; expected yaml, ssrl or athena"),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOptions {
    /// Flux channel the detector channels are divided by.
    pub norm: Option<String>,
    pub offset_mono: bool,
    pub exclude: Vec<ScanId>,
    pub name_format: Option<String>,
    /// Pick `name_N.ext` instead of overwriting an existing file.
    pub increment: bool,
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            norm: config.norm.clone(),
            offset_mono: config.offset_mono,
            exclude: Vec::new(),
            name_format: config.name_format.clone(),
            increment: config.increment,
        }
    }
}

/// (points, channels) array averaged over the included scans, with detector
/// channels flux-normalized and mono-corrected as requested. The flux channel
/// itself keeps its raw values.
pub fn export_data(xas: &Xas, options: &ExportOptions) -> XasResult<Array2<f64>> {
    let exclude = options.exclude.as_slice();
    if let Some(norm) = &options.norm {
        xas.channel_index(norm)?;
    }

    let mut data = xas.get_cols(xas.channels(), exclude)?;
    let targets: Vec<String> = xas
        .detectors()
        .into_iter()
        .filter(|name| options.norm.as_ref() != Some(name))
        .collect();

    if !targets.is_empty() {
        let query = DataQuery::default()
            .divisor(options.norm.iter().cloned())
            .offset_mono(options.offset_mono)
            .individual(true)
            .exclude(exclude);
        let (_, processed) = xas.individual_data(&targets, &query)?;
        for (column, name) in targets.iter().enumerate() {
            let channel = xas.channel_index(name)?;
            data.slice_mut(s![.., channel, ..])
                .assign(&processed.slice(s![.., column, ..]));
        }
    }

    data.mean_axis(Axis(2)).ok_or_else(|| {
        XasError::input_validation("INPUT.NO_SCANS", "every scan is excluded; nothing to export")
    })
}

/// Export array plus a header whose weights and offsets average the included scans.
pub fn data_and_header(xas: &Xas, options: &ExportOptions) -> XasResult<RawSpectrum> {
    let data = export_data(xas, options)?;
    let mut header = xas.header_for(&options.exclude);
    if options.offset_mono {
        header.channelinfo.offsets.remove(MONO_CHANNEL);
    }
    RawSpectrum::new(data, header)
}

/// Writes the export of `xas` into `folder` and returns the written path.
pub fn export_xas(
    xas: &Xas,
    folder: impl AsRef<Path>,
    format: ExportFormat,
    options: &ExportOptions,
) -> XasResult<PathBuf> {
    let raw = data_and_header(xas, options)?;
    let name_format = options
        .name_format
        .as_deref()
        .unwrap_or(format.default_name_format());
    let name = render_name(name_format, &raw.header.scaninfo)?;

    let mut path = folder.as_ref().join(name);
    if options.increment {
        path = next_available_path(&path);
    }

    let comment = if options.offset_mono {
        MONO_CORRECTED_COMMENT
    } else {
        ""
    };
    match format {
        ExportFormat::Yaml => YamlCodec.write_path(&raw, &path)?,
        ExportFormat::Ssrl => SsrlCodec::with_comments(comment, "").write_path(&raw, &path)?,
        ExportFormat::Athena => AthenaWriter {
            c1: comment.to_string(),
            c2: String::new(),
        }
        .write_path(&raw, &path)?,
    }

    info!(
        path = %path.display(),
        format = %format,
        scans = xas.included_scans(&options.exclude).len(),
        "exported spectrum"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{ExportFormat, ExportOptions, data_and_header, export_data, export_xas};
    use crate::header::ScanField;
    use crate::spectrum::{ScanMetadata, Xas, XasParts};
    use ndarray::{Array2, Array3};
    use std::fs;
    use tempfile::TempDir;

    /// Channels MONO / I0 / IF over two scans of four points.
    fn spectrum() -> Xas {
        let mut data = Array3::zeros((4, 3, 2));
        for point in 0..4 {
            for scan in 0..2 {
                data[[point, 0, scan]] = 280.0 + point as f64;
                data[[point, 1, scan]] = 2.0 * (scan + 1) as f64;
                data[[point, 2, scan]] = 8.0 * (point + 1) as f64;
            }
        }
        let mut offsets = Array2::from_elem((3, 2), f64::NAN);
        offsets[[0, 0]] = 0.25;
        Xas::new(XasParts {
            channels: vec!["MONO".into(), "I0".into(), "IF".into()],
            scans: vec![5, 2],
            data,
            offsets: Some(offsets),
            metadata: ScanMetadata {
                sample: Some("graphite".into()),
                ..ScanMetadata::default()
            },
            ..XasParts::default()
        })
        .expect("spectrum")
    }

    #[test]
    fn flux_normalization_divides_detectors_only() {
        let options = ExportOptions {
            norm: Some("I0".into()),
            ..ExportOptions::default()
        };
        let data = export_data(&spectrum(), &options).expect("export");
        assert_eq!(data.dim(), (4, 3));
        // IF/I0 is 8(p+1)/2 and 8(p+1)/4, averaged
        assert_eq!(data[[0, 2]], 3.0);
        assert_eq!(data[[3, 2]], 12.0);
        assert_eq!(data[[0, 1]], 3.0);
        assert_eq!(data[[2, 0]], 282.0);
    }

    #[test]
    fn exclusion_and_missing_divisor() {
        let options = ExportOptions {
            norm: Some("I0".into()),
            exclude: vec![2],
            ..ExportOptions::default()
        };
        let data = export_data(&spectrum(), &options).expect("export");
        assert_eq!(data[[0, 2]], 4.0);

        let options = ExportOptions {
            norm: Some("I1".into()),
            ..ExportOptions::default()
        };
        let error = export_data(&spectrum(), &options).expect_err("missing divisor");
        assert_eq!(error.placeholder(), "LOOKUP.CHANNEL");

        let options = ExportOptions {
            exclude: vec![2, 5],
            ..ExportOptions::default()
        };
        let error = export_data(&spectrum(), &options).expect_err("nothing left");
        assert_eq!(error.placeholder(), "INPUT.NO_SCANS");
    }

    #[test]
    fn header_lists_sorted_scans_and_drops_applied_mono_offset() {
        let plain = data_and_header(&spectrum(), &ExportOptions::default()).expect("raw");
        assert_eq!(plain.header.scaninfo.scan, Some(ScanField::Many(vec![2, 5])));
        assert_eq!(plain.header.channelinfo.offsets.get("MONO"), Some(&0.25));

        let corrected = ExportOptions {
            offset_mono: true,
            ..ExportOptions::default()
        };
        let raw = data_and_header(&spectrum(), &corrected).expect("raw");
        assert!(raw.header.channelinfo.offsets.is_empty());
    }

    #[test]
    fn export_xas_names_and_increments_files() {
        let temp = TempDir::new().expect("tempdir should be created");
        let options = ExportOptions {
            exclude: vec![2],
            increment: true,
            ..ExportOptions::default()
        };
        let first = export_xas(&spectrum(), temp.path(), ExportFormat::Ssrl, &options)
            .expect("first export");
        assert_eq!(first, temp.path().join("graphite_5.dat"));
        let second = export_xas(&spectrum(), temp.path(), ExportFormat::Ssrl, &options)
            .expect("second export");
        assert_eq!(second, temp.path().join("graphite_5_1.dat"));

        let yaml = export_xas(&spectrum(), temp.path(), ExportFormat::Yaml, &options)
            .expect("yaml export");
        assert_eq!(yaml, temp.path().join("graphite_5.yaml"));
        let text = fs::read_to_string(&yaml).expect("yaml should be readable");
        assert!(text.contains("graphite"));
    }

    #[test]
    fn format_names_parse() {
        assert_eq!("Athena".parse::<ExportFormat>().expect("athena"), ExportFormat::Athena);
        assert_eq!(ExportFormat::default(), ExportFormat::Yaml);
        assert_eq!(ExportFormat::Yaml.default_name_format(), "{sample}_{scan}.yaml");
        let error = "csv".parse::<ExportFormat>().expect_err("csv");
        assert_eq!(error.placeholder(), "INPUT.EXPORT_FORMAT");
    }
}
