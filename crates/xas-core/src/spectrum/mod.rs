//! The multi-scan spectral container.
//!
//! Data live in a (point, channel, scan) cube with labeled channel and scan
//! axes. Per-channel weights and offsets are (channel, scan) arrays in which
//! NaN marks an entry that was never set. Unset weights read as 1.0 and unset
//! offsets as 0.0.

pub mod accumulate;
pub mod labels;
pub mod metadata;
pub mod query;

pub use labels::LabelIndex;
pub use metadata::ScanMetadata;
pub use query::{DataQuery, DataSelection};

use crate::calibration::{CalibrationOptions, CalibrationReport, calibrate};
use crate::common::constants::MONO_CHANNEL;
use crate::common::edge::resolve_edge;
use crate::domain::{ChannelRole, MeasurementKind, ScanId, XasError, XasResult};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Xas {
    pub(crate) kind: MeasurementKind,
    pub(crate) channels: LabelIndex<String>,
    pub(crate) scans: LabelIndex<ScanId>,
    pub(crate) data: Array3<f64>,
    pub(crate) weights: Array2<f64>,
    pub(crate) offsets: Array2<f64>,
    pub(crate) channel_roles: Vec<ChannelRole>,
    pub(crate) metadata: ScanMetadata,
}

/// Inputs for [`Xas::new`]. Missing weights, offsets or roles start unset or inferred.
#[derive(Debug, Clone, Default)]
pub struct XasParts {
    pub kind: MeasurementKind,
    pub channels: Vec<String>,
    pub scans: Vec<ScanId>,
    pub data: Array3<f64>,
    pub weights: Option<Array2<f64>>,
    pub offsets: Option<Array2<f64>>,
    pub channel_roles: Option<Vec<ChannelRole>>,
    pub metadata: ScanMetadata,
}

impl Xas {
    pub fn new(parts: XasParts) -> XasResult<Self> {
        let XasParts {
            kind,
            channels,
            scans,
            data,
            weights,
            offsets,
            channel_roles,
            metadata,
        } = parts;

        let (_, n_channels, n_scans) = data.dim();
        if n_channels != channels.len() {
            return Err(XasError::input_validation(
                "INPUT.CHANNEL_COUNT",
                format!(
                    "{} channel names supplied for {} data columns",
                    channels.len(),
                    n_channels
                ),
            ));
        }
        if n_scans != scans.len() {
            return Err(XasError::input_validation(
                "INPUT.SCAN_COUNT",
                format!("{} scan ids supplied for {} scans", scans.len(), n_scans),
            ));
        }

        let channels = LabelIndex::new(channels);
        if let Some(duplicate) = channels.first_duplicate() {
            return Err(XasError::input_validation(
                "INPUT.DUPLICATE_CHANNEL",
                format!("channel '{duplicate}' appears more than once"),
            ));
        }
        let scans = LabelIndex::new(scans);
        if let Some(duplicate) = scans.first_duplicate() {
            return Err(XasError::input_validation(
                "INPUT.DUPLICATE_SCAN",
                format!("scan {duplicate} appears more than once"),
            ));
        }

        let weights = metadata_array(weights, n_channels, n_scans, "weights")?;
        let offsets = metadata_array(offsets, n_channels, n_scans, "offsets")?;

        let channel_roles = match channel_roles {
            Some(roles) if roles.len() != n_channels => {
                return Err(XasError::input_validation(
                    "INPUT.COLTYPES_LENGTH",
                    format!(
                        "{} channel roles supplied for {} channels",
                        roles.len(),
                        n_channels
                    ),
                ));
            }
            Some(roles) => roles,
            None => channels.iter().map(|name| ChannelRole::infer(name)).collect(),
        };

        Ok(Self {
            kind,
            channels,
            scans,
            data,
            weights,
            offsets,
            channel_roles,
            metadata,
        })
    }

    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    /// Retags the measurement kind.
    pub fn with_kind(mut self, kind: MeasurementKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn channels(&self) -> &[String] {
        self.channels.labels()
    }

    pub fn scans(&self) -> &[ScanId] {
        self.scans.labels()
    }

    pub fn channel_roles(&self) -> &[ChannelRole] {
        &self.channel_roles
    }

    pub fn metadata(&self) -> &ScanMetadata {
        &self.metadata
    }

    pub fn data(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// Stored weights with NaN for unset entries.
    pub fn raw_weights(&self) -> ArrayView2<'_, f64> {
        self.weights.view()
    }

    /// Stored offsets with NaN for unset entries.
    pub fn raw_offsets(&self) -> ArrayView2<'_, f64> {
        self.offsets.view()
    }

    pub fn n_points(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn n_scans(&self) -> usize {
        self.scans.len()
    }

    pub fn role_of(&self, name: &str) -> Option<ChannelRole> {
        self.channels
            .position(name)
            .map(|index| self.channel_roles[index])
    }

    pub fn detectors(&self) -> Vec<String> {
        self.channels
            .iter()
            .zip(&self.channel_roles)
            .filter(|(_, role)| **role == ChannelRole::Detector)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn channel_index(&self, name: &str) -> XasResult<usize> {
        self.channels.position(name).ok_or_else(|| {
            XasError::lookup(
                "LOOKUP.CHANNEL",
                format!("channel '{name}' is not present"),
            )
        })
    }

    pub fn channel_indices<S: AsRef<str>>(&self, names: &[S]) -> XasResult<Vec<usize>> {
        names
            .iter()
            .map(|name| self.channel_index(name.as_ref()))
            .collect()
    }

    /// Independent (points, scans) copy of one channel.
    pub fn channel(&self, name: &str) -> XasResult<Array2<f64>> {
        let index = self.channel_index(name)?;
        Ok(self.data.index_axis(Axis(1), index).to_owned())
    }

    /// Scan positions whose id is not listed in `exclude`.
    pub fn included_scans(&self, exclude: &[ScanId]) -> Vec<usize> {
        self.scans
            .iter()
            .enumerate()
            .filter(|(_, scan)| !exclude.contains(*scan))
            .map(|(position, _)| position)
            .collect()
    }

    pub fn included_scan_ids(&self, exclude: &[ScanId]) -> Vec<ScanId> {
        self.included_scans(exclude)
            .into_iter()
            .map(|position| self.scans.labels()[position])
            .collect()
    }

    /// Independent (points, names, included scans) copy.
    pub fn get_cols<S: AsRef<str>>(&self, names: &[S], exclude: &[ScanId]) -> XasResult<Array3<f64>> {
        let indices = self.channel_indices(names)?;
        let positions = self.included_scans(exclude);
        Ok(self
            .data
            .select(Axis(1), &indices)
            .select(Axis(2), &positions))
    }

    pub fn get_weights<S: AsRef<str>>(&self, names: &[S]) -> XasResult<Array2<f64>> {
        self.get_weights_excluding(names, &[])
    }

    pub fn get_weights_excluding<S: AsRef<str>>(
        &self,
        names: &[S],
        exclude: &[ScanId],
    ) -> XasResult<Array2<f64>> {
        self.project_metadata(&self.weights, names, exclude, 1.0)
    }

    pub fn get_offsets<S: AsRef<str>>(&self, names: &[S]) -> XasResult<Array2<f64>> {
        self.get_offsets_excluding(names, &[])
    }

    pub fn get_offsets_excluding<S: AsRef<str>>(
        &self,
        names: &[S],
        exclude: &[ScanId],
    ) -> XasResult<Array2<f64>> {
        self.project_metadata(&self.offsets, names, exclude, 0.0)
    }

    fn project_metadata<S: AsRef<str>>(
        &self,
        source: &Array2<f64>,
        names: &[S],
        exclude: &[ScanId],
        unset: f64,
    ) -> XasResult<Array2<f64>> {
        let indices = self.channel_indices(names)?;
        let positions = self.included_scans(exclude);
        Ok(source
            .select(Axis(0), &indices)
            .select(Axis(1), &positions)
            .mapv(|value| if value.is_nan() { unset } else { value }))
    }

    /// Stores one calibration shift per scan on the MONO channel. Touches offsets only.
    pub fn set_mono_offset(&mut self, deltas: &[f64]) -> XasResult<()> {
        let mono = self.channel_index(MONO_CHANNEL)?;
        if deltas.len() != self.n_scans() {
            return Err(XasError::input_validation(
                "INPUT.OFFSET_COUNT",
                format!(
                    "{} offsets supplied for {} scans",
                    deltas.len(),
                    self.n_scans()
                ),
            ));
        }

        for (target, delta) in self.offsets.row_mut(mono).iter_mut().zip(deltas) {
            *target = *delta;
        }
        debug!(scans = deltas.len(), "stored monochromator offsets");
        Ok(())
    }

    /// Aligns the reference peak of `options.col` in every scan to `edge` and
    /// stores the shifts as MONO offsets.
    pub fn find_mono_offset(
        &mut self,
        edge: &str,
        options: &CalibrationOptions,
    ) -> XasResult<CalibrationReport> {
        let energy = resolve_edge(edge)?;
        let query = DataQuery::default().individual(true);
        let (x, y) = self.individual_data(&[options.col.as_str()], &query)?;
        let report = calibrate(x.view(), y.index_axis(Axis(1), 0), energy, options)?;
        self.set_mono_offset(&report.offsets)?;
        Ok(report)
    }
}

fn metadata_array(
    supplied: Option<Array2<f64>>,
    n_channels: usize,
    n_scans: usize,
    label: &str,
) -> XasResult<Array2<f64>> {
    match supplied {
        Some(array) if array.dim() != (n_channels, n_scans) => Err(XasError::input_validation(
            "INPUT.METADATA_SHAPE",
            format!(
                "{label} have shape {:?}, expected ({n_channels}, {n_scans})",
                array.dim()
            ),
        )),
        Some(array) => Ok(array),
        None => Ok(Array2::from_elem((n_channels, n_scans), f64::NAN)),
    }
}

impl PartialEq for Xas {
    /// Weights and offsets do not take part in equality.
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.metadata.scalars_eq(&other.metadata)
            && self.channels == other.channels
            && self.scans == other.scans
            && self.data.dim() == other.data.dim()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(lhs, rhs)| lhs == rhs || (lhs.is_nan() && rhs.is_nan()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Xas, XasParts};
    use crate::calibration::CalibrationOptions;
    use crate::domain::{ChannelRole, MeasurementKind};
    use ndarray::{Array2, Array3, array};

    fn parts() -> XasParts {
        let mut data = Array3::zeros((4, 3, 2));
        for point in 0..4 {
            for scan in 0..2 {
                data[[point, 0, scan]] = 280.0 + point as f64;
                data[[point, 1, scan]] = 10.0 + scan as f64;
                data[[point, 2, scan]] = (point * 10 + scan) as f64;
            }
        }
        XasParts {
            channels: vec!["MONO".into(), "I0".into(), "REF".into()],
            scans: vec![3, 8],
            data,
            ..XasParts::default()
        }
    }

    #[test]
    fn construction_infers_roles_and_unset_metadata() {
        let xas = Xas::new(parts()).expect("container");
        assert_eq!(xas.kind(), MeasurementKind::Xas);
        assert_eq!(
            xas.channel_roles(),
            &[ChannelRole::Motor, ChannelRole::Detector, ChannelRole::Detector]
        );
        assert_eq!(xas.detectors(), vec!["I0".to_string(), "REF".to_string()]);
        assert!(xas.raw_weights().iter().all(|value| value.is_nan()));
        assert_eq!(
            xas.get_weights(&["I0"]).expect("weights"),
            array![[1.0, 1.0]]
        );
        assert_eq!(
            xas.get_offsets(&["REF", "MONO"]).expect("offsets"),
            Array2::<f64>::zeros((2, 2))
        );
    }

    #[test]
    fn construction_rejects_inconsistent_parts() {
        let mut bad = parts();
        bad.channels.pop();
        assert_eq!(
            Xas::new(bad).expect_err("count").placeholder(),
            "INPUT.CHANNEL_COUNT"
        );

        let mut bad = parts();
        bad.scans = vec![3, 3];
        assert_eq!(
            Xas::new(bad).expect_err("duplicate").placeholder(),
            "INPUT.DUPLICATE_SCAN"
        );

        let mut bad = parts();
        bad.channels[2] = "I0".into();
        assert_eq!(
            Xas::new(bad).expect_err("duplicate").placeholder(),
            "INPUT.DUPLICATE_CHANNEL"
        );

        let mut bad = parts();
        bad.channel_roles = Some(vec![ChannelRole::Motor]);
        assert_eq!(
            Xas::new(bad).expect_err("roles").placeholder(),
            "INPUT.COLTYPES_LENGTH"
        );

        let mut bad = parts();
        bad.weights = Some(Array2::ones((3, 1)));
        assert_eq!(
            Xas::new(bad).expect_err("shape").placeholder(),
            "INPUT.METADATA_SHAPE"
        );
    }

    #[test]
    fn channel_and_column_projections_are_copies() {
        let xas = Xas::new(parts()).expect("container");
        let mut reference = xas.channel("REF").expect("channel");
        assert_eq!(reference.dim(), (4, 2));
        reference[[0, 0]] = -1.0;
        assert_eq!(xas.data()[[0, 2, 0]], 0.0);

        let cols = xas.get_cols(&["REF", "I0"], &[3]).expect("cols");
        assert_eq!(cols.dim(), (4, 2, 1));
        assert_eq!(cols[[2, 0, 0]], 21.0);
        assert_eq!(cols[[2, 1, 0]], 11.0);
        assert_eq!(xas.included_scan_ids(&[3]), vec![8]);

        let error = xas.channel("IF").expect_err("missing");
        assert_eq!(error.placeholder(), "LOOKUP.CHANNEL");
    }

    #[test]
    fn mono_offset_requires_one_value_per_scan() {
        let mut xas = Xas::new(parts()).expect("container");
        xas.set_mono_offset(&[0.25, -0.5]).expect("offsets");
        assert_eq!(
            xas.get_offsets(&["MONO", "REF"]).expect("offsets"),
            array![[0.25, -0.5], [0.0, 0.0]]
        );

        let error = xas.set_mono_offset(&[0.1]).expect_err("count");
        assert_eq!(error.placeholder(), "INPUT.OFFSET_COUNT");
    }

    #[test]
    fn equality_ignores_weights_and_offsets_but_not_nan_layout() {
        let left = Xas::new(parts()).expect("container");
        let mut right = left.clone();
        right.set_mono_offset(&[1.0, 1.0]).expect("offsets");
        assert_eq!(left, right);

        let mut with_gap = parts();
        with_gap.data[[1, 1, 1]] = f64::NAN;
        let gapped = Xas::new(with_gap.clone()).expect("container");
        assert_eq!(gapped, Xas::new(with_gap).expect("container"));
        assert_ne!(gapped, left);
        assert_ne!(left.clone().with_kind(MeasurementKind::Rixs), left);
    }

    #[test]
    fn unknown_edge_leaves_offsets_untouched() {
        let mut xas = Xas::new(parts()).expect("container");
        let error = xas
            .find_mono_offset("Unobtainium", &CalibrationOptions::default())
            .expect_err("edge");
        assert_eq!(error.placeholder(), "LOOKUP.EDGE");
        assert!(xas.raw_offsets().iter().all(|value| value.is_nan()));
    }
}
