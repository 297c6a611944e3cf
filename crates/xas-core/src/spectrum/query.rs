use super::Xas;
use crate::calibration::correct_mono_batch;
use crate::common::constants::MONO_CHANNEL;
use crate::domain::{Aggregate, ScanId, XasError, XasResult};
use ndarray::{Array2, Array3, ArrayD, Axis};

/// Processing switches for [`Xas::get_data`].
#[derive(Debug, Clone, PartialEq)]
pub struct DataQuery {
    /// Channels whose product divides the selection.
    pub divisor: Vec<String>,
    pub xcol: String,
    pub individual: bool,
    pub offset: bool,
    pub offset_mono: bool,
    pub weight: bool,
    pub aggregate: Aggregate,
    pub exclude: Vec<ScanId>,
    pub squeeze: bool,
    pub return_x: bool,
}

impl Default for DataQuery {
    fn default() -> Self {
        Self {
            divisor: Vec::new(),
            xcol: MONO_CHANNEL.to_string(),
            individual: false,
            offset: false,
            offset_mono: false,
            weight: false,
            aggregate: Aggregate::Sum,
            exclude: Vec::new(),
            squeeze: true,
            return_x: true,
        }
    }
}

impl DataQuery {
    pub fn divisor<S: Into<String>>(mut self, channels: impl IntoIterator<Item = S>) -> Self {
        self.divisor = channels.into_iter().map(Into::into).collect();
        self
    }

    pub fn xcol(mut self, xcol: impl Into<String>) -> Self {
        self.xcol = xcol.into();
        self
    }

    pub fn individual(mut self, individual: bool) -> Self {
        self.individual = individual;
        self
    }

    pub fn offset(mut self, offset: bool) -> Self {
        self.offset = offset;
        self
    }

    pub fn offset_mono(mut self, offset_mono: bool) -> Self {
        self.offset_mono = offset_mono;
        self
    }

    pub fn weight(mut self, weight: bool) -> Self {
        self.weight = weight;
        self
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }

    pub fn exclude(mut self, exclude: &[ScanId]) -> Self {
        self.exclude = exclude.to_vec();
        self
    }

    pub fn squeeze(mut self, squeeze: bool) -> Self {
        self.squeeze = squeeze;
        self
    }

    pub fn return_x(mut self, return_x: bool) -> Self {
        self.return_x = return_x;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSelection {
    pub x: Option<ArrayD<f64>>,
    pub y: ArrayD<f64>,
}

impl Xas {
    /// Per-scan x as (points, scans) and y as (points, cols, scans), with
    /// offsets, weights, divisor and mono correction applied in that order.
    pub fn individual_data<S: AsRef<str>>(
        &self,
        cols: &[S],
        query: &DataQuery,
    ) -> XasResult<(Array2<f64>, Array3<f64>)> {
        let exclude = query.exclude.as_slice();
        let x = self
            .get_cols(&[query.xcol.as_str()], exclude)?
            .index_axis_move(Axis(1), 0);
        let mut y = self.get_cols(cols, exclude)?;

        if query.offset {
            let offsets = self.get_offsets_excluding(cols, exclude)?;
            y -= &offsets.insert_axis(Axis(0));
        }
        if query.weight {
            let weights = self.get_weights_excluding(cols, exclude)?;
            y /= &weights.insert_axis(Axis(0));
        }
        if !query.divisor.is_empty() {
            let divisor = self
                .get_cols(&query.divisor, exclude)?
                .map_axis(Axis(1), |lane| lane.product());
            y /= &divisor.insert_axis(Axis(1));
        }
        if query.offset_mono {
            let deltas = self.get_offsets_excluding(&[MONO_CHANNEL], exclude)?;
            for (scan, mut curves) in y.axis_iter_mut(Axis(2)).enumerate() {
                let shifts = vec![deltas[[0, scan]]; curves.ncols()];
                let corrected = correct_mono_batch(x.column(scan), &shifts, curves.view())?;
                curves.assign(&corrected);
            }
        }

        Ok((x, y))
    }

    /// Central query: [`Xas::individual_data`] followed by optional scan
    /// aggregation and squeezing of length-1 axes.
    pub fn get_data<S: AsRef<str>>(&self, cols: &[S], query: &DataQuery) -> XasResult<DataSelection> {
        let (x, y) = self.individual_data(cols, query)?;

        let (x, y): (ArrayD<f64>, ArrayD<f64>) = if query.individual {
            (x.into_dyn(), y.into_dyn())
        } else {
            let no_scans = || {
                XasError::input_validation(
                    "INPUT.NO_SCANS",
                    "every scan is excluded; nothing to aggregate",
                )
            };
            let x = x.mean_axis(Axis(1)).ok_or_else(no_scans)?;
            let y = match query.aggregate {
                Aggregate::Sum => y.sum_axis(Axis(2)),
                Aggregate::Mean => y.mean_axis(Axis(2)).ok_or_else(no_scans)?,
            };
            (x.into_dyn(), y.into_dyn())
        };

        let (x, y) = if query.squeeze {
            (squeeze(x), squeeze(y))
        } else {
            (x, y)
        };

        Ok(DataSelection {
            x: query.return_x.then_some(x),
            y,
        })
    }
}

fn squeeze(mut array: ArrayD<f64>) -> ArrayD<f64> {
    for axis in (0..array.ndim()).rev() {
        if array.len_of(Axis(axis)) == 1 {
            array = array.index_axis_move(Axis(axis), 0);
        }
    }
    array
}

#[cfg(test)]
mod tests {
    use super::DataQuery;
    use crate::domain::Aggregate;
    use crate::spectrum::{Xas, XasParts};
    use ndarray::{Array2, Array3, Ix3, array, s};

    /// Two scans, channels MONO / I0 / IF, three points.
    fn spectrum() -> Xas {
        let mut data = Array3::zeros((3, 3, 2));
        for point in 0..3 {
            for scan in 0..2 {
                data[[point, 0, scan]] = point as f64;
                data[[point, 1, scan]] = 2.0 * (scan + 1) as f64;
                data[[point, 2, scan]] = 10.0 * point as f64 + scan as f64;
            }
        }
        let mut weights = Array2::from_elem((3, 2), f64::NAN);
        weights[[2, 0]] = 2.0;
        weights[[2, 1]] = 4.0;
        let mut offsets = Array2::from_elem((3, 2), f64::NAN);
        offsets[[2, 0]] = 1.0;
        Xas::new(XasParts {
            channels: vec!["MONO".into(), "I0".into(), "IF".into()],
            scans: vec![10, 11],
            data,
            weights: Some(weights),
            offsets: Some(offsets),
            ..XasParts::default()
        })
        .expect("spectrum")
    }

    #[test]
    fn default_query_sums_scans_and_squeezes() {
        let selection = spectrum().get_data(&["IF"], &DataQuery::default()).expect("data");
        assert_eq!(selection.x, Some(array![0.0, 1.0, 2.0].into_dyn()));
        assert_eq!(selection.y.shape(), &[3]);
        assert_eq!(selection.y, array![1.0, 21.0, 41.0].into_dyn());
    }

    #[test]
    fn offsets_and_weights_apply_before_aggregation() {
        let query = DataQuery::default()
            .offset(true)
            .weight(true)
            .aggregate(Aggregate::Mean);
        let selection = spectrum().get_data(&["IF"], &query).expect("data");
        // scan 10: (v - 1) / 2, scan 11: (v - 0) / 4
        let expected = [
            ((0.0 - 1.0) / 2.0 + 1.0 / 4.0) / 2.0,
            ((10.0 - 1.0) / 2.0 + 11.0 / 4.0) / 2.0,
            ((20.0 - 1.0) / 2.0 + 21.0 / 4.0) / 2.0,
        ];
        for (actual, expected) in selection.y.iter().zip(expected) {
            assert!((actual - expected).abs() < 1.0e-12);
        }
    }

    #[test]
    fn divisor_uses_unprocessed_channel_product() {
        let query = DataQuery::default()
            .divisor(["I0", "I0"])
            .individual(true)
            .squeeze(false)
            .return_x(false);
        let selection = spectrum().get_data(&["IF"], &query).expect("data");
        assert!(selection.x.is_none());
        let y = selection.y.into_dimensionality::<Ix3>().expect("3-d selection");
        assert_eq!(y.dim(), (3, 1, 2));
        assert_eq!(y[[2, 0, 0]], 20.0 / 4.0);
        assert_eq!(y[[2, 0, 1]], 21.0 / 16.0);
    }

    #[test]
    fn exclusion_and_mono_correction_work_per_scan() {
        let mut xas = spectrum();
        xas.set_mono_offset(&[0.0, 0.5]).expect("offsets");
        let query = DataQuery::default().offset_mono(true).individual(true);
        let (x, y) = xas.individual_data(&["IF"], &query).expect("data");
        assert_eq!(x.dim(), (3, 2));
        assert_eq!(y.slice(s![.., 0, 0]), array![0.0, 10.0, 20.0]);
        assert_eq!(y[[1, 0, 1]], 6.0);

        let only_second = DataQuery::default().exclude(&[10]);
        let selection = xas.get_data(&["IF"], &only_second).expect("data");
        assert_eq!(selection.y, array![1.0, 11.0, 21.0].into_dyn());
    }

    #[test]
    fn excluding_every_scan_cannot_aggregate() {
        let query = DataQuery::default().exclude(&[10, 11]);
        let error = spectrum().get_data(&["IF"], &query).expect_err("no scans");
        assert_eq!(error.placeholder(), "INPUT.NO_SCANS");
    }

    #[test]
    fn unknown_divisor_is_a_lookup_error() {
        let query = DataQuery::default().divisor(["I1"]);
        let error = spectrum().get_data(&["IF"], &query).expect_err("missing");
        assert_eq!(error.placeholder(), "LOOKUP.CHANNEL");
    }
}
