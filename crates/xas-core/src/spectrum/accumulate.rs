use super::{LabelIndex, Xas};
use crate::domain::{ChannelMismatchPolicy, ChannelRole, XasError, XasResult};
use ndarray::{Array2, Array3, Axis, concatenate, s};
use std::ops::Add;
use tracing::debug;

impl Xas {
    /// Appends the scans of `other` after those of `self` into a new container.
    ///
    /// Metadata come from `self`. Scan ids are concatenated as given, so an id
    /// may repeat. `None` yields an independent copy of `self`.
    pub fn accumulate(&self, other: Option<&Xas>, policy: ChannelMismatchPolicy) -> XasResult<Xas> {
        match other {
            Some(other) => Xas::combine(&[self, other], policy),
            None => Ok(self.clone()),
        }
    }

    /// Left fold of [`Xas::accumulate`] over `spectra`, built with a single
    /// concatenation per array.
    pub fn combine(spectra: &[&Xas], policy: ChannelMismatchPolicy) -> XasResult<Xas> {
        let Some((first, rest)) = spectra.split_first() else {
            return Err(XasError::input_validation(
                "INPUT.NO_SCANS",
                "no spectra were given to combine",
            ));
        };

        let mut channels = first.channels.clone();
        for other in rest {
            if first.kind != other.kind {
                return Err(XasError::type_mismatch(
                    "TYPE.MEASUREMENT_KIND",
                    format!("cannot add {} data to {} data", other.kind, first.kind),
                ));
            }
            if first.n_points() != other.n_points() {
                return Err(XasError::input_validation(
                    "INPUT.POINT_COUNT",
                    format!(
                        "cannot add scans with {} points to scans with {} points",
                        other.n_points(),
                        first.n_points()
                    ),
                ));
            }
            if channels != other.channels {
                match policy {
                    ChannelMismatchPolicy::Reject => {
                        return Err(XasError::input_validation(
                            "INPUT.CHANNEL_MISMATCH",
                            format!(
                                "channel lists differ: [{}] vs [{}]",
                                channels.labels().join(", "),
                                other.channels().join(", ")
                            ),
                        ));
                    }
                    ChannelMismatchPolicy::FillNan => channels = channels.union(&other.channels),
                }
            }
        }

        let aligned: Vec<_> = spectra
            .iter()
            .map(|spectrum| spectrum.aligned_to(&channels))
            .collect();
        let data_views: Vec<_> = aligned.iter().map(|(data, _, _)| data.view()).collect();
        let weight_views: Vec<_> = aligned.iter().map(|(_, weights, _)| weights.view()).collect();
        let offset_views: Vec<_> = aligned.iter().map(|(_, _, offsets)| offsets.view()).collect();

        let data = concatenate(Axis(2), &data_views).map_err(concatenate_error)?;
        let weights = concatenate(Axis(1), &weight_views).map_err(concatenate_error)?;
        let offsets = concatenate(Axis(1), &offset_views).map_err(concatenate_error)?;

        let channel_roles = channels
            .iter()
            .map(|name| {
                spectra
                    .iter()
                    .find_map(|spectrum| spectrum.role_of(name))
                    .unwrap_or_else(|| ChannelRole::infer(name))
            })
            .collect();
        let scans = rest
            .iter()
            .fold(first.scans.clone(), |scans, other| scans.concat(&other.scans));

        debug!(
            spectra = spectra.len(),
            scans = scans.len(),
            channels = channels.len(),
            "accumulated scans"
        );

        Ok(Xas {
            kind: first.kind,
            scans,
            channels,
            data,
            weights,
            offsets,
            channel_roles,
            metadata: first.metadata.clone(),
        })
    }

    /// In-place form of [`Xas::accumulate`]. On error `self` is left as it was.
    pub fn accumulate_in_place(
        &mut self,
        other: Option<&Xas>,
        policy: ChannelMismatchPolicy,
    ) -> XasResult<&mut Self> {
        if other.is_some() {
            *self = self.accumulate(other, policy)?;
        }
        Ok(self)
    }

    /// Data and metadata laid out on `channels`; channels this container
    /// lacks become NaN columns.
    fn aligned_to(&self, channels: &LabelIndex<String>) -> (Array3<f64>, Array2<f64>, Array2<f64>) {
        if *channels == self.channels {
            return (self.data.clone(), self.weights.clone(), self.offsets.clone());
        }

        let n_scans = self.n_scans();
        let mut data = Array3::from_elem((self.n_points(), channels.len(), n_scans), f64::NAN);
        let mut weights = Array2::from_elem((channels.len(), n_scans), f64::NAN);
        let mut offsets = Array2::from_elem((channels.len(), n_scans), f64::NAN);
        for (target, name) in channels.iter().enumerate() {
            if let Some(source) = self.channels.position(name.as_str()) {
                data.slice_mut(s![.., target, ..])
                    .assign(&self.data.slice(s![.., source, ..]));
                weights.row_mut(target).assign(&self.weights.row(source));
                offsets.row_mut(target).assign(&self.offsets.row(source));
            }
        }
        (data, weights, offsets)
    }
}

fn concatenate_error(error: ndarray::ShapeError) -> XasError {
    XasError::computation("RUN.CONCATENATE", error.to_string())
}

impl Add<&Xas> for &Xas {
    type Output = XasResult<Xas>;

    /// Strict accumulation: channel lists must match exactly.
    fn add(self, rhs: &Xas) -> Self::Output {
        self.accumulate(Some(rhs), ChannelMismatchPolicy::Reject)
    }
}
