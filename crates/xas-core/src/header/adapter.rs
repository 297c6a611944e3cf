use super::{ChannelInfo, Header, ScanField, ScanInfo};
use crate::domain::{MeasurementKind, ScanId, XasError, XasResult};
use crate::spectrum::{ScanMetadata, Xas, XasParts};
use crate::numerics::mean;
use ndarray::{Array2, ArrayView2, Axis, s};
use std::collections::BTreeMap;
use tracing::debug;

impl Xas {
    /// Builds a single-scan container from a (points, channels) array and its header.
    ///
    /// When `scaninfo.scan` is a list only its first id is kept. Weight and
    /// offset entries for channels not in `cols` are ignored.
    pub fn from_data_header(data: Array2<f64>, header: Header) -> XasResult<Xas> {
        let Header {
            scaninfo,
            motors,
            channelinfo,
        } = header;

        let scan = scaninfo
            .scan
            .as_ref()
            .and_then(ScanField::first)
            .ok_or_else(|| {
                XasError::input_validation("INPUT.MISSING_SCAN", "header has no scan id")
            })?;
        if let Some(ScanField::Many(scans)) = &scaninfo.scan {
            if scans.len() > 1 {
                debug!(
                    kept = scan,
                    dropped = scans.len() - 1,
                    "header lists several scans; keeping the first"
                );
            }
        }

        let cols = channelinfo.cols;
        if cols.len() != data.ncols() {
            return Err(XasError::input_validation(
                "INPUT.CHANNEL_COUNT",
                format!(
                    "header lists {} channels but data has {} columns",
                    cols.len(),
                    data.ncols()
                ),
            ));
        }

        let weights = metadata_column(&cols, &channelinfo.weights, "weight");
        let offsets = metadata_column(&cols, &channelinfo.offsets, "offset");

        let ScanInfo {
            motor,
            date,
            sample,
            loadid,
            command,
            extra,
            ..
        } = scaninfo;

        Xas::new(XasParts {
            kind: MeasurementKind::Xas,
            channels: cols,
            scans: vec![scan],
            data: data.insert_axis(Axis(2)),
            weights: Some(weights),
            offsets: Some(offsets),
            channel_roles: channelinfo.coltypes,
            metadata: ScanMetadata {
                motor,
                sample,
                date,
                command,
                loadid,
                scaninfo_extra: extra,
                motors,
            },
        })
    }

    /// Header with the weights and offsets of the first scan.
    pub fn header(&self) -> Header {
        let first = self.weights.ncols().min(1);
        let weights = set_entries(self.channels(), self.weights.slice(s![.., ..first]));
        let offsets = set_entries(self.channels(), self.offsets.slice(s![.., ..first]));
        self.build_header(self.scans(), weights, offsets)
    }

    /// Header whose weights and offsets average the set entries of the included scans.
    pub fn header_for(&self, exclude: &[ScanId]) -> Header {
        let positions = self.included_scans(exclude);
        let weights = set_entries(self.channels(), self.weights.select(Axis(1), &positions).view());
        let offsets = set_entries(self.channels(), self.offsets.select(Axis(1), &positions).view());
        self.build_header(&self.included_scan_ids(exclude), weights, offsets)
    }

    fn build_header(
        &self,
        scans: &[ScanId],
        weights: BTreeMap<String, f64>,
        offsets: BTreeMap<String, f64>,
    ) -> Header {
        let metadata = &self.metadata;
        Header {
            scaninfo: ScanInfo {
                scan: ScanField::from_ids(scans),
                motor: metadata.motor.clone(),
                date: metadata.date.clone(),
                sample: metadata.sample.clone(),
                loadid: metadata.loadid.clone(),
                command: metadata.command.clone(),
                extra: metadata.scaninfo_extra.clone(),
            },
            motors: metadata.motors.clone(),
            channelinfo: ChannelInfo {
                cols: self.channels().to_vec(),
                coltypes: Some(self.channel_roles.clone()),
                weights,
                offsets,
            },
        }
    }
}

fn metadata_column(cols: &[String], values: &BTreeMap<String, f64>, label: &str) -> Array2<f64> {
    let mut column = Array2::from_elem((cols.len(), 1), f64::NAN);
    for (name, value) in values {
        match cols.iter().position(|col| col == name) {
            Some(index) => column[[index, 0]] = *value,
            None => debug!(channel = %name, "ignoring {label} for unknown channel"),
        }
    }
    column
}

/// Per-channel mean over scans of the entries that were set.
fn set_entries(channels: &[String], values: ArrayView2<'_, f64>) -> BTreeMap<String, f64> {
    channels
        .iter()
        .zip(values.axis_iter(Axis(0)))
        .filter_map(|(name, row)| {
            let set: Vec<f64> = row.iter().copied().filter(|value| !value.is_nan()).collect();
            mean(&set).map(|mean| (name.clone(), mean))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::domain::{ChannelMismatchPolicy, ChannelRole};
    use crate::header::{Header, ScanField};
    use crate::spectrum::Xas;
    use ndarray::{Array2, array};

    fn header(scan: i64) -> Header {
        let mut header = Header::new(vec!["MONO".into(), "I0".into(), "REF".into()], scan);
        header.scaninfo.sample = Some("graphite".into());
        header.channelinfo.weights.insert("I0".into(), 2.0);
        header.channelinfo.weights.insert("GHOST".into(), 9.0);
        header.channelinfo.offsets.insert("MONO".into(), 0.5);
        header.motors.insert("samplex".into(), 1.25);
        header
    }

    fn data() -> Array2<f64> {
        array![[280.0, 1.0, 0.1], [281.0, 1.1, 0.4], [282.0, 1.2, 0.2]]
    }

    #[test]
    fn from_data_header_adds_scan_axis_and_metadata() {
        let xas = Xas::from_data_header(data(), header(12)).expect("container");
        assert_eq!(xas.data().dim(), (3, 3, 1));
        assert_eq!(xas.scans(), [12]);
        assert_eq!(xas.metadata().sample.as_deref(), Some("graphite"));
        assert_eq!(xas.metadata().motors.get("samplex"), Some(&1.25));
        assert_eq!(xas.get_weights(&["I0", "REF"]).expect("weights"), array![[2.0], [1.0]]);
        assert_eq!(xas.get_offsets(&["MONO"]).expect("offsets"), array![[0.5]]);
        assert_eq!(xas.channel_roles()[0], ChannelRole::Motor);
    }

    #[test]
    fn from_data_header_keeps_only_the_first_listed_scan() {
        let mut header = header(0);
        header.scaninfo.scan = Some(ScanField::Many(vec![21, 22, 23]));
        let xas = Xas::from_data_header(data(), header).expect("container");
        assert_eq!(xas.scans(), [21]);
    }

    #[test]
    fn from_data_header_validates_required_fields() {
        let mut missing = header(1);
        missing.scaninfo.scan = None;
        let error = Xas::from_data_header(data(), missing).expect_err("missing scan");
        assert_eq!(error.placeholder(), "INPUT.MISSING_SCAN");

        let mut empty = header(1);
        empty.scaninfo.scan = Some(ScanField::Many(Vec::new()));
        assert!(Xas::from_data_header(data(), empty).is_err());

        let error = Xas::from_data_header(Array2::zeros((3, 2)), header(1)).expect_err("cols");
        assert_eq!(error.placeholder(), "INPUT.CHANNEL_COUNT");

        let mut roles = header(1);
        roles.channelinfo.coltypes = Some(vec![ChannelRole::Motor]);
        let error = Xas::from_data_header(data(), roles).expect_err("coltypes");
        assert_eq!(error.placeholder(), "INPUT.COLTYPES_LENGTH");
    }

    #[test]
    fn header_round_trips_single_scan_metadata() {
        let xas = Xas::from_data_header(data(), header(12)).expect("container");
        let exported = xas.header();
        assert_eq!(exported.scaninfo.scan, Some(ScanField::Single(12)));
        assert_eq!(exported.channelinfo.weights.get("I0"), Some(&2.0));
        assert!(!exported.channelinfo.weights.contains_key("GHOST"));
        assert!(!exported.channelinfo.weights.contains_key("REF"));

        let rebuilt = Xas::from_data_header(data(), exported).expect("rebuilt");
        assert_eq!(rebuilt, xas);
    }

    #[test]
    fn header_for_averages_over_included_scans() {
        let first = Xas::from_data_header(data(), header(3)).expect("first");
        let mut second_header = header(1);
        second_header.channelinfo.weights.insert("I0".into(), 4.0);
        second_header.channelinfo.offsets.clear();
        let second = Xas::from_data_header(data(), second_header).expect("second");
        let combined = first
            .accumulate(Some(&second), ChannelMismatchPolicy::Reject)
            .expect("combined");

        let averaged = combined.header_for(&[]);
        assert_eq!(averaged.scaninfo.scan, Some(ScanField::Many(vec![1, 3])));
        assert_eq!(averaged.channelinfo.weights.get("I0"), Some(&3.0));
        assert_eq!(averaged.channelinfo.offsets.get("MONO"), Some(&0.5));

        let only_second = combined.header_for(&[3]);
        assert_eq!(only_second.scaninfo.scan, Some(ScanField::Single(1)));
        assert_eq!(only_second.channelinfo.weights.get("I0"), Some(&4.0));
        assert!(only_second.channelinfo.offsets.is_empty());

        assert_eq!(combined.header().channelinfo.weights.get("I0"), Some(&2.0));
    }
}
